// crates/policy-rules-core/tests/proptest_rule_line.rs
// ============================================================================
// Module: Rule Line Property-Based Tests
// Description: Property tests for canonical line rendering and parsing.
// Purpose: Ensure record -> line -> model reproduces the original tuple.
// ============================================================================

//! Property-based tests for rule line invariants.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use policy_rules_core::CasbinRule;
use policy_rules_core::InMemoryModel;
use policy_rules_core::MAX_RULE_FIELDS;
use policy_rules_core::PolicyModel;
use policy_rules_core::RuleRecord;
use policy_rules_core::load_policy_line;
use proptest::prelude::*;

fn rule_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-z0-9_/:*]{1,16}", 1 ..= MAX_RULE_FIELDS)
}

proptest! {
    #[test]
    fn line_round_trips_through_model(ptype in prop_oneof![Just("p"), Just("g")], rule in rule_strategy()) {
        let record = CasbinRule::from_rule(ptype, &rule).expect("valid rule");
        let line = record.to_line();
        prop_assert_eq!(&line, &format!("{ptype}, {}", rule.join(", ")));

        let mut model = InMemoryModel::with_defaults();
        prop_assert!(load_policy_line(&line, &mut model));
        prop_assert_eq!(model.rules(ptype, ptype), vec![rule]);
    }

    #[test]
    fn overlong_rules_are_rejected(rule in prop::collection::vec("[a-z]{1,4}", MAX_RULE_FIELDS + 1 .. 12)) {
        prop_assert!(CasbinRule::from_rule("p", &rule).is_err());
    }

    #[test]
    fn values_match_input_prefix(rule in rule_strategy()) {
        let record = CasbinRule::from_rule("p", &rule).expect("valid rule");
        prop_assert_eq!(record.values(), rule);
    }
}
