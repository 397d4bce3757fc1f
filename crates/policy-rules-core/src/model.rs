// crates/policy-rules-core/src/model.rs
// ============================================================================
// Module: Policy Model Interface
// Description: Boundary to the in-memory policy model owned by the engine.
// Purpose: Let adapters read and populate rule sections without knowing the
//          model's syntax.
// Dependencies: std
// ============================================================================

//! ## Overview
//! The policy engine owns the in-memory model; adapters only see it through
//! [`PolicyModel`]. Stored rules are fed back into the model as canonical
//! lines via [`load_policy_line`], mirroring how the engine loads its own
//! policy files. [`InMemoryModel`] is a small reference model for tests and
//! simple embedders.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Rule-bearing model sections: policy rules and role/grouping rules.
pub const POLICY_SECTIONS: [&str; 2] = ["p", "g"];

// ============================================================================
// SECTION: Model Contract
// ============================================================================

/// Policy model as seen by a persistence adapter.
pub trait PolicyModel {
    /// Returns the policy types declared in section `sec`, in a stable order.
    fn policy_types(&self, sec: &str) -> Vec<String>;

    /// Returns the ordered rule tuples held under `sec`/`ptype`.
    fn rules(&self, sec: &str, ptype: &str) -> Vec<Vec<String>>;

    /// Installs a rule tuple. Returns false when `sec`/`ptype` is not declared.
    fn add_rule(&mut self, sec: &str, ptype: &str, rule: Vec<String>) -> bool;
}

/// Parses one canonical rule line and installs it into the model.
///
/// Empty lines and `#` comments are ignored. The first token is the policy
/// type; its first character names the section. Commas nested inside `()` or
/// `[]` do not split tokens. Returns true when the rule was installed.
pub fn load_policy_line(line: &str, model: &mut dyn PolicyModel) -> bool {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return false;
    }
    let mut tokens = split_line(line).into_iter();
    let Some(ptype) = tokens.next() else {
        return false;
    };
    let Some(sec) = ptype.chars().next().map(String::from) else {
        return false;
    };
    model.add_rule(&sec, &ptype, tokens.collect())
}

/// Splits a rule line on top-level commas and trims each token.
fn split_line(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    for ch in line.chars() {
        match ch {
            '(' | '[' => {
                depth += 1;
                current.push(ch);
            }
            ')' | ']' => {
                depth = depth.saturating_sub(1);
                current.push(ch);
            }
            ',' if depth == 0 => {
                tokens.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    tokens.push(current.trim().to_string());
    tokens
}

// ============================================================================
// SECTION: In-Memory Model
// ============================================================================

/// Minimal in-memory policy model keyed by section and policy type.
///
/// # Invariants
/// - Rules are only accepted for policy types declared via
///   [`InMemoryModel::with_policy_type`].
/// - Rule order under a policy type is insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InMemoryModel {
    /// Section -> policy type -> rule tuples.
    sections: BTreeMap<String, BTreeMap<String, Vec<Vec<String>>>>,
}

impl InMemoryModel {
    /// Creates an empty model with no declared policy types.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a model declaring the conventional `p` and `g` policy types.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new().with_policy_type("p", "p").with_policy_type("g", "g")
    }

    /// Declares a policy type under a section.
    #[must_use]
    pub fn with_policy_type(mut self, sec: &str, ptype: &str) -> Self {
        self.sections.entry(sec.to_string()).or_default().entry(ptype.to_string()).or_default();
        self
    }

    /// Drops every rule while keeping declared policy types.
    pub fn clear_policy(&mut self) {
        for ptypes in self.sections.values_mut() {
            for rules in ptypes.values_mut() {
                rules.clear();
            }
        }
    }

    /// Returns the total number of rules across all sections.
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.sections.values().flat_map(BTreeMap::values).map(Vec::len).sum()
    }
}

impl PolicyModel for InMemoryModel {
    fn policy_types(&self, sec: &str) -> Vec<String> {
        self.sections.get(sec).map(|ptypes| ptypes.keys().cloned().collect()).unwrap_or_default()
    }

    fn rules(&self, sec: &str, ptype: &str) -> Vec<Vec<String>> {
        self.sections
            .get(sec)
            .and_then(|ptypes| ptypes.get(ptype))
            .cloned()
            .unwrap_or_default()
    }

    fn add_rule(&mut self, sec: &str, ptype: &str, rule: Vec<String>) -> bool {
        let Some(rules) = self.sections.get_mut(sec).and_then(|ptypes| ptypes.get_mut(ptype))
        else {
            return false;
        };
        rules.push(rule);
        true
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| (*value).to_string()).collect()
    }

    #[test]
    fn loads_policy_line_into_declared_type() {
        let mut model = InMemoryModel::with_defaults();
        assert!(load_policy_line("p, alice, data1, read", &mut model));
        assert_eq!(model.rules("p", "p"), vec![rule(&["alice", "data1", "read"])]);
    }

    #[test]
    fn section_comes_from_first_ptype_character() {
        let mut model = InMemoryModel::new().with_policy_type("g", "g2");
        assert!(load_policy_line("g2, alice, admin", &mut model));
        assert_eq!(model.rules("g", "g2"), vec![rule(&["alice", "admin"])]);
    }

    #[test]
    fn undeclared_ptype_is_skipped() {
        let mut model = InMemoryModel::with_defaults();
        assert!(!load_policy_line("p2, alice, data1", &mut model));
        assert_eq!(model.rule_count(), 0);
    }

    #[test]
    fn blank_and_comment_lines_are_ignored() {
        let mut model = InMemoryModel::with_defaults();
        assert!(!load_policy_line("   ", &mut model));
        assert!(!load_policy_line("# p, alice, data1", &mut model));
        assert_eq!(model.rule_count(), 0);
    }

    #[test]
    fn nested_commas_stay_in_one_token() {
        let mut model = InMemoryModel::with_defaults();
        assert!(load_policy_line("p, alice, keyMatch(r.obj, /data/*), read", &mut model));
        assert_eq!(model.rules("p", "p"), vec![rule(&[
            "alice",
            "keyMatch(r.obj, /data/*)",
            "read"
        ])]);
    }

    #[test]
    fn clear_policy_keeps_declarations() {
        let mut model = InMemoryModel::with_defaults();
        load_policy_line("p, alice, data1, read", &mut model);
        model.clear_policy();
        assert_eq!(model.rule_count(), 0);
        assert_eq!(model.policy_types("p"), vec!["p".to_string()]);
    }
}
