// crates/policy-rules-core/src/lib.rs
// ============================================================================
// Module: Policy Rules Core Library
// Description: Public API surface for the policy rule storage contract.
// Purpose: Expose rule records, filters, model and adapter interfaces.
// Dependencies: crate::{filter, interfaces, model, rule}
// ============================================================================

//! ## Overview
//! Policy rules core defines what a stored authorization rule looks like and
//! how a persistence adapter talks to a policy engine's in-memory model. It
//! carries no storage backend; see `policy-rules-store-sqlite` for one.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod filter;
pub mod interfaces;
pub mod model;
pub mod rule;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use filter::Filter;
pub use interfaces::AdapterError;
pub use interfaces::PolicyAdapter;
pub use model::InMemoryModel;
pub use model::POLICY_SECTIONS;
pub use model::PolicyModel;
pub use model::load_policy_line;
pub use rule::CasbinRule;
pub use rule::DEFAULT_TABLE_NAME;
pub use rule::FIELD_COLUMNS;
pub use rule::MAX_FIELD_LENGTH;
pub use rule::MAX_RULE_FIELDS;
pub use rule::RuleError;
pub use rule::RuleRecord;
pub use rule::validate_ptype;
pub use rule::validate_rule;
pub use rule::validate_values;
