// crates/policy-rules-core/src/interfaces.rs
// ============================================================================
// Module: Policy Adapter Interfaces
// Description: Backend-agnostic persistence contract for policy rules.
// Purpose: Define the operations a policy engine invokes on its rule store.
// Dependencies: crate::{filter, model, rule}, thiserror
// ============================================================================

//! ## Overview
//! [`PolicyAdapter`] is the surface a policy engine calls to keep its
//! in-memory model and a durable rule table in sync. Every operation runs in
//! its own storage transaction unless documented otherwise. The `sec`
//! argument is carried for interface conformance; stored rules are keyed by
//! `ptype` alone.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::filter::Filter;
use crate::model::PolicyModel;
use crate::rule::RuleError;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Policy adapter errors.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// Adapter I/O error.
    #[error("policy adapter io error: {0}")]
    Io(String),
    /// Storage engine or transaction failure.
    #[error("policy adapter store error: {0}")]
    Store(String),
    /// Caller supplied a malformed rule or argument.
    #[error("policy adapter invalid input: {0}")]
    Invalid(String),
    /// No stored rule matched the rule to update.
    #[error("policy adapter rule not found: {0}")]
    NotFound(String),
    /// More than one stored rule matched the rule to update.
    #[error("policy adapter ambiguous match: {0}")]
    Ambiguous(String),
}

impl From<RuleError> for AdapterError {
    fn from(error: RuleError) -> Self {
        Self::Invalid(error.to_string())
    }
}

// ============================================================================
// SECTION: Adapter Contract
// ============================================================================

/// Persistence adapter for policy rules.
pub trait PolicyAdapter {
    /// Loads every stored rule into the model.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError`] when storage access fails.
    fn load_policy(&self, model: &mut dyn PolicyModel) -> Result<(), AdapterError>;

    /// Loads the rules matching `filter`, in insertion order, and marks the
    /// adapter as filtered.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError`] when storage access fails.
    fn load_filtered_policy(
        &self,
        model: &mut dyn PolicyModel,
        filter: &Filter,
    ) -> Result<(), AdapterError>;

    /// Returns true once a filtered load has populated a partial model.
    fn is_filtered(&self) -> bool;

    /// Replaces all stored rules with the `p` and `g` sections of the model.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError`] when a rule is malformed or storage fails; no
    /// rows change in that case.
    fn save_policy(&self, model: &dyn PolicyModel) -> Result<bool, AdapterError>;

    /// Stores one rule.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError`] when the rule is malformed or storage fails.
    fn add_policy(&self, sec: &str, ptype: &str, rule: &[String]) -> Result<(), AdapterError>;

    /// Stores several rules in one transaction.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError`] when any rule is malformed or storage fails;
    /// none of the rules are stored in that case.
    fn add_policies(
        &self,
        sec: &str,
        ptype: &str,
        rules: &[Vec<String>],
    ) -> Result<(), AdapterError>;

    /// Deletes rows whose leading fields equal `rule`. Returns whether any row
    /// was deleted.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError`] when the rule is malformed or storage fails.
    fn remove_policy(&self, sec: &str, ptype: &str, rule: &[String])
    -> Result<bool, AdapterError>;

    /// Deletes rows whose field at each position is among the rules' values at
    /// that position.
    ///
    /// Positions are matched independently, so a row combining values from
    /// different input rules is deleted as well. Returns whether any row was
    /// deleted; an empty `rules` list deletes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError`] when a rule is malformed or storage fails.
    fn remove_policies(
        &self,
        sec: &str,
        ptype: &str,
        rules: &[Vec<String>],
    ) -> Result<bool, AdapterError>;

    /// Deletes rows matching `field_values` starting at value field
    /// `field_index`; empty strings are wildcards.
    ///
    /// Returns false without touching storage when `field_index > 5` or
    /// `field_index + field_values.len()` is outside `1..=6`.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError`] when storage fails.
    fn remove_filtered_policy(
        &self,
        sec: &str,
        ptype: &str,
        field_index: usize,
        field_values: &[String],
    ) -> Result<bool, AdapterError>;

    /// Rewrites the single stored rule matching `old_rule` to `new_rule`.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::NotFound`] or [`AdapterError::Ambiguous`] unless
    /// exactly one row matches, and [`AdapterError`] on malformed input or
    /// storage failure.
    fn update_policy(
        &self,
        sec: &str,
        ptype: &str,
        old_rule: &[String],
        new_rule: &[String],
    ) -> Result<(), AdapterError>;

    /// Applies [`PolicyAdapter::update_policy`] pairwise, one transaction per
    /// pair. Earlier pairs stay committed when a later pair fails.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Invalid`] when the lists differ in length, or the
    /// first pair's error.
    fn update_policies(
        &self,
        sec: &str,
        ptype: &str,
        old_rules: &[Vec<String>],
        new_rules: &[Vec<String>],
    ) -> Result<(), AdapterError>;
}
