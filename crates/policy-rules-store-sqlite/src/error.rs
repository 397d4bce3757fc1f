// crates/policy-rules-store-sqlite/src/error.rs
// ============================================================================
// Module: SQLite Adapter Errors
// Description: Error taxonomy for the SQLite policy adapter.
// Purpose: Classify storage, validation, and cardinality failures.
// Dependencies: policy-rules-core, thiserror
// ============================================================================

//! Errors raised by the `SQLite` adapter and their mapping onto
//! [`AdapterError`].

use policy_rules_core::AdapterError;
use policy_rules_core::RuleError;
use thiserror::Error;

/// `SQLite` adapter errors.
#[derive(Debug, Error)]
pub enum SqliteAdapterError {
    /// Adapter I/O error.
    #[error("sqlite adapter io error: {0}")]
    Io(String),
    /// `SQLite` engine or transaction error.
    #[error("sqlite adapter db error: {0}")]
    Db(String),
    /// Invalid configuration or argument.
    #[error("sqlite adapter invalid input: {0}")]
    Invalid(String),
    /// Rule shape violation.
    #[error("sqlite adapter invalid rule: {0}")]
    Rule(#[from] RuleError),
    /// No row matched an update target.
    #[error("sqlite adapter rule not found: {0}")]
    NotFound(String),
    /// Several rows matched an update target.
    #[error("sqlite adapter ambiguous rule: {0}")]
    Ambiguous(String),
}

impl From<SqliteAdapterError> for AdapterError {
    fn from(error: SqliteAdapterError) -> Self {
        match error {
            SqliteAdapterError::Io(message) => Self::Io(message),
            SqliteAdapterError::Db(message) => Self::Store(message),
            SqliteAdapterError::Invalid(message) => Self::Invalid(message),
            SqliteAdapterError::Rule(error) => Self::from(error),
            SqliteAdapterError::NotFound(message) => Self::NotFound(message),
            SqliteAdapterError::Ambiguous(message) => Self::Ambiguous(message),
        }
    }
}
