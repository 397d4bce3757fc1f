// crates/policy-rules-store-sqlite/src/lib.rs
// ============================================================================
// Module: SQLite Policy Rule Store
// Description: PolicyAdapter backend over a SQLite rule table.
// Purpose: Provide transactional persistence for policy rules.
// Dependencies: policy-rules-core, rusqlite, tracing
// ============================================================================

//! ## Overview
//! This crate provides a SQLite-backed [`PolicyAdapter`] that stores policy
//! rules as `(ptype, v0..v5)` rows and synchronizes them with a policy
//! engine's in-memory model. Each operation runs in its own transaction.
//!
//! [`PolicyAdapter`]: policy_rules_core::PolicyAdapter

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod adapter;
pub mod config;
pub mod error;
pub mod query;
mod scope;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use adapter::SqliteAdapter;
pub use config::ConnectionTarget;
pub use config::SqliteAdapterConfig;
pub use config::SqliteJournalMode;
pub use config::SqliteSyncMode;
pub use error::SqliteAdapterError;
pub use query::RuleQuery;
pub use query::filter_query;
