// crates/policy-rules-config/src/lib.rs
// ============================================================================
// Module: Policy Rules Config Library
// Description: Configuration model and loader for the policy rule store.
// Purpose: Single source of truth for policy-rules.toml semantics.
// Dependencies: policy-rules-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! `policy-rules-config` loads `policy-rules.toml`, validates it, and opens
//! the configured [`SqliteAdapter`]. Loading fails closed on oversized,
//! non-UTF-8, or malformed input.
//!
//! [`SqliteAdapter`]: policy_rules_store_sqlite::SqliteAdapter

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod examples;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::ConfigError;
pub use config::PolicyRulesConfig;
pub use examples::config_toml_example;
