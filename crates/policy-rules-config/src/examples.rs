// crates/policy-rules-config/src/examples.rs
// ============================================================================
// Module: Config Examples
// Description: Canonical example configuration payload.
// Purpose: Deterministic example for docs and tooling.
// Dependencies: std
// ============================================================================

//! Canonical example `policy-rules.toml`, kept parseable by the loader.

/// Returns a canonical example `policy-rules.toml` configuration.
#[must_use]
pub fn config_toml_example() -> String {
    String::from(
        r#"[store]
connection = "sqlite://policy-rules.db"
busy_timeout_ms = 5000
journal_mode = "wal"
sync_mode = "full"
filtered = false
"#,
    )
}
