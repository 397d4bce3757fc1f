// crates/policy-rules-store-sqlite/src/config.rs
// ============================================================================
// Module: SQLite Adapter Config
// Description: Connection and pragma configuration for the SQLite adapter.
// Purpose: Turn a connection string into an open, tuned SQLite connection.
// Dependencies: rusqlite, serde
// ============================================================================

//! ## Overview
//! The adapter accepts a connection string (`:memory:`, `sqlite::memory:`,
//! `sqlite://<path>`, `sqlite:<path>`, or a bare path). File-backed databases
//! are opened read-write with the configured journal and sync pragmas; parent
//! directories are created on demand.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use rusqlite::Connection;
use rusqlite::OpenFlags;
use serde::Deserialize;

use crate::error::SqliteAdapterError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;

// ============================================================================
// SECTION: Pragmas
// ============================================================================

/// `SQLite` journal mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `journal_mode` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteJournalMode {
    /// WAL journal mode (recommended).
    #[default]
    Wal,
    /// Delete journal mode (legacy).
    Delete,
}

impl SqliteJournalMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `synchronous` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode (balanced).
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

// ============================================================================
// SECTION: Config
// ============================================================================

/// Configuration for the `SQLite` policy adapter.
///
/// # Invariants
/// - `connection` must parse as a [`ConnectionTarget`].
/// - `busy_timeout_ms` is interpreted as milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SqliteAdapterConfig {
    /// Connection string or database file path.
    pub connection: String,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode (file databases only).
    #[serde(default)]
    pub journal_mode: SqliteJournalMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
    /// Initial value of the adapter's filtered flag.
    #[serde(default)]
    pub filtered: bool,
}

impl SqliteAdapterConfig {
    /// Builds a config with defaults for the given connection string.
    #[must_use]
    pub fn for_connection(connection: impl Into<String>) -> Self {
        Self {
            connection: connection.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteJournalMode::default(),
            sync_mode: SqliteSyncMode::default(),
            filtered: false,
        }
    }

    /// Validates the configuration without opening a connection.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteAdapterError::Invalid`] when the connection string is
    /// malformed or the timeout is zero.
    pub fn validate(&self) -> Result<ConnectionTarget, SqliteAdapterError> {
        if self.busy_timeout_ms == 0 {
            return Err(SqliteAdapterError::Invalid(
                "busy_timeout_ms must be greater than zero".to_string(),
            ));
        }
        let target = ConnectionTarget::parse(&self.connection)?;
        if let ConnectionTarget::File(path) = &target {
            validate_store_path(path)?;
        }
        Ok(target)
    }
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

/// Parsed connection string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionTarget {
    /// Private in-memory database.
    Memory,
    /// Database file on disk.
    File(PathBuf),
}

impl ConnectionTarget {
    /// Parses a connection string.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteAdapterError::Invalid`] for empty strings and
    /// non-`sqlite` URL schemes.
    pub fn parse(value: &str) -> Result<Self, SqliteAdapterError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(SqliteAdapterError::Invalid("connection must be non-empty".to_string()));
        }
        if matches!(trimmed, ":memory:" | "sqlite::memory:" | "sqlite://:memory:") {
            return Ok(Self::Memory);
        }
        let path = trimmed
            .strip_prefix("sqlite://")
            .or_else(|| trimmed.strip_prefix("sqlite:"))
            .unwrap_or(trimmed);
        if path.contains("://") {
            return Err(SqliteAdapterError::Invalid(format!(
                "unsupported connection scheme: {trimmed}"
            )));
        }
        if path.is_empty() {
            return Err(SqliteAdapterError::Invalid("connection path is empty".to_string()));
        }
        Ok(Self::File(PathBuf::from(path)))
    }
}

// ============================================================================
// SECTION: Connection Helpers
// ============================================================================

/// Opens a configured `SQLite` connection.
pub(crate) fn open_connection(
    config: &SqliteAdapterConfig,
) -> Result<Connection, SqliteAdapterError> {
    let target = config.validate()?;
    let connection = match &target {
        ConnectionTarget::Memory => {
            Connection::open_in_memory().map_err(|err| SqliteAdapterError::Db(err.to_string()))?
        }
        ConnectionTarget::File(path) => {
            ensure_parent_dir(path)?;
            let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
            Connection::open_with_flags(path, flags)
                .map_err(|err| SqliteAdapterError::Db(err.to_string()))?
        }
    };
    apply_pragmas(&connection, config, &target)?;
    Ok(connection)
}

/// Applies journal, sync and busy-timeout pragmas.
fn apply_pragmas(
    connection: &Connection,
    config: &SqliteAdapterConfig,
    target: &ConnectionTarget,
) -> Result<(), SqliteAdapterError> {
    if matches!(target, ConnectionTarget::File(_)) {
        connection
            .execute_batch(&format!(
                "PRAGMA journal_mode = {};",
                config.journal_mode.pragma_value()
            ))
            .map_err(|err| SqliteAdapterError::Db(err.to_string()))?;
    }
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(|err| SqliteAdapterError::Db(err.to_string()))?;
    connection
        .busy_timeout(Duration::from_millis(config.busy_timeout_ms))
        .map_err(|err| SqliteAdapterError::Db(err.to_string()))?;
    Ok(())
}

/// Ensures the parent directory for the database exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteAdapterError> {
    let Some(parent) = path.parent() else {
        return Err(SqliteAdapterError::Io("store path missing parent directory".to_string()));
    };
    std::fs::create_dir_all(parent).map_err(|err| SqliteAdapterError::Io(err.to_string()))
}

/// Validates store paths for safety limits.
fn validate_store_path(path: &Path) -> Result<(), SqliteAdapterError> {
    let path_string = path.display().to_string();
    if path_string.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteAdapterError::Invalid("store path exceeds length limit".to_string()));
    }
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if name.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SqliteAdapterError::Invalid(
                "store path contains an overlong component".to_string(),
            ));
        }
    }
    if path.is_dir() {
        return Err(SqliteAdapterError::Invalid(
            "store path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================
