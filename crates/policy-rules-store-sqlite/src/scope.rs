// crates/policy-rules-store-sqlite/src/scope.rs
// ============================================================================
// Module: Transaction Scope
// Description: Scoped connection acquisition around one unit of work.
// Purpose: Commit on success, roll back on failure, always release the lock.
// Dependencies: rusqlite, tracing
// ============================================================================

//! ## Overview
//! Every adapter operation runs through [`run_in_transaction`]. The shared
//! connection is locked for the duration of the closure, a transaction is
//! opened, and the outcome decides between commit and rollback. The error is
//! returned to the caller only after the rollback has been attempted, and the
//! lock guard is dropped on every path.

use std::sync::Mutex;

use rusqlite::Connection;
use rusqlite::Transaction;
use tracing::debug;
use tracing::warn;

use crate::error::SqliteAdapterError;

/// Runs `work` inside a transaction on the shared connection.
///
/// # Errors
///
/// Returns [`SqliteAdapterError::Db`] when the lock is poisoned or the
/// transaction cannot begin or commit, or the error produced by `work`.
pub(crate) fn run_in_transaction<T, F>(
    connection: &Mutex<Connection>,
    operation: &'static str,
    work: F,
) -> Result<T, SqliteAdapterError>
where
    F: FnOnce(&Transaction<'_>) -> Result<T, SqliteAdapterError>,
{
    let mut guard =
        connection.lock().map_err(|_| SqliteAdapterError::Db("mutex poisoned".to_string()))?;
    let tx = guard.transaction().map_err(|err| SqliteAdapterError::Db(err.to_string()))?;
    match work(&tx) {
        Ok(value) => {
            tx.commit().map_err(|err| SqliteAdapterError::Db(err.to_string()))?;
            debug!(operation, "transaction committed");
            Ok(value)
        }
        Err(error) => {
            if let Err(rollback_error) = tx.rollback() {
                warn!(operation, error = %rollback_error, "transaction rollback failed");
            }
            warn!(operation, error = %error, "transaction rolled back");
            Err(error)
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only assertions are permitted."
    )]

    use super::*;

    fn connection() -> Mutex<Connection> {
        let connection = Connection::open_in_memory().unwrap();
        connection.execute_batch("CREATE TABLE items (name TEXT NOT NULL);").unwrap();
        Mutex::new(connection)
    }

    fn count(connection: &Mutex<Connection>) -> i64 {
        connection
            .lock()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM items", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn commits_on_success() {
        let connection = connection();
        let inserted = run_in_transaction(&connection, "insert", |tx| {
            tx.execute("INSERT INTO items (name) VALUES ('a')", [])
                .map_err(|err| SqliteAdapterError::Db(err.to_string()))
        })
        .expect("commit");
        assert_eq!(inserted, 1);
        assert_eq!(count(&connection), 1);
    }

    #[test]
    fn rolls_back_partial_writes_on_error() {
        let connection = connection();
        let result: Result<(), _> = run_in_transaction(&connection, "insert", |tx| {
            tx.execute("INSERT INTO items (name) VALUES ('a')", [])
                .map_err(|err| SqliteAdapterError::Db(err.to_string()))?;
            Err(SqliteAdapterError::Invalid("boom".to_string()))
        });
        assert!(matches!(result, Err(SqliteAdapterError::Invalid(_))));
        assert_eq!(count(&connection), 0);
    }

    #[test]
    fn releases_lock_after_failure() {
        let connection = connection();
        let _ = run_in_transaction(&connection, "fail", |_| -> Result<(), _> {
            Err(SqliteAdapterError::Invalid("boom".to_string()))
        });
        assert!(connection.try_lock().is_ok());
    }
}
