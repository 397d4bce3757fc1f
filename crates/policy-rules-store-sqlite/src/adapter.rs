// crates/policy-rules-store-sqlite/src/adapter.rs
// ============================================================================
// Module: SQLite Policy Adapter
// Description: PolicyAdapter backed by a SQLite rule table.
// Purpose: Keep stored policy rules in sync with an in-memory policy model.
// Dependencies: policy-rules-core, rusqlite, tracing
// ============================================================================

//! ## Overview
//! [`SqliteAdapter`] stores one row per policy rule (`id`, `ptype`, `v0`..`v5`)
//! and implements [`PolicyAdapter`] over it. There is no in-memory cache:
//! every call round-trips through the database inside its own transaction
//! that commits on success and rolls back on error. The adapter is generic
//! over the [`RuleRecord`] type, which decides the backing table.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::marker::PhantomData;
use std::sync::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use policy_rules_core::AdapterError;
use policy_rules_core::CasbinRule;
use policy_rules_core::FIELD_COLUMNS;
use policy_rules_core::Filter;
use policy_rules_core::MAX_RULE_FIELDS;
use policy_rules_core::POLICY_SECTIONS;
use policy_rules_core::PolicyAdapter;
use policy_rules_core::PolicyModel;
use policy_rules_core::RuleRecord;
use policy_rules_core::load_policy_line;
use policy_rules_core::validate_rule;
use policy_rules_core::validate_values;
use rusqlite::Connection;
use rusqlite::Transaction;
use rusqlite::params;
use rusqlite::params_from_iter;
use rusqlite::types::Value;
use tracing::debug;
use tracing::info;

use crate::config::SqliteAdapterConfig;
use crate::config::open_connection;
use crate::error::SqliteAdapterError;
use crate::query::RuleQuery;
use crate::query::filter_query;
use crate::query::rule_query;
use crate::query::update_fields_sql;
use crate::scope::run_in_transaction;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum length of the backing table name.
const MAX_TABLE_NAME_LENGTH: usize = 64;

// ============================================================================
// SECTION: Adapter
// ============================================================================

/// `SQLite`-backed policy adapter.
///
/// # Invariants
/// - No stored row has a value field set past the first unset field.
/// - `filtered` becomes true after the first successful filtered load.
pub struct SqliteAdapter<R = CasbinRule> {
    /// Shared `SQLite` connection guarded by a mutex.
    connection: Mutex<Connection>,
    /// Whether the last populated model was only a filtered view.
    filtered: AtomicBool,
    /// Record type deciding the table layout.
    record: PhantomData<fn() -> R>,
}

impl SqliteAdapter<CasbinRule> {
    /// Opens an adapter over the `casbin_rule` table.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteAdapterError`] when the database cannot be opened or
    /// initialized.
    pub fn new(config: SqliteAdapterConfig) -> Result<Self, SqliteAdapterError> {
        Self::with_config(config)
    }

    /// Opens an adapter from a connection string with default pragmas.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteAdapterError`] when the connection string is invalid or
    /// the database cannot be opened.
    pub fn open(connection: &str) -> Result<Self, SqliteAdapterError> {
        Self::with_config(SqliteAdapterConfig::for_connection(connection))
    }

    /// Wraps an already open connection.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteAdapterError`] when the schema cannot be created.
    pub fn from_connection(
        connection: Connection,
        filtered: bool,
    ) -> Result<Self, SqliteAdapterError> {
        Self::with_connection(connection, filtered)
    }
}

impl<R: RuleRecord> SqliteAdapter<R> {
    /// Opens an adapter for record type `R` using `config`.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteAdapterError`] when the database cannot be opened or
    /// initialized.
    pub fn with_config(config: SqliteAdapterConfig) -> Result<Self, SqliteAdapterError> {
        let connection = open_connection(&config)?;
        Self::with_connection(connection, config.filtered)
    }

    /// Wraps an open connection for record type `R`, creating its table if
    /// absent.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteAdapterError`] when the table name is not a plain
    /// identifier or the schema cannot be created.
    pub fn with_connection(
        mut connection: Connection,
        filtered: bool,
    ) -> Result<Self, SqliteAdapterError> {
        validate_table_name(R::TABLE_NAME)?;
        initialize_schema(&mut connection, R::TABLE_NAME)?;
        info!(table = R::TABLE_NAME, filtered, "policy rule table ready");
        Ok(Self {
            connection: Mutex::new(connection),
            filtered: AtomicBool::new(filtered),
            record: PhantomData,
        })
    }

    /// Returns stored records accepted by `filter`, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteAdapterError`] when the query fails.
    pub fn rules(&self, filter: &Filter) -> Result<Vec<R>, SqliteAdapterError> {
        self.fetch_records("rules", &filter_query(RuleQuery::select(R::TABLE_NAME), filter))
    }

    /// Returns the number of stored rules.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteAdapterError`] when the query fails.
    pub fn rule_count(&self) -> Result<usize, SqliteAdapterError> {
        let query = RuleQuery::count(R::TABLE_NAME);
        let count: i64 = run_in_transaction(&self.connection, "rule_count", |tx| {
            tx.query_row(&query.sql(), params_from_iter(query.params()), |row| row.get(0))
                .map_err(|err| SqliteAdapterError::Db(err.to_string()))
        })?;
        usize::try_from(count).map_err(|_| SqliteAdapterError::Db("negative row count".to_string()))
    }

    /// Deletes each rule by exact leading-field match, all in one transaction.
    ///
    /// Unlike [`PolicyAdapter::remove_policies`], a row is only deleted when it
    /// matches one input rule on every supplied position. Returns whether any
    /// row was deleted.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteAdapterError`] when a rule is malformed or the delete
    /// fails; nothing is deleted in that case.
    pub fn remove_policies_exact(
        &self,
        ptype: &str,
        rules: &[Vec<String>],
    ) -> Result<bool, SqliteAdapterError> {
        if rules.is_empty() {
            return Ok(false);
        }
        for rule in rules {
            validate_values(rule)?;
        }
        let queries: Vec<RuleQuery> = rules
            .iter()
            .map(|rule| rule_query(RuleQuery::delete(R::TABLE_NAME), ptype, rule))
            .collect();
        let deleted = run_in_transaction(&self.connection, "remove_policies_exact", |tx| {
            queries.iter().try_fold(0usize, |total, query| {
                Ok::<usize, SqliteAdapterError>(total + execute_query(tx, query)?)
            })
        })?;
        debug!(ptype, deleted, "removed exact policy rules");
        Ok(deleted > 0)
    }
}

// ============================================================================
// SECTION: PolicyAdapter
// ============================================================================

impl<R: RuleRecord> PolicyAdapter for SqliteAdapter<R> {
    fn load_policy(&self, model: &mut dyn PolicyModel) -> Result<(), AdapterError> {
        self.load_rules(model, None).map_err(AdapterError::from)
    }

    fn load_filtered_policy(
        &self,
        model: &mut dyn PolicyModel,
        filter: &Filter,
    ) -> Result<(), AdapterError> {
        self.load_rules(model, Some(filter)).map_err(AdapterError::from)
    }

    fn is_filtered(&self) -> bool {
        self.filtered.load(Ordering::SeqCst)
    }

    fn save_policy(&self, model: &dyn PolicyModel) -> Result<bool, AdapterError> {
        self.replace_rules(model).map_err(AdapterError::from)
    }

    fn add_policy(&self, _sec: &str, ptype: &str, rule: &[String]) -> Result<(), AdapterError> {
        self.insert_rules("add_policy", ptype, &[rule.to_vec()])
            .map_err(AdapterError::from)
    }

    fn add_policies(
        &self,
        _sec: &str,
        ptype: &str,
        rules: &[Vec<String>],
    ) -> Result<(), AdapterError> {
        self.insert_rules("add_policies", ptype, rules).map_err(AdapterError::from)
    }

    fn remove_policy(
        &self,
        _sec: &str,
        ptype: &str,
        rule: &[String],
    ) -> Result<bool, AdapterError> {
        self.delete_rule(ptype, rule).map_err(AdapterError::from)
    }

    fn remove_policies(
        &self,
        _sec: &str,
        ptype: &str,
        rules: &[Vec<String>],
    ) -> Result<bool, AdapterError> {
        self.delete_rules_by_position(ptype, rules).map_err(AdapterError::from)
    }

    fn remove_filtered_policy(
        &self,
        _sec: &str,
        ptype: &str,
        field_index: usize,
        field_values: &[String],
    ) -> Result<bool, AdapterError> {
        self.delete_filtered(ptype, field_index, field_values).map_err(AdapterError::from)
    }

    fn update_policy(
        &self,
        _sec: &str,
        ptype: &str,
        old_rule: &[String],
        new_rule: &[String],
    ) -> Result<(), AdapterError> {
        self.update_rule(ptype, old_rule, new_rule).map_err(AdapterError::from)
    }

    fn update_policies(
        &self,
        _sec: &str,
        ptype: &str,
        old_rules: &[Vec<String>],
        new_rules: &[Vec<String>],
    ) -> Result<(), AdapterError> {
        if old_rules.len() != new_rules.len() {
            return Err(AdapterError::Invalid(format!(
                "update_policies needs equal-length lists (old {}, new {})",
                old_rules.len(),
                new_rules.len()
            )));
        }
        for (old_rule, new_rule) in old_rules.iter().zip(new_rules) {
            self.update_rule(ptype, old_rule, new_rule)?;
        }
        Ok(())
    }
}

impl<R: RuleRecord> SqliteAdapter<R> {
    /// Feeds stored rules (optionally filtered) into the model as lines.
    fn load_rules(
        &self,
        model: &mut dyn PolicyModel,
        filter: Option<&Filter>,
    ) -> Result<(), SqliteAdapterError> {
        let (operation, query) = match filter {
            Some(filter) => {
                ("load_filtered_policy", filter_query(RuleQuery::select(R::TABLE_NAME), filter))
            }
            None => ("load_policy", RuleQuery::select(R::TABLE_NAME).order_by_id()),
        };
        let records = self.fetch_records(operation, &query)?;
        for record in &records {
            load_policy_line(&record.to_line(), model);
        }
        if filter.is_some() {
            self.filtered.store(true, Ordering::SeqCst);
        }
        debug!(operation, loaded = records.len(), "policy rules loaded");
        Ok(())
    }

    /// Replaces the table contents with the model's `p` and `g` sections.
    fn replace_rules(&self, model: &dyn PolicyModel) -> Result<bool, SqliteAdapterError> {
        let mut records = Vec::new();
        for sec in POLICY_SECTIONS {
            for ptype in model.policy_types(sec) {
                for rule in model.rules(sec, &ptype) {
                    records.push(R::from_rule(&ptype, &rule)?);
                }
            }
        }
        let deleted = run_in_transaction(&self.connection, "save_policy", |tx| {
            let deleted = execute_query(tx, &RuleQuery::delete(R::TABLE_NAME))?;
            for record in &records {
                insert_record(tx, record)?;
            }
            Ok(deleted)
        })?;
        info!(deleted, inserted = records.len(), "policy rule table replaced");
        Ok(true)
    }

    /// Inserts rules under `ptype` in one transaction.
    fn insert_rules(
        &self,
        operation: &'static str,
        ptype: &str,
        rules: &[Vec<String>],
    ) -> Result<(), SqliteAdapterError> {
        let records =
            rules.iter().map(|rule| R::from_rule(ptype, rule)).collect::<Result<Vec<_>, _>>()?;
        if records.is_empty() {
            return Ok(());
        }
        run_in_transaction(&self.connection, operation, |tx| {
            for record in &records {
                insert_record(tx, record)?;
            }
            Ok(())
        })?;
        debug!(operation, ptype, inserted = records.len(), "policy rules added");
        Ok(())
    }

    /// Deletes rows whose leading fields equal `rule`.
    fn delete_rule(&self, ptype: &str, rule: &[String]) -> Result<bool, SqliteAdapterError> {
        validate_values(rule)?;
        let query = rule_query(RuleQuery::delete(R::TABLE_NAME), ptype, rule);
        let deleted =
            run_in_transaction(&self.connection, "remove_policy", |tx| execute_query(tx, &query))?;
        debug!(ptype, deleted, "removed policy rule");
        Ok(deleted > 0)
    }

    /// Deletes rows matching the per-position value sets of `rules`.
    ///
    /// Positions are taken up to the shortest rule's length and matched
    /// independently of each other.
    fn delete_rules_by_position(
        &self,
        ptype: &str,
        rules: &[Vec<String>],
    ) -> Result<bool, SqliteAdapterError> {
        if rules.is_empty() {
            return Ok(false);
        }
        for rule in rules {
            validate_values(rule)?;
        }
        let positions = rules.iter().map(Vec::len).min().unwrap_or(0);
        let query = FIELD_COLUMNS.iter().enumerate().take(positions).fold(
            RuleQuery::delete(R::TABLE_NAME).eq("ptype", ptype),
            |query, (index, column)| {
                let values: Vec<String> =
                    rules.iter().filter_map(|rule| rule.get(index).cloned()).collect();
                query.any_of(column, &values)
            },
        );
        let deleted = run_in_transaction(&self.connection, "remove_policies", |tx| {
            execute_query(tx, &query)
        })?;
        debug!(ptype, deleted, "removed policy rules");
        Ok(deleted > 0)
    }

    /// Deletes rows matching non-empty `field_values` from `field_index` on.
    fn delete_filtered(
        &self,
        ptype: &str,
        field_index: usize,
        field_values: &[String],
    ) -> Result<bool, SqliteAdapterError> {
        let end = field_index.saturating_add(field_values.len());
        if field_index >= MAX_RULE_FIELDS || !(1 ..= MAX_RULE_FIELDS).contains(&end) {
            debug!(ptype, field_index, values = field_values.len(), "filtered removal out of bounds");
            return Ok(false);
        }
        let query = FIELD_COLUMNS
            .iter()
            .skip(field_index)
            .zip(field_values)
            .filter(|(_, value)| !value.is_empty())
            .fold(RuleQuery::delete(R::TABLE_NAME).eq("ptype", ptype), |query, (column, value)| {
                query.eq(column, value)
            });
        let deleted = run_in_transaction(&self.connection, "remove_filtered_policy", |tx| {
            execute_query(tx, &query)
        })?;
        debug!(ptype, field_index, deleted, "removed filtered policy rules");
        Ok(deleted > 0)
    }

    /// Rewrites the single row matching `old_rule` with `new_rule`.
    fn update_rule(
        &self,
        ptype: &str,
        old_rule: &[String],
        new_rule: &[String],
    ) -> Result<(), SqliteAdapterError> {
        validate_values(old_rule)?;
        validate_rule(ptype, new_rule)?;
        let select = rule_query(RuleQuery::select(R::TABLE_NAME), ptype, old_rule);
        let field_count = old_rule.len().max(new_rule.len());
        let mut values: Vec<Value> = (0 .. field_count)
            .map(|index| new_rule.get(index).map_or(Value::Null, |value| Value::Text(value.clone())))
            .collect();
        run_in_transaction(&self.connection, "update_policy", |tx| {
            let ids = select_ids(tx, &select)?;
            let id = match ids.as_slice() {
                [id] => *id,
                [] => {
                    return Err(SqliteAdapterError::NotFound(format!(
                        "no {ptype} rule matches [{}]",
                        old_rule.join(", ")
                    )));
                }
                _ => {
                    return Err(SqliteAdapterError::Ambiguous(format!(
                        "{} {ptype} rules match [{}]",
                        ids.len(),
                        old_rule.join(", ")
                    )));
                }
            };
            if field_count == 0 {
                return Ok(());
            }
            values.push(Value::Integer(id));
            tx.execute(&update_fields_sql(R::TABLE_NAME, field_count), params_from_iter(&values))
                .map_err(|err| SqliteAdapterError::Db(err.to_string()))?;
            Ok(())
        })?;
        debug!(ptype, fields = field_count, "updated policy rule");
        Ok(())
    }

    /// Runs a select and builds records from its rows.
    fn fetch_records(
        &self,
        operation: &'static str,
        query: &RuleQuery,
    ) -> Result<Vec<R>, SqliteAdapterError> {
        let rows = run_in_transaction(&self.connection, operation, |tx| {
            let mut statement =
                tx.prepare(&query.sql()).map_err(|err| SqliteAdapterError::Db(err.to_string()))?;
            let mapped = statement
                .query_map(params_from_iter(query.params()), map_rule_row)
                .map_err(|err| SqliteAdapterError::Db(err.to_string()))?;
            let mut rows = Vec::new();
            for row in mapped {
                rows.push(row.map_err(|err| SqliteAdapterError::Db(err.to_string()))?);
            }
            Ok(rows)
        })?;
        rows.into_iter().map(build_record::<R>).collect()
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Raw rule row in column order.
struct RuleRow {
    /// Row identifier.
    id: i64,
    /// Policy type tag.
    ptype: String,
    /// Value fields `v0`..`v5`.
    values: [Option<String>; MAX_RULE_FIELDS],
}

/// Maps a select row onto [`RuleRow`].
fn map_rule_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RuleRow> {
    Ok(RuleRow {
        id: row.get(0)?,
        ptype: row.get(1)?,
        values: [row.get(2)?, row.get(3)?, row.get(4)?, row.get(5)?, row.get(6)?, row.get(7)?],
    })
}

/// Builds a record of type `R` from a raw row.
fn build_record<R: RuleRecord>(row: RuleRow) -> Result<R, SqliteAdapterError> {
    let mut record = R::new(&row.ptype);
    record.set_id(row.id);
    for (index, value) in row.values.into_iter().enumerate() {
        record.set_field(index, value)?;
    }
    Ok(record)
}

/// Inserts one record and returns its assigned id.
fn insert_record<R: RuleRecord>(
    tx: &Transaction<'_>,
    record: &R,
) -> Result<i64, SqliteAdapterError> {
    tx.execute(
        &format!(
            "INSERT INTO {} (ptype, v0, v1, v2, v3, v4, v5) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            R::TABLE_NAME
        ),
        params![
            record.ptype(),
            record.field(0),
            record.field(1),
            record.field(2),
            record.field(3),
            record.field(4),
            record.field(5)
        ],
    )
    .map_err(|err| SqliteAdapterError::Db(err.to_string()))?;
    Ok(tx.last_insert_rowid())
}

/// Executes a delete (or other non-returning) query and returns affected rows.
fn execute_query(tx: &Transaction<'_>, query: &RuleQuery) -> Result<usize, SqliteAdapterError> {
    tx.execute(&query.sql(), params_from_iter(query.params()))
        .map_err(|err| SqliteAdapterError::Db(err.to_string()))
}

/// Returns the ids of rows selected by `query`.
fn select_ids(tx: &Transaction<'_>, query: &RuleQuery) -> Result<Vec<i64>, SqliteAdapterError> {
    let mut statement =
        tx.prepare(&query.sql()).map_err(|err| SqliteAdapterError::Db(err.to_string()))?;
    let mapped = statement
        .query_map(params_from_iter(query.params()), |row| row.get::<_, i64>(0))
        .map_err(|err| SqliteAdapterError::Db(err.to_string()))?;
    let mut ids = Vec::new();
    for id in mapped {
        ids.push(id.map_err(|err| SqliteAdapterError::Db(err.to_string()))?);
    }
    Ok(ids)
}

/// Validates that a table name is a plain SQL identifier.
fn validate_table_name(table: &str) -> Result<(), SqliteAdapterError> {
    let mut chars = table.chars();
    let valid_start = chars.next().is_some_and(|ch| ch.is_ascii_alphabetic() || ch == '_');
    let valid_rest = chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_');
    if !valid_start || !valid_rest || table.len() > MAX_TABLE_NAME_LENGTH {
        return Err(SqliteAdapterError::Invalid(format!("invalid rule table name: {table}")));
    }
    Ok(())
}

/// Creates the rule table and its `ptype` index if absent.
fn initialize_schema(connection: &mut Connection, table: &str) -> Result<(), SqliteAdapterError> {
    let tx = connection.transaction().map_err(|err| SqliteAdapterError::Db(err.to_string()))?;
    tx.execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS {table} (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            ptype VARCHAR(255) NOT NULL,
            v0 VARCHAR(255),
            v1 VARCHAR(255),
            v2 VARCHAR(255),
            v3 VARCHAR(255),
            v4 VARCHAR(255),
            v5 VARCHAR(255)
        );
        CREATE INDEX IF NOT EXISTS idx_{table}_ptype ON {table} (ptype);"
    ))
    .map_err(|err| SqliteAdapterError::Db(err.to_string()))?;
    tx.commit().map_err(|err| SqliteAdapterError::Db(err.to_string()))?;
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================
