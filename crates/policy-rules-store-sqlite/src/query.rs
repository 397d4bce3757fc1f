// crates/policy-rules-store-sqlite/src/query.rs
// ============================================================================
// Module: Rule Query Builder
// Description: SQL predicate construction over the rule table.
// Purpose: Translate filters and rule tuples into parameterized statements.
// Dependencies: policy-rules-core
// ============================================================================

//! ## Overview
//! [`RuleQuery`] accumulates AND-ed column predicates for a select, count, or
//! delete over a rule table. Every value is bound as a parameter; only column
//! names from the fixed rule layout and the validated table name are spliced
//! into SQL text. Building a query has no side effects.

use policy_rules_core::FIELD_COLUMNS;
use policy_rules_core::Filter;

/// Columns returned by select queries, in row-mapping order.
pub const SELECT_COLUMNS: &str = "id, ptype, v0, v1, v2, v3, v4, v5";

/// Statement shape produced by a [`RuleQuery`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    /// `SELECT` of full rule rows.
    Select,
    /// `SELECT COUNT(*)`.
    Count,
    /// `DELETE`.
    Delete,
}

/// Parameterized rule-table statement under construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleQuery {
    /// Statement shape.
    kind: QueryKind,
    /// Target table.
    table: &'static str,
    /// AND-ed predicates with `?` placeholders.
    predicates: Vec<String>,
    /// Bound values in placeholder order.
    params: Vec<String>,
    /// Whether selects are ordered by id.
    ordered: bool,
}

impl RuleQuery {
    /// Starts a select over full rule rows.
    #[must_use]
    pub const fn select(table: &'static str) -> Self {
        Self::new(QueryKind::Select, table)
    }

    /// Starts a row count.
    #[must_use]
    pub const fn count(table: &'static str) -> Self {
        Self::new(QueryKind::Count, table)
    }

    /// Starts a delete.
    #[must_use]
    pub const fn delete(table: &'static str) -> Self {
        Self::new(QueryKind::Delete, table)
    }

    /// Creates an unconstrained statement.
    const fn new(kind: QueryKind, table: &'static str) -> Self {
        Self {
            kind,
            table,
            predicates: Vec::new(),
            params: Vec::new(),
            ordered: false,
        }
    }

    /// Requires `column = value`.
    #[must_use]
    pub fn eq(mut self, column: &str, value: &str) -> Self {
        self.predicates.push(format!("{column} = ?"));
        self.params.push(value.to_string());
        self
    }

    /// Requires `column IN (values)`. An empty set adds no constraint.
    #[must_use]
    pub fn any_of(mut self, column: &str, values: &[String]) -> Self {
        if values.is_empty() {
            return self;
        }
        let placeholders = vec!["?"; values.len()].join(", ");
        self.predicates.push(format!("{column} IN ({placeholders})"));
        self.params.extend(values.iter().cloned());
        self
    }

    /// Orders select results by ascending id.
    #[must_use]
    pub fn order_by_id(mut self) -> Self {
        self.ordered = true;
        self
    }

    /// Returns the statement kind.
    #[must_use]
    pub const fn kind(&self) -> QueryKind {
        self.kind
    }

    /// Returns bound values in placeholder order.
    #[must_use]
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Renders the SQL text.
    #[must_use]
    pub fn sql(&self) -> String {
        let mut sql = match self.kind {
            QueryKind::Select => format!("SELECT {SELECT_COLUMNS} FROM {}", self.table),
            QueryKind::Count => format!("SELECT COUNT(*) FROM {}", self.table),
            QueryKind::Delete => format!("DELETE FROM {}", self.table),
        };
        if !self.predicates.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.predicates.join(" AND "));
        }
        if self.ordered && self.kind == QueryKind::Select {
            sql.push_str(" ORDER BY id ASC");
        }
        sql
    }
}

/// Restricts `query` to rows accepted by `filter`, ordered by id.
#[must_use]
pub fn filter_query(query: RuleQuery, filter: &Filter) -> RuleQuery {
    let query = query.any_of("ptype", &filter.ptype);
    FIELD_COLUMNS
        .iter()
        .zip(&filter.fields)
        .fold(query, |query, (column, values)| query.any_of(column, values))
        .order_by_id()
}

/// Restricts `query` to `ptype` rows whose leading fields equal `rule`.
///
/// Fields past the rule's length stay unconstrained. Callers validate the
/// rule's arity first; elements past the last value field are ignored.
#[must_use]
pub fn rule_query(query: RuleQuery, ptype: &str, rule: &[String]) -> RuleQuery {
    FIELD_COLUMNS
        .iter()
        .zip(rule)
        .fold(query.eq("ptype", ptype), |query, (column, value)| query.eq(column, value))
}

/// Renders `UPDATE ... SET v0 = ?1, ... WHERE id = ?{n+1}` for the first
/// `field_count` value fields.
#[must_use]
pub fn update_fields_sql(table: &str, field_count: usize) -> String {
    let assignments = FIELD_COLUMNS
        .iter()
        .take(field_count)
        .enumerate()
        .map(|(index, column)| format!("{column} = ?{}", index + 1))
        .collect::<Vec<_>>()
        .join(", ");
    let id_param = field_count.min(FIELD_COLUMNS.len()) + 1;
    format!("UPDATE {table} SET {assignments} WHERE id = ?{id_param}")
}

// ============================================================================
// SECTION: Tests
// ============================================================================
