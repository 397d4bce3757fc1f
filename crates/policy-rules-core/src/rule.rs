// crates/policy-rules-core/src/rule.rs
// ============================================================================
// Module: Rule Records
// Description: Persisted shape of a single policy rule.
// Purpose: Define the record contract shared by every storage backend.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! A policy rule is a variable-arity tuple `(ptype, v0, ..., vk)` stored as a
//! fixed-width record of six optional value fields. Trailing fields beyond the
//! rule's arity are unset, and the first unset field ends the tuple when the
//! record is rendered into its canonical line form (`"p, alice, data1, read"`).
//!
//! Backends are generic over [`RuleRecord`], so an embedder may substitute its
//! own record type (and table) as long as it keeps the same field layout.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Number of positional value fields (`v0`..`v5`) in a rule record.
pub const MAX_RULE_FIELDS: usize = 6;
/// Maximum byte length of `ptype` and of each value field.
pub const MAX_FIELD_LENGTH: usize = 255;
/// Column names of the positional value fields, addressed by index.
pub const FIELD_COLUMNS: [&str; MAX_RULE_FIELDS] = ["v0", "v1", "v2", "v3", "v4", "v5"];
/// Table name used by [`CasbinRule`].
pub const DEFAULT_TABLE_NAME: &str = "casbin_rule";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Rule shape validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    /// Rule has more elements than there are value fields.
    #[error("rule arity {arity} exceeds the {max} available value fields")]
    ArityExceeded {
        /// Number of elements supplied.
        arity: usize,
        /// Number of value fields available.
        max: usize,
    },
    /// A value field is longer than the column bound.
    #[error("rule field v{index} exceeds {max} bytes")]
    FieldTooLong {
        /// Position of the offending field.
        index: usize,
        /// Column bound in bytes.
        max: usize,
    },
    /// Policy type tag is empty or longer than the column bound.
    #[error("invalid ptype: {0}")]
    InvalidPtype(String),
}

// ============================================================================
// SECTION: Record Contract
// ============================================================================

/// Storage record for one policy rule.
///
/// # Invariants
/// - `field(i)` for `i >= MAX_RULE_FIELDS` is always `None`.
/// - No field after the first unset field carries meaning for the tuple.
pub trait RuleRecord: Sized {
    /// Backing table name. Must be a plain SQL identifier.
    const TABLE_NAME: &'static str;

    /// Creates an unsaved record with the given policy type and no values.
    fn new(ptype: &str) -> Self;

    /// Returns the storage-assigned identifier, if persisted.
    fn id(&self) -> Option<i64>;

    /// Sets the storage-assigned identifier.
    fn set_id(&mut self, id: i64);

    /// Returns the policy type tag.
    fn ptype(&self) -> &str;

    /// Returns the value field at `index`, if set.
    fn field(&self, index: usize) -> Option<&str>;

    /// Sets (or clears, with `None`) the value field at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::ArityExceeded`] when `index` is not a value field.
    fn set_field(&mut self, index: usize, value: Option<String>) -> Result<(), RuleError>;

    /// Renders the canonical line form, stopping at the first unset field.
    fn to_line(&self) -> String {
        let mut line = self.ptype().to_string();
        for index in 0 .. MAX_RULE_FIELDS {
            let Some(value) = self.field(index) else {
                break;
            };
            line.push_str(", ");
            line.push_str(value);
        }
        line
    }

    /// Returns the rule tuple (without ptype), stopping at the first unset field.
    fn values(&self) -> Vec<String> {
        (0 .. MAX_RULE_FIELDS).map_while(|index| self.field(index).map(str::to_string)).collect()
    }

    /// Builds a record from a ptype and a positional rule tuple.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError`] when the ptype or rule fails validation.
    fn from_rule(ptype: &str, rule: &[String]) -> Result<Self, RuleError> {
        validate_rule(ptype, rule)?;
        let mut record = Self::new(ptype);
        for (index, value) in rule.iter().enumerate() {
            record.set_field(index, Some(value.clone()))?;
        }
        Ok(record)
    }
}

/// Validates a policy type tag against the column bound.
///
/// # Errors
///
/// Returns [`RuleError::InvalidPtype`] when the tag is empty or too long.
pub fn validate_ptype(ptype: &str) -> Result<(), RuleError> {
    if ptype.is_empty() {
        return Err(RuleError::InvalidPtype("ptype must be non-empty".to_string()));
    }
    if ptype.len() > MAX_FIELD_LENGTH {
        return Err(RuleError::InvalidPtype(format!("ptype exceeds {MAX_FIELD_LENGTH} bytes")));
    }
    Ok(())
}

/// Validates a rule tuple's arity and field lengths.
///
/// # Errors
///
/// Returns [`RuleError`] when the rule has too many elements or an element is
/// longer than [`MAX_FIELD_LENGTH`].
pub fn validate_values(rule: &[String]) -> Result<(), RuleError> {
    if rule.len() > MAX_RULE_FIELDS {
        return Err(RuleError::ArityExceeded {
            arity: rule.len(),
            max: MAX_RULE_FIELDS,
        });
    }
    if let Some(index) = rule.iter().position(|value| value.len() > MAX_FIELD_LENGTH) {
        return Err(RuleError::FieldTooLong {
            index,
            max: MAX_FIELD_LENGTH,
        });
    }
    Ok(())
}

/// Validates a full `(ptype, rule)` pair.
///
/// # Errors
///
/// Returns [`RuleError`] when either part fails validation.
pub fn validate_rule(ptype: &str, rule: &[String]) -> Result<(), RuleError> {
    validate_ptype(ptype)?;
    validate_values(rule)
}

// ============================================================================
// SECTION: Default Record
// ============================================================================

/// Default rule record stored in the `casbin_rule` table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CasbinRule {
    /// Storage-assigned identifier.
    pub id: Option<i64>,
    /// Policy type tag.
    pub ptype: String,
    /// Value field 0.
    pub v0: Option<String>,
    /// Value field 1.
    pub v1: Option<String>,
    /// Value field 2.
    pub v2: Option<String>,
    /// Value field 3.
    pub v3: Option<String>,
    /// Value field 4.
    pub v4: Option<String>,
    /// Value field 5.
    pub v5: Option<String>,
}

impl CasbinRule {
    /// Returns a short diagnostic form: `<CasbinRule 7: "p, alice, data1">`.
    #[must_use]
    pub fn describe(&self) -> String {
        let id = self.id.map_or_else(|| "unsaved".to_string(), |id| id.to_string());
        format!("<CasbinRule {id}: \"{}\">", self.to_line())
    }
}

impl RuleRecord for CasbinRule {
    const TABLE_NAME: &'static str = DEFAULT_TABLE_NAME;

    fn new(ptype: &str) -> Self {
        Self {
            ptype: ptype.to_string(),
            ..Self::default()
        }
    }

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn ptype(&self) -> &str {
        &self.ptype
    }

    fn field(&self, index: usize) -> Option<&str> {
        let slot = match index {
            0 => &self.v0,
            1 => &self.v1,
            2 => &self.v2,
            3 => &self.v3,
            4 => &self.v4,
            5 => &self.v5,
            _ => return None,
        };
        slot.as_deref()
    }

    fn set_field(&mut self, index: usize, value: Option<String>) -> Result<(), RuleError> {
        let slot = match index {
            0 => &mut self.v0,
            1 => &mut self.v1,
            2 => &mut self.v2,
            3 => &mut self.v3,
            4 => &mut self.v4,
            5 => &mut self.v5,
            _ => {
                return Err(RuleError::ArityExceeded {
                    arity: index + 1,
                    max: MAX_RULE_FIELDS,
                });
            }
        };
        *slot = value;
        Ok(())
    }
}

impl fmt::Display for CasbinRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_line())
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only assertions are permitted."
    )]

    use super::*;

    fn rule(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| (*value).to_string()).collect()
    }

    #[test]
    fn line_stops_at_first_unset_field() {
        let mut record = CasbinRule::new("p");
        record.v0 = Some("alice".to_string());
        record.v1 = Some("data1".to_string());
        record.v3 = Some("ignored".to_string());
        assert_eq!(record.to_line(), "p, alice, data1");
        assert_eq!(record.values(), rule(&["alice", "data1"]));
    }

    #[test]
    fn line_keeps_empty_string_values() {
        let record = CasbinRule::from_rule("p", &rule(&["alice", "", "read"])).unwrap();
        assert_eq!(record.to_line(), "p, alice, , read");
    }

    #[test]
    fn from_rule_fills_fields_positionally() {
        let record =
            CasbinRule::from_rule("g", &rule(&["a", "b", "c", "d", "e", "f"])).expect("record");
        assert_eq!(record.v5.as_deref(), Some("f"));
        assert_eq!(record.to_string(), "g, a, b, c, d, e, f");
    }

    #[test]
    fn from_rule_rejects_seven_elements() {
        let err = CasbinRule::from_rule("p", &rule(&["a", "b", "c", "d", "e", "f", "g"]))
            .expect_err("arity");
        assert_eq!(err, RuleError::ArityExceeded {
            arity: 7,
            max: MAX_RULE_FIELDS
        });
    }

    #[test]
    fn from_rule_rejects_overlong_value() {
        let long = "x".repeat(MAX_FIELD_LENGTH + 1);
        let err = CasbinRule::from_rule("p", &[String::from("ok"), long]).expect_err("length");
        assert_eq!(err, RuleError::FieldTooLong {
            index: 1,
            max: MAX_FIELD_LENGTH
        });
    }

    #[test]
    fn empty_ptype_is_rejected() {
        assert!(matches!(validate_ptype(""), Err(RuleError::InvalidPtype(_))));
    }

    #[test]
    fn set_field_outside_layout_is_an_error() {
        let mut record = CasbinRule::new("p");
        assert!(record.set_field(6, Some("x".to_string())).is_err());
        assert_eq!(record.field(6), None);
    }

    #[test]
    fn describe_includes_id_and_line() {
        let mut record = CasbinRule::from_rule("p", &rule(&["alice"])).unwrap();
        assert_eq!(record.describe(), "<CasbinRule unsaved: \"p, alice\">");
        record.set_id(7);
        assert_eq!(record.describe(), "<CasbinRule 7: \"p, alice\">");
    }
}
