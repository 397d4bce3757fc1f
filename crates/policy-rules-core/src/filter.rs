// crates/policy-rules-core/src/filter.rs
// ============================================================================
// Module: Rule Filters
// Description: Sparse rule-shaped selection criteria.
// Purpose: Describe which stored rules a filtered load should return.
// Dependencies: crate::rule
// ============================================================================

//! ## Overview
//! A [`Filter`] holds one set of acceptable values per rule column (`ptype`
//! and `v0`..`v5`). An empty set leaves that column unconstrained; non-empty
//! sets are combined with logical AND across columns. Filters are transient
//! inputs and are never persisted.

use crate::rule::MAX_RULE_FIELDS;
use crate::rule::RuleError;

/// Per-column value sets used to narrow a policy load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    /// Acceptable `ptype` values; empty means any.
    pub ptype: Vec<String>,
    /// Acceptable values for `v0`..`v5`, addressed by position; empty means any.
    pub fields: [Vec<String>; MAX_RULE_FIELDS],
}

impl Filter {
    /// Creates a filter with no constraints.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts the filter to the given policy types.
    #[must_use]
    pub fn with_ptype<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ptype = values.into_iter().map(Into::into).collect();
        self
    }

    /// Restricts value field `index` to the given values.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::ArityExceeded`] when `index` is not a value field.
    pub fn with_field<I, S>(mut self, index: usize, values: I) -> Result<Self, RuleError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let Some(slot) = self.fields.get_mut(index) else {
            return Err(RuleError::ArityExceeded {
                arity: index + 1,
                max: MAX_RULE_FIELDS,
            });
        };
        *slot = values.into_iter().map(Into::into).collect();
        Ok(self)
    }

    /// Returns true when no column is constrained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ptype.is_empty() && self.fields.iter().all(Vec::is_empty)
    }
}
