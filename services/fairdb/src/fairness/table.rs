//! Table view used for counting rule occurrences

use polars::prelude::*;
use serde::Serialize;
use std::collections::HashMap;

use crate::cfd::rule::{Conditions, Rule};
use crate::error::{FairDbError, Result};

/// Rows matching the LHS, the RHS, and both
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OccurrenceCounts {
    pub lhs: usize,
    pub rhs: usize,
    pub both: usize,
}

impl OccurrenceCounts {
    /// `both / lhs`, or 0.0 when nothing matches the LHS
    pub fn confidence(&self) -> f64 {
        if self.lhs == 0 {
            return 0.0;
        }
        self.both as f64 / self.lhs as f64
    }
}

/// Every column of a DataFrame cast to strings once, so rule values compare
/// by exact string equality regardless of the inferred dtype
pub struct RuleTable {
    height: usize,
    columns: HashMap<String, StringChunked>,
}

impl RuleTable {
    pub fn from_dataframe(df: &DataFrame) -> Result<Self> {
        let mut columns = HashMap::with_capacity(df.width());
        for series in df.get_columns() {
            let as_str = series.cast(&DataType::String)?;
            columns.insert(series.name().to_string(), as_str.str()?.clone());
        }
        Ok(Self {
            height: df.height(),
            columns,
        })
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Rows satisfying every condition. No conditions selects every row.
    fn mask(&self, conditions: &Conditions) -> Result<BooleanChunked> {
        let mut mask = BooleanChunked::full("mask", true, self.height);
        for (attr, value) in conditions {
            let column = self
                .columns
                .get(attr)
                .ok_or_else(|| FairDbError::UnknownColumn(attr.clone()))?;
            let matches = column.equal(value.as_str());
            mask = &mask & &matches;
        }
        Ok(mask)
    }

    pub fn count_occurrences(&self, rule: &Rule) -> Result<OccurrenceCounts> {
        if self.height == 0 {
            return Ok(OccurrenceCounts::default());
        }

        let lhs = self.mask(&rule.lhs)?;
        let rhs = self.mask(&rule.rhs)?;
        let both = &lhs & &rhs;

        Ok(OccurrenceCounts {
            lhs: count_true(&lhs),
            rhs: count_true(&rhs),
            both: count_true(&both),
        })
    }

    pub fn confidence(&self, rule: &Rule) -> Result<f64> {
        Ok(self.count_occurrences(rule)?.confidence())
    }
}

// nulls never match
fn count_true(mask: &BooleanChunked) -> usize {
    mask.into_iter().filter(|v| *v == Some(true)).count()
}
