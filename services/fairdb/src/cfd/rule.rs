//! Core rule types for parsed conditional functional dependencies

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;

use crate::config::CfdConfig;

/// Attribute → required value, ordered by attribute name
pub type Conditions = BTreeMap<String, String>;

/// Fully instantiated CFD: every LHS and RHS attribute carries a value
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rule {
    pub lhs: Conditions,
    pub rhs: Conditions,
}

impl Rule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an LHS condition; a repeated attribute keeps the last value
    pub fn with_lhs(mut self, attr: &str, value: &str) -> Self {
        self.lhs.insert(attr.to_string(), value.to_string());
        self
    }

    pub fn with_rhs(mut self, attr: &str, value: &str) -> Self {
        self.rhs.insert(attr.to_string(), value.to_string());
        self
    }

    /// Both sides constrain at least one attribute
    pub fn is_well_formed(&self) -> bool {
        !self.lhs.is_empty() && !self.rhs.is_empty()
    }

    /// True when any attribute on either side satisfies `pred`
    pub fn mentions<F: Fn(&str) -> bool>(&self, pred: F) -> bool {
        self.lhs.keys().chain(self.rhs.keys()).any(|k| pred(k.as_str()))
    }

    /// Copy of this rule with the LHS attributes matching `drop` removed
    pub fn without_lhs<F: Fn(&str) -> bool>(&self, drop: F) -> Rule {
        Rule {
            lhs: self
                .lhs
                .iter()
                .filter(|(k, _)| !drop(k.as_str()))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            rhs: self.rhs.clone(),
        }
    }

    /// Short stable identifier (sha256 over the canonical text)
    pub fn id(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.to_string().as_bytes());
        format!("{:x}", hasher.finalize())[..16].to_string()
    }
}

fn write_side(f: &mut fmt::Formatter<'_>, side: &Conditions) -> fmt::Result {
    for (i, (attr, value)) in side.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}={}", attr, value)?;
    }
    Ok(())
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_side(f, &self.lhs)?;
        write!(f, " => ")?;
        write_side(f, &self.rhs)
    }
}

/// Rule that passed the grammar check but still holds raw `attr=value` tokens
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizedRule {
    pub lhs: Vec<String>,
    pub rhs: Vec<String>,
}

/// Literals that delimit a rule line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleGrammar {
    pub arrow: String,
    pub separator: String,
}

impl RuleGrammar {
    pub fn new(arrow: &str, separator: &str) -> Self {
        Self {
            arrow: arrow.to_string(),
            separator: separator.to_string(),
        }
    }

    pub fn from_config(config: &CfdConfig) -> Self {
        Self::new(&config.arrow_string, &config.lhs_separator)
    }
}

impl Default for RuleGrammar {
    fn default() -> Self {
        Self::new(" => ", ", ")
    }
}

/// Exact `attr=value` tokens that disqualify a rule on either side
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Exclusions {
    pub lhs: Vec<String>,
    pub rhs: Vec<String>,
}

impl Exclusions {
    pub fn from_config(config: &CfdConfig) -> Self {
        Self {
            lhs: config.exclude_lhs.clone(),
            rhs: config.exclude_rhs.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lhs.is_empty() && self.rhs.is_empty()
    }
}
