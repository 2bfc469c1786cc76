use crate::error::FairDbError;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default)]
    pub cfd: CfdConfig,
    pub fairness: FairnessConfig,
}

/// Settings for the external miner and the rule text grammar
#[derive(Debug, Clone, Deserialize)]
pub struct CfdConfig {
    #[serde(default)]
    pub executable_path: Option<String>,
    #[serde(default = "default_support_count")]
    pub support_count: u64,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
    #[serde(default = "default_max_condition_size")]
    pub max_condition_size: u32,
    /// Literal token a line must contain, e.g. `income=` (trailing `=` included)
    #[serde(default = "default_target_literal")]
    pub target_attribute: String,
    #[serde(default = "default_arrow_string")]
    pub arrow_string: String,
    #[serde(default = "default_lhs_separator")]
    pub lhs_separator: String,
    #[serde(default)]
    pub exclude_lhs: Vec<String>,
    #[serde(default)]
    pub exclude_rhs: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FairnessConfig {
    pub protected_attributes: BTreeSet<String>,
    /// Bare column name of the outcome, e.g. `income`
    pub target_attribute: String,
    #[serde(default)]
    pub min_diff: f64,
    #[serde(default = "default_true")]
    pub deduplicate: bool,
    #[serde(default)]
    pub equality: RuleEquality,
}

/// Relation used when deduplicating scored rules
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleEquality {
    /// Same LHS map and same RHS map
    #[default]
    Exact,
    /// Every pair of the first rule appears in the second (one-directional)
    Covering,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config from {:?}", path.as_ref()))?;
        let config: Config = toml::from_str(&content)
            .context("Failed to parse config TOML")?;
        config.validate().context("Invalid configuration")?;
        Ok(config)
    }

    pub fn validate(&self) -> crate::Result<()> {
        self.cfd.validate()?;
        if self.fairness.protected_attributes.is_empty() {
            return Err(FairDbError::InvalidConfig(
                "fairness.protected_attributes must not be empty".to_string(),
            ));
        }
        if self.fairness.target_attribute.trim().is_empty() {
            return Err(FairDbError::InvalidConfig(
                "fairness.target_attribute must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl CfdConfig {
    /// Path of the mining executable; required only when discovery runs
    pub fn executable(&self) -> crate::Result<&str> {
        self.executable_path
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .ok_or(FairDbError::MissingConfig("cfd.executable_path"))
    }

    pub fn validate(&self) -> crate::Result<()> {
        if !(self.confidence > 0.0 && self.confidence <= 1.0) {
            return Err(FairDbError::InvalidConfig(format!(
                "cfd.confidence must be in (0, 1], got {}",
                self.confidence
            )));
        }
        if self.arrow_string.is_empty() {
            return Err(FairDbError::InvalidConfig("cfd.arrow_string is empty".to_string()));
        }
        if self.lhs_separator.is_empty() {
            return Err(FairDbError::InvalidConfig("cfd.lhs_separator is empty".to_string()));
        }
        Ok(())
    }
}

impl Default for CfdConfig {
    fn default() -> Self {
        Self {
            executable_path: None,
            support_count: default_support_count(),
            confidence: default_confidence(),
            max_condition_size: default_max_condition_size(),
            target_attribute: default_target_literal(),
            arrow_string: default_arrow_string(),
            lhs_separator: default_lhs_separator(),
            exclude_lhs: Vec::new(),
            exclude_rhs: Vec::new(),
        }
    }
}

fn default_data_dir() -> String {
    "outputs".to_string()
}

fn default_support_count() -> u64 {
    900
}

fn default_confidence() -> f64 {
    0.9
}

fn default_max_condition_size() -> u32 {
    3
}

fn default_target_literal() -> String {
    "income=".to_string()
}

fn default_arrow_string() -> String {
    " => ".to_string()
}

fn default_lhs_separator() -> String {
    ", ".to_string()
}

fn default_true() -> bool {
    true
}
