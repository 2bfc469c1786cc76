//! Output writing for scored rules (CSV, Parquet and JSON via polars)

use polars::prelude::*;
use std::collections::BTreeSet;
use std::path::Path;

use crate::error::{FairDbError, Result};
use crate::fairness::scoring::ScoredRule;

/// File formats the scored table can be written as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Parquet,
    Json,
}

impl OutputFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "parquet" => Ok(OutputFormat::Parquet),
            "json" => Ok(OutputFormat::Json),
            other => Err(FairDbError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Build the scored table, one `<attr>Diff` column per protected attribute
pub fn scored_rules_dataframe(
    records: &[ScoredRule],
    protected: &BTreeSet<String>,
) -> Result<DataFrame> {
    let rule_id_col: Vec<&str> = records.iter().map(|r| r.rule_id.as_str()).collect();
    let rule_col: Vec<String> = records.iter().map(|r| r.rule.to_string()).collect();

    // Keep each side as a JSON object so it can be read back unambiguously
    let lhs_col: Vec<String> = records
        .iter()
        .map(|r| serde_json::to_string(&r.rule.lhs).unwrap_or_default())
        .collect();
    let rhs_col: Vec<String> = records
        .iter()
        .map(|r| serde_json::to_string(&r.rule.rhs).unwrap_or_default())
        .collect();

    let count_lhs_col: Vec<u64> = records.iter().map(|r| r.counts.lhs as u64).collect();
    let count_rhs_col: Vec<u64> = records.iter().map(|r| r.counts.rhs as u64).collect();
    let count_both_col: Vec<u64> = records.iter().map(|r| r.counts.both as u64).collect();
    let support_col: Vec<f64> = records.iter().map(|r| r.support).collect();
    let confidence_col: Vec<f64> = records.iter().map(|r| r.confidence).collect();
    let no_protected_col: Vec<f64> = records.iter().map(|r| r.confidence_no_protected).collect();
    let diff_col: Vec<f64> = records.iter().map(|r| r.diff).collect();

    let mut columns = vec![
        Series::new("rule_id", rule_id_col),
        Series::new("rule", rule_col),
        Series::new("lhs", lhs_col),
        Series::new("rhs", rhs_col),
        Series::new("count_lhs", count_lhs_col),
        Series::new("count_rhs", count_rhs_col),
        Series::new("count_both", count_both_col),
        Series::new("support", support_col),
        Series::new("confidence", confidence_col),
        Series::new("confidence_no_protected", no_protected_col),
        Series::new("diff", diff_col),
    ];

    for attr in protected {
        let attr_diff_col: Vec<Option<f64>> = records
            .iter()
            .map(|r| r.protected_diffs.get(attr).copied())
            .collect();
        columns.push(Series::new(&format!("{}Diff", attr), attr_diff_col));
    }

    Ok(DataFrame::new(columns)?)
}

/// Write the scored table; the format follows the file extension
pub fn write_scored_rules<P: AsRef<Path>>(
    path: P,
    records: &[ScoredRule],
    protected: &BTreeSet<String>,
) -> Result<()> {
    let path = path.as_ref();
    let format = OutputFormat::from_path(path)?;
    let mut df = scored_rules_dataframe(records, protected)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut file = std::fs::File::create(path)?;
    match format {
        OutputFormat::Csv => {
            CsvWriter::new(&mut file).finish(&mut df)?;
        }
        OutputFormat::Parquet => {
            ParquetWriter::new(file).finish(&mut df)?;
        }
        OutputFormat::Json => {
            JsonWriter::new(&mut file)
                .with_json_format(JsonFormat::Json)
                .finish(&mut df)?;
        }
    }

    tracing::info!("Wrote {} scored rules to {:?}", records.len(), path);
    Ok(())
}

/// First `limit` rows of the scored table, restricted to the summary columns
pub fn summary_table(
    records: &[ScoredRule],
    protected: &BTreeSet<String>,
    limit: usize,
) -> Result<DataFrame> {
    let mut shown: Vec<String> = ["rule", "support", "confidence", "diff"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    shown.extend(protected.iter().map(|attr| format!("{}Diff", attr)));

    let df = scored_rules_dataframe(records, protected)?;
    Ok(df.head(Some(limit)).select(shown)?)
}

/// Print the first rows of the scored table
pub fn print_summary(records: &[ScoredRule], protected: &BTreeSet<String>, limit: usize) {
    println!("\n=== Fairness Summary ===");
    println!("Rules above threshold: {}", records.len());

    match summary_table(records, protected, limit) {
        Ok(df) => println!("{}", df),
        Err(e) => tracing::warn!("Failed to build summary table: {}", e),
    }
}
