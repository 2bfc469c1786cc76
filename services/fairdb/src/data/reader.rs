use polars::prelude::*;
use std::path::Path;
use tracing::{info, warn};

use crate::error::{FairDbError, Result};

/// Input formats accepted for the evaluation table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Json,
    Parquet,
}

impl TableFormat {
    /// Resolve the format from the file extension (case-insensitive)
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "csv" => Ok(TableFormat::Csv),
            "json" => Ok(TableFormat::Json),
            "parquet" => Ok(TableFormat::Parquet),
            other => Err(FairDbError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Load a table and drop `Unnamed*` index columns
pub fn read_table<P: AsRef<Path>>(path: P) -> Result<DataFrame> {
    let path = path.as_ref();
    let format = TableFormat::from_path(path)?;

    if !path.exists() {
        return Err(FairDbError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("File not found: {:?}", path),
        )));
    }

    let df = match format {
        TableFormat::Csv => read_csv(path)?,
        TableFormat::Json => JsonReader::new(std::fs::File::open(path)?).finish()?,
        TableFormat::Parquet => ParquetReader::new(std::fs::File::open(path)?).finish()?,
    };

    let df = drop_unnamed(df)?;
    info!("Loaded {} rows x {} columns from {:?}", df.height(), df.width(), path);
    Ok(df)
}

// Every column is read as text so cells compare exactly as the miner saw them
fn read_csv_with(path: &Path, separator: u8) -> PolarsResult<DataFrame> {
    LazyCsvReader::new(path)
        .with_separator(separator)
        .with_infer_schema_length(Some(0))
        .finish()?
        .collect()
}

// A ';'-separated file read with ',' comes back as one column named "a;b;c"
fn looks_semicolon_separated(df: &DataFrame) -> bool {
    df.width() == 1
        && df
            .get_column_names()
            .first()
            .map(|name| name.contains(';'))
            .unwrap_or(false)
}

fn read_csv(path: &Path) -> Result<DataFrame> {
    let df = read_csv_with(path, b',')?;
    if !looks_semicolon_separated(&df) {
        return Ok(df);
    }
    warn!("{:?} looks ';'-separated, re-reading", path);
    Ok(read_csv_with(path, b';')?)
}

fn drop_unnamed(df: DataFrame) -> Result<DataFrame> {
    let keep: Vec<String> = df
        .get_column_names()
        .iter()
        .filter(|name| !name.to_lowercase().starts_with("unnamed"))
        .map(|name| name.to_string())
        .collect();

    if keep.len() == df.width() {
        return Ok(df);
    }
    Ok(df.select(keep)?)
}
