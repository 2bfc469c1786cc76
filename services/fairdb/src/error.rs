//! Error taxonomy shared by the CFD pipeline and the fairness engine

use polars::prelude::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FairDbError {
    /// Mining executable ran but exited unsuccessfully
    #[error("CFD discovery failed ({status}): {stderr}")]
    ExternalProcess { status: String, stderr: String },

    /// Mining executable could not be started at all
    #[error("failed to launch CFD discovery executable {path:?}: {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Arrow literal missing from a line that reached the grammar parser
    #[error("malformed rule line (no {arrow:?}): {line}")]
    MalformedRuleLine { line: String, arrow: String },

    #[error("rule references column {0:?} which is not in the table")]
    UnknownColumn(String),

    #[error("unsupported table format: .{0} (supported: csv, json, parquet)")]
    UnsupportedFormat(String),

    #[error("missing required config key: {0}")]
    MissingConfig(&'static str),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Polars(#[from] PolarsError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FairDbError>;
