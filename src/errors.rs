//! Typed error hierarchy for the shipops CLI.
//!
//! Three top-level enums cover the three subsystems:
//! - `SchemaError` — migration discovery and schema assembly failures
//! - `ApiError` — hosted-project REST and function-endpoint failures
//! - `AuditError` — spreadsheet scanning and report failures

use thiserror::Error;

/// Errors from schema assembly (migration discovery, splitting, output).
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Migrations directory not found: {0}")]
    MigrationsDirNotFound(std::path::PathBuf),

    #[error("No migration files found in {0}")]
    NoMigrationFiles(std::path::PathBuf),

    #[error("Failed to write schema at {path}: {source}")]
    OutputWriteFailed {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Errors from the hosted project's REST surface and function endpoints.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} from {url}: {body}")]
    Status {
        status: u16,
        url: String,
        body: String,
    },

    #[error("Table {table} does not exist on this project")]
    TableMissing { table: String },

    #[error("Function {name} failed: {message}")]
    Function { name: String, message: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    /// Whether a retry can plausibly succeed. Transport faults and the
    /// usual transient statuses qualify; everything else fails fast.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Transport { .. } => true,
            ApiError::Status { status, .. } => {
                matches!(status, 429 | 500 | 502 | 503 | 504)
            }
            _ => false,
        }
    }
}

/// Errors from the ship-date audit (folder scanning, sheet parsing,
/// report writing).
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Audit base directory not found: {0}")]
    BaseDirNotFound(std::path::PathBuf),

    #[error("Failed to read sheet {path}: {source}")]
    SheetRead {
        path: std::path::PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Sheet {path} has no usable rows (need ship-date and sales-order columns)")]
    SheetEmpty { path: std::path::PathBuf },

    #[error("Failed to write report at {path}: {source}")]
    ReportWriteFailed {
        path: std::path::PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
