//! Error types for market data ingestion.

use std::path::PathBuf;

use stockout_model::PharmacyId;
use thiserror::Error;

/// Errors that can occur while loading raw market files.
#[derive(Debug, Error)]
pub enum IngestError {
    // === File System Errors ===
    /// Directory not found or not readable.
    #[error("directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    /// Market file not found.
    #[error("market file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Failed to read directory entries.
    #[error("failed to read directory {path}: {source}")]
    DirectoryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No market files matched the naming pattern.
    #[error("no market files (Rd2_<CLIENT_ID>.csv) found in {path}")]
    NoMarketFiles { path: PathBuf },

    // === CSV Parsing Errors ===
    /// Failed to parse CSV with Polars.
    #[error("failed to parse CSV {path}: {message}")]
    CsvParse { path: PathBuf, message: String },

    /// CSV file has a header but no rows.
    #[error("market file is empty: {path}")]
    EmptyCsv { path: PathBuf },

    /// One or more required raw columns are absent.
    #[error("missing required columns in {path}: {}", columns.join(", "))]
    MissingColumns { path: PathBuf, columns: Vec<String> },

    // === Value Errors ===
    /// A cell could not be decoded.
    #[error("invalid {column} value '{value}' in {path} (row {row})")]
    InvalidValue {
        column: &'static str,
        value: String,
        row: usize,
        path: PathBuf,
    },

    /// `PERIOD_ID` could not be turned into a date.
    #[error("invalid PERIOD_ID '{value}' in {path} (row {row})")]
    InvalidPeriodId {
        value: String,
        row: usize,
        path: PathBuf,
    },

    /// CLIENT_ID values disagree with each other or with the file name.
    #[error("CLIENT_ID mismatch in {path}: expected {expected}, found {found}")]
    ClientMismatch {
        path: PathBuf,
        expected: PharmacyId,
        found: PharmacyId,
    },

    // === DataFrame Errors ===
    /// Failed DataFrame operation.
    #[error("DataFrame operation failed: {message}")]
    DataFrame { message: String },
}

impl From<polars::prelude::PolarsError> for IngestError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::DataFrame {
            message: err.to_string(),
        }
    }
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_columns_display() {
        let err = IngestError::MissingColumns {
            path: PathBuf::from("Rd2_1.csv"),
            columns: vec!["Q".to_string(), "V".to_string()],
        };
        assert_eq!(err.to_string(), "missing required columns in Rd2_1.csv: Q, V");
    }

    #[test]
    fn test_error_from_polars() {
        let polars_err = polars::prelude::PolarsError::ColumnNotFound("test".into());
        let ingest_err: IngestError = polars_err.into();
        assert!(matches!(ingest_err, IngestError::DataFrame { .. }));
    }
}
