//! Shared helpers for file output.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

/// A flat record with a fixed column layout.
///
/// `HEADERS` lists the columns in field order so that files without rows
/// still carry a header.
pub trait CsvRow: Serialize {
    const HEADERS: &'static [&'static str];
}

/// Ensure an output subdirectory exists and return its path.
pub fn ensure_output_dir(base_dir: &Path, name: &str) -> Result<PathBuf> {
    let dir = base_dir.join(name);
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

/// Write rows as a comma-separated file with a header line.
pub fn write_csv<R: CsvRow>(path: &Path, rows: &[R]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("create {}", path.display()))?;
    writer
        .write_record(R::HEADERS)
        .with_context(|| format!("write header to {}", path.display()))?;
    for row in rows {
        writer
            .serialize(row)
            .with_context(|| format!("write row to {}", path.display()))?;
    }
    writer
        .flush()
        .with_context(|| format!("flush {}", path.display()))?;
    Ok(())
}

/// A `METRIC`/`VALUE` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricPair {
    pub metric: String,
    pub value: String,
}

impl MetricPair {
    pub fn new(metric: &str, value: impl ToString) -> Self {
        Self {
            metric: metric.to_string(),
            value: value.to_string(),
        }
    }

    /// Undefined values render empty.
    pub fn optional(metric: &str, value: Option<f64>) -> Self {
        Self {
            metric: metric.to_string(),
            value: value.map(|v| v.to_string()).unwrap_or_default(),
        }
    }
}

impl CsvRow for MetricPair {
    const HEADERS: &'static [&'static str] = &["METRIC", "VALUE"];
}
