//! Run-level metadata written as JSON.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use stockout_model::{AnalysisConfig, PharmacyId};

use crate::cross_market::cross_market_dir;

/// A market whose pipeline did not complete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedMarket {
    pub market_id: PharmacyId,
    pub error: String,
}

/// Headline figures of one completed market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketRunSummary {
    pub market_id: PharmacyId,
    pub validated_events: usize,
    pub did_events: usize,
    pub share_pairs: usize,
    pub issue_errors: usize,
    pub issue_warnings: usize,
    pub duration_ms: u128,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub generated_at: String,
    pub tool_version: String,
    pub raw_dir: PathBuf,
    pub config: AnalysisConfig,
    pub markets_discovered: usize,
    pub markets: Vec<MarketRunSummary>,
    pub failed_markets: Vec<FailedMarket>,
    pub total_drugs_raw: usize,
    pub total_drugs_researched: usize,
    pub coverage_checks_passed: bool,
}

pub fn write_run_metadata(out_dir: &Path, metadata: &RunMetadata) -> Result<PathBuf> {
    let path = cross_market_dir(out_dir)?.join("run_metadata.json");
    let json = serde_json::to_string_pretty(metadata).context("serialize run metadata")?;
    fs::write(&path, json).with_context(|| format!("write {}", path.display()))?;
    Ok(path)
}
