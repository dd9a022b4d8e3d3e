//! Cross-market substitution coefficients.
//!
//! Runs strictly after every market has finished. A market that failed is
//! absent from the input and is treated as missing data.

pub mod builder;
pub mod coverage;
pub mod rows;

use std::collections::BTreeMap;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use stockout_model::{CoverageThresholds, PharmacyId};
use tracing::{info, info_span, warn};

pub use builder::{
    CoefficientTable, ResearchedDrug, coefficient_table, market_order, researched_drugs,
};
pub use coverage::{
    CheckStatus, CoverageCheck, CoverageMetrics, MetricRow, check_coverage, checks_passed,
};
pub use rows::{CrossMarketDrugRow, cross_market_rows};

/// Everything produced by the cross-market stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossMarketBuild {
    pub processed_markets: Vec<PharmacyId>,
    pub researched: Vec<ResearchedDrug>,
    pub table: CoefficientTable,
    pub metrics: CoverageMetrics,
    pub checks: Vec<CoverageCheck>,
}

impl CrossMarketBuild {
    pub fn passed(&self) -> bool {
        checks_passed(&self.checks)
    }
}

/// Builds researched drugs, the coefficient table and coverage figures.
///
/// `markets` holds every successfully processed market, including those
/// without rows; `total_drugs_raw` is the size of the raw drug universe.
pub fn build_cross_market(
    markets: &BTreeMap<PharmacyId, Vec<CrossMarketDrugRow>>,
    total_drugs_raw: usize,
    thresholds: &CoverageThresholds,
) -> CrossMarketBuild {
    let _span = info_span!("cross_market", markets = markets.len()).entered();
    let start = Instant::now();

    let processed_markets: Vec<PharmacyId> = markets.keys().copied().collect();
    let researched = researched_drugs(markets, thresholds);
    let table = coefficient_table(markets, &researched);
    let metrics = CoverageMetrics::compute(processed_markets.len(), total_drugs_raw, &researched);
    let checks = check_coverage(&processed_markets, &metrics, &researched, &table);

    for failed in checks.iter().filter(|c| c.status != CheckStatus::Ok) {
        warn!(check = %failed.name, status = failed.status.label(), "{}", failed.message);
    }
    info!(
        researched = researched.len(),
        raw = total_drugs_raw,
        duration_ms = start.elapsed().as_millis(),
        "cross-market build complete"
    );

    CrossMarketBuild {
        processed_markets,
        researched,
        table,
        metrics,
        checks,
    }
}
