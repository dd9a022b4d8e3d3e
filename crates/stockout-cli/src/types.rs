use std::path::PathBuf;

use stockout_coefficients::{CrossMarketBuild, CrossMarketDrugRow};
use stockout_ingest::{DrugCatalog, MarketProfile};
use stockout_report::{FailedMarket, MarketRunSummary};
use stockout_validate::ValidationReport;

/// Everything kept from one market after its outputs are written.
#[derive(Debug, Clone)]
pub struct MarketRun {
    pub profile: MarketProfile,
    pub catalog: DrugCatalog,
    pub summary: MarketRunSummary,
    pub validation: ValidationReport,
    pub cross_rows: Vec<CrossMarketDrugRow>,
    pub failed_groups: usize,
    /// `None` on a dry run.
    pub output_dir: Option<PathBuf>,
}

#[derive(Debug)]
pub struct RunOutcome {
    pub output_dir: PathBuf,
    pub markets: Vec<MarketRun>,
    pub failed: Vec<FailedMarket>,
    pub cross_market: CrossMarketBuild,
    pub total_drugs_raw: usize,
    /// `None` on a dry run.
    pub cross_market_dir: Option<PathBuf>,
}

impl RunOutcome {
    /// True when a market failed or an invariant check reported an error.
    pub fn has_errors(&self) -> bool {
        !self.failed.is_empty() || self.markets.iter().any(|m| m.validation.has_errors())
    }

    pub fn issue_errors(&self) -> usize {
        self.markets.iter().map(|m| m.validation.error_count()).sum()
    }
}
