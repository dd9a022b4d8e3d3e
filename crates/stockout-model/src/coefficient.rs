use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ids::{DrugId, IngredientId, PharmacyId};

/// Ordinal bucket of market coverage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CoverageCluster {
    High,
    Medium,
    Low,
    Insufficient,
}

impl CoverageCluster {
    pub const ALL: [CoverageCluster; 4] = [
        CoverageCluster::High,
        CoverageCluster::Medium,
        CoverageCluster::Low,
        CoverageCluster::Insufficient,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CoverageCluster::High => "HIGH",
            CoverageCluster::Medium => "MEDIUM",
            CoverageCluster::Low => "LOW",
            CoverageCluster::Insufficient => "INSUFFICIENT",
        }
    }
}

impl fmt::Display for CoverageCluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One drug's figures in one market.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketCell {
    pub share_internal: Option<f64>,
    pub internal_lift: f64,
    pub events_count: usize,
}

/// A drug's coefficients across every market it was researched in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossMarketCoefficient {
    pub drug_id: DrugId,
    pub drug_name: String,
    pub ingredient_id: IngredientId,
    pub ingredient_name: String,
    pub nfc1: String,
    pub market_count: usize,
    pub total_markets: usize,
    pub market_coverage: f64,
    pub coverage_cluster: CoverageCluster,
    pub cells: BTreeMap<PharmacyId, MarketCell>,
}

impl CrossMarketCoefficient {
    pub fn cell(&self, market: PharmacyId) -> Option<&MarketCell> {
        self.cells.get(&market)
    }

    /// Markets with a defined internal share.
    pub fn defined_shares(&self) -> usize {
        self.cells
            .values()
            .filter(|cell| cell.share_internal.is_some())
            .count()
    }
}
