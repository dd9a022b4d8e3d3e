//! Merge of per-market drug rows into researched drugs and the wide
//! coefficient table.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use stockout_model::{
    CoverageCluster, CoverageThresholds, CrossMarketCoefficient, DrugId, IngredientId,
    MarketCell, PharmacyId,
};
use tracing::info;

use crate::rows::CrossMarketDrugRow;

/// A drug with at least one analysed event in at least one market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchedDrug {
    pub drug_id: DrugId,
    pub drug_name: String,
    pub ingredient_id: IngredientId,
    pub ingredient_name: String,
    pub nfc1: String,
    pub market_count: usize,
    pub total_markets: usize,
    pub market_coverage: f64,
    pub coverage_cluster: CoverageCluster,
}

/// Wide table of per-market coefficients.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoefficientTable {
    /// Column order: most distinct drugs first, ties by market id.
    pub markets: Vec<PharmacyId>,
    /// Row order follows the researched drug list.
    pub rows: Vec<CrossMarketCoefficient>,
}

impl CoefficientTable {
    /// Defined internal shares per row, in row order.
    pub fn filled_counts(&self) -> Vec<usize> {
        self.rows
            .iter()
            .map(CrossMarketCoefficient::defined_shares)
            .collect()
    }
}

/// Researched drugs sorted by market count descending, then drug id.
///
/// Descriptive fields come from the first market (ascending id) that
/// reports the drug.
pub fn researched_drugs(
    markets: &BTreeMap<PharmacyId, Vec<CrossMarketDrugRow>>,
    thresholds: &CoverageThresholds,
) -> Vec<ResearchedDrug> {
    let total_markets = markets.len();
    let mut drugs: BTreeMap<DrugId, (ResearchedDrug, BTreeSet<PharmacyId>)> = BTreeMap::new();
    for (market_id, rows) in markets {
        for row in rows {
            let (_, seen) = drugs.entry(row.drug_id).or_insert_with(|| {
                (
                    ResearchedDrug {
                        drug_id: row.drug_id,
                        drug_name: row.drug_name.clone(),
                        ingredient_id: row.ingredient_id,
                        ingredient_name: row.ingredient_name.clone(),
                        nfc1: row.nfc1.clone(),
                        market_count: 0,
                        total_markets,
                        market_coverage: 0.0,
                        coverage_cluster: CoverageCluster::Insufficient,
                    },
                    BTreeSet::new(),
                )
            });
            seen.insert(*market_id);
        }
    }

    let mut researched: Vec<ResearchedDrug> = drugs
        .into_values()
        .map(|(mut drug, seen)| {
            drug.market_count = seen.len();
            drug.market_coverage = if total_markets == 0 {
                0.0
            } else {
                seen.len() as f64 / total_markets as f64
            };
            drug.coverage_cluster = thresholds.cluster(drug.market_coverage);
            drug
        })
        .collect();
    researched.sort_by(|a, b| {
        b.market_count
            .cmp(&a.market_count)
            .then(a.drug_id.cmp(&b.drug_id))
    });
    researched
}

/// Market column order for the coefficient table.
pub fn market_order(markets: &BTreeMap<PharmacyId, Vec<CrossMarketDrugRow>>) -> Vec<PharmacyId> {
    let mut counts: Vec<(PharmacyId, usize)> = markets
        .iter()
        .map(|(market_id, rows)| {
            let distinct: BTreeSet<DrugId> = rows.iter().map(|r| r.drug_id).collect();
            (*market_id, distinct.len())
        })
        .collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    counts.into_iter().map(|(market_id, _)| market_id).collect()
}

pub fn coefficient_table(
    markets: &BTreeMap<PharmacyId, Vec<CrossMarketDrugRow>>,
    researched: &[ResearchedDrug],
) -> CoefficientTable {
    let mut cells: BTreeMap<(DrugId, PharmacyId), MarketCell> = BTreeMap::new();
    for (market_id, rows) in markets {
        for row in rows {
            cells.insert(
                (row.drug_id, *market_id),
                MarketCell {
                    share_internal: row.share_internal,
                    internal_lift: row.internal_lift,
                    events_count: row.events_count,
                },
            );
        }
    }

    let order = market_order(markets);
    let rows = researched
        .iter()
        .map(|drug| CrossMarketCoefficient {
            drug_id: drug.drug_id,
            drug_name: drug.drug_name.clone(),
            ingredient_id: drug.ingredient_id,
            ingredient_name: drug.ingredient_name.clone(),
            nfc1: drug.nfc1.clone(),
            market_count: drug.market_count,
            total_markets: drug.total_markets,
            market_coverage: drug.market_coverage,
            coverage_cluster: drug.coverage_cluster,
            cells: order
                .iter()
                .filter_map(|market_id| {
                    cells
                        .get(&(drug.drug_id, *market_id))
                        .map(|cell| (*market_id, *cell))
                })
                .collect(),
        })
        .collect();

    let table = CoefficientTable {
        markets: order,
        rows,
    };
    let filled = table.filled_counts();
    if !filled.is_empty() {
        info!(
            rows = table.rows.len(),
            markets = table.markets.len(),
            max_filled = filled.iter().max().copied().unwrap_or_default(),
            min_filled = filled.iter().min().copied().unwrap_or_default(),
            "coefficient table built"
        );
    }
    table
}
