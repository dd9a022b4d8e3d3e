//! Per-market drug rows feeding the cross-market builder.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use stockout_model::{
    Classification, DrugId, DrugSummary, IngredientId, PharmacyId, StockoutEvent,
    SubstituteShareRecord, Week,
};

/// One stocked-out drug of one market, as consumed across markets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossMarketDrugRow {
    pub market_id: PharmacyId,
    pub drug_id: DrugId,
    pub drug_name: String,
    pub ingredient_id: IngredientId,
    pub ingredient_name: String,
    pub nfc1: String,
    pub events_count: usize,
    pub total_stockout_weeks: u32,
    pub first_stockout_start: Week,
    pub last_stockout_end: Week,
    pub internal_lift: f64,
    pub lost_sales: f64,
    pub total_effect: f64,
    pub total_lift_same_nfc1: f64,
    pub total_lift_diff_nfc1: f64,
    pub share_internal: Option<f64>,
    pub share_lost: Option<f64>,
    /// Ratio of summed lifts over `internal_lift`, 0 when there is none.
    pub share_same_nfc1: f64,
    pub share_diff_nfc1: f64,
    pub classification: Classification,
}

impl CrossMarketDrugRow {
    pub fn recommendation(&self) -> &'static str {
        self.classification.recommendation()
    }
}

struct EventSpan {
    weeks: u32,
    first: Week,
    last: Week,
}

/// Joins drug summaries with their event dates and share-record lifts.
///
/// Rows come out ordered by classification, then `share_lost` descending
/// with undefined values last.
pub fn cross_market_rows(
    market_id: PharmacyId,
    drugs: &[DrugSummary],
    events: &[StockoutEvent],
    shares: &[SubstituteShareRecord],
) -> Vec<CrossMarketDrugRow> {
    let mut spans: BTreeMap<DrugId, EventSpan> = BTreeMap::new();
    for event in events {
        let period = &event.event.period;
        spans
            .entry(event.drug_id())
            .and_modify(|span| {
                span.weeks += period.weeks;
                span.first = span.first.min(period.start);
                span.last = span.last.max(period.end);
            })
            .or_insert(EventSpan {
                weeks: period.weeks,
                first: period.start,
                last: period.end,
            });
    }

    let mut lifts: BTreeMap<DrugId, (f64, f64)> = BTreeMap::new();
    for record in shares {
        let entry = lifts.entry(record.stockout_drug_id).or_default();
        entry.0 += record.lift_same_nfc1;
        entry.1 += record.lift_diff_nfc1;
    }

    let mut rows: Vec<CrossMarketDrugRow> = drugs
        .iter()
        .filter_map(|drug| {
            let span = spans.get(&drug.drug_id)?;
            let (same, diff) = lifts.get(&drug.drug_id).copied().unwrap_or_default();
            let ratio = |lift: f64| {
                if drug.total_internal_lift > 0.0 {
                    lift / drug.total_internal_lift
                } else {
                    0.0
                }
            };
            Some(CrossMarketDrugRow {
                market_id,
                drug_id: drug.drug_id,
                drug_name: drug.drug_name.clone(),
                ingredient_id: drug.ingredient_id,
                ingredient_name: drug.ingredient_name.clone(),
                nfc1: drug.nfc1.clone(),
                events_count: drug.events_count,
                total_stockout_weeks: span.weeks,
                first_stockout_start: span.first,
                last_stockout_end: span.last,
                internal_lift: drug.total_internal_lift,
                lost_sales: drug.total_lost_sales,
                total_effect: drug.total_effect,
                total_lift_same_nfc1: same,
                total_lift_diff_nfc1: diff,
                share_internal: drug.avg_share_internal,
                share_lost: drug.avg_share_lost,
                share_same_nfc1: ratio(same),
                share_diff_nfc1: ratio(diff),
                classification: drug.classification,
            })
        })
        .collect();

    rows.sort_by(|a, b| {
        a.classification.cmp(&b.classification).then_with(|| {
            let lost = |row: &CrossMarketDrugRow| row.share_lost.unwrap_or(f64::NEG_INFINITY);
            lost(b).total_cmp(&lost(a))
        })
    });
    rows
}
