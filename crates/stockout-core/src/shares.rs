//! Substitute-share aggregation across the events of one market.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use stockout_model::{DrugId, StockoutEvent, SubstituteShareRecord};

/// Bookkeeping of the zero-lift filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareMetadata {
    /// Events with positive internal lift; the rest are skipped.
    pub events_processed: usize,
    /// Events where at least one substitute had positive lift.
    pub events_with_lift: usize,
    pub pairs_total: usize,
    pub pairs_after_filter: usize,
    pub pairs_filtered_zero_lift: usize,
}

/// Headline figures over the surviving share records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShareSummary {
    pub unique_stockout_drugs: usize,
    pub unique_substitutes: usize,
    pub total_pairs: usize,
    pub total_lift: f64,
    pub avg_share: f64,
    pub median_share: f64,
    pub lift_same_nfc1: f64,
    pub lift_diff_nfc1: f64,
    pub share_same_nfc1_percent: f64,
    pub count_share_100: usize,
    pub count_share_50_99: usize,
    pub count_share_25_49: usize,
    pub count_share_10_24: usize,
    pub count_share_below_10: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShareAggregation {
    /// Sorted by stocked-out drug ascending, then share descending.
    pub records: Vec<SubstituteShareRecord>,
    pub metadata: ShareMetadata,
}

#[derive(Default)]
struct PairTotals {
    stockout_drug_name: String,
    substitute_drug_name: String,
    same_nfc1: bool,
    total_lift: f64,
    events_count: usize,
}

/// Groups per-event substitute lifts by (stocked-out drug, substitute),
/// skipping events without positive internal lift, drops pairs whose total lift is not above `min_total_lift` and turns the
/// rest into percentage shares of each stocked-out drug's internal lift.
pub fn aggregate_substitute_shares(
    events: &[StockoutEvent],
    min_total_lift: f64,
) -> ShareAggregation {
    let mut pairs: BTreeMap<(DrugId, DrugId), PairTotals> = BTreeMap::new();
    let mut events_processed = 0;
    let mut events_with_lift = 0;
    for event in events.iter().filter(|e| e.did.internal_lift > 0.0) {
        events_processed += 1;
        if event.substitutes.iter().any(|s| s.lift > 0.0) {
            events_with_lift += 1;
        }
        for substitute in &event.substitutes {
            let pair = pairs
                .entry((event.drug_id(), substitute.drug_id))
                .or_insert_with(|| PairTotals {
                    stockout_drug_name: event.event.drug_name.clone(),
                    substitute_drug_name: substitute.drug_name.clone(),
                    same_nfc1: substitute.same_nfc1,
                    ..PairTotals::default()
                });
            pair.total_lift += substitute.lift;
            pair.events_count += 1;
        }
    }

    let pairs_total = pairs.len();
    pairs.retain(|_, pair| pair.total_lift > min_total_lift);

    let mut internal: BTreeMap<DrugId, f64> = BTreeMap::new();
    for ((stockout, _), pair) in &pairs {
        *internal.entry(*stockout).or_default() += pair.total_lift;
    }

    let mut records: Vec<SubstituteShareRecord> = pairs
        .into_iter()
        .map(|((stockout, substitute), pair)| {
            let internal_lift = internal.get(&stockout).copied().unwrap_or_default();
            let substitute_share = if internal_lift > 0.0 {
                pair.total_lift / internal_lift * 100.0
            } else {
                0.0
            };
            let (lift_same_nfc1, lift_diff_nfc1) = if pair.same_nfc1 {
                (pair.total_lift, 0.0)
            } else {
                (0.0, pair.total_lift)
            };
            SubstituteShareRecord {
                stockout_drug_id: stockout,
                stockout_drug_name: pair.stockout_drug_name,
                substitute_drug_id: substitute,
                substitute_drug_name: pair.substitute_drug_name,
                same_nfc1: pair.same_nfc1,
                total_lift: pair.total_lift,
                events_count: pair.events_count,
                internal_lift,
                substitute_share,
                lift_same_nfc1,
                lift_diff_nfc1,
            }
        })
        .collect();
    records.sort_by(|a, b| {
        a.stockout_drug_id
            .cmp(&b.stockout_drug_id)
            .then(b.substitute_share.total_cmp(&a.substitute_share))
    });

    let pairs_after_filter = records.len();
    ShareAggregation {
        records,
        metadata: ShareMetadata {
            events_processed,
            events_with_lift,
            pairs_total,
            pairs_after_filter,
            pairs_filtered_zero_lift: pairs_total - pairs_after_filter,
        },
    }
}

/// Sum of shares per stocked-out drug.
pub fn share_sums(records: &[SubstituteShareRecord]) -> BTreeMap<DrugId, f64> {
    let mut sums = BTreeMap::new();
    for record in records {
        *sums.entry(record.stockout_drug_id).or_default() += record.substitute_share;
    }
    sums
}

fn median(values: &mut [f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

pub fn summarize_shares(records: &[SubstituteShareRecord]) -> ShareSummary {
    let stockout: BTreeSet<DrugId> = records.iter().map(|r| r.stockout_drug_id).collect();
    let substitutes: BTreeSet<DrugId> = records.iter().map(|r| r.substitute_drug_id).collect();
    let mut shares: Vec<f64> = records.iter().map(|r| r.substitute_share).collect();
    let total_lift: f64 = records.iter().map(|r| r.total_lift).sum();
    let lift_same_nfc1: f64 = records.iter().map(|r| r.lift_same_nfc1).sum();
    let lift_diff_nfc1: f64 = records.iter().map(|r| r.lift_diff_nfc1).sum();

    let bucket = |pred: fn(f64) -> bool| shares.iter().filter(|s| pred(**s)).count();
    let count_share_100 = bucket(|s| s >= 100.0 - 1e-9);
    let count_share_50_99 = bucket(|s| (50.0..100.0 - 1e-9).contains(&s));
    let count_share_25_49 = bucket(|s| (25.0..50.0).contains(&s));
    let count_share_10_24 = bucket(|s| (10.0..25.0).contains(&s));
    let count_share_below_10 = bucket(|s| s < 10.0);

    ShareSummary {
        unique_stockout_drugs: stockout.len(),
        unique_substitutes: substitutes.len(),
        total_pairs: records.len(),
        total_lift,
        avg_share: if shares.is_empty() {
            0.0
        } else {
            shares.iter().sum::<f64>() / shares.len() as f64
        },
        median_share: median(&mut shares),
        lift_same_nfc1,
        lift_diff_nfc1,
        share_same_nfc1_percent: if total_lift > 0.0 {
            lift_same_nfc1 / total_lift * 100.0
        } else {
            0.0
        },
        count_share_100,
        count_share_50_99,
        count_share_25_49,
        count_share_10_24,
        count_share_below_10,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn median_handles_even_and_odd() {
        assert_eq!(median(&mut [3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&mut [4.0, 1.0, 2.0, 3.0]), 2.5);
        assert_eq!(median(&mut []), 0.0);
    }
}
