//! Per-market summaries of detection and attribution results.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use stockout_model::{
    AnalysisConfig, Classification, ClassificationThresholds, DidCounters, DrugId, DrugSummary,
    IngredientDidSummary, IngredientId, PharmacyId, StockoutEvent, ValidatedEvent,
    ValidationCounters, mean_defined, round_to,
};

/// Detection figures of one ingredient group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientStockoutStats {
    pub market_id: PharmacyId,
    pub ingredient_id: IngredientId,
    pub ingredient_name: String,
    pub drugs_count: usize,
    pub raw_events: usize,
    pub valid_events: usize,
    /// Percent, one decimal.
    pub validation_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockoutSummary {
    pub market_id: PharmacyId,
    pub ingredient_count: usize,
    pub counters: ValidationCounters,
    pub validation_rate: f64,
    pub unique_drugs: usize,
    pub avg_stockout_weeks: f64,
}

impl StockoutSummary {
    pub fn build(
        market_id: PharmacyId,
        ingredient_count: usize,
        counters: ValidationCounters,
        events: &[ValidatedEvent],
    ) -> Self {
        let unique: BTreeSet<DrugId> = events.iter().map(|e| e.drug_id).collect();
        let avg_stockout_weeks = if events.is_empty() {
            0.0
        } else {
            events.iter().map(|e| f64::from(e.period.weeks)).sum::<f64>() / events.len() as f64
        };
        Self {
            market_id,
            ingredient_count,
            counters,
            validation_rate: counters.validation_rate(),
            unique_drugs: unique.len(),
            avg_stockout_weeks,
        }
    }
}

/// Run parameters and headline figures of the DiD stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DidMetadata {
    pub market_id: PharmacyId,
    pub min_stockout_weeks: u32,
    pub min_pre_weeks: u32,
    pub min_post_weeks: u32,
    pub max_post_gap_weeks: u32,
    pub min_total_for_share: f64,
    pub events_validated: usize,
    pub counters: DidCounters,
    pub total_internal_lift: f64,
    pub total_lost_sales: f64,
    pub avg_share_internal: Option<f64>,
    pub avg_share_lost: Option<f64>,
    pub classification_counts: BTreeMap<Classification, usize>,
}

impl DidMetadata {
    pub fn build(
        market_id: PharmacyId,
        config: &AnalysisConfig,
        events_validated: usize,
        counters: DidCounters,
        events: &[StockoutEvent],
        drugs: &[DrugSummary],
    ) -> Self {
        let params = &config.stockout;
        let mut classification_counts: BTreeMap<Classification, usize> =
            Classification::ALL.iter().map(|c| (*c, 0)).collect();
        for drug in drugs {
            *classification_counts.entry(drug.classification).or_default() += 1;
        }
        Self {
            market_id,
            min_stockout_weeks: params.min_stockout_weeks,
            min_pre_weeks: params.min_pre_weeks,
            min_post_weeks: params.min_post_weeks,
            max_post_gap_weeks: params.max_post_gap_weeks,
            min_total_for_share: params.min_total_for_share,
            events_validated,
            counters,
            total_internal_lift: events.iter().map(|e| e.did.internal_lift).sum(),
            total_lost_sales: events.iter().map(|e| e.did.lost_sales).sum(),
            avg_share_internal: mean_defined(events.iter().map(|e| e.did.share_internal)),
            avg_share_lost: mean_defined(events.iter().map(|e| e.did.share_lost)),
            classification_counts,
        }
    }
}

pub fn ingredient_stats(
    market_id: PharmacyId,
    ingredient_id: IngredientId,
    ingredient_name: &str,
    drugs_count: usize,
    counters: &ValidationCounters,
) -> IngredientStockoutStats {
    IngredientStockoutStats {
        market_id,
        ingredient_id,
        ingredient_name: ingredient_name.to_string(),
        drugs_count,
        raw_events: counters.raw,
        valid_events: counters.valid,
        validation_rate: counters.validation_rate(),
    }
}

/// One row per stocked-out drug, ordered by drug id.
pub fn summarize_drugs(
    events: &[StockoutEvent],
    thresholds: &ClassificationThresholds,
) -> Vec<DrugSummary> {
    let mut by_drug: BTreeMap<DrugId, Vec<&StockoutEvent>> = BTreeMap::new();
    for event in events {
        by_drug.entry(event.drug_id()).or_default().push(event);
    }

    by_drug
        .into_iter()
        .filter_map(|(drug_id, events)| {
            let first = &events.first()?.event;
            let avg_share_internal = mean_defined(events.iter().map(|e| e.did.share_internal));
            let avg_share_lost = mean_defined(events.iter().map(|e| e.did.share_lost));
            let weeks: f64 = events.iter().map(|e| f64::from(e.event.period.weeks)).sum();
            Some(DrugSummary {
                drug_id,
                drug_name: first.drug_name.clone(),
                ingredient_id: first.ingredient_id,
                ingredient_name: first.ingredient_name.clone(),
                nfc1: first.nfc1.clone(),
                events_count: events.len(),
                avg_share_internal,
                avg_share_lost,
                avg_share_same_nfc1: mean_defined(events.iter().map(|e| e.did.share_same_nfc1)),
                avg_share_diff_nfc1: mean_defined(events.iter().map(|e| e.did.share_diff_nfc1)),
                total_internal_lift: events.iter().map(|e| e.did.internal_lift).sum(),
                total_lost_sales: events.iter().map(|e| e.did.lost_sales).sum(),
                total_effect: events.iter().map(|e| e.did.total_effect).sum(),
                avg_stockout_weeks: round_to(weeks / events.len() as f64, 2),
                classification: Classification::classify(
                    avg_share_internal,
                    avg_share_lost,
                    thresholds,
                ),
            })
        })
        .collect()
}

/// One row per ingredient group with DiD results, ordered by ingredient id.
pub fn summarize_ingredients(events: &[StockoutEvent]) -> Vec<IngredientDidSummary> {
    let mut by_ingredient: BTreeMap<IngredientId, Vec<&StockoutEvent>> = BTreeMap::new();
    for event in events {
        by_ingredient
            .entry(event.event.ingredient_id)
            .or_default()
            .push(event);
    }

    by_ingredient
        .into_iter()
        .filter_map(|(ingredient_id, events)| {
            let first = &events.first()?.event;
            let drugs: BTreeSet<DrugId> = events.iter().map(|e| e.drug_id()).collect();
            Some(IngredientDidSummary {
                ingredient_id,
                ingredient_name: first.ingredient_name.clone(),
                events: events.len(),
                drugs: drugs.len(),
                avg_share_internal: mean_defined(events.iter().map(|e| e.did.share_internal)),
                avg_share_lost: mean_defined(events.iter().map(|e| e.did.share_lost)),
                avg_share_same_nfc1: mean_defined(events.iter().map(|e| e.did.share_same_nfc1)),
                total_internal_lift: events.iter().map(|e| e.did.internal_lift).sum(),
                total_lost_sales: events.iter().map(|e| e.did.lost_sales).sum(),
            })
        })
        .collect()
}
