//! Target/competitor split, not-sold filter and market totals.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use stockout_model::{
    DrugId, IngredientId, PharmacyId, StockoutParams, Week, WeeklyObservation, round_to,
};

use crate::error::{Result, TransformError};
use crate::series::{DrugSeries, IngredientSeries, SeriesPoint};

/// Target-pharmacy statistics of one drug after gap filling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrugSeriesStats {
    pub market_id: PharmacyId,
    pub ingredient_id: IngredientId,
    pub ingredient_name: String,
    pub drug_id: DrugId,
    pub drug_name: String,
    pub date_start: Week,
    pub date_end: Week,
    /// Inclusive span in days.
    pub date_diff_days: i64,
    pub weeks_total: usize,
    pub weeks_with_sales: usize,
    pub sales_ratio: f64,
    pub total_quantity: f64,
    pub notsold_percent: f64,
    /// Whether the drug passed the not-sold band.
    pub included: bool,
}

/// Roll-up of the included drugs of one ingredient group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientSeriesSummary {
    pub market_id: PharmacyId,
    pub ingredient_id: IngredientId,
    pub ingredient_name: String,
    pub drugs_count: usize,
    pub date_start: Week,
    pub date_end: Week,
    pub weeks_total: usize,
    pub weeks_with_sales: usize,
    pub total_quantity: f64,
    pub avg_sales_ratio: f64,
}

/// Aggregated view of one market, ready for detection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketSeries {
    pub groups: Vec<IngredientSeries>,
    pub series_stats: Vec<DrugSeriesStats>,
    pub ingredient_summaries: Vec<IngredientSeriesSummary>,
}

/// Share of zero-quantity weeks in a series.
pub fn notsold_percent(quantities: impl IntoIterator<Item = f64>) -> f64 {
    let (zero, total) = quantities
        .into_iter()
        .fold((0usize, 0usize), |(zero, total), q| {
            (zero + usize::from(q == 0.0), total + 1)
        });
    if total == 0 {
        return 0.0;
    }
    zero as f64 / total as f64
}

fn within_band(value: f64, params: &StockoutParams) -> bool {
    params.min_notsold_percent <= value && value <= params.max_notsold_percent
}

/// Splits normalized observations by ingredient group and builds the target
/// series with competitor totals for every drug inside the not-sold band.
pub fn aggregate_market(
    market_id: PharmacyId,
    observations: &[WeeklyObservation],
    params: &StockoutParams,
) -> Result<MarketSeries> {
    let mut by_ingredient: BTreeMap<IngredientId, Vec<&WeeklyObservation>> = BTreeMap::new();
    for obs in observations {
        by_ingredient.entry(obs.ingredient_id).or_default().push(obs);
    }

    if !observations.iter().any(|obs| obs.pharmacy_id == market_id) {
        return Err(TransformError::NoTargetRecords { market_id });
    }

    let mut market = MarketSeries::default();
    for (ingredient_id, rows) in by_ingredient {
        let (group, stats) = aggregate_ingredient(market_id, ingredient_id, &rows, params);
        if let Some(summary) = summarize_ingredient(market_id, ingredient_id, &stats) {
            market.ingredient_summaries.push(summary);
        }
        market.series_stats.extend(stats);
        match group {
            Some(group) => market.groups.push(group),
            None => tracing::debug!(
                market_id = %market_id,
                ingredient_id = %ingredient_id,
                "no target drug inside the not-sold band"
            ),
        }
    }
    Ok(market)
}

fn aggregate_ingredient(
    market_id: PharmacyId,
    ingredient_id: IngredientId,
    rows: &[&WeeklyObservation],
    params: &StockoutParams,
) -> (Option<IngredientSeries>, Vec<DrugSeriesStats>) {
    let mut target: BTreeMap<DrugId, Vec<&WeeklyObservation>> = BTreeMap::new();
    for obs in rows.iter().filter(|obs| obs.pharmacy_id == market_id) {
        target.entry(obs.drug_id).or_default().push(obs);
    }
    for series in target.values_mut() {
        series.sort_by_key(|obs| obs.week);
    }

    let mut stats = Vec::with_capacity(target.len());
    for (drug_id, series) in &target {
        stats.push(drug_stats(market_id, *drug_id, series, params));
    }

    let kept: BTreeMap<DrugId, f64> = stats
        .iter()
        .filter(|s| s.included)
        .map(|s| (s.drug_id, s.notsold_percent))
        .collect();
    if kept.is_empty() {
        return (None, stats);
    }

    let mut totals: BTreeMap<(DrugId, Week), (f64, f64)> = BTreeMap::new();
    for obs in rows
        .iter()
        .filter(|obs| obs.pharmacy_id != market_id && kept.contains_key(&obs.drug_id))
    {
        let slot = totals.entry((obs.drug_id, obs.week)).or_insert((0.0, 0.0));
        slot.0 += obs.quantity;
        slot.1 += obs.revenue;
    }

    let mut drugs = BTreeMap::new();
    let mut ingredient_name = String::new();
    for (drug_id, notsold) in kept {
        let Some(series) = target.get(&drug_id) else {
            continue;
        };
        let Some(first) = series.first() else {
            continue;
        };
        if ingredient_name.is_empty() {
            ingredient_name.clone_from(&first.attributes.ingredient_name);
        }
        let points = series
            .iter()
            .map(|obs| {
                let (market_quantity, market_revenue) = totals
                    .get(&(drug_id, obs.week))
                    .copied()
                    .unwrap_or((0.0, 0.0));
                SeriesPoint {
                    week: obs.week,
                    quantity: obs.quantity,
                    revenue: obs.revenue,
                    market_quantity,
                    market_revenue,
                }
            })
            .collect();
        drugs.insert(
            drug_id,
            DrugSeries {
                drug_id,
                attributes: first.attributes.clone(),
                notsold_percent: notsold,
                points,
            },
        );
    }

    let group = IngredientSeries {
        market_id,
        ingredient_id,
        ingredient_name,
        drugs,
    };
    (Some(group), stats)
}

fn drug_stats(
    market_id: PharmacyId,
    drug_id: DrugId,
    series: &[&WeeklyObservation],
    params: &StockoutParams,
) -> DrugSeriesStats {
    let first = series[0];
    let date_start = first.week;
    let date_end = series.last().map_or(date_start, |obs| obs.week);
    let weeks_total = series.len();
    let weeks_with_sales = series.iter().filter(|obs| obs.is_sold()).count();
    let notsold = notsold_percent(series.iter().map(|obs| obs.quantity));
    DrugSeriesStats {
        market_id,
        ingredient_id: first.ingredient_id,
        ingredient_name: first.attributes.ingredient_name.clone(),
        drug_id,
        drug_name: first.attributes.drug_name.clone(),
        date_start,
        date_end,
        date_diff_days: date_end.days_since(date_start) + 1,
        weeks_total,
        weeks_with_sales,
        sales_ratio: if weeks_total > 0 {
            round_to(weeks_with_sales as f64 / weeks_total as f64, 3)
        } else {
            0.0
        },
        total_quantity: series.iter().map(|obs| obs.quantity).sum(),
        notsold_percent: notsold,
        included: within_band(notsold, params),
    }
}

fn summarize_ingredient(
    market_id: PharmacyId,
    ingredient_id: IngredientId,
    stats: &[DrugSeriesStats],
) -> Option<IngredientSeriesSummary> {
    let included: Vec<&DrugSeriesStats> = stats.iter().filter(|s| s.included).collect();
    let first = included.first()?;
    let weeks_total: usize = included.iter().map(|s| s.weeks_total).sum();
    let weeks_with_sales: usize = included.iter().map(|s| s.weeks_with_sales).sum();
    Some(IngredientSeriesSummary {
        market_id,
        ingredient_id,
        ingredient_name: first.ingredient_name.clone(),
        drugs_count: included.len(),
        date_start: included.iter().map(|s| s.date_start).min()?,
        date_end: included.iter().map(|s| s.date_end).max()?,
        weeks_total,
        weeks_with_sales,
        total_quantity: included.iter().map(|s| s.total_quantity).sum(),
        avg_sales_ratio: if weeks_total > 0 {
            weeks_with_sales as f64 / weeks_total as f64
        } else {
            0.0
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notsold_counts_zero_weeks() {
        assert_eq!(notsold_percent([0.0, 1.0, 0.0, 2.0]), 0.5);
        assert_eq!(notsold_percent([]), 0.0);
    }

    #[test]
    fn band_is_inclusive() {
        let params = StockoutParams::default();
        assert!(within_band(0.20, &params));
        assert!(within_band(0.95, &params));
        assert!(!within_band(0.96, &params));
        assert!(!within_band(0.0, &params));
    }
}
