//! Tests for gap filling and market aggregation.

use chrono::NaiveDate;
use proptest::prelude::*;
use stockout_model::{DrugId, IngredientId, PharmacyId, RawObservation, StockoutParams, Week};
use stockout_transform::{aggregate_market, normalize_observations, normalize_series};

fn week(n: i64) -> Week {
    Week::from_monday(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
        .unwrap()
        .offset(n)
}

fn raw(pharmacy: i64, drug: i64, w: i64, quantity: f64) -> RawObservation {
    RawObservation {
        pharmacy_id: PharmacyId::new(pharmacy),
        drug_id: DrugId::new(drug),
        ingredient_id: IngredientId::new(100),
        week: week(w),
        quantity,
        revenue: quantity * 2.0,
        drug_name: Some(format!("Drug {drug}")),
        ingredient_name: Some("Ibuprofen".to_string()),
        nfc1: Some("Oral".to_string()),
        nfc2: None,
    }
}

#[test]
fn duplicates_are_summed_and_gaps_zero_filled() {
    let mut records = vec![raw(1, 10, 0, 3.0), raw(1, 10, 0, 2.0), raw(1, 10, 3, 4.0)];
    records[1].drug_name = Some("A name".to_string());
    records[2].nfc2 = Some("Tabs".to_string());

    let series = normalize_series(&records).unwrap();
    assert_eq!(series.len(), 4);
    assert_eq!(series[0].quantity, 5.0);
    assert_eq!(series[0].revenue, 10.0);
    assert_eq!(series[1].quantity, 0.0);
    assert_eq!(series[2].revenue, 0.0);
    // smallest non-empty name of the duplicated week, then filled forward
    assert_eq!(series[0].attributes.drug_name, "A name");
    assert_eq!(series[2].attributes.drug_name, "A name");
    assert_eq!(series[3].attributes.drug_name, "Drug 10");
    // back filled from the last week
    assert_eq!(series[0].attributes.nfc2, "Tabs");
}

#[test]
fn aggregation_joins_competitor_totals_and_filters_band() {
    let mut records = Vec::new();
    for w in 0..10 {
        // drug 10 stocks out for 3 of 10 weeks; drug 11 always sells
        records.push(raw(1, 10, w, if (4..7).contains(&w) { 0.0 } else { 5.0 }));
        records.push(raw(1, 11, w, 1.0));
        records.push(raw(2, 10, w, 7.0));
        records.push(raw(3, 10, w, 1.0));
        records.push(raw(2, 11, w, 9.0));
    }
    let normalized = normalize_observations(&records).unwrap();
    let market =
        aggregate_market(PharmacyId::new(1), &normalized, &StockoutParams::default()).unwrap();

    assert_eq!(market.series_stats.len(), 2);
    let stats_10 = market
        .series_stats
        .iter()
        .find(|s| s.drug_id == DrugId::new(10))
        .unwrap();
    assert!(stats_10.included);
    assert_eq!(stats_10.notsold_percent, 0.3);
    assert_eq!(stats_10.weeks_with_sales, 7);
    assert_eq!(stats_10.sales_ratio, 0.7);
    assert_eq!(stats_10.date_diff_days, 64);

    assert_eq!(market.groups.len(), 1);
    let group = &market.groups[0];
    assert_eq!(group.ingredient_name, "Ibuprofen");
    assert!(group.drug(DrugId::new(11)).is_none());
    let drug = group.drug(DrugId::new(10)).unwrap();
    assert_eq!(drug.points.len(), 10);
    assert!(drug.points.iter().all(|p| p.market_quantity == 8.0));
    assert_eq!(drug.points[0].market_revenue, 16.0);

    let summary = &market.ingredient_summaries[0];
    assert_eq!(summary.drugs_count, 1);
    assert_eq!(summary.weeks_total, 10);
}

#[test]
fn market_without_target_rows_fails() {
    let normalized = normalize_observations(&[raw(2, 10, 0, 1.0)]).unwrap();
    assert!(aggregate_market(PharmacyId::new(1), &normalized, &StockoutParams::default()).is_err());
}

proptest! {
    #[test]
    fn gap_filled_series_is_contiguous(weeks in prop::collection::vec(0i64..60, 1..40)) {
        let records: Vec<RawObservation> = weeks.iter().map(|w| raw(1, 10, *w, 1.0)).collect();
        let series = normalize_series(&records).unwrap();

        let min = *weeks.iter().min().unwrap();
        let max = *weeks.iter().max().unwrap();
        prop_assert_eq!(series.len() as i64, max - min + 1);
        prop_assert_eq!(series[0].week, week(min));
        for pair in series.windows(2) {
            prop_assert_eq!(pair[1].week.days_since(pair[0].week), 7);
        }
        let total: f64 = series.iter().map(|obs| obs.quantity).sum();
        prop_assert_eq!(total, weeks.len() as f64);
    }
}
