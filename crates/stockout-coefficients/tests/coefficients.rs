//! Tests for cross-market rows, the coefficient table and coverage checks.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use proptest::prelude::*;
use stockout_coefficients::{
    CheckStatus, CrossMarketDrugRow, build_cross_market, market_order,
};
use stockout_model::{
    Classification, CoverageCluster, CoverageThresholds, DrugId, IngredientId, PharmacyId, Week,
};

fn week(n: i64) -> Week {
    Week::from_monday(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
        .unwrap()
        .offset(n)
}

fn row(market: i64, drug: i64, share_internal: Option<f64>) -> CrossMarketDrugRow {
    CrossMarketDrugRow {
        market_id: PharmacyId::new(market),
        drug_id: DrugId::new(drug),
        drug_name: format!("Drug {drug}"),
        ingredient_id: IngredientId::new(100),
        ingredient_name: "Ibuprofen".to_string(),
        nfc1: "Oral".to_string(),
        events_count: 1,
        total_stockout_weeks: 2,
        first_stockout_start: week(3),
        last_stockout_end: week(4),
        internal_lift: 5.0,
        lost_sales: 5.0,
        total_effect: 10.0,
        total_lift_same_nfc1: 5.0,
        total_lift_diff_nfc1: 0.0,
        share_internal,
        share_lost: share_internal.map(|s| 1.0 - s),
        share_same_nfc1: 1.0,
        share_diff_nfc1: 0.0,
        classification: Classification::Moderate,
    }
}

fn markets() -> BTreeMap<PharmacyId, Vec<CrossMarketDrugRow>> {
    BTreeMap::from([
        (PharmacyId::new(1), vec![row(1, 10, Some(0.5))]),
        (
            PharmacyId::new(2),
            vec![row(2, 10, Some(0.25)), row(2, 11, Some(1.0)), row(2, 12, Some(0.0))],
        ),
        (PharmacyId::new(3), vec![row(3, 10, Some(0.75)), row(3, 11, Some(0.5))]),
        (PharmacyId::new(4), Vec::new()),
    ])
}

#[test]
fn researched_drugs_are_ordered_by_market_count() {
    let build = build_cross_market(&markets(), 20, &CoverageThresholds::default());
    let ids: Vec<i64> = build.researched.iter().map(|d| d.drug_id.get()).collect();
    assert_eq!(ids, vec![10, 11, 12]);

    let first = &build.researched[0];
    assert_eq!(first.market_count, 3);
    assert_eq!(first.total_markets, 4);
    assert_eq!(first.market_coverage, 0.75);
    assert_eq!(first.coverage_cluster, CoverageCluster::High);
    assert_eq!(build.researched[1].coverage_cluster, CoverageCluster::High);
    assert_eq!(build.researched[2].coverage_cluster, CoverageCluster::Medium);
}

#[test]
fn markets_are_ordered_by_fill() {
    let order: Vec<i64> = market_order(&markets()).iter().map(|m| m.get()).collect();
    assert_eq!(order, vec![2, 3, 1, 4]);
}

#[test]
fn table_cells_follow_market_order() {
    let build = build_cross_market(&markets(), 20, &CoverageThresholds::default());
    assert_eq!(build.table.filled_counts(), vec![3, 2, 1]);
    let cell = build.table.rows[0].cell(PharmacyId::new(3)).unwrap();
    assert_eq!(cell.share_internal, Some(0.75));
    assert!(build.table.rows[2].cell(PharmacyId::new(1)).is_none());
}

#[test]
fn coverage_metrics_snapshot() {
    let build = build_cross_market(&markets(), 20, &CoverageThresholds::default());
    let rendered: Vec<String> = build
        .metrics
        .rows()
        .into_iter()
        .map(|r| format!("{}={}", r.metric, r.value))
        .collect();
    insta::assert_snapshot!(rendered.join("\n"), @r"
    TOTAL_MARKETS=4
    TOTAL_DRUGS_RAW=20
    TOTAL_DRUGS_RESEARCHED=3
    RAW_COVERAGE_RATE=0.15
    DRUGS_HIGH_COVERAGE=2
    DRUGS_MEDIUM_COVERAGE=1
    DRUGS_LOW_COVERAGE=0
    DRUGS_INSUFFICIENT_COVERAGE=0
    AVG_MARKETS_PER_DRUG=2
    AVG_MARKET_COVERAGE=0.5
    ");
}

#[test]
fn checks_pass_on_consistent_build() {
    let build = build_cross_market(&markets(), 20, &CoverageThresholds::default());
    assert!(build.passed());
    assert!(build.checks.iter().all(|c| c.status == CheckStatus::Ok));
    assert!(build.checks.iter().any(|c| c.name == "TRIANGLE_STRUCTURE"));
    assert_eq!(
        build.checks[0].to_string(),
        "[OK] TOTAL_MARKETS: 4 reported, 4 processed"
    );
}

#[test]
fn undefined_shares_fail_market_count() {
    let mut input = markets();
    input.insert(PharmacyId::new(5), vec![row(5, 10, None)]);
    let build = build_cross_market(&input, 20, &CoverageThresholds::default());
    assert!(!build.passed());
    let failed: Vec<&str> = build
        .checks
        .iter()
        .filter(|c| c.status == CheckStatus::Fail)
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(failed, vec!["MARKET_COUNT drug 10"]);
}

#[test]
fn out_of_range_share_fails() {
    let mut input = markets();
    input.insert(PharmacyId::new(5), vec![row(5, 12, Some(1.5))]);
    let build = build_cross_market(&input, 20, &CoverageThresholds::default());
    assert!(
        build
            .checks
            .iter()
            .any(|c| c.name == "SHARE_INTERNAL" && c.status == CheckStatus::Fail)
    );
}

proptest! {
    #[test]
    fn clusters_are_monotonic(a in 0.0f64..=1.0, b in 0.0f64..=1.0) {
        let thresholds = CoverageThresholds::default();
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(thresholds.cluster(hi) <= thresholds.cluster(lo));
    }
}
