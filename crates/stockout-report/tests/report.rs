//! Tests for per-market and cross-market file output.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use stockout_coefficients::{build_cross_market, cross_market_rows};
use stockout_core::{MarketAnalysis, analyze_market};
use stockout_ingest::{DrugCatalogEntry, MarketProfile};
use stockout_model::config::ORAL_SOLID;
use stockout_model::{
    AnalysisConfig, CoverageThresholds, DrugAttributes, DrugId, IngredientId, PharmacyId, Week,
};
use stockout_report::{
    FailedMarket, MarketOutputs, MarketRunSummary, RunMetadata, coefficient_headers,
    render_validation_report, write_cross_market_outputs, write_market_outputs,
    write_market_rows, write_run_metadata, write_validation_report,
};
use stockout_transform::{DrugSeries, IngredientSeries, MarketSeries, SeriesPoint};
use stockout_validate::ValidationReport;

const MARKET: PharmacyId = PharmacyId::new(1);

fn week(n: i64) -> Week {
    Week::from_monday(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
        .unwrap()
        .offset(n)
}

fn series(id: i64, target: impl Fn(i64) -> f64, market: impl Fn(i64) -> f64) -> DrugSeries {
    DrugSeries {
        drug_id: DrugId::new(id),
        attributes: DrugAttributes {
            drug_name: format!("Drug {id}"),
            ingredient_name: "Ibuprofen".to_string(),
            nfc1: ORAL_SOLID.to_string(),
            nfc2: String::new(),
        },
        notsold_percent: 0.0,
        points: (0..15)
            .map(|w| SeriesPoint {
                week: week(w),
                quantity: target(w),
                revenue: target(w),
                market_quantity: market(w),
                market_revenue: market(w),
            })
            .collect(),
    }
}

fn market_series() -> MarketSeries {
    let out = |w: i64| (8..=10).contains(&w);
    let drugs = vec![
        series(
            10,
            |w| if out(w) { 0.0 } else { 10.0 },
            |w| if out(w) { 35.0 } else { 20.0 },
        ),
        series(
            11,
            |w| if w >= 13 { 0.0 } else { 5.0 },
            |w| if out(w) { 15.0 } else { 30.0 },
        ),
    ];
    MarketSeries {
        groups: vec![IngredientSeries {
            market_id: MARKET,
            ingredient_id: IngredientId::new(100),
            ingredient_name: "Ibuprofen".to_string(),
            drugs: drugs.into_iter().map(|d| (d.drug_id, d)).collect(),
        }],
        ..MarketSeries::default()
    }
}

fn profile() -> MarketProfile {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let end = NaiveDate::from_ymd_opt(2024, 4, 8).unwrap();
    MarketProfile {
        market_id: MARKET,
        file_name: "Rd2_1.csv".to_string(),
        competitors_count: 3,
        data_start: start,
        data_end: end,
        days_range: (end - start).num_days(),
        weeks_range: (end - start).num_days() / 7,
        drugs_count: 2,
        ingredients_count: 1,
        records_count: 60,
    }
}

fn analysis() -> MarketAnalysis {
    analyze_market(MARKET, &market_series(), &AnalysisConfig::default()).unwrap()
}

fn read_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn writes_every_per_market_file() {
    let dir = tempfile::tempdir().unwrap();
    let series = market_series();
    let analysis = analysis();
    let validation = ValidationReport::new(MARKET);
    let market_dir = write_market_outputs(
        dir.path(),
        &MarketOutputs {
            profile: &profile(),
            series: &series,
            analysis: &analysis,
            validation: &validation,
        },
    )
    .unwrap();

    assert_eq!(market_dir, dir.path().join("per_market").join("1"));
    for name in [
        "series_summary.csv",
        "ingredient_summary.csv",
        "market_profile.csv",
        "stockout_events.csv",
        "stockout_per_ingredient.csv",
        "stockout_summary.csv",
        "did_results.csv",
        "substitute_mapping.csv",
        "did_summary.csv",
        "drugs_summary.csv",
        "did_metadata.csv",
        "substitute_shares.csv",
        "substitute_summary.csv",
        "substitute_metadata.csv",
        "validation_issues.csv",
    ] {
        assert!(market_dir.join(name).is_file(), "missing {name}");
    }

    let events = read_lines(&market_dir.join("stockout_events.csv"));
    assert_eq!(events.len(), 3);
    assert!(events[1].starts_with("1_100_0001,"));

    let issues = read_lines(&market_dir.join("validation_issues.csv"));
    insta::assert_snapshot!(issues.join("\n"), @"MARKET_ID,RULE_ID,SEVERITY,CATEGORY,SUBJECT,MESSAGE");

    let drugs = fs::read_to_string(market_dir.join("drugs_summary.csv")).unwrap();
    assert!(drugs.contains("CRITICAL"));
    assert!(drugs.contains("KEEP - High loss to competitors"));
}

#[test]
fn empty_tables_keep_their_header() {
    let dir = tempfile::tempdir().unwrap();
    let analysis = analyze_market(MARKET, &MarketSeries::default(), &AnalysisConfig::default())
        .unwrap();
    let market_dir = write_market_outputs(
        dir.path(),
        &MarketOutputs {
            profile: &profile(),
            series: &MarketSeries::default(),
            analysis: &analysis,
            validation: &ValidationReport::new(MARKET),
        },
    )
    .unwrap();

    let did = read_lines(&market_dir.join("did_results.csv"));
    assert_eq!(did.len(), 1);
    assert!(did[0].starts_with("EVENT_ID,"));
}

#[test]
fn coefficient_columns_follow_market_order() {
    let headers = coefficient_headers(&[PharmacyId::new(7), PharmacyId::new(3)]);
    insta::assert_snapshot!(headers.join(","), @"DRUGS_ID,DRUGS_NAME,INN_ID,INN_NAME,NFC1_ID,MARKET_COUNT,SHARE_INTERNAL_LOC_7,INTERNAL_LIFT_LOC_7,EVENTS_COUNT_LOC_7,SHARE_INTERNAL_LOC_3,INTERNAL_LIFT_LOC_3,EVENTS_COUNT_LOC_3");
}

#[test]
fn writes_cross_market_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let analysis = analysis();
    let rows = cross_market_rows(
        MARKET,
        &analysis.drug_summaries,
        &analysis.did_events,
        &analysis.shares.records,
    );
    let path = write_market_rows(dir.path(), MARKET, &rows).unwrap();
    assert_eq!(read_lines(&path).len(), rows.len() + 1);

    let mut markets = BTreeMap::new();
    markets.insert(MARKET, rows);
    markets.insert(PharmacyId::new(2), Vec::new());
    let build = build_cross_market(&markets, 2, &CoverageThresholds::default());

    let catalog = vec![
        DrugCatalogEntry {
            drug_id: DrugId::new(10),
            drug_name: "Drug 10".to_string(),
            ingredient_id: IngredientId::new(100),
            ingredient_name: "Ibuprofen".to_string(),
        },
        DrugCatalogEntry {
            drug_id: DrugId::new(11),
            drug_name: "Drug 11".to_string(),
            ingredient_id: IngredientId::new(100),
            ingredient_name: "Ibuprofen".to_string(),
        },
    ];
    let cross_dir = write_cross_market_outputs(dir.path(), &build, &catalog).unwrap();

    assert_eq!(read_lines(&cross_dir.join("all_drugs_list.csv")).len(), 3);
    assert_eq!(
        read_lines(&cross_dir.join("researched_drugs_list.csv")).len(),
        build.researched.len() + 1
    );
    let table = read_lines(&cross_dir.join("researched_drugs_coefficients.csv"));
    assert_eq!(table[0], coefficient_headers(&build.table.markets).join(","));
    assert_eq!(table.len(), build.table.rows.len() + 1);
    assert!(table[1].ends_with(",,,"), "market 2 has no cells: {}", table[1]);

    let coverage = read_lines(&cross_dir.join("coverage_analysis.csv"));
    assert_eq!(coverage[0], "METRIC,VALUE");
}

#[test]
fn validation_report_lists_checks_and_markets() {
    let analysis = analysis();
    let mut markets = BTreeMap::new();
    markets.insert(
        MARKET,
        cross_market_rows(
            MARKET,
            &analysis.drug_summaries,
            &analysis.did_events,
            &analysis.shares.records,
        ),
    );
    let build = build_cross_market(&markets, 2, &CoverageThresholds::default());
    let generated = NaiveDate::from_ymd_opt(2025, 1, 6)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap();

    let text = render_validation_report(&build, &[ValidationReport::new(MARKET)], generated);
    assert!(text.contains("Generated: 2025-01-06 12:00:00"));
    assert!(text.contains("VALIDATION CHECKS:"));
    assert!(text.contains("[OK] market 1: 0 errors, 0 warnings"));
    assert_eq!(text.lines().filter(|l| l.starts_with('[')).count(), build.checks.len() + 1);

    let dir = tempfile::tempdir().unwrap();
    let path = write_validation_report(dir.path(), &text).unwrap();
    assert_eq!(fs::read_to_string(path).unwrap(), text);
}

#[test]
fn run_metadata_round_trips_through_json() {
    let dir = tempfile::tempdir().unwrap();
    let metadata = RunMetadata {
        generated_at: "2025-01-06T12:00:00Z".to_string(),
        tool_version: "0.1.0".to_string(),
        raw_dir: "data/raw".into(),
        config: AnalysisConfig::default(),
        markets_discovered: 2,
        markets: vec![MarketRunSummary {
            market_id: MARKET,
            validated_events: 2,
            did_events: 1,
            share_pairs: 0,
            issue_errors: 0,
            issue_warnings: 0,
            duration_ms: 5,
        }],
        failed_markets: vec![FailedMarket {
            market_id: PharmacyId::new(2),
            error: "no rows for the target pharmacy".to_string(),
        }],
        total_drugs_raw: 2,
        total_drugs_researched: 1,
        coverage_checks_passed: false,
    };

    let path = write_run_metadata(dir.path(), &metadata).unwrap();
    let restored: RunMetadata = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(restored, metadata);
}
