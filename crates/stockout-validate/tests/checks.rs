//! Tests for DiD invariants, share sums and counter consistency.

use chrono::NaiveDate;
use stockout_model::{
    DidCounters, DidMetrics, DrugId, EventId, IngredientId, PharmacyId, PostPeriod, PostStatus,
    PrePeriod, StockoutEvent, StockoutParams, StockoutPeriod, SubstituteShareRecord,
    ValidatedEvent, ValidationCounters, Week, WeekRange,
};
use stockout_validate::{Issue, MarketResults, SharePair, Severity, run_all};
use stockout_validate::checks::{check_counters, check_event, check_share_sums};

fn week(n: i64) -> Week {
    Week::from_monday(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
        .unwrap()
        .offset(n)
}

fn metrics(internal_lift: f64, lost_sales: f64) -> DidMetrics {
    let total = internal_lift + lost_sales;
    DidMetrics {
        market_pre: 100.0,
        market_during: 100.0,
        market_growth: 1.0,
        internal_lift,
        lost_sales,
        total_effect: total,
        share_internal: Some(internal_lift / total),
        share_lost: Some(lost_sales / total),
        substitutes_count: 1,
        substitutes_with_lift: usize::from(internal_lift > 0.0),
        lift_same_nfc1: internal_lift,
        lift_diff_nfc1: 0.0,
        share_same_nfc1: (internal_lift > 0.0).then_some(1.0),
        share_diff_nfc1: (internal_lift > 0.0).then_some(0.0),
    }
}

fn event(seq: u32, did: DidMetrics) -> StockoutEvent {
    StockoutEvent {
        event: ValidatedEvent {
            event_id: EventId::new(PharmacyId::new(1), IngredientId::new(100), seq),
            market_id: PharmacyId::new(1),
            ingredient_id: IngredientId::new(100),
            ingredient_name: "Ibuprofen".to_string(),
            drug_id: DrugId::new(10),
            drug_name: "Drug 10".to_string(),
            nfc1: "Oral".to_string(),
            nfc2: String::new(),
            period: StockoutPeriod {
                drug_id: DrugId::new(10),
                start: week(4),
                end: week(5),
                weeks: 2,
            },
            pre: PrePeriod {
                window: WeekRange::ending_at(week(3), 4),
                weeks: 4,
                total_quantity: 40.0,
                avg_quantity: 10.0,
            },
            market_during_quantity: 50.0,
        },
        post: PostPeriod {
            status: PostStatus::Valid,
            window: Some(WeekRange {
                start: week(6),
                end: week(9),
            }),
            weeks: 4,
            gap_weeks: Some(1),
        },
        did,
        substitutes: Vec::new(),
    }
}

fn share(stockout: i64, substitute: i64, substitute_share: f64) -> SubstituteShareRecord {
    SubstituteShareRecord {
        stockout_drug_id: DrugId::new(stockout),
        stockout_drug_name: format!("Drug {stockout}"),
        substitute_drug_id: DrugId::new(substitute),
        substitute_drug_name: format!("Drug {substitute}"),
        same_nfc1: true,
        total_lift: substitute_share,
        events_count: 1,
        internal_lift: 100.0,
        substitute_share,
        lift_same_nfc1: substitute_share,
        lift_diff_nfc1: 0.0,
    }
}

#[test]
fn consistent_event_has_no_issues() {
    assert!(check_event(&event(1, metrics(30.0, 70.0)), 0.001).is_empty());
}

#[test]
fn broken_identities_are_reported() {
    let mut did = metrics(30.0, 70.0);
    did.share_lost = Some(0.8);
    did.lift_diff_nfc1 = 5.0;
    did.total_effect = 90.0;
    let issues = check_event(&event(1, did), 0.001);
    let rules: Vec<&str> = issues.iter().map(Issue::rule_id).collect();
    assert_eq!(rules, vec!["DID001", "DID003", "DID004"]);
    assert!(matches!(
        issues[0],
        Issue::ShareSum {
            pair: SharePair::InternalLost,
            ..
        }
    ));
    assert!(issues.iter().all(|i| i.severity() == Severity::Error));
    assert_eq!(issues[0].subject(), "1_100_0001");
}

#[test]
fn out_of_range_shares_are_reported() {
    let mut did = metrics(30.0, 70.0);
    did.share_internal = Some(1.3);
    did.share_lost = Some(-0.3);
    let issues = check_event(&event(1, did), 0.001);
    let fields: Vec<String> = issues
        .iter()
        .filter_map(|issue| match issue {
            Issue::ShareOutOfRange { field, .. } => Some(field.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(fields, vec!["share_internal", "share_lost"]);
}

#[test]
fn share_sums_within_tolerance_pass() {
    let records = vec![share(10, 11, 70.0), share(10, 12, 30.05), share(20, 21, 90.0)];
    let issues = check_share_sums(&records, 0.1);
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].subject(), "20");
    assert_eq!(issues[0].severity(), Severity::Warning);
}

#[test]
fn counters_must_match_records() {
    let validation = ValidationCounters {
        raw: 5,
        valid: 3,
        no_market_activity: 1,
        no_pre_sales: 0,
        no_competitors: 0,
    };
    let did_counters = DidCounters {
        valid: 2,
        no_recovery: 1,
        ..DidCounters::default()
    };
    let events = vec![event(1, metrics(1.0, 1.0)), event(1, metrics(1.0, 1.0))];
    let issues = check_counters(&validation, &did_counters, 3, &events);
    let subjects: Vec<String> = issues.iter().map(Issue::subject).collect();
    assert_eq!(subjects, vec!["raw_candidates", "1_100_0001"]);
}

#[test]
fn run_all_collects_every_check() {
    let validation = ValidationCounters {
        raw: 1,
        valid: 1,
        ..ValidationCounters::default()
    };
    let did_counters = DidCounters {
        valid: 1,
        ..DidCounters::default()
    };
    let events = vec![event(1, metrics(30.0, 70.0))];
    let shares = vec![share(10, 11, 100.0)];
    let results = MarketResults {
        market_id: PharmacyId::new(1),
        validation: &validation,
        did_counters: &did_counters,
        validated_events: 1,
        did_events: &events,
        shares: &shares,
    };
    let report = run_all(&results, &StockoutParams::default());
    assert!(report.is_clean());
    assert!(!report.has_errors());

    let broken = vec![share(10, 11, 50.0)];
    let report = run_all(
        &MarketResults {
            shares: &broken,
            ..results
        },
        &StockoutParams::default(),
    );
    assert_eq!(report.warning_count(), 1);
    assert_eq!(report.error_count(), 0);
    assert_eq!(report.records()[0].rule_id, "SHR001");
}
