//! Tests for detection, validation, post periods and lift attribution.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use proptest::prelude::*;
use stockout_core::{
    aggregate_substitute_shares, analyze_group, calculate_lift, check_gates, detect_runs,
    expected_sales, is_compatible, market_growth, resolve_post_period, share_sums, split_shares,
};
use stockout_model::config::{NON_MEDICAL, ORAL_LIQUID, ORAL_SOLID};
use stockout_model::{
    AnalysisConfig, DidMetrics, DrugAttributes, DrugId, EventId, FormCompatibility,
    IngredientId, PharmacyId, PostPeriod, PostStatus, PrePeriod, RejectionReason,
    StockoutEvent, StockoutParams, StockoutPeriod, SubstituteLift, ValidatedEvent, Week,
    WeekRange,
};
use stockout_transform::{DrugSeries, IngredientSeries, SeriesPoint};

fn week(n: i64) -> Week {
    Week::from_monday(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
        .unwrap()
        .offset(n)
}

fn series(id: i64, nfc1: &str, quantities: &[f64], market: &[f64]) -> DrugSeries {
    DrugSeries {
        drug_id: DrugId::new(id),
        attributes: DrugAttributes {
            drug_name: format!("Drug {id}"),
            ingredient_name: "Ibuprofen".to_string(),
            nfc1: nfc1.to_string(),
            nfc2: String::new(),
        },
        notsold_percent: 0.0,
        points: quantities
            .iter()
            .zip(market)
            .enumerate()
            .map(|(i, (&quantity, &market_quantity))| SeriesPoint {
                week: week(i as i64),
                quantity,
                revenue: quantity,
                market_quantity,
                market_revenue: market_quantity,
            })
            .collect(),
    }
}

fn group(drugs: Vec<DrugSeries>) -> IngredientSeries {
    IngredientSeries {
        market_id: PharmacyId::new(1),
        ingredient_id: IngredientId::new(100),
        ingredient_name: "Ibuprofen".to_string(),
        drugs: drugs.into_iter().map(|d| (d.drug_id, d)).collect(),
    }
}

/// Drug 10 is out of stock in weeks 8..=10 while competitors sell more of it;
/// drug 11 runs out in the last two weeks without recovering.
fn scenario() -> IngredientSeries {
    let d_target: Vec<f64> = (0..15)
        .map(|w| if (8..=10).contains(&w) { 0.0 } else { 10.0 })
        .collect();
    let d_market: Vec<f64> = (0..15)
        .map(|w| if (8..=10).contains(&w) { 35.0 } else { 20.0 })
        .collect();
    let e_target: Vec<f64> = (0..15).map(|w| if w >= 13 { 0.0 } else { 5.0 }).collect();
    let e_market: Vec<f64> = (0..15)
        .map(|w| if (8..=10).contains(&w) { 15.0 } else { 30.0 })
        .collect();
    group(vec![
        series(10, ORAL_SOLID, &d_target, &d_market),
        series(11, ORAL_SOLID, &e_target, &e_market),
    ])
}

#[test]
fn scenario_attributes_the_loss_to_competitors() {
    let analysis = analyze_group(&scenario(), &AnalysisConfig::default());

    assert_eq!(analysis.validation.raw, 2);
    assert_eq!(analysis.validation.valid, 2);
    assert_eq!(analysis.did_counters.valid, 1);
    assert_eq!(analysis.did_counters.no_recovery, 1);
    assert_eq!(analysis.events.len(), 2);
    assert_eq!(analysis.events[0].event.event_id.as_str(), "1_100_0001");
    assert_eq!(analysis.events[1].event.event_id.as_str(), "1_100_0002");
    assert_eq!(analysis.events[1].post.status, PostStatus::NoRecovery);

    assert_eq!(analysis.did_events.len(), 1);
    let event = &analysis.did_events[0];
    assert_eq!(event.drug_id(), DrugId::new(10));
    assert_eq!(event.event.pre.avg_quantity, 10.0);
    assert_eq!(event.post.window, Some(WeekRange { start: week(11), end: week(14) }));
    assert_eq!(event.post.gap_weeks, Some(1));
    assert_eq!(event.did.market_growth, 0.75);
    assert_eq!(event.did.lost_sales, 45.0);
    assert_eq!(event.did.internal_lift, 0.0);
    assert_eq!(event.did.share_internal, Some(0.0));
    assert_eq!(event.did.share_lost, Some(1.0));
    assert_eq!(event.did.share_same_nfc1, None);
    assert_eq!(event.substitutes.len(), 1);
    assert_eq!(analysis.mappings.len(), 1);
    assert!(analysis.mappings[0].same_nfc1);
}

#[test]
fn gates_report_the_first_failure() {
    let params = StockoutParams::default();
    let period = StockoutPeriod {
        drug_id: DrugId::new(10),
        start: week(6),
        end: week(7),
        weeks: 2,
    };

    let quiet = group(vec![series(10, ORAL_SOLID, &[1.0; 10], &[0.0; 10])]);
    let drug = quiet.drug(DrugId::new(10)).unwrap();
    assert_eq!(
        check_gates(&quiet, drug, &period, &params),
        Err(RejectionReason::NoMarketActivity)
    );

    // only the sibling sells at competitors; the baseline is too short
    let short = StockoutPeriod {
        start: week(2),
        end: week(3),
        ..period
    };
    let busy = group(vec![
        series(10, ORAL_SOLID, &[1.0; 10], &[0.0; 10]),
        series(11, ORAL_SOLID, &[1.0; 10], &[4.0; 10]),
    ]);
    let drug = busy.drug(DrugId::new(10)).unwrap();
    assert_eq!(
        check_gates(&busy, drug, &short, &params),
        Err(RejectionReason::NoPreSales)
    );
    assert_eq!(
        check_gates(&busy, drug, &period, &params),
        Err(RejectionReason::NoCompetitors)
    );
}

#[test]
fn post_period_statuses() {
    let params = StockoutParams::default();
    let late = series(
        10,
        ORAL_SOLID,
        &[5.0, 0.0, 0.0, 0.0, 0.0, 5.0, 5.0, 5.0, 5.0, 5.0],
        &[1.0; 10],
    );
    let post = resolve_post_period(&late, week(1), &params);
    assert_eq!(post.status, PostStatus::GapTooLarge);
    assert_eq!(post.gap_weeks, Some(4));

    let short = series(10, ORAL_SOLID, &[5.0, 0.0, 5.0, 5.0], &[1.0; 4]);
    let post = resolve_post_period(&short, week(1), &params);
    assert_eq!(post.status, PostStatus::InsufficientData);
    assert_eq!(post.weeks, 2);

    let long = series(10, ORAL_SOLID, &[5.0, 0.0, 5.0, 5.0, 5.0, 5.0, 5.0, 5.0], &[1.0; 8]);
    let post = resolve_post_period(&long, week(1), &params);
    assert_eq!(post.status, PostStatus::Valid);
    assert_eq!(post.window, Some(WeekRange { start: week(2), end: week(5) }));
}

fn stockout_event(drug: i64, seq: u32, lifts: &[(i64, f64)]) -> StockoutEvent {
    let period = StockoutPeriod {
        drug_id: DrugId::new(drug),
        start: week(4),
        end: week(5),
        weeks: 2,
    };
    let internal_lift: f64 = lifts.iter().map(|(_, lift)| lift).sum();
    StockoutEvent {
        event: ValidatedEvent {
            event_id: EventId::new(PharmacyId::new(1), IngredientId::new(100), seq),
            market_id: PharmacyId::new(1),
            ingredient_id: IngredientId::new(100),
            ingredient_name: "Ibuprofen".to_string(),
            drug_id: DrugId::new(drug),
            drug_name: format!("Drug {drug}"),
            nfc1: ORAL_SOLID.to_string(),
            nfc2: String::new(),
            period,
            pre: PrePeriod {
                window: WeekRange::ending_at(week(3), 4),
                weeks: 4,
                total_quantity: 40.0,
                avg_quantity: 10.0,
            },
            market_during_quantity: 10.0,
        },
        post: PostPeriod {
            status: PostStatus::Valid,
            window: Some(WeekRange { start: week(6), end: week(9) }),
            weeks: 4,
            gap_weeks: Some(1),
        },
        did: DidMetrics {
            market_pre: 100.0,
            market_during: 100.0,
            market_growth: 1.0,
            internal_lift,
            lost_sales: 0.0,
            total_effect: internal_lift,
            share_internal: Some(1.0),
            share_lost: Some(0.0),
            substitutes_count: lifts.len(),
            substitutes_with_lift: lifts.iter().filter(|(_, lift)| *lift > 0.0).count(),
            lift_same_nfc1: internal_lift,
            lift_diff_nfc1: 0.0,
            share_same_nfc1: Some(1.0),
            share_diff_nfc1: Some(0.0),
        },
        substitutes: lifts
            .iter()
            .map(|&(id, lift)| SubstituteLift {
                drug_id: DrugId::new(id),
                drug_name: format!("Drug {id}"),
                nfc1: ORAL_SOLID.to_string(),
                same_nfc1: true,
                sales_pre: 0.0,
                sales_during: lift,
                expected: 0.0,
                lift,
            })
            .collect(),
    }
}

#[test]
fn shares_split_internal_lift() {
    let events = vec![stockout_event(10, 1, &[(11, 30.0), (12, 70.0), (13, 0.0)])];
    let aggregation = aggregate_substitute_shares(&events, 0.0);
    assert_eq!(aggregation.metadata.pairs_total, 3);
    assert_eq!(aggregation.metadata.pairs_filtered_zero_lift, 1);

    let shares: Vec<f64> = aggregation
        .records
        .iter()
        .map(|r| r.substitute_share)
        .collect();
    assert_eq!(shares.len(), 2);
    assert!((shares[0] - 70.0).abs() < 1e-9);
    assert!((shares[1] - 30.0).abs() < 1e-9);
    let sums = share_sums(&aggregation.records);
    assert!((sums[&DrugId::new(10)] - 100.0).abs() < 1e-9);
}

#[test]
fn shares_accumulate_across_events() {
    let events = vec![
        stockout_event(10, 1, &[(11, 10.0)]),
        stockout_event(10, 2, &[(11, 20.0), (12, 30.0)]),
    ];
    let aggregation = aggregate_substitute_shares(&events, 0.0);
    let by_substitute: BTreeMap<DrugId, (f64, usize)> = aggregation
        .records
        .iter()
        .map(|r| (r.substitute_drug_id, (r.total_lift, r.events_count)))
        .collect();
    assert_eq!(by_substitute[&DrugId::new(11)], (30.0, 2));
    assert_eq!(by_substitute[&DrugId::new(12)], (30.0, 1));
    assert!(aggregation.records.iter().all(|r| r.internal_lift == 60.0));
}

#[test]
fn shares_skip_events_without_internal_lift() {
    let events = vec![
        stockout_event(10, 1, &[(11, 0.0)]),
        stockout_event(10, 2, &[(11, 20.0)]),
    ];
    let aggregation = aggregate_substitute_shares(&events, 0.0);
    assert_eq!(aggregation.records.len(), 1);
    assert_eq!(aggregation.records[0].events_count, 1);
    assert_eq!(aggregation.records[0].substitute_share, 100.0);
    assert_eq!(aggregation.metadata.events_processed, 1);
    assert_eq!(aggregation.metadata.events_with_lift, 1);
}

#[test]
fn candidate_without_competitor_sales_is_counted_not_kept() {
    // competitors stop carrying drug 10 exactly while it is out of stock
    let target: Vec<f64> = (0..15)
        .map(|w| if (8..=10).contains(&w) { 0.0 } else { 10.0 })
        .collect();
    let market: Vec<f64> = (0..15)
        .map(|w| if (8..=10).contains(&w) { 0.0 } else { 20.0 })
        .collect();
    let analysis = analyze_group(
        &group(vec![
            series(10, ORAL_SOLID, &target, &market),
            series(11, ORAL_SOLID, &[5.0; 15], &[30.0; 15]),
        ]),
        &AnalysisConfig::default(),
    );

    assert_eq!(analysis.validation.raw, 1);
    assert_eq!(analysis.validation.valid, 0);
    assert_eq!(analysis.validation.rejected(RejectionReason::NoCompetitors), 1);
    assert!(analysis.events.iter().all(|e| e.event.drug_id != DrugId::new(10)));
    assert!(analysis.did_events.is_empty());
}

#[test]
fn excluded_forms_never_match() {
    let forms = FormCompatibility::default();
    assert!(is_compatible(ORAL_SOLID, ORAL_LIQUID, &forms));
    assert!(!is_compatible(NON_MEDICAL, NON_MEDICAL, &forms));
    assert!(is_compatible("Ointment", "Ointment", &forms));
    assert!(!is_compatible("Ointment", ORAL_SOLID, &forms));
}

proptest! {
    #[test]
    fn lift_is_never_negative(actual in 0.0f64..1e6, pre in 0.0f64..1e6, growth in 0.0f64..10.0) {
        prop_assert!(calculate_lift(actual, expected_sales(pre, growth)) >= 0.0);
    }

    #[test]
    fn growth_is_neutral_below_floor(pre in 0.0f64..0.999, during in 0.0f64..1e6) {
        prop_assert_eq!(market_growth(pre, during, 1.0), 1.0);
    }

    #[test]
    fn defined_shares_sum_to_one(a in 0.0f64..1e6, b in 0.0f64..1e6) {
        match split_shares(a, b, 0.001) {
            (Some(x), Some(y)) => prop_assert!((x + y - 1.0).abs() < 1e-9),
            (None, None) => prop_assert!(a + b < 0.001),
            other => prop_assert!(false, "half-defined shares {:?}", other),
        }
    }

    #[test]
    fn runs_are_maximal_and_disjoint(
        sales in proptest::collection::vec(prop_oneof![Just(0.0f64), 1.0f64..5.0], 1..60),
        min_weeks in 1u32..4,
    ) {
        let weeks: Vec<(Week, f64)> = sales.iter().enumerate().map(|(i, q)| (week(i as i64), *q)).collect();
        let runs = detect_runs(DrugId::new(1), weeks.iter().copied(), min_weeks);
        for pair in runs.windows(2) {
            prop_assert!(pair[0].end < pair[1].start);
        }
        for run in &runs {
            prop_assert!(run.weeks >= min_weeks);
            let start = run.start.weeks_since(week(0)) as usize;
            let end = run.end.weeks_since(week(0)) as usize;
            prop_assert_eq!(end - start + 1, run.weeks as usize);
            prop_assert!(sales[start..=end].iter().all(|q| *q == 0.0));
            prop_assert!(start == 0 || sales[start - 1] > 0.0);
            prop_assert!(end + 1 == sales.len() || sales[end + 1] > 0.0);
        }
    }

    #[test]
    fn shares_sum_to_one_hundred_per_drug(
        events in proptest::collection::vec(
            (
                10i64..13,
                proptest::collection::vec((20i64..25, prop_oneof![Just(0.0f64), 0.5f64..500.0]), 1..5),
            ),
            1..12,
        ),
    ) {
        let events: Vec<StockoutEvent> = events
            .iter()
            .enumerate()
            .map(|(seq, (drug, lifts))| stockout_event(*drug, seq as u32 + 1, lifts))
            .collect();
        let aggregation = aggregate_substitute_shares(&events, 0.0);
        for (drug, sum) in share_sums(&aggregation.records) {
            prop_assert!((sum - 100.0).abs() < 0.1, "drug {} sums to {}", drug, sum);
        }
        let lifted: std::collections::BTreeSet<DrugId> = events
            .iter()
            .filter(|e| e.did.internal_lift > 0.0)
            .map(StockoutEvent::drug_id)
            .collect();
        let shared: std::collections::BTreeSet<DrugId> =
            aggregation.records.iter().map(|r| r.stockout_drug_id).collect();
        prop_assert_eq!(shared, lifted);
    }

    #[test]
    fn compatibility_is_symmetric(a in 0usize..5, b in 0usize..5) {
        let forms = FormCompatibility::default();
        let names = [ORAL_SOLID, ORAL_LIQUID, NON_MEDICAL, "Ointment", "Drops"];
        prop_assert_eq!(
            is_compatible(names[a], names[b], &forms),
            is_compatible(names[b], names[a], &forms)
        );
    }
}
