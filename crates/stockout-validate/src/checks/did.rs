//! Per-event DiD identities.

use stockout_model::StockoutEvent;

use crate::issue::{Issue, SharePair};

fn out_of_tolerance(a: f64, b: f64, tolerance: f64) -> bool {
    (a - b).abs() > tolerance
}

/// Checks one event's share pairs, lift split, effect split and share range.
pub fn check_event(event: &StockoutEvent, tolerance: f64) -> Vec<Issue> {
    let did = &event.did;
    let event_id = event.event_id().to_string();
    let mut issues = Vec::new();

    for (pair, a, b) in [
        (SharePair::InternalLost, did.share_internal, did.share_lost),
        (SharePair::SameDiffNfc1, did.share_same_nfc1, did.share_diff_nfc1),
    ] {
        if let (Some(a), Some(b)) = (a, b)
            && out_of_tolerance(a + b, 1.0, tolerance)
        {
            issues.push(Issue::ShareSum {
                event_id: event_id.clone(),
                pair,
                sum: a + b,
            });
        }
    }

    if out_of_tolerance(did.lift_same_nfc1 + did.lift_diff_nfc1, did.internal_lift, tolerance) {
        issues.push(Issue::LiftSplit {
            event_id: event_id.clone(),
            lift_same_nfc1: did.lift_same_nfc1,
            lift_diff_nfc1: did.lift_diff_nfc1,
            internal_lift: did.internal_lift,
        });
    }

    if out_of_tolerance(did.internal_lift + did.lost_sales, did.total_effect, tolerance) {
        issues.push(Issue::EffectSplit {
            event_id: event_id.clone(),
            internal_lift: did.internal_lift,
            lost_sales: did.lost_sales,
            total_effect: did.total_effect,
        });
    }

    for (field, value) in [
        ("share_internal", did.share_internal),
        ("share_lost", did.share_lost),
        ("share_same_nfc1", did.share_same_nfc1),
        ("share_diff_nfc1", did.share_diff_nfc1),
    ] {
        if let Some(value) = value
            && !(0.0..=1.0).contains(&value)
        {
            issues.push(Issue::ShareOutOfRange {
                event_id: event_id.clone(),
                field: field.to_string(),
                value,
            });
        }
    }

    issues
}

pub fn check_events(events: &[StockoutEvent], tolerance: f64) -> Vec<Issue> {
    events
        .iter()
        .flat_map(|event| check_event(event, tolerance))
        .collect()
}
