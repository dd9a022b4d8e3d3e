//! Reported counters against the records they summarise.

use std::collections::BTreeSet;

use stockout_model::{DidCounters, RejectionReason, StockoutEvent, ValidationCounters};

use crate::issue::Issue;

fn mismatch(counter: &str, reported: usize, actual: usize) -> Option<Issue> {
    (reported != actual).then(|| Issue::CountMismatch {
        counter: counter.to_string(),
        reported,
        actual,
    })
}

/// `validated_events` is the number of events that passed the gates,
/// `did_events` the events that produced a DiD result.
pub fn check_counters(
    validation: &ValidationCounters,
    did_counters: &DidCounters,
    validated_events: usize,
    did_events: &[StockoutEvent],
) -> Vec<Issue> {
    let rejected: usize = RejectionReason::ALL
        .iter()
        .map(|reason| validation.rejected(*reason))
        .sum();

    let mut issues: Vec<Issue> = [
        mismatch("raw_candidates", validation.raw, validation.valid + rejected),
        mismatch("valid_events", validation.valid, validated_events),
        mismatch("did_valid", did_counters.valid, did_events.len()),
        mismatch(
            "did_outcomes",
            validated_events,
            did_counters.valid + did_counters.no_post_period() + did_counters.no_effect,
        ),
    ]
    .into_iter()
    .flatten()
    .collect();

    let mut seen = BTreeSet::new();
    for event in did_events {
        if !seen.insert(event.event_id().as_str()) {
            issues.push(Issue::DuplicateEventId {
                event_id: event.event_id().to_string(),
            });
        }
    }
    issues
}
