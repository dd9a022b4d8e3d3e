//! Post-computation checks.
//!
//! Violations here point at a defect in the computation, never at a
//! property of the input data.

pub mod counters;
pub mod did;
pub mod shares;

use stockout_model::{
    DidCounters, PharmacyId, StockoutEvent, StockoutParams, SubstituteShareRecord,
    ValidationCounters,
};
use tracing::warn;

use crate::issue::Severity;
use crate::report::ValidationReport;

pub use counters::check_counters;
pub use did::{check_event, check_events};
pub use shares::check_share_sums;

/// Everything the checks read for one market.
#[derive(Debug, Clone, Copy)]
pub struct MarketResults<'a> {
    pub market_id: PharmacyId,
    pub validation: &'a ValidationCounters,
    pub did_counters: &'a DidCounters,
    pub validated_events: usize,
    pub did_events: &'a [StockoutEvent],
    pub shares: &'a [SubstituteShareRecord],
}

/// Runs every check and logs each issue found.
pub fn run_all(results: &MarketResults<'_>, params: &StockoutParams) -> ValidationReport {
    let mut report = ValidationReport::new(results.market_id);

    // 1. DiD identities
    report.extend(check_events(results.did_events, params.invariant_tolerance));

    // 2. Substitute share sums
    report.extend(check_share_sums(results.shares, params.share_sum_tolerance));

    // 3. Counters
    report.extend(check_counters(
        results.validation,
        results.did_counters,
        results.validated_events,
        results.did_events,
    ));

    for issue in &report.issues {
        match issue.severity() {
            Severity::Error => warn!(
                market_id = %results.market_id,
                rule_id = issue.rule_id(),
                subject = %issue.subject(),
                "invariant violated: {}",
                issue.message()
            ),
            Severity::Warning => warn!(
                market_id = %results.market_id,
                rule_id = issue.rule_id(),
                subject = %issue.subject(),
                "{}",
                issue.message()
            ),
        }
    }
    report
}
