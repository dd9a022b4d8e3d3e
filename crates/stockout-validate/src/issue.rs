//! Validation issue types.
//!
//! Each variant carries only the figures needed to explain it.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Issue severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// The computation is wrong
    Error,
    /// Numeric drift worth a look
    Warning,
}

impl Severity {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Error => "Error",
            Self::Warning => "Warning",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Per-event DiD identities
    Invariant,
    /// Cross-record sums and counts
    Consistency,
}

impl Category {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Invariant => "Invariant",
            Self::Consistency => "Consistency",
        }
    }
}

/// Which complementary share pair failed to sum to one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SharePair {
    InternalLost,
    SameDiffNfc1,
}

impl SharePair {
    pub fn label(self) -> &'static str {
        match self {
            SharePair::InternalLost => "share_internal + share_lost",
            SharePair::SameDiffNfc1 => "share_same_nfc1 + share_diff_nfc1",
        }
    }
}

/// Validation issue - each variant carries only its needed data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Issue {
    // Event invariants
    /// Complementary shares do not sum to one
    ShareSum {
        event_id: String,
        pair: SharePair,
        sum: f64,
    },
    /// Same and different form lifts do not add up to the internal lift
    LiftSplit {
        event_id: String,
        lift_same_nfc1: f64,
        lift_diff_nfc1: f64,
        internal_lift: f64,
    },
    /// Internal lift plus lost sales differs from the total effect
    EffectSplit {
        event_id: String,
        internal_lift: f64,
        lost_sales: f64,
        total_effect: f64,
    },
    /// A defined share lies outside [0, 1]
    ShareOutOfRange {
        event_id: String,
        field: String,
        value: f64,
    },

    // Consistency checks
    /// Substitute shares of one stocked-out drug do not sum to 100
    SubstituteShareSum { drug_id: i64, sum: f64 },
    /// A reported count differs from the records it describes
    CountMismatch {
        counter: String,
        reported: usize,
        actual: usize,
    },
    /// Two events share an id
    DuplicateEventId { event_id: String },
}

impl Issue {
    pub fn rule_id(&self) -> &'static str {
        match self {
            Issue::ShareSum {
                pair: SharePair::InternalLost,
                ..
            } => "DID001",
            Issue::ShareSum {
                pair: SharePair::SameDiffNfc1,
                ..
            } => "DID002",
            Issue::LiftSplit { .. } => "DID003",
            Issue::EffectSplit { .. } => "DID004",
            Issue::ShareOutOfRange { .. } => "DID005",
            Issue::SubstituteShareSum { .. } => "SHR001",
            Issue::CountMismatch { .. } => "CNT001",
            Issue::DuplicateEventId { .. } => "CNT002",
        }
    }

    /// Record the issue is about: an event id, a drug id or a counter name.
    pub fn subject(&self) -> String {
        match self {
            Issue::ShareSum { event_id, .. }
            | Issue::LiftSplit { event_id, .. }
            | Issue::EffectSplit { event_id, .. }
            | Issue::ShareOutOfRange { event_id, .. }
            | Issue::DuplicateEventId { event_id } => event_id.clone(),
            Issue::SubstituteShareSum { drug_id, .. } => drug_id.to_string(),
            Issue::CountMismatch { counter, .. } => counter.clone(),
        }
    }

    pub fn category(&self) -> Category {
        match self {
            Issue::ShareSum { .. }
            | Issue::LiftSplit { .. }
            | Issue::EffectSplit { .. }
            | Issue::ShareOutOfRange { .. } => Category::Invariant,
            Issue::SubstituteShareSum { .. }
            | Issue::CountMismatch { .. }
            | Issue::DuplicateEventId { .. } => Category::Consistency,
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Issue::SubstituteShareSum { .. } => Severity::Warning,
            _ => Severity::Error,
        }
    }

    pub fn message(&self) -> String {
        match self {
            Issue::ShareSum { pair, sum, .. } => {
                format!("{} = {sum:.6}, expected 1", pair.label())
            }
            Issue::LiftSplit {
                lift_same_nfc1,
                lift_diff_nfc1,
                internal_lift,
                ..
            } => format!(
                "lift_same_nfc1 + lift_diff_nfc1 = {:.6}, internal_lift = {internal_lift:.6}",
                lift_same_nfc1 + lift_diff_nfc1
            ),
            Issue::EffectSplit {
                internal_lift,
                lost_sales,
                total_effect,
                ..
            } => format!(
                "internal_lift + lost_sales = {:.6}, total_effect = {total_effect:.6}",
                internal_lift + lost_sales
            ),
            Issue::ShareOutOfRange { field, value, .. } => {
                format!("{field} = {value:.6} outside [0, 1]")
            }
            Issue::SubstituteShareSum { sum, .. } => {
                format!("substitute shares sum to {sum:.4}%, expected 100%")
            }
            Issue::CountMismatch {
                counter,
                reported,
                actual,
            } => format!("{counter} reports {reported}, records show {actual}"),
            Issue::DuplicateEventId { event_id } => format!("event id {event_id} is not unique"),
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} {}: {}",
            self.severity().label(),
            self.rule_id(),
            self.subject(),
            self.message()
        )
    }
}
