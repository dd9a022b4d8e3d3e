use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ids::{DrugId, EventId};

/// Compatibility bucket of a stocked-out drug's form category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompatibilityGroup {
    Oral,
    ExactMatch,
    Excluded,
}

impl CompatibilityGroup {
    pub fn as_str(self) -> &'static str {
        match self {
            CompatibilityGroup::Oral => "ORAL",
            CompatibilityGroup::ExactMatch => "EXACT_MATCH",
            CompatibilityGroup::Excluded => "EXCLUDED",
        }
    }
}

impl fmt::Display for CompatibilityGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A compatible drug that was purchasable in the market during an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubstituteCandidate {
    pub event_id: EventId,
    pub drug_id: DrugId,
    pub drug_name: String,
    pub nfc1: String,
    pub same_nfc1: bool,
    /// Group of the stocked-out drug, not of the candidate.
    pub group: CompatibilityGroup,
}

/// Lift of one substitute within one event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubstituteLift {
    pub drug_id: DrugId,
    pub drug_name: String,
    pub nfc1: String,
    pub same_nfc1: bool,
    pub sales_pre: f64,
    pub sales_during: f64,
    pub expected: f64,
    pub lift: f64,
}

/// Lift of one substitute aggregated across every event of a market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubstituteShareRecord {
    pub stockout_drug_id: DrugId,
    pub stockout_drug_name: String,
    pub substitute_drug_id: DrugId,
    pub substitute_drug_name: String,
    pub same_nfc1: bool,
    pub total_lift: f64,
    pub events_count: usize,
    /// Sum of surviving pair lifts for the stocked-out drug.
    pub internal_lift: f64,
    /// Percentage of `internal_lift`, 0 to 100.
    pub substitute_share: f64,
    pub lift_same_nfc1: f64,
    pub lift_diff_nfc1: f64,
}
