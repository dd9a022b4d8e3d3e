//! Weekly sales records.

use serde::{Deserialize, Serialize};

use crate::ids::{DrugId, IngredientId, PharmacyId};
use crate::week::Week;

/// Descriptive attributes carried alongside every weekly record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrugAttributes {
    pub drug_name: String,
    pub ingredient_name: String,
    /// Form category 1 (`NFC Code (1)`).
    pub nfc1: String,
    /// Form category 2 (`NFC Code (2)`).
    pub nfc2: String,
}

/// One row of a raw market file after decoding, before normalization.
///
/// Several rows may share the same (pharmacy, drug, week) key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawObservation {
    pub pharmacy_id: PharmacyId,
    pub drug_id: DrugId,
    pub ingredient_id: IngredientId,
    pub week: Week,
    pub quantity: f64,
    pub revenue: f64,
    pub drug_name: Option<String>,
    pub ingredient_name: Option<String>,
    pub nfc1: Option<String>,
    pub nfc2: Option<String>,
}

/// Normalized weekly observation. At most one per (pharmacy, drug, week).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyObservation {
    pub pharmacy_id: PharmacyId,
    pub drug_id: DrugId,
    pub ingredient_id: IngredientId,
    pub week: Week,
    pub quantity: f64,
    pub revenue: f64,
    pub attributes: DrugAttributes,
}

impl WeeklyObservation {
    pub fn is_sold(&self) -> bool {
        self.quantity > 0.0
    }
}
