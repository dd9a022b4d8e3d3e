//! Per-group series consumed by detection and attribution.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use stockout_model::{DrugAttributes, DrugId, IngredientId, PharmacyId, Week, WeekRange};

/// One week of target sales joined with competitor totals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub week: Week,
    pub quantity: f64,
    pub revenue: f64,
    /// Competitor quantity for the same drug and week.
    pub market_quantity: f64,
    pub market_revenue: f64,
}

/// Gap-filled target series of one drug.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrugSeries {
    pub drug_id: DrugId,
    pub attributes: DrugAttributes,
    pub notsold_percent: f64,
    /// Contiguous, strictly increasing weeks.
    pub points: Vec<SeriesPoint>,
}

impl DrugSeries {
    pub fn points_in(&self, range: WeekRange) -> impl Iterator<Item = &SeriesPoint> {
        self.points.iter().filter(move |p| range.contains(p.week))
    }

    pub fn points_after(&self, week: Week) -> impl Iterator<Item = &SeriesPoint> {
        self.points.iter().filter(move |p| p.week > week)
    }

    pub fn quantity_in(&self, range: WeekRange) -> f64 {
        self.points_in(range).map(|p| p.quantity).sum()
    }

    pub fn market_quantity_in(&self, range: WeekRange) -> f64 {
        self.points_in(range).map(|p| p.market_quantity).sum()
    }

    pub fn first_week(&self) -> Option<Week> {
        self.points.first().map(|p| p.week)
    }

    pub fn last_week(&self) -> Option<Week> {
        self.points.last().map(|p| p.week)
    }
}

/// Every kept drug of one ingredient group at the target pharmacy.
///
/// Built once per group and only read afterwards; the map doubles as the
/// per-drug lookup index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientSeries {
    pub market_id: PharmacyId,
    pub ingredient_id: IngredientId,
    pub ingredient_name: String,
    pub drugs: BTreeMap<DrugId, DrugSeries>,
}

impl IngredientSeries {
    pub fn drug(&self, drug_id: DrugId) -> Option<&DrugSeries> {
        self.drugs.get(&drug_id)
    }

    /// Competitor quantity of the whole group within `range`.
    pub fn market_quantity_in(&self, range: WeekRange) -> f64 {
        self.drugs
            .values()
            .map(|drug| drug.market_quantity_in(range))
            .sum()
    }
}
