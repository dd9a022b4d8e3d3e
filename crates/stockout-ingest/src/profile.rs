//! Market profiles and the run-wide drug catalog.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use stockout_model::{DrugId, IngredientId, PharmacyId};

use crate::reader::LoadedMarket;

/// Preprocessing statistics for one market file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketProfile {
    pub market_id: PharmacyId,
    pub file_name: String,
    /// Distinct selling pharmacies minus the target.
    pub competitors_count: usize,
    pub data_start: NaiveDate,
    pub data_end: NaiveDate,
    pub days_range: i64,
    /// Whole weeks between start and end.
    pub weeks_range: i64,
    pub drugs_count: usize,
    pub ingredients_count: usize,
    pub records_count: usize,
}

impl MarketProfile {
    pub fn from_market(market: &LoadedMarket) -> Self {
        let mut pharmacies = BTreeSet::new();
        let mut drugs = BTreeSet::new();
        let mut ingredients = BTreeSet::new();
        for obs in &market.observations {
            pharmacies.insert(obs.pharmacy_id);
            drugs.insert(obs.drug_id);
            ingredients.insert(obs.ingredient_id);
        }
        let days_range = (market.data_end - market.data_start).num_days();
        Self {
            market_id: market.market_id,
            file_name: market.file_name.clone(),
            competitors_count: pharmacies.len().saturating_sub(1),
            data_start: market.data_start,
            data_end: market.data_end,
            days_range,
            weeks_range: days_range.div_euclid(7),
            drugs_count: drugs.len(),
            ingredients_count: ingredients.len(),
            records_count: market.observations.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrugCatalogEntry {
    pub drug_id: DrugId,
    pub drug_name: String,
    pub ingredient_id: IngredientId,
    pub ingredient_name: String,
}

/// Every drug seen in any raw file.
///
/// The first non-empty name wins, so merging markets in ascending id order
/// keeps the catalog deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrugCatalog {
    entries: BTreeMap<DrugId, DrugCatalogEntry>,
}

impl DrugCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merge(&mut self, market: &LoadedMarket) {
        for obs in &market.observations {
            let entry = self
                .entries
                .entry(obs.drug_id)
                .or_insert_with(|| DrugCatalogEntry {
                    drug_id: obs.drug_id,
                    drug_name: String::new(),
                    ingredient_id: obs.ingredient_id,
                    ingredient_name: String::new(),
                });
            if entry.drug_name.is_empty()
                && let Some(name) = &obs.drug_name
            {
                entry.drug_name.clone_from(name);
            }
            if entry.ingredient_name.is_empty()
                && let Some(name) = &obs.ingredient_name
            {
                entry.ingredient_name.clone_from(name);
            }
        }
    }

    /// Merges another catalog; names already present are kept.
    pub fn absorb(&mut self, other: &DrugCatalog) {
        for incoming in other.entries() {
            let entry = self
                .entries
                .entry(incoming.drug_id)
                .or_insert_with(|| incoming.clone());
            if entry.drug_name.is_empty() {
                entry.drug_name.clone_from(&incoming.drug_name);
            }
            if entry.ingredient_name.is_empty() {
                entry.ingredient_name.clone_from(&incoming.ingredient_name);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, drug_id: DrugId) -> Option<&DrugCatalogEntry> {
        self.entries.get(&drug_id)
    }

    /// Entries ordered by drug id.
    pub fn entries(&self) -> impl Iterator<Item = &DrugCatalogEntry> {
        self.entries.values()
    }
}
