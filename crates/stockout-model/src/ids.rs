#![deny(unsafe_code)]

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ModelError;

/// Pharmacy identifier (`ORG_ID` / `CLIENT_ID` in raw files).
///
/// A market is identified by the id of its target pharmacy.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PharmacyId(i64);

impl PharmacyId {
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for PharmacyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct DrugId(i64);

impl DrugId {
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for DrugId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ingredient group (INN) identifier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct IngredientId(i64);

impl IngredientId {
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for IngredientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Deterministic stock-out event identifier: `{market}_{ingredient}_{seq:04}`.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    pub fn new(market: PharmacyId, ingredient: IngredientId, sequence: u32) -> Self {
        Self(format!("{market}_{ingredient}_{sequence:04}"))
    }

    /// Parse an id produced by [`EventId::new`].
    pub fn parse(value: impl Into<String>) -> Result<Self, ModelError> {
        let value = value.into();
        let trimmed = value.trim();
        let parts: Vec<&str> = trimmed.split('_').collect();
        let well_formed = parts.len() == 3
            && parts
                .iter()
                .all(|part| !part.is_empty() && part.trim_start_matches('-').parse::<u64>().is_ok());
        if !well_formed {
            return Err(ModelError::Message(format!("malformed event id: {value}")));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
