//! Gap filling of raw weekly records.
//!
//! Every (pharmacy, drug) key becomes a contiguous weekly grid from its first
//! to its last observed week. Missing weeks carry zero quantity and revenue;
//! descriptive attributes are forward filled, then back filled.

use std::collections::BTreeMap;

use stockout_model::{
    DrugAttributes, DrugId, IngredientId, PharmacyId, RawObservation, Week, WeeklyObservation,
};

use crate::error::{Result, TransformError};

/// Same-week duplicates collapsed into one row.
#[derive(Debug, Default)]
struct WeekBucket {
    quantity: f64,
    revenue: f64,
    ingredient_id: Option<IngredientId>,
    drug_name: Option<String>,
    ingredient_name: Option<String>,
    nfc1: Option<String>,
    nfc2: Option<String>,
}

impl WeekBucket {
    fn absorb(&mut self, obs: &RawObservation) {
        self.quantity += obs.quantity;
        self.revenue += obs.revenue;
        self.ingredient_id = Some(match self.ingredient_id {
            Some(current) => current.min(obs.ingredient_id),
            None => obs.ingredient_id,
        });
        keep_smallest(&mut self.drug_name, obs.drug_name.as_deref());
        keep_smallest(&mut self.ingredient_name, obs.ingredient_name.as_deref());
        keep_smallest(&mut self.nfc1, obs.nfc1.as_deref());
        keep_smallest(&mut self.nfc2, obs.nfc2.as_deref());
    }
}

/// Lexicographically smallest non-empty value wins.
fn keep_smallest(slot: &mut Option<String>, candidate: Option<&str>) {
    let Some(candidate) = candidate.filter(|value| !value.is_empty()) else {
        return;
    };
    match slot {
        Some(current) if current.as_str() <= candidate => {}
        _ => *slot = Some(candidate.to_string()),
    }
}

/// Forward fill, then back fill. Empty everywhere yields empty strings.
fn fill_both_ways(values: &[Option<String>]) -> Vec<String> {
    let mut filled: Vec<Option<String>> = Vec::with_capacity(values.len());
    let mut last: Option<&String> = None;
    for value in values {
        if let Some(v) = value {
            last = Some(v);
        }
        filled.push(last.cloned());
    }
    let mut next: Option<String> = None;
    for slot in filled.iter_mut().rev() {
        match slot {
            Some(v) => next = Some(v.clone()),
            None => slot.clone_from(&next),
        }
    }
    filled.into_iter().map(Option::unwrap_or_default).collect()
}

fn attribute_column(
    weeks: &[Week],
    buckets: &BTreeMap<Week, WeekBucket>,
    pick: impl Fn(&WeekBucket) -> Option<&String>,
) -> Vec<String> {
    let raw: Vec<Option<String>> = weeks
        .iter()
        .map(|week| buckets.get(week).and_then(&pick).cloned())
        .collect();
    fill_both_ways(&raw)
}

/// Builds the gap-filled series for one (pharmacy, drug) key.
///
/// All records must share the same pharmacy and drug.
pub fn normalize_series(records: &[RawObservation]) -> Result<Vec<WeeklyObservation>> {
    let Some(first) = records.first() else {
        return Err(TransformError::EmptySeries {
            pharmacy_id: PharmacyId::new(0),
            drug_id: DrugId::new(0),
        });
    };
    let (pharmacy_id, drug_id) = (first.pharmacy_id, first.drug_id);

    let mut buckets: BTreeMap<Week, WeekBucket> = BTreeMap::new();
    for obs in records {
        buckets.entry(obs.week).or_default().absorb(obs);
    }

    let (Some(&min_week), Some(&max_week)) = (buckets.keys().next(), buckets.keys().next_back())
    else {
        return Err(TransformError::EmptySeries {
            pharmacy_id,
            drug_id,
        });
    };
    let ingredient_id = buckets
        .values()
        .filter_map(|bucket| bucket.ingredient_id)
        .min()
        .unwrap_or(first.ingredient_id);

    let len = usize::try_from(max_week.weeks_since(min_week) + 1).unwrap_or(0);
    let mut weeks = Vec::with_capacity(len);
    let mut week = min_week;
    while week <= max_week {
        weeks.push(week);
        week = week.next();
    }

    let drug_names = attribute_column(&weeks, &buckets, |b| b.drug_name.as_ref());
    let ingredient_names = attribute_column(&weeks, &buckets, |b| b.ingredient_name.as_ref());
    let nfc1 = attribute_column(&weeks, &buckets, |b| b.nfc1.as_ref());
    let nfc2 = attribute_column(&weeks, &buckets, |b| b.nfc2.as_ref());

    let series = weeks
        .iter()
        .enumerate()
        .map(|(idx, week)| {
            let (quantity, revenue) = buckets
                .get(week)
                .map_or((0.0, 0.0), |bucket| (bucket.quantity, bucket.revenue));
            WeeklyObservation {
                pharmacy_id,
                drug_id,
                ingredient_id,
                week: *week,
                quantity,
                revenue,
                attributes: DrugAttributes {
                    drug_name: drug_names[idx].clone(),
                    ingredient_name: ingredient_names[idx].clone(),
                    nfc1: nfc1[idx].clone(),
                    nfc2: nfc2[idx].clone(),
                },
            }
        })
        .collect();
    Ok(series)
}

/// Gap fills every (pharmacy, drug) key of a market.
///
/// Output is ordered by pharmacy, drug and week.
pub fn normalize_observations(raw: &[RawObservation]) -> Result<Vec<WeeklyObservation>> {
    let mut keys: BTreeMap<(PharmacyId, DrugId), Vec<RawObservation>> = BTreeMap::new();
    for obs in raw {
        keys.entry((obs.pharmacy_id, obs.drug_id))
            .or_default()
            .push(obs.clone());
    }
    let mut normalized = Vec::with_capacity(raw.len());
    for records in keys.values() {
        normalized.extend(normalize_series(records)?);
    }
    Ok(normalized)
}
