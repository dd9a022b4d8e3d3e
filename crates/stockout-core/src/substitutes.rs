//! Substitute enumeration for a validated event.

use stockout_model::{FormCompatibility, SubstituteCandidate, ValidatedEvent};
use stockout_transform::IngredientSeries;

use crate::compat::{compatibility_group, is_compatible};

/// Other drugs of the group that are form compatible with the stocked-out
/// drug and had competitor sales during the stock-out window.
///
/// Candidates come out in drug id order.
pub fn find_substitutes(
    group: &IngredientSeries,
    event: &ValidatedEvent,
    forms: &FormCompatibility,
) -> Vec<SubstituteCandidate> {
    let window = event.period.window();
    let group_of_event = compatibility_group(&event.nfc1, forms);

    group
        .drugs
        .values()
        .filter(|drug| drug.drug_id != event.drug_id)
        .filter(|drug| is_compatible(&event.nfc1, &drug.attributes.nfc1, forms))
        // phantom filter
        .filter(|drug| drug.points_in(window).any(|p| p.market_quantity > 0.0))
        .map(|drug| SubstituteCandidate {
            event_id: event.event_id.clone(),
            drug_id: drug.drug_id,
            drug_name: drug.attributes.drug_name.clone(),
            nfc1: drug.attributes.nfc1.clone(),
            same_nfc1: drug.attributes.nfc1 == event.nfc1,
            group: group_of_event,
        })
        .collect()
}
