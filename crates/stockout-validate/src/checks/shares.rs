use std::collections::BTreeMap;

use stockout_model::SubstituteShareRecord;

use crate::issue::Issue;

/// Substitute shares of every stocked-out drug must sum to 100 within
/// `tolerance` percentage points.
pub fn check_share_sums(records: &[SubstituteShareRecord], tolerance: f64) -> Vec<Issue> {
    let mut sums: BTreeMap<i64, f64> = BTreeMap::new();
    for record in records {
        *sums.entry(record.stockout_drug_id.get()).or_default() += record.substitute_share;
    }
    sums.into_iter()
        .filter(|(_, sum)| (sum - 100.0).abs() > tolerance)
        .map(|(drug_id, sum)| Issue::SubstituteShareSum { drug_id, sum })
        .collect()
}
