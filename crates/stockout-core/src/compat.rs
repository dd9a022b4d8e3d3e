//! Form-category compatibility between drugs.

use stockout_model::{CompatibilityGroup, FormCompatibility};

/// Symmetric compatibility of two form categories.
///
/// Excluded forms match nothing, not even themselves. Equal forms match,
/// and any two oral forms match each other.
pub fn is_compatible(a: &str, b: &str, forms: &FormCompatibility) -> bool {
    if forms.is_excluded(a) || forms.is_excluded(b) {
        return false;
    }
    a == b || (forms.is_oral(a) && forms.is_oral(b))
}

pub fn compatibility_group(form: &str, forms: &FormCompatibility) -> CompatibilityGroup {
    if forms.is_excluded(form) {
        CompatibilityGroup::Excluded
    } else if forms.is_oral(form) {
        CompatibilityGroup::Oral
    } else {
        CompatibilityGroup::ExactMatch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockout_model::config::{NON_MEDICAL, ORAL_LIQUID, ORAL_SOLID};

    #[test]
    fn oral_forms_are_interchangeable() {
        let forms = FormCompatibility::default();
        assert!(is_compatible(ORAL_SOLID, ORAL_LIQUID, &forms));
        assert!(is_compatible("Drops", "Drops", &forms));
        assert!(!is_compatible("Drops", ORAL_SOLID, &forms));
    }

    #[test]
    fn excluded_form_matches_nothing() {
        let forms = FormCompatibility::default();
        assert!(!is_compatible(NON_MEDICAL, NON_MEDICAL, &forms));
        assert!(!is_compatible(NON_MEDICAL, ORAL_SOLID, &forms));
        assert_eq!(compatibility_group(NON_MEDICAL, &forms), CompatibilityGroup::Excluded);
        assert_eq!(compatibility_group("Drops", &forms), CompatibilityGroup::ExactMatch);
    }
}
