//! Urgency classification of need requests.

use crate::model::{NeedItems, SpecialConditions, Urgency};

/// Classify a request. First match wins:
///
/// 1. any critical item (shelter, medicine, infant care, medical support)
///    or any special condition → [`Urgency::Critical`]
/// 2. dry rations, cooked food or water → [`Urgency::High`]
/// 3. otherwise [`Urgency::Moderate`], including an empty request
#[must_use]
pub fn classify(items: &NeedItems, conditions: &SpecialConditions) -> Urgency {
    let critical_item =
        items.shelter || items.medicine || items.infant_care || items.medical_support;
    if critical_item || conditions.any() {
        return Urgency::Critical;
    }
    if items.dry_rations || items.cooked_food || items.water {
        return Urgency::High;
    }
    Urgency::Moderate
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items() -> NeedItems {
        NeedItems::default()
    }

    fn none() -> SpecialConditions {
        SpecialConditions::default()
    }

    #[test]
    fn test_empty_request_is_moderate() {
        assert_eq!(classify(&items(), &none()), Urgency::Moderate);
    }

    #[test]
    fn test_moderate_items_stay_moderate() {
        let i = NeedItems {
            clothes: true,
            sanitary_items: true,
            ..items()
        };
        assert_eq!(classify(&i, &none()), Urgency::Moderate);
    }

    #[test]
    fn test_food_or_water_is_high() {
        for i in [
            NeedItems {
                water: true,
                ..items()
            },
            NeedItems {
                dry_rations: true,
                ..items()
            },
            NeedItems {
                cooked_food: true,
                clothes: true,
                ..items()
            },
        ] {
            assert_eq!(classify(&i, &none()), Urgency::High);
        }
    }

    #[test]
    fn test_critical_item_wins_over_high() {
        let i = NeedItems {
            water: true,
            medical_support: true,
            ..items()
        };
        assert_eq!(classify(&i, &none()), Urgency::Critical);
    }

    #[test]
    fn test_special_condition_alone_is_critical() {
        let c = SpecialConditions {
            is_pregnant: true,
            ..none()
        };
        assert_eq!(classify(&items(), &c), Urgency::Critical);
    }
}
