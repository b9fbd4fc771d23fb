//! A victim's request for help.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::Document;

/// Urgency tier, most urgent first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Urgency {
    /// Life or health at risk.
    Critical,
    /// Food or water.
    High,
    /// Everything else.
    #[default]
    Moderate,
}

/// Progress on a need request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NeedStatus {
    /// Nobody has responded yet.
    #[default]
    Pending,
    /// Someone is working on it.
    InProgress,
    /// Done.
    Resolved,
}

/// Requested items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[allow(clippy::struct_excessive_bools)]
pub struct NeedItems {
    /// Tent, tarpaulin, a roof.
    pub shelter: bool,
    /// Prescription or first-aid medicine.
    pub medicine: bool,
    /// Diapers, milk powder.
    pub infant_care: bool,
    /// Wheelchair, oxygen.
    pub medical_support: bool,
    /// Rice, dhal, tinned food.
    pub dry_rations: bool,
    /// Ready-to-eat meals.
    pub cooked_food: bool,
    /// Drinking water.
    pub water: bool,
    /// Clothes.
    pub clothes: bool,
    /// Soap, sanitary pads.
    pub sanitary_items: bool,
}

impl NeedItems {
    /// Display labels of the requested items.
    #[must_use]
    pub fn labels(&self) -> Vec<&'static str> {
        [
            (self.shelter, "Shelter"),
            (self.medicine, "Medicine"),
            (self.infant_care, "Infant Care"),
            (self.medical_support, "Medical Support"),
            (self.dry_rations, "Dry Rations"),
            (self.cooked_food, "Cooked Food"),
            (self.water, "Water"),
            (self.clothes, "Clothes"),
            (self.sanitary_items, "Sanitary Items"),
        ]
        .into_iter()
        .filter_map(|(set, label)| set.then_some(label))
        .collect()
    }
}

/// Circumstances that make any request critical.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[allow(clippy::struct_excessive_bools)]
pub struct SpecialConditions {
    /// Someone in the household has a disability.
    pub has_disability: bool,
    /// Someone is pregnant.
    pub is_pregnant: bool,
    /// Someone is elderly.
    pub is_elderly: bool,
    /// There is an infant.
    pub has_infant: bool,
    /// Someone has a chronic illness.
    pub has_chronic_illness: bool,
}

impl SpecialConditions {
    /// Whether any condition is set.
    #[must_use]
    pub fn any(&self) -> bool {
        self.has_disability
            || self.is_pregnant
            || self.is_elderly
            || self.has_infant
            || self.has_chronic_illness
    }
}

/// Partial update of [`NeedItems`]; absent flags keep their value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NeedItemsPatch {
    /// See [`NeedItems::shelter`].
    pub shelter: Option<bool>,
    /// See [`NeedItems::medicine`].
    pub medicine: Option<bool>,
    /// See [`NeedItems::infant_care`].
    pub infant_care: Option<bool>,
    /// See [`NeedItems::medical_support`].
    pub medical_support: Option<bool>,
    /// See [`NeedItems::dry_rations`].
    pub dry_rations: Option<bool>,
    /// See [`NeedItems::cooked_food`].
    pub cooked_food: Option<bool>,
    /// See [`NeedItems::water`].
    pub water: Option<bool>,
    /// See [`NeedItems::clothes`].
    pub clothes: Option<bool>,
    /// See [`NeedItems::sanitary_items`].
    pub sanitary_items: Option<bool>,
}

impl NeedItemsPatch {
    /// Overwrite the flags present in the patch.
    pub fn apply_to(&self, items: &mut NeedItems) {
        let fields = [
            (self.shelter, &mut items.shelter),
            (self.medicine, &mut items.medicine),
            (self.infant_care, &mut items.infant_care),
            (self.medical_support, &mut items.medical_support),
            (self.dry_rations, &mut items.dry_rations),
            (self.cooked_food, &mut items.cooked_food),
            (self.water, &mut items.water),
            (self.clothes, &mut items.clothes),
            (self.sanitary_items, &mut items.sanitary_items),
        ];
        for (patch, slot) in fields {
            if let Some(value) = patch {
                *slot = value;
            }
        }
    }
}

/// Partial update of [`SpecialConditions`]; absent flags keep their value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecialConditionsPatch {
    /// See [`SpecialConditions::has_disability`].
    pub has_disability: Option<bool>,
    /// See [`SpecialConditions::is_pregnant`].
    pub is_pregnant: Option<bool>,
    /// See [`SpecialConditions::is_elderly`].
    pub is_elderly: Option<bool>,
    /// See [`SpecialConditions::has_infant`].
    pub has_infant: Option<bool>,
    /// See [`SpecialConditions::has_chronic_illness`].
    pub has_chronic_illness: Option<bool>,
}

impl SpecialConditionsPatch {
    /// Overwrite the flags present in the patch.
    pub fn apply_to(&self, conditions: &mut SpecialConditions) {
        let fields = [
            (self.has_disability, &mut conditions.has_disability),
            (self.is_pregnant, &mut conditions.is_pregnant),
            (self.is_elderly, &mut conditions.is_elderly),
            (self.has_infant, &mut conditions.has_infant),
            (self.has_chronic_illness, &mut conditions.has_chronic_illness),
        ];
        for (patch, slot) in fields {
            if let Some(value) = patch {
                *slot = value;
            }
        }
    }
}

/// A victim's standing request for help. One per victim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VictimNeeds {
    /// Requesting victim.
    pub victim_id: String,
    /// Requested items.
    #[serde(default)]
    pub items: NeedItems,
    /// Household circumstances.
    #[serde(default)]
    pub special_conditions: SpecialConditions,
    /// e.g. "Need insulin".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Derived from items and conditions on every write.
    #[serde(default)]
    pub urgency: Urgency,
    /// Progress.
    #[serde(default)]
    pub status: NeedStatus,
    /// Admin or contributor id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responded_by: Option<String>,
    /// When the last response was recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_date: Option<DateTime<Utc>>,
    /// Notes from the responder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_notes: Option<String>,
    /// Flagged as an emergency by the victim.
    #[serde(default)]
    pub is_emergency: bool,
    /// Why.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emergency_reason: Option<String>,
    /// First submission.
    pub request_date: DateTime<Utc>,
    /// Last change.
    pub last_updated: DateTime<Utc>,
}

impl Document for VictimNeeds {
    const COLLECTION: &'static str = "victim_needs";

    fn doc_id(&self) -> &str {
        &self.victim_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_urgency_orders_most_urgent_first() {
        let mut tiers = vec![Urgency::Moderate, Urgency::Critical, Urgency::High];
        tiers.sort();
        assert_eq!(tiers, vec![Urgency::Critical, Urgency::High, Urgency::Moderate]);
    }

    #[test]
    fn test_items_missing_flags_default_false() {
        let items: NeedItems = serde_json::from_value(json!({"water": true})).unwrap();
        assert!(items.water);
        assert!(!items.shelter);
    }

    #[test]
    fn test_labels() {
        let items = NeedItems {
            water: true,
            infant_care: true,
            ..NeedItems::default()
        };
        assert_eq!(items.labels(), vec!["Infant Care", "Water"]);
        assert!(NeedItems::default().labels().is_empty());
    }

    #[test]
    fn test_items_patch_only_touches_supplied_flags() {
        let mut items = NeedItems {
            water: true,
            clothes: true,
            ..NeedItems::default()
        };
        let patch: NeedItemsPatch =
            serde_json::from_value(json!({"clothes": false, "shelter": true})).unwrap();
        patch.apply_to(&mut items);

        assert!(items.water);
        assert!(!items.clothes);
        assert!(items.shelter);
    }

    #[test]
    fn test_conditions_patch_and_any() {
        let mut conditions = SpecialConditions::default();
        assert!(!conditions.any());

        let patch = SpecialConditionsPatch {
            is_elderly: Some(true),
            ..SpecialConditionsPatch::default()
        };
        patch.apply_to(&mut conditions);
        assert!(conditions.is_elderly);
        assert!(conditions.any());
    }

    #[test]
    fn test_status_wire_name() {
        assert_eq!(serde_json::to_value(NeedStatus::InProgress).unwrap(), "in-progress");
        assert!(serde_json::from_value::<NeedStatus>(json!("closed")).is_err());
    }
}
