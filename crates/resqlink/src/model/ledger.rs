//! Collections, inventory lines and distributions.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::Place;
use crate::storage::Document;

/// Kind of relief goods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ItemCategory {
    /// Rations, cooked food.
    Food,
    /// Drinking water.
    Water,
    /// Clothes and bedding.
    Clothing,
    /// Medicine and first aid.
    Medicine,
    /// Soap, sanitary items.
    Hygiene,
    /// Tents, tarpaulins.
    Shelter,
    /// Anything else.
    Other,
}

impl ItemCategory {
    /// Wire name, e.g. `"food"`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Food => "food",
            Self::Water => "water",
            Self::Clothing => "clothing",
            Self::Medicine => "medicine",
            Self::Hygiene => "hygiene",
            Self::Shelter => "shelter",
            Self::Other => "other",
        }
    }
}

/// State of the goods.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ItemCondition {
    /// Unused.
    New,
    /// Used but good.
    #[default]
    Good,
    /// Worn but usable.
    Usable,
    /// Past its expiry date. Only set on inventory lines.
    Expired,
}

/// Where a collection is in its lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CollectionStatus {
    /// Logged, not yet stored.
    #[default]
    Collected,
    /// In the contributor's storage.
    InStorage,
    /// Some of it handed out.
    PartiallyDistributed,
    /// All of it handed out.
    FullyDistributed,
}

/// Who received a distribution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecipientType {
    /// A registered victim.
    #[default]
    Victim,
    /// A relief center or camp.
    ReliefCenter,
    /// A village or community group.
    Community,
    /// Anyone else.
    Other,
}

/// How goods reached the recipient.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeliveryMethod {
    /// Contributor delivered in person.
    #[default]
    DirectDelivery,
    /// Recipient picked them up.
    Pickup,
    /// Handed to a relief center.
    ReliefCenter,
}

/// Where a distribution is in its lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DistributionStatus {
    /// Planned.
    #[default]
    Pending,
    /// On the way.
    InTransit,
    /// Handed over.
    Delivered,
    /// Recipient confirmed receipt.
    Confirmed,
}

/// One line of a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectedItem {
    /// Category.
    pub category: ItemCategory,
    /// e.g. "Rice".
    pub item_name: String,
    /// Amount in `unit`.
    pub quantity: f64,
    /// kg, liters, pieces, boxes.
    #[serde(default)]
    pub unit: String,
    /// State of the goods.
    #[serde(default)]
    pub condition: ItemCondition,
    /// Best-before date.
    #[serde(
        default,
        deserialize_with = "super::time::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub expiry_date: Option<DateTime<Utc>>,
}

/// Kind of target a collection is handed over to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HandoverTarget {
    /// A collection point, by `collectionPointId`.
    CollectionPoint,
    /// A victim, by `victimId`.
    Victim,
}

/// Where a logged collection is headed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Handover {
    /// Kind of target.
    #[serde(rename = "type")]
    pub target: HandoverTarget,
    /// Target id.
    #[serde(rename = "ref")]
    pub reference: String,
    /// Expected arrival.
    #[serde(
        default,
        deserialize_with = "super::time::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub eta: Option<DateTime<Utc>>,
}

/// Goods a contributor collected in one go.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    /// `COLL0001`
    pub collection_id: String,
    /// Collecting contributor.
    pub contributor_id: String,
    /// What was collected.
    pub items: Vec<CollectedItem>,
    /// When it was collected.
    pub collection_date: DateTime<Utc>,
    /// Where it was collected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_location: Option<Place>,
    /// Donor details, unless anonymous.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub donor_name: Option<String>,
    /// Donor contact number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub donor_phone: Option<String>,
    /// Donor e-mail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub donor_email: Option<String>,
    /// Donor asked not to be named.
    #[serde(default)]
    pub is_anonymous: bool,
    /// Lifecycle state.
    #[serde(default)]
    pub status: CollectionStatus,
    /// Photo URLs.
    #[serde(default)]
    pub photos: Vec<String>,
    /// Free text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Handover target, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handover: Option<Handover>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last change.
    pub updated_at: DateTime<Utc>,
}

impl Collection {
    /// Sum of item quantities.
    #[must_use]
    pub fn total_quantity(&self) -> f64 {
        self.items.iter().map(|i| i.quantity).sum()
    }
}

impl Document for Collection {
    const COLLECTION: &'static str = "collections";

    fn doc_id(&self) -> &str {
        &self.collection_id
    }

    fn owner_id(&self) -> Option<&str> {
        Some(&self.contributor_id)
    }
}

/// Running stock of one item held by one contributor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryLine {
    /// `INV0001`
    pub inventory_id: String,
    /// Holding contributor.
    pub contributor_id: String,
    /// Category of the first collection that created the line.
    pub category: ItemCategory,
    /// Item name; unique per contributor.
    pub item_name: String,
    /// Amount on hand, never negative.
    pub current_quantity: f64,
    /// Unit of `current_quantity`.
    #[serde(default)]
    pub unit: String,
    /// Low-stock threshold.
    pub minimum_threshold: f64,
    /// Shelf, room or warehouse.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_location: Option<String>,
    /// e.g. "6 months".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shelf_life: Option<String>,
    /// Best-before date.
    #[serde(
        default,
        deserialize_with = "super::time::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub expiry_date: Option<DateTime<Utc>>,
    /// State of the goods.
    #[serde(default)]
    pub condition: ItemCondition,
    /// Collections that fed this line, in order.
    #[serde(default)]
    pub source_collection_ids: Vec<String>,
    /// `current_quantity < minimum_threshold`.
    #[serde(default)]
    pub is_low_stock: bool,
    /// Expiry date falls inside the expiring-soon window.
    #[serde(default)]
    pub is_expiring_soon: bool,
    /// Last time a collection added to this line.
    pub last_restocked: DateTime<Utc>,
    /// Last change.
    pub updated_at: DateTime<Utc>,
}

/// Unique lookup key of the line for `item_name` held by `contributor_id`.
#[must_use]
pub fn line_key(contributor_id: &str, item_name: &str) -> String {
    format!("{contributor_id}\u{1f}{item_name}")
}

impl InventoryLine {
    /// Recompute the alert flags from quantity, threshold and expiry date.
    ///
    /// Returns `true` if either flag changed. Already expired goods count as
    /// expiring soon.
    pub fn refresh_alerts(&mut self, now: DateTime<Utc>, window: Duration) -> bool {
        let low = self.current_quantity < self.minimum_threshold;
        let expiring = self.expiry_date.is_some_and(|d| d <= now + window);
        let changed = low != self.is_low_stock || expiring != self.is_expiring_soon;
        self.is_low_stock = low;
        self.is_expiring_soon = expiring;
        changed
    }
}

impl Document for InventoryLine {
    const COLLECTION: &'static str = "inventory";

    fn doc_id(&self) -> &str {
        &self.inventory_id
    }

    fn owner_id(&self) -> Option<&str> {
        Some(&self.contributor_id)
    }

    fn lookup_key(&self) -> Option<String> {
        Some(line_key(&self.contributor_id, &self.item_name))
    }
}

/// One line of a distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributedItem {
    /// Inventory line the goods came from.
    pub inventory_id: String,
    /// Filled from the line when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<ItemCategory>,
    /// Filled from the line when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_name: Option<String>,
    /// Amount handed out.
    pub quantity_distributed: f64,
    /// Filled from the line when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

/// Goods handed out to a recipient in one go.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Distribution {
    /// `DIST0001`
    pub distribution_id: String,
    /// Distributing contributor.
    pub contributor_id: String,
    /// What was handed out.
    pub items: Vec<DistributedItem>,
    /// Kind of recipient.
    #[serde(default)]
    pub recipient_type: RecipientType,
    /// `victimId` or center id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient_id: Option<String>,
    /// Recipient name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient_name: Option<String>,
    /// Recipient contact number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient_phone: Option<String>,
    /// Recipient address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient_address: Option<String>,
    /// Recipient district and position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient_location: Option<Place>,
    /// When the goods were handed out.
    pub distribution_date: DateTime<Utc>,
    /// How the goods reached the recipient.
    #[serde(default)]
    pub delivery_method: DeliveryMethod,
    /// Photo URLs.
    #[serde(default)]
    pub delivery_proof: Vec<String>,
    /// Image URL or digital signature.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient_signature: Option<String>,
    /// Recipient confirmed receipt.
    #[serde(default)]
    pub recipient_confirmation: bool,
    /// Families reached.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub families_benefited: Option<u32>,
    /// People reached.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub individuals_benefited: Option<u32>,
    /// Need request this distribution fulfilled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fulfilled_need_id: Option<String>,
    /// Free text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Lifecycle state.
    #[serde(default)]
    pub status: DistributionStatus,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last change.
    pub updated_at: DateTime<Utc>,
}

impl Distribution {
    /// Sum of distributed quantities.
    #[must_use]
    pub fn total_quantity(&self) -> f64 {
        self.items.iter().map(|i| i.quantity_distributed).sum()
    }
}

impl Document for Distribution {
    const COLLECTION: &'static str = "distributions";

    fn doc_id(&self) -> &str {
        &self.distribution_id
    }

    fn owner_id(&self) -> Option<&str> {
        Some(&self.contributor_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn line(quantity: f64, threshold: f64, expiry: Option<DateTime<Utc>>) -> InventoryLine {
        let now = Utc::now();
        InventoryLine {
            inventory_id: "INV0001".to_string(),
            contributor_id: "CON001".to_string(),
            category: ItemCategory::Food,
            item_name: "Rice".to_string(),
            current_quantity: quantity,
            unit: "kg".to_string(),
            minimum_threshold: threshold,
            storage_location: None,
            shelf_life: None,
            expiry_date: expiry,
            condition: ItemCondition::Good,
            source_collection_ids: vec![],
            is_low_stock: false,
            is_expiring_soon: false,
            last_restocked: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_refresh_low_stock() {
        let mut l = line(5.0, 10.0, None);
        assert!(l.refresh_alerts(Utc::now(), Duration::days(30)));
        assert!(l.is_low_stock);

        l.current_quantity = 10.0;
        l.refresh_alerts(Utc::now(), Duration::days(30));
        assert!(!l.is_low_stock);
    }

    #[test]
    fn test_refresh_expiring_soon() {
        let now = Utc::now();
        let window = Duration::days(30);

        let mut soon = line(50.0, 10.0, Some(now + Duration::days(10)));
        soon.refresh_alerts(now, window);
        assert!(soon.is_expiring_soon);

        let mut later = line(50.0, 10.0, Some(now + Duration::days(90)));
        later.refresh_alerts(now, window);
        assert!(!later.is_expiring_soon);

        let mut past = line(50.0, 10.0, Some(now - Duration::days(1)));
        past.refresh_alerts(now, window);
        assert!(past.is_expiring_soon);
    }

    #[test]
    fn test_refresh_reports_no_change() {
        let mut l = line(50.0, 10.0, None);
        assert!(!l.refresh_alerts(Utc::now(), Duration::days(30)));
    }

    #[test]
    fn test_line_key_distinguishes_contributors() {
        assert_ne!(line_key("CON001", "Rice"), line_key("CON002", "Rice"));
        assert_eq!(line(1.0, 1.0, None).lookup_key(), Some(line_key("CON001", "Rice")));
    }

    #[test]
    fn test_handover_wire_names() {
        let h: Handover = serde_json::from_value(json!({
            "type": "collection-point",
            "ref": "CP001",
            "eta": "2024-06-01T10:00"
        }))
        .unwrap();
        assert_eq!(h.target, HandoverTarget::CollectionPoint);
        assert_eq!(h.reference, "CP001");
        assert!(h.eta.is_some());
    }

    #[test]
    fn test_collected_item_defaults() {
        let item: CollectedItem = serde_json::from_value(json!({
            "category": "water",
            "itemName": "Bottled Water",
            "quantity": 24
        }))
        .unwrap();
        assert_eq!(item.condition, ItemCondition::Good);
        assert!((item.quantity - 24.0).abs() < f64::EPSILON);
        assert!(item.unit.is_empty());
    }

    #[test]
    fn test_unknown_category_rejected() {
        let result: Result<CollectedItem, _> = serde_json::from_value(json!({
            "category": "toys",
            "itemName": "Ball",
            "quantity": 1
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(
            serde_json::to_value(CollectionStatus::PartiallyDistributed).unwrap(),
            "partially-distributed"
        );
        assert_eq!(
            serde_json::to_value(DistributionStatus::InTransit).unwrap(),
            "in-transit"
        );
        assert_eq!(
            serde_json::to_value(DeliveryMethod::DirectDelivery).unwrap(),
            "direct-delivery"
        );
    }
}
