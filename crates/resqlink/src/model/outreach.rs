//! Collection points and handover notifications.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ledger::{CollectedItem, HandoverTarget};
use super::Coordinates;
use crate::storage::Document;

/// A place where the public can drop off goods, run by a contributor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionPoint {
    /// `CP001`
    pub collection_point_id: String,
    /// Display name.
    pub name: String,
    /// Running contributor.
    pub managed_by_contributor_id: String,
    /// Contact number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_phone: Option<String>,
    /// Contact e-mail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    /// Street address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// District, used for filtering.
    pub district: String,
    /// GPS position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    /// e.g. "Daily 9am-6pm".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours: Option<String>,
    /// e.g. "Can store up to 2 tons".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity_note: Option<String>,
    /// Free text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Accepting goods.
    #[serde(default = "active")]
    pub is_active: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last change.
    pub updated_at: DateTime<Utc>,
}

fn active() -> bool {
    true
}

impl Document for CollectionPoint {
    const COLLECTION: &'static str = "collection_points";

    fn doc_id(&self) -> &str {
        &self.collection_point_id
    }

    fn owner_id(&self) -> Option<&str> {
        Some(&self.managed_by_contributor_id)
    }
}

/// Kind of notification recipient. Same wire names as [`HandoverTarget`].
pub type TargetType = HandoverTarget;

/// Delivery state of a notification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NotificationStatus {
    /// Goods on their way.
    #[default]
    Pending,
    /// Goods arrived.
    Delivered,
    /// Handover called off.
    Cancelled,
}

/// An item listed in a notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationItem {
    /// Item name.
    pub item_name: String,
    /// Amount.
    pub quantity: f64,
    /// Unit of `quantity`.
    #[serde(default)]
    pub unit: String,
    /// Category wire name.
    pub category: String,
}

impl From<&CollectedItem> for NotificationItem {
    fn from(item: &CollectedItem) -> Self {
        Self {
            item_name: item.item_name.clone(),
            quantity: item.quantity,
            unit: item.unit.clone(),
            category: item.category.as_str().to_string(),
        }
    }
}

/// Tells a collection point or victim that goods are headed their way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// `NTF0001`
    pub notification_id: String,
    /// Kind of recipient.
    pub target_type: TargetType,
    /// `collectionPointId` or `victimId`.
    pub target_ref: String,
    /// Headline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Body text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Goods on the way.
    #[serde(default)]
    pub items: Vec<NotificationItem>,
    /// Sending contributor.
    pub contributor_id: String,
    /// Sending contributor's name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contributor_name: Option<String>,
    /// Contributor contact number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contributor_phone: Option<String>,
    /// Contributor e-mail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contributor_email: Option<String>,
    /// Delivery state.
    #[serde(default)]
    pub status: NotificationStatus,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl Document for Notification {
    const COLLECTION: &'static str = "notifications";

    fn doc_id(&self) -> &str {
        &self.notification_id
    }

    // Victim and collection point ids never share a format, so the bare
    // reference is enough to index by recipient.
    fn owner_id(&self) -> Option<&str> {
        Some(&self.target_ref)
    }
}
