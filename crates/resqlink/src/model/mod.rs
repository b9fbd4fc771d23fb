//! Record types for the relief ledger.
//!
//! Every type here is a JSON document with camelCase field names, the same
//! shape on the wire and in storage.

pub mod account;
pub mod contributor;
pub mod ledger;
pub mod needs;
pub mod outreach;
pub mod time;

use serde::{Deserialize, Serialize};

pub use account::{
    Account, AccountProfile, Admin, FamilyMember, Role, Supplier, Victim, VictimProfile,
};
pub use contributor::{Contributor, ContributorType, ServiceArea, VerificationStatus};
pub use ledger::{
    CollectedItem, Collection, CollectionStatus, DeliveryMethod, Distribution, DistributedItem,
    DistributionStatus, Handover, HandoverTarget, InventoryLine, ItemCategory, ItemCondition,
    RecipientType,
};
pub use needs::{NeedItems, NeedStatus, SpecialConditions, Urgency, VictimNeeds};
pub use outreach::{CollectionPoint, Notification, NotificationItem, NotificationStatus, TargetType};

/// A latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Degrees north.
    pub latitude: f64,
    /// Degrees east.
    pub longitude: f64,
}

/// A place with an optional street address and district.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    /// Street address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// District name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
    /// GPS position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
}

/// Treat blank strings from form posts as absent.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
