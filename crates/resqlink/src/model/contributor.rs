//! Contributors: people and organizations that collect and hand out goods.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::account::{AccountProfile, Role};

/// What kind of body a contributor is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContributorType {
    /// A single person.
    #[default]
    Individual,
    /// A registered organization.
    Organization,
    /// Non-governmental organization.
    Ngo,
    /// Temple, church, mosque or similar.
    Religious,
    /// A company.
    Corporate,
}

/// Admin review state of a contributor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VerificationStatus {
    /// Not reviewed yet.
    #[default]
    Pending,
    /// Approved by an admin.
    Verified,
    /// Refused by an admin.
    Rejected,
}

/// An area a contributor can collect from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceArea {
    /// Province.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub province: Option<String>,
    /// District.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
}

/// A registered contributor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contributor {
    /// `CON001`
    pub contributor_id: String,
    /// Login e-mail.
    pub email: String,
    /// Person or organization name.
    pub name: String,
    /// Contact number.
    pub phone: String,
    /// Kind of body.
    #[serde(default)]
    pub contributor_type: ContributorType,
    /// Admin review state.
    #[serde(default)]
    pub verification_status: VerificationStatus,
    /// Districts they can collect from.
    #[serde(default)]
    pub service_areas: Vec<ServiceArea>,
    /// Owns or can use a vehicle.
    #[serde(default)]
    pub has_vehicle: bool,
    /// Van, truck, bike...
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicle_type: Option<String>,
    /// e.g. "500kg"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicle_capacity: Option<String>,
    /// Has a place to keep goods.
    #[serde(default)]
    pub has_storage: bool,
    /// Where the goods are kept.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_address: Option<String>,
    /// Free-text capacity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_capacity: Option<String>,
    /// Second contact number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternate_phone: Option<String>,
    /// Weekday names.
    #[serde(default)]
    pub available_days: Vec<String>,
    /// e.g. "9AM-5PM"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_hours: Option<String>,
    /// Collections logged so far.
    #[serde(default)]
    pub total_collections: u64,
    /// Distributions logged so far.
    #[serde(default)]
    pub total_distributions: u64,
    /// Registration time.
    pub registered_at: DateTime<Utc>,
    /// Last login, profile edit or ledger activity.
    pub last_active: DateTime<Utc>,
}

impl AccountProfile for Contributor {
    const COLLECTION: &'static str = "contributors";
    const ROLE: Role = Role::Contributor;
    const DUPLICATE_EMAIL: &'static str = "Email already registered";
    const UNKNOWN_EMAIL: &'static str = "Contributor not found";

    fn account_id(&self) -> &str {
        &self.contributor_id
    }

    fn email(&self) -> &str {
        &self.email
    }

    fn display_name(&self) -> &str {
        &self.name
    }

    fn on_login(&mut self, now: DateTime<Utc>) -> bool {
        self.last_active = now;
        true
    }

    fn login_summary(&self) -> Value {
        json!({
            "id": self.contributor_id,
            "contributorId": self.contributor_id,
            "name": self.name,
            "role": Role::Contributor,
            "verificationStatus": self.verification_status,
        })
    }
}

/// Fields a contributor may change on their own profile.
///
/// Id, e-mail, password and verification state are not listed, so any such
/// keys in a request body are dropped during deserialization.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributorUpdate {
    /// Display name.
    pub name: Option<String>,
    /// Contact number.
    pub phone: Option<String>,
    /// Kind of contributor.
    pub contributor_type: Option<ContributorType>,
    /// Replaces the served districts.
    pub service_areas: Option<Vec<ServiceArea>>,
    /// Owns a vehicle.
    pub has_vehicle: Option<bool>,
    /// e.g. "lorry".
    pub vehicle_type: Option<String>,
    /// Free-text load capacity.
    pub vehicle_capacity: Option<String>,
    /// Has storage space.
    pub has_storage: Option<bool>,
    /// Where goods are kept.
    pub storage_address: Option<String>,
    /// Free-text storage size.
    pub storage_capacity: Option<String>,
    /// Second contact number.
    pub alternate_phone: Option<String>,
    /// Replaces the available days.
    pub available_days: Option<Vec<String>>,
    /// Available hours.
    pub available_hours: Option<String>,
}

impl ContributorUpdate {
    /// Apply the supplied fields to `contributor` and mark it active.
    pub fn apply(self, contributor: &mut Contributor, now: DateTime<Utc>) {
        if let Some(name) = super::non_blank(self.name) {
            contributor.name = name;
        }
        if let Some(phone) = super::non_blank(self.phone) {
            contributor.phone = phone;
        }
        if let Some(kind) = self.contributor_type {
            contributor.contributor_type = kind;
        }
        if let Some(areas) = self.service_areas {
            contributor.service_areas = areas;
        }
        if let Some(v) = self.has_vehicle {
            contributor.has_vehicle = v;
        }
        if self.vehicle_type.is_some() {
            contributor.vehicle_type = super::non_blank(self.vehicle_type);
        }
        if self.vehicle_capacity.is_some() {
            contributor.vehicle_capacity = super::non_blank(self.vehicle_capacity);
        }
        if let Some(v) = self.has_storage {
            contributor.has_storage = v;
        }
        if self.storage_address.is_some() {
            contributor.storage_address = super::non_blank(self.storage_address);
        }
        if self.storage_capacity.is_some() {
            contributor.storage_capacity = super::non_blank(self.storage_capacity);
        }
        if self.alternate_phone.is_some() {
            contributor.alternate_phone = super::non_blank(self.alternate_phone);
        }
        if let Some(days) = self.available_days {
            contributor.available_days = days;
        }
        if self.available_hours.is_some() {
            contributor.available_hours = super::non_blank(self.available_hours);
        }
        contributor.last_active = now;
    }
}
