//! Login-bearing records: victims, suppliers and admins.
//!
//! Contributors live in [`super::contributor`]. Each account is stored as an
//! [`Account`] wrapper so the password hash stays out of every public view.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};

use super::Coordinates;
use crate::storage::Document;

/// Who a login token was issued to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    /// Affected person or family.
    Victim,
    /// Goods supplier.
    Supplier,
    /// Platform administrator.
    Admin,
    /// Collector/distributor of relief goods.
    Contributor,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Victim => write!(f, "victim"),
            Self::Supplier => write!(f, "supplier"),
            Self::Admin => write!(f, "admin"),
            Self::Contributor => write!(f, "contributor"),
        }
    }
}

/// The public part of an account record.
pub trait AccountProfile: Serialize + DeserializeOwned {
    /// Collection the account is stored in.
    const COLLECTION: &'static str;
    /// Role written into login tokens.
    const ROLE: Role;
    /// Message when registering with an e-mail that is already taken.
    const DUPLICATE_EMAIL: &'static str = "Email already used";
    /// Message when no account has the given e-mail.
    const UNKNOWN_EMAIL: &'static str;
    /// Message when the password does not match.
    const WRONG_PASSWORD: &'static str = "Invalid credentials";

    /// The account's public id.
    fn account_id(&self) -> &str;
    /// Login e-mail.
    fn email(&self) -> &str;
    /// Name shown to other users.
    fn display_name(&self) -> &str;

    /// Called after a successful login.
    fn on_login(&mut self, _now: DateTime<Utc>) -> bool {
        false
    }

    /// The `user` object returned from login.
    fn login_summary(&self) -> Value {
        json!({
            "id": self.account_id(),
            "name": self.display_name(),
            "role": Self::ROLE,
        })
    }
}

/// Stored account: the public profile plus the password hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account<P> {
    /// Public fields.
    #[serde(flatten)]
    pub profile: P,
    /// Argon2 PHC string.
    pub password_hash: String,
}

/// Normalized e-mail used as the unique lookup key.
#[must_use]
pub fn email_key(email: &str) -> String {
    email.trim().to_lowercase()
}

impl<P: AccountProfile> Document for Account<P> {
    const COLLECTION: &'static str = P::COLLECTION;

    fn doc_id(&self) -> &str {
        self.profile.account_id()
    }

    fn lookup_key(&self) -> Option<String> {
        Some(email_key(self.profile.email()))
    }
}

/// A registered victim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Victim {
    /// District-prefixed id such as `MAT001`.
    pub victim_id: String,
    /// Full name.
    pub full_name: String,
    /// Login e-mail.
    pub email: String,
    /// Contact number.
    pub phone: String,
    /// National identity card number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub national_id: Option<String>,
    /// Province.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub province: Option<String>,
    /// District.
    pub district: String,
    /// Free-form address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Self-reported situation, e.g. "Affected" or "Safe".
    #[serde(default = "default_victim_status")]
    pub status: String,
    /// Registration time.
    pub created_at: DateTime<Utc>,
}

fn default_victim_status() -> String {
    "Not Affected".to_string()
}

impl AccountProfile for Victim {
    const COLLECTION: &'static str = "victims";
    const ROLE: Role = Role::Victim;
    const UNKNOWN_EMAIL: &'static str = "User email not found";
    const WRONG_PASSWORD: &'static str = "Wrong password";

    fn account_id(&self) -> &str {
        &self.victim_id
    }

    fn email(&self) -> &str {
        &self.email
    }

    fn display_name(&self) -> &str {
        &self.full_name
    }

    fn login_summary(&self) -> Value {
        json!({
            "id": self.victim_id,
            "victimId": self.victim_id,
            "name": self.full_name,
            "district": self.district,
            "role": Role::Victim,
        })
    }
}

/// A member of a victim's household.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyMember {
    /// Name.
    pub name: String,
    /// Age in years.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    /// Relationship to the registered victim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship: Option<String>,
    /// Medicine or care this person needs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_needs: Option<String>,
}

/// Household details a victim fills in after registering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VictimProfile {
    /// Owning victim.
    pub victim_id: String,
    /// Contact number.
    pub phone: String,
    /// National identity card number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub national_id: Option<String>,
    /// Street address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Household members besides the victim.
    #[serde(default)]
    pub family_members: Vec<FamilyMember>,
    /// GPS position for the map.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Coordinates>,
    /// Last change.
    pub updated_at: DateTime<Utc>,
}

impl Document for VictimProfile {
    const COLLECTION: &'static str = "victim_profiles";

    fn doc_id(&self) -> &str {
        &self.victim_id
    }
}

/// A goods supplier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Supplier {
    /// `SUP001`
    pub supplier_id: String,
    /// Login e-mail.
    pub email: String,
    /// Organization name.
    pub full_name: String,
    /// Person to contact.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_person: Option<String>,
    /// Contact number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Warehouse address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warehouse_address: Option<String>,
    /// Goods the supplier can provide.
    #[serde(default)]
    pub available_goods: Vec<String>,
    /// Registration time.
    pub created_at: DateTime<Utc>,
}

impl AccountProfile for Supplier {
    const COLLECTION: &'static str = "suppliers";
    const ROLE: Role = Role::Supplier;
    const UNKNOWN_EMAIL: &'static str = "Supplier not found";

    fn account_id(&self) -> &str {
        &self.supplier_id
    }

    fn email(&self) -> &str {
        &self.email
    }

    fn display_name(&self) -> &str {
        &self.full_name
    }
}

/// A platform administrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Admin {
    /// `ADM001`
    pub admin_id: String,
    /// Name.
    pub name: String,
    /// Login e-mail.
    pub email: String,
    /// Registration time.
    pub created_at: DateTime<Utc>,
}

impl AccountProfile for Admin {
    const COLLECTION: &'static str = "admins";
    const ROLE: Role = Role::Admin;
    const UNKNOWN_EMAIL: &'static str = "Admin not found";

    fn account_id(&self) -> &str {
        &self.admin_id
    }

    fn email(&self) -> &str {
        &self.email
    }

    fn display_name(&self) -> &str {
        &self.name
    }
}
