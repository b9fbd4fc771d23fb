//! Registration, login and profile management for every account kind.
//!
//! Registration and login are generic over [`AccountProfile`]; each account
//! kind only supplies its request type and the messages it reports.

use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::auth::{hash_password, issue_token, verify_password};
use crate::config::AuthConfig;
use crate::error::{Error, Result};
use crate::ids::{next_id, next_victim_id, IdKind};
use crate::model::contributor::ContributorUpdate;
use crate::model::{
    account::email_key, non_blank, Account, AccountProfile, Admin, Contributor, ContributorType,
    Coordinates, FamilyMember, ServiceArea, Supplier, VerificationStatus, Victim, VictimProfile,
};
use crate::storage::{document, Storage};

const MISSING_FIELDS: &str = "Missing required fields";
const SEARCH_LIMIT: usize = 20;

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid")
    })
}

/// Check that `email` looks like an address.
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    email_pattern().is_match(email.trim())
}

/// A registration request for one account kind.
pub trait Registration {
    /// The profile this request creates.
    type Profile: AccountProfile;

    /// Login e-mail as submitted.
    fn email(&self) -> &str;

    /// Plain-text password as submitted.
    fn password(&self) -> &str;

    /// Whether every field the account kind needs is present.
    fn has_required_fields(&self) -> bool;

    /// Build the profile. Runs inside the registering transaction so IDs can
    /// be allocated.
    ///
    /// # Errors
    ///
    /// Returns a storage error if an ID cannot be allocated.
    fn into_profile(
        self,
        conn: &Connection,
        email: String,
        now: DateTime<Utc>,
    ) -> Result<Self::Profile>;
}

/// Create an account.
///
/// # Errors
///
/// Returns [`Error::Validation`] for missing fields or a malformed e-mail,
/// and [`Error::Conflict`] when the e-mail is already registered for this
/// account kind.
pub fn register<R: Registration>(storage: &Storage, request: R) -> Result<R::Profile> {
    if !request.has_required_fields() || request.password().is_empty() {
        return Err(Error::validation(MISSING_FIELDS));
    }
    let email = request.email().trim().to_string();
    if !is_valid_email(&email) {
        return Err(Error::validation("Invalid email address"));
    }
    let password_hash = hash_password(request.password())?;

    let profile = storage.write(|tx| {
        let taken = document::find_by_lookup::<Account<R::Profile>>(tx, &email_key(&email))?;
        if taken.is_some() {
            return Err(Error::conflict(R::Profile::DUPLICATE_EMAIL));
        }
        let account = Account {
            profile: request.into_profile(tx, email, Utc::now())?,
            password_hash,
        };
        document::insert(tx, &account)?;
        Ok(account.profile)
    })?;

    info!(
        role = %R::Profile::ROLE,
        account_id = profile.account_id(),
        "Registered account"
    );
    Ok(profile)
}

/// Body of every login request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    /// Login e-mail.
    #[serde(default)]
    pub email: String,
    /// Plain-text password.
    #[serde(default)]
    pub password: String,
}

/// What a successful login returns.
#[derive(Debug, Clone, Serialize)]
pub struct LoginOutcome {
    /// Signed bearer token.
    pub token: String,
    /// Public summary of the account.
    pub user: Value,
}

/// Check credentials and issue a token.
///
/// # Errors
///
/// Returns [`Error::InvalidCredentials`] with the account kind's message for
/// an unknown e-mail or a wrong password.
pub fn login<P: AccountProfile>(
    storage: &Storage,
    auth: &AuthConfig,
    request: LoginRequest,
) -> Result<LoginOutcome> {
    let key = email_key(&request.email);
    if key.is_empty() || request.password.is_empty() {
        return Err(Error::validation(MISSING_FIELDS));
    }

    let account: Account<P> = storage
        .read(|conn| document::find_by_lookup(conn, &key))?
        .ok_or_else(|| Error::invalid_credentials(P::UNKNOWN_EMAIL))?;
    if !verify_password(&request.password, &account.password_hash)? {
        debug!(role = %P::ROLE, account_id = account.profile.account_id(), "Wrong password");
        return Err(Error::invalid_credentials(P::WRONG_PASSWORD));
    }

    let mut profile = account.profile;
    let id = profile.account_id().to_string();
    let now = Utc::now();
    if profile.on_login(now) {
        // Re-read so a concurrent profile edit is not overwritten.
        storage.write(|tx| {
            if let Some(mut fresh) = document::get::<Account<P>>(tx, &id)? {
                fresh.profile.on_login(now);
                document::replace(tx, &fresh)?;
            }
            Ok(())
        })?;
    }

    let token = issue_token(&id, P::ROLE, auth)?;
    info!(role = %P::ROLE, account_id = %id, "Logged in");
    Ok(LoginOutcome {
        token,
        user: profile.login_summary(),
    })
}

/// Body of a victim registration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VictimRegistration {
    /// Full name.
    #[serde(default, alias = "fullName")]
    pub name: String,
    /// Login e-mail.
    #[serde(default)]
    pub email: String,
    /// Plain-text password.
    #[serde(default)]
    pub password: String,
    /// Contact number.
    #[serde(default)]
    pub phone: String,
    /// District; also picks the id prefix.
    #[serde(default)]
    pub district: String,
    /// National identity card number.
    pub national_id: Option<String>,
    /// Province.
    pub province: Option<String>,
    /// Home address.
    pub address: Option<String>,
}

impl Registration for VictimRegistration {
    type Profile = Victim;

    fn email(&self) -> &str {
        &self.email
    }

    fn password(&self) -> &str {
        &self.password
    }

    fn has_required_fields(&self) -> bool {
        [&self.name, &self.email, &self.phone, &self.district]
            .iter()
            .all(|f| !f.trim().is_empty())
    }

    fn into_profile(self, conn: &Connection, email: String, now: DateTime<Utc>) -> Result<Victim> {
        let district = self.district.trim().to_string();
        Ok(Victim {
            victim_id: next_victim_id(conn, &district)?,
            full_name: self.name.trim().to_string(),
            email,
            phone: self.phone.trim().to_string(),
            national_id: non_blank(self.national_id),
            province: non_blank(self.province),
            district,
            address: non_blank(self.address),
            status: "Not Affected".to_string(),
            created_at: now,
        })
    }
}

/// Body of a supplier registration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplierRegistration {
    /// Trading name.
    #[serde(default, alias = "fullName")]
    pub organization_name: String,
    /// Login e-mail.
    #[serde(default)]
    pub email: String,
    /// Plain-text password.
    #[serde(default)]
    pub password: String,
    /// Person to ask for.
    pub contact_person: Option<String>,
    /// Contact number.
    pub phone: Option<String>,
    /// Where the stock is held.
    pub warehouse_address: Option<String>,
    /// Goods on offer.
    #[serde(default)]
    pub available_goods: Vec<String>,
}

impl Registration for SupplierRegistration {
    type Profile = Supplier;

    fn email(&self) -> &str {
        &self.email
    }

    fn password(&self) -> &str {
        &self.password
    }

    fn has_required_fields(&self) -> bool {
        !self.organization_name.trim().is_empty() && !self.email.trim().is_empty()
    }

    fn into_profile(
        self,
        conn: &Connection,
        email: String,
        now: DateTime<Utc>,
    ) -> Result<Supplier> {
        Ok(Supplier {
            supplier_id: next_id(conn, IdKind::Supplier)?,
            email,
            full_name: self.organization_name.trim().to_string(),
            contact_person: non_blank(self.contact_person),
            phone: non_blank(self.phone),
            warehouse_address: non_blank(self.warehouse_address),
            available_goods: self.available_goods,
            created_at: now,
        })
    }
}

/// Body of an admin registration.
///
/// The first admin may register freely. After that only an existing admin
/// can add another, which the HTTP layer records in `invited_by_admin`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminRegistration {
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Login e-mail.
    #[serde(default)]
    pub email: String,
    /// Plain-text password.
    #[serde(default)]
    pub password: String,
    /// Set when the caller holds an admin token. Never read from the body.
    #[serde(skip)]
    pub invited_by_admin: bool,
}

impl Registration for AdminRegistration {
    type Profile = Admin;

    fn email(&self) -> &str {
        &self.email
    }

    fn password(&self) -> &str {
        &self.password
    }

    fn has_required_fields(&self) -> bool {
        !self.name.trim().is_empty() && !self.email.trim().is_empty()
    }

    fn into_profile(self, conn: &Connection, email: String, now: DateTime<Utc>) -> Result<Admin> {
        if !self.invited_by_admin && document::count::<Account<Admin>>(conn)? > 0 {
            return Err(Error::unauthorized("Only admin accounts may register another admin"));
        }
        Ok(Admin {
            admin_id: next_id(conn, IdKind::Admin)?,
            name: self.name.trim().to_string(),
            email,
            created_at: now,
        })
    }
}

/// Body of a contributor registration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributorRegistration {
    /// Person or organization name.
    #[serde(default)]
    pub name: String,
    /// Login e-mail.
    #[serde(default)]
    pub email: String,
    /// Plain-text password.
    #[serde(default)]
    pub password: String,
    /// Contact number.
    #[serde(default)]
    pub phone: String,
    /// Kind of contributor.
    #[serde(default)]
    pub contributor_type: ContributorType,
    /// Districts served.
    #[serde(default)]
    pub service_areas: Vec<ServiceArea>,
    /// Owns a vehicle for deliveries.
    #[serde(default)]
    pub has_vehicle: bool,
    /// e.g. "lorry".
    pub vehicle_type: Option<String>,
    /// Free-text load capacity.
    pub vehicle_capacity: Option<String>,
    /// Has somewhere to keep goods.
    #[serde(default)]
    pub has_storage: bool,
    /// Where the goods are kept.
    pub storage_address: Option<String>,
    /// Free-text storage size.
    pub storage_capacity: Option<String>,
    /// Second contact number.
    pub alternate_phone: Option<String>,
    /// Days the contributor can help.
    #[serde(default)]
    pub available_days: Vec<String>,
    /// Hours the contributor can help.
    pub available_hours: Option<String>,
}

impl Registration for ContributorRegistration {
    type Profile = Contributor;

    fn email(&self) -> &str {
        &self.email
    }

    fn password(&self) -> &str {
        &self.password
    }

    fn has_required_fields(&self) -> bool {
        [&self.name, &self.email, &self.phone]
            .iter()
            .all(|f| !f.trim().is_empty())
    }

    fn into_profile(
        self,
        conn: &Connection,
        email: String,
        now: DateTime<Utc>,
    ) -> Result<Contributor> {
        Ok(Contributor {
            contributor_id: next_id(conn, IdKind::Contributor)?,
            email,
            name: self.name.trim().to_string(),
            phone: self.phone.trim().to_string(),
            contributor_type: self.contributor_type,
            verification_status: VerificationStatus::Pending,
            service_areas: self.service_areas,
            has_vehicle: self.has_vehicle,
            vehicle_type: non_blank(self.vehicle_type),
            vehicle_capacity: non_blank(self.vehicle_capacity),
            has_storage: self.has_storage,
            storage_address: non_blank(self.storage_address),
            storage_capacity: non_blank(self.storage_capacity),
            alternate_phone: non_blank(self.alternate_phone),
            available_days: self.available_days,
            available_hours: non_blank(self.available_hours),
            total_collections: 0,
            total_distributions: 0,
            registered_at: now,
            last_active: now,
        })
    }
}

/// Query of a victim search.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VictimSearch {
    /// Matched case-insensitively against name, e-mail and victim id.
    pub query: Option<String>,
    /// Exact district, case-insensitive.
    pub district: Option<String>,
}

/// One search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VictimMatch {
    /// Victim id.
    pub victim_id: String,
    /// Registered name.
    pub full_name: String,
    /// Login e-mail.
    pub email: String,
    /// Registered district.
    pub district: String,
}

/// Find victims, at most twenty, in registration order.
///
/// # Errors
///
/// Returns a storage error.
pub fn search_victims(storage: &Storage, search: VictimSearch) -> Result<Vec<VictimMatch>> {
    let query = non_blank(search.query).map(|q| q.to_lowercase());
    let district = non_blank(search.district);
    debug!(query = ?query, district = ?district, "Searching victims");

    let victims: Vec<Account<Victim>> = storage.read(document::list_all)?;
    Ok(victims
        .into_iter()
        .map(|a| a.profile)
        .filter(|v| {
            district
                .as_deref()
                .map_or(true, |d| v.district.eq_ignore_ascii_case(d))
        })
        .filter(|v| {
            query.as_deref().map_or(true, |q| {
                v.full_name.to_lowercase().contains(q)
                    || v.email.to_lowercase().contains(q)
                    || v.victim_id.to_lowercase().contains(q)
            })
        })
        .take(SEARCH_LIMIT)
        .map(|v| VictimMatch {
            victim_id: v.victim_id,
            full_name: v.full_name,
            email: v.email,
            district: v.district,
        })
        .collect())
}

fn find_victim(conn: &Connection, victim_id: &str) -> Result<Victim> {
    document::get::<Account<Victim>>(conn, victim_id)?
        .map(|a| a.profile)
        .ok_or_else(|| Error::not_found("Victim not found"))
}

fn blank_profile(victim: &Victim, now: DateTime<Utc>) -> VictimProfile {
    VictimProfile {
        victim_id: victim.victim_id.clone(),
        phone: victim.phone.clone(),
        national_id: victim.national_id.clone(),
        address: victim.address.clone(),
        family_members: Vec::new(),
        location: None,
        updated_at: now,
    }
}

/// A victim's household profile. Victims who never saved one get a profile
/// filled from their registration.
///
/// # Errors
///
/// Returns [`Error::NotFound`] for an unknown victim.
pub fn victim_profile(storage: &Storage, victim_id: &str) -> Result<VictimProfile> {
    storage.read(|conn| {
        let victim = find_victim(conn, victim_id)?;
        Ok(document::get(conn, victim_id)?
            .unwrap_or_else(|| blank_profile(&victim, victim.created_at)))
    })
}

/// Fields of a victim profile update. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VictimProfileUpdate {
    /// Contact number.
    pub phone: Option<String>,
    /// National identity card number.
    pub national_id: Option<String>,
    /// Current address.
    pub address: Option<String>,
    /// Replaces the whole household list.
    pub family_members: Option<Vec<FamilyMember>>,
    /// GPS position for the map.
    pub location: Option<Coordinates>,
}

/// Create or update a victim's household profile.
///
/// # Errors
///
/// Returns [`Error::NotFound`] for an unknown victim.
pub fn update_victim_profile(
    storage: &Storage,
    victim_id: &str,
    update: VictimProfileUpdate,
) -> Result<VictimProfile> {
    let profile = storage.write(|tx| {
        let victim = find_victim(tx, victim_id)?;
        let now = Utc::now();
        let existing: Option<VictimProfile> = document::get(tx, victim_id)?;
        let created = existing.is_none();
        let mut profile = existing.unwrap_or_else(|| blank_profile(&victim, now));

        if let Some(phone) = non_blank(update.phone) {
            profile.phone = phone;
        }
        if update.national_id.is_some() {
            profile.national_id = non_blank(update.national_id);
        }
        if update.address.is_some() {
            profile.address = non_blank(update.address);
        }
        if let Some(members) = update.family_members {
            profile.family_members = members;
        }
        if update.location.is_some() {
            profile.location = update.location;
        }
        profile.updated_at = now;

        if created {
            document::insert(tx, &profile)?;
        } else {
            document::replace(tx, &profile)?;
        }
        Ok(profile)
    })?;

    info!(
        victim_id,
        family_members = profile.family_members.len(),
        "Updated victim profile"
    );
    Ok(profile)
}

/// A contributor's public profile.
///
/// # Errors
///
/// Returns [`Error::NotFound`] for an unknown contributor.
pub fn contributor_profile(storage: &Storage, contributor_id: &str) -> Result<Contributor> {
    storage
        .read(|conn| document::get::<Account<Contributor>>(conn, contributor_id))?
        .map(|a| a.profile)
        .ok_or_else(|| Error::not_found("Contributor not found"))
}

/// Apply a self-service profile edit.
///
/// # Errors
///
/// Returns [`Error::NotFound`] for an unknown contributor.
pub fn update_contributor_profile(
    storage: &Storage,
    contributor_id: &str,
    update: ContributorUpdate,
) -> Result<Contributor> {
    let contributor = storage.write(|tx| {
        let mut account: Account<Contributor> = document::get(tx, contributor_id)?
            .ok_or_else(|| Error::not_found("Contributor not found"))?;
        update.apply(&mut account.profile, Utc::now());
        document::replace(tx, &account)?;
        Ok(account.profile)
    })?;
    info!(contributor_id, "Updated contributor profile");
    Ok(contributor)
}

/// Record an admin's verification decision.
///
/// # Errors
///
/// Returns [`Error::NotFound`] for an unknown contributor.
pub fn set_verification(
    storage: &Storage,
    contributor_id: &str,
    status: VerificationStatus,
) -> Result<Contributor> {
    let contributor = storage.write(|tx| {
        let mut account: Account<Contributor> = document::get(tx, contributor_id)?
            .ok_or_else(|| Error::not_found("Contributor not found"))?;
        account.profile.verification_status = status;
        document::replace(tx, &account)?;
        Ok(account.profile)
    })?;
    info!(contributor_id, status = ?status, "Changed contributor verification");
    Ok(contributor)
}
