//! Victim need requests: create/merge, look up, triage list, respond.

use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::model::needs::{NeedItemsPatch, SpecialConditionsPatch};
use crate::model::{non_blank, NeedItems, NeedStatus, SpecialConditions, Urgency, VictimNeeds};
use crate::storage::{document, Storage};
use crate::urgency::classify;

/// Body of a create-or-update request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NeedsRequest {
    /// Requesting victim.
    #[serde(default)]
    pub victim_id: String,
    /// Item flags to set or clear.
    #[serde(default)]
    pub items: NeedItemsPatch,
    /// Condition flags to set or clear.
    #[serde(default)]
    pub special_conditions: SpecialConditionsPatch,
    /// Replaces the description when present.
    pub description: Option<String>,
    /// Replaces the emergency flag when present.
    pub is_emergency: Option<bool>,
    /// Replaces the emergency reason when present.
    pub emergency_reason: Option<String>,
}

/// Result of [`upsert`].
#[derive(Debug, Clone)]
pub struct Upserted {
    /// The stored record.
    pub needs: VictimNeeds,
    /// `true` if no record existed before.
    pub created: bool,
}

/// Create the victim's need record, or merge into the existing one.
///
/// Only the flags present in the request change; urgency is recomputed from
/// the merged flags.
///
/// # Errors
///
/// Returns [`Error::Validation`] without a `victimId`, or a storage error.
pub fn upsert(storage: &Storage, request: NeedsRequest) -> Result<Upserted> {
    let victim_id = request.victim_id.trim().to_string();
    if victim_id.is_empty() {
        return Err(Error::validation("victimId is required"));
    }

    let upserted = storage.write(|tx| {
        let now = Utc::now();
        let existing: Option<VictimNeeds> = document::get(tx, &victim_id)?;
        let created = existing.is_none();
        let mut needs = existing.unwrap_or_else(|| VictimNeeds {
            victim_id: victim_id.clone(),
            items: NeedItems::default(),
            special_conditions: SpecialConditions::default(),
            description: None,
            urgency: Urgency::default(),
            status: NeedStatus::default(),
            responded_by: None,
            response_date: None,
            response_notes: None,
            is_emergency: false,
            emergency_reason: None,
            request_date: now,
            last_updated: now,
        });

        request.items.apply_to(&mut needs.items);
        request.special_conditions.apply_to(&mut needs.special_conditions);
        if request.description.is_some() {
            needs.description = non_blank(request.description);
        }
        if let Some(flag) = request.is_emergency {
            needs.is_emergency = flag;
        }
        if request.emergency_reason.is_some() {
            needs.emergency_reason = non_blank(request.emergency_reason);
        }
        needs.urgency = classify(&needs.items, &needs.special_conditions);
        needs.last_updated = now;

        if created {
            document::insert(tx, &needs)?;
        } else {
            document::replace(tx, &needs)?;
        }
        Ok(Upserted { needs, created })
    })?;

    info!(
        victim_id = %upserted.needs.victim_id,
        urgency = ?upserted.needs.urgency,
        created = upserted.created,
        "Recorded victim needs"
    );
    Ok(upserted)
}

/// The need record of one victim.
///
/// # Errors
///
/// Returns [`Error::NotFound`] if the victim has not submitted needs.
pub fn get(storage: &Storage, victim_id: &str) -> Result<VictimNeeds> {
    debug!(victim_id, "Fetching victim needs");
    storage
        .read(|conn| document::get(conn, victim_id))?
        .ok_or_else(|| Error::not_found("No needs found for this victim"))
}

/// Filters for [`list`].
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct NeedsFilter {
    /// Only this tier.
    pub urgency: Option<Urgency>,
    /// Only this status.
    pub status: Option<NeedStatus>,
}

/// Need records in triage order: critical, high, moderate, then oldest
/// request first within a tier.
///
/// # Errors
///
/// Returns a storage error.
pub fn list(storage: &Storage, filter: NeedsFilter) -> Result<Vec<VictimNeeds>> {
    let mut all: Vec<VictimNeeds> = storage.read(document::list_all)?;
    all.retain(|n| {
        filter.urgency.map_or(true, |u| n.urgency == u)
            && filter.status.map_or(true, |s| n.status == s)
    });
    all.sort_by(|a, b| {
        a.urgency
            .cmp(&b.urgency)
            .then_with(|| a.request_date.cmp(&b.request_date))
    });
    Ok(all)
}

/// Body of a response to a need request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NeedsResponse {
    /// New status.
    pub status: NeedStatus,
    /// Admin or contributor id.
    pub responded_by: Option<String>,
    /// Free text.
    pub response_notes: Option<String>,
}

/// Record a response and stamp the response date.
///
/// # Errors
///
/// Returns [`Error::NotFound`] if the victim has not submitted needs.
pub fn respond(storage: &Storage, victim_id: &str, response: NeedsResponse) -> Result<VictimNeeds> {
    let needs = storage.write(|tx| {
        let mut needs: VictimNeeds = document::get(tx, victim_id)?
            .ok_or_else(|| Error::not_found("No needs found for this victim"))?;
        let now = Utc::now();
        needs.status = response.status;
        if let Some(by) = non_blank(response.responded_by) {
            needs.responded_by = Some(by);
        }
        if let Some(notes) = non_blank(response.response_notes) {
            needs.response_notes = Some(notes);
        }
        needs.response_date = Some(now);
        needs.last_updated = now;
        document::replace(tx, &needs)?;
        Ok(needs)
    })?;

    info!(victim_id, status = ?needs.status, "Responded to victim needs");
    Ok(needs)
}
