//! Collection points and the notifications sent when goods are handed over.

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::ids::{next_id, IdKind};
use crate::model::{
    non_blank, Account, Collection, CollectionPoint, Contributor, Coordinates, Handover,
    HandoverTarget, Notification, NotificationItem, NotificationStatus, TargetType, Victim,
};
use crate::storage::{document, Storage};

/// Body of a create-collection-point request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCollectionPoint {
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Contributor running the point.
    #[serde(default)]
    pub managed_by_contributor_id: String,
    /// Contact number.
    pub contact_phone: Option<String>,
    /// Contact e-mail.
    pub contact_email: Option<String>,
    /// Street address.
    pub address: Option<String>,
    /// District.
    #[serde(default)]
    pub district: String,
    /// GPS position.
    pub coordinates: Option<Coordinates>,
    /// Opening hours.
    pub hours: Option<String>,
    /// Free-text capacity.
    pub capacity_note: Option<String>,
    /// Free text.
    pub notes: Option<String>,
}

/// Register a collection point run by an existing contributor.
///
/// # Errors
///
/// Returns [`Error::Validation`] without a name, district or managing
/// contributor, and [`Error::NotFound`] if the contributor does not exist.
pub fn create_collection_point(
    storage: &Storage,
    request: NewCollectionPoint,
) -> Result<CollectionPoint> {
    let name = request.name.trim().to_string();
    let district = request.district.trim().to_string();
    let manager = request.managed_by_contributor_id.trim().to_string();
    if name.is_empty() || district.is_empty() || manager.is_empty() {
        return Err(Error::validation("Missing required fields"));
    }

    let point = storage.write(|tx| {
        if document::get::<Account<Contributor>>(tx, &manager)?.is_none() {
            return Err(Error::not_found("Contributor not found"));
        }
        let now = Utc::now();
        let point = CollectionPoint {
            collection_point_id: next_id(tx, IdKind::CollectionPoint)?,
            name,
            managed_by_contributor_id: manager.clone(),
            contact_phone: non_blank(request.contact_phone),
            contact_email: non_blank(request.contact_email),
            address: non_blank(request.address),
            district,
            coordinates: request.coordinates,
            hours: non_blank(request.hours),
            capacity_note: non_blank(request.capacity_note),
            notes: non_blank(request.notes),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        document::insert(tx, &point)?;
        Ok(point)
    })?;

    info!(
        collection_point_id = %point.collection_point_id,
        contributor_id = %point.managed_by_contributor_id,
        district = %point.district,
        "Created collection point"
    );
    Ok(point)
}

/// Active collection points, optionally only those in `district`
/// (case-insensitive).
///
/// # Errors
///
/// Returns a storage error.
pub fn list_collection_points(
    storage: &Storage,
    district: Option<&str>,
) -> Result<Vec<CollectionPoint>> {
    let district = district.map(str::trim).filter(|d| !d.is_empty());
    let mut points: Vec<CollectionPoint> = storage.read(document::list_all)?;
    points.retain(|p| {
        p.is_active && district.map_or(true, |d| p.district.eq_ignore_ascii_case(d))
    });
    Ok(points)
}

/// Collection points run by one contributor, active or not.
///
/// # Errors
///
/// Returns a storage error.
pub fn collection_points_for(
    storage: &Storage,
    contributor_id: &str,
) -> Result<Vec<CollectionPoint>> {
    storage.read(|conn| document::list_by_owner(conn, contributor_id))
}

/// Create the notification for a collection's handover target.
///
/// Runs inside the transaction that stores the collection.
pub(crate) fn notify_handover(
    conn: &Connection,
    handover: &Handover,
    collection: &Collection,
    contributor: Option<&Contributor>,
    now: DateTime<Utc>,
) -> Result<Notification> {
    let reference = handover.reference.trim();
    let target_name = match handover.target {
        HandoverTarget::CollectionPoint => {
            document::get::<CollectionPoint>(conn, reference)?.map(|p| p.name)
        }
        HandoverTarget::Victim => {
            document::get::<Account<Victim>>(conn, reference)?.map(|v| v.profile.full_name)
        }
    };
    let Some(target_name) = target_name else {
        return Err(Error::validation(format!(
            "Handover target {reference} not found"
        )));
    };

    let sender = contributor.map_or(collection.contributor_id.as_str(), |c| c.name.as_str());
    let mut message = format!(
        "{sender} is bringing {} item(s) to {target_name}",
        collection.items.len()
    );
    if let Some(eta) = handover.eta {
        message.push_str(&format!(", expected {}", eta.format("%Y-%m-%d %H:%M UTC")));
    }

    let notification = Notification {
        notification_id: next_id(conn, IdKind::Notification)?,
        target_type: handover.target,
        target_ref: reference.to_string(),
        title: Some("Incoming relief items".to_string()),
        message: Some(message),
        items: collection.items.iter().map(NotificationItem::from).collect(),
        contributor_id: collection.contributor_id.clone(),
        contributor_name: contributor.map(|c| c.name.clone()),
        contributor_phone: contributor.map(|c| c.phone.clone()),
        contributor_email: contributor.map(|c| c.email.clone()),
        status: NotificationStatus::Pending,
        created_at: now,
    };
    document::insert(conn, &notification)?;
    debug!(
        notification_id = %notification.notification_id,
        target = %notification.target_ref,
        "Queued handover notification"
    );
    Ok(notification)
}

/// Notifications addressed to one target, newest first.
///
/// # Errors
///
/// Returns a storage error.
pub fn notifications_for(
    storage: &Storage,
    target_type: TargetType,
    target_ref: &str,
) -> Result<Vec<Notification>> {
    let mut notifications: Vec<Notification> =
        storage.read(|conn| document::list_by_owner(conn, target_ref))?;
    notifications.retain(|n| n.target_type == target_type);
    notifications.reverse();
    Ok(notifications)
}

/// Mark a notification delivered or cancelled.
///
/// # Errors
///
/// Returns [`Error::NotFound`] for an unknown notification.
pub fn set_notification_status(
    storage: &Storage,
    notification_id: &str,
    status: NotificationStatus,
) -> Result<Notification> {
    let notification = storage.write(|tx| {
        let mut notification: Notification = document::get(tx, notification_id)?
            .ok_or_else(|| Error::not_found("Notification not found"))?;
        notification.status = status;
        document::replace(tx, &notification)?;
        Ok(notification)
    })?;
    info!(notification_id, status = ?status, "Updated notification status");
    Ok(notification)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InventoryConfig;
    use crate::ledger::{log_collection, NewCollection};
    use crate::model::{ContributorType, VerificationStatus};
    use serde_json::json;

    fn storage_with_contributor() -> Storage {
        let storage = Storage::open_in_memory().unwrap();
        let now = Utc::now();
        let account = Account {
            profile: Contributor {
                contributor_id: "CON001".to_string(),
                email: "lanka@relief.org".to_string(),
                name: "Lanka Relief".to_string(),
                phone: "0112223344".to_string(),
                contributor_type: ContributorType::Ngo,
                verification_status: VerificationStatus::Verified,
                service_areas: vec![],
                has_vehicle: true,
                vehicle_type: None,
                vehicle_capacity: None,
                has_storage: false,
                storage_address: None,
                storage_capacity: None,
                alternate_phone: None,
                available_days: vec![],
                available_hours: None,
                total_collections: 0,
                total_distributions: 0,
                registered_at: now,
                last_active: now,
            },
            password_hash: String::new(),
        };
        storage.write(|tx| document::insert(tx, &account)).unwrap();
        storage
    }

    fn point(storage: &Storage, name: &str, district: &str) -> CollectionPoint {
        create_collection_point(
            storage,
            serde_json::from_value(json!({
                "name": name,
                "managedByContributorId": "CON001",
                "district": district,
                "hours": "Daily 9am-6pm"
            }))
            .unwrap(),
        )
        .unwrap()
    }

    fn collect_to(storage: &Storage, target: &str, reference: &str) -> Result<Collection> {
        let request: NewCollection = serde_json::from_value(json!({
            "contributorId": "CON001",
            "items": [{"category": "water", "itemName": "Water", "quantity": 12, "unit": "liters"}],
            "handover": {"type": target, "ref": reference}
        }))
        .unwrap();
        log_collection(storage, InventoryConfig::default(), request)
    }

    #[test]
    fn test_create_and_filter_points() {
        let storage = storage_with_contributor();
        let first = point(&storage, "Town Hall", "Galle");
        point(&storage, "Temple", "Matara");
        assert_eq!(first.collection_point_id, "CP001");

        let galle = list_collection_points(&storage, Some("galle")).unwrap();
        assert_eq!(galle.len(), 1);
        assert_eq!(galle[0].name, "Town Hall");
        assert_eq!(list_collection_points(&storage, None).unwrap().len(), 2);
        assert_eq!(list_collection_points(&storage, Some("  ")).unwrap().len(), 2);
        assert_eq!(collection_points_for(&storage, "CON001").unwrap().len(), 2);
    }

    #[test]
    fn test_point_requires_fields_and_contributor() {
        let storage = storage_with_contributor();
        let err = create_collection_point(&storage, NewCollectionPoint::default()).unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));

        let err = create_collection_point(
            &storage,
            NewCollectionPoint {
                name: "School".to_string(),
                district: "Galle".to_string(),
                managed_by_contributor_id: "CON404".to_string(),
                ..NewCollectionPoint::default()
            },
        )
        .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_handover_to_point_creates_notification() {
        let storage = storage_with_contributor();
        point(&storage, "Town Hall", "Galle");

        collect_to(&storage, "collection-point", "CP001").unwrap();

        let notes = notifications_for(&storage, TargetType::CollectionPoint, "CP001").unwrap();
        assert_eq!(notes.len(), 1);
        let n = &notes[0];
        assert_eq!(n.notification_id, "NTF0001");
        assert_eq!(n.contributor_name.as_deref(), Some("Lanka Relief"));
        assert_eq!(n.items[0].item_name, "Water");
        assert_eq!(n.status, NotificationStatus::Pending);
        assert!(notifications_for(&storage, TargetType::Victim, "CP001")
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_handover_to_unknown_target_rolls_back() {
        let storage = storage_with_contributor();
        let err = collect_to(&storage, "collection-point", "CP999").unwrap_err();
        assert_eq!(err.to_string(), "Handover target CP999 not found");

        let collections = storage.read(|c| document::count::<Collection>(c)).unwrap();
        assert_eq!(collections, 0);
    }

    #[test]
    fn test_set_notification_status() {
        let storage = storage_with_contributor();
        point(&storage, "Town Hall", "Galle");
        collect_to(&storage, "collection-point", "CP001").unwrap();

        let n =
            set_notification_status(&storage, "NTF0001", NotificationStatus::Delivered).unwrap();
        assert_eq!(n.status, NotificationStatus::Delivered);
        assert!(set_notification_status(&storage, "NTF0404", NotificationStatus::Cancelled)
            .unwrap_err()
            .is_not_found());
    }
}
