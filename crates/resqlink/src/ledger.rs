//! The inventory ledger.
//!
//! Collections add to a contributor's inventory lines, distributions take
//! from them. Every mutation runs in one store transaction: a distribution
//! that fails on its third line leaves the first two untouched, and two
//! distributions against the same line cannot both pass the stock check.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::InventoryConfig;
use crate::error::{Error, Result};
use crate::ids::{next_id, IdKind};
use crate::model::ledger::line_key;
use crate::model::{
    non_blank, Account, CollectedItem, Collection, CollectionStatus, Contributor, DeliveryMethod,
    DistributedItem, Distribution, DistributionStatus, Handover, HandoverTarget, InventoryLine,
    ItemCondition, Place, RecipientType,
};
use crate::outreach;
use crate::storage::{document, Storage};

/// Body of a log-collection request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCollection {
    /// Contributor logging the goods.
    #[serde(default)]
    pub contributor_id: String,
    /// What came in; at least one line.
    #[serde(default)]
    pub items: Vec<CollectedItem>,
    /// Defaults to now.
    #[serde(default, deserialize_with = "crate::model::time::optional")]
    pub collection_date: Option<DateTime<Utc>>,
    /// Where the goods were picked up.
    pub collection_location: Option<Place>,
    /// Donor, unless anonymous.
    pub donor_name: Option<String>,
    /// Donor contact number.
    pub donor_phone: Option<String>,
    /// Donor e-mail.
    pub donor_email: Option<String>,
    /// Donor asked not to be named.
    #[serde(default)]
    pub is_anonymous: bool,
    /// Photo URLs.
    #[serde(default)]
    pub photos: Vec<String>,
    /// Free text.
    pub notes: Option<String>,
    /// Collection point or victim the goods are headed to.
    pub handover: Option<Handover>,
    /// Flat form of `handover`, as posted by the dashboard form.
    pub handover_type: Option<HandoverTarget>,
    /// Target id for `handover_type`.
    pub handover_ref: Option<String>,
    /// Expected arrival for the flat form.
    #[serde(default, deserialize_with = "crate::model::time::optional")]
    pub handover_eta: Option<DateTime<Utc>>,
}

impl NewCollection {
    /// The handover target, from either the nested or the flat fields.
    /// A flat type without a reference means no handover.
    fn take_handover(&mut self) -> Option<Handover> {
        let flat_ref = non_blank(self.handover_ref.take());
        self.handover
            .take()
            .filter(|h| !h.reference.trim().is_empty())
            .or_else(|| {
                Some(Handover {
                    target: self.handover_type?,
                    reference: flat_ref?,
                    eta: self.handover_eta,
                })
            })
    }
}

/// Body of a log-distribution request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDistribution {
    /// Contributor handing the goods out.
    #[serde(default)]
    pub contributor_id: String,
    /// Inventory lines drawn from; at least one.
    #[serde(default)]
    pub items: Vec<DistributedItem>,
    /// Who received the goods.
    #[serde(default)]
    pub recipient_type: RecipientType,
    /// Victim id when the recipient is registered.
    pub recipient_id: Option<String>,
    /// Recipient name.
    pub recipient_name: Option<String>,
    /// Recipient contact number.
    pub recipient_phone: Option<String>,
    /// Recipient address.
    pub recipient_address: Option<String>,
    /// Where the goods were delivered.
    pub recipient_location: Option<Place>,
    /// Defaults to now.
    #[serde(default, deserialize_with = "crate::model::time::optional")]
    pub distribution_date: Option<DateTime<Utc>>,
    /// How the goods got there.
    #[serde(default)]
    pub delivery_method: DeliveryMethod,
    /// Photo or document URLs.
    #[serde(default)]
    pub delivery_proof: Vec<String>,
    /// Signature image URL.
    pub recipient_signature: Option<String>,
    /// Households reached.
    pub families_benefited: Option<u32>,
    /// People reached.
    pub individuals_benefited: Option<u32>,
    /// Need record this answers.
    pub fulfilled_need_id: Option<String>,
    /// Free text.
    pub notes: Option<String>,
}

/// Manual correction of an inventory line. Absent fields are unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryAdjustment {
    /// Counted stock; not negative.
    pub current_quantity: Option<f64>,
    /// Low-stock threshold; not negative.
    pub minimum_threshold: Option<f64>,
    /// State of the goods.
    pub condition: Option<ItemCondition>,
    /// Best-before date.
    #[serde(default, deserialize_with = "crate::model::time::optional")]
    pub expiry_date: Option<DateTime<Utc>>,
    /// Shelf or room.
    pub storage_location: Option<String>,
}

/// Status change of a distribution.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionUpdate {
    /// New delivery state.
    pub status: Option<DistributionStatus>,
    /// Recipient confirmed receipt.
    pub recipient_confirmation: Option<bool>,
}

/// Alert counts over a set of inventory lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryAlerts {
    /// Lines below their threshold.
    pub low_stock: usize,
    /// Lines expiring inside the window.
    pub expiring_soon: usize,
}

impl InventoryAlerts {
    /// Count the flags set on `lines`.
    #[must_use]
    pub fn count(lines: &[InventoryLine]) -> Self {
        Self {
            low_stock: lines.iter().filter(|l| l.is_low_stock).count(),
            expiring_soon: lines.iter().filter(|l| l.is_expiring_soon).count(),
        }
    }
}

/// A contributor's inventory with totals.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryView {
    /// Lines sorted by category, then item name.
    pub inventory: Vec<InventoryLine>,
    /// Number of lines.
    pub count: usize,
    /// Quantity on hand per category.
    pub summary: BTreeMap<String, f64>,
    /// Alert counts.
    pub alerts: InventoryAlerts,
}

fn require_contributor_id(raw: &str) -> Result<String> {
    let id = raw.trim();
    if id.is_empty() {
        return Err(Error::validation("Missing required fields"));
    }
    Ok(id.to_string())
}

fn require_positive(what: &str, quantity: f64) -> Result<()> {
    if quantity.is_finite() && quantity > 0.0 {
        Ok(())
    } else {
        Err(Error::validation(format!(
            "Quantity for {what} must be greater than zero"
        )))
    }
}

fn require_non_negative(field: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(Error::validation(format!("{field} cannot be negative")))
    }
}

fn validate_collection(request: &mut NewCollection) -> Result<String> {
    let contributor_id = require_contributor_id(&request.contributor_id)?;
    if request.items.is_empty() {
        return Err(Error::validation("Missing required fields"));
    }
    for item in &mut request.items {
        item.item_name = item.item_name.trim().to_string();
        if item.item_name.is_empty() {
            return Err(Error::validation("Every item needs an itemName"));
        }
        require_positive(&item.item_name, item.quantity)?;
        if item.condition == ItemCondition::Expired {
            return Err(Error::validation(format!(
                "{} cannot be collected as expired",
                item.item_name
            )));
        }
    }
    Ok(contributor_id)
}

/// Stamp activity on the contributor, if it exists, and bump one counter.
fn touch_contributor(
    conn: &Connection,
    contributor_id: &str,
    now: DateTime<Utc>,
    bump: impl FnOnce(&mut Contributor),
) -> Result<Option<Contributor>> {
    let Some(mut account) = document::get::<Account<Contributor>>(conn, contributor_id)? else {
        return Ok(None);
    };
    bump(&mut account.profile);
    account.profile.last_active = now;
    document::replace(conn, &account)?;
    Ok(Some(account.profile))
}

fn restock(
    conn: &Connection,
    config: InventoryConfig,
    contributor_id: &str,
    collection_id: &str,
    item: &CollectedItem,
    now: DateTime<Utc>,
) -> Result<InventoryLine> {
    let key = line_key(contributor_id, &item.item_name);
    let line = if let Some(mut line) = document::find_by_lookup::<InventoryLine>(conn, &key)? {
        line.current_quantity += item.quantity;
        line.source_collection_ids.push(collection_id.to_string());
        line.expiry_date = match (line.expiry_date, item.expiry_date) {
            (Some(held), Some(incoming)) => Some(held.min(incoming)),
            (held, incoming) => held.or(incoming),
        };
        line.last_restocked = now;
        line.updated_at = now;
        line.refresh_alerts(now, config.expiring_soon_window());
        document::replace(conn, &line)?;
        debug!(
            inventory_id = %line.inventory_id,
            quantity = line.current_quantity,
            "Restocked inventory line"
        );
        line
    } else {
        let mut line = InventoryLine {
            inventory_id: next_id(conn, IdKind::Inventory)?,
            contributor_id: contributor_id.to_string(),
            category: item.category,
            item_name: item.item_name.clone(),
            current_quantity: item.quantity,
            unit: item.unit.clone(),
            minimum_threshold: f64::from(config.default_minimum_threshold),
            storage_location: None,
            shelf_life: None,
            expiry_date: item.expiry_date,
            condition: item.condition,
            source_collection_ids: vec![collection_id.to_string()],
            is_low_stock: false,
            is_expiring_soon: false,
            last_restocked: now,
            updated_at: now,
        };
        line.refresh_alerts(now, config.expiring_soon_window());
        document::insert(conn, &line)?;
        debug!(inventory_id = %line.inventory_id, item = %line.item_name, "Opened inventory line");
        line
    };
    Ok(line)
}

/// Record a collection and add its items to the contributor's inventory.
///
/// # Errors
///
/// Returns [`Error::Validation`] for a missing contributor id, no items, a
/// blank item name, a non-positive quantity or an unknown handover target.
pub fn log_collection(
    storage: &Storage,
    config: InventoryConfig,
    mut request: NewCollection,
) -> Result<Collection> {
    let contributor_id = validate_collection(&mut request)?;
    let handover = request.take_handover();

    let collection = storage.write(|tx| {
        let now = Utc::now();
        let collection = Collection {
            collection_id: next_id(tx, IdKind::Collection)?,
            contributor_id: contributor_id.clone(),
            items: request.items,
            collection_date: request.collection_date.unwrap_or(now),
            collection_location: request.collection_location,
            donor_name: non_blank(request.donor_name),
            donor_phone: non_blank(request.donor_phone),
            donor_email: non_blank(request.donor_email),
            is_anonymous: request.is_anonymous,
            status: CollectionStatus::default(),
            photos: request.photos,
            notes: non_blank(request.notes),
            handover,
            created_at: now,
            updated_at: now,
        };
        document::insert(tx, &collection)?;

        let contributor = touch_contributor(tx, &contributor_id, now, |c| {
            c.total_collections += 1;
        })?;

        for item in &collection.items {
            restock(tx, config, &contributor_id, &collection.collection_id, item, now)?;
        }

        if let Some(handover) = &collection.handover {
            outreach::notify_handover(tx, handover, &collection, contributor.as_ref(), now)?;
        }

        Ok(collection)
    })?;

    info!(
        collection_id = %collection.collection_id,
        contributor_id = %collection.contributor_id,
        items = collection.items.len(),
        "Logged collection"
    );
    Ok(collection)
}

/// Record a distribution and deduct its items from inventory.
///
/// All lines are checked and deducted in one transaction; any failure leaves
/// every line unchanged.
///
/// # Errors
///
/// Returns [`Error::Validation`] for a missing contributor id, no items, a
/// non-positive quantity, an unknown inventory id or a line held by another
/// contributor, and [`Error::InsufficientStock`] when a line holds less than
/// requested.
pub fn log_distribution(
    storage: &Storage,
    config: InventoryConfig,
    request: NewDistribution,
) -> Result<Distribution> {
    let contributor_id = require_contributor_id(&request.contributor_id)?;
    if request.items.is_empty() {
        return Err(Error::validation("Missing required fields"));
    }
    for item in &request.items {
        require_positive(&item.inventory_id, item.quantity_distributed)?;
    }

    let distribution = storage.write(|tx| {
        let now = Utc::now();
        let distribution_id = next_id(tx, IdKind::Distribution)?;

        let mut items = request.items;
        for item in &mut items {
            let mut line: InventoryLine = document::get(tx, item.inventory_id.trim())?
                .ok_or_else(|| {
                    Error::validation(format!("Inventory item {} not found", item.inventory_id))
                })?;
            if line.contributor_id != contributor_id {
                return Err(Error::validation(format!(
                    "Inventory item {} does not belong to contributor {contributor_id}",
                    item.inventory_id
                )));
            }
            if line.current_quantity < item.quantity_distributed {
                return Err(Error::InsufficientStock {
                    item: line.item_name,
                    available: line.current_quantity,
                    requested: item.quantity_distributed,
                });
            }

            line.current_quantity -= item.quantity_distributed;
            line.updated_at = now;
            line.refresh_alerts(now, config.expiring_soon_window());
            document::replace(tx, &line)?;

            item.inventory_id.clone_from(&line.inventory_id);
            item.item_name.get_or_insert_with(|| line.item_name.clone());
            item.category.get_or_insert(line.category);
            if item.unit.as_deref().map_or(true, str::is_empty) {
                item.unit = Some(line.unit.clone());
            }
        }

        let distribution = Distribution {
            distribution_id,
            contributor_id: contributor_id.clone(),
            items,
            recipient_type: request.recipient_type,
            recipient_id: non_blank(request.recipient_id),
            recipient_name: non_blank(request.recipient_name),
            recipient_phone: non_blank(request.recipient_phone),
            recipient_address: non_blank(request.recipient_address),
            recipient_location: request.recipient_location,
            distribution_date: request.distribution_date.unwrap_or(now),
            delivery_method: request.delivery_method,
            delivery_proof: request.delivery_proof,
            recipient_signature: non_blank(request.recipient_signature),
            recipient_confirmation: false,
            families_benefited: request.families_benefited,
            individuals_benefited: request.individuals_benefited,
            fulfilled_need_id: non_blank(request.fulfilled_need_id),
            notes: non_blank(request.notes),
            status: DistributionStatus::default(),
            created_at: now,
            updated_at: now,
        };
        document::insert(tx, &distribution)?;

        touch_contributor(tx, &contributor_id, now, |c| {
            c.total_distributions += 1;
        })?;

        Ok(distribution)
    })?;

    info!(
        distribution_id = %distribution.distribution_id,
        contributor_id = %distribution.contributor_id,
        quantity = distribution.total_quantity(),
        "Logged distribution"
    );
    Ok(distribution)
}

/// Manually correct an inventory line.
///
/// # Errors
///
/// Returns [`Error::Validation`] for a negative quantity or threshold and
/// [`Error::NotFound`] for an unknown line.
pub fn adjust_inventory(
    storage: &Storage,
    config: InventoryConfig,
    inventory_id: &str,
    adjustment: InventoryAdjustment,
) -> Result<InventoryLine> {
    if let Some(q) = adjustment.current_quantity {
        require_non_negative("currentQuantity", q)?;
    }
    if let Some(t) = adjustment.minimum_threshold {
        require_non_negative("minimumThreshold", t)?;
    }

    let line = storage.write(|tx| {
        let mut line: InventoryLine = document::get(tx, inventory_id)?
            .ok_or_else(|| Error::not_found("Inventory item not found"))?;
        let now = Utc::now();

        if let Some(q) = adjustment.current_quantity {
            line.current_quantity = q;
        }
        if let Some(t) = adjustment.minimum_threshold {
            line.minimum_threshold = t;
        }
        if let Some(condition) = adjustment.condition {
            line.condition = condition;
        }
        if adjustment.expiry_date.is_some() {
            line.expiry_date = adjustment.expiry_date;
        }
        if let Some(location) = non_blank(adjustment.storage_location) {
            line.storage_location = Some(location);
        }
        line.updated_at = now;
        line.refresh_alerts(now, config.expiring_soon_window());
        document::replace(tx, &line)?;
        Ok(line)
    })?;

    info!(
        inventory_id = %line.inventory_id,
        quantity = line.current_quantity,
        low_stock = line.is_low_stock,
        "Adjusted inventory line"
    );
    Ok(line)
}

/// Load a contributor's lines with freshly computed alert flags.
///
/// Lines whose flags went stale since the last write (an expiry date
/// drifting into the window) are written back.
pub(crate) fn current_lines(
    conn: &Connection,
    config: InventoryConfig,
    contributor_id: &str,
) -> Result<Vec<InventoryLine>> {
    let now = Utc::now();
    let mut lines: Vec<InventoryLine> = document::list_by_owner(conn, contributor_id)?;
    for line in &mut lines {
        if line.refresh_alerts(now, config.expiring_soon_window()) {
            document::replace(conn, line)?;
        }
    }
    Ok(lines)
}

/// A contributor's inventory, sorted, with per-category totals and alerts.
///
/// # Errors
///
/// Returns a storage error.
pub fn inventory_view(
    storage: &Storage,
    config: InventoryConfig,
    contributor_id: &str,
) -> Result<InventoryView> {
    let mut lines = storage.write(|tx| current_lines(tx, config, contributor_id))?;
    lines.sort_by(|a, b| {
        a.category
            .as_str()
            .cmp(b.category.as_str())
            .then_with(|| a.item_name.cmp(&b.item_name))
    });

    let mut summary = BTreeMap::new();
    for line in &lines {
        *summary.entry(line.category.as_str().to_string()).or_insert(0.0) += line.current_quantity;
    }

    debug!(contributor_id, lines = lines.len(), "Built inventory view");
    Ok(InventoryView {
        count: lines.len(),
        alerts: InventoryAlerts::count(&lines),
        summary,
        inventory: lines,
    })
}

/// A contributor's collections, newest collection date first.
///
/// # Errors
///
/// Returns a storage error.
pub fn list_collections(storage: &Storage, contributor_id: &str) -> Result<Vec<Collection>> {
    let mut collections: Vec<Collection> =
        storage.read(|conn| document::list_by_owner(conn, contributor_id))?;
    collections.sort_by(|a, b| b.collection_date.cmp(&a.collection_date));
    Ok(collections)
}

/// A contributor's distributions, newest distribution date first.
///
/// # Errors
///
/// Returns a storage error.
pub fn list_distributions(storage: &Storage, contributor_id: &str) -> Result<Vec<Distribution>> {
    let mut distributions: Vec<Distribution> =
        storage.read(|conn| document::list_by_owner(conn, contributor_id))?;
    distributions.sort_by(|a, b| b.distribution_date.cmp(&a.distribution_date));
    Ok(distributions)
}

/// Move a collection to another lifecycle state.
///
/// # Errors
///
/// Returns [`Error::NotFound`] for an unknown collection.
pub fn set_collection_status(
    storage: &Storage,
    collection_id: &str,
    status: CollectionStatus,
) -> Result<Collection> {
    let collection = storage.write(|tx| {
        let mut collection: Collection = document::get(tx, collection_id)?
            .ok_or_else(|| Error::not_found("Collection not found"))?;
        collection.status = status;
        collection.updated_at = Utc::now();
        document::replace(tx, &collection)?;
        Ok(collection)
    })?;
    info!(collection_id, status = ?status, "Updated collection status");
    Ok(collection)
}

/// Update a distribution's status and/or recipient confirmation.
///
/// # Errors
///
/// Returns [`Error::NotFound`] for an unknown distribution.
pub fn set_distribution_status(
    storage: &Storage,
    distribution_id: &str,
    update: DistributionUpdate,
) -> Result<Distribution> {
    let distribution = storage.write(|tx| {
        let mut distribution: Distribution = document::get(tx, distribution_id)?
            .ok_or_else(|| Error::not_found("Distribution not found"))?;
        if let Some(status) = update.status {
            distribution.status = status;
        }
        if let Some(confirmed) = update.recipient_confirmation {
            distribution.recipient_confirmation = confirmed;
        }
        distribution.updated_at = Utc::now();
        document::replace(tx, &distribution)?;
        Ok(distribution)
    })?;
    info!(distribution_id, status = ?distribution.status, "Updated distribution status");
    Ok(distribution)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ItemCategory;
    use serde_json::json;

    fn storage() -> Storage {
        Storage::open_in_memory().unwrap()
    }

    fn config() -> InventoryConfig {
        InventoryConfig::default()
    }

    fn collection(contributor: &str, items: serde_json::Value) -> NewCollection {
        serde_json::from_value(json!({"contributorId": contributor, "items": items})).unwrap()
    }

    fn distribution(contributor: &str, items: serde_json::Value) -> NewDistribution {
        serde_json::from_value(json!({"contributorId": contributor, "items": items})).unwrap()
    }

    fn rice_and_water(storage: &Storage) -> Collection {
        log_collection(
            storage,
            config(),
            collection(
                "CON001",
                json!([
                    {"category": "food", "itemName": "Rice", "quantity": 50, "unit": "kg"},
                    {
                        "category": "water",
                        "itemName": "Bottled Water",
                        "quantity": 8,
                        "unit": "liters"
                    }
                ]),
            ),
        )
        .unwrap()
    }

    fn line_by_name(storage: &Storage, contributor: &str, name: &str) -> InventoryLine {
        storage
            .read(|c| document::find_by_lookup(c, &line_key(contributor, name)))
            .unwrap()
            .unwrap()
    }

    #[test]
    fn test_collection_creates_lines() {
        let storage = storage();
        let c = rice_and_water(&storage);
        assert_eq!(c.collection_id, "COLL0001");
        assert_eq!(c.status, CollectionStatus::Collected);

        let rice = line_by_name(&storage, "CON001", "Rice");
        assert_eq!(rice.inventory_id, "INV0001");
        assert!((rice.current_quantity - 50.0).abs() < f64::EPSILON);
        assert!(!rice.is_low_stock);
        assert_eq!(rice.source_collection_ids, vec!["COLL0001"]);

        let water = line_by_name(&storage, "CON001", "Bottled Water");
        assert!(water.is_low_stock);
    }

    #[test]
    fn test_second_collection_merges_into_line() {
        let storage = storage();
        rice_and_water(&storage);
        log_collection(
            &storage,
            config(),
            collection(
                "CON001",
                json!([{"category": "food", "itemName": "Rice", "quantity": 25, "unit": "kg"}]),
            ),
        )
        .unwrap();

        let rice = line_by_name(&storage, "CON001", "Rice");
        assert!((rice.current_quantity - 75.0).abs() < f64::EPSILON);
        assert_eq!(rice.source_collection_ids, vec!["COLL0001", "COLL0002"]);

        let count = storage.read(|c| document::count::<InventoryLine>(c)).unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_lines_are_per_contributor() {
        let storage = storage();
        rice_and_water(&storage);
        log_collection(
            &storage,
            config(),
            collection(
                "CON002",
                json!([{"category": "food", "itemName": "Rice", "quantity": 5}]),
            ),
        )
        .unwrap();

        let other = line_by_name(&storage, "CON002", "Rice");
        assert_eq!(other.inventory_id, "INV0003");
        assert!((other.current_quantity - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_collection_validation() {
        let storage = storage();
        for bad in [
            collection("", json!([{"category": "food", "itemName": "Rice", "quantity": 1}])),
            collection("CON001", json!([])),
            collection("CON001", json!([{"category": "food", "itemName": " ", "quantity": 1}])),
            collection("CON001", json!([{"category": "food", "itemName": "Rice", "quantity": 0}])),
            collection("CON001", json!([{"category": "food", "itemName": "Rice", "quantity": -3}])),
            collection(
                "CON001",
                json!([{
                    "category": "food",
                    "itemName": "Rice",
                    "quantity": 1,
                    "condition": "expired"
                }]),
            ),
        ] {
            let err = log_collection(&storage, config(), bad).unwrap_err();
            assert!(matches!(err, Error::Validation { .. }), "{err}");
        }
        assert_eq!(storage.read(|c| document::count::<Collection>(c)).unwrap(), 0);
    }

    #[test]
    fn test_flat_handover_fields() {
        let mut request: NewCollection = serde_json::from_value(json!({
            "contributorId": "CON001",
            "items": [],
            "handoverType": "victim",
            "handoverRef": "MAT001",
            "handoverEta": ""
        }))
        .unwrap();
        let handover = request.take_handover().unwrap();
        assert_eq!(handover.target, HandoverTarget::Victim);
        assert_eq!(handover.reference, "MAT001");
        assert!(handover.eta.is_none());

        let mut blank: NewCollection = serde_json::from_value(json!({
            "handoverType": "collection-point",
            "handoverRef": ""
        }))
        .unwrap();
        assert!(blank.take_handover().is_none());
    }

    #[test]
    fn test_distribution_deducts_and_fills_item_fields() {
        let storage = storage();
        rice_and_water(&storage);

        let d = log_distribution(
            &storage,
            config(),
            distribution("CON001", json!([{"inventoryId": "INV0001", "quantityDistributed": 45}])),
        )
        .unwrap();

        assert_eq!(d.distribution_id, "DIST0001");
        assert_eq!(d.items[0].item_name.as_deref(), Some("Rice"));
        assert_eq!(d.items[0].category, Some(ItemCategory::Food));
        assert_eq!(d.items[0].unit.as_deref(), Some("kg"));

        let rice = line_by_name(&storage, "CON001", "Rice");
        assert!((rice.current_quantity - 5.0).abs() < f64::EPSILON);
        assert!(rice.is_low_stock);
    }

    #[test]
    fn test_insufficient_stock_message() {
        let storage = storage();
        rice_and_water(&storage);

        let err = log_distribution(
            &storage,
            config(),
            distribution("CON001", json!([{"inventoryId": "INV0002", "quantityDistributed": 9}])),
        )
        .unwrap_err();

        assert!(err.is_client_error());
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Bottled Water. Available: 8, Requested: 9"
        );
    }

    #[test]
    fn test_failed_distribution_changes_nothing() {
        let storage = storage();
        rice_and_water(&storage);

        let err = log_distribution(
            &storage,
            config(),
            distribution(
                "CON001",
                json!([
                    {"inventoryId": "INV0001", "quantityDistributed": 10},
                    {"inventoryId": "INV0002", "quantityDistributed": 100}
                ]),
            ),
        )
        .unwrap_err();
        assert!(matches!(err, Error::InsufficientStock { .. }));

        let rice = line_by_name(&storage, "CON001", "Rice");
        assert!((rice.current_quantity - 50.0).abs() < f64::EPSILON);
        assert_eq!(storage.read(|c| document::count::<Distribution>(c)).unwrap(), 0);

        let next = log_distribution(
            &storage,
            config(),
            distribution("CON001", json!([{"inventoryId": "INV0001", "quantityDistributed": 1}])),
        )
        .unwrap();
        assert_eq!(next.distribution_id, "DIST0001");
    }

    #[test]
    fn test_same_line_twice_in_one_distribution() {
        let storage = storage();
        rice_and_water(&storage);

        let err = log_distribution(
            &storage,
            config(),
            distribution(
                "CON001",
                json!([
                    {"inventoryId": "INV0001", "quantityDistributed": 30},
                    {"inventoryId": "INV0001", "quantityDistributed": 30}
                ]),
            ),
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Rice. Available: 20, Requested: 30"
        );
    }

    #[test]
    fn test_unknown_and_foreign_lines() {
        let storage = storage();
        rice_and_water(&storage);

        let err = log_distribution(
            &storage,
            config(),
            distribution("CON001", json!([{"inventoryId": "INV9999", "quantityDistributed": 1}])),
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Inventory item INV9999 not found");

        let err = log_distribution(
            &storage,
            config(),
            distribution("CON002", json!([{"inventoryId": "INV0001", "quantityDistributed": 1}])),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[test]
    fn test_concurrent_distributions_never_oversell() {
        use std::sync::Arc;

        let storage = Arc::new(storage());
        rice_and_water(&storage);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let storage = Arc::clone(&storage);
                std::thread::spawn(move || {
                    log_distribution(
                        &storage,
                        config(),
                        distribution(
                            "CON001",
                            json!([{"inventoryId": "INV0001", "quantityDistributed": 10}]),
                        ),
                    )
                    .is_ok()
                })
            })
            .collect();
        let succeeded = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();

        assert_eq!(succeeded, 5);
        let rice = line_by_name(&storage, "CON001", "Rice");
        assert!(rice.current_quantity.abs() < f64::EPSILON);
    }

    #[test]
    fn test_adjust_inventory() {
        let storage = storage();
        rice_and_water(&storage);

        let line = adjust_inventory(
            &storage,
            config(),
            "INV0001",
            InventoryAdjustment {
                minimum_threshold: Some(60.0),
                storage_location: Some("Shed B".to_string()),
                ..InventoryAdjustment::default()
            },
        )
        .unwrap();
        assert!(line.is_low_stock);
        assert_eq!(line.storage_location.as_deref(), Some("Shed B"));

        let err = adjust_inventory(
            &storage,
            config(),
            "INV0001",
            InventoryAdjustment {
                current_quantity: Some(-1.0),
                ..InventoryAdjustment::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));

        let err = adjust_inventory(&storage, config(), "INV0404", InventoryAdjustment::default())
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_adjust_expiry_sets_expiring_flag() {
        let storage = storage();
        rice_and_water(&storage);

        let line = adjust_inventory(
            &storage,
            config(),
            "INV0001",
            InventoryAdjustment {
                expiry_date: Some(Utc::now() + chrono::Duration::days(3)),
                ..InventoryAdjustment::default()
            },
        )
        .unwrap();
        assert!(line.is_expiring_soon);
    }

    #[test]
    fn test_inventory_view_sorted_with_summary() {
        let storage = storage();
        rice_and_water(&storage);
        log_collection(
            &storage,
            config(),
            collection(
                "CON001",
                json!([
                    {"category": "food", "itemName": "Dhal", "quantity": 20, "unit": "kg"},
                    {
                        "category": "clothing",
                        "itemName": "Blankets",
                        "quantity": 3,
                        "unit": "pieces"
                    }
                ]),
            ),
        )
        .unwrap();

        let view = inventory_view(&storage, config(), "CON001").unwrap();
        let names: Vec<_> = view.inventory.iter().map(|l| l.item_name.as_str()).collect();
        assert_eq!(names, vec!["Blankets", "Dhal", "Rice", "Bottled Water"]);
        assert_eq!(view.count, 4);
        assert_eq!(view.summary.get("food"), Some(&70.0));
        assert_eq!(view.alerts.low_stock, 2);
        assert_eq!(view.alerts.expiring_soon, 0);
    }

    #[test]
    fn test_view_refreshes_stale_flags() {
        let storage = storage();
        rice_and_water(&storage);

        // Simulate a line written before its expiry date entered the window.
        storage
            .write(|tx| {
                let mut line: InventoryLine = document::get(tx, "INV0001")?.unwrap();
                line.expiry_date = Some(Utc::now() + chrono::Duration::days(1));
                line.is_expiring_soon = false;
                document::replace(tx, &line)
            })
            .unwrap();

        let view = inventory_view(&storage, config(), "CON001").unwrap();
        assert_eq!(view.alerts.expiring_soon, 1);
        assert!(line_by_name(&storage, "CON001", "Rice").is_expiring_soon);
    }

    #[test]
    fn test_lists_newest_first() {
        let storage = storage();
        for date in ["2024-01-05", "2024-03-01", "2024-02-10"] {
            let mut c = collection(
                "CON001",
                json!([{"category": "other", "itemName": "Tarp", "quantity": 1}]),
            );
            c.collection_date = crate::model::time::parse_timestamp(date);
            log_collection(&storage, config(), c).unwrap();
        }

        let dates: Vec<_> = list_collections(&storage, "CON001")
            .unwrap()
            .into_iter()
            .map(|c| c.collection_date.format("%m").to_string())
            .collect();
        assert_eq!(dates, vec!["03", "02", "01"]);
        assert!(list_collections(&storage, "CON404").unwrap().is_empty());
    }

    #[test]
    fn test_status_updates() {
        let storage = storage();
        rice_and_water(&storage);

        let c = set_collection_status(&storage, "COLL0001", CollectionStatus::InStorage).unwrap();
        assert_eq!(c.status, CollectionStatus::InStorage);
        assert!(set_collection_status(&storage, "COLL9", CollectionStatus::InStorage)
            .unwrap_err()
            .is_not_found());

        log_distribution(
            &storage,
            config(),
            distribution("CON001", json!([{"inventoryId": "INV0001", "quantityDistributed": 1}])),
        )
        .unwrap();
        let d = set_distribution_status(
            &storage,
            "DIST0001",
            DistributionUpdate {
                status: None,
                recipient_confirmation: Some(true),
            },
        )
        .unwrap();
        assert_eq!(d.status, DistributionStatus::Pending);
        assert!(d.recipient_confirmation);
    }
}
