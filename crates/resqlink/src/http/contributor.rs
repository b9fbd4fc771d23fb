//! `/api/contributor`: accounts, the inventory ledger, collection points and
//! handover notifications.

use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::accounts::login;
use super::error::ApiResult;
use super::extract::{Body, Params};
use super::AppState;
use crate::accounts::{self, ContributorRegistration};
use crate::ledger::{
    self, DistributionUpdate, InventoryAdjustment, InventoryView, NewCollection, NewDistribution,
};
use crate::model::contributor::ContributorUpdate;
use crate::model::{CollectionStatus, Contributor, NotificationStatus, TargetType};
use crate::outreach::{self, NewCollectionPoint};
use crate::reports::{self, ContributorStats};

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login::<Contributor>))
        .route("/profile/:id", get(profile).put(update_profile))
        .route("/collection", post(log_collection))
        .route("/collection/:id", get(collections))
        .route("/collection/:id/status", put(collection_status))
        .route("/inventory/:id", get(inventory).put(adjust_inventory))
        .route("/distribution", post(log_distribution))
        .route("/distribution/:id", get(distributions))
        .route("/distribution/:id/status", put(distribution_status))
        .route("/stats/:id", get(stats))
        .route("/collection-point", post(create_collection_point))
        .route("/collection-points", get(collection_points))
        .route("/collection-points/:id", get(contributor_collection_points))
        .route(
            "/notifications/collection-point/:id",
            get(collection_point_notifications),
        )
        .route("/notifications/victim/:id", get(victim_notifications))
        .route("/notifications/:id/status", put(notification_status))
}

async fn register(
    State(state): State<AppState>,
    Body(request): Body<ContributorRegistration>,
) -> ApiResult<Json<Value>> {
    let contributor = state
        .blocking(move |storage| accounts::register(storage, request))
        .await?;
    Ok(Json(json!({
        "msg": "Contributor registered successfully",
        "contributorId": contributor.contributor_id,
    })))
}

async fn profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Contributor>> {
    let contributor = state
        .blocking(move |storage| accounts::contributor_profile(storage, &id))
        .await?;
    Ok(Json(contributor))
}

async fn update_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Body(update): Body<ContributorUpdate>,
) -> ApiResult<Json<Value>> {
    let contributor = state
        .blocking(move |storage| accounts::update_contributor_profile(storage, &id, update))
        .await?;
    Ok(Json(json!({ "msg": "Profile updated", "contributor": contributor })))
}

async fn log_collection(
    State(state): State<AppState>,
    Body(request): Body<NewCollection>,
) -> ApiResult<Json<Value>> {
    let config = state.config.inventory;
    let collection = state
        .blocking(move |storage| ledger::log_collection(storage, config, request))
        .await?;
    Ok(Json(json!({
        "msg": "Collection logged successfully",
        "collectionId": collection.collection_id,
        "collection": collection,
    })))
}

async fn collections(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let collections = state
        .blocking(move |storage| ledger::list_collections(storage, &id))
        .await?;
    Ok(Json(json!({ "count": collections.len(), "collections": collections })))
}

#[derive(Debug, Deserialize)]
struct CollectionStatusRequest {
    status: CollectionStatus,
}

async fn collection_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Body(request): Body<CollectionStatusRequest>,
) -> ApiResult<Json<Value>> {
    let collection = state
        .blocking(move |storage| ledger::set_collection_status(storage, &id, request.status))
        .await?;
    Ok(Json(json!({ "msg": "Status updated", "collection": collection })))
}

async fn inventory(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<InventoryView>> {
    let config = state.config.inventory;
    let view = state
        .blocking(move |storage| ledger::inventory_view(storage, config, &id))
        .await?;
    Ok(Json(view))
}

async fn adjust_inventory(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Body(adjustment): Body<InventoryAdjustment>,
) -> ApiResult<Json<Value>> {
    let config = state.config.inventory;
    let line = state
        .blocking(move |storage| ledger::adjust_inventory(storage, config, &id, adjustment))
        .await?;
    Ok(Json(json!({ "msg": "Inventory updated", "inventory": line })))
}

async fn log_distribution(
    State(state): State<AppState>,
    Body(request): Body<NewDistribution>,
) -> ApiResult<Json<Value>> {
    let config = state.config.inventory;
    let distribution = state
        .blocking(move |storage| ledger::log_distribution(storage, config, request))
        .await?;
    Ok(Json(json!({
        "msg": "Distribution logged successfully",
        "distributionId": distribution.distribution_id,
        "distribution": distribution,
    })))
}

async fn distributions(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let distributions = state
        .blocking(move |storage| ledger::list_distributions(storage, &id))
        .await?;
    Ok(Json(json!({ "count": distributions.len(), "distributions": distributions })))
}

async fn distribution_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Body(update): Body<DistributionUpdate>,
) -> ApiResult<Json<Value>> {
    let distribution = state
        .blocking(move |storage| ledger::set_distribution_status(storage, &id, update))
        .await?;
    Ok(Json(json!({
        "msg": "Distribution status updated",
        "distribution": distribution,
    })))
}

async fn stats(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ContributorStats>> {
    let config = state.config.inventory;
    let stats = state
        .blocking(move |storage| reports::contributor_stats(storage, config, &id))
        .await?;
    Ok(Json(stats))
}

async fn create_collection_point(
    State(state): State<AppState>,
    Body(request): Body<NewCollectionPoint>,
) -> ApiResult<Json<Value>> {
    let point = state
        .blocking(move |storage| outreach::create_collection_point(storage, request))
        .await?;
    Ok(Json(json!({
        "msg": "Collection point created",
        "collectionPointId": point.collection_point_id,
        "point": point,
    })))
}

#[derive(Debug, Deserialize)]
struct DistrictFilter {
    district: Option<String>,
}

async fn collection_points(
    State(state): State<AppState>,
    Params(filter): Params<DistrictFilter>,
) -> ApiResult<Json<Value>> {
    let points = state
        .blocking(move |storage| {
            outreach::list_collection_points(storage, filter.district.as_deref())
        })
        .await?;
    Ok(Json(json!({ "points": points })))
}

async fn contributor_collection_points(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let points = state
        .blocking(move |storage| outreach::collection_points_for(storage, &id))
        .await?;
    Ok(Json(json!({ "points": points })))
}

async fn notifications(
    state: &AppState,
    target_type: TargetType,
    target_ref: String,
) -> ApiResult<Json<Value>> {
    let notifications = state
        .blocking(move |storage| outreach::notifications_for(storage, target_type, &target_ref))
        .await?;
    Ok(Json(json!({ "notifications": notifications })))
}

async fn collection_point_notifications(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    notifications(&state, TargetType::CollectionPoint, id).await
}

async fn victim_notifications(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    notifications(&state, TargetType::Victim, id).await
}

#[derive(Debug, Deserialize)]
struct NotificationStatusRequest {
    status: NotificationStatus,
}

async fn notification_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Body(request): Body<NotificationStatusRequest>,
) -> ApiResult<Json<Value>> {
    let notification = state
        .blocking(move |storage| outreach::set_notification_status(storage, &id, request.status))
        .await?;
    Ok(Json(json!({ "msg": "Notification updated", "notification": notification })))
}
