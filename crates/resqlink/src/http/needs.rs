//! `/api/needs`: victim need requests.

use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Value};

use super::error::ApiResult;
use super::extract::{Body, Params};
use super::AppState;
use crate::model::VictimNeeds;
use crate::needs::{self, NeedsFilter, NeedsRequest, NeedsResponse};

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(upsert).get(list))
        .route("/:victim_id", get(fetch))
        .route("/:victim_id/response", put(respond))
}

async fn upsert(
    State(state): State<AppState>,
    Body(request): Body<NeedsRequest>,
) -> ApiResult<Json<Value>> {
    let upserted = state
        .blocking(move |storage| needs::upsert(storage, request))
        .await?;
    let msg = if upserted.created {
        "Needs created"
    } else {
        "Needs updated"
    };
    Ok(Json(json!({ "msg": msg, "needs": upserted.needs })))
}

async fn list(
    State(state): State<AppState>,
    Params(filter): Params<NeedsFilter>,
) -> ApiResult<Json<Value>> {
    let all = state
        .blocking(move |storage| needs::list(storage, filter))
        .await?;
    Ok(Json(json!({ "count": all.len(), "needs": all })))
}

async fn fetch(
    State(state): State<AppState>,
    Path(victim_id): Path<String>,
) -> ApiResult<Json<VictimNeeds>> {
    let record = state
        .blocking(move |storage| needs::get(storage, &victim_id))
        .await?;
    Ok(Json(record))
}

async fn respond(
    State(state): State<AppState>,
    Path(victim_id): Path<String>,
    Body(response): Body<NeedsResponse>,
) -> ApiResult<Json<Value>> {
    let record = state
        .blocking(move |storage| needs::respond(storage, &victim_id, response))
        .await?;
    Ok(Json(json!({ "msg": "Response recorded", "needs": record })))
}
