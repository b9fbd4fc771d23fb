//! `/api/victim`: household profiles.

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};

use super::error::ApiResult;
use super::extract::Body;
use super::AppState;
use crate::accounts::{self, VictimProfileUpdate};
use crate::model::VictimProfile;

pub(super) fn routes() -> Router<AppState> {
    Router::new().route("/profile/:victim_id", get(get_profile).put(update_profile))
}

async fn get_profile(
    State(state): State<AppState>,
    Path(victim_id): Path<String>,
) -> ApiResult<Json<VictimProfile>> {
    let profile = state
        .blocking(move |storage| accounts::victim_profile(storage, &victim_id))
        .await?;
    Ok(Json(profile))
}

async fn update_profile(
    State(state): State<AppState>,
    Path(victim_id): Path<String>,
    Body(update): Body<VictimProfileUpdate>,
) -> ApiResult<Json<Value>> {
    let profile = state
        .blocking(move |storage| accounts::update_victim_profile(storage, &victim_id, update))
        .await?;
    Ok(Json(json!({ "msg": "Profile updated", "profile": profile })))
}
