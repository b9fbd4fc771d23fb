//! Unauthenticated dashboards, the map feed and the health check.

use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};

use super::error::ApiResult;
use super::AppState;
use crate::map;
use crate::reports::{self, DashboardStats, HomeStats};

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/home/stats", get(home_stats))
        .route("/api/general/dashboard-stats", get(dashboard_stats))
        .route("/api/map/data", get(map_data))
}

async fn healthz() -> Json<Value> {
    Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}

async fn home_stats(State(state): State<AppState>) -> ApiResult<Json<HomeStats>> {
    Ok(Json(state.blocking(reports::home_stats).await?))
}

async fn dashboard_stats(State(state): State<AppState>) -> ApiResult<Json<DashboardStats>> {
    Ok(Json(state.blocking(reports::dashboard_stats).await?))
}

async fn map_data(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let victims = state.blocking(map::map_points).await?;
    Ok(Json(json!({ "victims": victims })))
}
