//! `/api/auth`: victim, supplier and admin accounts.

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use super::error::ApiResult;
use super::extract::{AuthUser, Body, Params};
use super::AppState;
use crate::accounts::{
    self, AdminRegistration, LoginOutcome, LoginRequest, SupplierRegistration, VictimRegistration,
    VictimSearch,
};
use crate::model::{AccountProfile, Admin, Role, Supplier, Victim};

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/victim/register", post(register_victim))
        .route("/victim/login", post(login::<Victim>))
        .route("/victim/search", get(search_victims))
        .route("/supplier/register", post(register_supplier))
        .route("/supplier/login", post(login::<Supplier>))
        .route("/admin/register", post(register_admin))
        .route("/admin/login", post(login::<Admin>))
}

/// Shared by every account kind, contributors included.
pub(super) async fn login<P>(
    State(state): State<AppState>,
    Body(request): Body<LoginRequest>,
) -> ApiResult<Json<LoginOutcome>>
where
    P: AccountProfile + Send + 'static,
{
    let auth = state.config.auth.clone();
    let outcome = state
        .blocking(move |storage| accounts::login::<P>(storage, &auth, request))
        .await?;
    Ok(Json(outcome))
}

async fn register_victim(
    State(state): State<AppState>,
    Body(request): Body<VictimRegistration>,
) -> ApiResult<Json<Value>> {
    let victim = state
        .blocking(move |storage| accounts::register(storage, request))
        .await?;
    Ok(Json(json!({
        "msg": "Victim Account Created Successfully",
        "victimId": victim.victim_id,
    })))
}

async fn register_supplier(
    State(state): State<AppState>,
    Body(request): Body<SupplierRegistration>,
) -> ApiResult<Json<Value>> {
    let supplier = state
        .blocking(move |storage| accounts::register(storage, request))
        .await?;
    Ok(Json(json!({
        "msg": "Supplier Account Created Successfully",
        "supplierId": supplier.supplier_id,
    })))
}

/// Open while no admin exists; afterwards needs an admin bearer token.
async fn register_admin(
    State(state): State<AppState>,
    caller: Option<AuthUser>,
    Body(mut request): Body<AdminRegistration>,
) -> ApiResult<Json<Value>> {
    request.invited_by_admin = caller.is_some_and(|user| user.0.role == Role::Admin);
    let admin = state
        .blocking(move |storage| accounts::register(storage, request))
        .await?;
    Ok(Json(json!({ "msg": "Admin Created", "adminId": admin.admin_id })))
}

async fn search_victims(
    State(state): State<AppState>,
    Params(search): Params<VictimSearch>,
) -> ApiResult<Json<Value>> {
    let victims = state
        .blocking(move |storage| accounts::search_victims(storage, search))
        .await?;
    Ok(Json(json!({ "victims": victims })))
}
