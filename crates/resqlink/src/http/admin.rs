//! `/api/admin`: contributor verification.

use axum::{
    extract::{Path, State},
    routing::put,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use super::error::ApiResult;
use super::extract::{AuthUser, Body};
use super::AppState;
use crate::accounts;
use crate::model::{Role, VerificationStatus};

pub(super) fn routes() -> Router<AppState> {
    Router::new().route(
        "/contributors/:contributor_id/verification",
        put(set_verification),
    )
}

#[derive(Debug, Deserialize)]
struct VerificationRequest {
    status: VerificationStatus,
}

async fn set_verification(
    State(state): State<AppState>,
    user: AuthUser,
    Path(contributor_id): Path<String>,
    Body(request): Body<VerificationRequest>,
) -> ApiResult<Json<Value>> {
    user.require(Role::Admin)?;
    let contributor = state
        .blocking(move |storage| {
            accounts::set_verification(storage, &contributor_id, request.status)
        })
        .await?;
    info!(
        admin = %user.0.sub,
        contributor_id = %contributor.contributor_id,
        "Verification reviewed"
    );
    Ok(Json(json!({ "msg": "Verification updated", "contributor": contributor })))
}
