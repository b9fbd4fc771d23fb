//! Request extractors whose rejections use the `{"msg": ...}` error body.

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts},
    http::{header, request::Parts},
};

use super::error::ApiError;
use super::AppState;
use crate::auth::{validate_token, Claims};
use crate::error::Error;
use crate::model::Role;

/// JSON request body. Malformed JSON or an unknown enum value is a 400.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct Body<T>(pub T);

/// Query string.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct Params<T>(pub T);

/// Caller identified by a bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    /// Fail unless the token was issued to `role`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unauthorized`] for any other role.
    pub fn require(&self, role: Role) -> Result<(), ApiError> {
        if self.0.role == role {
            Ok(())
        } else {
            Err(Error::unauthorized(format!("Only {role} accounts may do this")).into())
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or_else(|| Error::unauthorized("Missing bearer token"))?;
        Ok(Self(validate_token(token.trim(), &state.config.auth)?))
    }
}
