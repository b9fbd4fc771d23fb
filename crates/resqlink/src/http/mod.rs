//! The JSON HTTP API.
//!
//! Handlers parse the request, run the store work on the blocking pool and
//! shape the response. They hold no state of their own.

mod accounts;
mod admin;
mod contributor;
pub mod error;
pub mod extract;
mod needs;
mod public;
mod victim;

use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use self::error::ApiResult;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::storage::Storage;

/// State shared by all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The document store.
    pub storage: Arc<Storage>,
    /// Loaded configuration.
    pub config: Arc<Config>,
}

impl AppState {
    /// Bundle a store and configuration.
    #[must_use]
    pub fn new(storage: Storage, config: Config) -> Self {
        Self {
            storage: Arc::new(storage),
            config: Arc::new(config),
        }
    }

    /// Run blocking store work off the async workers.
    ///
    /// # Errors
    ///
    /// Returns whatever `f` returns, or an internal error if the task panicked.
    pub async fn blocking<T, F>(&self, f: F) -> ApiResult<T>
    where
        F: FnOnce(&Storage) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let storage = Arc::clone(&self.storage);
        let outcome = tokio::task::spawn_blocking(move || f(&storage))
            .await
            .map_err(|e| Error::internal(format!("store task failed: {e}")))?;
        Ok(outcome?)
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let body_limit = state.config.server.max_body_bytes;
    Router::new()
        .nest("/api/auth", accounts::routes())
        .nest("/api/victim", victim::routes())
        .nest("/api/contributor", contributor::routes())
        .nest("/api/needs", needs::routes())
        .nest("/api/admin", admin::routes())
        .merge(public::routes())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
