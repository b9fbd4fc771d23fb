//! `resqlink` - disaster-relief coordination service
//!
//! Victims register and describe what they need, contributors record the
//! goods they collect, hold and hand out, and public dashboards summarize the
//! effort. Everything is served as JSON over HTTP from an embedded `SQLite`
//! document store.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod accounts;
pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod http;
pub mod ids;
pub mod ledger;
pub mod logging;
pub mod map;
pub mod model;
pub mod needs;
pub mod outreach;
pub mod reports;
pub mod storage;
pub mod urgency;

pub use config::Config;
pub use error::{Error, Result};
pub use http::{router, AppState};
pub use logging::init_logging;
pub use storage::{Storage, StorageStats};
