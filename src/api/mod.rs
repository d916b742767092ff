//! HTTP API handlers

pub mod events;
pub mod health;
pub mod songs;
pub mod stats;

use axum::http::Uri;

use crate::error::Error;

/// Fallback for unknown routes
pub async fn unknown_route(uri: Uri) -> Error {
    Error::NotFound(format!("Can't find {} on this server", uri.path()))
}
