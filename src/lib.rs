//! songdeck - song catalog service
//!
//! REST API over a SQLite-backed song catalog with filtering, pagination,
//! aggregate statistics, and SSE change notifications.

use axum::{
    routing::{get, post},
    Router,
};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod models;
pub mod pagination;
pub mod query;
pub mod sse;

pub use error::{Error, Result};

use sse::Broadcaster;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Change notification fan-out
    pub notifier: Arc<Broadcaster>,
}

impl AppState {
    pub fn new(db: SqlitePool) -> Self {
        Self {
            db,
            notifier: Broadcaster::new(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let songs = Router::new()
        .route("/", post(api::songs::create_song).get(api::songs::list_songs))
        .route("/stats", get(api::stats::get_stats))
        .route("/stats/recent", get(api::stats::get_recent_songs))
        .route(
            "/:id",
            get(api::songs::get_song)
                .put(api::songs::update_song)
                .delete(api::songs::delete_song),
        );

    let events = Router::new()
        .route("/", get(api::events::event_stream))
        .route("/join", post(api::events::join_group))
        .route("/leave", post(api::events::leave_group));

    Router::new()
        .nest("/api/v1/songs", songs)
        .nest("/api/v1/events", events)
        .merge(api::health::health_routes())
        .fallback(api::unknown_route)
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
