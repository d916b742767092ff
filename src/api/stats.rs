//! Statistics handlers
//!
//! Each call recomputes from the full record set; store failures surface
//! as a single upstream-error category with no partial results.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::db::stats::{self, CatalogStats, RECENT_DEFAULT};
use crate::error::Result;
use crate::models::Song;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub success: bool,
    pub data: CatalogStats,
}

#[derive(Debug, Serialize)]
pub struct RecentResponse {
    pub success: bool,
    pub count: usize,
    pub data: Vec<Song>,
}

/// GET /api/v1/songs/stats
pub async fn get_stats(State(state): State<AppState>) -> Result<Json<StatsResponse>> {
    let data = stats::collect_stats(&state.db).await?;
    Ok(Json(StatsResponse {
        success: true,
        data,
    }))
}

/// GET /api/v1/songs/stats/recent
pub async fn get_recent_songs(State(state): State<AppState>) -> Result<Json<RecentResponse>> {
    let songs = stats::recent_songs(&state.db, RECENT_DEFAULT).await?;
    Ok(Json(RecentResponse {
        success: true,
        count: songs.len(),
        data: songs,
    }))
}
