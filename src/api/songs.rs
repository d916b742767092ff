//! Song CRUD handlers
//!
//! Validation and the duplicate-title check run before any store mutation;
//! change events are published only after the store write succeeds.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::db;
use crate::error::{Error, Result};
use crate::events::SongChange;
use crate::models::{CreateSong, Song, UpdateSong};
use crate::pagination::PageInfo;
use crate::query::{ListParams, ListQuery};
use crate::sse::SONGS_GROUP;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct SongResponse {
    pub success: bool,
    pub data: Song,
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub success: bool,
    /// Number of records on this page
    pub count: usize,
    /// Grand total of the filtered result set
    pub total: i64,
    pub pagination: PageInfo,
    pub data: Vec<Value>,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}

/// POST /api/v1/songs
pub async fn create_song(
    State(state): State<AppState>,
    Json(payload): Json<CreateSong>,
) -> Result<(StatusCode, Json<SongResponse>)> {
    let validated = payload.validate()?;

    if db::songs::title_exists(&state.db, &validated.title, None).await? {
        return Err(Error::Conflict(
            "A song with this title already exists".to_string(),
        ));
    }

    let song = Song::new(validated);
    db::songs::insert_song(&state.db, &song).await?;
    info!("Created song {} ('{}')", song.id, song.title);

    state
        .notifier
        .broadcast(SONGS_GROUP, SongChange::created(song.clone()));

    Ok((
        StatusCode::CREATED,
        Json(SongResponse {
            success: true,
            data: song,
        }),
    ))
}

/// GET /api/v1/songs
pub async fn list_songs(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<ListResponse>> {
    let query = ListQuery::from_params(params)?;
    let (songs, total) = db::songs::list_songs(&state.db, &query).await?;

    let pagination = PageInfo::new(query.page, query.limit, total);
    let data: Vec<Value> = songs
        .iter()
        .map(|song| song.projected(query.projection.as_deref()))
        .collect();

    Ok(Json(ListResponse {
        success: true,
        count: data.len(),
        total,
        pagination,
        data,
    }))
}

/// GET /api/v1/songs/:id
pub async fn get_song(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SongResponse>> {
    let id = parse_song_id(&id)?;
    let song = db::songs::fetch_song(&state.db, id)
        .await?
        .ok_or_else(song_not_found)?;

    Ok(Json(SongResponse {
        success: true,
        data: song,
    }))
}

/// PUT /api/v1/songs/:id
pub async fn update_song(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateSong>,
) -> Result<Json<SongResponse>> {
    let id = parse_song_id(&id)?;
    let patch = payload.validate()?;

    // Re-check uniqueness only when the title is changing, excluding self
    if let Some(title) = &patch.title {
        if db::songs::title_exists(&state.db, title, Some(id)).await? {
            return Err(Error::Conflict(
                "A song with this title already exists".to_string(),
            ));
        }
    }

    let song = db::songs::update_song(&state.db, id, &patch)
        .await?
        .ok_or_else(song_not_found)?;
    info!("Updated song {}", song.id);

    state
        .notifier
        .broadcast(SONGS_GROUP, SongChange::updated(song.clone()));

    Ok(Json(SongResponse {
        success: true,
        data: song,
    }))
}

/// DELETE /api/v1/songs/:id
pub async fn delete_song(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>> {
    let id = parse_song_id(&id)?;
    let song = db::songs::delete_song(&state.db, id)
        .await?
        .ok_or_else(song_not_found)?;
    info!("Deleted song {} ('{}')", song.id, song.title);

    state.notifier.broadcast(SONGS_GROUP, SongChange::deleted(song));

    Ok(Json(DeleteResponse {
        success: true,
        message: "Song deleted".to_string(),
    }))
}

fn parse_song_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|_| Error::Validation(format!("Invalid song id: {}", raw)))
}

fn song_not_found() -> Error {
    Error::NotFound("Song not found".to_string())
}
