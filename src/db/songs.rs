//! Song record queries
//!
//! All list filtering goes through one adapter (`where_clause`) that
//! translates the typed conditions from the query builder into a
//! parameterized WHERE clause.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{Song, SongPatch, SongType};
use crate::query::{Condition, ListQuery, SortDirection};

const SONG_COLUMNS: &str =
    "guid, title, artist, song_type, genre, album, created_at, updated_at, revision";

/// Map a database row to a Song record
pub(crate) fn row_to_song(row: &SqliteRow) -> Result<Song> {
    let guid: String = row.get("guid");
    let id = Uuid::parse_str(&guid)
        .map_err(|_| Error::Internal(format!("corrupt record id: {}", guid)))?;

    let type_str: String = row.get("song_type");
    let song_type = SongType::from_str(&type_str)
        .ok_or_else(|| Error::Internal(format!("corrupt song type: {}", type_str)))?;

    Ok(Song {
        id,
        title: row.get("title"),
        artist: row.get("artist"),
        song_type,
        genre: row.get("genre"),
        album: row.get("album"),
        created_at: millis_to_datetime(row.get("created_at"))?,
        updated_at: millis_to_datetime(row.get("updated_at"))?,
        revision: row.get("revision"),
    })
}

fn millis_to_datetime(ms: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| Error::Internal(format!("corrupt timestamp: {}", ms)))
}

/// Insert a new record
pub async fn insert_song(db: &SqlitePool, song: &Song) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO songs (guid, title, artist, song_type, genre, album,
                           created_at, updated_at, revision)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(song.id.to_string())
    .bind(&song.title)
    .bind(&song.artist)
    .bind(song.song_type.to_db_string())
    .bind(&song.genre)
    .bind(&song.album)
    .bind(song.created_at.timestamp_millis())
    .bind(song.updated_at.timestamp_millis())
    .bind(song.revision)
    .execute(db)
    .await?;

    Ok(())
}

/// Fetch one record by id
pub async fn fetch_song(db: &SqlitePool, id: Uuid) -> Result<Option<Song>> {
    let row = sqlx::query(&format!("SELECT {} FROM songs WHERE guid = ?", SONG_COLUMNS))
        .bind(id.to_string())
        .fetch_optional(db)
        .await?;

    row.as_ref().map(row_to_song).transpose()
}

/// Case-insensitive title collision check
///
/// `exclude` skips the record being updated so it does not collide with
/// itself. Note this check and the write that follows it are separate
/// statements; see DESIGN.md for the accepted check-then-act race.
pub async fn title_exists(db: &SqlitePool, title: &str, exclude: Option<Uuid>) -> Result<bool> {
    let found: Option<i64> = match exclude {
        Some(id) => {
            sqlx::query_scalar(
                "SELECT 1 FROM songs WHERE title = ? COLLATE NOCASE AND guid != ? LIMIT 1",
            )
            .bind(title)
            .bind(id.to_string())
            .fetch_optional(db)
            .await?
        }
        None => {
            sqlx::query_scalar("SELECT 1 FROM songs WHERE title = ? COLLATE NOCASE LIMIT 1")
                .bind(title)
                .fetch_optional(db)
                .await?
        }
    };

    Ok(found.is_some())
}

/// Apply a partial update, refreshing `updated_at` and bumping `revision`
///
/// Returns the updated record, or None if no record has this id.
pub async fn update_song(db: &SqlitePool, id: Uuid, patch: &SongPatch) -> Result<Option<Song>> {
    let mut sets: Vec<&str> = Vec::new();
    let mut binds: Vec<String> = Vec::new();

    if let Some(title) = &patch.title {
        sets.push("title = ?");
        binds.push(title.clone());
    }
    if let Some(artist) = &patch.artist {
        sets.push("artist = ?");
        binds.push(artist.clone());
    }
    if let Some(song_type) = patch.song_type {
        sets.push("song_type = ?");
        binds.push(song_type.to_db_string().to_string());
    }
    if let Some(genre) = &patch.genre {
        sets.push("genre = ?");
        binds.push(genre.clone());
    }
    if let Some(album) = &patch.album {
        sets.push("album = ?");
        binds.push(album.clone());
    }
    sets.push("updated_at = ?");
    sets.push("revision = revision + 1");

    let sql = format!("UPDATE songs SET {} WHERE guid = ?", sets.join(", "));

    let mut update = sqlx::query(&sql);
    for bind in &binds {
        update = update.bind(bind);
    }
    let result = update
        .bind(Utc::now().timestamp_millis())
        .bind(id.to_string())
        .execute(db)
        .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }

    fetch_song(db, id).await
}

/// Hard-delete a record, returning its last-known snapshot
pub async fn delete_song(db: &SqlitePool, id: Uuid) -> Result<Option<Song>> {
    let Some(song) = fetch_song(db, id).await? else {
        return Ok(None);
    };

    sqlx::query("DELETE FROM songs WHERE guid = ?")
        .bind(id.to_string())
        .execute(db)
        .await?;

    Ok(Some(song))
}

/// Execute a list query: filtered total plus the requested page
pub async fn list_songs(db: &SqlitePool, query: &ListQuery) -> Result<(Vec<Song>, i64)> {
    let (where_sql, binds) = where_clause(&query.conditions);

    let count_sql = format!("SELECT COUNT(*) FROM songs{}", where_sql);
    let mut count = sqlx::query_scalar::<_, i64>(&count_sql);
    for bind in &binds {
        count = count.bind(bind);
    }
    let total = count.fetch_one(db).await?;

    let order = match query.sort.direction {
        SortDirection::Ascending => "ASC",
        SortDirection::Descending => "DESC",
    };
    let select_sql = format!(
        "SELECT {} FROM songs{} ORDER BY {} {} LIMIT ? OFFSET ?",
        SONG_COLUMNS,
        where_sql,
        query.sort.field.column(),
        order
    );

    let mut select = sqlx::query(&select_sql);
    for bind in &binds {
        select = select.bind(bind);
    }
    let rows = select
        .bind(query.limit)
        .bind(query.skip())
        .fetch_all(db)
        .await?;

    let songs = rows
        .iter()
        .map(row_to_song)
        .collect::<Result<Vec<Song>>>()?;

    Ok((songs, total))
}

/// Translate typed filter conditions into a parameterized WHERE clause
///
/// Returns the clause (empty string when unfiltered) and the bind values in
/// placeholder order.
fn where_clause(conditions: &[Condition]) -> (String, Vec<String>) {
    if conditions.is_empty() {
        return (String::new(), Vec::new());
    }

    let mut clauses = Vec::new();
    let mut binds = Vec::new();
    for condition in conditions {
        match condition {
            Condition::Contains { field, term } => {
                clauses.push(format!("{} LIKE ? ESCAPE '\\'", field.column()));
                binds.push(format!("%{}%", escape_like(term)));
            }
            Condition::Equals { field, value } => {
                clauses.push(format!("{} = ?", field.column()));
                binds.push(value.clone());
            }
        }
    }

    (format!(" WHERE {}", clauses.join(" AND ")), binds)
}

/// Escape LIKE metacharacters so the term matches literally
fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
