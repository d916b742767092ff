//! Catalog statistics queries
//!
//! Every call recomputes from the full record set; there is no cache or
//! incremental maintenance. Grouped results are sorted descending by count.
//! Percentages and averages are integer-rounded and return 0 instead of
//! dividing by zero on an empty catalog.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;

use super::songs::row_to_song;
use crate::error::Result;
use crate::models::Song;

pub const RECENT_DEFAULT: i64 = 5;

/// Whole-catalog counts
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub songs: i64,
    pub artists: i64,
    pub genres: i64,
    pub single_songs: i64,
    pub album_songs: i64,
}

/// Per-genre breakdown
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenreStats {
    pub genre: String,
    pub total_count: i64,
    pub single_count: i64,
    pub album_count: i64,
    pub unique_artists: i64,
    /// Share of the grand total, rounded to the nearest integer percent
    pub percentage: i64,
}

/// One entry of an artist's song list
#[derive(Debug, Clone, Serialize)]
pub struct ArtistSong {
    pub title: String,
    #[serde(rename = "type")]
    pub song_type: String,
    pub genre: String,
}

/// Per-artist breakdown
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistStats {
    pub artist: String,
    pub song_count: i64,
    pub single_count: i64,
    pub album_count: i64,
    pub unique_genres: i64,
    pub percentage: i64,
    pub songs: Vec<ArtistSong>,
}

/// Per-type breakdown
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeStats {
    #[serde(rename = "type")]
    pub song_type: String,
    pub count: i64,
    pub unique_genres: i64,
    pub unique_artists: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Distribution {
    pub songs_per_genre: Vec<GenreStats>,
    pub songs_per_artist: Vec<ArtistStats>,
    pub songs_per_type: Vec<TypeStats>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopGenre {
    pub genre: String,
    pub total_count: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopArtist {
    pub artist: String,
    pub song_count: i64,
}

/// Derived insights over the distributions
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Insights {
    pub top_genre: TopGenre,
    pub top_artist: TopArtist,
    pub average_songs_per_artist: i64,
    pub average_songs_per_genre: i64,
}

/// Oldest and newest record creation times
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsMetadata {
    pub generated_at: DateTime<Utc>,
    pub data_range: DataRange,
}

/// Complete statistics payload for GET /stats
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogStats {
    pub totals: Totals,
    pub distribution: Distribution,
    pub insights: Insights,
    pub metadata: StatsMetadata,
}

/// Compute the full statistics payload
pub async fn collect_stats(db: &SqlitePool) -> Result<CatalogStats> {
    let totals = totals(db).await?;
    let songs_per_genre = per_genre(db, totals.songs).await?;
    let songs_per_artist = per_artist(db, totals.songs).await?;
    let songs_per_type = per_type(db).await?;
    let data_range = data_range(db).await?;

    let top_genre = songs_per_genre
        .first()
        .map(|g| TopGenre {
            genre: g.genre.clone(),
            total_count: g.total_count,
        })
        .unwrap_or_else(|| TopGenre {
            genre: "N/A".to_string(),
            total_count: 0,
        });
    let top_artist = songs_per_artist
        .first()
        .map(|a| TopArtist {
            artist: a.artist.clone(),
            song_count: a.song_count,
        })
        .unwrap_or_else(|| TopArtist {
            artist: "N/A".to_string(),
            song_count: 0,
        });

    let insights = Insights {
        top_genre,
        top_artist,
        average_songs_per_artist: rounded_average(totals.songs, totals.artists),
        average_songs_per_genre: rounded_average(totals.songs, totals.genres),
    };

    Ok(CatalogStats {
        totals,
        distribution: Distribution {
            songs_per_genre,
            songs_per_artist,
            songs_per_type,
        },
        insights,
        metadata: StatsMetadata {
            generated_at: Utc::now(),
            data_range,
        },
    })
}

async fn totals(db: &SqlitePool) -> Result<Totals> {
    let row = sqlx::query(
        r#"
        SELECT COUNT(*) AS songs,
               COUNT(DISTINCT artist) AS artists,
               COUNT(DISTINCT genre) AS genres,
               COALESCE(SUM(CASE WHEN song_type = 'single' THEN 1 ELSE 0 END), 0) AS singles,
               COALESCE(SUM(CASE WHEN song_type = 'album' THEN 1 ELSE 0 END), 0) AS albums
        FROM songs
        "#,
    )
    .fetch_one(db)
    .await?;

    Ok(Totals {
        songs: row.get("songs"),
        artists: row.get("artists"),
        genres: row.get("genres"),
        single_songs: row.get("singles"),
        album_songs: row.get("albums"),
    })
}

async fn per_genre(db: &SqlitePool, grand_total: i64) -> Result<Vec<GenreStats>> {
    let rows = sqlx::query(
        r#"
        SELECT genre,
               COUNT(*) AS total,
               SUM(CASE WHEN song_type = 'single' THEN 1 ELSE 0 END) AS singles,
               SUM(CASE WHEN song_type = 'album' THEN 1 ELSE 0 END) AS albums,
               COUNT(DISTINCT artist) AS unique_artists
        FROM songs
        GROUP BY genre
        ORDER BY total DESC
        "#,
    )
    .fetch_all(db)
    .await?;

    Ok(rows
        .iter()
        .map(|row| {
            let total: i64 = row.get("total");
            GenreStats {
                genre: row.get("genre"),
                total_count: total,
                single_count: row.get("singles"),
                album_count: row.get("albums"),
                unique_artists: row.get("unique_artists"),
                percentage: percentage_of(total, grand_total),
            }
        })
        .collect())
}

async fn per_artist(db: &SqlitePool, grand_total: i64) -> Result<Vec<ArtistStats>> {
    let rows = sqlx::query(
        r#"
        SELECT artist,
               COUNT(*) AS total,
               SUM(CASE WHEN song_type = 'single' THEN 1 ELSE 0 END) AS singles,
               SUM(CASE WHEN song_type = 'album' THEN 1 ELSE 0 END) AS albums,
               COUNT(DISTINCT genre) AS unique_genres
        FROM songs
        GROUP BY artist
        ORDER BY total DESC
        "#,
    )
    .fetch_all(db)
    .await?;

    let mut song_lists = artist_song_lists(db).await?;

    Ok(rows
        .iter()
        .map(|row| {
            let artist: String = row.get("artist");
            let total: i64 = row.get("total");
            let songs = song_lists.remove(&artist).unwrap_or_default();
            ArtistStats {
                artist,
                song_count: total,
                single_count: row.get("singles"),
                album_count: row.get("albums"),
                unique_genres: row.get("unique_genres"),
                percentage: percentage_of(total, grand_total),
                songs,
            }
        })
        .collect())
}

/// Each artist's songs as title/type/genre triples
async fn artist_song_lists(db: &SqlitePool) -> Result<HashMap<String, Vec<ArtistSong>>> {
    let rows = sqlx::query(
        "SELECT artist, title, song_type, genre FROM songs ORDER BY created_at DESC",
    )
    .fetch_all(db)
    .await?;

    let mut lists: HashMap<String, Vec<ArtistSong>> = HashMap::new();
    for row in &rows {
        let artist: String = row.get("artist");
        lists.entry(artist).or_default().push(ArtistSong {
            title: row.get("title"),
            song_type: row.get("song_type"),
            genre: row.get("genre"),
        });
    }
    Ok(lists)
}

async fn per_type(db: &SqlitePool) -> Result<Vec<TypeStats>> {
    let rows = sqlx::query(
        r#"
        SELECT song_type,
               COUNT(*) AS total,
               COUNT(DISTINCT genre) AS unique_genres,
               COUNT(DISTINCT artist) AS unique_artists
        FROM songs
        GROUP BY song_type
        ORDER BY total DESC
        "#,
    )
    .fetch_all(db)
    .await?;

    Ok(rows
        .iter()
        .map(|row| TypeStats {
            song_type: row.get("song_type"),
            count: row.get("total"),
            unique_genres: row.get("unique_genres"),
            unique_artists: row.get("unique_artists"),
        })
        .collect())
}

async fn data_range(db: &SqlitePool) -> Result<DataRange> {
    let row = sqlx::query("SELECT MIN(created_at) AS oldest, MAX(created_at) AS newest FROM songs")
        .fetch_one(db)
        .await?;

    let oldest: Option<i64> = row.get("oldest");
    let newest: Option<i64> = row.get("newest");

    Ok(DataRange {
        from: oldest.and_then(DateTime::from_timestamp_millis),
        to: newest.and_then(DateTime::from_timestamp_millis),
    })
}

/// The `n` most recently created records, newest first
pub async fn recent_songs(db: &SqlitePool, n: i64) -> Result<Vec<Song>> {
    let rows = sqlx::query(
        r#"
        SELECT guid, title, artist, song_type, genre, album,
               created_at, updated_at, revision
        FROM songs
        ORDER BY created_at DESC
        LIMIT ?
        "#,
    )
    .bind(n)
    .fetch_all(db)
    .await?;

    rows.iter().map(row_to_song).collect()
}

fn percentage_of(count: i64, total: i64) -> i64 {
    if total == 0 {
        0
    } else {
        ((count as f64 / total as f64) * 100.0).round() as i64
    }
}

fn rounded_average(total: i64, groups: i64) -> i64 {
    if groups == 0 {
        0
    } else {
        (total as f64 / groups as f64).round() as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage_rounds_to_nearest() {
        assert_eq!(percentage_of(1, 3), 33);
        assert_eq!(percentage_of(2, 3), 67);
        assert_eq!(percentage_of(3, 3), 100);
    }

    #[test]
    fn test_percentage_zero_total() {
        assert_eq!(percentage_of(0, 0), 0);
    }

    #[test]
    fn test_rounded_average() {
        assert_eq!(rounded_average(7, 2), 4);
        assert_eq!(rounded_average(0, 0), 0);
        assert_eq!(rounded_average(5, 0), 0);
    }
}
