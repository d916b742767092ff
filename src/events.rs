//! Change events pushed to subscribed clients
//!
//! Exactly one event is published per successful mutation, after the store
//! write is acknowledged. Deletes carry both the record id and the
//! last-known snapshot so subscribers can update derived views without a
//! follow-up fetch.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::Song;

/// A catalog mutation, as observed by subscribers
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SongChange {
    Created {
        song: Song,
        timestamp: DateTime<Utc>,
    },
    Updated {
        song: Song,
        timestamp: DateTime<Utc>,
    },
    Deleted {
        #[serde(rename = "songId")]
        song_id: Uuid,
        song: Song,
        timestamp: DateTime<Utc>,
    },
}

impl SongChange {
    pub fn created(song: Song) -> Self {
        Self::Created {
            song,
            timestamp: Utc::now(),
        }
    }

    pub fn updated(song: Song) -> Self {
        Self::Updated {
            song,
            timestamp: Utc::now(),
        }
    }

    pub fn deleted(song: Song) -> Self {
        Self::Deleted {
            song_id: song.id,
            song,
            timestamp: Utc::now(),
        }
    }

    /// Wire-level event name
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::Created { .. } => "song-created",
            Self::Updated { .. } => "song-updated",
            Self::Deleted { .. } => "song-deleted",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CreateSong, Song};

    fn sample_song() -> Song {
        let payload = CreateSong {
            title: Some("T".to_string()),
            artist: Some("A".to_string()),
            genre: Some("G".to_string()),
            ..Default::default()
        };
        Song::new(payload.validate().unwrap())
    }

    #[test]
    fn test_event_names() {
        let song = sample_song();
        assert_eq!(SongChange::created(song.clone()).event_name(), "song-created");
        assert_eq!(SongChange::updated(song.clone()).event_name(), "song-updated");
        assert_eq!(SongChange::deleted(song).event_name(), "song-deleted");
    }

    #[test]
    fn test_delete_event_carries_id_and_snapshot() {
        let song = sample_song();
        let id = song.id;
        let event = SongChange::deleted(song);

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "deleted");
        assert_eq!(value["songId"], id.to_string());
        assert_eq!(value["song"]["id"], id.to_string());
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn test_created_event_shape() {
        let song = sample_song();
        let value = serde_json::to_value(SongChange::created(song)).unwrap();
        assert_eq!(value["type"], "created");
        assert_eq!(value["song"]["title"], "T");
    }
}
