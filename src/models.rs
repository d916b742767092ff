//! Song record model and write-payload validation
//!
//! Validation of create/update payloads happens here, before any store
//! mutation is attempted. Title uniqueness is checked separately on the
//! write path (it needs the store).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::query::SongField;

/// Song classification: a standalone single or an album track
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SongType {
    #[default]
    Single,
    Album,
}

impl SongType {
    /// Parse from the request/database string form
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "single" => Some(Self::Single),
            "album" => Some(Self::Album),
            _ => None,
        }
    }

    /// String form stored in the database
    pub fn to_db_string(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Album => "album",
        }
    }
}

/// A catalog record
///
/// `revision` is an internal write counter, bumped on every update. It is
/// not serialized unless a projection asks for it explicitly.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Song {
    pub id: Uuid,
    pub title: String,
    pub artist: String,
    pub song_type: SongType,
    pub genre: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing)]
    pub revision: i64,
}

impl Song {
    /// Build a fresh record from validated create input
    pub fn new(input: ValidatedSong) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: input.title,
            artist: input.artist,
            song_type: input.song_type,
            genre: input.genre,
            album: input.album,
            created_at: now,
            updated_at: now,
            revision: 0,
        }
    }

    /// Serialize with an optional field projection
    ///
    /// With no projection, every field except `revision` is emitted. With a
    /// projection, only the requested fields are emitted (plus `id`, which
    /// is always present).
    pub fn projected(&self, fields: Option<&[SongField]>) -> Value {
        let Some(fields) = fields else {
            // Derived serialization already omits `revision`
            return serde_json::to_value(self).unwrap_or(Value::Null);
        };

        let full = self.full_value();
        let Value::Object(map) = full else {
            return full;
        };
        let mut out = Map::new();
        for (key, value) in map {
            let keep = key == "id"
                || fields
                    .iter()
                    .any(|f| f.json_key() == key);
            if keep {
                out.insert(key, value);
            }
        }
        Value::Object(out)
    }

    /// Full JSON form including the internal revision counter
    fn full_value(&self) -> Value {
        let mut value = serde_json::to_value(self).unwrap_or(Value::Null);
        if let Value::Object(map) = &mut value {
            map.insert("revision".to_string(), Value::from(self.revision));
        }
        value
    }
}

/// Create payload as received over the wire
///
/// Fields arrive untyped so that a missing field or a bad enum value
/// produces the service's own validation message rather than a codec error.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSong {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub song_type: Option<String>,
    pub genre: Option<String>,
    pub album: Option<String>,
}

/// Create input after validation
#[derive(Debug, Clone)]
pub struct ValidatedSong {
    pub title: String,
    pub artist: String,
    pub song_type: SongType,
    pub genre: String,
    pub album: Option<String>,
}

impl CreateSong {
    /// Validate presence, the songType enum, and the conditional album rule
    pub fn validate(self) -> Result<ValidatedSong> {
        let title = trimmed(self.title);
        let artist = trimmed(self.artist);
        let genre = trimmed(self.genre);

        let (Some(title), Some(artist), Some(genre)) = (title, artist, genre) else {
            return Err(Error::Validation(
                "Title, artist, and genre are required".to_string(),
            ));
        };

        let song_type = parse_song_type(self.song_type.as_deref())?.unwrap_or_default();
        let album = trimmed(self.album);

        if song_type == SongType::Album && album.is_none() {
            return Err(Error::Validation(
                "Album name is required when song type is 'album'".to_string(),
            ));
        }

        Ok(ValidatedSong {
            title,
            artist,
            song_type,
            genre,
            album,
        })
    }
}

/// Partial-update payload as received over the wire
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSong {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub song_type: Option<String>,
    pub genre: Option<String>,
    pub album: Option<String>,
}

/// Validated partial update: only `Some` fields are applied
#[derive(Debug, Clone, Default)]
pub struct SongPatch {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub song_type: Option<SongType>,
    pub genre: Option<String>,
    pub album: Option<String>,
}

impl UpdateSong {
    /// Validate provided fields; absent fields stay untouched
    pub fn validate(self) -> Result<SongPatch> {
        let song_type = parse_song_type(self.song_type.as_deref())?;
        let album = trimmed(self.album);

        // The album rule is re-checked whenever the type is being set
        if song_type == Some(SongType::Album) && album.is_none() {
            return Err(Error::Validation(
                "Album name is required when song type is 'album'".to_string(),
            ));
        }

        let title = require_non_empty("title", self.title)?;
        let artist = require_non_empty("artist", self.artist)?;
        let genre = require_non_empty("genre", self.genre)?;

        Ok(SongPatch {
            title,
            artist,
            song_type,
            genre,
            album,
        })
    }
}

/// Trim a provided string, mapping blank to absent
fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// A field that is present in the payload must not be blank
fn require_non_empty(name: &str, value: Option<String>) -> Result<Option<String>> {
    match value {
        None => Ok(None),
        Some(s) => {
            let s = s.trim().to_string();
            if s.is_empty() {
                Err(Error::Validation(format!("{} must not be empty", name)))
            } else {
                Ok(Some(s))
            }
        }
    }
}

fn parse_song_type(value: Option<&str>) -> Result<Option<SongType>> {
    match value {
        None => Ok(None),
        Some(s) => SongType::from_str(s).map(Some).ok_or_else(|| {
            Error::Validation("songType must be either 'single' or 'album'".to_string())
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_payload(title: &str, song_type: Option<&str>, album: Option<&str>) -> CreateSong {
        CreateSong {
            title: Some(title.to_string()),
            artist: Some("Artist".to_string()),
            song_type: song_type.map(String::from),
            genre: Some("Rock".to_string()),
            album: album.map(String::from),
        }
    }

    #[test]
    fn test_create_defaults_to_single() {
        let validated = create_payload("T", None, None).validate().unwrap();
        assert_eq!(validated.song_type, SongType::Single);
        assert_eq!(validated.album, None);
    }

    #[test]
    fn test_create_missing_required_fields() {
        let payload = CreateSong {
            title: Some("T".to_string()),
            ..Default::default()
        };
        let err = payload.validate().unwrap_err();
        assert!(err.to_string().contains("required"));
    }

    #[test]
    fn test_create_blank_title_is_missing() {
        let mut payload = create_payload("   ", None, None);
        payload.title = Some("   ".to_string());
        assert!(payload.validate().is_err());
    }

    #[test]
    fn test_album_type_requires_album_name() {
        assert!(create_payload("T", Some("album"), None).validate().is_err());
        assert!(create_payload("T", Some("album"), Some("  "))
            .validate()
            .is_err());

        let validated = create_payload("T", Some("album"), Some("LP"))
            .validate()
            .unwrap();
        assert_eq!(validated.album.as_deref(), Some("LP"));
    }

    #[test]
    fn test_single_with_no_album_is_valid() {
        assert!(create_payload("T", Some("single"), None).validate().is_ok());
    }

    #[test]
    fn test_invalid_song_type_rejected() {
        let err = create_payload("T", Some("ep"), None).validate().unwrap_err();
        assert!(err.to_string().contains("single"));
    }

    #[test]
    fn test_update_revalidates_album_pairing() {
        let payload = UpdateSong {
            song_type: Some("album".to_string()),
            ..Default::default()
        };
        assert!(payload.validate().is_err());

        let payload = UpdateSong {
            song_type: Some("album".to_string()),
            album: Some("LP".to_string()),
            ..Default::default()
        };
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn test_update_rejects_blank_provided_fields() {
        let payload = UpdateSong {
            title: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(payload.validate().is_err());
    }

    #[test]
    fn test_update_empty_patch_is_valid() {
        let patch = UpdateSong::default().validate().unwrap();
        assert!(patch.title.is_none());
        assert!(patch.song_type.is_none());
    }

    #[test]
    fn test_projection_default_excludes_revision() {
        let song = Song::new(
            create_payload("T", None, None).validate().unwrap(),
        );
        let value = song.projected(None);
        assert!(value.get("title").is_some());
        assert!(value.get("revision").is_none());
    }

    #[test]
    fn test_projection_keeps_requested_fields_and_id() {
        let song = Song::new(
            create_payload("T", None, None).validate().unwrap(),
        );
        let value = song.projected(Some(&[SongField::Title, SongField::Revision]));
        assert!(value.get("id").is_some());
        assert!(value.get("title").is_some());
        assert!(value.get("revision").is_some());
        assert!(value.get("artist").is_none());
        assert!(value.get("createdAt").is_none());
    }
}
