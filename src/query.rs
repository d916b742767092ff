//! List-request query building
//!
//! Translates the raw query string of `GET /api/v1/songs` into a typed
//! filter/sort/projection/page specification. Pure transformation: no store
//! access, no side effects. The SQL translation of the typed conditions
//! lives in one adapter in `db::songs`.

use serde::Deserialize;

use crate::error::{Error, Result};

pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

/// Raw query parameters for the list endpoint
///
/// `page` and `limit` arrive as strings so that non-numeric input produces
/// this service's validation message instead of a deserializer rejection.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub sort: Option<String>,
    pub fields: Option<String>,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub genre: Option<String>,
    pub album: Option<String>,
    pub song_type: Option<String>,
    pub search: Option<String>,
    pub search_type: Option<String>,
}

/// Addressable fields of a Song record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SongField {
    Id,
    Title,
    Artist,
    SongType,
    Genre,
    Album,
    CreatedAt,
    UpdatedAt,
    Revision,
}

impl SongField {
    /// Database column backing this field
    pub fn column(self) -> &'static str {
        match self {
            Self::Id => "guid",
            Self::Title => "title",
            Self::Artist => "artist",
            Self::SongType => "song_type",
            Self::Genre => "genre",
            Self::Album => "album",
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
            Self::Revision => "revision",
        }
    }

    /// JSON key used in request parameters and response bodies
    pub fn json_key(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Title => "title",
            Self::Artist => "artist",
            Self::SongType => "songType",
            Self::Genre => "genre",
            Self::Album => "album",
            Self::CreatedAt => "createdAt",
            Self::UpdatedAt => "updatedAt",
            Self::Revision => "revision",
        }
    }

    fn from_json_key(key: &str) -> Option<Self> {
        match key {
            "id" => Some(Self::Id),
            "title" => Some(Self::Title),
            "artist" => Some(Self::Artist),
            "songType" => Some(Self::SongType),
            "genre" => Some(Self::Genre),
            "album" => Some(Self::Album),
            "createdAt" => Some(Self::CreatedAt),
            "updatedAt" => Some(Self::UpdatedAt),
            "revision" => Some(Self::Revision),
            _ => None,
        }
    }
}

/// Fields accepted by the `sort` parameter
const SORTABLE: &[SongField] = &[
    SongField::Title,
    SongField::Artist,
    SongField::SongType,
    SongField::Genre,
    SongField::Album,
    SongField::CreatedAt,
];

/// One recognized filter parameter, as a typed condition
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Case-insensitive partial match on a text field
    Contains { field: SongField, term: String },
    /// Exact match
    Equals { field: SongField, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SortKey {
    pub field: SongField,
    pub direction: SortDirection,
}

impl Default for SortKey {
    /// Newest first
    fn default() -> Self {
        Self {
            field: SongField::CreatedAt,
            direction: SortDirection::Descending,
        }
    }
}

/// Validated list query: conjunction of conditions, sort order, optional
/// projection, and the page window
#[derive(Debug)]
pub struct ListQuery {
    pub conditions: Vec<Condition>,
    pub sort: SortKey,
    pub projection: Option<Vec<SongField>>,
    pub page: i64,
    pub limit: i64,
}

impl ListQuery {
    /// Rows to skip before the requested page
    pub fn skip(&self) -> i64 {
        (self.page - 1) * self.limit
    }

    /// Validate raw parameters and assemble the query specification
    pub fn from_params(params: ListParams) -> Result<Self> {
        let page = parse_page(params.page.as_deref())?;
        let limit = parse_limit(params.limit.as_deref())?;
        let sort = parse_sort(params.sort.as_deref())?;
        let projection = parse_projection(params.fields.as_deref())?;
        let conditions = build_conditions(&params);

        Ok(Self {
            conditions,
            sort,
            projection,
            page,
            limit,
        })
    }
}

fn parse_page(raw: Option<&str>) -> Result<i64> {
    let Some(raw) = raw.filter(|s| !s.trim().is_empty()) else {
        return Ok(1);
    };
    match raw.trim().parse::<i64>() {
        Ok(page) if page >= 1 => Ok(page),
        _ => Err(Error::Validation(
            "Page must be a positive number".to_string(),
        )),
    }
}

fn parse_limit(raw: Option<&str>) -> Result<i64> {
    let Some(raw) = raw.filter(|s| !s.trim().is_empty()) else {
        return Ok(DEFAULT_LIMIT);
    };
    match raw.trim().parse::<i64>() {
        Ok(limit) if (1..=MAX_LIMIT).contains(&limit) => Ok(limit),
        _ => Err(Error::Validation(format!(
            "Limit must be between 1 and {}",
            MAX_LIMIT
        ))),
    }
}

fn parse_sort(raw: Option<&str>) -> Result<SortKey> {
    let Some(raw) = raw.filter(|s| !s.is_empty()) else {
        return Ok(SortKey::default());
    };

    let (direction, name) = match raw.strip_prefix('-') {
        Some(rest) => (SortDirection::Descending, rest),
        None => (SortDirection::Ascending, raw),
    };

    let field = SongField::from_json_key(name)
        .filter(|f| SORTABLE.contains(f))
        .ok_or_else(|| {
            let allowed: Vec<&str> = SORTABLE.iter().map(|f| f.json_key()).collect();
            Error::Validation(format!(
                "Invalid sort field '{}'. Allowed: {} (prefix with '-' for descending)",
                raw,
                allowed.join(", ")
            ))
        })?;

    Ok(SortKey { field, direction })
}

fn parse_projection(raw: Option<&str>) -> Result<Option<Vec<SongField>>> {
    let Some(raw) = raw.filter(|s| !s.trim().is_empty()) else {
        return Ok(None);
    };

    let mut fields = Vec::new();
    for name in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let field = SongField::from_json_key(name).ok_or_else(|| {
            Error::Validation(format!("Unknown field '{}' in fields parameter", name))
        })?;
        if !fields.contains(&field) {
            fields.push(field);
        }
    }

    Ok(if fields.is_empty() { None } else { Some(fields) })
}

/// Assemble filter conditions from the recognized parameters
///
/// A `search` term replaces the per-field filters and applies one
/// case-insensitive partial match on the field named by `searchType`
/// (title when absent or unrecognized).
fn build_conditions(params: &ListParams) -> Vec<Condition> {
    if let Some(term) = present(params.search.as_deref()) {
        let field = match params.search_type.as_deref() {
            Some("artist") => SongField::Artist,
            Some("album") => SongField::Album,
            Some("genre") => SongField::Genre,
            _ => SongField::Title,
        };
        return vec![Condition::Contains {
            field,
            term: term.to_string(),
        }];
    }

    let mut conditions = Vec::new();
    let contains = [
        (SongField::Title, params.title.as_deref()),
        (SongField::Artist, params.artist.as_deref()),
        (SongField::Genre, params.genre.as_deref()),
        (SongField::Album, params.album.as_deref()),
    ];
    for (field, value) in contains {
        if let Some(term) = present(value) {
            conditions.push(Condition::Contains {
                field,
                term: term.to_string(),
            });
        }
    }
    if let Some(value) = present(params.song_type.as_deref()) {
        conditions.push(Condition::Equals {
            field: SongField::SongType,
            value: value.to_string(),
        });
    }
    conditions
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> ListParams {
        ListParams::default()
    }

    #[test]
    fn test_defaults() {
        let query = ListQuery::from_params(params()).unwrap();
        assert_eq!(query.page, 1);
        assert_eq!(query.limit, DEFAULT_LIMIT);
        assert_eq!(query.sort.field, SongField::CreatedAt);
        assert_eq!(query.sort.direction, SortDirection::Descending);
        assert!(query.projection.is_none());
        assert!(query.conditions.is_empty());
        assert_eq!(query.skip(), 0);
    }

    #[test]
    fn test_page_window_arithmetic() {
        let mut p = params();
        p.page = Some("3".to_string());
        p.limit = Some("25".to_string());
        let query = ListQuery::from_params(p).unwrap();
        assert_eq!(query.skip(), 50);
    }

    #[test]
    fn test_page_rejects_non_numeric_and_zero() {
        for bad in ["0", "-1", "abc", "1.5"] {
            let mut p = params();
            p.page = Some(bad.to_string());
            assert!(ListQuery::from_params(p).is_err(), "page={}", bad);
        }
    }

    #[test]
    fn test_limit_boundaries() {
        for (raw, ok) in [("0", false), ("1", true), ("100", true), ("101", false)] {
            let mut p = params();
            p.limit = Some(raw.to_string());
            assert_eq!(ListQuery::from_params(p).is_ok(), ok, "limit={}", raw);
        }
    }

    #[test]
    fn test_sort_allow_list() {
        for raw in ["title", "-title", "createdAt", "-createdAt", "songType"] {
            let mut p = params();
            p.sort = Some(raw.to_string());
            assert!(ListQuery::from_params(p).is_ok(), "sort={}", raw);
        }

        for raw in ["updatedAt", "rating", "-rating", "id"] {
            let mut p = params();
            p.sort = Some(raw.to_string());
            assert!(ListQuery::from_params(p).is_err(), "sort={}", raw);
        }
    }

    #[test]
    fn test_sort_descending_prefix() {
        let mut p = params();
        p.sort = Some("-artist".to_string());
        let query = ListQuery::from_params(p).unwrap();
        assert_eq!(query.sort.field, SongField::Artist);
        assert_eq!(query.sort.direction, SortDirection::Descending);
    }

    #[test]
    fn test_projection_rejects_unknown_field() {
        let mut p = params();
        p.fields = Some("title,rating".to_string());
        assert!(ListQuery::from_params(p).is_err());
    }

    #[test]
    fn test_projection_parses_and_dedupes() {
        let mut p = params();
        p.fields = Some("title, artist,title".to_string());
        let query = ListQuery::from_params(p).unwrap();
        assert_eq!(
            query.projection,
            Some(vec![SongField::Title, SongField::Artist])
        );
    }

    #[test]
    fn test_per_field_filters() {
        let mut p = params();
        p.title = Some("love".to_string());
        p.song_type = Some("album".to_string());
        let query = ListQuery::from_params(p).unwrap();
        assert_eq!(
            query.conditions,
            vec![
                Condition::Contains {
                    field: SongField::Title,
                    term: "love".to_string()
                },
                Condition::Equals {
                    field: SongField::SongType,
                    value: "album".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_search_targets_named_field() {
        let mut p = params();
        p.search = Some("dylan".to_string());
        p.search_type = Some("artist".to_string());
        let query = ListQuery::from_params(p).unwrap();
        assert_eq!(
            query.conditions,
            vec![Condition::Contains {
                field: SongField::Artist,
                term: "dylan".to_string()
            }]
        );
    }

    #[test]
    fn test_search_defaults_to_title() {
        for search_type in [None, Some("bogus".to_string())] {
            let mut p = params();
            p.search = Some("imagine".to_string());
            p.search_type = search_type;
            let query = ListQuery::from_params(p).unwrap();
            assert_eq!(
                query.conditions,
                vec![Condition::Contains {
                    field: SongField::Title,
                    term: "imagine".to_string()
                }]
            );
        }
    }

    #[test]
    fn test_search_overrides_per_field_filters() {
        let mut p = params();
        p.title = Some("love".to_string());
        p.genre = Some("rock".to_string());
        p.search = Some("imagine".to_string());
        let query = ListQuery::from_params(p).unwrap();
        assert_eq!(query.conditions.len(), 1);
    }

    #[test]
    fn test_empty_params_are_absent() {
        let mut p = params();
        p.title = Some(String::new());
        p.search = Some(String::new());
        let query = ListQuery::from_params(p).unwrap();
        assert!(query.conditions.is_empty());
    }
}
