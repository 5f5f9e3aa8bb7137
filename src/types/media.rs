//! Media kinds and search results.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CinegateError;

/// Kind of titled media the upstream API knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Movie,
    Tv,
}

impl MediaKind {
    /// Upstream path segment and wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::Tv => "tv",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaKind {
    type Err = CinegateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "movie" => Ok(MediaKind::Movie),
            "tv" => Ok(MediaKind::Tv),
            other => Err(CinegateError::InvalidInput(format!(
                "unknown media type '{other}' (expected 'movie' or 'tv')"
            ))),
        }
    }
}

/// A movie or series hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaSummary {
    pub id: u64,
    pub title: String,
    pub year: Option<i32>,
    pub poster_path: Option<String>,
}

/// A person hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonSummary {
    pub id: u64,
    pub name: String,
    pub known_for_department: Option<String>,
    pub profile_path: Option<String>,
    pub popularity: f64,
}

/// One entry of a multi search, tagged by `media_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "media_type", rename_all = "lowercase")]
pub enum SearchResult {
    Movie(MediaSummary),
    Tv(MediaSummary),
    Person(PersonSummary),
}

impl SearchResult {
    pub fn id(&self) -> u64 {
        match self {
            SearchResult::Movie(m) | SearchResult::Tv(m) => m.id,
            SearchResult::Person(p) => p.id,
        }
    }

    /// Title for media, name for people.
    pub fn display_name(&self) -> &str {
        match self {
            SearchResult::Movie(m) | SearchResult::Tv(m) => &m.title,
            SearchResult::Person(p) => &p.name,
        }
    }

    /// Media kind, or `None` for people.
    pub fn media_kind(&self) -> Option<MediaKind> {
        match self {
            SearchResult::Movie(_) => Some(MediaKind::Movie),
            SearchResult::Tv(_) => Some(MediaKind::Tv),
            SearchResult::Person(_) => None,
        }
    }

    pub fn year(&self) -> Option<i32> {
        match self {
            SearchResult::Movie(m) | SearchResult::Tv(m) => m.year,
            SearchResult::Person(_) => None,
        }
    }
}
