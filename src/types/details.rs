//! Composite detail records.

use serde::{Deserialize, Serialize};

use super::MediaKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CastMember {
    pub id: u64,
    pub name: String,
    pub character: Option<String>,
    pub profile_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrewMember {
    pub id: u64,
    pub name: String,
    pub job: Option<String>,
    pub department: Option<String>,
    pub profile_path: Option<String>,
}

/// Crew roles surfaced in detail views.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CrewInfo {
    pub directors: Vec<CrewMember>,
    pub composers: Vec<CrewMember>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieDetails {
    pub id: u64,
    pub title: String,
    pub year: Option<i32>,
    pub overview: Option<String>,
    pub runtime: Option<u32>,
    pub genres: Vec<String>,
    pub keywords: Vec<String>,
    pub cast: Vec<CastMember>,
    pub crew: CrewInfo,
}

/// Series details.
///
/// `season` is the highest season number listed upstream. `episode` and
/// `episode_title` describe the last episode of that season; they are `None`
/// when the season lookup failed or the show lists no seasons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TvDetails {
    pub id: u64,
    pub title: String,
    pub year: Option<i32>,
    pub overview: Option<String>,
    pub network: Option<String>,
    pub genres: Vec<String>,
    pub keywords: Vec<String>,
    pub cast: Vec<CastMember>,
    pub crew: CrewInfo,
    pub season: Option<u32>,
    pub episode: Option<u32>,
    pub episode_title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "media_type", rename_all = "lowercase")]
pub enum MediaDetails {
    Movie(MovieDetails),
    Tv(TvDetails),
}

impl MediaDetails {
    pub fn kind(&self) -> MediaKind {
        match self {
            MediaDetails::Movie(_) => MediaKind::Movie,
            MediaDetails::Tv(_) => MediaKind::Tv,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            MediaDetails::Movie(m) => &m.title,
            MediaDetails::Tv(t) => &t.title,
        }
    }

    pub fn cast(&self) -> &[CastMember] {
        match self {
            MediaDetails::Movie(m) => &m.cast,
            MediaDetails::Tv(t) => &t.cast,
        }
    }
}
