//! Person profile and filmography.

use serde::{Deserialize, Serialize};

use super::MediaKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonInfo {
    pub id: u64,
    pub name: String,
    pub known_for_department: Option<String>,
    pub profile_path: Option<String>,
    pub biography: Option<String>,
    pub birthday: Option<String>,
    pub place_of_birth: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleType {
    Cast,
    Crew,
}

/// One credit in a filmography.
///
/// `character` is set for cast credits, `job`/`department` for crew credits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilmographyItem {
    pub id: u64,
    pub media_type: MediaKind,
    pub title: String,
    pub year: Option<i32>,
    pub poster_path: Option<String>,
    pub role_type: RoleType,
    pub character: Option<String>,
    pub job: Option<String>,
    pub department: Option<String>,
}

/// Person profile with credits sorted newest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonFilmography {
    pub person: PersonInfo,
    pub cast: Vec<FilmographyItem>,
    pub crew: Vec<FilmographyItem>,
}
