//! Logical upstream resources.

use crate::types::MediaKind;

/// An upstream endpoint together with its path parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    SearchMulti,
    Details(MediaKind, u64),
    Credits(MediaKind, u64),
    Keywords(MediaKind, u64),
    TvSeason(u64, u32),
    Person(u64),
    PersonCombinedCredits(u64),
    /// Cheap authenticated endpoint used to validate the credential.
    Configuration,
}

impl Resource {
    /// Path relative to the upstream base URL.
    pub fn path(&self) -> String {
        match self {
            Resource::SearchMulti => "/search/multi".to_string(),
            Resource::Details(kind, id) => format!("/{kind}/{id}"),
            Resource::Credits(kind, id) => format!("/{kind}/{id}/credits"),
            Resource::Keywords(kind, id) => format!("/{kind}/{id}/keywords"),
            Resource::TvSeason(id, season) => format!("/tv/{id}/season/{season}"),
            Resource::Person(id) => format!("/person/{id}"),
            Resource::PersonCombinedCredits(id) => format!("/person/{id}/combined_credits"),
            Resource::Configuration => "/configuration".to_string(),
        }
    }

    /// Low-cardinality name for metric labels.
    pub fn name(&self) -> &'static str {
        match self {
            Resource::SearchMulti => "search_multi",
            Resource::Details(MediaKind::Movie, _) => "movie",
            Resource::Details(MediaKind::Tv, _) => "tv",
            Resource::Credits(MediaKind::Movie, _) => "movie_credits",
            Resource::Credits(MediaKind::Tv, _) => "tv_credits",
            Resource::Keywords(MediaKind::Movie, _) => "movie_keywords",
            Resource::Keywords(MediaKind::Tv, _) => "tv_keywords",
            Resource::TvSeason(..) => "tv_season",
            Resource::Person(_) => "person",
            Resource::PersonCombinedCredits(_) => "person_combined_credits",
            Resource::Configuration => "configuration",
        }
    }
}
