//! Core MediaService trait

use async_trait::async_trait;

use crate::{
    Episode, MediaDetails, MediaGateway, MediaKind, PersonFilmography, Result, SearchResult, Season,
};

/// The logical operations a routing layer calls.
///
/// [`MediaGateway`] is the production implementation. Routing code that
/// takes `&dyn MediaService` can be tested against a hand-written fake.
#[async_trait]
pub trait MediaService: Send + Sync {
    /// Multi search over movies, series and people.
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>>;

    /// Composite detail record for a movie or series.
    async fn detail(&self, id: u64, kind: MediaKind) -> Result<MediaDetails>;

    /// Season list of a series
    async fn seasons(&self, id: u64) -> Result<Vec<Season>>;

    /// Episode list of one season
    async fn episodes(&self, id: u64, season: u32) -> Result<Vec<Episode>>;

    /// Person profile with credits sorted newest first.
    async fn person_filmography(&self, person_id: u64) -> Result<PersonFilmography>;
}

#[async_trait]
impl MediaService for MediaGateway {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        MediaGateway::search(self, query).await
    }

    async fn detail(&self, id: u64, kind: MediaKind) -> Result<MediaDetails> {
        MediaGateway::detail(self, id, kind).await
    }

    async fn seasons(&self, id: u64) -> Result<Vec<Season>> {
        MediaGateway::seasons(self, id).await
    }

    async fn episodes(&self, id: u64, season: u32) -> Result<Vec<Episode>> {
        MediaGateway::episodes(self, id, season).await
    }

    async fn person_filmography(&self, person_id: u64) -> Result<PersonFilmography> {
        MediaGateway::person_filmography(self, person_id).await
    }
}
