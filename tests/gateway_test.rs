//! MediaGateway tests against a scripted in-memory transport.
//!
//! Tests that involve retries or fan-out timing run on a paused tokio clock.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use cinegate::{
    Cinegate, CinegateError, GatewayConfig, MediaDetails, MediaGateway, MediaKind, MediaService,
    Result, RoleType, SearchResult, Transport, UpstreamResponse, build_key,
};
use serde_json::{Value, json};
use tokio::time::Instant;

// ============================================================================
// Scripted transport
// ============================================================================

/// Replies per path are consumed in order; the last one repeats.
/// Unknown paths answer 404.
struct MockTransport {
    routes: Mutex<HashMap<String, VecDeque<UpstreamResponse>>>,
    calls: Mutex<Vec<(String, Vec<(String, String)>)>>,
    delay: Duration,
}

impl MockTransport {
    fn new() -> Self {
        Self {
            routes: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            delay: Duration::ZERO,
        }
    }

    fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::new()
        }
    }

    fn reply(self, path: &str, status: u16, body: Value) -> Self {
        self.routes
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .push_back(UpstreamResponse { status, body });
        self
    }

    fn ok(self, path: &str, body: Value) -> Self {
        self.reply(path, 200, body)
    }

    fn calls_to(&self, path: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(p, _)| p == path)
            .count()
    }

    fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn last_query(&self) -> Vec<(String, String)> {
        self.calls
            .lock()
            .unwrap()
            .last()
            .map(|(_, q)| q.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(
        &self,
        path: &str,
        query: &[(String, String)],
        _timeout: Duration,
    ) -> Result<UpstreamResponse> {
        self.calls
            .lock()
            .unwrap()
            .push((path.to_string(), query.to_vec()));

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let mut routes = self.routes.lock().unwrap();
        let reply = match routes.get_mut(path) {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        };
        Ok(reply.unwrap_or_else(|| UpstreamResponse {
            status: 404,
            body: json!({"status_code": 34, "status_message": "The resource you requested could not be found."}),
        }))
    }
}

fn gateway(transport: &Arc<MockTransport>) -> MediaGateway {
    gateway_with(transport, GatewayConfig::default())
}

fn gateway_with(transport: &Arc<MockTransport>, config: GatewayConfig) -> MediaGateway {
    Cinegate::builder()
        .api_key("test_key")
        .config(config)
        .transport(transport.clone())
        .build()
        .expect("gateway should build")
}

// ============================================================================
// Fixtures
// ============================================================================

fn inception_search() -> Value {
    json!({
        "page": 1,
        "results": [
            {"id": 27205, "media_type": "movie", "title": "Inception", "release_date": "2010-07-15", "poster_path": "/inception.jpg"},
            {"id": 9999, "media_type": "collection", "name": "Inception Collection"},
            {"id": 525, "media_type": "person", "name": "Christopher Nolan", "known_for_department": "Directing", "popularity": 12.5},
            {"id": 77, "media_type": "tv", "name": "Inception: The Series", "first_air_date": "2019-01-01"},
            {"media_type": "movie", "title": "No id"}
        ]
    })
}

fn movie_primary() -> Value {
    json!({
        "id": 27205,
        "title": "Inception",
        "release_date": "2010-07-15",
        "overview": "A thief who steals corporate secrets...",
        "runtime": 148,
        "genres": [{"id": 28, "name": "Action"}, {"id": 878, "name": "Science Fiction"}]
    })
}

fn credits() -> Value {
    let cast: Vec<Value> = (0..20)
        .map(|i| json!({"id": 100 + i, "name": format!("Actor {i}"), "character": format!("Role {i}")}))
        .collect();
    json!({
        "cast": cast,
        "crew": [
            {"id": 525, "name": "Christopher Nolan", "job": "Director", "department": "Directing"},
            {"id": 947, "name": "Hans Zimmer", "job": "Original Music Composer", "department": "Sound"},
            {"id": 1, "name": "Someone Else", "job": "Editor", "department": "Editing"}
        ]
    })
}

fn movie_keywords() -> Value {
    json!({"id": 27205, "keywords": [{"id": 1, "name": "dream"}, {"id": 2, "name": "heist"}]})
}

fn tv_primary(seasons: Option<Value>) -> Value {
    let mut doc = json!({
        "id": 1399,
        "name": "Game of Thrones",
        "first_air_date": "2011-04-17",
        "networks": [{"id": 49, "name": "HBO"}],
        "genres": [{"name": "Drama"}]
    });
    if let Some(seasons) = seasons {
        doc["seasons"] = seasons;
    }
    doc
}

fn got_seasons() -> Value {
    json!([
        {"season_number": 0, "name": "Specials", "episode_count": 14},
        {"season_number": 1, "name": "Season 1", "episode_count": 10, "air_date": "2011-04-17"},
        {"season_number": 8, "name": "Season 8", "episode_count": 6, "air_date": "2019-04-14"}
    ])
}

fn season_8() -> Value {
    json!({
        "season_number": 8,
        "episodes": [
            {"episode_number": 1, "name": "Winterfell"},
            {"episode_number": 6, "name": "The Iron Throne", "air_date": "2019-05-19"}
        ]
    })
}

fn tv_transport(seasons: Option<Value>) -> MockTransport {
    MockTransport::new()
        .ok("/tv/1399", tv_primary(seasons))
        .ok("/tv/1399/credits", credits())
        .ok("/tv/1399/keywords", json!({"results": [{"name": "dragon"}]}))
}

// ============================================================================
// Search
// ============================================================================

#[tokio::test]
async fn search_keeps_movies_series_and_people() {
    let transport = Arc::new(MockTransport::new().ok("/search/multi", inception_search()));
    let gateway = gateway(&transport);

    let results = gateway.search("Inception").await.unwrap();

    assert_eq!(results.len(), 3);
    match &results[0] {
        SearchResult::Movie(movie) => {
            assert_eq!(movie.id, 27205);
            assert_eq!(movie.title, "Inception");
            assert_eq!(movie.year, Some(2010));
        }
        other => panic!("expected movie, got {other:?}"),
    }
    assert!(matches!(&results[1], SearchResult::Person(p) if p.name == "Christopher Nolan"));
    assert_eq!(results[2].media_kind(), Some(MediaKind::Tv));
    assert_eq!(results[2].year(), Some(2019));
}

#[tokio::test]
async fn search_sends_query_and_credential() {
    let transport = Arc::new(MockTransport::new().ok("/search/multi", inception_search()));
    let gateway = gateway(&transport);

    gateway.search("  Inception ").await.unwrap();

    let query = transport.last_query();
    assert!(query.contains(&("query".to_string(), "Inception".to_string())));
    assert!(query.contains(&("api_key".to_string(), "test_key".to_string())));
}

#[tokio::test]
async fn search_caps_results() {
    let many: Vec<Value> = (1..=30)
        .map(|i| json!({"id": i, "media_type": "movie", "title": format!("Movie {i}")}))
        .collect();
    let transport = Arc::new(MockTransport::new().ok("/search/multi", json!({"results": many})));
    let mut config = GatewayConfig::default();
    config.limits.max_search_results = 5;
    let gateway = gateway_with(&transport, config);

    assert_eq!(gateway.search("movie").await.unwrap().len(), 5);
}

#[tokio::test]
async fn empty_query_is_rejected_without_upstream_call() {
    let transport = Arc::new(MockTransport::new());
    let gateway = gateway(&transport);

    let err = gateway.search("   ").await.unwrap_err();

    assert!(matches!(err, CinegateError::InvalidInput(_)));
    assert_eq!(transport.total_calls(), 0);
}

// ============================================================================
// Caching
// ============================================================================

#[tokio::test]
async fn repeated_search_is_served_from_cache() {
    let transport = Arc::new(MockTransport::new().ok("/search/multi", inception_search()));
    let gateway = gateway(&transport);

    let first = gateway.search("Inception").await.unwrap();
    let second = gateway.search("Inception").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(transport.calls_to("/search/multi"), 1);

    let stats = gateway.stats();
    assert_eq!(stats.cache.hits, 1);
    assert_eq!(stats.cache.misses, 1);
    assert_eq!(stats.performance.total_requests, 2);

    let endpoint = gateway.endpoint_stats("/search/multi");
    assert_eq!(endpoint.count, 2);
    assert_eq!(endpoint.durations.unwrap().cached_requests, 1);
}

#[tokio::test]
async fn cache_key_excludes_the_credential() {
    let transport = Arc::new(MockTransport::new().ok("/search/multi", inception_search()));
    let gateway = gateway(&transport);

    gateway.search("Inception").await.unwrap();

    let key = build_key("/search/multi", &[("query", "Inception")]);
    assert!(gateway.cache().contains(&key));
}

#[tokio::test]
async fn failures_are_not_cached() {
    let transport = Arc::new(
        MockTransport::new()
            .reply("/search/multi", 400, json!({"status_message": "bad query"}))
            .ok("/search/multi", inception_search()),
    );
    let gateway = gateway(&transport);

    assert!(gateway.search("Inception").await.is_err());
    assert!(gateway.search("Inception").await.is_ok());
    assert_eq!(transport.calls_to("/search/multi"), 2);
}

#[tokio::test]
async fn clear_cache_forces_refetch() {
    let transport = Arc::new(MockTransport::new().ok("/search/multi", inception_search()));
    let gateway = gateway(&transport);

    gateway.search("Inception").await.unwrap();
    assert_eq!(gateway.clear_cache(), 1);
    gateway.search("Inception").await.unwrap();

    assert_eq!(transport.calls_to("/search/multi"), 2);
}

// ============================================================================
// Detail
// ============================================================================

#[tokio::test]
async fn movie_detail_merges_three_documents() {
    let transport = Arc::new(
        MockTransport::new()
            .ok("/movie/27205", movie_primary())
            .ok("/movie/27205/credits", credits())
            .ok("/movie/27205/keywords", movie_keywords()),
    );
    let gateway = gateway(&transport);

    let details = gateway.detail(27205, MediaKind::Movie).await.unwrap();

    let MediaDetails::Movie(movie) = details else {
        panic!("expected movie details");
    };
    assert_eq!(movie.title, "Inception");
    assert_eq!(movie.year, Some(2010));
    assert_eq!(movie.runtime, Some(148));
    assert_eq!(movie.genres, vec!["Action", "Science Fiction"]);
    assert_eq!(movie.keywords, vec!["dream", "heist"]);
    assert_eq!(movie.cast.len(), 15, "cast is capped");
    assert_eq!(movie.crew.directors[0].name, "Christopher Nolan");
    assert_eq!(movie.crew.composers[0].name, "Hans Zimmer");
    assert_eq!(transport.total_calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn detail_sub_calls_run_concurrently() {
    let transport = Arc::new(
        MockTransport::with_delay(Duration::from_secs(1))
            .ok("/movie/27205", movie_primary())
            .ok("/movie/27205/credits", credits())
            .ok("/movie/27205/keywords", movie_keywords()),
    );
    let gateway = gateway(&transport);
    let start = Instant::now();

    gateway.detail(27205, MediaKind::Movie).await.unwrap();

    assert!(
        start.elapsed() < Duration::from_secs(2),
        "three 1s calls should overlap, took {:?}",
        start.elapsed()
    );
}

#[tokio::test]
async fn tv_detail_includes_latest_episode() {
    let transport =
        Arc::new(tv_transport(Some(got_seasons())).ok("/tv/1399/season/8", season_8()));
    let gateway = gateway(&transport);

    let details = gateway.detail(1399, MediaKind::Tv).await.unwrap();

    let MediaDetails::Tv(tv) = details else {
        panic!("expected tv details");
    };
    assert_eq!(tv.title, "Game of Thrones");
    assert_eq!(tv.year, Some(2011));
    assert_eq!(tv.network.as_deref(), Some("HBO"));
    assert_eq!(tv.keywords, vec!["dragon"]);
    assert_eq!(tv.season, Some(8));
    assert_eq!(tv.episode, Some(6));
    assert_eq!(tv.episode_title.as_deref(), Some("The Iron Throne"));
}

#[tokio::test]
async fn tv_without_seasons_skips_season_lookup() {
    let transport = Arc::new(tv_transport(None));
    let gateway = gateway(&transport);

    let details = gateway.detail(1399, MediaKind::Tv).await.unwrap();

    let MediaDetails::Tv(tv) = details else {
        panic!("expected tv details");
    };
    assert_eq!(tv.season, None);
    assert_eq!(tv.episode, None);
    assert_eq!(tv.episode_title, None);
    assert_eq!(transport.total_calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn season_lookup_failure_is_tolerated() {
    let transport = Arc::new(
        tv_transport(Some(got_seasons())).reply(
            "/tv/1399/season/8",
            503,
            json!({"status_message": "down"}),
        ),
    );
    let gateway = gateway(&transport);

    let details = gateway.detail(1399, MediaKind::Tv).await.unwrap();

    let MediaDetails::Tv(tv) = details else {
        panic!("expected tv details");
    };
    assert_eq!(tv.season, Some(8));
    assert_eq!(tv.episode, None);
    assert_eq!(tv.episode_title, None);
    // One attempt plus three retries.
    assert_eq!(transport.calls_to("/tv/1399/season/8"), 4);
    assert_eq!(gateway.stats().performance.error_requests, 1);
}

#[tokio::test]
async fn failed_sub_call_fails_the_detail() {
    let transport = Arc::new(
        MockTransport::new()
            .ok("/movie/27205", movie_primary())
            .ok("/movie/27205/keywords", movie_keywords()),
    );
    let gateway = gateway(&transport);

    let err = gateway.detail(27205, MediaKind::Movie).await.unwrap_err();

    match &err {
        CinegateError::Operation {
            operation,
            target,
            source,
        } => {
            assert_eq!(*operation, "detail");
            assert_eq!(target, "movie 27205");
            assert!(matches!(**source, CinegateError::ClientError { status: 404, .. }));
        }
        other => panic!("expected Operation error, got {other:?}"),
    }
    assert_eq!(err.status_code(), Some(404));
}

#[tokio::test]
async fn primary_without_title_is_a_data_error() {
    let transport = Arc::new(
        MockTransport::new()
            .ok("/movie/1", json!({"id": 1}))
            .ok("/movie/1/credits", credits())
            .ok("/movie/1/keywords", movie_keywords()),
    );
    let gateway = gateway(&transport);

    let err = gateway.detail(1, MediaKind::Movie).await.unwrap_err();
    let CinegateError::Operation { source, .. } = err else {
        panic!("expected Operation error");
    };
    assert!(matches!(*source, CinegateError::DataError(_)));
}

// ============================================================================
// Retry and status classification through the gateway
// ============================================================================

#[tokio::test(start_paused = true)]
async fn rate_limited_search_is_retried() {
    let transport = Arc::new(
        MockTransport::new()
            .reply("/search/multi", 429, json!({"status_message": "slow down"}))
            .reply("/search/multi", 429, json!({"status_message": "slow down"}))
            .ok("/search/multi", inception_search()),
    );
    let gateway = gateway(&transport);
    let start = Instant::now();

    let results = gateway.search("Inception").await.unwrap();

    assert_eq!(results.len(), 3);
    assert_eq!(transport.calls_to("/search/multi"), 3);
    // 1s + 2s of backoff
    assert!(start.elapsed() >= Duration::from_secs(3));
}

#[tokio::test]
async fn invalid_credential_is_not_retried() {
    let transport = Arc::new(MockTransport::new().reply(
        "/search/multi",
        401,
        json!({"status_code": 7, "status_message": "Invalid API key"}),
    ));
    let gateway = gateway(&transport);

    let err = gateway.search("Inception").await.unwrap_err();

    assert_eq!(err.status_code(), Some(401));
    assert_eq!(transport.total_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn exhausted_retries_surface_with_operation_context() {
    let transport = Arc::new(
        MockTransport::new()
            .reply("/person/6193", 500, json!({"status_message": "internal error"}))
            .ok("/person/6193/combined_credits", json!({"cast": [], "crew": []})),
    );
    let gateway = gateway(&transport);

    let err = gateway.person_filmography(6193).await.unwrap_err();

    let CinegateError::Operation {
        operation, source, ..
    } = err
    else {
        panic!("expected Operation error");
    };
    assert_eq!(operation, "person_filmography");
    assert!(matches!(
        *source,
        CinegateError::RetriesExhausted { attempts: 4, .. }
    ));
}

// ============================================================================
// Seasons and episodes
// ============================================================================

#[tokio::test]
async fn seasons_exclude_specials() {
    let transport = Arc::new(tv_transport(Some(got_seasons())));
    let gateway = gateway(&transport);

    let seasons = gateway.seasons(1399).await.unwrap();

    let numbers: Vec<u32> = seasons.iter().map(|s| s.season_number).collect();
    assert_eq!(numbers, vec![1, 8]);
    assert_eq!(seasons[1].episode_count, Some(6));
}

#[tokio::test]
async fn seasons_and_detail_share_the_primary_document() {
    let transport = Arc::new(tv_transport(None));
    let gateway = gateway(&transport);

    gateway.detail(1399, MediaKind::Tv).await.unwrap();
    gateway.seasons(1399).await.unwrap();

    assert_eq!(transport.calls_to("/tv/1399"), 1);
}

#[tokio::test]
async fn episodes_list_one_season() {
    let transport = Arc::new(MockTransport::new().ok("/tv/1399/season/8", season_8()));
    let gateway = gateway(&transport);

    let episodes = gateway.episodes(1399, 8).await.unwrap();

    assert_eq!(episodes.len(), 2);
    assert_eq!(episodes[1].episode_number, 6);
    assert_eq!(episodes[1].season_number, 8);
    assert_eq!(episodes[1].name, "The Iron Throne");
}

#[tokio::test]
async fn unknown_series_is_wrapped_client_error() {
    let transport = Arc::new(MockTransport::new());
    let gateway = gateway(&transport);

    let err = gateway.seasons(42).await.unwrap_err();
    assert!(err.to_string().starts_with("seasons failed for tv 42"));
}

// ============================================================================
// Person filmography
// ============================================================================

fn filmography_transport() -> MockTransport {
    MockTransport::new()
        .ok(
            "/person/6193",
            json!({"id": 6193, "name": "Leonardo DiCaprio", "known_for_department": "Acting"}),
        )
        .ok(
            "/person/6193/combined_credits",
            json!({
                "cast": [
                    {"id": 1, "media_type": "movie", "title": "Untitled Project"},
                    {"id": 27205, "media_type": "movie", "title": "Inception", "release_date": "2010-07-15", "character": "Cobb"},
                    {"id": 2, "media_type": "tv", "name": "Some Series", "first_air_date": "2015-03-01", "release_date": "1990-01-01"},
                    {"id": 3, "media_type": "person", "name": "Not media"}
                ],
                "crew": [
                    {"id": 4, "media_type": "movie", "title": "Produced Film", "release_date": "2019-01-01", "job": "Producer", "department": "Production"}
                ]
            }),
        )
}

#[tokio::test]
async fn filmography_sorts_newest_first_with_missing_years_last() {
    let transport = Arc::new(filmography_transport());
    let gateway = gateway(&transport);

    let filmography = gateway.person_filmography(6193).await.unwrap();

    assert_eq!(filmography.person.name, "Leonardo DiCaprio");

    let cast: Vec<(&str, Option<i32>)> = filmography
        .cast
        .iter()
        .map(|c| (c.title.as_str(), c.year))
        .collect();
    assert_eq!(
        cast,
        vec![
            ("Some Series", Some(2015)),
            ("Inception", Some(2010)),
            ("Untitled Project", None),
        ]
    );
    assert_eq!(filmography.cast[1].character.as_deref(), Some("Cobb"));

    assert_eq!(filmography.crew.len(), 1);
    assert_eq!(filmography.crew[0].role_type, RoleType::Crew);
    assert_eq!(filmography.crew[0].job.as_deref(), Some("Producer"));
}

#[tokio::test]
async fn filmography_fetches_profile_and_credits() {
    let transport = Arc::new(filmography_transport());
    let gateway = gateway(&transport);

    gateway.person_filmography(6193).await.unwrap();

    assert_eq!(transport.calls_to("/person/6193"), 1);
    assert_eq!(transport.calls_to("/person/6193/combined_credits"), 1);
}

// ============================================================================
// Health and maintenance
// ============================================================================

#[tokio::test(start_paused = true)]
async fn health_reports_valid_credentials() {
    let transport = Arc::new(MockTransport::new().ok("/configuration", json!({"images": {}})));
    let gateway = gateway(&transport);

    let report = gateway.health().await;

    assert!(report.is_healthy());
    assert_eq!(report.status, "healthy");
    assert!(report.error.is_none());
    assert_eq!(report.available_tokens, 39.0);

    let json = serde_json::to_string(&report).unwrap();
    assert!(!json.contains("test_key"), "credential must not leak");
}

#[tokio::test]
async fn validate_credentials_bypasses_the_cache() {
    let transport = Arc::new(MockTransport::new().ok("/configuration", json!({})));
    let gateway = gateway(&transport);

    assert!(gateway.validate_credentials().await.unwrap());
    assert!(gateway.validate_credentials().await.unwrap());

    assert_eq!(transport.calls_to("/configuration"), 2);
    assert!(gateway.cache().is_empty());
}

#[tokio::test]
async fn rejected_credential_is_unhealthy() {
    let transport = Arc::new(MockTransport::new().reply(
        "/configuration",
        401,
        json!({"status_message": "Invalid API key"}),
    ));
    let gateway = gateway(&transport);

    assert!(!gateway.validate_credentials().await.unwrap());

    let report = gateway.health().await;
    assert!(!report.is_healthy());
    assert_eq!(report.status, "unhealthy");
}

#[tokio::test]
async fn forbidden_keeps_its_status() {
    let transport = Arc::new(
        MockTransport::new()
            .reply(
                "/movie/27205",
                403,
                json!({"status_message": "Access denied"}),
            )
            .ok("/movie/27205/credits", json!({"cast": [], "crew": []}))
            .ok("/movie/27205/keywords", json!({"keywords": []})),
    );
    let gateway = gateway(&transport);

    let err = gateway.detail(27205, MediaKind::Movie).await.unwrap_err();
    assert_eq!(err.status_code(), Some(403));
    assert_eq!(transport.calls_to("/movie/27205"), 1);
}

#[tokio::test(start_paused = true)]
async fn cache_janitor_removes_expired_entries_and_stops_with_gateway() {
    let transport = Arc::new(MockTransport::new().ok("/search/multi", inception_search()));
    let mut config = GatewayConfig::default();
    config.cache.ttl_minutes = 1.0;
    let gateway = Arc::new(gateway_with(&transport, config));

    let janitor = gateway.spawn_cache_janitor(Duration::from_secs(10));
    gateway.search("Inception").await.unwrap();
    assert_eq!(gateway.cache().len(), 1);

    tokio::time::sleep(Duration::from_secs(75)).await;
    assert_eq!(gateway.cache().len(), 0);
    assert_eq!(gateway.stats().cache.expirations, 1);

    drop(gateway);
    tokio::time::timeout(Duration::from_secs(60), janitor)
        .await
        .expect("janitor should stop after the gateway is dropped")
        .unwrap();
}

#[tokio::test]
async fn gateway_is_usable_as_media_service() {
    let transport = Arc::new(MockTransport::new().ok("/search/multi", inception_search()));
    let service: Box<dyn MediaService> = Box::new(gateway(&transport));

    let results = service.search("Inception").await.unwrap();
    assert_eq!(results[0].display_name(), "Inception");
}
