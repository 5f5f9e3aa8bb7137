//! Normalization of upstream documents into result shapes.
//!
//! Upstream documents are parsed into lenient `Raw*` structs (every field
//! optional or defaulted) and then mapped onto the public types. Items
//! without an id are skipped; a primary detail document without a title
//! is a [`CinegateError::DataError`].

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::types::{
    CastMember, CrewInfo, CrewMember, Episode, FilmographyItem, MediaKind, MediaSummary,
    MovieDetails, PersonInfo, PersonSummary, RoleType, SearchResult, Season, TvDetails,
};
use crate::{CinegateError, Result};

const DIRECTOR_JOBS: &[&str] = &["Director"];
const COMPOSER_JOBS: &[&str] = &["Original Music Composer", "Music", "Composer"];

// ============================================================================
// Raw upstream documents
// ============================================================================

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawSearchPage {
    results: Vec<RawSearchItem>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawSearchItem {
    id: Option<u64>,
    media_type: Option<String>,
    title: Option<String>,
    name: Option<String>,
    release_date: Option<String>,
    first_air_date: Option<String>,
    poster_path: Option<String>,
    profile_path: Option<String>,
    known_for_department: Option<String>,
    popularity: Option<f64>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawNamed {
    name: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawMovie {
    title: Option<String>,
    release_date: Option<String>,
    overview: Option<String>,
    runtime: Option<u32>,
    genres: Vec<RawNamed>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawTv {
    name: Option<String>,
    first_air_date: Option<String>,
    overview: Option<String>,
    genres: Vec<RawNamed>,
    networks: Vec<RawNamed>,
    seasons: Option<Vec<RawSeason>>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawSeason {
    season_number: Option<u32>,
    name: Option<String>,
    poster_path: Option<String>,
    episode_count: Option<u32>,
    air_date: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawSeasonDetail {
    season_number: Option<u32>,
    episodes: Vec<RawEpisode>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawEpisode {
    episode_number: Option<u32>,
    season_number: Option<u32>,
    name: Option<String>,
    air_date: Option<String>,
    overview: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawCredits {
    cast: Vec<RawPersonCredit>,
    crew: Vec<RawPersonCredit>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawPersonCredit {
    id: Option<u64>,
    name: Option<String>,
    character: Option<String>,
    job: Option<String>,
    department: Option<String>,
    profile_path: Option<String>,
}

/// Movie keywords come as `keywords`, series keywords as `results`.
#[derive(Deserialize, Default)]
#[serde(default)]
struct RawKeywords {
    keywords: Option<Vec<RawNamed>>,
    results: Option<Vec<RawNamed>>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawPerson {
    id: Option<u64>,
    name: Option<String>,
    known_for_department: Option<String>,
    profile_path: Option<String>,
    biography: Option<String>,
    birthday: Option<String>,
    place_of_birth: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawCombinedCredits {
    cast: Vec<RawMediaCredit>,
    crew: Vec<RawMediaCredit>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawMediaCredit {
    id: Option<u64>,
    media_type: Option<String>,
    title: Option<String>,
    name: Option<String>,
    release_date: Option<String>,
    first_air_date: Option<String>,
    poster_path: Option<String>,
    character: Option<String>,
    job: Option<String>,
    department: Option<String>,
}

fn parse<T: DeserializeOwned>(doc: &Value) -> Result<T> {
    Ok(T::deserialize(doc)?)
}

// ============================================================================
// Field helpers
// ============================================================================

/// Year from an upstream `YYYY-MM-DD` date.
///
/// `None` for missing, empty, short or non-numeric dates.
pub fn year_from_date(date: Option<&str>) -> Option<i32> {
    let date = date?;
    let prefix = date.get(..4)?;
    if !prefix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    prefix.parse().ok()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

fn names(items: Vec<RawNamed>) -> Vec<String> {
    items.into_iter().filter_map(|n| non_empty(n.name)).collect()
}

fn media_kind(media_type: Option<&str>) -> Option<MediaKind> {
    match media_type? {
        "movie" => Some(MediaKind::Movie),
        "tv" => Some(MediaKind::Tv),
        _ => None,
    }
}

/// Release date for movies, first air date for series.
fn credit_year(
    kind: MediaKind,
    release_date: Option<&str>,
    first_air_date: Option<&str>,
) -> Option<i32> {
    match kind {
        MediaKind::Movie => year_from_date(release_date),
        MediaKind::Tv => year_from_date(first_air_date),
    }
}

// ============================================================================
// Search
// ============================================================================

/// Keep movie, series and person hits; drop everything else.
pub fn search_results(doc: &Value, max_results: usize) -> Result<Vec<SearchResult>> {
    let page: RawSearchPage = parse(doc)?;

    let results = page
        .results
        .into_iter()
        .filter_map(|item| {
            let id = item.id?;
            match item.media_type.as_deref()? {
                "movie" | "tv" => {
                    let title = non_empty(item.title).or_else(|| non_empty(item.name))?;
                    let year = year_from_date(item.release_date.as_deref())
                        .or_else(|| year_from_date(item.first_air_date.as_deref()));
                    let summary = MediaSummary {
                        id,
                        title,
                        year,
                        poster_path: item.poster_path,
                    };
                    if item.media_type.as_deref() == Some("movie") {
                        Some(SearchResult::Movie(summary))
                    } else {
                        Some(SearchResult::Tv(summary))
                    }
                }
                "person" => Some(SearchResult::Person(PersonSummary {
                    id,
                    name: non_empty(item.name)?,
                    known_for_department: item.known_for_department,
                    profile_path: item.profile_path,
                    popularity: item.popularity.unwrap_or(0.0),
                })),
                _ => None,
            }
        })
        .take(max_results)
        .collect();

    Ok(results)
}

// ============================================================================
// Details
// ============================================================================

fn cast_members(credits: &RawCredits, max_cast: usize) -> Vec<CastMember> {
    credits
        .cast
        .iter()
        .filter_map(|c| {
            Some(CastMember {
                id: c.id?,
                name: non_empty(c.name.clone())?,
                character: non_empty(c.character.clone()),
                profile_path: c.profile_path.clone(),
            })
        })
        .take(max_cast)
        .collect()
}

fn crew_with_jobs(credits: &RawCredits, jobs: &[&str]) -> Vec<CrewMember> {
    credits
        .crew
        .iter()
        .filter(|c| c.job.as_deref().is_some_and(|job| jobs.contains(&job)))
        .filter_map(|c| {
            Some(CrewMember {
                id: c.id?,
                name: non_empty(c.name.clone())?,
                job: c.job.clone(),
                department: c.department.clone(),
                profile_path: c.profile_path.clone(),
            })
        })
        .collect()
}

fn crew_info(credits: &RawCredits) -> CrewInfo {
    CrewInfo {
        directors: crew_with_jobs(credits, DIRECTOR_JOBS),
        composers: crew_with_jobs(credits, COMPOSER_JOBS),
    }
}

fn keyword_names(doc: &Value) -> Result<Vec<String>> {
    let raw: RawKeywords = parse(doc)?;
    Ok(names(raw.keywords.or(raw.results).unwrap_or_default()))
}

/// Merge the three movie sub-documents.
pub fn movie_details(
    id: u64,
    primary: &Value,
    credits: &Value,
    keywords: &Value,
    max_cast: usize,
) -> Result<MovieDetails> {
    let movie: RawMovie = parse(primary)?;
    let credits: RawCredits = parse(credits)?;

    let title = non_empty(movie.title)
        .ok_or_else(|| CinegateError::DataError(format!("movie {id} has no title")))?;

    Ok(MovieDetails {
        id,
        title,
        year: year_from_date(movie.release_date.as_deref()),
        overview: non_empty(movie.overview),
        runtime: movie.runtime,
        genres: names(movie.genres),
        keywords: keyword_names(keywords)?,
        cast: cast_members(&credits, max_cast),
        crew: crew_info(&credits),
    })
}

/// Merge the three series sub-documents.
///
/// Season and episode fields are left empty; the caller fills them from the
/// latest-season lookup.
pub fn tv_details(
    id: u64,
    primary: &Value,
    credits: &Value,
    keywords: &Value,
    max_cast: usize,
) -> Result<TvDetails> {
    let show: RawTv = parse(primary)?;
    let credits: RawCredits = parse(credits)?;

    let title = non_empty(show.name)
        .ok_or_else(|| CinegateError::DataError(format!("tv {id} has no name")))?;

    Ok(TvDetails {
        id,
        title,
        year: year_from_date(show.first_air_date.as_deref()),
        overview: non_empty(show.overview),
        network: show.networks.into_iter().find_map(|n| non_empty(n.name)),
        genres: names(show.genres),
        keywords: keyword_names(keywords)?,
        cast: cast_members(&credits, max_cast),
        crew: crew_info(&credits),
        season: None,
        episode: None,
        episode_title: None,
    })
}

/// Highest season number listed on a series document.
///
/// `None` when the `seasons` field is missing or empty.
pub fn latest_season(primary: &Value) -> Result<Option<u32>> {
    let show: RawTv = parse(primary)?;
    Ok(show
        .seasons
        .unwrap_or_default()
        .iter()
        .filter_map(|s| s.season_number)
        .max())
}

/// Number and title of the last episode in a season document.
pub fn latest_episode(season_doc: &Value) -> Result<Option<(u32, Option<String>)>> {
    let season: RawSeasonDetail = parse(season_doc)?;
    Ok(season
        .episodes
        .into_iter()
        .rev()
        .find_map(|e| Some((e.episode_number?, non_empty(e.name)))))
}

// ============================================================================
// Seasons and episodes
// ============================================================================

/// Season list of a series, without specials (season 0).
pub fn seasons(primary: &Value) -> Result<Vec<Season>> {
    let show: RawTv = parse(primary)?;
    Ok(show
        .seasons
        .unwrap_or_default()
        .into_iter()
        .filter_map(|s| {
            let season_number = s.season_number.filter(|n| *n != 0)?;
            Some(Season {
                season_number,
                name: non_empty(s.name).unwrap_or_else(|| format!("Season {season_number}")),
                poster_path: s.poster_path,
                episode_count: s.episode_count,
                air_date: non_empty(s.air_date),
            })
        })
        .collect())
}

/// Episode list of one season.
pub fn episodes(season_doc: &Value, season_number: u32) -> Result<Vec<Episode>> {
    let season: RawSeasonDetail = parse(season_doc)?;
    let fallback_season = season.season_number.unwrap_or(season_number);
    Ok(season
        .episodes
        .into_iter()
        .filter_map(|e| {
            let episode_number = e.episode_number?;
            Some(Episode {
                episode_number,
                season_number: e.season_number.unwrap_or(fallback_season),
                name: non_empty(e.name).unwrap_or_else(|| format!("Episode {episode_number}")),
                air_date: non_empty(e.air_date),
                overview: non_empty(e.overview),
            })
        })
        .collect())
}

// ============================================================================
// People
// ============================================================================

pub fn person_info(id: u64, doc: &Value) -> Result<PersonInfo> {
    let person: RawPerson = parse(doc)?;
    let name = non_empty(person.name)
        .ok_or_else(|| CinegateError::DataError(format!("person {id} has no name")))?;

    Ok(PersonInfo {
        id: person.id.unwrap_or(id),
        name,
        known_for_department: non_empty(person.known_for_department),
        profile_path: person.profile_path,
        biography: non_empty(person.biography),
        birthday: non_empty(person.birthday),
        place_of_birth: non_empty(person.place_of_birth),
    })
}

fn filmography_items(credits: Vec<RawMediaCredit>, role_type: RoleType) -> Vec<FilmographyItem> {
    credits
        .into_iter()
        .filter_map(|c| {
            let media_type = media_kind(c.media_type.as_deref())?;
            let year = credit_year(
                media_type,
                c.release_date.as_deref(),
                c.first_air_date.as_deref(),
            );
            Some(FilmographyItem {
                id: c.id?,
                media_type,
                title: non_empty(c.title).or_else(|| non_empty(c.name))?,
                year,
                poster_path: c.poster_path,
                role_type,
                character: non_empty(c.character),
                job: non_empty(c.job),
                department: non_empty(c.department),
            })
        })
        .collect()
}

/// Newest first; a missing year sorts as year 0. Stable for equal years.
pub fn sort_by_year_desc(items: &mut [FilmographyItem]) {
    items.sort_by_key(|item| std::cmp::Reverse(item.year.unwrap_or(0)));
}

/// Split combined credits into sorted, capped cast and crew lists.
pub fn filmography(
    credits_doc: &Value,
    max_items: usize,
) -> Result<(Vec<FilmographyItem>, Vec<FilmographyItem>)> {
    let credits: RawCombinedCredits = parse(credits_doc)?;

    let mut cast = filmography_items(credits.cast, RoleType::Cast);
    let mut crew = filmography_items(credits.crew, RoleType::Crew);
    sort_by_year_desc(&mut cast);
    sort_by_year_desc(&mut crew);
    cast.truncate(max_items);
    crew.truncate(max_items);

    Ok((cast, crew))
}
