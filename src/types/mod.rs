//! Result shapes returned by the gateway.

pub mod details;
pub mod media;
pub mod person;
pub mod tv;

pub use details::{CastMember, CrewInfo, CrewMember, MediaDetails, MovieDetails, TvDetails};
pub use media::{MediaKind, MediaSummary, PersonSummary, SearchResult};
pub use person::{FilmographyItem, PersonFilmography, PersonInfo, RoleType};
pub use tv::{Episode, Season};
