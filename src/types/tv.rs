use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Season {
    pub season_number: u32,
    pub name: String,
    pub poster_path: Option<String>,
    pub episode_count: Option<u32>,
    pub air_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub episode_number: u32,
    pub season_number: u32,
    pub name: String,
    pub air_date: Option<String>,
    pub overview: Option<String>,
}
