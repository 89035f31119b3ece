use serde::{Deserialize, Serialize};
use crate::item::deserialize_year_lenient;

const YOUTUBE_EMBED_BASE: &str = "https://www.youtube.com/embed/";

/// First hit of a metadata-provider search (`/api/tmdb/search`, `/api/tmdb/search/tv`)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetadataMatch {
    /// Provider id, stored on items as `tmdb_id`
    pub id: u64,
    pub title: String,
    #[serde(default, deserialize_with = "deserialize_year_lenient")]
    pub year: Option<i32>,
    #[serde(default)]
    pub poster_url: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
}

/// Video reference returned by the trailer endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Trailer {
    pub key: String,
    #[serde(default = "default_site")]
    pub site: String,
}

fn default_site() -> String {
    "YouTube".to_string()
}

impl Trailer {
    /// Embeddable player URL for the video key
    pub fn embed_url(&self) -> String {
        format!("{}{}", YOUTUBE_EMBED_BASE, self.key)
    }
}
