use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which catalog an item belongs to.
///
/// Serialized as the gateway's type tag (`"movie"` / `"tv"`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum MediaKind {
    #[default]
    #[serde(rename = "movie")]
    Movie,
    #[serde(rename = "tv")]
    TvShow,
}

impl MediaKind {
    pub const ALL: [MediaKind; 2] = [MediaKind::Movie, MediaKind::TvShow];

    /// Wire tag, also used in trailer paths (`/api/tmdb/{tag}/{id}/trailer`)
    pub fn as_tag(&self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::TvShow => "tv",
        }
    }

    /// Human label, singular
    pub fn label(&self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::TvShow => "TV show",
        }
    }

    /// Human label, plural (tab title)
    pub fn plural_label(&self) -> &'static str {
        match self {
            MediaKind::Movie => "Movies",
            MediaKind::TvShow => "TV Shows",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

impl FromStr for MediaKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "movie" | "movies" => Ok(MediaKind::Movie),
            "tv" | "show" | "shows" | "tvshow" | "tvshows" | "tv-show" | "tv-shows" => Ok(MediaKind::TvShow),
            other => Err(format!("Unknown media kind: {}. Use 'movie' or 'tv'", other)),
        }
    }
}

/// Gateway-assigned identifier of a persisted item.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct ItemId(pub u64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ItemId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(ItemId)
    }
}

impl From<u64> for ItemId {
    fn from(value: u64) -> Self {
        ItemId(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_wire_tags() {
        assert_eq!(serde_json::to_string(&MediaKind::Movie).unwrap(), "\"movie\"");
        assert_eq!(serde_json::to_string(&MediaKind::TvShow).unwrap(), "\"tv\"");
        let kind: MediaKind = serde_json::from_str("\"tv\"").unwrap();
        assert_eq!(kind, MediaKind::TvShow);
    }

    #[test]
    fn test_kind_from_str_accepts_cli_spellings() {
        assert_eq!("Movies".parse::<MediaKind>().unwrap(), MediaKind::Movie);
        assert_eq!("tv-shows".parse::<MediaKind>().unwrap(), MediaKind::TvShow);
        assert!("music".parse::<MediaKind>().is_err());
    }

    #[test]
    fn test_item_id_is_transparent_number() {
        let id: ItemId = serde_json::from_str("42").unwrap();
        assert_eq!(id, ItemId(42));
        assert_eq!(serde_json::to_string(&id).unwrap(), "42");
        assert_eq!(" 7 ".parse::<ItemId>().unwrap(), ItemId(7));
    }
}
