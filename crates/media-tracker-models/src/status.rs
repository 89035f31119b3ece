use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Watch status of an item.
///
/// Wire strings follow the catalog service (`"Want to Watch"`, `"Watching"`, `"Watched"`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum WatchStatus {
    /// Planned, not started
    #[default]
    #[serde(rename = "Want to Watch")]
    WantToWatch,
    /// In progress
    Watching,
    /// Finished
    Watched,
}

impl WatchStatus {
    pub const ALL: [WatchStatus; 3] = [WatchStatus::WantToWatch, WatchStatus::Watching, WatchStatus::Watched];

    pub fn as_str(&self) -> &'static str {
        match self {
            WatchStatus::WantToWatch => "Want to Watch",
            WatchStatus::Watching => "Watching",
            WatchStatus::Watched => "Watched",
        }
    }
}

impl fmt::Display for WatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WatchStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let folded: String = s
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        match folded.as_str() {
            "wanttowatch" | "want" | "planned" => Ok(WatchStatus::WantToWatch),
            "watching" => Ok(WatchStatus::Watching),
            "watched" => Ok(WatchStatus::Watched),
            _ => Err(format!(
                "Invalid status: {}. Use 'Want to Watch', 'Watching', or 'Watched'",
                s
            )),
        }
    }
}

/// Lenient decoding used for gateway payloads: a missing, null, or unknown
/// status becomes `WantToWatch` so no item is ever left without one.
pub fn deserialize_status_lenient<'de, D>(deserializer: D) -> Result<WatchStatus, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw
        .as_deref()
        .and_then(|s| s.parse().ok())
        .unwrap_or_default())
}

/// Category selector of the list filter: everything, or one exact status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StatusCategory {
    #[default]
    All,
    Only(WatchStatus),
}

impl StatusCategory {
    pub fn matches(&self, status: WatchStatus) -> bool {
        match self {
            StatusCategory::All => true,
            StatusCategory::Only(wanted) => *wanted == status,
        }
    }
}

impl fmt::Display for StatusCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusCategory::All => f.write_str("all"),
            StatusCategory::Only(status) => status.fmt(f),
        }
    }
}

impl FromStr for StatusCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(StatusCategory::All);
        }
        s.parse::<WatchStatus>().map(StatusCategory::Only)
    }
}

impl From<WatchStatus> for StatusCategory {
    fn from(status: WatchStatus) -> Self {
        StatusCategory::Only(status)
    }
}

impl Serialize for StatusCategory {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for StatusCategory {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
