use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use crate::form::ItemForm;
use crate::media::{ItemId, MediaKind};
use crate::status::{deserialize_status_lenient, WatchStatus};

/// A movie or TV show tracked by the user, as returned by the catalog service.
///
/// `id` is the identity inside a store. Recommendations arrive without one and
/// are keyed by [`normalize_title`] until accepted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Item {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ItemId>,
    pub title: String,
    #[serde(default, deserialize_with = "deserialize_year_lenient")]
    pub year: Option<i32>,
    #[serde(default)]
    pub poster_url: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    /// 0-5 stars
    #[serde(default)]
    pub rating: Option<f32>,
    #[serde(default, deserialize_with = "deserialize_status_lenient")]
    pub status: WatchStatus,
    /// Free-text recommendation note
    #[serde(default)]
    pub recommendation: Option<String>,
    /// Missing on some endpoints; stores stamp their own kind after decoding
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<MediaKind>,
    /// Metadata provider id (weak reference, lets trailer lookup skip a search)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tmdb_id: Option<u64>,
    #[serde(default, deserialize_with = "deserialize_timestamp_lenient", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_timestamp_lenient", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Item {
    /// Unpersisted item built from a form, used for optimistic local inserts
    pub fn from_form(form: &ItemForm) -> Self {
        Self {
            id: None,
            title: form.title.clone(),
            year: form.year,
            poster_url: form.poster_url.clone(),
            overview: form.overview.clone(),
            rating: form.rating,
            status: form.status,
            recommendation: form.recommendation.clone(),
            kind: Some(form.kind),
            tmdb_id: form.tmdb_id,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn normalized_title(&self) -> String {
        normalize_title(&self.title)
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Fill in the kind if the gateway left it out
    pub fn with_kind(mut self, kind: MediaKind) -> Self {
        if self.kind.is_none() {
            self.kind = Some(kind);
        }
        self
    }
}

/// De-duplication key for titles: trimmed and lower-cased
pub fn normalize_title(title: &str) -> String {
    title.trim().to_lowercase()
}

/// Years arrive as numbers from the list endpoints and as strings ("2010")
/// from recommendations and metadata search. Anything unparsable is dropped.
pub fn deserialize_year_lenient<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<serde_json::Value> = Option::deserialize(deserializer)?;
    Ok(match raw {
        Some(serde_json::Value::Number(n)) => n.as_i64().and_then(|v| i32::try_from(v).ok()),
        Some(serde_json::Value::String(s)) => s.trim().get(..4).and_then(|y| y.parse().ok()),
        _ => None,
    })
}

/// Timestamps come either as RFC 3339 or as naive ISO strings in UTC
/// (`2024-01-01T10:00:00.123456`).
pub fn deserialize_timestamp_lenient<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(&s, "%Y-%m-%dT%H:%M:%S%.f")
                    .ok()
                    .map(|naive| naive.and_utc())
            })
    }))
}
