use serde::{Deserialize, Serialize};
use thiserror::Error;
use crate::item::Item;
use crate::media::MediaKind;
use crate::metadata::MetadataMatch;
use crate::status::WatchStatus;

pub const MIN_RATING: f32 = 0.0;
pub const MAX_RATING: f32 = 5.0;

/// Local form validation failures, raised before any network call
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    #[error("Title is required")]
    EmptyTitle,
    #[error("Rating {0} is out of range (0-5)")]
    RatingOutOfRange(f32),
}

/// Create payload for `POST /api/movies` and `POST /api/tvshows`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ItemForm {
    pub title: String,
    pub year: Option<i32>,
    pub poster_url: Option<String>,
    pub overview: Option<String>,
    pub rating: Option<f32>,
    pub status: WatchStatus,
    pub recommendation: Option<String>,
    #[serde(rename = "type")]
    pub kind: MediaKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tmdb_id: Option<u64>,
}

impl ItemForm {
    pub fn new(kind: MediaKind, title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            year: None,
            poster_url: None,
            overview: None,
            rating: None,
            status: WatchStatus::default(),
            recommendation: None,
            kind,
            tmdb_id: None,
        }
    }

    pub fn with_status(mut self, status: WatchStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_year(mut self, year: Option<i32>) -> Self {
        self.year = year;
        self
    }

    pub fn with_rating(mut self, rating: Option<f32>) -> Self {
        self.rating = rating;
        self
    }

    pub fn with_recommendation(mut self, note: Option<String>) -> Self {
        self.recommendation = note;
        self
    }

    /// Form submitted when a recommendation is accepted: status is forced to
    /// `WantToWatch`, the recommendation note travels along.
    pub fn from_recommendation(item: &Item, kind: MediaKind) -> Self {
        Self {
            title: item.title.clone(),
            year: item.year,
            poster_url: item.poster_url.clone(),
            overview: item.overview.clone(),
            rating: item.rating,
            status: WatchStatus::WantToWatch,
            recommendation: item.recommendation.clone(),
            kind,
            tmdb_id: item.tmdb_id,
        }
    }

    /// Autofill from a metadata search hit. The typed title is kept.
    pub fn apply_metadata(&mut self, found: &MetadataMatch) {
        if found.year.is_some() {
            self.year = found.year;
        }
        if found.poster_url.is_some() {
            self.poster_url = found.poster_url.clone();
        }
        if found.overview.is_some() {
            self.overview = found.overview.clone();
        }
        self.tmdb_id = Some(found.id);
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        validate_rating(self.rating)
    }
}

/// Partial update payload for `PUT /api/{movies,tvshows}/{id}`; only set fields are sent
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ItemPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<WatchStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tmdb_id: Option<u64>,
}

impl ItemPatch {
    pub fn is_empty(&self) -> bool {
        self == &ItemPatch::default()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(title) = &self.title {
            if title.trim().is_empty() {
                return Err(ValidationError::EmptyTitle);
            }
        }
        validate_rating(self.rating)
    }

    /// Apply the set fields onto an item (what the service does on PUT)
    pub fn apply_to(&self, item: &mut Item) {
        if let Some(title) = &self.title {
            item.title = title.clone();
        }
        if self.year.is_some() {
            item.year = self.year;
        }
        if self.poster_url.is_some() {
            item.poster_url = self.poster_url.clone();
        }
        if self.overview.is_some() {
            item.overview = self.overview.clone();
        }
        if self.rating.is_some() {
            item.rating = self.rating;
        }
        if let Some(status) = self.status {
            item.status = status;
        }
        if self.recommendation.is_some() {
            item.recommendation = self.recommendation.clone();
        }
        if self.tmdb_id.is_some() {
            item.tmdb_id = self.tmdb_id;
        }
    }
}

impl From<ItemForm> for ItemPatch {
    fn from(form: ItemForm) -> Self {
        Self {
            title: Some(form.title),
            year: form.year,
            poster_url: form.poster_url,
            overview: form.overview,
            rating: form.rating,
            status: Some(form.status),
            recommendation: form.recommendation,
            tmdb_id: form.tmdb_id,
        }
    }
}

fn validate_rating(rating: Option<f32>) -> Result<(), ValidationError> {
    match rating {
        Some(r) if !(MIN_RATING..=MAX_RATING).contains(&r) => Err(ValidationError::RatingOutOfRange(r)),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_blank_title() {
        let form = ItemForm::new(MediaKind::Movie, "   ");
        assert_eq!(form.validate(), Err(ValidationError::EmptyTitle));
    }

    #[test]
    fn test_validate_rating_bounds() {
        let form = ItemForm::new(MediaKind::Movie, "Dune").with_rating(Some(5.0));
        assert!(form.validate().is_ok());
        let form = ItemForm::new(MediaKind::Movie, "Dune").with_rating(Some(5.5));
        assert_eq!(form.validate(), Err(ValidationError::RatingOutOfRange(5.5)));
        let form = ItemForm::new(MediaKind::Movie, "Dune").with_rating(Some(-1.0));
        assert!(form.validate().is_err());
    }

    #[test]
    fn test_validate_leaves_year_to_the_service() {
        let form = ItemForm::new(MediaKind::Movie, "Metropolis").with_year(Some(1927));
        assert!(form.validate().is_ok());
        let form = ItemForm::new(MediaKind::Movie, "Untitled").with_year(None);
        assert!(form.validate().is_ok());
    }

    #[test]
    fn test_form_serializes_type_tag() {
        let form = ItemForm::new(MediaKind::TvShow, "Severance").with_status(WatchStatus::Watching);
        let json = serde_json::to_value(&form).unwrap();
        assert_eq!(json["type"], "tv");
        assert_eq!(json["status"], "Watching");
        assert!(json.get("tmdb_id").is_none());
    }

    #[test]
    fn test_patch_only_sends_set_fields() {
        let patch = ItemPatch {
            status: Some(WatchStatus::Watched),
            ..ItemPatch::default()
        };
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json, serde_json::json!({"status": "Watched"}));
        assert!(!patch.is_empty());
        assert!(ItemPatch::default().is_empty());
    }

    #[test]
    fn test_recommendation_form_forces_want_to_watch() {
        let mut item = Item::from_form(&ItemForm::new(MediaKind::Movie, "Arrival").with_status(WatchStatus::Watched));
        item.recommendation = Some("because you liked Dune".to_string());
        let form = ItemForm::from_recommendation(&item, MediaKind::Movie);
        assert_eq!(form.status, WatchStatus::WantToWatch);
        assert_eq!(form.recommendation.as_deref(), Some("because you liked Dune"));
    }

    #[test]
    fn test_apply_metadata_keeps_title() {
        let mut form = ItemForm::new(MediaKind::Movie, "dune");
        form.apply_metadata(&MetadataMatch {
            id: 438631,
            title: "Dune".to_string(),
            year: Some(2021),
            poster_url: Some("https://image.tmdb.org/t/p/w500/x.jpg".to_string()),
            overview: None,
        });
        assert_eq!(form.title, "dune");
        assert_eq!(form.year, Some(2021));
        assert_eq!(form.tmdb_id, Some(438631));
        assert!(form.overview.is_none());
    }

    #[test]
    fn test_patch_apply_to() {
        let mut item = Item::from_form(&ItemForm::new(MediaKind::Movie, "Dune"));
        let patch = ItemPatch {
            rating: Some(4.5),
            status: Some(WatchStatus::Watched),
            ..ItemPatch::default()
        };
        patch.apply_to(&mut item);
        assert_eq!(item.title, "Dune");
        assert_eq!(item.rating, Some(4.5));
        assert_eq!(item.status, WatchStatus::Watched);
    }
}
