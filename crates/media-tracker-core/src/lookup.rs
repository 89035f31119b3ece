// Metadata search (form autofill) and trailer lookup

use crate::error::CoreError;
use crate::notice::{Notice, NoticeSink};
use media_tracker_gateway::{CatalogGateway, GatewayError};
use media_tracker_models::{Item, ItemForm, MediaKind, MetadataMatch, Trailer};
use std::sync::Arc;
use tracing::{debug, warn};

pub struct DetailLookup {
    gateway: Arc<dyn CatalogGateway>,
    notices: Arc<dyn NoticeSink>,
}

impl DetailLookup {
    pub fn new(gateway: Arc<dyn CatalogGateway>, notices: Arc<dyn NoticeSink>) -> Self {
        Self { gateway, notices }
    }

    async fn find_metadata(&self, kind: MediaKind, query: &str) -> Result<MetadataMatch, CoreError> {
        match self.gateway.search_metadata(kind, query).await {
            Ok(found) => {
                debug!(kind = %kind, query, external_id = found.id, "Metadata match");
                Ok(found)
            }
            Err(e) if e.is_not_found() => Err(CoreError::MetadataNotFound {
                query: query.to_string(),
            }),
            Err(source) => {
                warn!(kind = %kind, query, error = %source, "Metadata search failed");
                Err(CoreError::Lookup { source })
            }
        }
    }

    /// Best metadata match for `query`
    pub async fn search(&self, kind: MediaKind, query: &str) -> Result<MetadataMatch, CoreError> {
        let result = self.find_metadata(kind, query).await;
        if let Err(e) = &result {
            self.notices.notify(Notice::warning(e.user_message()));
        }
        result
    }

    /// Fill year, poster, overview and external id of `form` from a search on
    /// its title. A miss leaves the form as typed and is not worth a notice.
    pub async fn autofill(&self, form: &mut ItemForm) -> Result<bool, CoreError> {
        if form.title.trim().is_empty() {
            return Ok(false);
        }
        match self.find_metadata(form.kind, &form.title).await {
            Ok(found) => {
                form.apply_metadata(&found);
                Ok(true)
            }
            Err(CoreError::MetadataNotFound { query }) => {
                debug!(query = %query, "No metadata for autofill");
                Ok(false)
            }
            Err(e) => {
                self.notices.notify(Notice::warning(e.user_message()));
                Err(e)
            }
        }
    }

    /// Trailer for `item`. Uses the stored external id when present and
    /// searches by title otherwise.
    pub async fn trailer_for(&self, kind: MediaKind, item: &Item) -> Result<Trailer, CoreError> {
        let result = self.resolve_trailer(kind, item).await;
        if let Err(e) = &result {
            self.notices.notify(Notice::warning(e.user_message()));
        }
        result
    }

    async fn resolve_trailer(&self, kind: MediaKind, item: &Item) -> Result<Trailer, CoreError> {
        let external_id = match item.tmdb_id {
            Some(id) => id,
            None => self.find_metadata(kind, &item.title).await?.id,
        };

        match self.gateway.trailer(kind, external_id).await {
            Ok(trailer) => Ok(trailer),
            Err(GatewayError::NotFound(_)) => Err(CoreError::TrailerNotFound {
                title: item.title.clone(),
            }),
            Err(source) => {
                warn!(kind = %kind, external_id, error = %source, "Trailer lookup failed");
                Err(CoreError::Lookup { source })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notice::NoticeQueue;
    use media_tracker_gateway::{InMemoryGateway, Operation};

    fn lookup(gateway: &InMemoryGateway) -> (NoticeQueue, DetailLookup) {
        let notices = NoticeQueue::new();
        (notices.clone(), DetailLookup::new(Arc::new(gateway.clone()), Arc::new(notices)))
    }

    fn dune_match() -> MetadataMatch {
        MetadataMatch {
            id: 438631,
            title: "Dune".to_string(),
            year: Some(2021),
            poster_url: Some("https://image.tmdb.org/t/p/w500/dune.jpg".to_string()),
            overview: Some("Spice.".to_string()),
        }
    }

    fn trailer() -> Trailer {
        Trailer {
            key: "n9xhJrPXop4".to_string(),
            site: "YouTube".to_string(),
        }
    }

    #[tokio::test]
    async fn test_trailer_uses_stored_external_id() {
        let gateway = InMemoryGateway::new();
        gateway.add_trailer(MediaKind::Movie, 438631, trailer());
        let (_, lookup) = lookup(&gateway);

        let mut item = Item::from_form(&ItemForm::new(MediaKind::Movie, "Dune"));
        item.tmdb_id = Some(438631);
        let found = lookup.trailer_for(MediaKind::Movie, &item).await.unwrap();
        assert_eq!(found.embed_url(), "https://www.youtube.com/embed/n9xhJrPXop4");
        assert_eq!(gateway.calls(Operation::Search), 0);
    }

    #[tokio::test]
    async fn test_trailer_searches_when_id_missing() {
        let gateway = InMemoryGateway::new();
        gateway.add_metadata(MediaKind::Movie, dune_match());
        gateway.add_trailer(MediaKind::Movie, 438631, trailer());
        let (_, lookup) = lookup(&gateway);

        let item = Item::from_form(&ItemForm::new(MediaKind::Movie, "dune"));
        assert!(lookup.trailer_for(MediaKind::Movie, &item).await.is_ok());
        assert_eq!(gateway.calls(Operation::Search), 1);
    }

    #[tokio::test]
    async fn test_missing_trailer_is_trailer_not_found() {
        let gateway = InMemoryGateway::new();
        let (notices, lookup) = lookup(&gateway);

        let mut item = Item::from_form(&ItemForm::new(MediaKind::TvShow, "Dark"));
        item.tmdb_id = Some(70523);
        let err = lookup.trailer_for(MediaKind::TvShow, &item).await.unwrap_err();
        assert!(matches!(err, CoreError::TrailerNotFound { .. }));
        assert_eq!(notices.len(), 1);
    }

    #[tokio::test]
    async fn test_autofill_keeps_title_and_sets_external_id() {
        let gateway = InMemoryGateway::new();
        gateway.add_metadata(MediaKind::Movie, dune_match());
        let (_, lookup) = lookup(&gateway);

        let mut form = ItemForm::new(MediaKind::Movie, "dune");
        assert!(lookup.autofill(&mut form).await.unwrap());
        assert_eq!(form.title, "dune");
        assert_eq!(form.year, Some(2021));
        assert_eq!(form.tmdb_id, Some(438631));
    }

    #[tokio::test]
    async fn test_autofill_miss_is_silent() {
        let gateway = InMemoryGateway::new();
        let (notices, lookup) = lookup(&gateway);

        let mut form = ItemForm::new(MediaKind::Movie, "Unknown Film");
        assert!(!lookup.autofill(&mut form).await.unwrap());
        assert!(notices.is_empty());
    }

    #[tokio::test]
    async fn test_search_not_found_maps_to_metadata_not_found() {
        let gateway = InMemoryGateway::new();
        let (_, lookup) = lookup(&gateway);
        let err = lookup.search(MediaKind::TvShow, "nothing").await.unwrap_err();
        assert!(matches!(err, CoreError::MetadataNotFound { .. }));
    }
}
