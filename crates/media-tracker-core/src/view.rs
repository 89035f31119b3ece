//! One tab of the client: the movies list or the TV shows list.
//!
//! A view owns its store, filters, recommendation pool and bus
//! subscriptions. The display list is derived from the store on every read,
//! so it always reflects the latest local edit.

use crate::bus::{CatalogEvent, NotificationBus, Subscription};
use crate::error::CoreError;
use crate::filter::filter_items;
use crate::lookup::DetailLookup;
use crate::mutation::MutationCoordinator;
use crate::notice::{Notice, NoticeSink};
use crate::recommend::{RecommendationReconciler, RecommendationState};
use crate::store::{ItemStore, LoadState, ViewLifetime};
use media_tracker_gateway::CatalogGateway;
use media_tracker_models::{Item, ItemForm, ItemId, ItemPatch, MediaKind, MetadataMatch, StatusCategory, Trailer};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

#[derive(Debug, Clone, Default)]
struct Filters {
    query: String,
    category: StatusCategory,
}

pub struct CatalogView {
    kind: MediaKind,
    store: ItemStore,
    mutations: MutationCoordinator,
    recommendations: RecommendationReconciler,
    lookup: DetailLookup,
    notices: Arc<dyn NoticeSink>,
    lifetime: ViewLifetime,
    filters: Mutex<Filters>,
    subscriptions: Mutex<Vec<Subscription>>,
}

impl CatalogView {
    /// Build the view and subscribe it to add/delete events for its kind.
    /// Nothing is fetched until [`load`](Self::load).
    pub fn new(
        kind: MediaKind,
        gateway: Arc<dyn CatalogGateway>,
        bus: &NotificationBus,
        notices: Arc<dyn NoticeSink>,
    ) -> Self {
        let lifetime = ViewLifetime::new();
        let store = ItemStore::new(kind, Arc::clone(&gateway), lifetime.clone());

        let subscriptions = [CatalogEvent::Added(kind), CatalogEvent::Deleted(kind)]
            .into_iter()
            .map(|event| {
                let store = store.clone();
                bus.subscribe(event, move || store.mark_stale())
            })
            .collect();

        Self {
            kind,
            mutations: MutationCoordinator::new(store.clone(), Arc::clone(&gateway), bus.clone(), Arc::clone(&notices)),
            recommendations: RecommendationReconciler::new(
                store.clone(),
                Arc::clone(&gateway),
                bus.clone(),
                Arc::clone(&notices),
            ),
            lookup: DetailLookup::new(gateway, Arc::clone(&notices)),
            store,
            notices,
            lifetime,
            filters: Mutex::new(Filters::default()),
            subscriptions: Mutex::new(subscriptions),
        }
    }

    pub fn with_category(self, category: StatusCategory) -> Self {
        self.set_category(category);
        self
    }

    fn filters(&self) -> MutexGuard<'_, Filters> {
        self.filters.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn store(&self) -> &ItemStore {
        &self.store
    }

    /// Fetch the list. A failure leaves the last good list, emits a notice
    /// and puts the view in the `Failed` state; calling again retries.
    pub async fn load(&self) -> Result<Vec<Item>, CoreError> {
        let result = self.store.load().await;
        if let Err(e @ CoreError::Fetch { .. }) = &result {
            self.notices.notify(Notice::error(e.user_message()));
        }
        result
    }

    /// Reload if another view changed this kind since the last load
    pub async fn sync(&self) -> Result<bool, CoreError> {
        if !self.store.is_stale() {
            return Ok(false);
        }
        debug!(kind = %self.kind, "View stale, reloading");
        self.load().await.map(|_| true)
    }

    pub fn load_state(&self) -> LoadState {
        self.store.load_state()
    }

    pub fn query(&self) -> String {
        self.filters().query.clone()
    }

    pub fn set_query(&self, query: impl Into<String>) {
        self.filters().query = query.into();
    }

    pub fn category(&self) -> StatusCategory {
        self.filters().category
    }

    pub fn set_category(&self, category: StatusCategory) {
        self.filters().category = category;
    }

    /// The store filtered by the current query and category
    pub fn display(&self) -> Vec<Item> {
        let filters = self.filters().clone();
        filter_items(&self.store.items(), &filters.query, filters.category)
    }

    pub fn item(&self, id: ItemId) -> Result<Item, CoreError> {
        self.store
            .get(id)
            .ok_or(CoreError::UnknownItem { kind: self.kind, id })
    }

    pub async fn add(&self, form: ItemForm) -> Result<Item, CoreError> {
        self.mutations.add(form).await
    }

    pub async fn update(&self, id: ItemId, patch: ItemPatch) -> Result<Item, CoreError> {
        self.mutations.update(id, patch).await
    }

    pub async fn delete(&self, id: ItemId) -> Result<(), CoreError> {
        self.mutations.delete(id).await
    }

    pub fn recommendations(&self) -> Vec<Item> {
        self.recommendations.pool()
    }

    pub fn recommendation_state(&self) -> RecommendationState {
        self.recommendations.state()
    }

    pub async fn refresh_recommendations(&self) -> Result<Vec<Item>, CoreError> {
        self.recommendations.refresh().await
    }

    pub fn find_recommendation(&self, title: &str) -> Option<Item> {
        self.recommendations.find(title)
    }

    pub async fn accept_recommendation(&self, candidate: &Item) -> Result<Item, CoreError> {
        self.recommendations.accept(candidate).await
    }

    pub async fn search_metadata(&self, query: &str) -> Result<MetadataMatch, CoreError> {
        self.lookup.search(self.kind, query).await
    }

    pub async fn autofill(&self, form: &mut ItemForm) -> Result<bool, CoreError> {
        self.lookup.autofill(form).await
    }

    pub async fn trailer(&self, id: ItemId) -> Result<Trailer, CoreError> {
        let item = self.item(id)?;
        self.lookup.trailer_for(self.kind, &item).await
    }

    pub fn is_attached(&self) -> bool {
        self.lifetime.is_active()
    }

    /// Tear the view down: in-flight responses are dropped on arrival and
    /// the bus stops calling into it
    pub fn detach(&self) {
        if !self.lifetime.is_active() {
            return;
        }
        self.lifetime.close();
        let released: Vec<Subscription> = self
            .subscriptions
            .lock()
            .map(|mut subs| subs.drain(..).collect())
            .unwrap_or_default();
        drop(released);
        info!(kind = %self.kind, "View detached");
    }
}

impl Drop for CatalogView {
    fn drop(&mut self) {
        self.detach();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notice::NoticeQueue;
    use media_tracker_gateway::{InMemoryGateway, Operation};
    use media_tracker_models::WatchStatus;

    fn view(kind: MediaKind, gateway: &InMemoryGateway, bus: &NotificationBus) -> (NoticeQueue, CatalogView) {
        let notices = NoticeQueue::new();
        let view = CatalogView::new(kind, Arc::new(gateway.clone()), bus, Arc::new(notices.clone()));
        (notices, view)
    }

    #[tokio::test]
    async fn test_display_follows_filters() {
        let gateway = InMemoryGateway::new();
        for (title, status) in [
            ("Inception", WatchStatus::Watched),
            ("Interstellar", WatchStatus::WantToWatch),
            ("Heat", WatchStatus::Watched),
        ] {
            gateway.seed(
                MediaKind::Movie,
                Item::from_form(&ItemForm::new(MediaKind::Movie, title).with_status(status)),
            );
        }
        let bus = NotificationBus::new();
        let (_, view) = view(MediaKind::Movie, &gateway, &bus);
        view.load().await.unwrap();

        view.set_query("in");
        assert_eq!(view.display().len(), 2);
        view.set_category(StatusCategory::Only(WatchStatus::Watched));
        assert_eq!(view.display().len(), 1);
        view.set_query("");
        view.set_category(StatusCategory::All);
        assert_eq!(view.display().len(), 3);
    }

    #[tokio::test]
    async fn test_failed_load_sets_failed_state_and_notifies() {
        let gateway = InMemoryGateway::new();
        gateway.fail_next(Operation::List, 1);
        let bus = NotificationBus::new();
        let (notices, view) = view(MediaKind::TvShow, &gateway, &bus);

        assert!(view.load().await.is_err());
        assert!(matches!(view.load_state(), LoadState::Failed(_)));
        assert_eq!(notices.drain().len(), 1);

        view.load().await.unwrap();
        assert_eq!(view.load_state(), LoadState::Ready);
    }

    #[tokio::test]
    async fn test_sibling_view_goes_stale_on_add() {
        let gateway = InMemoryGateway::new();
        let bus = NotificationBus::new();
        let (_, first) = view(MediaKind::Movie, &gateway, &bus);
        let (_, second) = view(MediaKind::Movie, &gateway, &bus);
        let (_, shows) = view(MediaKind::TvShow, &gateway, &bus);
        second.load().await.unwrap();

        first.add(ItemForm::new(MediaKind::Movie, "Heat")).await.unwrap();
        assert!(second.store().is_stale());
        assert!(!shows.store().is_stale());

        assert!(second.sync().await.unwrap());
        assert_eq!(second.display().len(), 1);
        assert!(!second.sync().await.unwrap());
    }

    #[tokio::test]
    async fn test_detach_unsubscribes() {
        let gateway = InMemoryGateway::new();
        let bus = NotificationBus::new();
        let (_, view) = view(MediaKind::Movie, &gateway, &bus);
        assert_eq!(bus.subscriber_count(CatalogEvent::Added(MediaKind::Movie)), 1);

        view.detach();
        assert!(!view.is_attached());
        assert_eq!(bus.subscriber_count(CatalogEvent::Added(MediaKind::Movie)), 0);
        assert_eq!(bus.subscriber_count(CatalogEvent::Deleted(MediaKind::Movie)), 0);
    }

    #[tokio::test]
    async fn test_trailer_for_unknown_id() {
        let gateway = InMemoryGateway::new();
        let bus = NotificationBus::new();
        let (_, view) = view(MediaKind::Movie, &gateway, &bus);
        let err = view.trailer(ItemId(5)).await.unwrap_err();
        assert!(matches!(err, CoreError::UnknownItem { .. }));
    }
}
