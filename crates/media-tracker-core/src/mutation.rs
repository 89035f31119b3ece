//! Add / update / delete against the gateway, reconciled into the store.
//!
//! Each operation emits exactly one notice and, once the write succeeded,
//! reloads the list in the background of the same call. A failing reload is
//! only logged since the write itself went through.

use crate::bus::{CatalogEvent, NotificationBus};
use crate::error::CoreError;
use crate::notice::{Notice, NoticeSink};
use crate::optimistic;
use crate::store::ItemStore;
use media_tracker_gateway::CatalogGateway;
use media_tracker_models::{Item, ItemForm, ItemId, ItemPatch, MediaKind};
use std::sync::Arc;
use tracing::{info, warn};

pub struct MutationCoordinator {
    store: ItemStore,
    gateway: Arc<dyn CatalogGateway>,
    bus: NotificationBus,
    notices: Arc<dyn NoticeSink>,
}

impl MutationCoordinator {
    pub fn new(
        store: ItemStore,
        gateway: Arc<dyn CatalogGateway>,
        bus: NotificationBus,
        notices: Arc<dyn NoticeSink>,
    ) -> Self {
        Self {
            store,
            gateway,
            bus,
            notices,
        }
    }

    fn kind(&self) -> MediaKind {
        self.store.kind()
    }

    fn capitalized_label(&self) -> String {
        let label = self.kind().label();
        let mut chars = label.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    async fn refresh_after_write(&self, operation: &str) {
        if let Err(e) = self.store.load().await {
            warn!(kind = %self.kind(), operation, error = %e, "Refresh after write failed");
        }
    }

    /// Create an item from `form`. On success the returned item is appended,
    /// `Added` is published, then the list is reloaded.
    pub async fn add(&self, form: ItemForm) -> Result<Item, CoreError> {
        let kind = self.kind();
        if let Err(e) = form.validate() {
            warn!(kind = %kind, error = %e, "Rejected add form");
            self.notices.notify(Notice::error(e.to_string()));
            return Err(CoreError::Validation(e));
        }

        let result = optimistic::run(
            "add",
            || (),
            || self.gateway.add_item(kind, &form),
            |created: Item| async move {
                self.store.append(created.clone());
                self.bus.publish(CatalogEvent::Added(kind));
                self.refresh_after_write("add").await;
                created
            },
            |()| {},
        )
        .await;

        match result {
            Ok(created) => {
                info!(kind = %kind, id = ?created.id, title = %created.title, "Item added");
                self.notices
                    .notify(Notice::success(format!("{} added successfully!", self.capitalized_label())));
                Ok(created)
            }
            Err(source) => {
                let err = CoreError::Submit { kind, source };
                self.notices.notify(Notice::error(err.user_message()));
                Err(err)
            }
        }
    }

    /// Send `patch` for `id` and swap the response into the store
    pub async fn update(&self, id: ItemId, patch: ItemPatch) -> Result<Item, CoreError> {
        let kind = self.kind();
        if let Err(e) = patch.validate() {
            warn!(kind = %kind, id = %id, error = %e, "Rejected edit form");
            self.notices.notify(Notice::error(e.to_string()));
            return Err(CoreError::Validation(e));
        }

        let result = optimistic::run(
            "update",
            || (),
            || self.gateway.update_item(kind, id, &patch),
            |updated: Item| async move {
                if !self.store.replace(updated.clone()) {
                    warn!(kind = %kind, id = %id, "Updated item was not in the local list");
                }
                self.refresh_after_write("update").await;
                updated
            },
            |()| {},
        )
        .await;

        match result {
            Ok(updated) => {
                info!(kind = %kind, id = %id, "Item updated");
                self.notices
                    .notify(Notice::success(format!("{} updated successfully!", self.capitalized_label())));
                Ok(updated)
            }
            Err(source) => {
                let err = CoreError::Submit { kind, source };
                self.notices.notify(Notice::error(err.user_message()));
                Err(err)
            }
        }
    }

    /// Delete `id`; on success it leaves the store and `Deleted` is published
    pub async fn delete(&self, id: ItemId) -> Result<(), CoreError> {
        let kind = self.kind();
        let result = optimistic::run(
            "delete",
            || (),
            || self.gateway.delete_item(kind, id),
            |()| async move {
                self.store.remove(id);
                self.bus.publish(CatalogEvent::Deleted(kind));
                self.refresh_after_write("delete").await;
            },
            |()| {},
        )
        .await;

        match result {
            Ok(()) => {
                info!(kind = %kind, id = %id, "Item deleted");
                self.notices
                    .notify(Notice::success(format!("{} deleted successfully!", self.capitalized_label())));
                Ok(())
            }
            Err(source) => {
                let err = CoreError::Delete { kind, id, source };
                self.notices.notify(Notice::error(err.user_message()));
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notice::{NoticeLevel, NoticeQueue};
    use crate::store::ViewLifetime;
    use media_tracker_gateway::{InMemoryGateway, Operation};
    use media_tracker_models::WatchStatus;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Fixture {
        gateway: InMemoryGateway,
        store: ItemStore,
        bus: NotificationBus,
        notices: NoticeQueue,
        coordinator: MutationCoordinator,
    }

    fn fixture(kind: MediaKind) -> Fixture {
        let gateway = InMemoryGateway::new();
        let shared: Arc<dyn CatalogGateway> = Arc::new(gateway.clone());
        let store = ItemStore::new(kind, Arc::clone(&shared), ViewLifetime::new());
        let bus = NotificationBus::new();
        let notices = NoticeQueue::new();
        let coordinator = MutationCoordinator::new(store.clone(), shared, bus.clone(), Arc::new(notices.clone()));
        Fixture {
            gateway,
            store,
            bus,
            notices,
            coordinator,
        }
    }

    #[tokio::test]
    async fn test_add_appends_publishes_and_notifies_once() {
        let f = fixture(MediaKind::Movie);
        let published = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&published);
        let _sub = f.bus.subscribe(CatalogEvent::Added(MediaKind::Movie), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let created = f
            .coordinator
            .add(ItemForm::new(MediaKind::Movie, "Heat").with_status(WatchStatus::Watched))
            .await
            .unwrap();

        assert!(created.id.is_some());
        assert_eq!(f.store.len(), 1);
        assert_eq!(published.load(Ordering::SeqCst), 1);
        assert_eq!(f.gateway.calls(Operation::List), 1);

        let notices = f.notices.drain();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Success);
        assert_eq!(notices[0].message, "Movie added successfully!");
    }

    #[tokio::test]
    async fn test_add_survives_failed_refresh() {
        let f = fixture(MediaKind::TvShow);
        f.gateway.fail_next(Operation::List, 1);

        let created = f.coordinator.add(ItemForm::new(MediaKind::TvShow, "Dark")).await.unwrap();
        assert_eq!(f.store.get(created.id.unwrap()).unwrap().title, "Dark");
        assert_eq!(f.notices.drain().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_add_leaves_store_unchanged() {
        let f = fixture(MediaKind::Movie);
        f.gateway.fail_next(Operation::Add, 1);

        let err = f.coordinator.add(ItemForm::new(MediaKind::Movie, "Heat")).await.unwrap_err();
        assert!(matches!(err, CoreError::Submit { .. }));
        assert!(f.store.is_empty());

        let notices = f.notices.drain();
        assert_eq!(notices.len(), 1);
        assert!(notices[0].is_error());
    }

    #[tokio::test]
    async fn test_invalid_form_never_reaches_gateway() {
        let f = fixture(MediaKind::Movie);
        let err = f.coordinator.add(ItemForm::new(MediaKind::Movie, "  ")).await.unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert_eq!(f.gateway.calls(Operation::Add), 0);
        assert_eq!(f.notices.len(), 1);
    }

    #[tokio::test]
    async fn test_update_replaces_entry() {
        let f = fixture(MediaKind::Movie);
        let id = f.gateway.seed_titles(MediaKind::Movie, &["Heat"])[0];
        f.store.load().await.unwrap();

        let patch = ItemPatch {
            status: Some(WatchStatus::Watched),
            ..ItemPatch::default()
        };
        f.coordinator.update(id, patch).await.unwrap();
        assert_eq!(f.store.get(id).unwrap().status, WatchStatus::Watched);
        assert_eq!(f.notices.drain()[0].message, "Movie updated successfully!");
    }

    #[tokio::test]
    async fn test_update_of_missing_item_surfaces_not_found() {
        let f = fixture(MediaKind::Movie);
        let err = f.coordinator.update(ItemId(404), ItemPatch::default()).await.unwrap_err();
        assert!(err.gateway_error().unwrap().is_not_found());
        assert!(f.notices.drain()[0].is_error());
    }

    #[tokio::test]
    async fn test_delete_removes_and_publishes() {
        let f = fixture(MediaKind::TvShow);
        let ids = f.gateway.seed_titles(MediaKind::TvShow, &["Dark", "Severance"]);
        f.store.load().await.unwrap();

        let published = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&published);
        let _sub = f.bus.subscribe(CatalogEvent::Deleted(MediaKind::TvShow), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        f.coordinator.delete(ids[0]).await.unwrap();
        assert!(f.store.get(ids[0]).is_none());
        assert_eq!(f.store.len(), 1);
        assert_eq!(published.load(Ordering::SeqCst), 1);
        assert_eq!(f.notices.drain()[0].message, "TV show deleted successfully!");
    }

    #[tokio::test]
    async fn test_failed_delete_keeps_item() {
        let f = fixture(MediaKind::Movie);
        let id = f.gateway.seed_titles(MediaKind::Movie, &["Heat"])[0];
        f.store.load().await.unwrap();
        f.gateway.fail_next(Operation::Delete, 1);

        let err = f.coordinator.delete(id).await.unwrap_err();
        assert!(matches!(err, CoreError::Delete { .. }));
        assert!(f.store.get(id).is_some());
        assert_eq!(f.notices.drain().len(), 1);

        // Retry is just calling again
        f.coordinator.delete(id).await.unwrap();
        assert!(f.store.is_empty());
    }
}
