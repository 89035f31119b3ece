//! In-memory copy of one kind's list (movies or TV shows).
//!
//! The list is replaced wholesale by every load; local edits (append,
//! replace, remove) keep it current between loads. Loads are ticketed so a
//! slow response never overwrites a newer one, and a closed [`ViewLifetime`]
//! makes late responses a no-op.

use crate::error::CoreError;
use media_tracker_gateway::CatalogGateway;
use media_tracker_models::{normalize_title, Item, ItemId, MediaKind};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// Liveness of the view owning a store. Cloned into every in-flight request;
/// once closed, responses are discarded instead of applied.
#[derive(Debug, Clone)]
pub struct ViewLifetime {
    active: Arc<AtomicBool>,
}

impl Default for ViewLifetime {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewLifetime {
    pub fn new() -> Self {
        Self {
            active: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub fn close(&self) {
        self.active.store(false, Ordering::Release);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "error", rename_all = "lowercase")]
pub enum LoadState {
    Idle,
    Loading,
    Ready,
    /// Last load failed; the previous list is kept and `load` retries
    Failed(String),
}

#[derive(Debug)]
struct StoreInner {
    items: Vec<Item>,
    load_state: LoadState,
    issued: u64,
    applied: u64,
    stale: bool,
}

/// Shared handle; clones see the same list
#[derive(Clone)]
pub struct ItemStore {
    kind: MediaKind,
    gateway: Arc<dyn CatalogGateway>,
    lifetime: ViewLifetime,
    inner: Arc<Mutex<StoreInner>>,
}

impl ItemStore {
    pub fn new(kind: MediaKind, gateway: Arc<dyn CatalogGateway>, lifetime: ViewLifetime) -> Self {
        Self {
            kind,
            gateway,
            lifetime,
            inner: Arc::new(Mutex::new(StoreInner {
                items: Vec::new(),
                load_state: LoadState::Idle,
                issued: 0,
                applied: 0,
                stale: false,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn lifetime(&self) -> &ViewLifetime {
        &self.lifetime
    }

    /// Fetch the full list and replace the stored one.
    ///
    /// On failure the previous list stays and the load state becomes
    /// `Failed`. A response overtaken by a newer applied load is dropped and
    /// the current list returned instead; so is a failure while a newer load
    /// is still pending.
    pub async fn load(&self) -> Result<Vec<Item>, CoreError> {
        let ticket = {
            let mut inner = self.lock();
            inner.issued += 1;
            inner.stale = false;
            inner.load_state = LoadState::Loading;
            inner.issued
        };
        debug!(kind = %self.kind, ticket, "Loading list");

        let result = self.gateway.list_items(self.kind).await;

        if !self.lifetime.is_active() {
            debug!(kind = %self.kind, ticket, "View detached, discarding list response");
            return Err(CoreError::Detached { kind: self.kind });
        }

        let mut inner = self.lock();
        let latest = ticket == inner.issued;
        if ticket < inner.applied || (result.is_err() && !latest) {
            debug!(kind = %self.kind, ticket, applied = inner.applied, "Discarding overtaken list response");
            return Ok(inner.items.clone());
        }
        match result {
            Ok(items) => {
                let kind = self.kind;
                inner.items = items.into_iter().map(|item| item.with_kind(kind)).collect();
                inner.applied = ticket;
                // Fresh items beat the error of a newer load that already failed
                if latest || inner.load_state != LoadState::Loading {
                    inner.load_state = LoadState::Ready;
                }
                info!(kind = %self.kind, count = inner.items.len(), "List loaded");
                Ok(inner.items.clone())
            }
            Err(source) => {
                warn!(kind = %self.kind, error = %source, "Failed to load list");
                inner.load_state = LoadState::Failed(source.to_string());
                Err(CoreError::Fetch { kind: self.kind, source })
            }
        }
    }

    pub fn load_state(&self) -> LoadState {
        self.lock().load_state.clone()
    }

    pub fn items(&self) -> Vec<Item> {
        self.lock().items.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, id: ItemId) -> Option<Item> {
        self.lock().items.iter().find(|item| item.id == Some(id)).cloned()
    }

    /// Add an item at the end. A persisted item whose id is already present
    /// replaces that entry instead, so an id never appears twice.
    pub fn append(&self, item: Item) {
        let item = item.with_kind(self.kind);
        let mut inner = self.lock();
        if let Some(id) = item.id {
            if let Some(existing) = inner.items.iter_mut().find(|i| i.id == Some(id)) {
                *existing = item;
                return;
            }
        }
        inner.items.push(item);
    }

    /// Swap in `item` for the entry with the same id. False when absent.
    pub fn replace(&self, item: Item) -> bool {
        let Some(id) = item.id else {
            return false;
        };
        let item = item.with_kind(self.kind);
        let mut inner = self.lock();
        match inner.items.iter_mut().find(|i| i.id == Some(id)) {
            Some(existing) => {
                *existing = item;
                true
            }
            None => false,
        }
    }

    pub fn remove(&self, id: ItemId) -> Option<Item> {
        let mut inner = self.lock();
        let index = inner.items.iter().position(|item| item.id == Some(id))?;
        Some(inner.items.remove(index))
    }

    /// Remove the most recent not-yet-persisted entry with this title
    pub fn remove_pending(&self, title: &str) -> Option<Item> {
        let wanted = normalize_title(title);
        let mut inner = self.lock();
        let index = inner
            .items
            .iter()
            .rposition(|item| item.id.is_none() && item.normalized_title() == wanted)?;
        Some(inner.items.remove(index))
    }

    pub fn contains_title(&self, title: &str) -> bool {
        let wanted = normalize_title(title);
        self.lock().items.iter().any(|item| item.normalized_title() == wanted)
    }

    /// Normalized titles of every stored item
    pub fn titles(&self) -> HashSet<String> {
        self.lock().items.iter().map(Item::normalized_title).collect()
    }

    /// Flag the list as out of date; the next sync reloads it
    pub fn mark_stale(&self) {
        self.lock().stale = true;
    }

    pub fn is_stale(&self) -> bool {
        self.lock().stale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use media_tracker_gateway::{CatalogGateway, InMemoryGateway, Operation};
    use media_tracker_models::ItemForm;

    fn store_with(gateway: &InMemoryGateway) -> ItemStore {
        ItemStore::new(MediaKind::Movie, Arc::new(gateway.clone()), ViewLifetime::new())
    }

    fn persisted(id: u64, title: &str) -> Item {
        let mut item = Item::from_form(&ItemForm::new(MediaKind::Movie, title));
        item.id = Some(ItemId(id));
        item
    }

    #[tokio::test]
    async fn test_load_replaces_wholesale() {
        let gateway = InMemoryGateway::new();
        gateway.seed_titles(MediaKind::Movie, &["Alien", "Heat"]);
        let store = store_with(&gateway);
        store.append(persisted(99, "Local only"));

        let items = store.load().await.unwrap();
        assert_eq!(items.len(), 2);
        assert!(!store.contains_title("local only"));
        assert_eq!(store.load_state(), LoadState::Ready);
    }

    #[tokio::test]
    async fn test_failed_load_keeps_previous_list() {
        let gateway = InMemoryGateway::new();
        gateway.seed_titles(MediaKind::Movie, &["Alien"]);
        let store = store_with(&gateway);
        store.load().await.unwrap();

        gateway.fail_next(Operation::List, 1);
        let err = store.load().await.unwrap_err();
        assert!(matches!(err, CoreError::Fetch { .. }));
        assert_eq!(store.len(), 1);
        assert!(matches!(store.load_state(), LoadState::Failed(_)));

        // Retry is just another load
        store.load().await.unwrap();
        assert_eq!(store.load_state(), LoadState::Ready);
    }

    #[test]
    fn test_append_never_duplicates_an_id() {
        let store = store_with(&InMemoryGateway::new());
        store.append(persisted(42, "Dune"));
        store.append(persisted(42, "Dune (2021)"));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(ItemId(42)).unwrap().title, "Dune (2021)");
    }

    #[test]
    fn test_replace_and_remove_by_id() {
        let store = store_with(&InMemoryGateway::new());
        store.append(persisted(1, "Heat"));
        assert!(store.replace(persisted(1, "Heat (1995)")));
        assert!(!store.replace(persisted(2, "Ronin")));
        assert_eq!(store.remove(ItemId(1)).unwrap().title, "Heat (1995)");
        assert!(store.remove(ItemId(1)).is_none());
    }

    #[test]
    fn test_titles_are_normalized() {
        let store = store_with(&InMemoryGateway::new());
        store.append(persisted(1, "  Inception "));
        assert!(store.contains_title("INCEPTION"));
        assert!(store.titles().contains("inception"));
    }

    #[test]
    fn test_remove_pending_skips_persisted_entries() {
        let store = store_with(&InMemoryGateway::new());
        store.append(persisted(1, "Heat"));
        store.append(Item::from_form(&ItemForm::new(MediaKind::Movie, "Heat")));
        assert!(store.remove_pending("heat").unwrap().id.is_none());
        assert!(store.remove_pending("heat").is_none());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_older_response_does_not_overwrite_newer() {
        let gateway = InMemoryGateway::new();
        gateway.seed_titles(MediaKind::Movie, &["Alien"]);
        let store = store_with(&gateway);

        gateway.hold(Operation::List);
        let slow = store.clone();
        let first = tokio::spawn(async move { slow.load().await });
        while gateway.calls(Operation::List) == 0 {
            tokio::task::yield_now().await;
        }

        // Newer load lands first, then the service shrinks again before the
        // held call reads it
        gateway.release(Operation::List);
        let heat = gateway.seed_titles(MediaKind::Movie, &["Heat"])[0];
        let newer = store.load().await.unwrap();
        assert_eq!(newer.len(), 2);
        gateway.delete_item(MediaKind::Movie, heat).await.unwrap();

        let returned = first.await.unwrap().unwrap();
        assert_eq!(returned.len(), 2);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_overtaken_failure_keeps_fresh_list() {
        let gateway = InMemoryGateway::new();
        gateway.seed_titles(MediaKind::Movie, &["Alien", "Heat"]);
        let store = store_with(&gateway);

        gateway.hold(Operation::List);
        let slow = store.clone();
        let first = tokio::spawn(async move { slow.load().await });
        while gateway.calls(Operation::List) == 0 {
            tokio::task::yield_now().await;
        }

        gateway.release(Operation::List);
        store.load().await.unwrap();
        gateway.set_failing(Operation::List, true);

        assert_eq!(first.await.unwrap().unwrap().len(), 2);
        assert_eq!(store.load_state(), LoadState::Ready);
    }

    #[tokio::test]
    async fn test_late_success_clears_newer_failure() {
        let gateway = InMemoryGateway::new();
        gateway.seed_titles(MediaKind::Movie, &["Alien", "Heat"]);
        let store = store_with(&gateway);

        gateway.hold(Operation::List);
        let slow = store.clone();
        let first = tokio::spawn(async move { slow.load().await });
        while gateway.calls(Operation::List) == 0 {
            tokio::task::yield_now().await;
        }

        gateway.release(Operation::List);
        gateway.set_failing(Operation::List, true);
        assert!(matches!(store.load().await, Err(CoreError::Fetch { .. })));
        assert!(matches!(store.load_state(), LoadState::Failed(_)));
        gateway.set_failing(Operation::List, false);

        assert_eq!(first.await.unwrap().unwrap().len(), 2);
        assert_eq!(store.len(), 2);
        assert_eq!(store.load_state(), LoadState::Ready);
    }

    #[tokio::test]
    async fn test_closed_lifetime_discards_response() {
        let gateway = InMemoryGateway::new();
        gateway.seed_titles(MediaKind::Movie, &["Alien"]);
        let store = store_with(&gateway);
        store.lifetime().close();

        let err = store.load().await.unwrap_err();
        assert!(matches!(err, CoreError::Detached { .. }));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_load_clears_stale_flag() {
        let store = store_with(&InMemoryGateway::new());
        store.mark_stale();
        assert!(store.is_stale());
        store.load().await.unwrap();
        assert!(!store.is_stale());
    }
}
