//! In-process catalog service used by tests and demos.
//!
//! Behaves like the HTTP service (id assignment, timestamps, the
//! recommendation precondition) and adds knobs the real one lacks: one-shot or
//! persistent failure injection, per-operation call counters, and gates that
//! hold a call in flight until the test releases it.

use async_trait::async_trait;
use chrono::Utc;
use media_tracker_models::{Item, ItemForm, ItemId, ItemPatch, MediaKind, MetadataMatch, Trailer, normalize_title};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Semaphore;
use tracing::debug;
use crate::error::GatewayError;
use crate::traits::CatalogGateway;

/// Minimum list size the recommendation endpoints accept
pub const MIN_HISTORY_FOR_RECOMMENDATIONS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    List,
    Add,
    Update,
    Delete,
    Search,
    Trailer,
    Recommendations,
}

#[derive(Default)]
struct MemoryState {
    items: HashMap<MediaKind, Vec<Item>>,
    recommendations: HashMap<MediaKind, Vec<Item>>,
    metadata: HashMap<MediaKind, Vec<MetadataMatch>>,
    trailers: HashMap<(MediaKind, u64), Trailer>,
    next_id: u64,
    fail_next: HashMap<Operation, usize>,
    failing: HashMap<Operation, bool>,
    calls: HashMap<Operation, usize>,
    gates: HashMap<Operation, Arc<Semaphore>>,
}

#[derive(Clone)]
pub struct InMemoryGateway {
    state: Arc<Mutex<MemoryState>>,
}

impl Default for InMemoryGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryGateway {
    pub fn new() -> Self {
        let state = MemoryState {
            next_id: 1,
            ..MemoryState::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        // A panicking test thread must not cascade into every other assertion
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Next id handed out by `add_item`
    pub fn with_next_id(self, next_id: u64) -> Self {
        self.lock().next_id = next_id;
        self
    }

    /// Seed a persisted item; an id is assigned when missing
    pub fn seed(&self, kind: MediaKind, mut item: Item) -> ItemId {
        let mut state = self.lock();
        let id = match item.id {
            Some(id) => {
                state.next_id = state.next_id.max(id.0 + 1);
                id
            }
            None => {
                let id = ItemId(state.next_id);
                state.next_id += 1;
                id
            }
        };
        item.id = Some(id);
        item.kind = Some(kind);
        state.items.entry(kind).or_default().push(item);
        id
    }

    pub fn seed_titles(&self, kind: MediaKind, titles: &[&str]) -> Vec<ItemId> {
        titles
            .iter()
            .map(|title| self.seed(kind, Item::from_form(&ItemForm::new(kind, *title))))
            .collect()
    }

    pub fn set_recommendations(&self, kind: MediaKind, items: Vec<Item>) {
        self.lock().recommendations.insert(kind, items);
    }

    pub fn add_metadata(&self, kind: MediaKind, found: MetadataMatch) {
        self.lock().metadata.entry(kind).or_default().push(found);
    }

    pub fn add_trailer(&self, kind: MediaKind, external_id: u64, trailer: Trailer) {
        self.lock().trailers.insert((kind, external_id), trailer);
    }

    /// Fail the next `times` calls of `op`
    pub fn fail_next(&self, op: Operation, times: usize) {
        *self.lock().fail_next.entry(op).or_default() += times;
    }

    /// Fail every call of `op` until switched off
    pub fn set_failing(&self, op: Operation, failing: bool) {
        self.lock().failing.insert(op, failing);
    }

    /// Hold calls of `op` until [`release`](Self::release)
    pub fn hold(&self, op: Operation) {
        self.lock().gates.insert(op, Arc::new(Semaphore::new(0)));
    }

    /// Let held calls of `op` complete and stop gating it
    pub fn release(&self, op: Operation) {
        if let Some(gate) = self.lock().gates.remove(&op) {
            gate.add_permits(Semaphore::MAX_PERMITS / 2);
        }
    }

    pub fn calls(&self, op: Operation) -> usize {
        self.lock().calls.get(&op).copied().unwrap_or(0)
    }

    pub fn items(&self, kind: MediaKind) -> Vec<Item> {
        self.lock().items.get(&kind).cloned().unwrap_or_default()
    }

    /// Count the call, wait on a gate if one is set, then apply failure injection
    async fn enter(&self, op: Operation) -> Result<(), GatewayError> {
        let gate = {
            let mut state = self.lock();
            *state.calls.entry(op).or_default() += 1;
            state.gates.get(&op).cloned()
        };

        if let Some(gate) = gate {
            debug!(operation = ?op, "Call held");
            // Closed or released, either way the call proceeds
            let _ = gate.acquire().await;
        }

        let mut state = self.lock();
        if state.failing.get(&op).copied().unwrap_or(false) {
            return Err(GatewayError::Simulated(format!("{:?} failed", op)));
        }
        if let Some(remaining) = state.fail_next.get_mut(&op) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(GatewayError::Simulated(format!("{:?} failed", op)));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogGateway for InMemoryGateway {
    fn gateway_name(&self) -> &str {
        "memory"
    }

    async fn list_items(&self, kind: MediaKind) -> Result<Vec<Item>, GatewayError> {
        self.enter(Operation::List).await?;
        Ok(self.items(kind))
    }

    async fn add_item(&self, kind: MediaKind, form: &ItemForm) -> Result<Item, GatewayError> {
        self.enter(Operation::Add).await?;
        let mut state = self.lock();
        let id = ItemId(state.next_id);
        state.next_id += 1;

        let now = Utc::now();
        let mut item = Item::from_form(form);
        item.id = Some(id);
        item.kind = Some(kind);
        item.created_at = Some(now);
        item.updated_at = Some(now);
        state.items.entry(kind).or_default().push(item.clone());
        Ok(item)
    }

    async fn update_item(&self, kind: MediaKind, id: ItemId, patch: &ItemPatch) -> Result<Item, GatewayError> {
        self.enter(Operation::Update).await?;
        let mut state = self.lock();
        let item = state
            .items
            .entry(kind)
            .or_default()
            .iter_mut()
            .find(|item| item.id == Some(id))
            .ok_or_else(|| GatewayError::NotFound(format!("{} {}", kind.label(), id)))?;
        patch.apply_to(item);
        item.updated_at = Some(Utc::now());
        Ok(item.clone())
    }

    async fn delete_item(&self, kind: MediaKind, id: ItemId) -> Result<(), GatewayError> {
        self.enter(Operation::Delete).await?;
        let mut state = self.lock();
        let items = state.items.entry(kind).or_default();
        let before = items.len();
        items.retain(|item| item.id != Some(id));
        if items.len() == before {
            return Err(GatewayError::NotFound(format!("{} {}", kind.label(), id)));
        }
        Ok(())
    }

    async fn search_metadata(&self, kind: MediaKind, query: &str) -> Result<MetadataMatch, GatewayError> {
        self.enter(Operation::Search).await?;
        let wanted = normalize_title(query);
        self.lock()
            .metadata
            .get(&kind)
            .and_then(|entries| entries.iter().find(|m| normalize_title(&m.title).contains(&wanted)).cloned())
            .ok_or_else(|| GatewayError::NotFound(format!("metadata for '{}'", query)))
    }

    async fn trailer(&self, kind: MediaKind, external_id: u64) -> Result<Trailer, GatewayError> {
        self.enter(Operation::Trailer).await?;
        self.lock()
            .trailers
            .get(&(kind, external_id))
            .cloned()
            .ok_or_else(|| GatewayError::NotFound(format!("trailer for {} {}", kind.label(), external_id)))
    }

    async fn recommendations(&self, kind: MediaKind) -> Result<Vec<Item>, GatewayError> {
        self.enter(Operation::Recommendations).await?;
        let state = self.lock();
        let owned = state.items.get(&kind).map(Vec::len).unwrap_or(0);
        if owned < MIN_HISTORY_FOR_RECOMMENDATIONS {
            return Err(GatewayError::InsufficientHistory);
        }
        Ok(state.recommendations.get(&kind).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use media_tracker_models::WatchStatus;

    #[tokio::test]
    async fn test_add_assigns_ids_and_timestamps() {
        let gateway = InMemoryGateway::new().with_next_id(42);
        let form = ItemForm::new(MediaKind::Movie, "Dune").with_status(WatchStatus::Watching);
        let item = gateway.add_item(MediaKind::Movie, &form).await.unwrap();
        assert_eq!(item.id, Some(ItemId(42)));
        assert!(item.created_at.is_some());
        assert_eq!(gateway.items(MediaKind::Movie).len(), 1);
        assert!(gateway.items(MediaKind::TvShow).is_empty());
    }

    #[tokio::test]
    async fn test_update_missing_id_is_not_found() {
        let gateway = InMemoryGateway::new();
        let err = gateway
            .update_item(MediaKind::Movie, ItemId(99), &ItemPatch::default())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_recommendations_need_three_items() {
        let gateway = InMemoryGateway::new();
        gateway.seed_titles(MediaKind::Movie, &["A", "B"]);
        let err = gateway.recommendations(MediaKind::Movie).await.unwrap_err();
        assert!(matches!(err, GatewayError::InsufficientHistory));

        gateway.seed_titles(MediaKind::Movie, &["C"]);
        assert!(gateway.recommendations(MediaKind::Movie).await.is_ok());
    }

    #[tokio::test]
    async fn test_fail_next_is_one_shot() {
        let gateway = InMemoryGateway::new();
        gateway.fail_next(Operation::List, 1);
        assert!(gateway.list_items(MediaKind::Movie).await.is_err());
        assert!(gateway.list_items(MediaKind::Movie).await.is_ok());
        assert_eq!(gateway.calls(Operation::List), 2);
    }

    #[tokio::test]
    async fn test_hold_and_release() {
        let gateway = InMemoryGateway::new();
        gateway.hold(Operation::List);

        let held = gateway.clone();
        let task = tokio::spawn(async move { held.list_items(MediaKind::Movie).await });
        while gateway.calls(Operation::List) == 0 {
            tokio::task::yield_now().await;
        }
        assert!(!task.is_finished());

        gateway.release(Operation::List);
        assert!(task.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_seed_keeps_explicit_ids() {
        let gateway = InMemoryGateway::new();
        let mut item = Item::from_form(&ItemForm::new(MediaKind::TvShow, "Dark"));
        item.id = Some(ItemId(10));
        assert_eq!(gateway.seed(MediaKind::TvShow, item), ItemId(10));
        let next = gateway.seed_titles(MediaKind::TvShow, &["Severance"]);
        assert_eq!(next, vec![ItemId(11)]);
    }
}
