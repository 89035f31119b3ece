//! Recommendation pool for one kind, kept apart from the item list.
//!
//! The pool never shows a title the user already has: entries are matched by
//! normalized title against the list snapshot, against titles accepted this
//! session, and against earlier entries of the pool itself.

use crate::bus::{CatalogEvent, NotificationBus};
use crate::error::CoreError;
use crate::notice::{Notice, NoticeSink};
use crate::optimistic;
use crate::store::ItemStore;
use media_tracker_gateway::{CatalogGateway, GatewayError};
use media_tracker_models::{normalize_title, Item, ItemForm, MediaKind};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "error", rename_all = "snake_case")]
pub enum RecommendationState {
    Idle,
    Loading,
    Ready,
    /// Too few items in the list for the service to recommend anything
    NeedsHistory,
    Failed(String),
}

/// Drop entries whose normalized title is in `known` or already seen earlier
/// in `pool`. Order is kept, first occurrence wins.
pub fn exclude_known(pool: Vec<Item>, known: &HashSet<String>) -> Vec<Item> {
    let mut seen = HashSet::new();
    pool.into_iter()
        .filter(|item| {
            let key = item.normalized_title();
            !known.contains(&key) && seen.insert(key)
        })
        .collect()
}

#[derive(Debug)]
struct PoolInner {
    pool: Vec<Item>,
    accepted: HashSet<String>,
    state: RecommendationState,
    issued: u64,
    applied: u64,
}

pub struct RecommendationReconciler {
    store: ItemStore,
    gateway: Arc<dyn CatalogGateway>,
    bus: NotificationBus,
    notices: Arc<dyn NoticeSink>,
    inner: Mutex<PoolInner>,
}

impl RecommendationReconciler {
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
            inner: Mutex::new(PoolInner {
                pool: Vec::new(),
                accepted: HashSet::new(),
                state: RecommendationState::Idle,
                issued: 0,
                applied: 0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, PoolInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn kind(&self) -> MediaKind {
        self.store.kind()
    }

    pub fn state(&self) -> RecommendationState {
        self.lock().state.clone()
    }

    /// Current pool with anything the list now holds filtered out
    pub fn pool(&self) -> Vec<Item> {
        let mut known = self.store.titles();
        let inner = self.lock();
        known.extend(inner.accepted.iter().cloned());
        exclude_known(inner.pool.clone(), &known)
    }

    /// Pool entry with this title, if any
    pub fn find(&self, title: &str) -> Option<Item> {
        let wanted = normalize_title(title);
        self.pool().into_iter().find(|item| item.normalized_title() == wanted)
    }

    /// Fetch a fresh pool. Failures become a notice; too little history
    /// becomes a guided empty state rather than an error notice.
    pub async fn refresh(&self) -> Result<Vec<Item>, CoreError> {
        self.fetch_pool(true).await
    }

    async fn fetch_pool(&self, notify: bool) -> Result<Vec<Item>, CoreError> {
        let kind = self.kind();
        let ticket = {
            let mut inner = self.lock();
            inner.issued += 1;
            inner.state = RecommendationState::Loading;
            inner.issued
        };

        let result = self.gateway.recommendations(kind).await;

        if !self.store.lifetime().is_active() {
            debug!(kind = %kind, ticket, "View detached, discarding recommendations");
            return Err(CoreError::Detached { kind });
        }

        let owned = self.store.titles();
        let mut inner = self.lock();
        let latest = ticket == inner.issued;
        if ticket < inner.applied || (result.is_err() && !latest) {
            // A newer request already settled the pool or will settle it
            debug!(kind = %kind, ticket, applied = inner.applied, "Discarding overtaken recommendations response");
            return Ok(inner.pool.clone());
        }
        match result {
            Ok(raw) => {
                let raw_count = raw.len();
                let mut known = owned;
                known.extend(inner.accepted.iter().cloned());
                let pool: Vec<Item> = exclude_known(raw, &known)
                    .into_iter()
                    .map(|item| item.with_kind(kind))
                    .collect();

                info!(kind = %kind, fetched = raw_count, kept = pool.len(), "Recommendations refreshed");
                inner.pool = pool.clone();
                inner.applied = ticket;
                if latest || inner.state != RecommendationState::Loading {
                    inner.state = RecommendationState::Ready;
                }
                Ok(pool)
            }
            Err(GatewayError::InsufficientHistory) => {
                info!(kind = %kind, "Not enough history for recommendations");
                inner.pool.clear();
                inner.applied = ticket;
                inner.state = RecommendationState::NeedsHistory;
                drop(inner);
                let err = CoreError::InsufficientHistory { kind };
                if notify {
                    self.notices.notify(Notice::info(err.user_message()));
                }
                Err(err)
            }
            Err(source) => {
                warn!(kind = %kind, error = %source, "Failed to fetch recommendations");
                inner.state = RecommendationState::Failed(source.to_string());
                drop(inner);
                if notify {
                    self.notices.notify(Notice::error(format!(
                        "Failed to fetch recommended {}",
                        kind.plural_label().to_lowercase()
                    )));
                }
                Err(CoreError::Fetch { kind, source })
            }
        }
    }

    /// Claim `key` for an accept. False when the list or this session
    /// already has it.
    fn reserve(&self, key: &str) -> bool {
        if self.store.contains_title(key) {
            return false;
        }
        self.lock().accepted.insert(key.to_string())
    }

    fn take_from_pool(&self, key: &str) -> Option<Item> {
        let mut inner = self.lock();
        let index = inner.pool.iter().position(|item| item.normalized_title() == key)?;
        Some(inner.pool.remove(index))
    }

    /// Add a recommended item to the list.
    ///
    /// The entry leaves the pool and a provisional item joins the list before
    /// the request is sent; both changes are reverted if it fails.
    pub async fn accept(&self, candidate: &Item) -> Result<Item, CoreError> {
        let kind = self.kind();
        let key = candidate.normalized_title();
        let key = key.as_str();

        if !self.reserve(key) {
            warn!(kind = %kind, title = %candidate.title, "Recommendation already in list");
            let err = CoreError::DuplicateItem {
                title: candidate.title.clone(),
            };
            self.notices.notify(Notice::error(err.user_message()));
            return Err(err);
        }

        let form = ItemForm::from_recommendation(candidate, kind);
        let result = optimistic::run(
            "accept",
            || {
                let taken = self.take_from_pool(key);
                self.store.append(Item::from_form(&form));
                self.bus.publish(CatalogEvent::Added(kind));
                taken
            },
            || self.gateway.add_item(kind, &form),
            |created: Item| async move {
                self.store.remove_pending(key);
                self.store.append(created.clone());

                let (list, pool) = futures::join!(self.store.load(), self.fetch_pool(false));
                if let Err(e) = list {
                    warn!(kind = %kind, error = %e, "List refresh after accept failed");
                }
                if let Err(e) = pool {
                    warn!(kind = %kind, error = %e, "Recommendation refresh after accept failed");
                }
                created
            },
            |taken: Option<Item>| {
                self.store.remove_pending(key);
                let mut inner = self.lock();
                inner.accepted.remove(key);
                if let Some(entry) = taken {
                    inner.pool.push(entry);
                }
            },
        )
        .await;

        match result {
            Ok(created) => {
                info!(kind = %kind, id = ?created.id, title = %created.title, "Recommendation accepted");
                self.notices
                    .notify(Notice::success(format!("Added \"{}\" to your list", created.title)));
                Ok(created)
            }
            Err(source) => {
                self.notices.notify(Notice::error(format!(
                    "Failed to add \"{}\". Please try again.",
                    candidate.title
                )));
                Err(CoreError::Submit { kind, source })
            }
        }
    }
}
