use async_trait::async_trait;
use media_tracker_models::{Item, ItemForm, ItemId, ItemPatch, MediaKind, MetadataMatch, Trailer};
use crate::error::GatewayError;

/// The remote catalog service as seen by the client.
///
/// Every call is a suspension point; implementations hold no list state for
/// the caller, each view keeps its own copy.
#[async_trait]
pub trait CatalogGateway: Send + Sync {
    /// Name used in logs
    fn gateway_name(&self) -> &str;

    // Catalog CRUD
    async fn list_items(&self, kind: MediaKind) -> Result<Vec<Item>, GatewayError>;
    async fn add_item(&self, kind: MediaKind, form: &ItemForm) -> Result<Item, GatewayError>;
    async fn update_item(&self, kind: MediaKind, id: ItemId, patch: &ItemPatch) -> Result<Item, GatewayError>;
    async fn delete_item(&self, kind: MediaKind, id: ItemId) -> Result<(), GatewayError>;

    // Metadata provider
    async fn search_metadata(&self, kind: MediaKind, query: &str) -> Result<MetadataMatch, GatewayError>;
    async fn trailer(&self, kind: MediaKind, external_id: u64) -> Result<Trailer, GatewayError>;

    /// Fails with `GatewayError::InsufficientHistory` when the list is too short
    async fn recommendations(&self, kind: MediaKind) -> Result<Vec<Item>, GatewayError>;
}
