use crate::error::GatewayError;
use crate::http::api;
use crate::traits::CatalogGateway;
use async_trait::async_trait;
use media_tracker_config::Config;
use media_tracker_models::{Item, ItemForm, ItemId, ItemPatch, MediaKind, MetadataMatch, Trailer};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// reqwest-backed gateway talking to the catalog service's JSON API
#[derive(Clone)]
pub struct HttpGateway {
    client: Arc<Client>,
    base_url: String,
}

impl HttpGateway {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client: Arc::new(client),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Build from config: user agent, optional timeout, resolved base URL
    pub fn from_config(config: &Config) -> Result<Self, GatewayError> {
        let mut builder = Client::builder().user_agent(config.gateway.user_agent.clone());
        if let Some(secs) = config.gateway.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build()?;
        let base_url = config.resolved_base_url();

        info!(base_url = %base_url, timeout_secs = ?config.gateway.request_timeout_secs, "Catalog gateway configured");
        Ok(Self::new(client, base_url))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl CatalogGateway for HttpGateway {
    fn gateway_name(&self) -> &str {
        "http"
    }

    async fn list_items(&self, kind: MediaKind) -> Result<Vec<Item>, GatewayError> {
        api::list_items(&self.client, &self.base_url, kind).await
    }

    async fn add_item(&self, kind: MediaKind, form: &ItemForm) -> Result<Item, GatewayError> {
        api::add_item(&self.client, &self.base_url, kind, form).await
    }

    async fn update_item(&self, kind: MediaKind, id: ItemId, patch: &ItemPatch) -> Result<Item, GatewayError> {
        api::update_item(&self.client, &self.base_url, kind, id, patch).await
    }

    async fn delete_item(&self, kind: MediaKind, id: ItemId) -> Result<(), GatewayError> {
        api::delete_item(&self.client, &self.base_url, kind, id).await
    }

    async fn search_metadata(&self, kind: MediaKind, query: &str) -> Result<MetadataMatch, GatewayError> {
        api::search_metadata(&self.client, &self.base_url, kind, query).await
    }

    async fn trailer(&self, kind: MediaKind, external_id: u64) -> Result<Trailer, GatewayError> {
        api::trailer(&self.client, &self.base_url, kind, external_id).await
    }

    async fn recommendations(&self, kind: MediaKind) -> Result<Vec<Item>, GatewayError> {
        api::recommendations(&self.client, &self.base_url, kind).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let gateway = HttpGateway::new(Client::new(), "http://localhost:5000/");
        assert_eq!(gateway.base_url(), "http://localhost:5000");
    }

    #[test]
    fn test_from_config_defaults_to_development() {
        let config = Config::default();
        let gateway = HttpGateway::from_config(&config).unwrap();
        if std::env::var(media_tracker_config::API_URL_ENV).is_err() {
            assert_eq!(gateway.base_url(), "http://localhost:5000");
        }
        assert_eq!(gateway.gateway_name(), "http");
    }

    #[tokio::test]
    async fn test_unreachable_service_is_transport_error() {
        // Port 9 (discard) on localhost is not expected to speak HTTP
        let gateway = HttpGateway::new(
            Client::builder().timeout(Duration::from_secs(2)).build().unwrap(),
            "http://127.0.0.1:9",
        );
        let err = gateway.list_items(MediaKind::Movie).await.unwrap_err();
        assert!(matches!(err, GatewayError::Transport(_)));
    }
}
