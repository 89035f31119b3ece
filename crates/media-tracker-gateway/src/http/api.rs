use media_tracker_models::{Item, ItemForm, ItemId, ItemPatch, MediaKind, MetadataMatch, Trailer};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use crate::error::GatewayError;

/// `/api/movies` or `/api/tvshows`
pub fn collection_path(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Movie => "/api/movies",
        MediaKind::TvShow => "/api/tvshows",
    }
}

pub fn item_path(kind: MediaKind, id: ItemId) -> String {
    format!("{}/{}", collection_path(kind), id)
}

pub fn search_path(kind: MediaKind, query: &str) -> String {
    let base = match kind {
        MediaKind::Movie => "/api/tmdb/search",
        MediaKind::TvShow => "/api/tmdb/search/tv",
    };
    format!("{}?query={}", base, urlencoding::encode(query))
}

pub fn recommendations_path(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Movie => "/api/tmdb/recommendations",
        MediaKind::TvShow => "/api/tmdb/tv/recommendations",
    }
}

pub fn trailer_path(kind: MediaKind, external_id: u64) -> String {
    format!("/api/tmdb/{}/{}/trailer", kind.as_tag(), external_id)
}

fn url(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}

/// Map non-success statuses; 404 becomes `NotFound` carrying `what`
async fn check_status(response: Response, what: &str) -> Result<Response, GatewayError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    if status == StatusCode::NOT_FOUND {
        return Err(GatewayError::NotFound(what.to_string()));
    }
    Err(GatewayError::Status {
        status: status.as_u16(),
        body,
    })
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, GatewayError> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(GatewayError::from)
}

/// Fetch the full list for one catalog
pub async fn list_items(client: &Client, base_url: &str, kind: MediaKind) -> Result<Vec<Item>, GatewayError> {
    let endpoint = url(base_url, collection_path(kind));
    debug!(kind = %kind, url = %endpoint, "Fetching list");

    let response = client
        .get(&endpoint)
        .header("Accept", "application/json")
        .send()
        .await?;
    let response = check_status(response, collection_path(kind)).await?;
    let items: Vec<Item> = decode(response).await?;

    debug!(kind = %kind, count = items.len(), "List fetched");
    Ok(items.into_iter().map(|item| item.with_kind(kind)).collect())
}

pub async fn add_item(client: &Client, base_url: &str, kind: MediaKind, form: &ItemForm) -> Result<Item, GatewayError> {
    let endpoint = url(base_url, collection_path(kind));
    debug!(kind = %kind, title = %form.title, "Creating item");

    let response = client
        .post(&endpoint)
        .header("Accept", "application/json")
        .json(form)
        .send()
        .await?;
    let response = check_status(response, collection_path(kind)).await?;
    let item: Item = decode(response).await?;
    Ok(item.with_kind(kind))
}

pub async fn update_item(
    client: &Client,
    base_url: &str,
    kind: MediaKind,
    id: ItemId,
    patch: &ItemPatch,
) -> Result<Item, GatewayError> {
    let path = item_path(kind, id);
    debug!(kind = %kind, id = %id, "Updating item");

    let response = client
        .put(url(base_url, &path))
        .header("Accept", "application/json")
        .json(patch)
        .send()
        .await?;
    let response = check_status(response, &format!("{} {}", kind.label(), id)).await?;
    let item: Item = decode(response).await?;
    Ok(item.with_kind(kind))
}

pub async fn delete_item(client: &Client, base_url: &str, kind: MediaKind, id: ItemId) -> Result<(), GatewayError> {
    let path = item_path(kind, id);
    debug!(kind = %kind, id = %id, "Deleting item");

    let response = client.delete(url(base_url, &path)).send().await?;
    check_status(response, &format!("{} {}", kind.label(), id)).await?;
    Ok(())
}

pub async fn search_metadata(
    client: &Client,
    base_url: &str,
    kind: MediaKind,
    query: &str,
) -> Result<MetadataMatch, GatewayError> {
    let path = search_path(kind, query);
    debug!(kind = %kind, query = %query, "Searching metadata");

    let response = client
        .get(url(base_url, &path))
        .header("Accept", "application/json")
        .send()
        .await?;
    let response = check_status(response, &format!("metadata for '{}'", query)).await?;
    decode(response).await
}

pub async fn trailer(client: &Client, base_url: &str, kind: MediaKind, external_id: u64) -> Result<Trailer, GatewayError> {
    let path = trailer_path(kind, external_id);
    debug!(kind = %kind, external_id, "Fetching trailer");

    let response = client
        .get(url(base_url, &path))
        .header("Accept", "application/json")
        .send()
        .await?;
    let response = check_status(response, &format!("trailer for {} {}", kind.label(), external_id)).await?;
    decode(response).await
}

/// The service answers 404/422 when the list has nothing to base
/// recommendations on; that is reported as `InsufficientHistory`.
pub async fn recommendations(client: &Client, base_url: &str, kind: MediaKind) -> Result<Vec<Item>, GatewayError> {
    let endpoint = url(base_url, recommendations_path(kind));
    debug!(kind = %kind, "Fetching recommendations");

    let response = client
        .get(&endpoint)
        .header("Accept", "application/json")
        .send()
        .await?;

    let status = response.status();
    if status == StatusCode::NOT_FOUND || status == StatusCode::UNPROCESSABLE_ENTITY {
        let body = response.text().await.unwrap_or_default();
        warn!(kind = %kind, status = status.as_u16(), body = %body, "Recommendations unavailable for current list");
        return Err(GatewayError::InsufficientHistory);
    }

    let response = check_status(response, recommendations_path(kind)).await?;
    let items: Vec<Item> = decode(response).await?;
    Ok(items.into_iter().map(|item| item.with_kind(kind)).collect())
}
