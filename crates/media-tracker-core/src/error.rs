use media_tracker_gateway::GatewayError;
use media_tracker_models::{ItemId, MediaKind, ValidationError};
use thiserror::Error;

/// Errors surfaced by the client core. Each maps to one piece of user copy
/// via [`CoreError::user_message`].
#[derive(Debug, Error)]
pub enum CoreError {
    /// List retrieval failed; the store keeps its last good list
    #[error("Failed to fetch {} list: {source}", .kind.label())]
    Fetch {
        kind: MediaKind,
        #[source]
        source: GatewayError,
    },

    /// Add or update failed; the store is unchanged
    #[error("Failed to submit {}: {source}", .kind.label())]
    Submit {
        kind: MediaKind,
        #[source]
        source: GatewayError,
    },

    #[error("Failed to delete {} {id}: {source}", .kind.label())]
    Delete {
        kind: MediaKind,
        id: ItemId,
        #[source]
        source: GatewayError,
    },

    /// Recommendation precondition unmet; a guided empty state, not a failure
    #[error("Not enough {} in the list to base recommendations on", .kind.plural_label())]
    InsufficientHistory { kind: MediaKind },

    #[error("'{title}' is already in your list")]
    DuplicateItem { title: String },

    #[error("No metadata found for '{query}'")]
    MetadataNotFound { query: String },

    #[error("No trailer found for '{title}'")]
    TrailerNotFound { title: String },

    /// Metadata or trailer lookup failed for another reason
    #[error("Lookup failed: {source}")]
    Lookup {
        #[source]
        source: GatewayError,
    },

    #[error("Invalid form: {0}")]
    Validation(#[from] ValidationError),

    #[error("No {} with id {id} in the list", .kind.label())]
    UnknownItem { kind: MediaKind, id: ItemId },

    /// The owning view was torn down before the response arrived
    #[error("{} view detached, response discarded", .kind.plural_label())]
    Detached { kind: MediaKind },
}

impl CoreError {
    /// Copy shown to the user for this error
    pub fn user_message(&self) -> String {
        match self {
            CoreError::Fetch { kind, .. } => {
                format!("Failed to fetch {}. Please try again.", kind.plural_label().to_lowercase())
            }
            CoreError::Submit { kind, .. } => {
                format!("Failed to submit {}. Please try again.", kind.label())
            }
            CoreError::Delete { kind, .. } => {
                format!("Failed to delete {}. Please try again.", kind.label())
            }
            CoreError::InsufficientHistory { kind } => format!(
                "No recommendations yet. Add at least 3 {} to your list first!",
                kind.plural_label().to_lowercase()
            ),
            CoreError::DuplicateItem { title } => format!("\"{}\" is already in your list", title),
            CoreError::MetadataNotFound { query } => format!("No match found for \"{}\"", query),
            CoreError::TrailerNotFound { .. } => "No trailer available for this title".to_string(),
            CoreError::Lookup { .. } => "Failed to load details. Please try again later.".to_string(),
            CoreError::Validation(e) => e.to_string(),
            CoreError::UnknownItem { kind, id } => format!("No {} with id {} in your list", kind.label(), id),
            CoreError::Detached { .. } => "This view is no longer open".to_string(),
        }
    }

    /// Errors the user can fix by simply trying again. A 4xx answer will
    /// not change on retry, except timeouts and rate limits.
    pub fn is_retryable(&self) -> bool {
        match self.gateway_error().map(GatewayError::status_code) {
            Some(Some(code)) => !(400..500).contains(&code) || code == 408 || code == 429,
            Some(None) => true,
            None => false,
        }
    }

    pub fn gateway_error(&self) -> Option<&GatewayError> {
        match self {
            CoreError::Fetch { source, .. }
            | CoreError::Submit { source, .. }
            | CoreError::Delete { source, .. }
            | CoreError::Lookup { source } => Some(source),
            _ => None,
        }
    }
}
