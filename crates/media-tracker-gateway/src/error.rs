use thiserror::Error;

/// Failures talking to the catalog service
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("HTTP client error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Catalog service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Could not decode response: {0}")]
    Decode(String),

    /// Recommendations need at least a few items to work from
    #[error("Not enough items in the list to base recommendations on")]
    InsufficientHistory,

    /// Raised by the in-memory gateway's failure injection
    #[error("Simulated failure: {0}")]
    Simulated(String),
}

impl GatewayError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, GatewayError::NotFound(_))
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            GatewayError::Status { status, .. } => Some(*status),
            GatewayError::NotFound(_) => Some(404),
            GatewayError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(e: serde_json::Error) -> Self {
        GatewayError::Decode(e.to_string())
    }
}
