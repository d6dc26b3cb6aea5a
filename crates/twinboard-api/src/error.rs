use thiserror::Error;

/// Top-level error type for the `twinboard-api` crate.
///
/// Every failure the transport can produce lands here: non-success HTTP
/// statuses, connection failures, and bodies that do not decode.
/// `twinboard-core` maps these into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── HTTP status ─────────────────────────────────────────────────
    /// The backend answered with a non-2xx status. `message` is the raw
    /// response body, or `API Error: <status>` when the body was empty.
    #[error("{message}")]
    Api { status: u16, message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// WebSocket handshake or stream failure.
    #[error("WebSocket connection failed: {0}")]
    WebSocketConnect(String),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    /// A request body could not be encoded as JSON.
    #[error("Failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),
}

/// FastAPI wraps `HTTPException` details as `{"detail": "..."}`.
#[derive(serde::Deserialize)]
struct DetailBody {
    detail: serde_json::Value,
}

impl Error {
    /// Build the error for a non-success status from its (possibly empty) body.
    pub fn from_status(status: u16, body: String) -> Self {
        let message = if body.is_empty() {
            format!("API Error: {status}")
        } else {
            body
        };
        Self::Api { status, message }
    }

    /// HTTP status code, if the backend produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Human-oriented message for an `Api` error.
    ///
    /// The raw body is kept verbatim in `message`; this unwraps the
    /// `{"detail": ...}` envelope when the backend sent one.
    pub fn detail(&self) -> String {
        match self {
            Self::Api { message, .. } => match serde_json::from_str::<DetailBody>(message) {
                Ok(DetailBody {
                    detail: serde_json::Value::String(s),
                }) => s,
                Ok(DetailBody { detail }) => detail.to_string(),
                Err(_) => message.clone(),
            },
            other => other.to_string(),
        }
    }
}
