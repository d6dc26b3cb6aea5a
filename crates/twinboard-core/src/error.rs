// ── Core error types ──
//
// Errors surfaced to views. Transport failures are translated into
// domain variants; a non-2xx response keeps its status and message so a
// view can show "404: Building not found" without digging.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Backend errors ───────────────────────────────────────────────
    /// The backend answered with a non-success status.
    #[error("{message}")]
    Api { status: u16, message: String },

    // ── Network / payload errors ─────────────────────────────────────
    #[error("Cannot reach backend at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Unexpected response payload: {message}")]
    Decode { message: String },

    // ── Selection errors ─────────────────────────────────────────────
    #[error("Unknown building: {id}")]
    UnknownBuilding { id: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// HTTP status of a backend error.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The message a view should display.
    pub fn message(&self) -> String {
        match self {
            Self::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<twinboard_api::Error> for CoreError {
    fn from(err: twinboard_api::Error) -> Self {
        match err {
            twinboard_api::Error::Api { status, .. } => Self::Api {
                status,
                message: err.detail(),
            },
            twinboard_api::Error::Transport(ref e) => {
                if let Some(status) = e.status() {
                    Self::Api {
                        status: status.as_u16(),
                        message: e.to_string(),
                    }
                } else {
                    Self::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                }
            }
            twinboard_api::Error::WebSocketConnect(reason) => Self::ConnectionFailed {
                url: "realtime feed".into(),
                reason,
            },
            twinboard_api::Error::InvalidUrl(e) => Self::Config {
                message: format!("Invalid URL: {e}"),
            },
            twinboard_api::Error::Deserialization { message, body: _ } => Self::Decode { message },
            twinboard_api::Error::Encode(e) => Self::Internal(format!("request encoding: {e}")),
        }
    }
}
