//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` variants into user-facing errors with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use twinboard_config::ConfigError;
use twinboard_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the backend at {url}")]
    #[diagnostic(
        code(twinboard::connection_failed),
        help(
            "Check that the backend is running and reachable.\n\
             Override the URL with --api-url or TWINBOARD_API_URL.\n\
             Reason: {reason}"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(twinboard::not_found),
        help("Run: twinboard {list_command} to see what is available")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("The backend reports no buildings")]
    #[diagnostic(
        code(twinboard::no_buildings),
        help("Building-scoped commands need at least one building.")
    )]
    NoBuildings,

    // ── API ──────────────────────────────────────────────────────────
    #[error("API error ({status}): {message}")]
    #[diagnostic(code(twinboard::api_error))]
    Api { status: u16, message: String },

    #[error("Unexpected response from the backend: {message}")]
    #[diagnostic(
        code(twinboard::decode),
        help("The backend and this CLI may be out of sync. Re-run with -vv for details.")
    )]
    Decode { message: String },

    #[error("The backend rejected the change: {message}")]
    #[diagnostic(code(twinboard::rejected))]
    Rejected { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(twinboard::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(
        code(twinboard::config),
        help("Inspect the effective configuration with: twinboard config show")
    )]
    Config(#[from] ConfigError),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    #[diagnostic(code(twinboard::internal))]
    Internal(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::NotFound { .. } | Self::NoBuildings | Self::Api { status: 404, .. } => {
                exit_code::NOT_FOUND
            }
            Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<&CoreError> for CliError {
    fn from(err: &CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => Self::ConnectionFailed {
                url: url.clone(),
                reason: reason.clone(),
            },
            CoreError::Api { status, message } => Self::Api {
                status: *status,
                message: message.clone(),
            },
            CoreError::Decode { message } => Self::Decode {
                message: message.clone(),
            },
            CoreError::UnknownBuilding { id } => Self::NotFound {
                resource_type: "building".into(),
                identifier: id.clone(),
                list_command: "buildings list".into(),
            },
            CoreError::Config { message } => Self::Validation {
                field: "config".into(),
                reason: message.clone(),
            },
            CoreError::Internal(message) => Self::Internal(message.clone()),
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        Self::from(&err)
    }
}
