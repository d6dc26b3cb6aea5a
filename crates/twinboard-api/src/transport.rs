// Shared transport configuration for building reqwest::Client instances.
//
// The dashboard never imposes a request timeout on its own; a caller that
// wants one (the CLI, for instance) opts in here.

use std::time::Duration;

use reqwest::header::HeaderMap;

const USER_AGENT: &str = concat!("twinboard/", env!("CARGO_PKG_VERSION"));

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone, Default)]
pub struct TransportConfig {
    /// Whole-request timeout. `None` lets a hung request stay pending.
    pub timeout: Option<Duration>,
    /// Headers sent with every request.
    pub default_headers: HeaderMap,
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, crate::error::Error> {
        let mut builder = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(self.default_headers.clone());

        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(builder.build()?)
    }

    /// Set a request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}
