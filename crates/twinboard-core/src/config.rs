// ── Runtime dashboard configuration ──
//
// Describes *where* the backend lives and which building to show first.
// Never touches disk; `twinboard-config` builds one of these and hands it in.

use std::time::Duration;

use url::Url;

/// Local development backend.
pub const DEFAULT_API_URL: &str = "http://localhost:8000/api/v1";

/// Building selected before the list has loaded.
pub const DEFAULT_BUILDING_ID: &str = "pleiades-a";

/// Configuration for a dashboard session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardConfig {
    /// API base URL, including the `/api/v1` prefix.
    pub base_url: Url,
    /// Optional request timeout. `None` means requests may hang forever.
    pub timeout: Option<Duration>,
    /// Seed for the building selection.
    pub default_building_id: String,
}

impl DashboardConfig {
    /// Config pointed at `base_url`, everything else defaulted.
    pub fn with_base_url(base_url: Url) -> Self {
        Self {
            base_url,
            timeout: None,
            default_building_id: DEFAULT_BUILDING_ID.into(),
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self::with_base_url(Url::parse(DEFAULT_API_URL).expect("default API URL is valid"))
    }
}
