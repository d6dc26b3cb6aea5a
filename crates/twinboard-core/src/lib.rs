//! Reactive data layer between `twinboard-api` and dashboard views.
//!
//! This crate decides when to fetch, how to hold in-flight results, and
//! how to keep a single selected building consistent across many
//! independently refreshing consumers:
//!
//! - **[`Dashboard`]**: Central facade. Owns the API client and the
//!   [`BuildingContext`], and vends per-consumer [`Resource`]s and actions
//!   wired to the current selection.
//!
//! - **[`Resource<T>`]**: Fetch state machine tracking `{data, loading,
//!   error}`. Re-issues whenever its dependency changes value, exposes
//!   [`refetch()`](Resource::refetch), and discards stale or post-disposal
//!   responses via a per-resource generation counter.
//!
//! - **[`Action<A, T>`]**: Trigger-driven variant for user-initiated
//!   one-shot operations (run scenario, optimize, forecast, ROI, report,
//!   setpoint) with `{result, loading, error}`.
//!
//! - **[`BuildingContext`]**: The building list plus the selected id.
//!   Self-heals to the first building when the selection falls out of the
//!   list; the selected building itself is always derived.
//!
//! - **[`RealtimeFeed`]**: The selected building's live WebSocket feed.
//!   Follows the selection like any building-scoped resource and keeps the
//!   latest sensor sample plus recent alerts.
//!
//! - **[`StateStream<S>`]**: Subscription handle exposing `current()` /
//!   `latest()` / `changed()` over any of the above.
//!
//! - **Transforms** ([`transform`]): Pure wire-to-view projections (hourly
//!   energy chart, AQI and PMV classes, fault lists, MPC rows, synthetic
//!   trend padding behind an injectable [`Jitter`](transform::Jitter)).

pub mod action;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod fetch;
pub mod realtime;
pub mod selection;
pub mod stream;
pub mod transform;

// ── Primary re-exports ──────────────────────────────────────────────
pub use action::{
    Action, ActionState, CustomScenarioRunner, EnergyForecaster, MpcOptimizer, QuickMpcPlanner,
    ReportGenerator, RoiCalculator, ScenarioRunner, SetpointUpdater, ThermalSimulator,
};
pub use config::{DEFAULT_API_URL, DEFAULT_BUILDING_ID, DashboardConfig};
pub use dashboard::Dashboard;
pub use error::CoreError;
pub use fetch::{Dependency, Resource, ResourceState};
pub use realtime::{LiveAlert, RealtimeFeed, RealtimeState, SensorSample};
pub use selection::{BuildingContext, BuildingSelection};
pub use stream::{MessageStream, StateStream};

// Wire types consumers need without depending on the API crate directly.
pub use twinboard_api::types::{
    Alert, AlertList, AlertSeverity, AlertStatus, Building, EnergyData, EnergyQuery, Equipment,
    EquipmentList, EquipmentStatus, ForecastRequest, ForecastResponse, HvacMode, HvacStatus,
    IaqStatus, KpiPeriod, Kpis, MpcRequest, MpcResponse, ReportDocument, ReportPeriod,
    Resolution, RoiRequest, RoiResponse, Scenario, ScenarioList, ScenarioRequest,
    ScenarioResponse, SetpointResponse, SetpointUpdate, flexible_datetime,
};
pub use twinboard_api::types::{
    CustomScenarioRequest, ModelStatus, QuickMpcRequest, QuickMpcResponse, RealtimeMessage,
    ScenarioType, SensorReadings, SimulationMode, SimulationRequest, SimulationResponse,
};
pub use twinboard_api::{LinkStatus, ReconnectConfig};
