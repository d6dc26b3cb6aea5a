// ── Dashboard facade ──
//
// Owns the API client and the building selection context, and hands out
// per-consumer resources and actions wired to them. Every
// building-scoped resource is keyed to the selection, so changing the
// building re-issues all of them and each one drops its own stale
// responses.

use std::future::Future;
use std::sync::Arc;

use tracing::info;
use twinboard_api::types::{
    AlertList, Building, EnergyData, EnergyQuery, EquipmentList, HvacStatus, IaqStatus, KpiPeriod,
    Kpis, ModelStatus, ScenarioList,
};
use twinboard_api::{ApiClient, ReconnectConfig, TransportConfig};

use crate::action::{
    CustomScenarioRunner, EnergyForecaster, MpcOptimizer, QuickMpcPlanner, ReportGenerator,
    RoiCalculator, ScenarioRunner, SetpointUpdater, ThermalSimulator,
};
use crate::config::DashboardConfig;
use crate::error::CoreError;
use crate::fetch::Resource;
use crate::realtime::RealtimeFeed;
use crate::selection::{BuildingContext, BuildingSelection};

struct DashboardInner {
    config: DashboardConfig,
    client: Arc<ApiClient>,
    selection: BuildingContext,
}

/// Entry point of the data layer. Cheaply cloneable.
#[derive(Clone)]
pub struct Dashboard {
    inner: Arc<DashboardInner>,
}

impl Dashboard {
    /// Build the client from `config` and start loading the building list.
    ///
    /// Must be called within a Tokio runtime.
    pub fn new(config: DashboardConfig) -> Result<Self, CoreError> {
        let transport = TransportConfig {
            timeout: config.timeout,
            ..TransportConfig::default()
        };
        let client = ApiClient::new(&config.base_url, &transport)?;
        Ok(Self::with_client(config, Arc::new(client)))
    }

    pub fn with_client(config: DashboardConfig, client: Arc<ApiClient>) -> Self {
        info!(base_url = %config.base_url, seed = %config.default_building_id, "starting dashboard");
        let selection = BuildingContext::new(Arc::clone(&client), config.default_building_id.clone());
        Self {
            inner: Arc::new(DashboardInner {
                config,
                client,
                selection,
            }),
        }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.inner.config
    }

    pub fn client(&self) -> &Arc<ApiClient> {
        &self.inner.client
    }

    pub fn selection(&self) -> &BuildingContext {
        &self.inner.selection
    }

    /// Wait for the building list and a consistent selection.
    pub async fn ready(&self) -> BuildingSelection {
        self.inner.selection.ready().await
    }

    // ── Building-scoped resources ────────────────────────────────────

    fn building_scoped<T, F, Fut>(&self, label: &'static str, fetch: F) -> Resource<T>
    where
        T: Send + Sync + 'static,
        F: Fn(Arc<ApiClient>, String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, twinboard_api::Error>> + Send + 'static,
    {
        let client = Arc::clone(&self.inner.client);
        Resource::with_dependency(
            label,
            self.inner.selection.selection_key(),
            move |selected: &Option<String>| {
                let id = selected.clone()?;
                let pending = fetch(Arc::clone(&client), id);
                Some(async move { pending.await.map_err(CoreError::from) })
            },
        )
    }

    pub fn building(&self) -> Resource<Building> {
        self.building_scoped("building", |client, id| async move {
            client.get_building(&id).await
        })
    }

    pub fn energy(&self, query: EnergyQuery) -> Resource<EnergyData> {
        self.building_scoped("energy", move |client, id| {
            let query = query.clone();
            async move { client.get_energy(&id, &query).await }
        })
    }

    pub fn equipment(&self) -> Resource<EquipmentList> {
        self.building_scoped("equipment", |client, id| async move {
            client.get_equipment(&id).await
        })
    }

    pub fn alerts(&self) -> Resource<AlertList> {
        self.building_scoped("alerts", |client, id| async move { client.get_alerts(&id).await })
    }

    pub fn hvac(&self) -> Resource<HvacStatus> {
        self.building_scoped("hvac", |client, id| async move { client.get_hvac(&id).await })
    }

    pub fn iaq(&self) -> Resource<IaqStatus> {
        self.building_scoped("iaq", |client, id| async move { client.get_iaq(&id).await })
    }

    pub fn kpis(&self, period: Option<KpiPeriod>) -> Resource<Kpis> {
        self.building_scoped("kpis", move |client, id| async move {
            client.get_kpis(&id, period).await
        })
    }

    // ── Global resources ─────────────────────────────────────────────

    pub fn model_status(&self) -> Resource<ModelStatus> {
        let client = Arc::clone(&self.inner.client);
        Resource::new("model_status", move || {
            let client = Arc::clone(&client);
            async move { client.model_status().await.map_err(CoreError::from) }
        })
    }

    pub fn scenarios(&self) -> Resource<ScenarioList> {
        let client = Arc::clone(&self.inner.client);
        Resource::new("scenarios", move || {
            let client = Arc::clone(&client);
            async move { client.list_scenarios().await.map_err(CoreError::from) }
        })
    }

    // ── Live feed ────────────────────────────────────────────────────

    /// Live feed for the selected building. Switches connection whenever
    /// the selection changes.
    pub fn realtime(&self) -> RealtimeFeed {
        self.realtime_with(ReconnectConfig::default())
    }

    pub fn realtime_with(&self, reconnect: ReconnectConfig) -> RealtimeFeed {
        RealtimeFeed::new(
            Arc::clone(&self.inner.client),
            reconnect,
            self.inner.selection.selection_key(),
        )
    }

    // ── Actions ──────────────────────────────────────────────────────

    pub fn scenario_runner(&self) -> ScenarioRunner {
        ScenarioRunner::new(Arc::clone(&self.inner.client))
    }

    pub fn custom_scenario_runner(&self) -> CustomScenarioRunner {
        CustomScenarioRunner::new(Arc::clone(&self.inner.client))
    }

    pub fn thermal_simulator(&self) -> ThermalSimulator {
        ThermalSimulator::new(Arc::clone(&self.inner.client))
    }

    pub fn quick_mpc_planner(&self) -> QuickMpcPlanner {
        QuickMpcPlanner::new(Arc::clone(&self.inner.client))
    }

    pub fn mpc_optimizer(&self) -> MpcOptimizer {
        MpcOptimizer::new(Arc::clone(&self.inner.client))
    }

    pub fn forecaster(&self) -> EnergyForecaster {
        EnergyForecaster::new(Arc::clone(&self.inner.client))
    }

    pub fn roi_calculator(&self) -> RoiCalculator {
        RoiCalculator::new(Arc::clone(&self.inner.client))
    }

    pub fn report_generator(&self) -> ReportGenerator {
        ReportGenerator::new(Arc::clone(&self.inner.client))
    }

    pub fn setpoint_updater(&self) -> SetpointUpdater {
        SetpointUpdater::new(Arc::clone(&self.inner.client))
    }
}
