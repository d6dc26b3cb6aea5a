// Digital-twin simulation accessors under `/simulation`.

use crate::client::{ApiClient, RequestOptions};
use crate::error::Error;
use crate::query::QueryParams;
use crate::types::{
    CustomScenarioRequest, ForecastRequest, ForecastResponse, ModelStatus, MpcRequest,
    MpcResponse, QuickMpcRequest, QuickMpcResponse, RoiRequest, RoiResponse, ScenarioList,
    ScenarioRequest, ScenarioResponse, SimulationRequest, SimulationResponse,
};

impl ApiClient {
    /// `POST /simulation/run`
    pub async fn run_simulation(
        &self,
        request: &SimulationRequest,
    ) -> Result<SimulationResponse, Error> {
        self.post("/simulation/run", request).await
    }

    /// `GET /simulation/scenarios`
    pub async fn list_scenarios(&self) -> Result<ScenarioList, Error> {
        self.get("/simulation/scenarios").await
    }

    /// `POST /simulation/scenarios/run`
    pub async fn run_scenario(&self, request: &ScenarioRequest) -> Result<ScenarioResponse, Error> {
        self.post("/simulation/scenarios/run", request).await
    }

    /// `POST /simulation/scenarios/custom?building_id&scenario_type&duration_hours`
    ///
    /// The parameter map is the whole JSON body.
    pub async fn run_custom_scenario(
        &self,
        request: &CustomScenarioRequest,
    ) -> Result<ScenarioResponse, Error> {
        let params = QueryParams::new()
            .push("building_id", Some(request.building_id.as_str()))
            .push("scenario_type", Some(request.scenario_type.to_string()))
            .push("duration_hours", request.duration_hours);
        let options = RequestOptions::post_json(&request.parameters)?.with_query(params);
        self.request("/simulation/scenarios/custom", options)
            .await
    }

    /// `POST /simulation/mpc/optimize`
    pub async fn optimize_mpc(&self, request: &MpcRequest) -> Result<MpcResponse, Error> {
        self.post("/simulation/mpc/optimize", request).await
    }

    /// `GET /simulation/mpc/quick?building_id&current_temp&setpoint`
    pub async fn quick_mpc(&self, request: &QuickMpcRequest) -> Result<QuickMpcResponse, Error> {
        let params = QueryParams::new()
            .push("building_id", Some(request.building_id.as_str()))
            .push("current_temp", request.current_temp)
            .push("setpoint", request.setpoint);
        self.get_with_query("/simulation/mpc/quick", params)
            .await
    }

    /// `GET /simulation/model/status`
    pub async fn model_status(&self) -> Result<ModelStatus, Error> {
        self.get("/simulation/model/status").await
    }

    /// `POST /simulation/forecast`
    pub async fn forecast(&self, request: &ForecastRequest) -> Result<ForecastResponse, Error> {
        self.post("/simulation/forecast", request).await
    }

    /// `GET /simulation/roi/calculate?...`
    pub async fn calculate_roi(&self, request: &RoiRequest) -> Result<RoiResponse, Error> {
        let params = QueryParams::new()
            .push("annual_energy_kwh", Some(request.annual_energy_kwh))
            .push("energy_price_eur", request.energy_price_eur)
            .push("savings_percent", request.savings_percent)
            .push("implementation_cost_eur", request.implementation_cost_eur)
            .push("maintenance_cost_eur", request.maintenance_cost_eur);
        self.get_with_query("/simulation/roi/calculate", params)
            .await
    }
}
