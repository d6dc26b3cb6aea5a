// Verb-named action handles, one per user-initiated backend operation.

use std::ops::Deref;
use std::sync::Arc;

use twinboard_api::ApiClient;
use twinboard_api::types::{
    CustomScenarioRequest, ForecastRequest, ForecastResponse, MpcRequest, MpcResponse,
    QuickMpcRequest, QuickMpcResponse, ReportDocument, ReportPeriod, RoiRequest, RoiResponse,
    ScenarioRequest, ScenarioResponse, SetpointResponse, SetpointUpdate, SimulationRequest,
    SimulationResponse,
};

use super::Action;
use crate::error::CoreError;

macro_rules! action_handle {
    (
        $(#[$meta:meta])*
        $name:ident, $label:literal, $args:ty => $out:ty,
        |$client:ident, $arg:ident| $call:expr,
        fn $verb:ident
    ) => {
        $(#[$meta])*
        pub struct $name(Action<$args, $out>);

        impl $name {
            pub fn new(client: Arc<ApiClient>) -> Self {
                Self(Action::new($label, move |$arg: $args| {
                    let $client = Arc::clone(&client);
                    async move { $call.await.map_err(CoreError::from) }
                }))
            }

            pub async fn $verb(&self, args: $args) -> Result<Arc<$out>, CoreError> {
                self.0.trigger(args).await
            }
        }

        impl Deref for $name {
            type Target = Action<$args, $out>;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }
    };
}

action_handle! {
    /// Runs a what-if scenario against the digital twin.
    ScenarioRunner, "run_scenario", ScenarioRequest => ScenarioResponse,
    |client, request| client.run_scenario(&request),
    fn run_scenario
}

action_handle! {
    /// Runs a user-defined scenario; its parameters become the request body.
    CustomScenarioRunner, "run_custom_scenario", CustomScenarioRequest => ScenarioResponse,
    |client, request| client.run_custom_scenario(&request),
    fn run_custom_scenario
}

action_handle! {
    /// Steps the thermal model at a fixed setpoint and HVAC mode.
    ThermalSimulator, "run_simulation", SimulationRequest => SimulationResponse,
    |client, request| client.run_simulation(&request),
    fn simulate
}

action_handle! {
    /// Requests an MPC setpoint schedule.
    MpcOptimizer, "optimize_mpc", MpcRequest => MpcResponse,
    |client, request| client.optimize_mpc(&request),
    fn optimize
}

action_handle! {
    QuickMpcPlanner, "quick_mpc", QuickMpcRequest => QuickMpcResponse,
    |client, request| client.quick_mpc(&request),
    fn plan
}

action_handle! {
    EnergyForecaster, "forecast", ForecastRequest => ForecastResponse,
    |client, request| client.forecast(&request),
    fn forecast
}

action_handle! {
    RoiCalculator, "calculate_roi", RoiRequest => RoiResponse,
    |client, request| client.calculate_roi(&request),
    fn calculate_roi
}

action_handle! {
    /// Downloads the PDF report for `(building_id, period)`.
    ReportGenerator, "generate_report", (String, ReportPeriod) => ReportDocument,
    |client, args| client.generate_report(&args.0, args.1),
    fn generate_report
}

action_handle! {
    /// Pushes a zone setpoint. The response is authoritative for that zone.
    SetpointUpdater, "update_setpoint", (String, SetpointUpdate) => SetpointResponse,
    |client, args| client.update_setpoint(&args.0, &args.1),
    fn update_setpoint
}
