//! Simulation command handlers: scenarios, thermal runs, MPC, forecast, ROI.

use serde::Serialize;
use tabled::Tabled;
use twinboard_core::transform::{
    ComparisonPoint, ForecastPoint, MpcRow, RandJitter, RoiSummary, forecast_chart,
    mpc_schedule, roi_summary, scenario_comparison,
};
use twinboard_core::{
    CustomScenarioRequest, Dashboard, ForecastRequest, ModelStatus, MpcRequest, QuickMpcRequest,
    QuickMpcResponse, RoiRequest, Scenario, ScenarioRequest, ScenarioResponse, SimulationRequest,
    SimulationResponse,
};

use crate::cli::{GlobalOpts, OutputFormat, SimulateArgs, SimulateCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct ScenarioRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    scenario_type: String,
    #[tabled(rename = "Est. savings")]
    savings: String,
}

impl From<&Scenario> for ScenarioRow {
    fn from(s: &Scenario) -> Self {
        Self {
            id: s.id.clone(),
            name: s.name.clone(),
            scenario_type: s.scenario_type.clone(),
            savings: format!("{:.0}%", s.estimated_savings_percent),
        }
    }
}

#[derive(Tabled)]
struct ComparisonRow {
    #[tabled(rename = "Hour")]
    hour: usize,
    #[tabled(rename = "Baseline kWh")]
    baseline_kwh: f64,
    #[tabled(rename = "Scenario kWh")]
    scenario_kwh: f64,
    #[tabled(rename = "Baseline °C")]
    baseline_temp: f64,
    #[tabled(rename = "Scenario °C")]
    scenario_temp: f64,
}

impl From<&ComparisonPoint> for ComparisonRow {
    fn from(p: &ComparisonPoint) -> Self {
        Self {
            hour: p.hour,
            baseline_kwh: p.baseline_kwh,
            scenario_kwh: p.scenario_kwh,
            baseline_temp: p.baseline_temp,
            scenario_temp: p.scenario_temp,
        }
    }
}

#[derive(Tabled)]
struct MpcTableRow {
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Setpoint")]
    setpoint: f64,
    #[tabled(rename = "Pred. °C")]
    predicted_temp: f64,
    #[tabled(rename = "kW")]
    power_kw: f64,
    #[tabled(rename = "€/kWh")]
    price: f64,
    #[tabled(rename = "Occ.")]
    occupancy: u32,
    #[tabled(rename = "Outdoor")]
    outdoor_temp: f64,
}

impl From<&MpcRow> for MpcTableRow {
    fn from(r: &MpcRow) -> Self {
        Self {
            time: r.time.clone(),
            setpoint: r.setpoint,
            predicted_temp: r.predicted_temp,
            power_kw: r.power_kw,
            price: r.price,
            occupancy: r.occupancy,
            outdoor_temp: r.outdoor_temp,
        }
    }
}

#[derive(Tabled)]
struct ForecastRow {
    #[tabled(rename = "Time")]
    timestamp: String,
    #[tabled(rename = "kWh")]
    predicted: f64,
    #[tabled(rename = "Low")]
    lower: f64,
    #[tabled(rename = "High")]
    upper: f64,
    #[tabled(rename = "Observed")]
    observed: String,
}

impl From<&ForecastPoint> for ForecastRow {
    fn from(p: &ForecastPoint) -> Self {
        Self {
            timestamp: p.timestamp.clone(),
            predicted: p.predicted,
            lower: p.lower,
            upper: p.upper,
            observed: util::or_dash(p.observed),
        }
    }
}

#[derive(Tabled)]
struct ThermalRow {
    #[tabled(rename = "Time")]
    timestamp: String,
    #[tabled(rename = "Indoor °C")]
    temperature: f64,
    #[tabled(rename = "kWh")]
    energy_kwh: f64,
    #[tabled(rename = "HVAC kW")]
    hvac_power: f64,
}

/// Zip the parallel series of a thermal run into rows.
fn thermal_rows(r: &SimulationResponse) -> Vec<ThermalRow> {
    r.timestamps
        .iter()
        .zip(&r.temperatures)
        .zip(r.energy_kwh.iter().zip(&r.hvac_power))
        .map(|((timestamp, temperature), (energy_kwh, hvac_power))| ThermalRow {
            timestamp: timestamp.clone(),
            temperature: *temperature,
            energy_kwh: *energy_kwh,
            hvac_power: *hvac_power,
        })
        .collect()
}

fn thermal_detail(r: &SimulationResponse) -> String {
    [
        output::detail_lines(&[
            ("Building", r.building_id.clone()),
            ("Duration", format!("{} h", r.duration_hours)),
            ("Energy", format!("{:.1} kWh", r.total_energy_kwh)),
            ("Cost", format!("€{:.2}", r.total_cost_eur)),
            ("Peak power", format!("{:.1} kW", r.peak_power_kw)),
            ("Comfort", format!("{:.0}", r.comfort_score)),
        ]),
        output::render_table(&thermal_rows(r)),
    ]
    .join("\n\n")
}

fn quick_mpc_detail(r: &QuickMpcResponse) -> String {
    let setpoints: Vec<String> = r.optimal_setpoints.iter().map(|s| format!("{s:.1}")).collect();
    output::detail_lines(&[
        ("Status", r.status.clone()),
        ("Setpoints (°C)", setpoints.join(" ")),
        ("Cost savings", format!("{:.1}%", r.cost_savings_percent)),
        ("Comfort", format!("{:.0}", r.comfort_score)),
    ])
}

fn models_detail(status: &ModelStatus) -> String {
    let components = [
        ("thermal_model", &status.thermal_model),
        ("scenario_engine", &status.scenario_engine),
        ("mpc_controller", &status.mpc_controller),
        ("forecaster", &status.forecaster),
    ];
    let pairs: Vec<(&str, String)> = components
        .iter()
        .map(|(name, component)| {
            let details: Vec<String> = component
                .details
                .iter()
                .map(|(key, value)| format!("{key}={value}"))
                .collect();
            let summary = match &component.kind {
                Some(kind) if details.is_empty() => kind.clone(),
                Some(kind) => format!("{kind} ({})", details.join(", ")),
                None => details.join(", "),
            };
            (*name, summary)
        })
        .collect();
    output::detail_lines(&pairs)
}

// ── Scenario run view ───────────────────────────────────────────────

#[derive(Serialize)]
struct ScenarioRunView<'a> {
    #[serde(flatten)]
    response: &'a ScenarioResponse,
    comparison: Vec<ComparisonPoint>,
}

fn scenario_detail(view: &ScenarioRunView<'_>) -> String {
    let r = view.response;
    let rows: Vec<ComparisonRow> = view.comparison.iter().map(ComparisonRow::from).collect();
    let mut sections = vec![
        output::detail_lines(&[
            ("Scenario", format!("{} ({})", r.scenario_name, r.scenario_id)),
            ("Baseline", format!("{:.1} kWh", r.baseline_energy_kwh)),
            ("With scenario", format!("{:.1} kWh", r.scenario_energy_kwh)),
            (
                "Savings",
                format!("{:.1} kWh ({:.1}%)", r.energy_savings_kwh, r.energy_savings_percent),
            ),
            ("Cost savings", format!("€{:.2}", r.cost_savings_eur)),
            ("Carbon savings", format!("{:.1} kg", r.carbon_savings_kg)),
            ("Comfort impact", format!("{:+.2}", r.comfort_impact)),
        ]),
        output::render_table(&rows),
    ];
    if !r.recommendations.is_empty() {
        let recs: Vec<String> = r.recommendations.iter().map(|rec| format!("  - {rec}")).collect();
        sections.push(format!("Recommendations:\n{}", recs.join("\n")));
    }
    sections.join("\n\n")
}

fn roi_detail(s: &RoiSummary) -> String {
    output::detail_lines(&[
        ("Payback", s.payback.clone()),
        ("Annual savings", format!("€{:.2}", s.annual_savings_eur)),
        ("Net annual savings", format!("€{:.2}", s.net_annual_savings_eur)),
        ("5-year savings", format!("€{:.2}", s.five_year_savings_eur)),
        ("NPV (5 years)", format!("€{:.2}", s.npv_eur)),
        ("IRR", format!("{:.1}%", s.irr_percent)),
        ("Carbon reduction", format!("{:.1} t/yr", s.carbon_reduction_tons)),
    ])
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    dashboard: &Dashboard,
    args: SimulateArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let table = matches!(global.output, OutputFormat::Table) && !global.quiet;

    match args.command {
        SimulateCommand::Scenarios => {
            let list = util::load(&dashboard.scenarios()).await?;
            let out = output::render_list(
                &global.output,
                &list.scenarios,
                |s| ScenarioRow::from(s),
                |s| s.id.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        SimulateCommand::Run { scenario, hours } => {
            let building_id = util::select_building(dashboard, global).await?;
            let response = dashboard
                .scenario_runner()
                .run_scenario(ScenarioRequest {
                    building_id,
                    scenario_id: scenario,
                    duration_hours: hours,
                    custom_parameters: None,
                })
                .await?;
            let view = ScenarioRunView {
                response: &response,
                comparison: scenario_comparison(&response),
            };
            let out = output::render_single(&global.output, &view, scenario_detail, |v| {
                v.response.scenario_id.clone()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        SimulateCommand::Custom {
            kind,
            params,
            hours,
        } => {
            let building_id = util::select_building(dashboard, global).await?;
            let response = dashboard
                .custom_scenario_runner()
                .run_custom_scenario(CustomScenarioRequest {
                    building_id,
                    scenario_type: kind,
                    duration_hours: hours,
                    parameters: params.into_iter().collect(),
                })
                .await?;
            let view = ScenarioRunView {
                response: &response,
                comparison: scenario_comparison(&response),
            };
            let out = output::render_single(&global.output, &view, scenario_detail, |v| {
                v.response.scenario_id.clone()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        SimulateCommand::Thermal {
            setpoint,
            mode,
            hours,
        } => {
            util::check_range("setpoint", setpoint, 16.0, 30.0)?;
            let building_id = util::select_building(dashboard, global).await?;
            let response = dashboard
                .thermal_simulator()
                .simulate(SimulationRequest {
                    building_id,
                    duration_hours: hours,
                    setpoint,
                    hvac_mode: mode,
                })
                .await?;
            let out = output::render_single(&global.output, &*response, thermal_detail, |r| {
                format!("{:.1}", r.total_energy_kwh)
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        SimulateCommand::Models => {
            let status = util::load(&dashboard.model_status()).await?;
            let out = output::render_single(&global.output, &*status, models_detail, |s| {
                s.thermal_model.kind.clone().unwrap_or_default()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        SimulateCommand::QuickMpc {
            current_temp,
            setpoint,
        } => {
            let building_id = util::select_building(dashboard, global).await?;
            let response = dashboard
                .quick_mpc_planner()
                .plan(QuickMpcRequest {
                    building_id,
                    current_temp,
                    setpoint,
                })
                .await?;
            let out = output::render_single(&global.output, &*response, quick_mpc_detail, |r| {
                r.status.clone()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        SimulateCommand::Mpc {
            current_temp,
            setpoint,
            horizon,
        } => {
            let building_id = util::select_building(dashboard, global).await?;
            let response = dashboard
                .mpc_optimizer()
                .optimize(MpcRequest {
                    building_id,
                    current_temp,
                    preferred_setpoint: setpoint,
                    horizon_hours: horizon,
                })
                .await?;
            let rows = mpc_schedule(&response);
            let out = output::render_list(
                &global.output,
                &rows,
                |r| MpcTableRow::from(r),
                |r| format!("{} {}", r.time, r.setpoint),
            );
            output::print_output(&out, global.quiet);
            if table {
                eprintln!(
                    "{}: {:.1} kWh, €{:.2} vs €{:.2} baseline ({:.1}% saved), comfort {:.0}, solved in {:.0} ms",
                    response.optimization_status,
                    response.total_energy_kwh,
                    response.total_cost_eur,
                    response.baseline_cost_eur,
                    response.cost_savings_percent,
                    response.comfort_score,
                    response.solve_time_ms
                );
            }
            Ok(())
        }

        SimulateCommand::Forecast {
            horizon,
            observed_hours,
            seed,
        } => {
            let building_id = util::select_building(dashboard, global).await?;
            let response = dashboard
                .forecaster()
                .forecast(ForecastRequest {
                    building_id,
                    horizon_hours: horizon,
                })
                .await?;
            let points = match seed {
                Some(seed) => forecast_chart(&response, observed_hours, &mut RandJitter::seeded(seed)),
                None => forecast_chart(&response, observed_hours, &mut RandJitter::from_entropy()),
            };
            let out = output::render_list(
                &global.output,
                &points,
                |p| ForecastRow::from(p),
                |p| format!("{} {}", p.timestamp, p.predicted),
            );
            output::print_output(&out, global.quiet);
            if table {
                eprintln!(
                    "{}: {:.1} kWh total, {:.1} kWh/h avg, peak {:.1} kWh at hour {}, R² {:.2}",
                    response.model_type,
                    response.total_predicted_kwh,
                    response.avg_hourly_kwh,
                    response.peak_kwh,
                    response.peak_hour,
                    response.model_accuracy_r2
                );
            }
            Ok(())
        }

        SimulateCommand::Roi {
            annual_kwh,
            price,
            savings,
            cost,
            maintenance,
        } => {
            if annual_kwh <= 0.0 {
                return Err(CliError::Validation {
                    field: "annual-kwh".into(),
                    reason: "must be positive".into(),
                });
            }
            let roi = dashboard
                .roi_calculator()
                .calculate_roi(RoiRequest {
                    annual_energy_kwh: annual_kwh,
                    energy_price_eur: price,
                    savings_percent: savings,
                    implementation_cost_eur: cost,
                    maintenance_cost_eur: maintenance,
                })
                .await?;
            let summary = roi_summary(&roi);
            let out = output::render_single(&global.output, &summary, roi_detail, |s| {
                s.payback.clone()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
