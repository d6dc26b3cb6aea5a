// Scenario comparison, MPC schedule and ROI views.

use serde::Serialize;
use twinboard_api::types::flexible_datetime;
use twinboard_api::types::{MpcResponse, RoiResponse, ScenarioResponse};

use super::{round1, round2};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonPoint {
    pub hour: usize,
    pub timestamp: String,
    pub baseline_kwh: f64,
    pub scenario_kwh: f64,
    pub baseline_temp: f64,
    pub scenario_temp: f64,
}

/// Baseline and scenario timelines side by side, truncated to the
/// shorter of the two.
pub fn scenario_comparison(response: &ScenarioResponse) -> Vec<ComparisonPoint> {
    response
        .baseline_timeline
        .iter()
        .zip(&response.scenario_timeline)
        .enumerate()
        .map(|(hour, (base, scen))| ComparisonPoint {
            hour,
            timestamp: base.timestamp.clone(),
            baseline_kwh: round1(base.energy_cumulative),
            scenario_kwh: round1(scen.energy_cumulative),
            baseline_temp: round1(base.temperature),
            scenario_temp: round1(scen.temperature),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MpcRow {
    pub hour: u32,
    /// `HH:MM` when the timestamp parses, the raw string otherwise.
    pub time: String,
    pub setpoint: f64,
    pub predicted_temp: f64,
    pub power_kw: f64,
    pub price: f64,
    pub occupancy: u32,
    pub outdoor_temp: f64,
}

pub fn mpc_schedule(response: &MpcResponse) -> Vec<MpcRow> {
    response
        .schedule
        .iter()
        .map(|entry| MpcRow {
            hour: entry.hour,
            time: flexible_datetime::parse(&entry.timestamp)
                .map_or_else(|| entry.timestamp.clone(), |ts| ts.format("%H:%M").to_string()),
            setpoint: round1(entry.setpoint),
            predicted_temp: round1(entry.predicted_temp),
            power_kw: round2(entry.predicted_power_kw),
            price: round2(entry.electricity_price),
            occupancy: entry.occupancy,
            outdoor_temp: round1(entry.outdoor_temp),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoiSummary {
    /// "18 months" under two years, "2.5 years" otherwise.
    pub payback: String,
    pub annual_savings_eur: f64,
    pub net_annual_savings_eur: f64,
    pub five_year_savings_eur: f64,
    pub npv_eur: f64,
    pub irr_percent: f64,
    pub carbon_reduction_tons: f64,
}

pub fn roi_summary(roi: &RoiResponse) -> RoiSummary {
    let payback = if !roi.payback_months.is_finite() || roi.payback_months <= 0.0 {
        "never".to_owned()
    } else if roi.payback_months < 24.0 {
        format!("{:.0} months", roi.payback_months.ceil())
    } else {
        format!("{:.1} years", roi.payback_years)
    };
    RoiSummary {
        payback,
        annual_savings_eur: round2(roi.annual_savings_eur),
        net_annual_savings_eur: round2(roi.net_annual_savings_eur),
        five_year_savings_eur: round2(roi.five_year_total_savings_eur),
        npv_eur: round2(roi.npv_5_years_eur),
        irr_percent: round1(roi.irr_percent),
        carbon_reduction_tons: round1(roi.carbon_reduction_tons),
    }
}
