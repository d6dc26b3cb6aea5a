// ── Response transforms ──
//
// Pure projections from wire payloads to display-ready view models. No
// network access, no state kept between calls. The synthetic history
// helpers take an explicit `Jitter` source so tests can switch the
// noise off.

pub mod comfort;
pub mod energy;
pub mod equipment;
pub mod hvac;
pub mod simulation;
pub mod synthetic;

pub use comfort::{AqiLevel, ComfortClass, IaqZoneView, estimate_pmv, iaq_zones, ppd};
pub use energy::{
    BASELINE_FACTOR, BreakdownSlice, DailyTotal, EnergyQuantity, EnergyStats, HourlyPoint,
    breakdown_slices, carbon_tonnes, daily_totals, energy_stats, hourly_chart,
};
pub use equipment::{
    AlertSummary, FaultEntry, MaintenanceDue, StatusLabel, alert_summary, fault_list,
    maintenance_due,
};
pub use hvac::{HvacZoneView, ModeLabel, apply_setpoint_response, hvac_zones};
pub use simulation::{ComparisonPoint, MpcRow, RoiSummary, mpc_schedule, roi_summary, scenario_comparison};
pub use synthetic::{
    ForecastPoint, Jitter, MAX_TREND_HOURS, NoJitter, RandJitter, TrendPoint, forecast_chart,
    iaq_trend,
};

/// Round to one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
