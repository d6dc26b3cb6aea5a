// Wire types for the digital-twin REST API.
//
// Field names follow the backend's snake_case JSON verbatim. Enumerations
// that the backend may extend carry an `Unknown` catch-all.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

// ── Timestamps ───────────────────────────────────────────────────────

/// Accepts RFC 3339 timestamps as well as naive ISO datetimes
/// (`2024-06-15T10:30:00`), which are read as UTC.
pub mod flexible_datetime {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&value.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid datetime: {raw}")))
    }

    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{Deserialize, Deserializer, Serializer};

        #[allow(clippy::ref_option)]
        pub fn serialize<S: Serializer>(
            value: &Option<DateTime<Utc>>,
            s: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(v) => super::serialize(v, s),
                None => s.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            d: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            Option::<String>::deserialize(d)?
                .map(|raw| {
                    super::parse(&raw).ok_or_else(|| {
                        serde::de::Error::custom(format!("invalid datetime: {raw}"))
                    })
                })
                .transpose()
        }
    }
}

// ── Buildings ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingLocation {
    pub address: String,
    pub city: String,
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Building {
    pub id: String,
    pub name: String,
    pub area_sqm: f64,
    pub floors: u32,
    pub location: BuildingLocation,
    pub year_built: i32,
    pub building_type: String,
    pub occupancy_rate: f64,
    #[serde(with = "flexible_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "flexible_datetime")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingList {
    pub buildings: Vec<Building>,
    pub total: u32,
}

// ── Energy ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Resolution {
    Hourly,
    Daily,
    Monthly,
}

/// Optional filters for the energy endpoint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnergyQuery {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub resolution: Option<Resolution>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyDataPoint {
    #[serde(with = "flexible_datetime")]
    pub timestamp: DateTime<Utc>,
    /// Energy in kWh.
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyBreakdown {
    pub hvac: f64,
    pub lighting: f64,
    pub it_equipment: f64,
    pub other: f64,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyData {
    pub building_id: String,
    #[serde(with = "flexible_datetime")]
    pub period_start: DateTime<Utc>,
    #[serde(with = "flexible_datetime")]
    pub period_end: DateTime<Utc>,
    pub resolution: String,
    pub data_points: Vec<EnergyDataPoint>,
    pub breakdown: EnergyBreakdown,
    pub cost_usd: f64,
    pub carbon_kg: f64,
}

// ── Equipment ────────────────────────────────────────────────────────

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EquipmentStatus {
    Running,
    Warning,
    Alarm,
    Offline,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Equipment {
    pub id: String,
    pub building_id: String,
    pub name: String,
    /// AHU, VAV, Chiller, Boiler, Pump, Fan, Cooling Tower, Heat Exchanger.
    #[serde(rename = "type")]
    pub equipment_type: String,
    pub status: EquipmentStatus,
    pub location: String,
    pub health_score: f64,
    #[serde(default, with = "flexible_datetime::option")]
    pub last_maintenance: Option<DateTime<Utc>>,
    #[serde(default, with = "flexible_datetime::option")]
    pub next_maintenance: Option<DateTime<Utc>>,
    pub power_kw: f64,
    pub runtime_hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentList {
    pub equipment: Vec<Equipment>,
    pub total: u32,
    #[serde(default)]
    pub status_summary: BTreeMap<String, u32>,
}

// ── Alerts ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AlertSeverity {
    Critical,
    Warning,
    Info,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AlertStatus {
    Active,
    Acknowledged,
    Resolved,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub building_id: String,
    #[serde(default)]
    pub equipment_id: Option<String>,
    pub severity: AlertSeverity,
    pub status: AlertStatus,
    pub title: String,
    pub message: String,
    #[serde(with = "flexible_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(default, with = "flexible_datetime::option")]
    pub acknowledged_at: Option<DateTime<Utc>>,
    #[serde(default, with = "flexible_datetime::option")]
    pub resolved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertList {
    pub alerts: Vec<Alert>,
    pub total: u32,
    #[serde(default)]
    pub by_severity: BTreeMap<String, u32>,
}

// ── HVAC ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum HvacMode {
    Cooling,
    Heating,
    Auto,
    Off,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HvacZone {
    pub id: String,
    pub name: String,
    pub floor: i32,
    pub current_temp: f64,
    pub setpoint: f64,
    pub humidity: f64,
    pub occupancy: u32,
    pub mode: HvacMode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HvacStatus {
    pub building_id: String,
    pub zones: Vec<HvacZone>,
    pub total_zones: u32,
    pub avg_temperature: f64,
    pub avg_humidity: f64,
    pub cooling_load_kw: f64,
    pub heating_load_kw: f64,
}

// ── Indoor air quality ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IaqZone {
    pub zone_id: String,
    pub zone_name: String,
    pub co2_ppm: f64,
    pub pm25: f64,
    pub tvoc: f64,
    pub humidity: f64,
    pub temperature: f64,
    pub aqi_score: u32,
    pub aqi_level: String,
    /// Predicted Mean Vote, when the data source computes it.
    #[serde(default)]
    pub pmv: Option<f64>,
    /// Predicted Percentage Dissatisfied.
    #[serde(default)]
    pub ppd: Option<f64>,
    #[serde(with = "flexible_datetime")]
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IaqStatus {
    pub building_id: String,
    pub zones: Vec<IaqZone>,
    pub avg_aqi: u32,
    pub overall_level: String,
}

// ── KPIs ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum KpiPeriod {
    #[default]
    Today,
    Week,
    Month,
    Year,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kpis {
    pub building_id: String,
    pub period: String,
    pub energy_consumption_kwh: f64,
    pub energy_cost_usd: f64,
    pub energy_savings_percent: f64,
    pub energy_savings_usd: f64,
    pub carbon_footprint_kg: f64,
    pub carbon_intensity: f64,
    pub eui: f64,
    #[serde(default)]
    pub pue: Option<f64>,
    pub avg_temperature: f64,
    pub avg_humidity: f64,
    pub comfort_score: f64,
    pub equipment_uptime_percent: f64,
    pub active_alerts: u32,
    pub maintenance_due: u32,
}

// ── Setpoints ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SetpointUpdate {
    pub zone_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<HvacMode>,
}

/// Settings the backend actually applied. Only the keys it changed are set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppliedSettings {
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub humidity: Option<f64>,
    #[serde(default)]
    pub mode: Option<HvacMode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetpointResponse {
    pub success: bool,
    pub zone_id: String,
    pub applied_settings: AppliedSettings,
    pub message: String,
}

// ── Reports ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ReportPeriod {
    Week,
    #[default]
    Month,
    Quarter,
    Year,
}

/// A generated report document (PDF in practice).
#[derive(Debug, Clone, PartialEq)]
pub struct ReportDocument {
    pub building_id: String,
    pub period: ReportPeriod,
    pub content_type: Option<String>,
    pub body: bytes::Bytes,
}

impl ReportDocument {
    /// Suggested file name, e.g. `pleiades-a-month-report.pdf`.
    pub fn file_name(&self) -> String {
        format!("{}-{}-report.pdf", self.building_id, self.period)
    }
}

// ── Simulation ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub scenario_type: String,
    #[serde(default)]
    pub icon: Option<String>,
    pub estimated_savings_percent: f64,
    #[serde(default)]
    pub parameters: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioList {
    pub scenarios: Vec<Scenario>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioRequest {
    pub building_id: String,
    pub scenario_id: String,
    pub duration_hours: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_parameters: Option<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelinePoint {
    pub timestamp: String,
    pub temperature: f64,
    pub energy_cumulative: f64,
    pub hvac_power: f64,
    pub comfort_violation: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioResponse {
    pub scenario_id: String,
    pub scenario_name: String,
    pub baseline_energy_kwh: f64,
    pub scenario_energy_kwh: f64,
    pub energy_savings_kwh: f64,
    pub energy_savings_percent: f64,
    pub cost_savings_eur: f64,
    pub carbon_savings_kg: f64,
    pub comfort_impact: f64,
    pub baseline_timeline: Vec<TimelinePoint>,
    pub scenario_timeline: Vec<TimelinePoint>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MpcRequest {
    pub building_id: String,
    pub current_temp: f64,
    pub preferred_setpoint: f64,
    pub horizon_hours: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MpcScheduleEntry {
    pub hour: u32,
    pub timestamp: String,
    pub setpoint: f64,
    pub predicted_temp: f64,
    pub predicted_power_kw: f64,
    pub electricity_price: f64,
    pub occupancy: u32,
    pub outdoor_temp: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MpcResponse {
    pub optimal_setpoints: Vec<f64>,
    pub predicted_temps: Vec<f64>,
    pub predicted_power: Vec<f64>,
    pub predicted_energy: Vec<f64>,
    pub total_energy_kwh: f64,
    pub total_cost_eur: f64,
    pub baseline_cost_eur: f64,
    pub cost_savings_percent: f64,
    pub comfort_score: f64,
    pub optimization_status: String,
    pub solve_time_ms: f64,
    pub schedule: Vec<MpcScheduleEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRequest {
    pub building_id: String,
    pub horizon_hours: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResponse {
    pub timestamps: Vec<String>,
    pub predicted_kwh: Vec<f64>,
    pub confidence_lower: Vec<f64>,
    pub confidence_upper: Vec<f64>,
    pub total_predicted_kwh: f64,
    pub avg_hourly_kwh: f64,
    pub peak_hour: u32,
    pub peak_kwh: f64,
    pub model_type: String,
    pub model_accuracy_r2: f64,
    #[serde(default)]
    pub feature_importance: BTreeMap<String, f64>,
}

// ── Thermal simulation ───────────────────────────────────────────────

/// HVAC mode for a free-run thermal simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SimulationMode {
    Off,
    Heat,
    Cool,
    #[default]
    Auto,
}

/// Inputs for `POST /simulation/run` (1..=168 h, setpoint 16..=30 °C).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationRequest {
    pub building_id: String,
    pub duration_hours: u32,
    pub setpoint: f64,
    pub hvac_mode: SimulationMode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResponse {
    pub building_id: String,
    pub duration_hours: u32,
    pub timestamps: Vec<String>,
    pub temperatures: Vec<f64>,
    pub energy_kwh: Vec<f64>,
    pub hvac_power: Vec<f64>,
    pub total_energy_kwh: f64,
    pub total_cost_eur: f64,
    pub comfort_score: f64,
    pub peak_power_kw: f64,
}

/// Families of user-defined what-if scenarios.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ScenarioType {
    SetpointChange,
    OccupancyPattern,
    WeatherForecast,
    DemandResponse,
    EquipmentEfficiency,
    ScheduleOptimization,
}

/// Inputs for `POST /simulation/scenarios/custom`. Everything but
/// `parameters` travels in the query string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomScenarioRequest {
    pub building_id: String,
    pub scenario_type: ScenarioType,
    pub duration_hours: Option<u32>,
    pub parameters: serde_json::Map<String, serde_json::Value>,
}

/// Inputs for `GET /simulation/mpc/quick`; unset values use the backend
/// defaults (23 °C current, 22 °C setpoint).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuickMpcRequest {
    pub building_id: String,
    pub current_temp: Option<f64>,
    pub setpoint: Option<f64>,
}

/// First twelve hours of an MPC schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuickMpcResponse {
    pub optimal_setpoints: Vec<f64>,
    pub cost_savings_percent: f64,
    pub comfort_score: f64,
    pub status: String,
}

/// One entry of `GET /simulation/model/status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelComponent {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(flatten)]
    pub details: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelStatus {
    pub thermal_model: ModelComponent,
    pub scenario_engine: ModelComponent,
    pub mpc_controller: ModelComponent,
    pub forecaster: ModelComponent,
}

/// ROI calculator inputs. Unset fields use the backend defaults
/// (0.15 EUR/kWh, 20 %, 50 000 EUR, 5 000 EUR/yr).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoiRequest {
    pub annual_energy_kwh: f64,
    pub energy_price_eur: Option<f64>,
    pub savings_percent: Option<f64>,
    pub implementation_cost_eur: Option<f64>,
    pub maintenance_cost_eur: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoiResponse {
    pub annual_energy_cost_eur: f64,
    pub annual_savings_eur: f64,
    pub net_annual_savings_eur: f64,
    pub payback_months: f64,
    pub payback_years: f64,
    pub npv_5_years_eur: f64,
    pub irr_percent: f64,
    #[serde(rename = "5_year_total_savings_eur")]
    pub five_year_total_savings_eur: f64,
    pub carbon_reduction_tons: f64,
}

// ── Realtime feed ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerReading {
    pub current_power_kw: f64,
    pub today_kwh: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClimateReading {
    pub avg_temperature: f64,
    pub avg_humidity: f64,
    pub cooling_load_kw: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirReading {
    pub avg_co2_ppm: f64,
    pub avg_pm25: f64,
    pub avg_aqi: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OccupancyReading {
    pub current: u32,
    pub capacity: u32,
}

/// One periodic sensor snapshot pushed by the realtime feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReadings {
    pub energy: PowerReading,
    pub hvac: ClimateReading,
    pub iaq: AirReading,
    pub occupancy: OccupancyReading,
}

/// Server-to-client frames of `WS /ws/buildings/{id}/realtime`,
/// discriminated by their `type` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RealtimeMessage {
    Connected {
        building_id: String,
        message: String,
    },
    SensorUpdate {
        building_id: String,
        #[serde(with = "flexible_datetime")]
        timestamp: DateTime<Utc>,
        data: SensorReadings,
    },
    Alert {
        building_id: String,
        #[serde(with = "flexible_datetime")]
        timestamp: DateTime<Utc>,
        severity: String,
        title: String,
        message: String,
    },
    Pong {
        #[serde(with = "flexible_datetime")]
        timestamp: DateTime<Utc>,
    },
    Subscribed {
        #[serde(default)]
        topics: Vec<String>,
    },
    Error {
        message: String,
    },
}

/// Client-to-server frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RealtimeCommand {
    Ping,
    Subscribe { topics: Vec<String> },
}
