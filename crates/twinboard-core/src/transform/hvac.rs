// HVAC zone display records and setpoint application.

use serde::Serialize;
use strum::Display;
use twinboard_api::types::{HvacMode, HvacStatus, HvacZone, SetpointResponse};

use super::comfort::{ComfortClass, estimate_pmv};
use super::round1;

/// Display label for an HVAC operating mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum ModeLabel {
    Cooling,
    Heating,
    Auto,
    Off,
    Unknown,
}

impl From<HvacMode> for ModeLabel {
    fn from(mode: HvacMode) -> Self {
        match mode {
            HvacMode::Cooling => Self::Cooling,
            HvacMode::Heating => Self::Heating,
            HvacMode::Auto => Self::Auto,
            HvacMode::Off => Self::Off,
            HvacMode::Unknown => Self::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HvacZoneView {
    pub id: String,
    pub name: String,
    pub floor: i32,
    pub current_temp: f64,
    pub setpoint: f64,
    /// `current_temp - setpoint`
    pub deviation: f64,
    pub humidity: f64,
    pub occupancy: u32,
    pub mode: ModeLabel,
    pub comfort: ComfortClass,
}

pub fn hvac_zone(zone: &HvacZone) -> HvacZoneView {
    HvacZoneView {
        id: zone.id.clone(),
        name: zone.name.clone(),
        floor: zone.floor,
        current_temp: round1(zone.current_temp),
        setpoint: round1(zone.setpoint),
        deviation: round1(zone.current_temp - zone.setpoint),
        humidity: round1(zone.humidity),
        occupancy: zone.occupancy,
        mode: zone.mode.into(),
        comfort: ComfortClass::from_pmv(estimate_pmv(zone.current_temp, zone.humidity)),
    }
}

/// Zones ordered by floor, then name.
pub fn hvac_zones(status: &HvacStatus) -> Vec<HvacZoneView> {
    let mut zones: Vec<HvacZoneView> = status.zones.iter().map(hvac_zone).collect();
    zones.sort_by(|a, b| a.floor.cmp(&b.floor).then_with(|| a.name.cmp(&b.name)));
    zones
}

/// Apply a setpoint response to the zone it names.
///
/// The response is authoritative: the targeted zone takes exactly the
/// applied settings, other zones are untouched. A failed response or an
/// unknown zone leaves the status unchanged.
pub fn apply_setpoint_response(status: &HvacStatus, response: &SetpointResponse) -> HvacStatus {
    let mut next = status.clone();
    if !response.success {
        return next;
    }
    if let Some(zone) = next.zones.iter_mut().find(|z| z.id == response.zone_id) {
        let applied = &response.applied_settings;
        if let Some(temperature) = applied.temperature {
            zone.setpoint = temperature;
        }
        if let Some(mode) = applied.mode {
            zone.mode = mode;
        }
    }
    next
}
