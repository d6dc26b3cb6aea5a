//! HVAC zone and setpoint command handlers.

use tabled::Tabled;
use twinboard_core::transform::hvac::hvac_zone;
use twinboard_core::transform::{HvacZoneView, apply_setpoint_response, hvac_zones};
use twinboard_core::{Dashboard, SetpointUpdate};

use crate::cli::{GlobalOpts, OutputFormat, SetpointArgs};
use crate::error::CliError;
use crate::output;

use super::util;

const TEMPERATURE_RANGE: (f64, f64) = (16.0, 30.0);
const HUMIDITY_RANGE: (f64, f64) = (30.0, 70.0);

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct ZoneRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Zone")]
    name: String,
    #[tabled(rename = "Floor")]
    floor: i32,
    #[tabled(rename = "Temp")]
    current_temp: String,
    #[tabled(rename = "Setpoint")]
    setpoint: String,
    #[tabled(rename = "Δ")]
    deviation: String,
    #[tabled(rename = "RH")]
    humidity: String,
    #[tabled(rename = "Occ.")]
    occupancy: u32,
    #[tabled(rename = "Mode")]
    mode: String,
    #[tabled(rename = "Comfort")]
    comfort: String,
}

impl From<&HvacZoneView> for ZoneRow {
    fn from(z: &HvacZoneView) -> Self {
        Self {
            id: z.id.clone(),
            name: z.name.clone(),
            floor: z.floor,
            current_temp: format!("{:.1}°C", z.current_temp),
            setpoint: format!("{:.1}°C", z.setpoint),
            deviation: format!("{:+.1}", z.deviation),
            humidity: format!("{:.0}%", z.humidity),
            occupancy: z.occupancy,
            mode: z.mode.to_string(),
            comfort: z.comfort.to_string(),
        }
    }
}

fn detail(z: &HvacZoneView) -> String {
    output::detail_lines(&[
        ("Zone", format!("{} ({})", z.name, z.id)),
        ("Floor", z.floor.to_string()),
        ("Temperature", format!("{:.1}°C", z.current_temp)),
        ("Setpoint", format!("{:.1}°C", z.setpoint)),
        ("Humidity", format!("{:.0}%", z.humidity)),
        ("Mode", z.mode.to_string()),
        ("Comfort", z.comfort.to_string()),
    ])
}

// ── Handlers ────────────────────────────────────────────────────────

pub async fn handle(dashboard: &Dashboard, global: &GlobalOpts) -> Result<(), CliError> {
    let status = util::load_scoped(dashboard, global, Dashboard::hvac).await?;
    let zones = hvac_zones(&status);

    let out = output::render_list(&global.output, &zones, |z| ZoneRow::from(z), |z| z.id.clone());
    output::print_output(&out, global.quiet);

    if matches!(global.output, OutputFormat::Table) && !global.quiet {
        eprintln!(
            "{} zones, avg {:.1}°C / {:.0}% RH, cooling {:.1} kW, heating {:.1} kW",
            status.total_zones,
            status.avg_temperature,
            status.avg_humidity,
            status.cooling_load_kw,
            status.heating_load_kw
        );
    }
    Ok(())
}

/// Reject empty or out-of-range setpoint changes before any request.
fn validate(args: &SetpointArgs) -> Result<(), CliError> {
    if args.temperature.is_none() && args.humidity.is_none() && args.mode.is_none() {
        return Err(CliError::Validation {
            field: "setpoint".into(),
            reason: "pass at least one of --temperature, --humidity, --mode".into(),
        });
    }
    if let Some(t) = args.temperature {
        util::check_range("temperature", t, TEMPERATURE_RANGE.0, TEMPERATURE_RANGE.1)?;
    }
    if let Some(h) = args.humidity {
        util::check_range("humidity", h, HUMIDITY_RANGE.0, HUMIDITY_RANGE.1)?;
    }
    Ok(())
}

pub async fn handle_setpoint(
    dashboard: &Dashboard,
    args: SetpointArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    validate(&args)?;

    let building_id = util::select_building(dashboard, global).await?;
    let status = util::load(&dashboard.hvac()).await?;
    if !status.zones.iter().any(|z| z.id == args.zone) {
        return Err(CliError::NotFound {
            resource_type: "zone".into(),
            identifier: args.zone,
            list_command: "hvac".into(),
        });
    }

    let update = SetpointUpdate {
        zone_id: args.zone.clone(),
        temperature: args.temperature,
        humidity: args.humidity,
        mode: args.mode,
    };
    let response = dashboard
        .setpoint_updater()
        .update_setpoint((building_id, update))
        .await?;
    if !response.success {
        return Err(CliError::Rejected {
            message: response.message.clone(),
        });
    }

    let updated = apply_setpoint_response(&status, &response);
    let zone = updated
        .zones
        .iter()
        .find(|z| z.id == args.zone)
        .map(hvac_zone)
        .ok_or_else(|| CliError::Internal(format!("zone '{}' vanished", args.zone)))?;

    if !global.quiet {
        eprintln!("{}", response.message);
    }
    let out = output::render_single(&global.output, &zone, detail, |z| z.id.clone());
    output::print_output(&out, global.quiet);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(temperature: Option<f64>, humidity: Option<f64>) -> SetpointArgs {
        SetpointArgs {
            zone: "floor1-office".into(),
            temperature,
            humidity,
            mode: None,
        }
    }

    #[test]
    fn setpoint_needs_a_change() {
        assert!(matches!(
            validate(&args(None, None)),
            Err(CliError::Validation { ref field, .. }) if field == "setpoint"
        ));
    }

    #[test]
    fn setpoint_ranges_are_enforced() {
        assert!(validate(&args(Some(21.5), None)).is_ok());
        assert!(validate(&args(Some(15.9), None)).is_err());
        assert!(validate(&args(None, Some(75.0))).is_err());
        assert!(validate(&args(None, Some(30.0))).is_ok());
    }
}
