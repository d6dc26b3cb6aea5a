//! Indoor air quality command handler.

use tabled::Tabled;
use twinboard_core::transform::{IaqZoneView, RandJitter, TrendPoint, iaq_trend, iaq_zones};
use twinboard_core::{Dashboard, IaqStatus};

use crate::cli::{GlobalOpts, IaqArgs, OutputFormat};
use crate::error::CliError;
use crate::output::{self, Tone};

use super::util;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct IaqRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Zone")]
    name: String,
    #[tabled(rename = "CO2 (ppm)")]
    co2: String,
    #[tabled(rename = "PM2.5")]
    pm25: String,
    #[tabled(rename = "TVOC")]
    tvoc: String,
    #[tabled(rename = "AQI")]
    aqi: u32,
    #[tabled(rename = "Level")]
    level: String,
    #[tabled(rename = "PMV")]
    pmv: String,
    #[tabled(rename = "PPD")]
    ppd: String,
    #[tabled(rename = "Comfort")]
    comfort: String,
}

impl From<&IaqZoneView> for IaqRow {
    fn from(z: &IaqZoneView) -> Self {
        Self {
            id: z.zone_id.clone(),
            name: z.zone_name.clone(),
            co2: format!("{:.0}", z.co2_ppm),
            pm25: format!("{:.1}", z.pm25),
            tvoc: format!("{:.0}", z.tvoc),
            aqi: z.aqi,
            level: z.level.to_string(),
            // `~` marks a locally estimated value
            pmv: if z.pmv_estimated {
                format!("~{:+.2}", z.pmv)
            } else {
                format!("{:+.2}", z.pmv)
            },
            ppd: format!("{:.1}%", z.ppd),
            comfort: z.comfort.to_string(),
        }
    }
}

#[derive(Tabled)]
struct TrendRow {
    #[tabled(rename = "Time")]
    at: String,
    #[tabled(rename = "CO2 (ppm)")]
    co2: f64,
    #[tabled(rename = "PM2.5")]
    pm25: f64,
    #[tabled(rename = "TVOC")]
    tvoc: f64,
}

impl From<&TrendPoint> for TrendRow {
    fn from(p: &TrendPoint) -> Self {
        Self {
            at: p.at.format("%m-%d %H:%M").to_string(),
            co2: p.co2_ppm,
            pm25: p.pm25,
            tvoc: p.tvoc,
        }
    }
}

fn aqi_tone(aqi: u32) -> Tone {
    match aqi {
        0..=50 => Tone::Good,
        51..=100 => Tone::Warn,
        _ => Tone::Bad,
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    dashboard: &Dashboard,
    args: IaqArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let status = util::load_scoped(dashboard, global, Dashboard::iaq).await?;

    match args.trend_hours {
        Some(hours) => trend(&status, hours, &args, global),
        None => {
            let zones = iaq_zones(&status);
            let out = output::render_list(
                &global.output,
                &zones,
                |z| IaqRow::from(z),
                |z| z.zone_id.clone(),
            );
            output::print_output(&out, global.quiet);

            if matches!(global.output, OutputFormat::Table) && !global.quiet {
                let color = output::should_color(&global.color);
                let overall = format!("AQI {} ({})", status.avg_aqi, status.overall_level);
                eprintln!(
                    "Building average: {}",
                    output::paint(&overall, aqi_tone(status.avg_aqi), color)
                );
            }
            Ok(())
        }
    }
}

fn trend(status: &IaqStatus, hours: u32, args: &IaqArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let zone = match &args.zone {
        Some(id) => status.zones.iter().find(|z| &z.zone_id == id).ok_or_else(|| {
            CliError::NotFound {
                resource_type: "zone".into(),
                identifier: id.clone(),
                list_command: "iaq".into(),
            }
        })?,
        None => status.zones.first().ok_or_else(|| CliError::NotFound {
            resource_type: "zone".into(),
            identifier: "(any)".into(),
            list_command: "iaq".into(),
        })?,
    };

    let points = match args.seed {
        Some(seed) => iaq_trend(zone, hours, &mut RandJitter::seeded(seed)),
        None => iaq_trend(zone, hours, &mut RandJitter::from_entropy()),
    };

    let out = output::render_list(
        &global.output,
        &points,
        |p| TrendRow::from(p),
        |p| format!("{} {}", p.at.to_rfc3339(), p.co2_ppm),
    );
    output::print_output(&out, global.quiet);
    if matches!(global.output, OutputFormat::Table) && !global.quiet {
        eprintln!(
            "{}: only the last point is measured; earlier points are illustrative",
            zone.zone_name
        );
    }
    Ok(())
}
