//! KPI command handler.

use twinboard_core::transform::{EnergyQuantity, carbon_tonnes};
use twinboard_core::{Dashboard, Kpis};

use crate::cli::{GlobalOpts, KpisArgs};
use crate::error::CliError;
use crate::output::{self, Tone};

use super::util;

fn detail(k: &Kpis, color: bool) -> String {
    let alerts_tone = if k.active_alerts > 0 { Tone::Warn } else { Tone::Good };
    let uptime_tone = if k.equipment_uptime_percent >= 95.0 {
        Tone::Good
    } else {
        Tone::Warn
    };
    output::detail_lines(&[
        ("Building", k.building_id.clone()),
        ("Period", k.period.clone()),
        (
            "Energy",
            EnergyQuantity::from_kwh(k.energy_consumption_kwh).to_string(),
        ),
        ("Cost", format!("${:.2}", k.energy_cost_usd)),
        (
            "Savings",
            format!("{:.1}% (${:.2})", k.energy_savings_percent, k.energy_savings_usd),
        ),
        (
            "Carbon",
            format!(
                "{:.1} t CO2 ({:.1} kg/m²)",
                carbon_tonnes(k.carbon_footprint_kg),
                k.carbon_intensity
            ),
        ),
        ("EUI", format!("{:.1} kWh/m²", k.eui)),
        ("PUE", util::or_dash(k.pue.map(|p| format!("{p:.2}")))),
        (
            "Indoor",
            format!("{:.1}°C, {:.0}% RH", k.avg_temperature, k.avg_humidity),
        ),
        ("Comfort", format!("{:.0}/100", k.comfort_score)),
        (
            "Uptime",
            output::paint(
                &format!("{:.1}%", k.equipment_uptime_percent),
                uptime_tone,
                color,
            ),
        ),
        (
            "Alerts",
            output::paint(&k.active_alerts.to_string(), alerts_tone, color),
        ),
        ("Maintenance due", k.maintenance_due.to_string()),
    ])
}

pub async fn handle(
    dashboard: &Dashboard,
    args: KpisArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let period = args.period;
    let kpis = util::load_scoped(dashboard, global, |d| d.kpis(period)).await?;

    let color = output::should_color(&global.color);
    let out = output::render_single(
        &global.output,
        kpis.as_ref(),
        |k| detail(k, color),
        |k| k.building_id.clone(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
