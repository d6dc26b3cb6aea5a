//! Equipment and alert command handlers.

use chrono::{TimeDelta, Utc};
use tabled::Tabled;
use twinboard_core::transform::{
    FaultEntry, MaintenanceDue, StatusLabel, alert_summary, fault_list, maintenance_due,
};
use twinboard_core::{Alert, AlertSeverity, Dashboard, Equipment, EquipmentStatus};

use crate::cli::{EquipmentArgs, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output::{self, Tone};

use super::util;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct EquipmentRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    equipment_type: String,
    #[tabled(rename = "Location")]
    location: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Health")]
    health: String,
    #[tabled(rename = "Power (kW)")]
    power: String,
    #[tabled(rename = "Next service")]
    next_maintenance: String,
}

impl From<&Equipment> for EquipmentRow {
    fn from(e: &Equipment) -> Self {
        Self {
            id: e.id.clone(),
            name: e.name.clone(),
            equipment_type: e.equipment_type.clone(),
            location: e.location.clone(),
            status: StatusLabel::from(e.status).to_string(),
            health: format!("{:.0}%", e.health_score),
            power: format!("{:.1}", e.power_kw),
            next_maintenance: util::or_dash(e.next_maintenance.map(|d| d.format("%Y-%m-%d"))),
        }
    }
}

#[derive(Tabled)]
struct FaultRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    equipment_type: String,
    #[tabled(rename = "Location")]
    location: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Health")]
    health: String,
}

impl From<&FaultEntry> for FaultRow {
    fn from(f: &FaultEntry) -> Self {
        Self {
            id: f.id.clone(),
            name: f.name.clone(),
            equipment_type: f.equipment_type.clone(),
            location: f.location.clone(),
            status: f.status.to_string(),
            health: format!("{:.1}%", f.health_score),
        }
    }
}

#[derive(Tabled)]
struct MaintenanceRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Due")]
    due: String,
    #[tabled(rename = "In")]
    days: String,
}

impl From<&MaintenanceDue> for MaintenanceRow {
    fn from(m: &MaintenanceDue) -> Self {
        Self {
            id: m.id.clone(),
            name: m.name.clone(),
            due: m.due.format("%Y-%m-%d").to_string(),
            days: if m.overdue {
                format!("overdue by {}d", m.days_until.unsigned_abs())
            } else {
                format!("{}d", m.days_until)
            },
        }
    }
}

#[derive(Tabled)]
struct AlertRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Equipment")]
    equipment: String,
    #[tabled(rename = "Raised")]
    created: String,
}

impl From<&Alert> for AlertRow {
    fn from(a: &Alert) -> Self {
        Self {
            id: a.id.clone(),
            severity: a.severity.to_string(),
            status: a.status.to_string(),
            title: a.title.clone(),
            equipment: util::or_dash(a.equipment_id.as_deref()),
            created: a.created_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

// ── Handlers ────────────────────────────────────────────────────────

pub async fn handle(
    dashboard: &Dashboard,
    args: EquipmentArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let list = util::load_scoped(dashboard, global, Dashboard::equipment).await?;

    let out = if args.faults {
        let faults = fault_list(&list.equipment);
        output::render_list(&global.output, &faults, |f| FaultRow::from(f), |f| f.id.clone())
    } else if let Some(days) = args.maintenance_days {
        let due = maintenance_due(&list.equipment, Utc::now(), TimeDelta::days(i64::from(days)));
        output::render_list(&global.output, &due, |m| MaintenanceRow::from(m), |m| m.id.clone())
    } else {
        output::render_list(
            &global.output,
            &list.equipment,
            |e| EquipmentRow::from(e),
            |e| e.id.clone(),
        )
    };
    output::print_output(&out, global.quiet);

    let summary_wanted = !args.faults && args.maintenance_days.is_none();
    if summary_wanted && matches!(global.output, OutputFormat::Table) && !global.quiet {
        let color = output::should_color(&global.color);
        let alarms = list
            .equipment
            .iter()
            .filter(|e| e.status == EquipmentStatus::Alarm)
            .count();
        let tone = if alarms > 0 { Tone::Bad } else { Tone::Good };
        eprintln!(
            "{} units, {}",
            list.total,
            output::paint(&format!("{alarms} in alarm"), tone, color)
        );
    }
    Ok(())
}

pub async fn handle_alerts(dashboard: &Dashboard, global: &GlobalOpts) -> Result<(), CliError> {
    let alerts = util::load_scoped(dashboard, global, Dashboard::alerts).await?;

    let out = output::render_list(
        &global.output,
        &alerts.alerts,
        |a| AlertRow::from(a),
        |a| a.id.clone(),
    );
    output::print_output(&out, global.quiet);

    if matches!(global.output, OutputFormat::Table) && !global.quiet {
        let summary = alert_summary(&alerts);
        let color = output::should_color(&global.color);
        let critical = output::paint(
            &format!("{} {}", summary.critical, AlertSeverity::Critical),
            if summary.critical > 0 { Tone::Bad } else { Tone::Good },
            color,
        );
        let warning = output::paint(
            &format!("{} {}", summary.warning, AlertSeverity::Warning),
            if summary.warning > 0 { Tone::Warn } else { Tone::Good },
            color,
        );
        eprintln!(
            "{} alerts, {} active: {critical}, {warning}, {} {}",
            summary.total,
            summary.active,
            summary.info,
            AlertSeverity::Info
        );
    }
    Ok(())
}
