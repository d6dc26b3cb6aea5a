// Equipment health, maintenance horizon and alert summaries.

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use strum::Display;
use twinboard_api::types::{AlertList, AlertSeverity, AlertStatus, Equipment, EquipmentStatus};

use super::round1;

/// Display label for an equipment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum StatusLabel {
    Operational,
    #[strum(serialize = "Needs attention")]
    Attention,
    Fault,
    Offline,
    Unknown,
}

impl From<EquipmentStatus> for StatusLabel {
    fn from(status: EquipmentStatus) -> Self {
        match status {
            EquipmentStatus::Running => Self::Operational,
            EquipmentStatus::Warning => Self::Attention,
            EquipmentStatus::Alarm => Self::Fault,
            EquipmentStatus::Offline => Self::Offline,
            EquipmentStatus::Unknown => Self::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FaultEntry {
    pub id: String,
    pub name: String,
    pub equipment_type: String,
    pub location: String,
    pub status: StatusLabel,
    pub health_score: f64,
}

fn severity_rank(status: EquipmentStatus) -> Option<u8> {
    match status {
        EquipmentStatus::Alarm => Some(0),
        EquipmentStatus::Warning => Some(1),
        _ => None,
    }
}

/// Equipment in alarm or warning: alarms first, then lowest health.
pub fn fault_list(equipment: &[Equipment]) -> Vec<FaultEntry> {
    let mut faulty: Vec<(u8, &Equipment)> = equipment
        .iter()
        .filter_map(|e| severity_rank(e.status).map(|rank| (rank, e)))
        .collect();
    faulty.sort_by(|(ra, a), (rb, b)| {
        ra.cmp(rb)
            .then_with(|| a.health_score.total_cmp(&b.health_score))
    });
    faulty
        .into_iter()
        .map(|(_, e)| FaultEntry {
            id: e.id.clone(),
            name: e.name.clone(),
            equipment_type: e.equipment_type.clone(),
            location: e.location.clone(),
            status: e.status.into(),
            health_score: round1(e.health_score),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaintenanceDue {
    pub id: String,
    pub name: String,
    pub due: DateTime<Utc>,
    /// Negative when overdue.
    pub days_until: i64,
    pub overdue: bool,
}

/// Equipment whose next maintenance falls before `now + horizon`,
/// soonest first. Overdue items are included.
pub fn maintenance_due(
    equipment: &[Equipment],
    now: DateTime<Utc>,
    horizon: TimeDelta,
) -> Vec<MaintenanceDue> {
    let limit = now + horizon;
    let mut due: Vec<MaintenanceDue> = equipment
        .iter()
        .filter_map(|e| {
            let next = e.next_maintenance?;
            (next <= limit).then(|| MaintenanceDue {
                id: e.id.clone(),
                name: e.name.clone(),
                due: next,
                days_until: (next - now).num_days(),
                overdue: next < now,
            })
        })
        .collect();
    due.sort_by_key(|d| d.due);
    due
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AlertSummary {
    pub total: usize,
    pub active: usize,
    pub critical: usize,
    pub warning: usize,
    pub info: usize,
}

/// Counts by severity over unresolved alerts.
pub fn alert_summary(alerts: &AlertList) -> AlertSummary {
    let mut summary = AlertSummary {
        total: alerts.alerts.len(),
        ..AlertSummary::default()
    };
    for alert in &alerts.alerts {
        if alert.status == AlertStatus::Resolved {
            continue;
        }
        if alert.status == AlertStatus::Active {
            summary.active += 1;
        }
        match alert.severity {
            AlertSeverity::Critical => summary.critical += 1,
            AlertSeverity::Warning => summary.warning += 1,
            AlertSeverity::Info => summary.info += 1,
            AlertSeverity::Unknown => {}
        }
    }
    summary
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use twinboard_api::types::Alert;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn unit(id: &str, status: EquipmentStatus, health: f64, next_in_days: Option<i64>) -> Equipment {
        Equipment {
            id: id.into(),
            building_id: "pleiades-a".into(),
            name: format!("AHU {id}"),
            equipment_type: "ahu".into(),
            status,
            location: "Roof".into(),
            health_score: health,
            last_maintenance: None,
            next_maintenance: next_in_days.map(|d| now() + TimeDelta::days(d)),
            power_kw: 15.0,
            runtime_hours: 1200.0,
        }
    }

    #[test]
    fn faults_order_alarm_first_then_health() {
        let fleet = vec![
            unit("w-low", EquipmentStatus::Warning, 40.0, None),
            unit("ok", EquipmentStatus::Running, 95.0, None),
            unit("a-high", EquipmentStatus::Alarm, 70.0, None),
            unit("a-low", EquipmentStatus::Alarm, 20.0, None),
        ];
        let ids: Vec<String> = fault_list(&fleet).into_iter().map(|f| f.id).collect();
        assert_eq!(ids, ["a-low", "a-high", "w-low"]);
    }

    #[test]
    fn maintenance_within_horizon_includes_overdue() {
        let fleet = vec![
            unit("late", EquipmentStatus::Running, 80.0, Some(-3)),
            unit("soon", EquipmentStatus::Running, 80.0, Some(5)),
            unit("later", EquipmentStatus::Running, 80.0, Some(45)),
            unit("never", EquipmentStatus::Running, 80.0, None),
        ];
        let due = maintenance_due(&fleet, now(), TimeDelta::days(30));
        assert_eq!(due.len(), 2);
        assert_eq!(due[0].id, "late");
        assert!(due[0].overdue);
        assert_eq!(due[0].days_until, -3);
        assert_eq!(due[1].days_until, 5);
    }

    #[test]
    fn status_labels() {
        assert_eq!(StatusLabel::from(EquipmentStatus::Warning).to_string(), "Needs attention");
        assert_eq!(StatusLabel::from(EquipmentStatus::Alarm).to_string(), "Fault");
    }

    #[test]
    fn alert_summary_skips_resolved() {
        let alert = |severity, status| Alert {
            id: "a".into(),
            building_id: "pleiades-a".into(),
            equipment_id: None,
            severity,
            status,
            title: "t".into(),
            message: "m".into(),
            created_at: now(),
            acknowledged_at: None,
            resolved_at: None,
        };
        let list = AlertList {
            alerts: vec![
                alert(AlertSeverity::Critical, AlertStatus::Active),
                alert(AlertSeverity::Warning, AlertStatus::Acknowledged),
                alert(AlertSeverity::Critical, AlertStatus::Resolved),
            ],
            total: 3,
            by_severity: std::collections::BTreeMap::new(),
        };
        let summary = alert_summary(&list);
        assert_eq!(
            summary,
            AlertSummary {
                total: 3,
                active: 1,
                critical: 1,
                warning: 1,
                info: 0
            }
        );
    }
}
