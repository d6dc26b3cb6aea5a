//! Energy command handler.

use serde::Serialize;
use tabled::Tabled;
use twinboard_core::transform::{
    BreakdownSlice, DailyTotal, EnergyQuantity, EnergyStats, HourlyPoint, breakdown_slices,
    carbon_tonnes, daily_totals, energy_stats, hourly_chart,
};
use twinboard_core::{Dashboard, EnergyData, EnergyQuery};

use crate::cli::{EnergyArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct HourRow {
    #[tabled(rename = "Hour")]
    label: String,
    #[tabled(rename = "kWh")]
    total: f64,
    #[tabled(rename = "Baseline")]
    baseline: f64,
}

#[derive(Tabled)]
struct DayRow {
    #[tabled(rename = "Day")]
    day: String,
    #[tabled(rename = "kWh")]
    total: f64,
}

#[derive(Tabled)]
struct SliceRow {
    #[tabled(rename = "End use")]
    label: &'static str,
    #[tabled(rename = "kWh")]
    kwh: f64,
    #[tabled(rename = "Share")]
    percent: String,
}

// ── View ────────────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "snake_case")]
enum Series {
    Hourly(Vec<HourlyPoint>),
    Daily(Vec<DailyTotal>),
}

#[derive(Serialize)]
struct EnergyView {
    building_id: String,
    resolution: String,
    series: Series,
    stats: Option<EnergyStats>,
    breakdown: Vec<BreakdownSlice>,
    cost_usd: f64,
    carbon_tonnes: f64,
}

impl EnergyView {
    fn build(data: &EnergyData, daily: bool) -> Self {
        let series = if daily {
            Series::Daily(daily_totals(&data.data_points))
        } else {
            Series::Hourly(hourly_chart(data))
        };
        Self {
            building_id: data.building_id.clone(),
            resolution: data.resolution.clone(),
            series,
            stats: energy_stats(&data.data_points),
            breakdown: breakdown_slices(&data.breakdown),
            cost_usd: data.cost_usd,
            carbon_tonnes: carbon_tonnes(data.carbon_kg),
        }
    }
}

fn series_table(series: &Series) -> String {
    match series {
        Series::Hourly(points) => {
            let rows: Vec<HourRow> = points
                .iter()
                .map(|p| HourRow {
                    label: p.label.clone(),
                    total: p.total,
                    baseline: p.baseline,
                })
                .collect();
            output::render_table(&rows)
        }
        Series::Daily(days) => {
            let rows: Vec<DayRow> = days
                .iter()
                .map(|d| DayRow {
                    day: d.day.to_string(),
                    total: d.total,
                })
                .collect();
            output::render_table(&rows)
        }
    }
}

fn detail(view: &EnergyView) -> String {
    let mut sections = vec![series_table(&view.series)];

    let mut summary = vec![("Building", view.building_id.clone())];
    if let Some(stats) = &view.stats {
        summary.extend([
            ("Total", EnergyQuantity::from_kwh(stats.total).to_string()),
            ("Average", format!("{:.1} kWh", stats.average)),
            ("Minimum", format!("{:.1} kWh", stats.min)),
            (
                "Peak",
                format!("{:.1} kWh at {}", stats.peak, stats.peak_at.format("%Y-%m-%d %H:%M")),
            ),
        ]);
    }
    summary.extend([
        ("Cost", format!("${:.2}", view.cost_usd)),
        ("Carbon", format!("{:.1} t CO2", view.carbon_tonnes)),
    ]);
    sections.push(output::detail_lines(&summary));

    let slices: Vec<SliceRow> = view
        .breakdown
        .iter()
        .map(|s| SliceRow {
            label: s.label,
            kwh: s.kwh,
            percent: format!("{:.1}%", s.percent),
        })
        .collect();
    sections.push(output::render_table(&slices));

    sections.join("\n\n")
}

fn plain(view: &EnergyView) -> String {
    match &view.series {
        Series::Hourly(points) => points
            .iter()
            .map(|p| format!("{} {}", p.label, p.total))
            .collect::<Vec<_>>()
            .join("\n"),
        Series::Daily(days) => days
            .iter()
            .map(|d| format!("{} {}", d.day, d.total))
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    dashboard: &Dashboard,
    args: EnergyArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    if let (Some(from), Some(to)) = (args.from, args.to) {
        if from > to {
            return Err(CliError::Validation {
                field: "from".into(),
                reason: "must not be after --to".into(),
            });
        }
    }

    let query = EnergyQuery {
        from: args.from,
        to: args.to,
        resolution: args.resolution,
    };
    let data = util::load_scoped(dashboard, global, |d| d.energy(query)).await?;

    let view = EnergyView::build(&data, args.daily);
    let out = output::render_single(&global.output, &view, detail, plain);
    output::print_output(&out, global.quiet);
    Ok(())
}
