// Energy series: hourly chart, daily totals, statistics, breakdown.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, Timelike, Utc};
use serde::Serialize;
use twinboard_api::types::{EnergyBreakdown, EnergyData, EnergyDataPoint};

use super::round1;

/// Scale applied to actual consumption to draw the "without optimization"
/// baseline curve.
pub const BASELINE_FACTOR: f64 = 1.15;

/// Points kept by [`hourly_chart`].
pub const CHART_HOURS: usize = 24;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyPoint {
    pub hour: DateTime<Utc>,
    /// `HH:00`
    pub label: String,
    pub total: f64,
    pub baseline: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyTotal {
    pub day: NaiveDate,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnergyStats {
    pub total: f64,
    pub average: f64,
    pub min: f64,
    pub peak: f64,
    pub peak_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakdownSlice {
    pub label: &'static str,
    pub kwh: f64,
    pub percent: f64,
}

fn truncate_to_hour(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.with_minute(0)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(ts)
}

/// Sum points falling in the same clock hour, ascending by hour.
pub fn hourly_buckets(points: &[EnergyDataPoint]) -> Vec<(DateTime<Utc>, f64)> {
    let mut buckets: BTreeMap<DateTime<Utc>, f64> = BTreeMap::new();
    for point in points {
        *buckets.entry(truncate_to_hour(point.timestamp)).or_default() += point.value;
    }
    buckets.into_iter().collect()
}

/// The last 24 hourly buckets with a 1.15x baseline.
pub fn hourly_chart(data: &EnergyData) -> Vec<HourlyPoint> {
    let buckets = hourly_buckets(&data.data_points);
    let skip = buckets.len().saturating_sub(CHART_HOURS);
    buckets
        .into_iter()
        .skip(skip)
        .map(|(hour, total)| HourlyPoint {
            hour,
            label: hour.format("%H:00").to_string(),
            total: round1(total),
            baseline: round1(total * BASELINE_FACTOR),
        })
        .collect()
}

pub fn daily_totals(points: &[EnergyDataPoint]) -> Vec<DailyTotal> {
    let mut days: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for point in points {
        *days.entry(point.timestamp.date_naive()).or_default() += point.value;
    }
    days.into_iter()
        .map(|(day, total)| DailyTotal {
            day,
            total: round1(total),
        })
        .collect()
}

/// Total, average, minimum and peak of a series. `None` when empty.
pub fn energy_stats(points: &[EnergyDataPoint]) -> Option<EnergyStats> {
    let first = points.first()?;
    let mut total = 0.0;
    let mut min = first.value;
    let mut peak = first;
    for point in points {
        total += point.value;
        min = min.min(point.value);
        if point.value > peak.value {
            peak = point;
        }
    }
    #[allow(clippy::cast_precision_loss, clippy::as_conversions)]
    let average = total / points.len() as f64;
    Some(EnergyStats {
        total: round1(total),
        average: round1(average),
        min: round1(min),
        peak: round1(peak.value),
        peak_at: peak.timestamp,
    })
}

/// Consumption split by end use with percentages of the total.
pub fn breakdown_slices(breakdown: &EnergyBreakdown) -> Vec<BreakdownSlice> {
    let parts = [
        ("HVAC", breakdown.hvac),
        ("Lighting", breakdown.lighting),
        ("IT Equipment", breakdown.it_equipment),
        ("Other", breakdown.other),
    ];
    parts
        .into_iter()
        .map(|(label, kwh)| BreakdownSlice {
            label,
            kwh: round1(kwh),
            percent: if breakdown.total > 0.0 {
                round1(kwh / breakdown.total * 100.0)
            } else {
                0.0
            },
        })
        .collect()
}

/// An energy amount scaled for display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EnergyQuantity {
    Kwh(f64),
    Mwh(f64),
}

impl EnergyQuantity {
    /// MWh at or above 1000 kWh, kWh below.
    pub fn from_kwh(kwh: f64) -> Self {
        if kwh.abs() >= 1000.0 {
            Self::Mwh(round1(kwh / 1000.0))
        } else {
            Self::Kwh(round1(kwh))
        }
    }

    pub fn as_kwh(self) -> f64 {
        match self {
            Self::Kwh(v) => v,
            Self::Mwh(v) => v * 1000.0,
        }
    }
}

impl fmt::Display for EnergyQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Kwh(v) => write!(f, "{v:.1} kWh"),
            Self::Mwh(v) => write!(f, "{v:.1} MWh"),
        }
    }
}

/// Kilograms of CO2 to tonnes, one decimal.
pub fn carbon_tonnes(kg: f64) -> f64 {
    round1(kg / 1000.0)
}
