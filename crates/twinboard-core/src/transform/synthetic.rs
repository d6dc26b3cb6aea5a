// Synthetic placeholder history.
//
// The backend exposes only current IAQ readings and a forward-looking
// forecast, so trend charts are padded with noise around real values.
// The noise source is injected; `NoJitter` makes every output
// reproducible.

use chrono::{DateTime, TimeDelta, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use twinboard_api::types::{ForecastResponse, IaqZone};

use super::round1;

/// Source of symmetric noise.
pub trait Jitter {
    /// A value in `[-amplitude, amplitude]`.
    fn sample(&mut self, amplitude: f64) -> f64;
}

/// Always zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoJitter;

impl Jitter for NoJitter {
    fn sample(&mut self, _amplitude: f64) -> f64 {
        0.0
    }
}

/// Uniform noise from any `rand` generator.
#[derive(Debug, Clone)]
pub struct RandJitter<R> {
    rng: R,
}

impl<R: Rng> RandJitter<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RandJitter<StdRng> {
    /// Reproducible noise.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: Rng> Jitter for RandJitter<R> {
    fn sample(&mut self, amplitude: f64) -> f64 {
        if amplitude > 0.0 && amplitude.is_finite() {
            self.rng.gen_range(-amplitude..=amplitude)
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub at: DateTime<Utc>,
    pub co2_ppm: f64,
    pub pm25: f64,
    pub tvoc: f64,
}

const CO2_SPREAD: f64 = 40.0;
const PM25_SPREAD: f64 = 3.0;
const TVOC_SPREAD: f64 = 30.0;

/// Longest trend produced, one leap year of hourly points.
pub const MAX_TREND_HOURS: u32 = 24 * 366;

/// `hours` hourly points ending at the zone's reading, capped at
/// [`MAX_TREND_HOURS`]. The last point is the real reading; earlier ones
/// scatter around it. Hours before the earliest representable instant
/// are left out.
pub fn iaq_trend(zone: &IaqZone, hours: u32, jitter: &mut impl Jitter) -> Vec<TrendPoint> {
    (0..hours.min(MAX_TREND_HOURS))
        .rev()
        .filter_map(|ago| {
            let at = zone
                .timestamp
                .checked_sub_signed(TimeDelta::hours(i64::from(ago)))?;
            if ago == 0 {
                return Some(TrendPoint {
                    at,
                    co2_ppm: round1(zone.co2_ppm),
                    pm25: round1(zone.pm25),
                    tvoc: round1(zone.tvoc),
                });
            }
            Some(TrendPoint {
                at,
                co2_ppm: round1((zone.co2_ppm + jitter.sample(CO2_SPREAD)).max(0.0)),
                pm25: round1((zone.pm25 + jitter.sample(PM25_SPREAD)).max(0.0)),
                tvoc: round1((zone.tvoc + jitter.sample(TVOC_SPREAD)).max(0.0)),
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastPoint {
    pub timestamp: String,
    pub predicted: f64,
    pub lower: f64,
    pub upper: f64,
    /// Placeholder "actual" overlay for the first hours.
    pub observed: Option<f64>,
}

/// Observed overlay deviates at most this share from the prediction.
const OBSERVED_SPREAD: f64 = 0.08;

/// Forecast series with a synthetic observed overlay on the first
/// `observed_hours` points.
pub fn forecast_chart(
    forecast: &ForecastResponse,
    observed_hours: usize,
    jitter: &mut impl Jitter,
) -> Vec<ForecastPoint> {
    forecast
        .timestamps
        .iter()
        .zip(&forecast.predicted_kwh)
        .enumerate()
        .map(|(i, (timestamp, predicted))| {
            let lower = forecast.confidence_lower.get(i).copied().unwrap_or(*predicted);
            let upper = forecast.confidence_upper.get(i).copied().unwrap_or(*predicted);
            let observed = (i < observed_hours).then(|| {
                round1((predicted + jitter.sample(predicted.abs() * OBSERVED_SPREAD)).max(0.0))
            });
            ForecastPoint {
                timestamp: timestamp.clone(),
                predicted: round1(*predicted),
                lower: round1(lower),
                upper: round1(upper),
                observed,
            }
        })
        .collect()
}
