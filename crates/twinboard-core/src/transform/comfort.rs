// Air quality and thermal comfort classification.

use serde::Serialize;
use strum::Display;
use twinboard_api::types::{IaqStatus, IaqZone};

use super::{round1, round2};

/// Air-quality index band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum AqiLevel {
    Good,
    Moderate,
    #[strum(serialize = "Unhealthy (Sens.)")]
    UnhealthySensitive,
    Unhealthy,
}

impl AqiLevel {
    /// `<=50` Good, `<=100` Moderate, `<=150` sensitive groups, else Unhealthy.
    pub fn from_score(aqi: u32) -> Self {
        match aqi {
            0..=50 => Self::Good,
            51..=100 => Self::Moderate,
            101..=150 => Self::UnhealthySensitive,
            _ => Self::Unhealthy,
        }
    }
}

/// Thermal comfort band from |PMV|.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "lowercase")]
pub enum ComfortClass {
    Comfortable,
    Borderline,
    Uncomfortable,
}

impl ComfortClass {
    pub fn from_pmv(pmv: f64) -> Self {
        let magnitude = pmv.abs();
        if magnitude <= 0.5 {
            Self::Comfortable
        } else if magnitude <= 1.0 {
            Self::Borderline
        } else {
            Self::Uncomfortable
        }
    }
}

const NEUTRAL_TEMP_C: f64 = 22.5;
const PMV_PER_DEGREE: f64 = 0.4;

/// Linear PMV estimate for seated office work at still air.
///
/// Clamped to the ±3 scale and rounded to two decimals.
pub fn estimate_pmv(temperature_c: f64, relative_humidity: f64) -> f64 {
    let thermal = (temperature_c - NEUTRAL_TEMP_C) * PMV_PER_DEGREE;
    let humidity = (relative_humidity - 50.0) * 0.01;
    round2((thermal + humidity).clamp(-3.0, 3.0))
}

/// Predicted percentage dissatisfied for a PMV value.
pub fn ppd(pmv: f64) -> f64 {
    round1(100.0 - 95.0 * (-0.033_53 * pmv.powi(4) - 0.2179 * pmv.powi(2)).exp())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IaqZoneView {
    pub zone_id: String,
    pub zone_name: String,
    pub co2_ppm: f64,
    pub pm25: f64,
    pub tvoc: f64,
    pub aqi: u32,
    pub level: AqiLevel,
    pub pmv: f64,
    pub ppd: f64,
    pub comfort: ComfortClass,
    /// PMV was computed locally because the backend omitted it.
    pub pmv_estimated: bool,
}

pub fn iaq_zone(zone: &IaqZone) -> IaqZoneView {
    let (pmv, pmv_estimated) = match zone.pmv {
        Some(pmv) => (pmv, false),
        None => (estimate_pmv(zone.temperature, zone.humidity), true),
    };
    IaqZoneView {
        zone_id: zone.zone_id.clone(),
        zone_name: zone.zone_name.clone(),
        co2_ppm: round1(zone.co2_ppm),
        pm25: round1(zone.pm25),
        tvoc: round1(zone.tvoc),
        aqi: zone.aqi_score,
        level: AqiLevel::from_score(zone.aqi_score),
        pmv,
        ppd: zone.ppd.unwrap_or_else(|| ppd(pmv)),
        comfort: ComfortClass::from_pmv(pmv),
        pmv_estimated,
    }
}

pub fn iaq_zones(status: &IaqStatus) -> Vec<IaqZoneView> {
    status.zones.iter().map(iaq_zone).collect()
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    #[test]
    fn aqi_boundaries() {
        assert_eq!(AqiLevel::from_score(50).to_string(), "Good");
        assert_eq!(AqiLevel::from_score(51).to_string(), "Moderate");
        assert_eq!(AqiLevel::from_score(100).to_string(), "Moderate");
        assert_eq!(AqiLevel::from_score(150).to_string(), "Unhealthy (Sens.)");
        assert_eq!(AqiLevel::from_score(151).to_string(), "Unhealthy");
    }

    #[test]
    fn pmv_classes_are_symmetric() {
        assert_eq!(ComfortClass::from_pmv(0.5), ComfortClass::Comfortable);
        assert_eq!(ComfortClass::from_pmv(-0.5), ComfortClass::Comfortable);
        assert_eq!(ComfortClass::from_pmv(-1.0), ComfortClass::Borderline);
        assert_eq!(ComfortClass::from_pmv(1.01), ComfortClass::Uncomfortable);
        assert_eq!(ComfortClass::Borderline.to_string(), "borderline");
    }

    #[test]
    fn pmv_estimate_and_ppd() {
        assert!(estimate_pmv(22.5, 50.0).abs() < 1e-9);
        assert!((estimate_pmv(25.0, 60.0) - 1.1).abs() < 1e-9);
        assert!((estimate_pmv(40.0, 90.0) - 3.0).abs() < 1e-9);
        assert!((ppd(0.0) - 5.0).abs() < 1e-9);
        assert!(ppd(1.5) > ppd(0.5));
    }

    #[test]
    fn zone_view_estimates_missing_pmv() {
        let zone = IaqZone {
            zone_id: "z1".into(),
            zone_name: "Open space".into(),
            co2_ppm: 812.34,
            pm25: 8.0,
            tvoc: 120.0,
            humidity: 50.0,
            temperature: 23.75,
            aqi_score: 72,
            aqi_level: "Moderate".into(),
            pmv: None,
            ppd: None,
            timestamp: Utc::now(),
        };
        let view = iaq_zone(&zone);
        assert!(view.pmv_estimated);
        assert!((view.pmv - 0.5).abs() < 1e-9);
        assert_eq!(view.comfort, ComfortClass::Comfortable);
        assert_eq!(view.level, AqiLevel::Moderate);
        assert!((view.co2_ppm - 812.3).abs() < 1e-9);
    }
}
