use tracing::warn;

use super::config::StressThresholds;
use super::status::{round_score, StressStatus};
use super::{SubIndexKind, SubIndexResult};
use crate::growth_stage::StageProfile;
use crate::indicators::IndicatorRow;

const LIMITED_DATA: &str = "limited data";

/// Linear ramp from 0 at `onset` to 1 at `full`.
pub(crate) fn ramp(value: f64, onset: f64, full: f64) -> f64 {
    if full <= onset {
        return if value >= full { 1.0 } else { 0.0 };
    }
    ((value - onset) / (full - onset)).clamp(0.0, 1.0)
}

/// Clamp a reading that cannot physically be negative, logging the correction.
pub(crate) fn non_negative(row: &IndicatorRow, indicator: &'static str, value: f64) -> f64 {
    if value < 0.0 {
        warn!(
            fips = %row.fips,
            week = row.week_of_season,
            indicator,
            value,
            "negative reading clamped to zero"
        );
        0.0
    } else {
        value
    }
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

fn result(kind: SubIndexKind, raw: f64, mut key_driver: String, missing: &[&str]) -> SubIndexResult {
    let value = round_score(raw);
    if !missing.is_empty() {
        key_driver.push_str(&format!(" ({LIMITED_DATA}: {} unavailable)", missing.join(", ")));
    }
    SubIndexResult {
        name: kind,
        value,
        status: StressStatus::from_score(value),
        key_driver,
    }
}

/// Water stress from the weekly water deficit with precipitation relief.
pub fn water_stress(
    row: &IndicatorRow,
    profile: &StageProfile,
    thresholds: &StressThresholds,
) -> SubIndexResult {
    let mut missing = Vec::new();

    let precipitation = finite(row.precipitation.mean)
        .map(|value| non_negative(row, "precipitation", value));
    let deficit = match finite(row.water_deficit.mean) {
        Some(value) => Some(value),
        None => match (finite(row.eto.mean), precipitation) {
            (Some(eto), Some(precip)) => Some(non_negative(row, "eto", eto) - precip),
            _ => None,
        },
    };

    if deficit.is_none() {
        missing.push("water deficit");
    }
    if precipitation.is_none() {
        missing.push("precipitation");
    }

    let deficit_mm = deficit.unwrap_or(0.0);
    let precip_mm = precipitation.unwrap_or(0.0);

    let deficit_points = deficit_mm.max(0.0) / thresholds.high_deficit_mm * 80.0;
    let relief_points = (precip_mm / thresholds.abundant_precip_mm).clamp(0.0, 1.0)
        * thresholds.precip_relief_points;
    let raw = (deficit_points - relief_points) * profile.water_multiplier;

    let mut driver = match deficit {
        Some(value) if value > 0.0 => format!(
            "{value:.1} mm weekly water deficit against {precip_mm:.1} mm precipitation"
        ),
        Some(value) => format!("water surplus of {:.1} mm", value.abs()),
        None => "no water balance data; treated as neutral".to_string(),
    };
    if profile.water_multiplier > 1.0 && raw > 0.0 {
        driver.push_str(&format!(", amplified during {}", profile.stage.label().to_lowercase()));
    }

    result(SubIndexKind::WaterStress, raw, driver, &missing)
}

/// Heat stress from hot days, surface temperature and VPD. Thresholds tighten in pollination.
pub fn heat_stress(
    row: &IndicatorRow,
    profile: &StageProfile,
    thresholds: &StressThresholds,
) -> SubIndexResult {
    let mut missing = Vec::new();

    let heat_days = finite(row.heat_stress_days).map(|days| non_negative(row, "heat_stress_days", days));
    let temperature = finite(row.lst.max).or(finite(row.lst.mean));
    let vpd = finite(row.vpd.mean).map(|value| non_negative(row, "vpd", value));

    if heat_days.is_none() {
        missing.push("heat-day count");
    }
    if temperature.is_none() {
        missing.push("surface temperature");
    }
    if vpd.is_none() {
        missing.push("VPD");
    }

    let days_points = heat_days
        .map(|days| (days / profile.heat_days_full).min(1.0) * 50.0)
        .unwrap_or(0.0);
    let temperature_points = temperature
        .map(|lst| ramp(lst, profile.heat_onset_c, profile.heat_full_c) * 35.0)
        .unwrap_or(0.0);
    let vpd_points = vpd
        .map(|value| ramp(value, thresholds.heat_vpd_onset_kpa, thresholds.heat_vpd_full_kpa) * 15.0)
        .unwrap_or(0.0);

    let raw = (days_points + temperature_points + vpd_points) * profile.heat_multiplier;

    let driver = if days_points == 0.0 && temperature_points == 0.0 && vpd_points == 0.0 {
        if heat_days.is_none() && temperature.is_none() && vpd.is_none() {
            "no thermal data; treated as neutral".to_string()
        } else {
            "temperatures within tolerance".to_string()
        }
    } else if days_points >= temperature_points && days_points >= vpd_points {
        format!(
            "{:.0} day(s) above 32°C during {}",
            heat_days.unwrap_or(0.0),
            profile.stage.label().to_lowercase()
        )
    } else if temperature_points >= vpd_points {
        format!(
            "surface temperature reaching {:.1}°C (stress onset {:.0}°C)",
            temperature.unwrap_or(0.0),
            profile.heat_onset_c
        )
    } else {
        format!("vapor pressure deficit of {:.2} kPa", vpd.unwrap_or(0.0))
    };

    result(SubIndexKind::HeatStress, raw, driver, &missing)
}

/// Vegetation stress from NDVI, inverted: low greenness scores high.
pub fn vegetation_health(row: &IndicatorRow, profile: &StageProfile) -> SubIndexResult {
    let ndvi = finite(row.ndvi.mean).map(|value| {
        if !(-1.0..=1.0).contains(&value) {
            warn!(
                fips = %row.fips,
                week = row.week_of_season,
                value,
                "NDVI outside [-1, 1] clamped"
            );
        }
        value.clamp(-1.0, 1.0)
    });

    let Some(ndvi) = ndvi else {
        return result(
            SubIndexKind::VegetationHealth,
            0.0,
            "no NDVI observation; treated as neutral".to_string(),
            &["NDVI"],
        );
    };

    let healthy = profile.healthy_ndvi;
    let floor = profile.ndvi_floor;
    let raw = if ndvi >= healthy {
        0.0
    } else if ndvi >= floor {
        (healthy - ndvi) / (healthy - floor) * 60.0
    } else {
        60.0 + (floor - ndvi.max(0.0)) / floor * 40.0
    };

    let driver = if ndvi < floor {
        format!(
            "NDVI {ndvi:.2} below the {floor:.2} floor for {}",
            profile.stage.label().to_lowercase()
        )
    } else {
        format!(
            "NDVI {ndvi:.2} against {healthy:.2} expected at {}",
            profile.stage.label().to_lowercase()
        )
    };

    result(SubIndexKind::VegetationHealth, raw, driver, &[])
}

/// Atmospheric demand from VPD and reference evapotranspiration.
pub fn atmospheric_stress(row: &IndicatorRow, thresholds: &StressThresholds) -> SubIndexResult {
    let mut missing = Vec::new();

    let vpd = finite(row.vpd.mean).map(|value| non_negative(row, "vpd", value));
    let eto = finite(row.eto.mean).map(|value| non_negative(row, "eto", value));

    if vpd.is_none() {
        missing.push("VPD");
    }
    if eto.is_none() {
        missing.push("reference ET");
    }

    let vpd_points = vpd
        .map(|value| {
            ramp(value, thresholds.atmos_vpd_onset_kpa, thresholds.atmos_vpd_full_kpa) * 60.0
        })
        .unwrap_or(0.0);
    let eto_points = eto
        .map(|value| ramp(value, thresholds.eto_onset_mm, thresholds.eto_full_mm) * 40.0)
        .unwrap_or(0.0);

    let driver = match (vpd, eto) {
        (Some(vpd), Some(eto)) => {
            format!("VPD {vpd:.2} kPa with {eto:.1} mm weekly reference ET")
        }
        (Some(vpd), None) => format!("VPD {vpd:.2} kPa"),
        (None, Some(eto)) => format!("{eto:.1} mm weekly reference ET"),
        (None, None) => "no evaporative demand data; treated as neutral".to_string(),
    };

    result(SubIndexKind::AtmosphericStress, vpd_points + eto_points, driver, &missing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::growth_stage::GrowthStage;
    use crate::indicators::{Fips, IndicatorStats};
    use chrono::NaiveDate;

    fn row(week: u32) -> IndicatorRow {
        IndicatorRow::blank(
            Fips::parse("19001").expect("adair"),
            NaiveDate::from_ymd_opt(2024, 7, 1).expect("valid"),
            week,
        )
    }

    fn thresholds() -> StressThresholds {
        StressThresholds::default()
    }

    #[test]
    fn water_stress_is_monotone_in_deficit() {
        let profile = StageProfile::for_week(12);
        let mut previous = -1.0;
        for step in 0..60 {
            let mut sample = row(12);
            sample.water_deficit = IndicatorStats::from_mean(step as f64 * 1.5 - 10.0);
            sample.precipitation = IndicatorStats::from_mean(8.0);
            let score = water_stress(&sample, &profile, &thresholds()).value;
            assert!(score >= previous, "score dropped at step {step}");
            assert!((0.0..=100.0).contains(&score));
            previous = score;
        }
        assert_eq!(previous, 100.0);
    }

    #[test]
    fn abundant_rain_pulls_water_stress_down() {
        let profile = StageProfile::for_week(8);
        let mut dry = row(8);
        dry.water_deficit = IndicatorStats::from_mean(14.0);
        dry.precipitation = IndicatorStats::from_mean(0.0);
        let mut wet = dry.clone();
        wet.precipitation = IndicatorStats::from_mean(60.0);

        let dry_score = water_stress(&dry, &profile, &thresholds()).value;
        let wet_score = water_stress(&wet, &profile, &thresholds()).value;
        assert!(wet_score < dry_score);
    }

    #[test]
    fn negative_precipitation_is_clamped() {
        let profile = StageProfile::for_week(8);
        let mut noisy = row(8);
        noisy.water_deficit = IndicatorStats::from_mean(10.0);
        noisy.precipitation = IndicatorStats::from_mean(-4.0);
        let mut clean = noisy.clone();
        clean.precipitation = IndicatorStats::from_mean(0.0);

        assert_eq!(
            water_stress(&noisy, &profile, &thresholds()).value,
            water_stress(&clean, &profile, &thresholds()).value
        );
    }

    #[test]
    fn water_deficit_falls_back_to_eto_minus_precipitation() {
        let profile = StageProfile::for_week(16);
        let mut sample = row(16);
        sample.eto = IndicatorStats::from_mean(40.0);
        sample.precipitation = IndicatorStats::from_mean(12.0);

        let result = water_stress(&sample, &profile, &thresholds());
        assert_eq!(result.value, 74.0);
        assert!(!result.key_driver.contains("limited data"));
    }

    #[test]
    fn missing_inputs_default_to_healthy_with_a_note() {
        let sample = row(16);
        let profile = StageProfile::for_week(16);

        for result in [
            water_stress(&sample, &profile, &thresholds()),
            heat_stress(&sample, &profile, &thresholds()),
            vegetation_health(&sample, &profile),
            atmospheric_stress(&sample, &thresholds()),
        ] {
            assert_eq!(result.value, 0.0);
            assert_eq!(result.status, StressStatus::Healthy);
            assert!(result.key_driver.contains("limited data"), "{}", result.key_driver);
        }
    }

    #[test]
    fn pollination_tightens_heat_scoring() {
        let mut sample = row(0);
        sample.lst = IndicatorStats {
            mean: Some(29.0),
            std: None,
            min: None,
            max: Some(33.0),
        };
        sample.heat_stress_days = Some(2.0);

        let mut vegetative = sample.clone();
        vegetative.week_of_season = 8;
        let mut pollination = sample;
        pollination.week_of_season = 12;

        let before = heat_stress(&vegetative, &StageProfile::for_week(8), &thresholds()).value;
        let during = heat_stress(&pollination, &StageProfile::for_week(12), &thresholds()).value;
        assert!(during > before, "pollination {during} should exceed vegetative {before}");
    }

    #[test]
    fn heat_stress_is_monotone_in_temperature() {
        let profile = StageProfile::for_stage(GrowthStage::Pollination);
        let mut previous = -1.0;
        for tenth in 200..450 {
            let mut sample = row(12);
            sample.lst = IndicatorStats::from_mean(tenth as f64 / 10.0);
            let score = heat_stress(&sample, &profile, &thresholds()).value;
            assert!(score >= previous);
            assert!(score <= 100.0);
            previous = score;
        }
    }

    #[test]
    fn ndvi_below_floor_is_at_least_severe() {
        let profile = StageProfile::for_stage(GrowthStage::GrainFill);
        let mut sample = row(18);
        sample.ndvi = IndicatorStats::from_mean(0.25);

        let result = vegetation_health(&sample, &profile);
        assert!(result.status >= StressStatus::Severe);
        assert!(result.key_driver.contains("floor"));
    }

    #[test]
    fn vegetation_score_never_rises_with_ndvi() {
        let profile = StageProfile::for_stage(GrowthStage::Vegetative);
        let mut previous = f64::MAX;
        for hundredth in -20..=100 {
            let mut sample = row(8);
            sample.ndvi = IndicatorStats::from_mean(hundredth as f64 / 100.0);
            let score = vegetation_health(&sample, &profile).value;
            assert!(score <= previous);
            previous = score;
        }
        assert_eq!(previous, 0.0);
    }

    #[test]
    fn atmospheric_stress_combines_vpd_and_eto() {
        let mut sample = row(16);
        sample.vpd = IndicatorStats::from_mean(2.0);
        sample.eto = IndicatorStats::from_mean(50.0);

        let result = atmospheric_stress(&sample, &thresholds());
        assert_eq!(result.value, 70.0);
        assert_eq!(result.status, StressStatus::Severe);
    }
}
