use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, warn};

use crate::growth_stage::{GrowthStage, StageProfile};
use crate::indicators::{Fips, IndicatorRow};
use crate::stress::rules::non_negative;

pub const FEATURE_COUNT: usize = 8;

/// Model inputs in contract order.
pub type FeatureArray = [f64; FEATURE_COUNT];

/// Fixed feature set the yield model consumes. Declaration order is the
/// contract order and the tie-break priority for attribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum YieldFeature {
    CumulativeWaterDeficit,
    CumulativeHeatStressDays,
    CumulativeVpd,
    CumulativePrecipitation,
    PollinationPeakHeatDays,
    CurrentNdvi,
    WeekOfSeason,
    PollinationFlag,
}

impl YieldFeature {
    pub const ORDERED: [Self; FEATURE_COUNT] = [
        Self::CumulativeWaterDeficit,
        Self::CumulativeHeatStressDays,
        Self::CumulativeVpd,
        Self::CumulativePrecipitation,
        Self::PollinationPeakHeatDays,
        Self::CurrentNdvi,
        Self::WeekOfSeason,
        Self::PollinationFlag,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CumulativeWaterDeficit => "cumulative_water_deficit",
            Self::CumulativeHeatStressDays => "cumulative_heat_stress_days",
            Self::CumulativeVpd => "cumulative_vpd",
            Self::CumulativePrecipitation => "cumulative_precipitation",
            Self::PollinationPeakHeatDays => "pollination_peak_heat_days",
            Self::CurrentNdvi => "current_ndvi",
            Self::WeekOfSeason => "week_of_season",
            Self::PollinationFlag => "pollination_flag",
        }
    }

    /// Inclusive range a value must fall in before it reaches the model.
    pub const fn valid_range(self) -> (f64, f64) {
        match self {
            Self::CumulativeWaterDeficit => (0.0, 2_000.0),
            Self::CumulativeHeatStressDays => (0.0, 366.0),
            Self::CumulativeVpd => (0.0, 250.0),
            Self::CumulativePrecipitation => (0.0, 3_000.0),
            Self::PollinationPeakHeatDays => (0.0, 7.0),
            Self::CurrentNdvi => (-1.0, 1.0),
            Self::WeekOfSeason => (1.0, 52.0),
            Self::PollinationFlag => (0.0, 1.0),
        }
    }
}

/// Season-to-date features for one county and week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YieldFeatureVector {
    pub cumulative_water_deficit: f64,
    pub cumulative_heat_stress_days: f64,
    pub cumulative_vpd: f64,
    pub cumulative_precipitation: f64,
    pub pollination_peak_heat_days: f64,
    pub current_ndvi: f64,
    pub week_of_season: u32,
    pub pollination_flag: bool,
}

impl YieldFeatureVector {
    pub fn value(&self, feature: YieldFeature) -> f64 {
        match feature {
            YieldFeature::CumulativeWaterDeficit => self.cumulative_water_deficit,
            YieldFeature::CumulativeHeatStressDays => self.cumulative_heat_stress_days,
            YieldFeature::CumulativeVpd => self.cumulative_vpd,
            YieldFeature::CumulativePrecipitation => self.cumulative_precipitation,
            YieldFeature::PollinationPeakHeatDays => self.pollination_peak_heat_days,
            YieldFeature::CurrentNdvi => self.current_ndvi,
            YieldFeature::WeekOfSeason => f64::from(self.week_of_season),
            YieldFeature::PollinationFlag => {
                if self.pollination_flag {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    /// Contract-ordered values, each clamped into its valid range.
    pub fn to_model_input(&self) -> FeatureArray {
        let mut input = [0.0; FEATURE_COUNT];
        for feature in YieldFeature::ORDERED {
            let raw = self.value(feature);
            let (low, high) = feature.valid_range();
            let value = if raw.is_finite() { raw.clamp(low, high) } else { low };
            if value != raw {
                warn!(
                    feature = feature.as_str(),
                    raw,
                    clamped = value,
                    "feature outside validated range clamped"
                );
            }
            input[feature.index()] = value;
        }
        input
    }
}

/// Where the NDVI feature came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "source", content = "week")]
pub enum NdviSource {
    CurrentWeek,
    CarriedForward(u32),
    StageDefault,
}

/// Result of folding the season history up to the target week.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureAccumulation {
    pub features: YieldFeatureVector,
    pub weeks_expected: u32,
    pub weeks_observed: u32,
    pub missing_weeks: Vec<u32>,
    pub ndvi_source: NdviSource,
}

impl FeatureAccumulation {
    pub fn missing_fraction(&self) -> f64 {
        if self.weeks_expected == 0 {
            1.0
        } else {
            self.missing_weeks.len() as f64 / f64::from(self.weeks_expected)
        }
    }
}

/// Fold every row of `history` from week 1 through `current_week` into the
/// feature vector. Missing weeks contribute nothing and are reported.
pub fn accumulate(fips: &Fips, current_week: u32, history: &[IndicatorRow]) -> FeatureAccumulation {
    let mut rows: Vec<&IndicatorRow> = Vec::with_capacity(history.len());
    let mut seen = BTreeSet::new();

    for row in history {
        if &row.fips != fips {
            warn!(expected = %fips, found = %row.fips, "row for another county ignored");
            continue;
        }
        if row.week_of_season == 0 || row.week_of_season > current_week {
            debug!(
                fips = %fips,
                week = row.week_of_season,
                current_week,
                "row outside accumulation range ignored"
            );
            continue;
        }
        if !seen.insert(row.week_of_season) {
            warn!(
                fips = %fips,
                week = row.week_of_season,
                "duplicate week in history; keeping first row"
            );
            continue;
        }
        rows.push(row);
    }
    rows.sort_by_key(|row| row.week_of_season);

    let mut features = YieldFeatureVector {
        cumulative_water_deficit: 0.0,
        cumulative_heat_stress_days: 0.0,
        cumulative_vpd: 0.0,
        cumulative_precipitation: 0.0,
        pollination_peak_heat_days: 0.0,
        current_ndvi: 0.0,
        week_of_season: current_week,
        pollination_flag: current_week >= GrowthStage::Pollination.first_week(),
    };
    let mut latest_ndvi: Option<(u32, f64)> = None;

    for row in &rows {
        let precipitation = row
            .precipitation
            .mean
            .filter(|v| v.is_finite())
            .map(|value| non_negative(row, "precipitation", value));
        let deficit = row
            .water_deficit
            .mean
            .filter(|v| v.is_finite())
            .or_else(|| {
                let eto = row.eto.mean.filter(|v| v.is_finite())?;
                Some(non_negative(row, "eto", eto) - precipitation?)
            });
        let heat_days = row
            .heat_stress_days
            .filter(|v| v.is_finite())
            .map(|days| non_negative(row, "heat_stress_days", days))
            .unwrap_or(0.0);
        let vpd = row
            .vpd
            .mean
            .filter(|v| v.is_finite())
            .map(|value| non_negative(row, "vpd", value))
            .unwrap_or(0.0);

        features.cumulative_water_deficit += deficit.unwrap_or(0.0).max(0.0);
        features.cumulative_heat_stress_days += heat_days;
        features.cumulative_vpd += vpd;
        features.cumulative_precipitation += precipitation.unwrap_or(0.0);

        if GrowthStage::for_week(row.week_of_season).is_pollination() {
            features.pollination_peak_heat_days = features.pollination_peak_heat_days.max(heat_days);
        }

        if let Some(ndvi) = row.ndvi.mean.filter(|v| v.is_finite()) {
            latest_ndvi = Some((row.week_of_season, ndvi));
        }
    }

    let ndvi_source = match latest_ndvi {
        Some((week, ndvi)) => {
            features.current_ndvi = ndvi;
            if week == current_week {
                NdviSource::CurrentWeek
            } else {
                warn!(
                    fips = %fips,
                    current_week,
                    ndvi_week = week,
                    "no NDVI for the requested week; carrying forward latest observation"
                );
                NdviSource::CarriedForward(week)
            }
        }
        None => {
            features.current_ndvi = StageProfile::for_week(current_week).healthy_ndvi;
            warn!(
                fips = %fips,
                current_week,
                "no NDVI observed this season; using stage default"
            );
            NdviSource::StageDefault
        }
    };

    let missing_weeks: Vec<u32> = (1..=current_week)
        .filter(|week| !seen.contains(week))
        .collect();
    if !missing_weeks.is_empty() {
        warn!(
            fips = %fips,
            current_week,
            missing = ?missing_weeks,
            "missing indicator weeks contribute zero to cumulative features"
        );
    }

    FeatureAccumulation {
        features,
        weeks_expected: current_week,
        weeks_observed: rows.len() as u32,
        missing_weeks,
        ndvi_source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::IndicatorStats;
    use chrono::NaiveDate;

    fn fips() -> Fips {
        Fips::parse("19169").expect("story")
    }

    fn week(week: u32) -> IndicatorRow {
        let start = NaiveDate::from_ymd_opt(2024, 4, 29).expect("valid")
            + chrono::Duration::weeks(i64::from(week) - 1);
        let mut row = IndicatorRow::blank(fips(), start, week);
        row.water_deficit = IndicatorStats::from_mean(6.0);
        row.precipitation = IndicatorStats::from_mean(20.0);
        row.vpd = IndicatorStats::from_mean(1.2);
        row.heat_stress_days = Some(if (11..=14).contains(&week) { 3.0 } else { 1.0 });
        row.ndvi = IndicatorStats::from_mean(0.3 + f64::from(week) * 0.02);
        row
    }

    fn season(through: u32) -> Vec<IndicatorRow> {
        (1..=through).map(week).collect()
    }

    #[test]
    fn cumulative_features_never_decrease() {
        let history = season(26);
        let mut previous: Option<YieldFeatureVector> = None;

        for current in 1..=26 {
            let features = accumulate(&fips(), current, &history).features;
            if let Some(prev) = &previous {
                assert!(features.cumulative_water_deficit >= prev.cumulative_water_deficit);
                assert!(features.cumulative_heat_stress_days >= prev.cumulative_heat_stress_days);
                assert!(features.cumulative_vpd >= prev.cumulative_vpd);
                assert!(features.cumulative_precipitation >= prev.cumulative_precipitation);
                assert!(features.pollination_peak_heat_days >= prev.pollination_peak_heat_days);
            }
            previous = Some(features);
        }
    }

    #[test]
    fn surplus_weeks_do_not_reduce_cumulative_deficit() {
        let mut history = season(3);
        history[1].water_deficit = IndicatorStats::from_mean(-15.0);

        let features = accumulate(&fips(), 3, &history).features;
        assert_eq!(features.cumulative_water_deficit, 12.0);
    }

    #[test]
    fn ndvi_comes_from_the_requested_week_only() {
        let history = season(10);
        let accumulation = accumulate(&fips(), 6, &history);

        assert_eq!(accumulation.ndvi_source, NdviSource::CurrentWeek);
        assert!((accumulation.features.current_ndvi - 0.42).abs() < 1e-9);
    }

    #[test]
    fn gaps_are_reported_not_fabricated() {
        let history: Vec<IndicatorRow> = season(8)
            .into_iter()
            .filter(|row| row.week_of_season != 3 && row.week_of_season != 8)
            .collect();

        let accumulation = accumulate(&fips(), 8, &history);
        assert_eq!(accumulation.missing_weeks, vec![3, 8]);
        assert_eq!(accumulation.weeks_observed, 6);
        assert_eq!(accumulation.features.cumulative_precipitation, 120.0);
        assert_eq!(accumulation.ndvi_source, NdviSource::CarriedForward(7));
        assert!((accumulation.missing_fraction() - 0.25).abs() < 1e-9);
    }

    #[test]
    fn pollination_peak_tracks_only_pollination_weeks() {
        let mut history = season(20);
        history[17].heat_stress_days = Some(6.0);

        let features = accumulate(&fips(), 20, &history).features;
        assert_eq!(features.pollination_peak_heat_days, 3.0);
        assert!(features.pollination_flag);
        assert!(!accumulate(&fips(), 9, &history).features.pollination_flag);
    }

    #[test]
    fn other_counties_and_future_weeks_are_ignored() {
        let mut history = season(5);
        let mut stranger = week(2);
        stranger.fips = Fips::parse("19001").expect("adair");
        stranger.precipitation = IndicatorStats::from_mean(500.0);
        history.push(stranger);

        let accumulation = accumulate(&fips(), 4, &history);
        assert_eq!(accumulation.weeks_observed, 4);
        assert_eq!(accumulation.features.cumulative_precipitation, 80.0);
    }

    #[test]
    fn model_input_follows_contract_order_and_ranges() {
        let mut features = accumulate(&fips(), 12, &season(12)).features;
        features.current_ndvi = 1.7;

        let input = features.to_model_input();
        assert_eq!(input[YieldFeature::CurrentNdvi.index()], 1.0);
        assert_eq!(input[YieldFeature::WeekOfSeason.index()], 12.0);
        assert_eq!(input[YieldFeature::PollinationFlag.index()], 1.0);
        assert_eq!(
            input[YieldFeature::CumulativeWaterDeficit.index()],
            features.cumulative_water_deficit
        );
    }
}
