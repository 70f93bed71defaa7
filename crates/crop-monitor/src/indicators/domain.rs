use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::counties;

/// Validated five digit Iowa county code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Fips(String);

impl Fips {
    pub fn parse(raw: &str) -> Result<Self, InvalidFips> {
        let trimmed = raw.trim();
        if trimmed.len() != 5 || !trimmed.bytes().all(|byte| byte.is_ascii_digit()) {
            return Err(InvalidFips(raw.to_string()));
        }
        if !counties::is_iowa_county(trimmed) {
            return Err(InvalidFips(raw.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fips {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Fips {
    type Error = InvalidFips;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Fips> for String {
    fn from(value: Fips) -> Self {
        value.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not a recognized Iowa county FIPS code")]
pub struct InvalidFips(pub String);

/// County zonal statistics for one indicator over one week.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorStats {
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl IndicatorStats {
    pub const fn empty() -> Self {
        Self {
            mean: None,
            std: None,
            min: None,
            max: None,
        }
    }

    pub fn from_mean(mean: f64) -> Self {
        Self {
            mean: Some(mean),
            ..Self::empty()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.mean.is_none() && self.std.is_none() && self.min.is_none() && self.max.is_none()
    }

    /// Combines several weeks of statistics into one: means of means and stds,
    /// extremes of extremes. Missing values are skipped.
    pub fn combine<'a, I>(stats: I) -> Self
    where
        I: IntoIterator<Item = &'a IndicatorStats>,
    {
        let mut means = Vec::new();
        let mut stds = Vec::new();
        let mut min: Option<f64> = None;
        let mut max: Option<f64> = None;

        for item in stats {
            if let Some(value) = item.mean.filter(|v| v.is_finite()) {
                means.push(value);
            }
            if let Some(value) = item.std.filter(|v| v.is_finite()) {
                stds.push(value);
            }
            if let Some(value) = item.min.filter(|v| v.is_finite()) {
                min = Some(min.map_or(value, |current| current.min(value)));
            }
            if let Some(value) = item.max.filter(|v| v.is_finite()) {
                max = Some(max.map_or(value, |current| current.max(value)));
            }
        }

        Self {
            mean: average(&means),
            std: average(&stds),
            min,
            max,
        }
    }
}

fn average(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// One county, one week of upstream indicator aggregates.
///
/// Units: NDVI unitless, LST in °C, VPD in kPa, ETo, precipitation and water
/// deficit in mm accumulated over the week. `heat_stress_days` counts days in
/// the week whose surface temperature exceeded 32 °C.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRow {
    pub fips: Fips,
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub week_of_season: u32,
    #[serde(default)]
    pub ndvi: IndicatorStats,
    #[serde(default)]
    pub lst: IndicatorStats,
    #[serde(default)]
    pub vpd: IndicatorStats,
    #[serde(default)]
    pub eto: IndicatorStats,
    #[serde(default)]
    pub precipitation: IndicatorStats,
    #[serde(default)]
    pub water_deficit: IndicatorStats,
    #[serde(default)]
    pub heat_stress_days: Option<f64>,
}

impl IndicatorRow {
    /// A row with dates and week set and every indicator missing.
    pub fn blank(fips: Fips, week_start: NaiveDate, week_of_season: u32) -> Self {
        Self {
            fips,
            week_start,
            week_end: week_start + chrono::Duration::days(6),
            week_of_season,
            ndvi: IndicatorStats::empty(),
            lst: IndicatorStats::empty(),
            vpd: IndicatorStats::empty(),
            eto: IndicatorStats::empty(),
            precipitation: IndicatorStats::empty(),
            water_deficit: IndicatorStats::empty(),
            heat_stress_days: None,
        }
    }

    pub fn season_year(&self) -> i32 {
        self.week_start.year()
    }

    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.week_start <= end && self.week_end >= start
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_iowa_counties() {
        assert_eq!(Fips::parse("19001").expect("adair").as_str(), "19001");
        assert_eq!(Fips::parse(" 19197 ").expect("wright").as_str(), "19197");
    }

    #[test]
    fn rejects_codes_outside_iowa() {
        for raw in ["17001", "19002", "19199", "1900", "abcde", ""] {
            assert!(Fips::parse(raw).is_err(), "{raw} should be rejected");
        }
    }

    #[test]
    fn combine_skips_missing_values() {
        let weeks = [
            IndicatorStats {
                mean: Some(2.0),
                std: None,
                min: Some(1.0),
                max: Some(3.0),
            },
            IndicatorStats {
                mean: Some(4.0),
                std: Some(0.5),
                min: None,
                max: Some(6.0),
            },
            IndicatorStats::empty(),
        ];

        let combined = IndicatorStats::combine(weeks.iter());
        assert_eq!(combined.mean, Some(3.0));
        assert_eq!(combined.std, Some(0.5));
        assert_eq!(combined.min, Some(1.0));
        assert_eq!(combined.max, Some(6.0));
    }
}
