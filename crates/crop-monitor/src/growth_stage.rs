use serde::{Deserialize, Serialize};

use crate::error::AnalyticsError;

/// Length of the modelled growing season in weeks.
pub const SEASON_WEEKS: u32 = 26;

/// Accept a caller-supplied week only when it falls inside `1..=SEASON_WEEKS`.
pub fn season_week(week: u32) -> Result<u32, AnalyticsError> {
    if (1..=SEASON_WEEKS).contains(&week) {
        Ok(week)
    } else {
        Err(AnalyticsError::InvalidWeek {
            week,
            max: SEASON_WEEKS,
        })
    }
}

/// Corn phenology derived from the week of the growing season.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrowthStage {
    Emergence,
    Vegetative,
    Pollination,
    GrainFill,
    Maturity,
}

impl GrowthStage {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::Emergence,
            Self::Vegetative,
            Self::Pollination,
            Self::GrainFill,
            Self::Maturity,
        ]
    }

    /// Stage for a week of the season. Week 0 reads as emergence and weeks
    /// past the season end stay in maturity.
    pub const fn for_week(week_of_season: u32) -> Self {
        match week_of_season {
            0..=4 => Self::Emergence,
            5..=10 => Self::Vegetative,
            11..=14 => Self::Pollination,
            15..=21 => Self::GrainFill,
            _ => Self::Maturity,
        }
    }

    pub const fn first_week(self) -> u32 {
        match self {
            Self::Emergence => 1,
            Self::Vegetative => 5,
            Self::Pollination => 11,
            Self::GrainFill => 15,
            Self::Maturity => 22,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Emergence => "Emergence",
            Self::Vegetative => "Vegetative",
            Self::Pollination => "Pollination",
            Self::GrainFill => "Grain Fill",
            Self::Maturity => "Maturity",
        }
    }

    pub const fn is_pollination(self) -> bool {
        matches!(self, Self::Pollination)
    }
}

/// Per-stage scoring table handed to the sub-index calculators.
///
/// Only pollination departs from the baseline multipliers; the heat thresholds
/// tighten there so temperatures tolerated elsewhere register as stress.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageProfile {
    pub stage: GrowthStage,
    pub water_multiplier: f64,
    pub heat_multiplier: f64,
    /// Surface temperature (°C) where heat stress starts to accrue.
    pub heat_onset_c: f64,
    /// Surface temperature (°C) where the temperature component saturates.
    pub heat_full_c: f64,
    /// Heat-stress days in a week that saturate the day-count component.
    pub heat_days_full: f64,
    /// NDVI expected from a healthy canopy at this stage.
    pub healthy_ndvi: f64,
    /// NDVI below which vegetation is treated as severely stressed.
    pub ndvi_floor: f64,
}

impl StageProfile {
    pub const fn for_stage(stage: GrowthStage) -> Self {
        match stage {
            GrowthStage::Emergence => Self::baseline(stage, 0.35, 0.15),
            GrowthStage::Vegetative => Self::baseline(stage, 0.65, 0.30),
            GrowthStage::Pollination => Self {
                stage,
                water_multiplier: 1.25,
                heat_multiplier: 1.2,
                heat_onset_c: 28.0,
                heat_full_c: 36.0,
                heat_days_full: 4.0,
                healthy_ndvi: 0.75,
                ndvi_floor: 0.30,
            },
            GrowthStage::GrainFill => Self::baseline(stage, 0.70, 0.30),
            GrowthStage::Maturity => Self::baseline(stage, 0.50, 0.30),
        }
    }

    pub const fn for_week(week_of_season: u32) -> Self {
        Self::for_stage(GrowthStage::for_week(week_of_season))
    }

    const fn baseline(stage: GrowthStage, healthy_ndvi: f64, ndvi_floor: f64) -> Self {
        Self {
            stage,
            water_multiplier: 1.0,
            heat_multiplier: 1.0,
            heat_onset_c: 30.0,
            heat_full_c: 40.0,
            heat_days_full: 7.0,
            healthy_ndvi,
            ndvi_floor,
        }
    }
}
