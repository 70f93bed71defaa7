use serde::{Deserialize, Serialize};

use super::SubIndexKind;
use crate::error::AnalyticsError;

const WEIGHT_TOLERANCE: f64 = 1e-6;

/// Composite weights per sub-index. Must sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StressWeights {
    pub water: f64,
    pub heat: f64,
    pub vegetation: f64,
    pub atmosphere: f64,
}

impl Default for StressWeights {
    fn default() -> Self {
        Self {
            water: 0.40,
            heat: 0.30,
            vegetation: 0.20,
            atmosphere: 0.10,
        }
    }
}

impl StressWeights {
    pub fn new(
        water: f64,
        heat: f64,
        vegetation: f64,
        atmosphere: f64,
    ) -> Result<Self, AnalyticsError> {
        let weights = Self {
            water,
            heat,
            vegetation,
            atmosphere,
        };
        weights.validate()?;
        Ok(weights)
    }

    pub fn validate(&self) -> Result<(), AnalyticsError> {
        let values = [self.water, self.heat, self.vegetation, self.atmosphere];
        let sum: f64 = values.iter().sum();
        let all_valid = values.iter().all(|value| value.is_finite() && *value >= 0.0);

        if !all_valid || (sum - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(AnalyticsError::InvalidWeightConfiguration { sum });
        }
        Ok(())
    }

    pub const fn weight(&self, kind: SubIndexKind) -> f64 {
        match kind {
            SubIndexKind::WaterStress => self.water,
            SubIndexKind::HeatStress => self.heat,
            SubIndexKind::VegetationHealth => self.vegetation,
            SubIndexKind::AtmosphericStress => self.atmosphere,
        }
    }
}

/// Agronomic thresholds for the sub-index calculators. Stage-dependent values
/// live in [`crate::growth_stage::StageProfile`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StressThresholds {
    /// Weekly water deficit (mm) treated as high stress; 4 mm/day sustained.
    pub high_deficit_mm: f64,
    /// Weekly precipitation (mm) that earns the full relief credit.
    pub abundant_precip_mm: f64,
    /// Points removed from the water score by abundant precipitation.
    pub precip_relief_points: f64,
    pub heat_vpd_onset_kpa: f64,
    pub heat_vpd_full_kpa: f64,
    pub atmos_vpd_onset_kpa: f64,
    pub atmos_vpd_full_kpa: f64,
    pub eto_onset_mm: f64,
    pub eto_full_mm: f64,
}

impl Default for StressThresholds {
    fn default() -> Self {
        Self {
            high_deficit_mm: 28.0,
            abundant_precip_mm: 50.0,
            precip_relief_points: 25.0,
            heat_vpd_onset_kpa: 1.5,
            heat_vpd_full_kpa: 3.5,
            atmos_vpd_onset_kpa: 1.0,
            atmos_vpd_full_kpa: 3.0,
            eto_onset_mm: 25.0,
            eto_full_mm: 50.0,
        }
    }
}

/// Configuration for the composite aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StressConfig {
    pub weights: StressWeights,
    pub thresholds: StressThresholds,
    /// Share of weeks in a requested window that must carry data before the
    /// result is flagged as degraded confidence.
    pub min_window_coverage: f64,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            weights: StressWeights::default(),
            thresholds: StressThresholds::default(),
            min_window_coverage: 0.75,
        }
    }
}
