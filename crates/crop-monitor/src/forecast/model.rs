use super::features::{FeatureArray, YieldFeature, FEATURE_COUNT};
use crate::growth_stage::StageProfile;

/// Output of a yield model for one feature vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelOutput {
    /// Bushels per acre.
    pub predicted_yield: f64,
    /// Signed per-feature contribution in bushels per acre, contract order.
    pub contributions: [f64; FEATURE_COUNT],
}

/// Trained regression model plugged into the forecaster. Inputs always arrive
/// in [`YieldFeature::ORDERED`] order, already range-checked.
pub trait YieldModel: Send + Sync {
    fn name(&self) -> &str;
    fn baseline_yield(&self) -> f64;
    fn predict(&self, features: &FeatureArray) -> ModelOutput;
}

/// Linear anomaly model around a county baseline. Cumulative features are
/// compared against their normal weekly accrual times the weeks elapsed, NDVI
/// against the healthy canopy for the current stage.
#[derive(Debug, Clone, PartialEq)]
pub struct AnomalyYieldModel {
    baseline_yield: f64,
    coefficients: [f64; FEATURE_COUNT],
    weekly_normals: [f64; FEATURE_COUNT],
}

const MAX_YIELD: f64 = 320.0;

impl AnomalyYieldModel {
    pub fn new(baseline_yield: f64) -> Self {
        let mut coefficients = [0.0; FEATURE_COUNT];
        coefficients[YieldFeature::CumulativeWaterDeficit.index()] = -0.12;
        coefficients[YieldFeature::CumulativeHeatStressDays.index()] = -1.5;
        coefficients[YieldFeature::CumulativeVpd.index()] = -1.0;
        coefficients[YieldFeature::CumulativePrecipitation.index()] = 0.04;
        coefficients[YieldFeature::PollinationPeakHeatDays.index()] = -4.0;
        coefficients[YieldFeature::CurrentNdvi.index()] = 80.0;

        let mut weekly_normals = [0.0; FEATURE_COUNT];
        weekly_normals[YieldFeature::CumulativeWaterDeficit.index()] = 10.0;
        weekly_normals[YieldFeature::CumulativeHeatStressDays.index()] = 0.5;
        weekly_normals[YieldFeature::CumulativeVpd.index()] = 1.2;
        weekly_normals[YieldFeature::CumulativePrecipitation.index()] = 25.0;

        Self {
            baseline_yield,
            coefficients,
            weekly_normals,
        }
    }

    fn reference(&self, feature: YieldFeature, week: f64) -> f64 {
        match feature {
            YieldFeature::CumulativeWaterDeficit
            | YieldFeature::CumulativeHeatStressDays
            | YieldFeature::CumulativeVpd
            | YieldFeature::CumulativePrecipitation => self.weekly_normals[feature.index()] * week,
            YieldFeature::CurrentNdvi => StageProfile::for_week(week as u32).healthy_ndvi,
            YieldFeature::PollinationPeakHeatDays
            | YieldFeature::WeekOfSeason
            | YieldFeature::PollinationFlag => 0.0,
        }
    }
}

impl Default for AnomalyYieldModel {
    fn default() -> Self {
        Self::new(200.0)
    }
}

impl YieldModel for AnomalyYieldModel {
    fn name(&self) -> &str {
        "anomaly-linear"
    }

    fn baseline_yield(&self) -> f64 {
        self.baseline_yield
    }

    fn predict(&self, features: &FeatureArray) -> ModelOutput {
        let week = features[YieldFeature::WeekOfSeason.index()];
        let mut contributions = [0.0; FEATURE_COUNT];

        for feature in YieldFeature::ORDERED {
            let index = feature.index();
            contributions[index] =
                self.coefficients[index] * (features[index] - self.reference(feature, week));
        }

        let predicted_yield =
            (self.baseline_yield + contributions.iter().sum::<f64>()).clamp(0.0, MAX_YIELD);

        ModelOutput {
            predicted_yield,
            contributions,
        }
    }
}
