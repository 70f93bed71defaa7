//! Sequential yield forecast: season-to-date feature accumulation, model
//! invocation, uncertainty band and feature attribution.

pub mod features;
pub mod model;
pub mod uncertainty;

pub use features::{
    accumulate, FeatureAccumulation, FeatureArray, NdviSource, YieldFeature, YieldFeatureVector,
    FEATURE_COUNT,
};
pub use model::{AnomalyYieldModel, ModelOutput, YieldModel};
pub use uncertainty::{half_width, ConfidenceBand};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::AnalyticsError;
use crate::growth_stage::{season_week, GrowthStage};
use crate::indicators::{Fips, IndicatorRow};

/// Forecast policy knobs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// Share of missing weeks above which a forecast is flagged degraded.
    pub max_missing_fraction: f64,
    /// Oldest NDVI observation, in weeks behind the forecast week, that still
    /// counts as current canopy evidence.
    pub max_ndvi_lag_weeks: u32,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            max_missing_fraction: 0.25,
            max_ndvi_lag_weeks: 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastConfidence {
    Confident,
    Degraded,
}

/// Yield forecast for one county, season and week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YieldForecastResult {
    pub fips: Fips,
    pub year: i32,
    pub week_of_season: u32,
    pub growth_stage: GrowthStage,
    pub predicted_yield: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub uncertainty: f64,
    pub baseline_yield: f64,
    pub feature_importance: BTreeMap<YieldFeature, f64>,
    pub primary_driver: YieldFeature,
    pub confidence: ForecastConfidence,
    pub missing_weeks: Vec<u32>,
    pub ndvi_source: NdviSource,
    pub features: YieldFeatureVector,
    pub model: String,
}

/// Runs the model over accumulated features and applies the uncertainty policy.
#[derive(Clone)]
pub struct YieldForecaster {
    model: Arc<dyn YieldModel>,
    config: ForecastConfig,
}

impl YieldForecaster {
    pub fn new(model: Arc<dyn YieldModel>, config: ForecastConfig) -> Self {
        Self { model, config }
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    pub fn forecast(
        &self,
        fips: &Fips,
        year: i32,
        current_week: u32,
        history: &[IndicatorRow],
    ) -> Result<YieldForecastResult, AnalyticsError> {
        season_week(current_week)?;
        let insufficient = || AnalyticsError::InsufficientData {
            fips: fips.to_string(),
            year,
            week: current_week,
        };

        if history.is_empty() {
            return Err(insufficient());
        }

        let accumulation = accumulate(fips, current_week, history);
        if accumulation.weeks_observed == 0 {
            return Err(insufficient());
        }

        let input = accumulation.features.to_model_input();
        let output = self.model.predict(&input);
        let predicted_yield = (output.predicted_yield * 10.0).round() / 10.0;
        let band = ConfidenceBand::around(predicted_yield, current_week);
        let feature_importance = normalized_importance(&output.contributions);
        let primary_driver = primary_feature(&feature_importance);

        let sparse = accumulation.missing_fraction() > self.config.max_missing_fraction;
        let ndvi_stale = match accumulation.ndvi_source {
            NdviSource::CurrentWeek => false,
            NdviSource::CarriedForward(week) => {
                current_week.saturating_sub(week) > self.config.max_ndvi_lag_weeks
            }
            NdviSource::StageDefault => true,
        };

        let confidence = if sparse || ndvi_stale {
            warn!(
                fips = %fips,
                year,
                current_week,
                missing = accumulation.missing_weeks.len(),
                ndvi_source = ?accumulation.ndvi_source,
                sparse,
                ndvi_stale,
                "forecast degraded"
            );
            ForecastConfidence::Degraded
        } else {
            ForecastConfidence::Confident
        };

        debug!(
            fips = %fips,
            year,
            current_week,
            predicted_yield,
            primary_driver = primary_driver.as_str(),
            "yield forecast computed"
        );

        Ok(YieldForecastResult {
            fips: fips.clone(),
            year,
            week_of_season: current_week,
            growth_stage: GrowthStage::for_week(current_week),
            predicted_yield,
            lower_bound: band.lower_bound,
            upper_bound: band.upper_bound,
            uncertainty: band.half_width,
            baseline_yield: self.model.baseline_yield(),
            feature_importance,
            primary_driver,
            confidence,
            missing_weeks: accumulation.missing_weeks,
            ndvi_source: accumulation.ndvi_source,
            features: accumulation.features,
            model: self.model.name().to_string(),
        })
    }
}

/// Absolute contributions scaled to sum to 1.0; uniform when every
/// contribution is zero.
pub fn normalized_importance(contributions: &[f64; FEATURE_COUNT]) -> BTreeMap<YieldFeature, f64> {
    let magnitudes: Vec<f64> = contributions
        .iter()
        .map(|value| if value.is_finite() { value.abs() } else { 0.0 })
        .collect();
    let total: f64 = magnitudes.iter().sum();

    YieldFeature::ORDERED
        .into_iter()
        .map(|feature| {
            let share = if total > 0.0 {
                magnitudes[feature.index()] / total
            } else {
                1.0 / FEATURE_COUNT as f64
            };
            (feature, share)
        })
        .collect()
}

/// Largest share, ties resolved by contract order.
pub fn primary_feature(importance: &BTreeMap<YieldFeature, f64>) -> YieldFeature {
    let mut best = YieldFeature::ORDERED[0];
    let mut best_share = f64::MIN;
    for feature in YieldFeature::ORDERED {
        let share = importance.get(&feature).copied().unwrap_or(0.0);
        if share > best_share {
            best = feature;
            best_share = share;
        }
    }
    best
}
