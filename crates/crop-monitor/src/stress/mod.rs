//! Composite Crop Stress Index: four sub-indices, weighted aggregation, driver
//! attribution and recommendations.

mod config;
mod recommendations;
pub mod rules;
mod status;

pub use config::{StressConfig, StressThresholds, StressWeights};
pub use recommendations::recommendations;
pub use status::{round_score, StressStatus};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::error::AnalyticsError;
use crate::growth_stage::{GrowthStage, StageProfile};
use crate::indicators::{Fips, IndicatorRow};

/// The four stress components. Declaration order is the tie-break priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubIndexKind {
    WaterStress,
    HeatStress,
    VegetationHealth,
    AtmosphericStress,
}

impl SubIndexKind {
    pub const fn priority_order() -> [Self; 4] {
        [
            Self::WaterStress,
            Self::HeatStress,
            Self::VegetationHealth,
            Self::AtmosphericStress,
        ]
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::WaterStress => "water_stress",
            Self::HeatStress => "heat_stress",
            Self::VegetationHealth => "vegetation_health",
            Self::AtmosphericStress => "atmospheric_stress",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::WaterStress => "Water Stress",
            Self::HeatStress => "Heat Stress",
            Self::VegetationHealth => "Vegetation Health",
            Self::AtmosphericStress => "Atmospheric Stress",
        }
    }
}

/// Score for one sub-index and one week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubIndexResult {
    pub name: SubIndexKind,
    pub value: f64,
    pub status: StressStatus,
    pub key_driver: String,
}

/// Weeks the requested window should contain versus weeks that carried data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataCoverage {
    pub weeks_expected: u32,
    pub weeks_observed: u32,
    pub degraded_confidence: bool,
}

impl DataCoverage {
    pub fn ratio(&self) -> f64 {
        if self.weeks_expected == 0 {
            1.0
        } else {
            f64::from(self.weeks_observed) / f64::from(self.weeks_expected)
        }
    }
}

/// Output of the aggregator for one representative week of indicators.
#[derive(Debug, Clone, PartialEq)]
pub struct StressAssessment {
    pub growth_stage: GrowthStage,
    pub water_stress: SubIndexResult,
    pub heat_stress: SubIndexResult,
    pub vegetation_health: SubIndexResult,
    pub atmospheric_stress: SubIndexResult,
    pub overall_stress_index: f64,
    pub overall_status: StressStatus,
    pub primary_driver: SubIndexKind,
    pub secondary_driver: SubIndexKind,
    pub farm_recommendations: Vec<String>,
}

impl StressAssessment {
    pub fn sub_index(&self, kind: SubIndexKind) -> &SubIndexResult {
        match kind {
            SubIndexKind::WaterStress => &self.water_stress,
            SubIndexKind::HeatStress => &self.heat_stress,
            SubIndexKind::VegetationHealth => &self.vegetation_health,
            SubIndexKind::AtmosphericStress => &self.atmospheric_stress,
        }
    }
}

/// Composite stress response for one county and window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeStressResult {
    pub fips: Fips,
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub week_of_season: u32,
    pub growth_stage: GrowthStage,
    pub water_stress: SubIndexResult,
    pub heat_stress: SubIndexResult,
    pub vegetation_health: SubIndexResult,
    pub atmospheric_stress: SubIndexResult,
    pub overall_stress_index: f64,
    pub overall_status: StressStatus,
    pub primary_driver: SubIndexKind,
    pub secondary_driver: SubIndexKind,
    pub farm_recommendations: Vec<String>,
    pub coverage: DataCoverage,
}

impl CompositeStressResult {
    pub fn from_assessment(
        fips: Fips,
        week_start: NaiveDate,
        week_end: NaiveDate,
        week_of_season: u32,
        assessment: StressAssessment,
        coverage: DataCoverage,
    ) -> Self {
        Self {
            fips,
            week_start,
            week_end,
            week_of_season,
            growth_stage: assessment.growth_stage,
            water_stress: assessment.water_stress,
            heat_stress: assessment.heat_stress,
            vegetation_health: assessment.vegetation_health,
            atmospheric_stress: assessment.atmospheric_stress,
            overall_stress_index: assessment.overall_stress_index,
            overall_status: assessment.overall_status,
            primary_driver: assessment.primary_driver,
            secondary_driver: assessment.secondary_driver,
            farm_recommendations: assessment.farm_recommendations,
            coverage,
        }
    }
}

/// Stateless aggregator holding validated weights and thresholds.
#[derive(Debug, Clone)]
pub struct CompositeAggregator {
    config: StressConfig,
}

impl CompositeAggregator {
    /// Fails when the weights do not sum to 1.0.
    pub fn new(config: StressConfig) -> Result<Self, AnalyticsError> {
        config.weights.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &StressConfig {
        &self.config
    }

    pub fn assess(&self, row: &IndicatorRow) -> StressAssessment {
        let profile = StageProfile::for_week(row.week_of_season);
        let thresholds = &self.config.thresholds;

        let water_stress = rules::water_stress(row, &profile, thresholds);
        let heat_stress = rules::heat_stress(row, &profile, thresholds);
        let vegetation_health = rules::vegetation_health(row, &profile);
        let atmospheric_stress = rules::atmospheric_stress(row, thresholds);

        let values = [
            (SubIndexKind::WaterStress, water_stress.value),
            (SubIndexKind::HeatStress, heat_stress.value),
            (SubIndexKind::VegetationHealth, vegetation_health.value),
            (SubIndexKind::AtmosphericStress, atmospheric_stress.value),
        ];

        let overall_stress_index = round_score(self.combine(&values));
        let overall_status = StressStatus::from_score(overall_stress_index);
        let (primary_driver, secondary_driver) = self.rank_drivers(&values);

        let primary_status = values
            .iter()
            .find(|(kind, _)| *kind == primary_driver)
            .map(|(_, value)| StressStatus::from_score(*value))
            .unwrap_or(overall_status);
        let farm_recommendations = recommendations(primary_driver, primary_status)
            .iter()
            .map(|line| line.to_string())
            .collect();

        StressAssessment {
            growth_stage: profile.stage,
            water_stress,
            heat_stress,
            vegetation_health,
            atmospheric_stress,
            overall_stress_index,
            overall_status,
            primary_driver,
            secondary_driver,
            farm_recommendations,
        }
    }

    /// Weighted sum of sub-index values.
    pub fn combine(&self, values: &[(SubIndexKind, f64)]) -> f64 {
        values
            .iter()
            .map(|(kind, value)| self.config.weights.weight(*kind) * value)
            .sum()
    }

    /// Primary and secondary driver by weighted contribution, ties broken by
    /// sub-index priority.
    pub fn rank_drivers(&self, values: &[(SubIndexKind, f64)]) -> (SubIndexKind, SubIndexKind) {
        let mut contributions: Vec<(SubIndexKind, f64)> = SubIndexKind::priority_order()
            .into_iter()
            .map(|kind| {
                let value = values
                    .iter()
                    .find(|(candidate, _)| *candidate == kind)
                    .map(|(_, value)| *value)
                    .unwrap_or(0.0);
                let contribution = self.config.weights.weight(kind) * value;
                (kind, (contribution * 1e6).round() / 1e6)
            })
            .collect();

        contributions.sort_by(|a, b| match b.1.total_cmp(&a.1) {
            Ordering::Equal => a.0.cmp(&b.0),
            other => other,
        });

        (contributions[0].0, contributions[1].0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::IndicatorStats;

    fn aggregator() -> CompositeAggregator {
        CompositeAggregator::new(StressConfig::default()).expect("default weights valid")
    }

    fn scenario_row() -> IndicatorRow {
        let mut row = IndicatorRow::blank(
            Fips::parse("19001").expect("adair"),
            NaiveDate::from_ymd_opt(2024, 8, 26).expect("valid"),
            18,
        );
        row.water_deficit = IndicatorStats::from_mean(25.0);
        row.heat_stress_days = Some(8.0);
        row.ndvi = IndicatorStats::from_mean(0.5);
        row
    }

    #[test]
    fn construction_rejects_weights_summing_below_one() {
        let config = StressConfig {
            weights: StressWeights {
                water: 0.40,
                heat: 0.30,
                vegetation: 0.15,
                atmosphere: 0.10,
            },
            ..StressConfig::default()
        };

        match CompositeAggregator::new(config) {
            Err(AnalyticsError::InvalidWeightConfiguration { .. }) => {}
            other => panic!("expected weight rejection, got {other:?}"),
        }
    }

    #[test]
    fn drivers_use_weighted_contribution_not_raw_value() {
        let values = [
            (SubIndexKind::WaterStress, 50.0),
            (SubIndexKind::HeatStress, 90.0),
            (SubIndexKind::VegetationHealth, 0.0),
            (SubIndexKind::AtmosphericStress, 0.0),
        ];
        let (primary, secondary) = aggregator().rank_drivers(&values);
        assert_eq!(primary, SubIndexKind::HeatStress);
        assert_eq!(secondary, SubIndexKind::WaterStress);

        let values = [
            (SubIndexKind::WaterStress, 60.0),
            (SubIndexKind::HeatStress, 10.0),
            (SubIndexKind::VegetationHealth, 10.0),
            (SubIndexKind::AtmosphericStress, 95.0),
        ];
        let (primary, _) = aggregator().rank_drivers(&values);
        assert_eq!(primary, SubIndexKind::WaterStress);
    }

    #[test]
    fn ties_follow_priority_order() {
        let values = [
            (SubIndexKind::WaterStress, 30.0),
            (SubIndexKind::HeatStress, 40.0),
            (SubIndexKind::VegetationHealth, 0.0),
            (SubIndexKind::AtmosphericStress, 0.0),
        ];
        let (primary, secondary) = aggregator().rank_drivers(&values);
        assert_eq!(primary, SubIndexKind::WaterStress);
        assert_eq!(secondary, SubIndexKind::HeatStress);

        let (primary, secondary) = aggregator().rank_drivers(&[]);
        assert_eq!(primary, SubIndexKind::WaterStress);
        assert_eq!(secondary, SubIndexKind::HeatStress);
    }

    #[test]
    fn grain_fill_drought_scenario() {
        let assessment = aggregator().assess(&scenario_row());

        assert_eq!(assessment.growth_stage, GrowthStage::GrainFill);
        assert!(matches!(
            assessment.overall_status,
            StressStatus::Moderate | StressStatus::Severe
        ));
        assert!(matches!(
            assessment.primary_driver,
            SubIndexKind::WaterStress | SubIndexKind::HeatStress
        ));
        assert!(!assessment.farm_recommendations.is_empty());
    }

    #[test]
    fn all_scores_stay_in_range_for_extreme_inputs() {
        let mut row = scenario_row();
        row.week_of_season = 12;
        row.water_deficit = IndicatorStats::from_mean(400.0);
        row.heat_stress_days = Some(7.0);
        row.lst = IndicatorStats::from_mean(55.0);
        row.vpd = IndicatorStats::from_mean(9.0);
        row.eto = IndicatorStats::from_mean(120.0);
        row.ndvi = IndicatorStats::from_mean(-0.4);

        let assessment = aggregator().assess(&row);
        for kind in SubIndexKind::priority_order() {
            let value = assessment.sub_index(kind).value;
            assert!((0.0..=100.0).contains(&value), "{kind:?} = {value}");
        }
        assert_eq!(assessment.overall_stress_index, 100.0);
        assert_eq!(assessment.overall_status, StressStatus::Critical);
    }

    #[test]
    fn assessment_is_deterministic() {
        let row = scenario_row();
        assert_eq!(aggregator().assess(&row), aggregator().assess(&row));
    }
}
