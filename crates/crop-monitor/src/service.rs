use std::ops::RangeInclusive;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::cache::{StressCache, StressCacheKey};
use crate::error::AnalyticsError;
use crate::forecast::{YieldForecastResult, YieldForecaster};
use crate::growth_stage::season_week;
use crate::indicators::{Fips, IndicatorRow, IndicatorStats, IndicatorStore};
use crate::stress::{CompositeAggregator, CompositeStressResult, DataCoverage};

/// Request facade composing the indicator store, the stress aggregator and
/// the yield forecaster. Every call works from one store snapshot.
pub struct CropMonitorService<S> {
    store: Arc<S>,
    aggregator: Arc<CompositeAggregator>,
    forecaster: YieldForecaster,
    cache: Option<Arc<dyn StressCache>>,
}

impl<S> CropMonitorService<S>
where
    S: IndicatorStore + 'static,
{
    pub fn new(store: Arc<S>, aggregator: CompositeAggregator, forecaster: YieldForecaster) -> Self {
        Self {
            store,
            aggregator: Arc::new(aggregator),
            forecaster,
            cache: None,
        }
    }

    pub fn with_cache(mut self, cache: Arc<dyn StressCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Composite stress for the rows overlapping `[week_start, week_end]`.
    pub fn compute_stress(
        &self,
        fips: &str,
        week_start: NaiveDate,
        week_end: NaiveDate,
    ) -> Result<CompositeStressResult, AnalyticsError> {
        let fips = parse_county(fips)?;
        if week_end < week_start {
            return Err(AnalyticsError::InvalidWindow {
                start: week_start,
                end: week_end,
            });
        }

        let snapshot = self.store.snapshot()?;
        let key = StressCacheKey {
            fips: fips.clone(),
            week_start,
            week_end,
        };

        if let Some(cache) = &self.cache {
            let cached_generation = cache.generation();
            if cached_generation < snapshot.generation {
                debug!(
                    from = cached_generation,
                    to = snapshot.generation,
                    "indicator generation changed; invalidating stress cache"
                );
                cache.invalidate(snapshot.generation);
            } else if cached_generation == snapshot.generation {
                if let Some(hit) = cache.get(&key) {
                    return Ok(hit);
                }
            }
        }

        let rows = snapshot.table.rows_in_window(&fips, week_start, week_end);
        if rows.is_empty() {
            return Err(AnalyticsError::NotFound {
                fips: fips.to_string(),
                start: week_start,
                end: week_end,
            });
        }

        let coverage = self.window_coverage(week_start, week_end, rows.len());
        if coverage.degraded_confidence {
            warn!(
                fips = %fips,
                %week_start,
                %week_end,
                observed = coverage.weeks_observed,
                expected = coverage.weeks_expected,
                "stress window below completeness threshold"
            );
        }

        let summary = summarize_window(&rows);
        let assessment = self.aggregator.assess(&summary);
        let result = CompositeStressResult::from_assessment(
            fips,
            week_start,
            week_end,
            summary.week_of_season,
            assessment,
            coverage,
        );

        info!(
            fips = %result.fips,
            week = result.week_of_season,
            overall = result.overall_stress_index,
            status = result.overall_status.label(),
            primary = result.primary_driver.as_str(),
            "composite stress computed"
        );

        if let Some(cache) = &self.cache {
            cache.put(key, snapshot.generation, result.clone());
        }

        Ok(result)
    }

    /// Yield forecast from caller-supplied history ordered by week.
    pub fn forecast_yield(
        &self,
        fips: &str,
        current_week: u32,
        year: i32,
        history: &[IndicatorRow],
    ) -> Result<YieldForecastResult, AnalyticsError> {
        let fips = parse_county(fips)?;
        self.forecaster.forecast(&fips, year, current_week, history)
    }

    /// Yield forecast reading the season history from the indicator store.
    pub fn forecast_from_store(
        &self,
        fips: &str,
        current_week: u32,
        year: i32,
    ) -> Result<YieldForecastResult, AnalyticsError> {
        let county = parse_county(fips)?;
        let current_week = season_week(current_week)?;
        let snapshot = self.store.snapshot()?;
        let history = snapshot.table.get_rows(&county, year, 1..=current_week);
        self.forecaster.forecast(&county, year, current_week, &history)
    }

    /// Forecast for every week from season start through `through_week`, all
    /// from the same snapshot. Weeks before the first observation are skipped.
    pub fn forecast_trajectory(
        &self,
        fips: &str,
        year: i32,
        through_week: u32,
    ) -> Result<Vec<YieldForecastResult>, AnalyticsError> {
        let county = parse_county(fips)?;
        let through_week = season_week(through_week)?;
        let snapshot = self.store.snapshot()?;
        let history = snapshot.table.get_rows(&county, year, 1..=through_week);
        if history.is_empty() {
            return Err(AnalyticsError::InsufficientData {
                fips: county.to_string(),
                year,
                week: through_week,
            });
        }

        let mut trajectory = Vec::new();
        for week in 1..=through_week {
            match self.forecaster.forecast(&county, year, week, &history) {
                Ok(result) => trajectory.push(result),
                Err(AnalyticsError::InsufficientData { .. }) => continue,
                Err(other) => return Err(other),
            }
        }
        Ok(trajectory)
    }

    /// Weekly composite stress for each stored week in `weeks`.
    pub fn stress_timeline(
        &self,
        fips: &str,
        year: i32,
        weeks: RangeInclusive<u32>,
    ) -> Result<Vec<CompositeStressResult>, AnalyticsError> {
        let county = parse_county(fips)?;
        season_week(*weeks.start())?;
        season_week(*weeks.end())?;
        let snapshot = self.store.snapshot()?;
        let rows = snapshot.table.get_rows(&county, year, weeks);

        Ok(rows
            .iter()
            .map(|row| {
                let assessment = self.aggregator.assess(row);
                CompositeStressResult::from_assessment(
                    county.clone(),
                    row.week_start,
                    row.week_end,
                    row.week_of_season,
                    assessment,
                    DataCoverage {
                        weeks_expected: 1,
                        weeks_observed: 1,
                        degraded_confidence: false,
                    },
                )
            })
            .collect())
    }

    fn window_coverage(&self, start: NaiveDate, end: NaiveDate, rows: usize) -> DataCoverage {
        let days = (end - start).num_days() + 1;
        let weeks_expected = ((days + 6) / 7).max(1) as u32;
        let weeks_observed = (rows as u32).min(weeks_expected);
        let mut coverage = DataCoverage {
            weeks_expected,
            weeks_observed,
            degraded_confidence: false,
        };
        coverage.degraded_confidence =
            coverage.ratio() < self.aggregator.config().min_window_coverage;
        coverage
    }
}

fn parse_county(fips: &str) -> Result<Fips, AnalyticsError> {
    Fips::parse(fips).map_err(|_| AnalyticsError::InvalidCounty {
        fips: fips.to_string(),
    })
}

/// Collapse the rows of a window into one representative week. The latest
/// week sets the growth stage; statistics are averaged across weeks.
fn summarize_window(rows: &[IndicatorRow]) -> IndicatorRow {
    if let [single] = rows {
        return single.clone();
    }

    let first = &rows[0];
    let last = &rows[rows.len() - 1];
    let combine = |pick: fn(&IndicatorRow) -> &IndicatorStats| {
        IndicatorStats::combine(rows.iter().map(pick))
    };

    let heat_days: Vec<f64> = rows
        .iter()
        .filter_map(|row| row.heat_stress_days.filter(|v| v.is_finite()))
        .collect();
    let heat_stress_days = if heat_days.is_empty() {
        None
    } else {
        Some(heat_days.iter().sum::<f64>() / heat_days.len() as f64)
    };

    IndicatorRow {
        fips: first.fips.clone(),
        week_start: first.week_start,
        week_end: last.week_end,
        week_of_season: rows.iter().map(|row| row.week_of_season).max().unwrap_or(1),
        ndvi: combine(|row| &row.ndvi),
        lst: combine(|row| &row.lst),
        vpd: combine(|row| &row.vpd),
        eto: combine(|row| &row.eto),
        precipitation: combine(|row| &row.precipitation),
        water_deficit: combine(|row| &row.water_deficit),
        heat_stress_days,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::IndicatorTable;

    fn row(week: u32, deficit: f64) -> IndicatorRow {
        let start = NaiveDate::from_ymd_opt(2024, 4, 29).expect("valid")
            + chrono::Duration::weeks(i64::from(week) - 1);
        let mut row = IndicatorRow::blank(Fips::parse("19001").expect("adair"), start, week);
        row.water_deficit = IndicatorStats::from_mean(deficit);
        row.heat_stress_days = Some(f64::from(week % 3));
        row
    }

    #[test]
    fn single_row_window_is_passed_through() {
        let rows = vec![row(4, 12.0)];
        assert_eq!(summarize_window(&rows), rows[0]);
    }

    #[test]
    fn multi_week_window_averages_and_takes_latest_stage() {
        let rows = vec![row(10, 10.0), row(11, 20.0)];
        let summary = summarize_window(&rows);

        assert_eq!(summary.week_of_season, 11);
        assert_eq!(summary.week_start, rows[0].week_start);
        assert_eq!(summary.week_end, rows[1].week_end);
        assert_eq!(summary.water_deficit.mean, Some(15.0));
        assert_eq!(summary.heat_stress_days, Some(1.5));
    }

    #[test]
    fn table_lookup_feeds_summary() {
        let table = IndicatorTable::new(vec![row(1, 5.0), row(2, 7.0)]);
        let fips = Fips::parse("19001").expect("adair");
        let rows = table.rows_in_window(
            &fips,
            NaiveDate::from_ymd_opt(2024, 4, 29).expect("valid"),
            NaiveDate::from_ymd_opt(2024, 5, 12).expect("valid"),
        );
        assert_eq!(summarize_window(&rows).water_deficit.mean, Some(6.0));
    }
}
