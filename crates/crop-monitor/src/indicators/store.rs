use std::collections::BTreeMap;
use std::ops::RangeInclusive;
use std::sync::{Arc, RwLock};

use chrono::NaiveDate;
use tracing::{info, warn};

use super::domain::{Fips, IndicatorRow};

/// Immutable indicator history keyed by county and season year, rows ascending by week.
#[derive(Debug, Default, Clone)]
pub struct IndicatorTable {
    seasons: BTreeMap<(Fips, i32), Vec<IndicatorRow>>,
}

impl IndicatorTable {
    pub fn new(rows: impl IntoIterator<Item = IndicatorRow>) -> Self {
        let mut seasons: BTreeMap<(Fips, i32), Vec<IndicatorRow>> = BTreeMap::new();

        for row in rows {
            let key = (row.fips.clone(), row.season_year());
            let season = seasons.entry(key).or_default();
            if season
                .iter()
                .any(|existing| existing.week_of_season == row.week_of_season)
            {
                warn!(
                    fips = %row.fips,
                    week = row.week_of_season,
                    "duplicate indicator week ignored; keeping first row"
                );
                continue;
            }
            season.push(row);
        }

        for season in seasons.values_mut() {
            season.sort_by_key(|row| row.week_of_season);
        }

        Self { seasons }
    }

    pub fn len(&self) -> usize {
        self.seasons.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.seasons.is_empty()
    }

    pub fn counties(&self) -> Vec<Fips> {
        let mut counties: Vec<Fips> = self.seasons.keys().map(|(fips, _)| fips.clone()).collect();
        counties.dedup();
        counties
    }

    /// Rows for one county-season whose week falls in `weeks`, ascending by week.
    /// Gaps are returned as-is; callers must not assume contiguity.
    pub fn get_rows(&self, fips: &Fips, year: i32, weeks: RangeInclusive<u32>) -> Vec<IndicatorRow> {
        self.seasons
            .get(&(fips.clone(), year))
            .map(|season| {
                season
                    .iter()
                    .filter(|row| weeks.contains(&row.week_of_season))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Rows for one county whose week overlaps the date window, ascending by start date.
    pub fn rows_in_window(&self, fips: &Fips, start: NaiveDate, end: NaiveDate) -> Vec<IndicatorRow> {
        let mut rows: Vec<IndicatorRow> = self
            .seasons
            .range((fips.clone(), i32::MIN)..=(fips.clone(), i32::MAX))
            .flat_map(|(_, season)| season.iter())
            .filter(|row| row.overlaps(start, end))
            .cloned()
            .collect();
        rows.sort_by_key(|row| row.week_start);
        rows
    }
}

/// A consistent view of the indicator history for the length of one request.
#[derive(Debug, Clone)]
pub struct IndicatorSnapshot {
    pub generation: u64,
    pub table: Arc<IndicatorTable>,
}

/// Read side of the external indicator store.
pub trait IndicatorStore: Send + Sync {
    fn snapshot(&self) -> Result<IndicatorSnapshot, StoreError>;
}

/// Error enumeration for indicator store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("indicator store unavailable: {0}")]
    Unavailable(String),
    #[error("failed to read indicator export: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid indicator CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid indicator row {line}: {reason}")]
    InvalidRow { line: u64, reason: String },
}

/// Store holding the whole table behind one pointer so refreshes swap atomically.
#[derive(Debug, Default)]
pub struct InMemoryIndicatorStore {
    current: RwLock<IndicatorSnapshot>,
}

impl Default for IndicatorSnapshot {
    fn default() -> Self {
        Self {
            generation: 0,
            table: Arc::new(IndicatorTable::default()),
        }
    }
}

impl InMemoryIndicatorStore {
    pub fn new(table: IndicatorTable) -> Self {
        Self {
            current: RwLock::new(IndicatorSnapshot {
                generation: 1,
                table: Arc::new(table),
            }),
        }
    }

    /// Replace the whole table. In-flight requests keep the snapshot they already hold.
    pub fn replace(&self, table: IndicatorTable) -> Result<u64, StoreError> {
        let mut guard = self
            .current
            .write()
            .map_err(|_| StoreError::Unavailable("indicator store lock poisoned".to_string()))?;
        let generation = guard.generation + 1;
        let rows = table.len();
        *guard = IndicatorSnapshot {
            generation,
            table: Arc::new(table),
        };
        info!(generation, rows, "indicator table refreshed");
        Ok(generation)
    }
}

impl IndicatorStore for InMemoryIndicatorStore {
    fn snapshot(&self) -> Result<IndicatorSnapshot, StoreError> {
        self.current
            .read()
            .map(|guard| guard.clone())
            .map_err(|_| StoreError::Unavailable("indicator store lock poisoned".to_string()))
    }
}
