use chrono::NaiveDate;
use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

use super::domain::{Fips, IndicatorRow, IndicatorStats};
use super::store::{IndicatorTable, StoreError};

impl IndicatorTable {
    /// Load the flat weekly export. Empty cells are treated as missing values.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, StoreError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut rows = Vec::new();

        for (index, record) in csv_reader.deserialize::<CsvIndicatorRow>().enumerate() {
            let line = index as u64 + 2;
            let raw = record?;
            rows.push(raw.into_row(line)?);
        }

        debug!(rows = rows.len(), "parsed indicator export");
        Ok(Self::new(rows))
    }

    pub fn from_csv_path(path: &Path) -> Result<Self, StoreError> {
        let file = std::fs::File::open(path)?;
        let table = Self::from_csv_reader(file)?;
        info!(path = %path.display(), rows = table.len(), "loaded indicator table");
        Ok(table)
    }
}

#[derive(Debug, Deserialize)]
struct CsvIndicatorRow {
    fips: String,
    week_start: NaiveDate,
    week_end: NaiveDate,
    week_of_season: u32,
    ndvi_mean: Option<f64>,
    ndvi_std: Option<f64>,
    ndvi_min: Option<f64>,
    ndvi_max: Option<f64>,
    lst_mean: Option<f64>,
    lst_std: Option<f64>,
    lst_min: Option<f64>,
    lst_max: Option<f64>,
    vpd_mean: Option<f64>,
    vpd_std: Option<f64>,
    vpd_min: Option<f64>,
    vpd_max: Option<f64>,
    eto_mean: Option<f64>,
    eto_std: Option<f64>,
    eto_min: Option<f64>,
    eto_max: Option<f64>,
    precip_mean: Option<f64>,
    precip_std: Option<f64>,
    precip_min: Option<f64>,
    precip_max: Option<f64>,
    water_deficit_mean: Option<f64>,
    water_deficit_std: Option<f64>,
    water_deficit_min: Option<f64>,
    water_deficit_max: Option<f64>,
    #[serde(default)]
    heat_stress_days: Option<f64>,
}

impl CsvIndicatorRow {
    fn into_row(self, line: u64) -> Result<IndicatorRow, StoreError> {
        let fips = Fips::parse(&self.fips).map_err(|err| StoreError::InvalidRow {
            line,
            reason: err.to_string(),
        })?;

        if self.week_end < self.week_start {
            return Err(StoreError::InvalidRow {
                line,
                reason: format!(
                    "week_end {} precedes week_start {}",
                    self.week_end, self.week_start
                ),
            });
        }

        Ok(IndicatorRow {
            fips,
            week_start: self.week_start,
            week_end: self.week_end,
            week_of_season: self.week_of_season,
            ndvi: stats(self.ndvi_mean, self.ndvi_std, self.ndvi_min, self.ndvi_max),
            lst: stats(self.lst_mean, self.lst_std, self.lst_min, self.lst_max),
            vpd: stats(self.vpd_mean, self.vpd_std, self.vpd_min, self.vpd_max),
            eto: stats(self.eto_mean, self.eto_std, self.eto_min, self.eto_max),
            precipitation: stats(
                self.precip_mean,
                self.precip_std,
                self.precip_min,
                self.precip_max,
            ),
            water_deficit: stats(
                self.water_deficit_mean,
                self.water_deficit_std,
                self.water_deficit_min,
                self.water_deficit_max,
            ),
            heat_stress_days: self.heat_stress_days,
        })
    }
}

fn stats(mean: Option<f64>, std: Option<f64>, min: Option<f64>, max: Option<f64>) -> IndicatorStats {
    IndicatorStats {
        mean,
        std,
        min,
        max,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "fips,week_start,week_end,week_of_season,ndvi_mean,ndvi_std,ndvi_min,ndvi_max,lst_mean,lst_std,lst_min,lst_max,vpd_mean,vpd_std,vpd_min,vpd_max,eto_mean,eto_std,eto_min,eto_max,precip_mean,precip_std,precip_min,precip_max,water_deficit_mean,water_deficit_std,water_deficit_min,water_deficit_max,heat_stress_days";

    #[test]
    fn parses_rows_with_missing_cells() {
        let csv = format!(
            "{HEADER}\n19001,2024-07-08,2024-07-14,11,0.78,0.04,0.6,0.88,31.5,1.2,27.0,36.1,1.9,,,,38.0,,,,12.0,,,,26.0,,,,3\n19001,2024-07-15,2024-07-21,12,,,,,,,,,,,,,,,,,,,,,,,,,\n"
        );

        let table = IndicatorTable::from_csv_reader(csv.as_bytes()).expect("csv parses");
        let fips = Fips::parse("19001").expect("adair");
        let rows = table.get_rows(&fips, 2024, 1..=26);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].ndvi.mean, Some(0.78));
        assert_eq!(rows[0].vpd.std, None);
        assert_eq!(rows[0].heat_stress_days, Some(3.0));
        assert!(rows[1].ndvi.is_empty());
        assert_eq!(rows[1].heat_stress_days, None);
    }

    #[test]
    fn rejects_unknown_counties_with_line_number() {
        let csv = format!(
            "{HEADER}\n17031,2024-07-08,2024-07-14,11,,,,,,,,,,,,,,,,,,,,,,,,,\n"
        );

        match IndicatorTable::from_csv_reader(csv.as_bytes()) {
            Err(StoreError::InvalidRow { line, reason }) => {
                assert_eq!(line, 2);
                assert!(reason.contains("17031"));
            }
            other => panic!("expected invalid row, got {other:?}"),
        }
    }
}
