use chrono::NaiveDate;
use crop_monitor::cache::InMemoryStressCache;
use crop_monitor::config::AnalyticsConfig;
use crop_monitor::error::AppError;
use crop_monitor::forecast::{AnomalyYieldModel, YieldForecaster};
use crop_monitor::indicators::{InMemoryIndicatorStore, IndicatorTable};
use crop_monitor::stress::CompositeAggregator;
use crop_monitor::CropMonitorService;
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) type MonitorService = CropMonitorService<InMemoryIndicatorStore>;

/// Indicator table from the configured export, or the synthetic demo season
/// when no export is configured.
pub(crate) fn load_indicator_table(csv: Option<&Path>) -> Result<IndicatorTable, AppError> {
    match csv {
        Some(path) => Ok(IndicatorTable::from_csv_path(path)?),
        None => {
            let table = crate::demo::synthetic_table(crate::demo::DEMO_YEAR);
            info!(
                rows = table.len(),
                "no indicator export configured; serving synthetic demo season"
            );
            Ok(table)
        }
    }
}

/// Wire the store, aggregator and forecaster. Invalid weights fail here so a
/// misconfigured process never starts serving.
pub(crate) fn build_service(
    analytics: &AnalyticsConfig,
    table: IndicatorTable,
) -> Result<(Arc<InMemoryIndicatorStore>, MonitorService), AppError> {
    let store = Arc::new(InMemoryIndicatorStore::new(table));
    let aggregator = CompositeAggregator::new(analytics.stress)?;
    let forecaster = YieldForecaster::new(
        Arc::new(AnomalyYieldModel::new(analytics.baseline_yield)),
        analytics.forecast,
    );
    Ok((
        store.clone(),
        CropMonitorService::new(store, aggregator, forecaster),
    ))
}

pub(crate) fn build_cached_service(
    analytics: &AnalyticsConfig,
    table: IndicatorTable,
) -> Result<(Arc<InMemoryIndicatorStore>, MonitorService), AppError> {
    let (store, service) = build_service(analytics, table)?;
    Ok((
        store,
        service.with_cache(Arc::new(InMemoryStressCache::default())),
    ))
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crop_monitor::error::AnalyticsError;
    use crop_monitor::stress::StressWeights;

    #[test]
    fn parse_date_reports_bad_input() {
        assert_eq!(
            parse_date(" 2024-07-15 "),
            Ok(NaiveDate::from_ymd_opt(2024, 7, 15).expect("valid"))
        );
        assert!(parse_date("07/15/2024")
            .expect_err("slash dates rejected")
            .contains("YYYY-MM-DD"));
    }

    #[test]
    fn invalid_weights_stop_service_construction() {
        let mut analytics = AnalyticsConfig::default();
        analytics.stress.weights = StressWeights {
            water: 0.5,
            heat: 0.5,
            vegetation: 0.5,
            atmosphere: 0.0,
        };

        match build_service(&analytics, IndicatorTable::default()) {
            Err(AppError::Analytics(AnalyticsError::InvalidWeightConfiguration { .. })) => {}
            Err(other) => panic!("unexpected error {other}"),
            Ok(_) => panic!("weights summing to 1.5 must be rejected"),
        }
    }

    #[test]
    fn missing_export_falls_back_to_demo_season() {
        let table = load_indicator_table(None).expect("demo table");
        assert!(!table.is_empty());
    }
}
