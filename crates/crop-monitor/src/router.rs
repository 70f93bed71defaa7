use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::AnalyticsError;
use crate::forecast::YieldForecastResult;
use crate::growth_stage::SEASON_WEEKS;
use crate::indicators::IndicatorStore;
use crate::service::CropMonitorService;
use crate::stress::CompositeStressResult;

#[derive(Debug, Deserialize)]
pub struct StressWindowQuery {
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct TimelineQuery {
    pub year: i32,
    #[serde(default)]
    pub from_week: Option<u32>,
    #[serde(default)]
    pub to_week: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct ForecastQuery {
    pub year: i32,
    pub week: u32,
}

/// Router builder exposing the stress and forecast endpoints.
pub fn crop_router<S>(service: Arc<CropMonitorService<S>>) -> Router
where
    S: IndicatorStore + 'static,
{
    Router::new()
        .route("/api/v1/stress/:fips", get(stress_handler::<S>))
        .route("/api/v1/stress/:fips/timeline", get(timeline_handler::<S>))
        .route("/api/v1/forecast/:fips", get(forecast_handler::<S>))
        .route(
            "/api/v1/forecast/:fips/trajectory",
            get(trajectory_handler::<S>),
        )
        .with_state(service)
}

pub(crate) async fn stress_handler<S>(
    State(service): State<Arc<CropMonitorService<S>>>,
    Path(fips): Path<String>,
    Query(query): Query<StressWindowQuery>,
) -> Result<Json<CompositeStressResult>, AnalyticsError>
where
    S: IndicatorStore + 'static,
{
    service
        .compute_stress(&fips, query.week_start, query.week_end)
        .map(Json)
}

pub(crate) async fn timeline_handler<S>(
    State(service): State<Arc<CropMonitorService<S>>>,
    Path(fips): Path<String>,
    Query(query): Query<TimelineQuery>,
) -> Result<Json<Vec<CompositeStressResult>>, AnalyticsError>
where
    S: IndicatorStore + 'static,
{
    let from = query.from_week.unwrap_or(1);
    let to = query.to_week.unwrap_or(SEASON_WEEKS);
    service
        .stress_timeline(&fips, query.year, from..=to)
        .map(Json)
}

pub(crate) async fn forecast_handler<S>(
    State(service): State<Arc<CropMonitorService<S>>>,
    Path(fips): Path<String>,
    Query(query): Query<ForecastQuery>,
) -> Result<Json<YieldForecastResult>, AnalyticsError>
where
    S: IndicatorStore + 'static,
{
    service
        .forecast_from_store(&fips, query.week, query.year)
        .map(Json)
}

pub(crate) async fn trajectory_handler<S>(
    State(service): State<Arc<CropMonitorService<S>>>,
    Path(fips): Path<String>,
    Query(query): Query<ForecastQuery>,
) -> Result<Json<Vec<YieldForecastResult>>, AnalyticsError>
where
    S: IndicatorStore + 'static,
{
    service
        .forecast_trajectory(&fips, query.year, query.week)
        .map(Json)
}
