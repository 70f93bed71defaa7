use crate::infra::{AppState, MonitorService};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use crop_monitor::router::crop_router;
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_crop_routes(service: Arc<MonitorService>) -> axum::Router {
    crop_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo::{synthetic_table, DEMO_YEAR};
    use crate::infra::build_cached_service;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use crop_monitor::config::AnalyticsConfig;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use serde_json::Value;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tower::ServiceExt;

    fn app(ready: bool) -> (axum::Router, Arc<AtomicBool>) {
        let (_, service) =
            build_cached_service(&AnalyticsConfig::default(), synthetic_table(DEMO_YEAR))
                .expect("service");
        let readiness = Arc::new(AtomicBool::new(ready));
        let state = AppState {
            readiness: readiness.clone(),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        };
        (
            with_crop_routes(Arc::new(service)).layer(Extension(state)),
            readiness,
        )
    }

    async fn get(router: &axum::Router, uri: &str) -> (StatusCode, Value) {
        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .uri(uri)
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router dispatch");
        let status = response.status();
        let body = to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("body");
        (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let (router, _) = app(true);
        let (status, payload) = get(&router, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload["status"], "ok");
    }

    #[tokio::test]
    async fn readiness_follows_the_flag() {
        let (router, readiness) = app(false);
        let (status, payload) = get(&router, "/ready").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(payload["status"], "initializing");

        readiness.store(true, Ordering::Release);
        let (status, _) = get(&router, "/ready").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn crop_routes_are_mounted_alongside_probes() {
        let (router, _) = app(true);
        let (status, payload) = get(
            &router,
            "/api/v1/stress/19001?week_start=2024-08-26&week_end=2024-09-01",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload["fips"], "19001");

        let (status, payload) = get(&router, "/api/v1/forecast/19169?year=2024&week=13").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload["growth_stage"], "pollination");
    }
}
