use crate::cli::ServeArgs;
use crate::infra::{build_cached_service, load_indicator_table, AppState};
use crate::routes::with_crop_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use crop_monitor::config::AppConfig;
use crop_monitor::error::AppError;
use crop_monitor::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if let Some(csv) = args.csv.take() {
        config.analytics.indicator_csv = Some(csv);
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let table = load_indicator_table(config.analytics.indicator_csv.as_deref())?;
    let counties = table.counties().len();
    let (_store, service) = build_cached_service(&config.analytics, table)?;
    info!(
        counties,
        weights = ?config.analytics.stress.weights,
        "crop analytics initialised"
    );

    let app = with_crop_routes(Arc::new(service))
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "crop monitor ready");

    axum::serve(listener, app).await?;
    Ok(())
}
