use crate::cli::ServeArgs;
use crate::infra::{build_request_service, AppState};
use crate::routes::with_request_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use omnisorter::config::AppConfig;
use omnisorter::error::AppError;
use omnisorter::telemetry;
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
    if let Some(policy) = args.hidden_fields.take() {
        config.form.hidden_fields = policy;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let request_service = build_request_service(&config)?;
    let master_data = request_service.databases().master_data_enabled();

    let app = with_request_routes(request_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        master_data,
        policy = ?config.form.hidden_fields,
        "omnisorter request desk ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
