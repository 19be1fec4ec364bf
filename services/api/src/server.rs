use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryQuoteRepository};
use crate::routes::with_quote_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use quoteform::config::AppConfig;
use quoteform::error::AppError;
use quoteform::quoting::{QuoteEngine, QuoteService, RuleRegistry};
use quoteform::telemetry;
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

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let registry = Arc::new(RuleRegistry::standard(&config.pricing));
    let engine = Arc::new(QuoteEngine::new(registry));
    let repository = Arc::new(InMemoryQuoteRepository::default());
    let quote_service = Arc::new(QuoteService::new(engine, repository));

    let app = with_quote_routes(quote_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        volume_threshold = config.pricing.volume_discount_min_quantity,
        urgency_window_days = config.pricing.urgency_window_days,
        "quote rule engine ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
