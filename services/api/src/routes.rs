use crate::infra::AppState;
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use quoteform::error::AppError;
use quoteform::quoting::{quote_router, QuoteRepository, QuoteService, QuoteView};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

const DEFAULT_RECENT_LIMIT: usize = 20;

#[derive(Debug, Deserialize)]
pub(crate) struct RecentQuery {
    #[serde(default)]
    pub(crate) limit: Option<usize>,
}

pub(crate) fn with_quote_routes<R>(service: Arc<QuoteService<R>>) -> axum::Router
where
    R: QuoteRepository + 'static,
{
    let recent = axum::Router::new()
        .route(
            "/api/v1/quotes/recent",
            axum::routing::get(recent_quotes_endpoint::<R>),
        )
        .with_state(service.clone());

    quote_router(service)
        .merge(recent)
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

pub(crate) async fn recent_quotes_endpoint<R>(
    State(service): State<Arc<QuoteService<R>>>,
    Query(query): Query<RecentQuery>,
) -> Result<Json<Vec<QuoteView>>, AppError>
where
    R: QuoteRepository + 'static,
{
    let limit = query.limit.unwrap_or(DEFAULT_RECENT_LIMIT);
    let records = service.recent(limit)?;
    Ok(Json(records.iter().map(|record| record.view()).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::InMemoryQuoteRepository;
    use axum::body::Body;
    use axum::http::Request;
    use quoteform::quoting::{FixedClock, PricingConfig, QuoteEngine, RuleRegistry};
    use std::sync::atomic::AtomicBool;
    use tower::ServiceExt;

    fn service() -> Arc<QuoteService<InMemoryQuoteRepository>> {
        let today = chrono::NaiveDate::from_ymd_opt(2025, 6, 1).expect("valid date");
        let engine = QuoteEngine::with_clock(
            Arc::new(RuleRegistry::standard(&PricingConfig::default())),
            Arc::new(FixedClock(today)),
        );
        Arc::new(QuoteService::new(
            Arc::new(engine),
            Arc::new(InMemoryQuoteRepository::default()),
        ))
    }

    fn quote_payload() -> String {
        json!({
            "product": {
                "id": "res-heat-pump",
                "kind": "residential",
                "base_price": "200",
                "color_code": "RAL-9010",
                "warranty_months": 24
            },
            "quantity": 1,
            "requested_delivery": "2025-06-04"
        })
        .to_string()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), 16 * 1024)
            .await
            .expect("read body");
        serde_json::from_slice(&bytes).expect("json payload")
    }

    #[tokio::test]
    async fn healthcheck_reports_ok() {
        let Json(body) = healthcheck().await;
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn readiness_reflects_flag() {
        let recorder = metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder();
        let state = AppState {
            readiness: Arc::new(AtomicBool::new(false)),
            metrics: Arc::new(recorder.handle()),
        };

        let response = readiness_endpoint(Extension(state.clone()))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        state
            .readiness
            .store(true, std::sync::atomic::Ordering::Relaxed);
        let response = readiness_endpoint(Extension(state)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn submitted_quotes_are_listed_newest_first() {
        let app = with_quote_routes(service());

        for _ in 0..2 {
            let response = app
                .clone()
                .oneshot(
                    Request::builder()
                        .method("POST")
                        .uri("/api/v1/quotes")
                        .header("content-type", "application/json")
                        .body(Body::from(quote_payload()))
                        .expect("request builds"),
                )
                .await
                .expect("route responds");
            assert_eq!(response.status(), StatusCode::CREATED);
        }

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/quotes/recent?limit=1")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("route responds");

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let quotes = body.as_array().expect("array payload");
        assert_eq!(quotes.len(), 1);
        assert_eq!(quotes[0]["quote_id"], "quote-000002");
        assert_eq!(quotes[0]["final_price"], "240");
    }
}
