use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;

use super::repository::{QuoteId, QuoteRepository, RepositoryError};
use super::service::{QuoteRequest, QuoteService, QuoteServiceError};

/// Router builder exposing quote preview, submission, and lookup.
pub fn quote_router<R>(service: Arc<QuoteService<R>>) -> Router
where
    R: QuoteRepository + 'static,
{
    Router::new()
        .route("/api/v1/quotes", post(submit_handler::<R>))
        .route("/api/v1/quotes/preview", post(preview_handler::<R>))
        .route("/api/v1/quotes/:quote_id", get(fetch_handler::<R>))
        .with_state(service)
}

pub(crate) async fn preview_handler<R>(
    State(service): State<Arc<QuoteService<R>>>,
    axum::Json(request): axum::Json<QuoteRequest>,
) -> Response
where
    R: QuoteRepository + 'static,
{
    match service.preview(request) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn submit_handler<R>(
    State(service): State<Arc<QuoteService<R>>>,
    axum::Json(request): axum::Json<QuoteRequest>,
) -> Response
where
    R: QuoteRepository + 'static,
{
    match service.submit(request) {
        Ok(record) => (StatusCode::CREATED, axum::Json(record.view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn fetch_handler<R>(
    State(service): State<Arc<QuoteService<R>>>,
    Path(quote_id): Path<String>,
) -> Response
where
    R: QuoteRepository + 'static,
{
    match service.get(&QuoteId(quote_id)) {
        Ok(record) => (StatusCode::OK, axum::Json(record.view())).into_response(),
        Err(error) => error_response(error),
    }
}

fn error_response(error: QuoteServiceError) -> Response {
    let status = match &error {
        QuoteServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        QuoteServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        QuoteServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        QuoteServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
    };

    let payload = json!({ "error": error.to_string() });
    (status, axum::Json(payload)).into_response()
}
