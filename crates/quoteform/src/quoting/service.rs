use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::domain::{FieldValues, OrderContext, Product, ProductDraft, ValidationError};
use super::evaluation::QuoteEngine;
use super::repository::{QuoteId, QuoteRecord, QuoteRepository, QuoteView, RepositoryError};

/// Quote attempt as posted by the form layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteRequest {
    pub product: ProductDraft,
    pub quantity: i64,
    pub requested_delivery: NaiveDate,
    #[serde(default)]
    pub field_values: FieldValues,
}

impl QuoteRequest {
    pub fn validate(self) -> Result<(Product, OrderContext), ValidationError> {
        let product = Product::try_from(self.product)?;
        let context =
            OrderContext::from_requested(self.quantity, self.requested_delivery, self.field_values)?;
        Ok((product, context))
    }
}

/// Service composing validation, the rule engine, and the repository.
pub struct QuoteService<R> {
    engine: Arc<QuoteEngine>,
    repository: Arc<R>,
    sequence: AtomicU64,
}

impl<R> QuoteService<R>
where
    R: QuoteRepository + 'static,
{
    pub fn new(engine: Arc<QuoteEngine>, repository: Arc<R>) -> Self {
        Self {
            engine,
            repository,
            sequence: AtomicU64::new(1),
        }
    }

    pub fn engine(&self) -> &QuoteEngine {
        &self.engine
    }

    fn next_quote_id(&self) -> QuoteId {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed);
        QuoteId(format!("quote-{id:06}"))
    }

    /// Evaluate a request without storing it, for live form updates.
    pub fn preview(&self, request: QuoteRequest) -> Result<QuoteView, QuoteServiceError> {
        let (product, context) = request.validate()?;
        let today = self.engine.today();
        let outcome = self.engine.evaluate_on(&product, &context, today);
        Ok(QuoteView::build(None, &product, &context, &outcome, today))
    }

    /// Evaluate a request and persist the resulting quote.
    pub fn submit(&self, request: QuoteRequest) -> Result<QuoteRecord, QuoteServiceError> {
        let (product, context) = request.validate()?;
        let quoted_on = self.engine.today();
        let outcome = self.engine.evaluate_on(&product, &context, quoted_on);

        let record = QuoteRecord {
            quote_id: self.next_quote_id(),
            product,
            context,
            outcome,
            quoted_on,
        };

        let stored = self.repository.insert(record)?;
        info!(
            quote_id = %stored.quote_id.0,
            final_price = %stored.outcome.final_price(),
            "quote stored"
        );
        Ok(stored)
    }

    pub fn get(&self, quote_id: &QuoteId) -> Result<QuoteRecord, QuoteServiceError> {
        let record = self
            .repository
            .fetch(quote_id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(record)
    }

    pub fn recent(&self, limit: usize) -> Result<Vec<QuoteRecord>, QuoteServiceError> {
        Ok(self.repository.recent(limit)?)
    }
}

/// Error raised by the quote service.
#[derive(Debug, thiserror::Error)]
pub enum QuoteServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
