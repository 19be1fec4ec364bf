use std::collections::BTreeSet;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::domain::{OrderContext, Product, ProductId, ProductKind};
use super::evaluation::{Adjustment, RuleOutcome};

/// Identifier wrapper for stored quotes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QuoteId(pub String);

/// Repository record pairing the evaluated inputs with their outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuoteRecord {
    pub quote_id: QuoteId,
    pub product: Product,
    pub context: OrderContext,
    pub outcome: RuleOutcome,
    pub quoted_on: NaiveDate,
}

impl QuoteRecord {
    pub fn view(&self) -> QuoteView {
        QuoteView::build(
            Some(self.quote_id.clone()),
            &self.product,
            &self.context,
            &self.outcome,
            self.quoted_on,
        )
    }
}

/// Storage abstraction so the service can be exercised in isolation.
pub trait QuoteRepository: Send + Sync {
    fn insert(&self, record: QuoteRecord) -> Result<QuoteRecord, RepositoryError>;
    fn fetch(&self, id: &QuoteId) -> Result<Option<QuoteRecord>, RepositoryError>;
    fn recent(&self, limit: usize) -> Result<Vec<QuoteRecord>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("quote already exists")]
    Conflict,
    #[error("quote not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Flattened quote handed to the form layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuoteView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote_id: Option<QuoteId>,
    pub product_id: ProductId,
    pub kind: ProductKind,
    pub quantity: u32,
    pub requested_delivery: NaiveDate,
    pub quoted_on: NaiveDate,
    pub base_price: Decimal,
    pub adjustments: Vec<Adjustment>,
    pub final_price: Decimal,
    pub visible_fields: BTreeSet<String>,
    pub required_fields: BTreeSet<String>,
    pub applied_rules: Vec<String>,
}

impl QuoteView {
    pub fn build(
        quote_id: Option<QuoteId>,
        product: &Product,
        context: &OrderContext,
        outcome: &RuleOutcome,
        quoted_on: NaiveDate,
    ) -> Self {
        Self {
            quote_id,
            product_id: product.id().clone(),
            kind: product.kind(),
            quantity: context.quantity(),
            requested_delivery: context.requested_delivery(),
            quoted_on,
            base_price: outcome.base_price(),
            adjustments: outcome.adjustments().to_vec(),
            final_price: outcome.final_price(),
            visible_fields: outcome.visible_fields().clone(),
            required_fields: outcome.required_fields().clone(),
            applied_rules: outcome.applied_rules().to_vec(),
        }
    }

    /// One-line summary for logs and CLI output.
    pub fn summary(&self) -> String {
        if self.adjustments.is_empty() {
            return format!("{} x{} at {}", self.product_id, self.quantity, self.final_price);
        }

        let breakdown = self
            .adjustments
            .iter()
            .map(|adjustment| format!("{} {}", adjustment.label, adjustment.amount))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "{} x{} at {} ({})",
            self.product_id, self.quantity, self.final_price, breakdown
        )
    }
}
