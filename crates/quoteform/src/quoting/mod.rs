//! Quote-form rule evaluation: validated product/order models, the rule engine
//! deriving price and field state, and the service/router wrapping it.

pub mod domain;
pub mod evaluation;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    fields, FieldValue, FieldValues, OrderContext, Product, ProductDraft, ProductId, ProductKind,
    ProductVariant, SupportTier, ValidationError,
};
pub use evaluation::{
    Adjustment, AdjustmentKind, Clock, ConfigurationError, FixedClock, PricingConfig,
    QuoteEngine, Rule, RuleInput, RuleOutcome, RulePhase, RuleRegistry, RuleSet, SystemClock,
};
pub use repository::{QuoteId, QuoteRecord, QuoteRepository, QuoteView, RepositoryError};
pub use router::quote_router;
pub use service::{QuoteRequest, QuoteService, QuoteServiceError};
