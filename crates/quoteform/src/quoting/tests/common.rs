use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use serde_json::Value;

use crate::quoting::domain::{
    FieldValue, FieldValues, OrderContext, Product, ProductDraft, ProductKind, SupportTier,
};
use crate::quoting::evaluation::{FixedClock, PricingConfig, QuoteEngine, RuleRegistry};
use crate::quoting::repository::{QuoteId, QuoteRecord, QuoteRepository, RepositoryError};
use crate::quoting::service::{QuoteRequest, QuoteService};

pub(super) fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 2).expect("valid date")
}

pub(super) fn in_days(days: i64) -> NaiveDate {
    today() + Duration::days(days)
}

pub(super) fn dec(value: i64) -> Decimal {
    Decimal::from(value)
}

pub(super) fn pricing_config() -> PricingConfig {
    PricingConfig::default()
}

pub(super) fn engine() -> QuoteEngine {
    QuoteEngine::with_clock(
        Arc::new(RuleRegistry::standard(&pricing_config())),
        Arc::new(FixedClock(today())),
    )
}

pub(super) fn industrial(base_price: i64, voltage: u32) -> Product {
    Product::industrial("ind-transformer", dec(base_price), voltage, false)
        .expect("valid industrial product")
}

pub(super) fn residential(base_price: i64) -> Product {
    Product::residential("res-heat-pump", dec(base_price), "RAL-9010", 24)
        .expect("valid residential product")
}

pub(super) fn corporate(base_price: i64, tier: SupportTier) -> Product {
    Product::corporate("corp-suite", dec(base_price), 25, tier).expect("valid corporate product")
}

pub(super) fn context(quantity: u32, delivery_in_days: i64) -> OrderContext {
    OrderContext::new(quantity, in_days(delivery_in_days), FieldValues::new())
        .expect("valid order context")
}

pub(super) fn context_with_fields(
    quantity: u32,
    delivery_in_days: i64,
    fields: FieldValues,
) -> OrderContext {
    OrderContext::new(quantity, in_days(delivery_in_days), fields).expect("valid order context")
}

pub(super) fn premium_fields() -> FieldValues {
    FieldValues::new().with("support_tier", FieldValue::text("premium"))
}

pub(super) fn industrial_request(quantity: i64, delivery_in_days: i64) -> QuoteRequest {
    let mut product = ProductDraft::new("ind-transformer", ProductKind::Industrial, dec(100));
    product.voltage = Some(300);
    QuoteRequest {
        product,
        quantity,
        requested_delivery: in_days(delivery_in_days),
        field_values: FieldValues::new(),
    }
}

pub(super) fn residential_request_missing_color() -> QuoteRequest {
    let mut product = ProductDraft::new("res-heat-pump", ProductKind::Residential, dec(200));
    product.warranty_months = Some(12);
    QuoteRequest {
        product,
        quantity: 1,
        requested_delivery: in_days(3),
        field_values: FieldValues::new(),
    }
}

pub(super) fn build_service() -> (QuoteService<MemoryRepository>, Arc<MemoryRepository>) {
    let repository = Arc::new(MemoryRepository::default());
    let service = QuoteService::new(Arc::new(engine()), repository.clone());
    (service, repository)
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    pub(super) records: Arc<Mutex<Vec<QuoteRecord>>>,
}

impl QuoteRepository for MemoryRepository {
    fn insert(&self, record: QuoteRecord) -> Result<QuoteRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.iter().any(|stored| stored.quote_id == record.quote_id) {
            return Err(RepositoryError::Conflict);
        }
        guard.push(record.clone());
        Ok(record)
    }

    fn fetch(&self, id: &QuoteId) -> Result<Option<QuoteRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.iter().find(|stored| &stored.quote_id == id).cloned())
    }

    fn recent(&self, limit: usize) -> Result<Vec<QuoteRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.iter().rev().take(limit).cloned().collect())
    }
}

pub(super) struct ConflictRepository;

impl QuoteRepository for ConflictRepository {
    fn insert(&self, _record: QuoteRecord) -> Result<QuoteRecord, RepositoryError> {
        Err(RepositoryError::Conflict)
    }

    fn fetch(&self, _id: &QuoteId) -> Result<Option<QuoteRecord>, RepositoryError> {
        Ok(None)
    }

    fn recent(&self, _limit: usize) -> Result<Vec<QuoteRecord>, RepositoryError> {
        Ok(Vec::new())
    }
}

pub(super) struct UnavailableRepository;

impl QuoteRepository for UnavailableRepository {
    fn insert(&self, _record: QuoteRecord) -> Result<QuoteRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &QuoteId) -> Result<Option<QuoteRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn recent(&self, _limit: usize) -> Result<Vec<QuoteRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 16 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
