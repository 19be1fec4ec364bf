use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use quoteform::quoting::{FieldValue, QuoteId, QuoteRecord, QuoteRepository, RepositoryError};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default)]
struct QuoteLog {
    by_id: HashMap<QuoteId, QuoteRecord>,
    order: Vec<QuoteId>,
}

/// Quotes kept in insertion order; `recent` walks that order backwards.
#[derive(Default, Clone)]
pub(crate) struct InMemoryQuoteRepository {
    log: Arc<Mutex<QuoteLog>>,
}

impl InMemoryQuoteRepository {
    fn lock(&self) -> Result<MutexGuard<'_, QuoteLog>, RepositoryError> {
        self.log
            .lock()
            .map_err(|_| RepositoryError::Unavailable("repository mutex poisoned".to_string()))
    }
}

impl QuoteRepository for InMemoryQuoteRepository {
    fn insert(&self, record: QuoteRecord) -> Result<QuoteRecord, RepositoryError> {
        let mut log = self.lock()?;
        if log.by_id.contains_key(&record.quote_id) {
            return Err(RepositoryError::Conflict);
        }
        log.order.push(record.quote_id.clone());
        log.by_id.insert(record.quote_id.clone(), record.clone());
        Ok(record)
    }

    fn fetch(&self, id: &QuoteId) -> Result<Option<QuoteRecord>, RepositoryError> {
        Ok(self.lock()?.by_id.get(id).cloned())
    }

    fn recent(&self, limit: usize) -> Result<Vec<QuoteRecord>, RepositoryError> {
        let log = self.lock()?;
        Ok(log
            .order
            .iter()
            .rev()
            .filter_map(|id| log.by_id.get(id).cloned())
            .take(limit)
            .collect())
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn parse_decimal(raw: &str) -> Result<Decimal, String> {
    raw.trim()
        .parse::<Decimal>()
        .map_err(|err| format!("failed to parse '{raw}' as a decimal amount ({err})"))
}

/// Parses `name=value`, inferring flag, number, date, then text.
pub(crate) fn parse_field(raw: &str) -> Result<(String, FieldValue), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("field '{raw}' must look like name=value"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("field '{raw}' has an empty name"));
    }

    let value = value.trim();
    let parsed = match value.to_ascii_lowercase().as_str() {
        "true" => FieldValue::Flag(true),
        "false" => FieldValue::Flag(false),
        _ => {
            if let Ok(number) = value.parse::<Decimal>() {
                FieldValue::Number(number)
            } else if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
                FieldValue::Date(date)
            } else {
                FieldValue::text(value)
            }
        }
    };

    Ok((name.to_string(), parsed))
}
