mod config;
mod outcome;
mod registry;
mod rules;

pub use config::PricingConfig;
pub use outcome::{Adjustment, AdjustmentKind, RuleOutcome};
pub use registry::{ConfigurationError, RuleRegistry, RuleRegistryBuilder, RuleSet};
pub use rules::{
    CertificationRequiredRule, ConditionalRequirementRule, FieldVisibilityRule, Rule, RuleInput,
    RulePhase, UrgencyFeeRule, VolumeDiscountRule, CERTIFICATION_REQUIRED, URGENCY_FEE,
    VOLUME_DISCOUNT,
};

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;
use tracing::{debug, info};

use super::domain::{OrderContext, Product};

/// Source of the evaluation date used by the urgency rule.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Local calendar date of the host.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Pinned date for reproducible quotes and tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// Stateless evaluator folding a variant's rule set over the order's base price.
#[derive(Clone)]
pub struct QuoteEngine {
    registry: Arc<RuleRegistry>,
    clock: Arc<dyn Clock>,
}

impl QuoteEngine {
    pub fn new(registry: Arc<RuleRegistry>) -> Self {
        Self::with_clock(registry, Arc::new(SystemClock))
    }

    pub fn standard(config: &PricingConfig) -> Self {
        Self::new(Arc::new(RuleRegistry::standard(config)))
    }

    pub fn with_clock(registry: Arc<RuleRegistry>, clock: Arc<dyn Clock>) -> Self {
        Self { registry, clock }
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn evaluate(&self, product: &Product, context: &OrderContext) -> RuleOutcome {
        self.evaluate_on(product, context, self.clock.today())
    }

    /// Visibility rules run first, then pricing rules in declared order (volume
    /// discount before urgency fee), then requirement rules.
    pub fn evaluate_on(
        &self,
        product: &Product,
        context: &OrderContext,
        today: NaiveDate,
    ) -> RuleOutcome {
        let input = RuleInput {
            product,
            context,
            today,
        };
        let base_price = product
            .base_price()
            .saturating_mul(Decimal::from(context.quantity()));
        let rule_set = self.registry.rules_for(product.kind());

        let outcome = rule_set
            .ordered()
            .into_iter()
            .fold(RuleOutcome::new(base_price), |outcome, rule| {
                if outcome.has_applied(rule.name()) {
                    debug!(rule = rule.name(), "skipping rule already applied");
                    return outcome;
                }
                if !rule.applies(&input, &outcome) {
                    return outcome;
                }

                debug!(rule = rule.name(), phase = ?rule.phase(), "rule applied");
                rule.apply(&input, outcome).record_rule(rule.name())
            });

        info!(
            product_id = %product.id(),
            kind = product.kind().label(),
            quantity = context.quantity(),
            final_price = %outcome.final_price(),
            "quote evaluated"
        );

        outcome
    }
}

impl std::fmt::Debug for QuoteEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuoteEngine")
            .field("registry", &self.registry)
            .field("today", &self.clock.today())
            .finish()
    }
}
