use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::quoting::domain::{fields, FieldValue, OrderContext, Product, ProductKind, ProductVariant};
use super::config::PricingConfig;
use super::outcome::{Adjustment, RuleOutcome};

pub const VOLUME_DISCOUNT: &str = "volume-discount";
pub const URGENCY_FEE: &str = "urgency-fee";
pub const CERTIFICATION_REQUIRED: &str = "certification-required";

/// Stage of the evaluation pass a rule belongs to. Phases run in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RulePhase {
    Visibility,
    Pricing,
    Requirement,
}

/// Immutable inputs every rule can inspect.
#[derive(Debug, Clone, Copy)]
pub struct RuleInput<'a> {
    pub product: &'a Product,
    pub context: &'a OrderContext,
    pub today: NaiveDate,
}

impl RuleInput<'_> {
    /// Calendar days between today and the requested delivery; negative when the date has passed.
    pub fn days_until_delivery(&self) -> i64 {
        (self.context.requested_delivery() - self.today).num_days()
    }
}

/// Predicate/effect pair evaluated by the engine.
///
/// `apply` must be a pure transformation of the outcome. Guarding against a
/// rule firing twice is the engine's job.
pub trait Rule: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    fn phase(&self) -> RulePhase;

    /// Variant a visibility rule declares fields for.
    fn variant(&self) -> Option<ProductKind> {
        None
    }

    fn applies(&self, input: &RuleInput<'_>, outcome: &RuleOutcome) -> bool;

    fn apply(&self, input: &RuleInput<'_>, outcome: RuleOutcome) -> RuleOutcome;
}

/// Takes a percentage off the running subtotal for large orders.
#[derive(Debug, Clone)]
pub struct VolumeDiscountRule {
    min_quantity: u32,
    rate: Decimal,
}

impl VolumeDiscountRule {
    pub fn new(min_quantity: u32, rate: Decimal) -> Self {
        Self { min_quantity, rate }
    }

    pub fn from_config(config: &PricingConfig) -> Self {
        Self::new(config.volume_discount_min_quantity, config.volume_discount_rate)
    }
}

impl Rule for VolumeDiscountRule {
    fn name(&self) -> &str {
        VOLUME_DISCOUNT
    }

    fn phase(&self) -> RulePhase {
        RulePhase::Pricing
    }

    fn applies(&self, input: &RuleInput<'_>, _outcome: &RuleOutcome) -> bool {
        input.context.quantity() >= self.min_quantity
    }

    fn apply(&self, _input: &RuleInput<'_>, outcome: RuleOutcome) -> RuleOutcome {
        let discount = outcome.subtotal().saturating_mul(self.rate);
        outcome.with_adjustment(Adjustment::discount(VOLUME_DISCOUNT, discount))
    }
}

/// Surcharges orders whose delivery date falls inside the urgency window.
#[derive(Debug, Clone)]
pub struct UrgencyFeeRule {
    window_days: i64,
    rate: Decimal,
}

impl UrgencyFeeRule {
    pub fn new(window_days: i64, rate: Decimal) -> Self {
        Self { window_days, rate }
    }

    pub fn from_config(config: &PricingConfig) -> Self {
        Self::new(config.urgency_window_days, config.urgency_fee_rate)
    }
}

impl Rule for UrgencyFeeRule {
    fn name(&self) -> &str {
        URGENCY_FEE
    }

    fn phase(&self) -> RulePhase {
        RulePhase::Pricing
    }

    fn applies(&self, input: &RuleInput<'_>, _outcome: &RuleOutcome) -> bool {
        input.days_until_delivery() < self.window_days
    }

    fn apply(&self, _input: &RuleInput<'_>, outcome: RuleOutcome) -> RuleOutcome {
        let fee = outcome.subtotal().saturating_mul(self.rate);
        outcome.with_adjustment(Adjustment::surcharge(URGENCY_FEE, fee))
    }
}

/// High-voltage or flagged industrial equipment needs a certification on file.
#[derive(Debug, Clone)]
pub struct CertificationRequiredRule {
    voltage_threshold: u32,
}

impl CertificationRequiredRule {
    pub fn new(voltage_threshold: u32) -> Self {
        Self { voltage_threshold }
    }

    pub fn from_config(config: &PricingConfig) -> Self {
        Self::new(config.certification_voltage_threshold)
    }
}

impl Rule for CertificationRequiredRule {
    fn name(&self) -> &str {
        CERTIFICATION_REQUIRED
    }

    fn phase(&self) -> RulePhase {
        RulePhase::Requirement
    }

    fn applies(&self, input: &RuleInput<'_>, _outcome: &RuleOutcome) -> bool {
        match input.product.variant() {
            ProductVariant::Industrial {
                voltage,
                certification_required,
            } => *certification_required || *voltage > self.voltage_threshold,
            _ => false,
        }
    }

    fn apply(&self, _input: &RuleInput<'_>, outcome: RuleOutcome) -> RuleOutcome {
        outcome.with_required_field(fields::CERTIFICATION)
    }
}

/// Sets the visible fields to exactly what a variant declares.
#[derive(Debug, Clone)]
pub struct FieldVisibilityRule {
    kind: ProductKind,
    name: String,
}

impl FieldVisibilityRule {
    pub fn new(kind: ProductKind) -> Self {
        Self {
            kind,
            name: format!("field-visibility:{}", kind.label()),
        }
    }
}

impl Rule for FieldVisibilityRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn phase(&self) -> RulePhase {
        RulePhase::Visibility
    }

    fn variant(&self) -> Option<ProductKind> {
        Some(self.kind)
    }

    fn applies(&self, input: &RuleInput<'_>, _outcome: &RuleOutcome) -> bool {
        input.product.kind() == self.kind
    }

    fn apply(&self, _input: &RuleInput<'_>, outcome: RuleOutcome) -> RuleOutcome {
        outcome.with_visible_fields(self.kind.form_fields().iter().copied())
    }
}

/// Makes a field visible and mandatory when another form field holds an expected value.
///
/// The posted form value wins; when the form does not carry the field, the
/// product's own attribute of the same name is used. A field found in neither,
/// or holding a different type, means the rule does not apply.
#[derive(Debug, Clone)]
pub struct ConditionalRequirementRule {
    name: String,
    kind: ProductKind,
    when_field: String,
    expected: FieldValue,
    required_field: String,
}

impl ConditionalRequirementRule {
    pub fn new(
        name: impl Into<String>,
        kind: ProductKind,
        when_field: impl Into<String>,
        expected: FieldValue,
        required_field: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            when_field: when_field.into(),
            expected,
            required_field: required_field.into(),
        }
    }

    /// Premium corporate support needs a named contact.
    pub fn premium_support_contact() -> Self {
        Self::new(
            "premium-support-contact",
            ProductKind::Corporate,
            fields::SUPPORT_TIER,
            FieldValue::text("premium"),
            fields::SUPPORT_CONTACT,
        )
    }
}

impl Rule for ConditionalRequirementRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn phase(&self) -> RulePhase {
        RulePhase::Requirement
    }

    fn applies(&self, input: &RuleInput<'_>, _outcome: &RuleOutcome) -> bool {
        input.product.kind() == self.kind
            && match input.context.field_values().get(&self.when_field) {
                Some(value) => value.matches(&self.expected),
                None => input
                    .product
                    .attribute(&self.when_field)
                    .is_some_and(|value| value.matches(&self.expected)),
            }
    }

    fn apply(&self, _input: &RuleInput<'_>, outcome: RuleOutcome) -> RuleOutcome {
        outcome.with_required_field(self.required_field.as_str())
    }
}
