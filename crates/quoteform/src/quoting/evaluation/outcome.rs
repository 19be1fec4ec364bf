use std::collections::BTreeSet;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

/// Direction of a price adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentKind {
    Discount,
    Surcharge,
}

/// Named price delta recorded by a pricing rule. Discounts carry negative amounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Adjustment {
    pub label: String,
    pub amount: Decimal,
    pub kind: AdjustmentKind,
}

impl Adjustment {
    pub fn discount(label: impl Into<String>, magnitude: Decimal) -> Self {
        Self {
            label: label.into(),
            amount: Decimal::ZERO - to_cents(magnitude.abs()),
            kind: AdjustmentKind::Discount,
        }
    }

    pub fn surcharge(label: impl Into<String>, magnitude: Decimal) -> Self {
        Self {
            label: label.into(),
            amount: to_cents(magnitude.abs()),
            kind: AdjustmentKind::Surcharge,
        }
    }
}

fn to_cents(amount: Decimal) -> Decimal {
    amount
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        .normalize()
}

/// Accumulated result of one evaluation pass.
///
/// The final price is always derived from the base price and the recorded
/// adjustments, and every required field is also visible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleOutcome {
    base_price: Decimal,
    adjustments: Vec<Adjustment>,
    required_fields: BTreeSet<String>,
    visible_fields: BTreeSet<String>,
    applied_rules: Vec<String>,
}

impl RuleOutcome {
    pub fn new(base_price: Decimal) -> Self {
        Self {
            base_price,
            adjustments: Vec::new(),
            required_fields: BTreeSet::new(),
            visible_fields: BTreeSet::new(),
            applied_rules: Vec::new(),
        }
    }

    pub fn base_price(&self) -> Decimal {
        self.base_price
    }

    pub fn adjustments(&self) -> &[Adjustment] {
        &self.adjustments
    }

    pub fn required_fields(&self) -> &BTreeSet<String> {
        &self.required_fields
    }

    pub fn visible_fields(&self) -> &BTreeSet<String> {
        &self.visible_fields
    }

    /// Names of the rules that fired, in application order.
    pub fn applied_rules(&self) -> &[String] {
        &self.applied_rules
    }

    /// Running price at this point of the evaluation. Saturates at the `Decimal` bounds.
    pub fn subtotal(&self) -> Decimal {
        self.adjustments
            .iter()
            .fold(self.base_price, |total, adjustment| {
                total.saturating_add(adjustment.amount)
            })
    }

    pub fn final_price(&self) -> Decimal {
        self.subtotal()
    }

    pub fn total_for(&self, kind: AdjustmentKind) -> Decimal {
        self.adjustments
            .iter()
            .filter(|adjustment| adjustment.kind == kind)
            .fold(Decimal::ZERO, |total, adjustment| {
                total.saturating_add(adjustment.amount)
            })
    }

    pub fn is_visible(&self, field: &str) -> bool {
        self.visible_fields.contains(field)
    }

    pub fn is_required(&self, field: &str) -> bool {
        self.required_fields.contains(field)
    }

    pub fn has_applied(&self, rule: &str) -> bool {
        self.applied_rules.iter().any(|name| name == rule)
    }

    pub fn with_adjustment(mut self, adjustment: Adjustment) -> Self {
        self.adjustments.push(adjustment);
        self
    }

    /// Replaces the visible set; fields already required stay visible.
    pub fn with_visible_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.visible_fields = fields.into_iter().map(Into::into).collect();
        self.visible_fields.extend(self.required_fields.iter().cloned());
        self
    }

    /// Marks a field mandatory, which also makes it visible.
    pub fn with_required_field(mut self, field: impl Into<String>) -> Self {
        let field = field.into();
        self.visible_fields.insert(field.clone());
        self.required_fields.insert(field);
        self
    }

    pub(crate) fn record_rule(mut self, rule: &str) -> Self {
        self.applied_rules.push(rule.to_string());
        self
    }
}
