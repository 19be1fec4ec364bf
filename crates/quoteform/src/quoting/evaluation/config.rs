use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Numeric dials of the standard pricing and requirement rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    pub volume_discount_min_quantity: u32,
    pub volume_discount_rate: Decimal,
    pub urgency_window_days: i64,
    pub urgency_fee_rate: Decimal,
    pub certification_voltage_threshold: u32,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            volume_discount_min_quantity: 50,
            volume_discount_rate: Decimal::new(15, 2),
            urgency_window_days: 7,
            urgency_fee_rate: Decimal::new(20, 2),
            certification_voltage_threshold: 220,
        }
    }
}
