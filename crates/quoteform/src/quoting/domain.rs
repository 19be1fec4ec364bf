use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Form field names shared by the rules and the rendering layer.
pub mod fields {
    pub const QUANTITY: &str = "quantity";
    pub const DELIVERY_DATE: &str = "delivery_date";
    pub const VOLTAGE: &str = "voltage";
    pub const CERTIFICATION: &str = "certification";
    pub const COLOR_CODE: &str = "color_code";
    pub const WARRANTY_MONTHS: &str = "warranty_months";
    pub const LICENSE_SEATS: &str = "license_seats";
    pub const SUPPORT_TIER: &str = "support_tier";
    pub const SUPPORT_CONTACT: &str = "support_contact";
}

/// Largest unit price a product may carry, so unit price times any `u32`
/// quantity plus percentage adjustments stays inside `Decimal` range.
pub const MAX_BASE_PRICE: i64 = 1_000_000_000_000_000;

/// Identifier wrapper for catalog products.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProductId(pub String);

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Field-less tag of a product variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductKind {
    Industrial,
    Residential,
    Corporate,
}

impl ProductKind {
    pub const ALL: [ProductKind; 3] = [
        ProductKind::Industrial,
        ProductKind::Residential,
        ProductKind::Corporate,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            ProductKind::Industrial => "industrial",
            ProductKind::Residential => "residential",
            ProductKind::Corporate => "corporate",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "industrial" => Some(Self::Industrial),
            "residential" => Some(Self::Residential),
            "corporate" => Some(Self::Corporate),
            _ => None,
        }
    }

    /// Fields the quote form shows for this variant before any rule adds more.
    pub const fn form_fields(self) -> &'static [&'static str] {
        match self {
            ProductKind::Industrial => &[fields::QUANTITY, fields::DELIVERY_DATE, fields::VOLTAGE],
            ProductKind::Residential => &[
                fields::QUANTITY,
                fields::DELIVERY_DATE,
                fields::COLOR_CODE,
                fields::WARRANTY_MONTHS,
            ],
            ProductKind::Corporate => &[
                fields::QUANTITY,
                fields::DELIVERY_DATE,
                fields::LICENSE_SEATS,
                fields::SUPPORT_TIER,
            ],
        }
    }
}

/// Support contract level sold with corporate licenses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupportTier {
    Basic,
    Standard,
    Premium,
}

impl SupportTier {
    pub const fn label(self) -> &'static str {
        match self {
            SupportTier::Basic => "basic",
            SupportTier::Standard => "standard",
            SupportTier::Premium => "premium",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "basic" => Some(Self::Basic),
            "standard" => Some(Self::Standard),
            "premium" => Some(Self::Premium),
            _ => None,
        }
    }
}

/// Variant-specific attributes of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProductVariant {
    Industrial {
        voltage: u32,
        certification_required: bool,
    },
    Residential {
        color_code: String,
        warranty_months: u16,
    },
    Corporate {
        license_seats: u32,
        support_tier: SupportTier,
    },
}

impl ProductVariant {
    pub const fn kind(&self) -> ProductKind {
        match self {
            ProductVariant::Industrial { .. } => ProductKind::Industrial,
            ProductVariant::Residential { .. } => ProductKind::Residential,
            ProductVariant::Corporate { .. } => ProductKind::Corporate,
        }
    }
}

/// Validated, immutable product. Untrusted input goes through [`ProductDraft`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ProductDraft", into = "ProductDraft")]
pub struct Product {
    id: ProductId,
    base_price: Decimal,
    variant: ProductVariant,
}

impl Product {
    pub fn new(
        id: impl Into<String>,
        base_price: Decimal,
        variant: ProductVariant,
    ) -> Result<Self, ValidationError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ValidationError::BlankProductId);
        }
        if base_price.is_sign_negative() && !base_price.is_zero() {
            return Err(ValidationError::NegativeBasePrice(base_price));
        }
        if base_price > Decimal::from(MAX_BASE_PRICE) {
            return Err(ValidationError::PriceOutOfRange {
                found: base_price,
                max: Decimal::from(MAX_BASE_PRICE),
            });
        }
        validate_variant(&variant)?;

        Ok(Self {
            id: ProductId(id.trim().to_string()),
            base_price,
            variant,
        })
    }

    pub fn industrial(
        id: impl Into<String>,
        base_price: Decimal,
        voltage: u32,
        certification_required: bool,
    ) -> Result<Self, ValidationError> {
        Self::new(
            id,
            base_price,
            ProductVariant::Industrial {
                voltage,
                certification_required,
            },
        )
    }

    pub fn residential(
        id: impl Into<String>,
        base_price: Decimal,
        color_code: impl Into<String>,
        warranty_months: u16,
    ) -> Result<Self, ValidationError> {
        Self::new(
            id,
            base_price,
            ProductVariant::Residential {
                color_code: color_code.into(),
                warranty_months,
            },
        )
    }

    pub fn corporate(
        id: impl Into<String>,
        base_price: Decimal,
        license_seats: u32,
        support_tier: SupportTier,
    ) -> Result<Self, ValidationError> {
        Self::new(
            id,
            base_price,
            ProductVariant::Corporate {
                license_seats,
                support_tier,
            },
        )
    }

    pub fn id(&self) -> &ProductId {
        &self.id
    }

    pub fn base_price(&self) -> Decimal {
        self.base_price
    }

    pub fn variant(&self) -> &ProductVariant {
        &self.variant
    }

    pub fn kind(&self) -> ProductKind {
        self.variant.kind()
    }

    /// Variant attribute stored under a form field name, as the form would carry it.
    pub fn attribute(&self, field: &str) -> Option<FieldValue> {
        match (&self.variant, field) {
            (ProductVariant::Industrial { voltage, .. }, fields::VOLTAGE) => {
                Some(FieldValue::Number(Decimal::from(*voltage)))
            }
            (
                ProductVariant::Industrial {
                    certification_required,
                    ..
                },
                fields::CERTIFICATION,
            ) => Some(FieldValue::Flag(*certification_required)),
            (ProductVariant::Residential { color_code, .. }, fields::COLOR_CODE) => {
                Some(FieldValue::text(color_code.as_str()))
            }
            (
                ProductVariant::Residential {
                    warranty_months, ..
                },
                fields::WARRANTY_MONTHS,
            ) => Some(FieldValue::Number(Decimal::from(*warranty_months))),
            (ProductVariant::Corporate { license_seats, .. }, fields::LICENSE_SEATS) => {
                Some(FieldValue::Number(Decimal::from(*license_seats)))
            }
            (ProductVariant::Corporate { support_tier, .. }, fields::SUPPORT_TIER) => {
                Some(FieldValue::text(support_tier.label()))
            }
            _ => None,
        }
    }
}

fn validate_variant(variant: &ProductVariant) -> Result<(), ValidationError> {
    match variant {
        ProductVariant::Industrial { voltage, .. } if *voltage == 0 => {
            Err(ValidationError::InvalidAttribute {
                attribute: fields::VOLTAGE,
                reason: "voltage must be greater than zero".to_string(),
            })
        }
        ProductVariant::Residential { color_code, .. } if color_code.trim().is_empty() => {
            Err(ValidationError::MissingAttribute {
                kind: ProductKind::Residential,
                attribute: fields::COLOR_CODE,
            })
        }
        ProductVariant::Corporate { license_seats, .. } if *license_seats == 0 => {
            Err(ValidationError::InvalidAttribute {
                attribute: fields::LICENSE_SEATS,
                reason: "at least one license seat is required".to_string(),
            })
        }
        _ => Ok(()),
    }
}

/// Raw product record as submitted by a form or API caller; every variant attribute is optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDraft {
    pub id: String,
    pub kind: ProductKind,
    pub base_price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voltage: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certification_required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warranty_months: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_seats: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub support_tier: Option<String>,
}

impl ProductDraft {
    pub fn new(id: impl Into<String>, kind: ProductKind, base_price: Decimal) -> Self {
        Self {
            id: id.into(),
            kind,
            base_price,
            voltage: None,
            certification_required: None,
            color_code: None,
            warranty_months: None,
            license_seats: None,
            support_tier: None,
        }
    }
}

impl TryFrom<ProductDraft> for Product {
    type Error = ValidationError;

    fn try_from(draft: ProductDraft) -> Result<Self, Self::Error> {
        let kind = draft.kind;
        let missing = |attribute: &'static str| ValidationError::MissingAttribute { kind, attribute };

        let variant = match kind {
            ProductKind::Industrial => ProductVariant::Industrial {
                voltage: draft.voltage.ok_or_else(|| missing(fields::VOLTAGE))?,
                certification_required: draft.certification_required.unwrap_or(false),
            },
            ProductKind::Residential => ProductVariant::Residential {
                color_code: draft.color_code.ok_or_else(|| missing(fields::COLOR_CODE))?,
                warranty_months: draft
                    .warranty_months
                    .ok_or_else(|| missing(fields::WARRANTY_MONTHS))?,
            },
            ProductKind::Corporate => {
                let raw_tier = draft
                    .support_tier
                    .ok_or_else(|| missing(fields::SUPPORT_TIER))?;
                let support_tier =
                    SupportTier::parse(&raw_tier).ok_or_else(|| ValidationError::InvalidAttribute {
                        attribute: fields::SUPPORT_TIER,
                        reason: format!("unknown support tier '{raw_tier}'"),
                    })?;
                ProductVariant::Corporate {
                    license_seats: draft
                        .license_seats
                        .ok_or_else(|| missing(fields::LICENSE_SEATS))?,
                    support_tier,
                }
            }
        };

        Product::new(draft.id, draft.base_price, variant)
    }
}

impl From<Product> for ProductDraft {
    fn from(product: Product) -> Self {
        let mut draft = ProductDraft::new(product.id.0, product.variant.kind(), product.base_price);
        match product.variant {
            ProductVariant::Industrial {
                voltage,
                certification_required,
            } => {
                draft.voltage = Some(voltage);
                draft.certification_required = Some(certification_required);
            }
            ProductVariant::Residential {
                color_code,
                warranty_months,
            } => {
                draft.color_code = Some(color_code);
                draft.warranty_months = Some(warranty_months);
            }
            ProductVariant::Corporate {
                license_seats,
                support_tier,
            } => {
                draft.license_seats = Some(license_seats);
                draft.support_tier = Some(support_tier.label().to_string());
            }
        }
        draft
    }
}

/// Value captured by a dynamic form field.
///
/// JSON input is matched in declaration order, so a string that parses as a
/// decimal (`"123"`) arrives as `Number`. `matches` compares such numbers
/// against expected text by value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Flag(bool),
    Number(Decimal),
    Date(NaiveDate),
    Text(String),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Text compares case-insensitively after trimming, numeric text compares
    /// against numbers by value, other values compare exactly.
    pub fn matches(&self, expected: &FieldValue) -> bool {
        match (self, expected) {
            (FieldValue::Text(actual), FieldValue::Text(expected)) => {
                actual.trim().eq_ignore_ascii_case(expected.trim())
            }
            (FieldValue::Number(number), FieldValue::Text(text))
            | (FieldValue::Text(text), FieldValue::Number(number)) => text
                .trim()
                .parse::<Decimal>()
                .is_ok_and(|parsed| parsed == *number),
            (actual, expected) => actual == expected,
        }
    }
}

/// Field values keyed by field name, ordered for deterministic output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldValues(BTreeMap<String, FieldValue>);

impl FieldValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: impl Into<String>, value: FieldValue) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: FieldValue) {
        self.0.insert(field.into(), value);
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.0.get(field)
    }

    pub fn number(&self, field: &str) -> Option<Decimal> {
        match self.0.get(field) {
            Some(FieldValue::Number(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn text(&self, field: &str) -> Option<&str> {
        match self.0.get(field) {
            Some(FieldValue::Text(value)) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.0.iter().map(|(field, value)| (field.as_str(), value))
    }
}

impl<K: Into<String>> FromIterator<(K, FieldValue)> for FieldValues {
    fn from_iter<I: IntoIterator<Item = (K, FieldValue)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(field, value)| (field.into(), value))
                .collect(),
        )
    }
}

/// Order parameters for one quote attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderContext {
    quantity: u32,
    requested_delivery: NaiveDate,
    field_values: FieldValues,
}

impl OrderContext {
    pub fn new(
        quantity: u32,
        requested_delivery: NaiveDate,
        field_values: FieldValues,
    ) -> Result<Self, ValidationError> {
        if quantity < 1 {
            return Err(ValidationError::QuantityBelowMinimum(i64::from(quantity)));
        }

        Ok(Self {
            quantity,
            requested_delivery,
            field_values,
        })
    }

    /// Accepts the signed quantity a form posts, rejecting anything below one
    /// or above `u32::MAX`.
    pub fn from_requested(
        quantity: i64,
        requested_delivery: NaiveDate,
        field_values: FieldValues,
    ) -> Result<Self, ValidationError> {
        if quantity < 1 {
            return Err(ValidationError::QuantityBelowMinimum(quantity));
        }
        let quantity =
            u32::try_from(quantity).map_err(|_| ValidationError::QuantityAboveMaximum {
                found: quantity,
                max: u32::MAX,
            })?;
        Self::new(quantity, requested_delivery, field_values)
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn requested_delivery(&self) -> NaiveDate {
        self.requested_delivery
    }

    pub fn field_values(&self) -> &FieldValues {
        &self.field_values
    }
}

/// Raised when a product or order context cannot be constructed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("product id must not be blank")]
    BlankProductId,
    #[error("base price must not be negative (found {0})")]
    NegativeBasePrice(Decimal),
    #[error("{} product is missing required attribute '{attribute}'", .kind.label())]
    MissingAttribute {
        kind: ProductKind,
        attribute: &'static str,
    },
    #[error("invalid value for '{attribute}': {reason}")]
    InvalidAttribute {
        attribute: &'static str,
        reason: String,
    },
    #[error("base price must not exceed {max} (found {found})")]
    PriceOutOfRange { found: Decimal, max: Decimal },
    #[error("quantity must be at least 1 (found {0})")]
    QuantityBelowMinimum(i64),
    #[error("quantity must be at most {max} (found {found})")]
    QuantityAboveMaximum { found: i64, max: u32 },
}
