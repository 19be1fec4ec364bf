use super::common::*;
use crate::quoting::domain::{fields, FieldValue, FieldValues, Product, SupportTier};
use crate::quoting::evaluation::{
    AdjustmentKind, CertificationRequiredRule, ConditionalRequirementRule, FieldVisibilityRule,
    Rule, RuleInput, RuleOutcome, RulePhase, UrgencyFeeRule, VolumeDiscountRule,
};
use crate::quoting::ProductKind;
use rust_decimal::Decimal;

fn input<'a>(
    product: &'a Product,
    context: &'a crate::quoting::OrderContext,
) -> RuleInput<'a> {
    RuleInput {
        product,
        context,
        today: today(),
    }
}

#[test]
fn volume_discount_applies_from_threshold_quantity() {
    let rule = VolumeDiscountRule::from_config(&pricing_config());
    let product = residential(10);
    let outcome = RuleOutcome::new(dec(490));

    let below = context(49, 30);
    assert!(!rule.applies(&input(&product, &below), &outcome));

    let at = context(50, 30);
    assert!(rule.applies(&input(&product, &at), &outcome));
}

#[test]
fn volume_discount_takes_fifteen_percent_of_running_subtotal() {
    let rule = VolumeDiscountRule::from_config(&pricing_config());
    let product = residential(100);
    let ctx = context(50, 30);

    let outcome = rule.apply(&input(&product, &ctx), RuleOutcome::new(dec(5000)));

    let adjustment = &outcome.adjustments()[0];
    assert_eq!(adjustment.label, "volume-discount");
    assert_eq!(adjustment.kind, AdjustmentKind::Discount);
    assert_eq!(adjustment.amount, dec(-750));
    assert_eq!(outcome.final_price(), dec(4250));
}

#[test]
fn urgency_fee_window_is_exclusive_of_seventh_day() {
    let rule = UrgencyFeeRule::from_config(&pricing_config());
    let product = residential(200);
    let outcome = RuleOutcome::new(dec(200));

    assert!(rule.applies(&input(&product, &context(1, 6)), &outcome));
    assert!(!rule.applies(&input(&product, &context(1, 7)), &outcome));
    assert!(
        rule.applies(&input(&product, &context(1, -2)), &outcome),
        "past delivery dates are treated as urgent"
    );
}

#[test]
fn urgency_fee_surcharges_twenty_percent() {
    let rule = UrgencyFeeRule::from_config(&pricing_config());
    let product = residential(200);
    let ctx = context(1, 3);

    let outcome = rule.apply(&input(&product, &ctx), RuleOutcome::new(dec(200)));

    assert_eq!(outcome.adjustments()[0].kind, AdjustmentKind::Surcharge);
    assert_eq!(outcome.adjustments()[0].amount, dec(40));
    assert_eq!(outcome.final_price(), dec(240));
}

#[test]
fn certification_rule_only_fires_for_high_voltage_or_flagged_industrial() {
    let rule = CertificationRequiredRule::from_config(&pricing_config());
    let outcome = RuleOutcome::new(dec(100));
    let ctx = context(1, 30);

    assert!(rule.applies(&input(&industrial(100, 300), &ctx), &outcome));
    assert!(!rule.applies(&input(&industrial(100, 220), &ctx), &outcome));
    assert!(!rule.applies(&input(&residential(100), &ctx), &outcome));

    let flagged = Product::industrial("ind-flagged", dec(100), 110, true).expect("valid");
    assert!(rule.applies(&input(&flagged, &ctx), &outcome));
}

#[test]
fn certification_rule_marks_field_required_and_visible_without_price_effect() {
    let rule = CertificationRequiredRule::from_config(&pricing_config());
    let product = industrial(100, 300);
    let ctx = context(1, 30);

    let outcome = rule.apply(&input(&product, &ctx), RuleOutcome::new(dec(100)));

    assert!(outcome.is_required(fields::CERTIFICATION));
    assert!(outcome.is_visible(fields::CERTIFICATION));
    assert!(outcome.adjustments().is_empty());
    assert_eq!(outcome.final_price(), dec(100));
}

#[test]
fn visibility_rule_exposes_exactly_the_variant_fields() {
    let rule = FieldVisibilityRule::new(ProductKind::Residential);
    let product = residential(200);
    let ctx = context(1, 30);
    let seeded = RuleOutcome::new(dec(200)).with_visible_fields([fields::VOLTAGE]);

    assert_eq!(rule.phase(), RulePhase::Visibility);
    assert_eq!(rule.variant(), Some(ProductKind::Residential));
    assert!(!rule.applies(&input(&industrial(100, 110), &ctx), &seeded));

    let outcome = rule.apply(&input(&product, &ctx), seeded);
    let visible: Vec<&str> = outcome.visible_fields().iter().map(String::as_str).collect();
    assert_eq!(
        visible,
        vec!["color_code", "delivery_date", "quantity", "warranty_months"]
    );
    assert!(!outcome.is_visible(fields::VOLTAGE));
    assert!(!outcome.is_visible(fields::CERTIFICATION));
}

#[test]
fn conditional_requirement_treats_missing_field_as_not_applying() {
    let rule = ConditionalRequirementRule::premium_support_contact();
    let product = corporate(500, SupportTier::Premium);
    let outcome = RuleOutcome::new(dec(500));

    let standard = corporate(500, SupportTier::Standard);
    let missing = context(1, 30);
    assert!(!rule.applies(&input(&standard, &missing), &outcome));

    let mistyped = context_with_fields(
        1,
        30,
        FieldValues::new().with(fields::SUPPORT_TIER, FieldValue::Number(Decimal::ONE)),
    );
    assert!(!rule.applies(&input(&product, &mistyped), &outcome));

    let premium = context_with_fields(
        1,
        30,
        FieldValues::new().with(fields::SUPPORT_TIER, FieldValue::text(" Premium ")),
    );
    assert!(rule.applies(&input(&product, &premium), &outcome));

    let applied = rule.apply(&input(&product, &premium), outcome);
    assert!(applied.is_required(fields::SUPPORT_CONTACT));
    assert!(applied.is_visible(fields::SUPPORT_CONTACT));
}

#[test]
fn conditional_requirement_falls_back_to_product_attribute() {
    let rule = ConditionalRequirementRule::premium_support_contact();
    let premium = corporate(500, SupportTier::Premium);
    let outcome = RuleOutcome::new(dec(500));

    assert!(rule.applies(&input(&premium, &context(1, 30)), &outcome));

    let basic_form = context_with_fields(
        1,
        30,
        FieldValues::new().with(fields::SUPPORT_TIER, FieldValue::text("basic")),
    );
    assert!(!rule.applies(&input(&premium, &basic_form), &outcome));
}

#[test]
fn numeric_text_matches_number_values() {
    let expected = FieldValue::text("123");
    assert!(FieldValue::Number(dec(123)).matches(&expected));
    assert!(FieldValue::text(" 123.0 ").matches(&FieldValue::Number(dec(123))));
    assert!(!FieldValue::Number(dec(124)).matches(&expected));
    assert!(!FieldValue::Flag(true).matches(&expected));
}

#[test]
fn pricing_rules_saturate_at_decimal_bounds() {
    let product = residential(100);
    let ctx = context(1, 1);
    let rule = UrgencyFeeRule::new(7, dec(1_000));
    let outcome = RuleOutcome::new(Decimal::MAX);

    assert!(rule.applies(&input(&product, &ctx), &outcome));
    let applied = rule.apply(&input(&product, &ctx), outcome);

    assert_eq!(applied.final_price(), Decimal::MAX);
    assert_eq!(applied.adjustments()[0].amount, Decimal::MAX);
}
