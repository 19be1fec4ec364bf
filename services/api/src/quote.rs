use crate::infra::{parse_date, parse_decimal, parse_field};
use chrono::NaiveDate;
use clap::Args;
use quoteform::config::AppConfig;
use quoteform::error::AppError;
use quoteform::quoting::{
    Clock, FieldValue, FieldValues, FixedClock, PricingConfig, ProductDraft, ProductKind,
    QuoteEngine, QuoteRequest, QuoteView, RuleRegistry, SystemClock,
};
use rust_decimal::Decimal;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct QuoteArgs {
    /// Product variant: industrial, residential, or corporate
    #[arg(long, value_parser = parse_kind)]
    pub(crate) kind: ProductKind,
    /// Catalog identifier of the product
    #[arg(long, default_value = "cli-product")]
    pub(crate) product_id: String,
    /// Unit price before rules are applied
    #[arg(long, value_parser = parse_decimal)]
    pub(crate) base_price: Decimal,
    /// Number of units ordered
    #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
    pub(crate) quantity: i64,
    /// Requested delivery date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub(crate) delivery: NaiveDate,
    /// Operating voltage (industrial)
    #[arg(long)]
    pub(crate) voltage: Option<u32>,
    /// Flag the product as needing certification regardless of voltage (industrial)
    #[arg(long)]
    pub(crate) certification_required: bool,
    /// Finish color code (residential)
    #[arg(long)]
    pub(crate) color_code: Option<String>,
    /// Warranty length in months (residential)
    #[arg(long)]
    pub(crate) warranty_months: Option<u16>,
    /// Licensed seats (corporate)
    #[arg(long)]
    pub(crate) license_seats: Option<u32>,
    /// Support tier: basic, standard, or premium (corporate)
    #[arg(long)]
    pub(crate) support_tier: Option<String>,
    /// Additional form field as name=value; repeatable
    #[arg(long = "field", value_parser = parse_field)]
    pub(crate) fields: Vec<(String, FieldValue)>,
    /// Evaluation date (defaults to today)
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Print the quote as JSON instead of a text breakdown
    #[arg(long)]
    pub(crate) json: bool,
}

fn parse_kind(raw: &str) -> Result<ProductKind, String> {
    ProductKind::parse(raw).ok_or_else(|| {
        format!("unknown product kind '{raw}' (expected industrial, residential, or corporate)")
    })
}

impl QuoteArgs {
    fn request(&self) -> QuoteRequest {
        let mut product = ProductDraft::new(self.product_id.clone(), self.kind, self.base_price);
        product.voltage = self.voltage;
        product.certification_required = Some(self.certification_required);
        product.color_code = self.color_code.clone();
        product.warranty_months = self.warranty_months;
        product.license_seats = self.license_seats;
        product.support_tier = self.support_tier.clone();

        QuoteRequest {
            product,
            quantity: self.quantity,
            requested_delivery: self.delivery,
            field_values: self.fields.iter().cloned().collect::<FieldValues>(),
        }
    }
}

pub(crate) fn run_quote(args: QuoteArgs) -> Result<(), AppError> {
    let pricing = AppConfig::load()?.pricing;
    let clock: Arc<dyn Clock> = match args.today {
        Some(today) => Arc::new(FixedClock(today)),
        None => Arc::new(SystemClock),
    };

    let view = evaluate(&args, &pricing, clock)?;

    if args.json {
        match serde_json::to_string_pretty(&view) {
            Ok(json) => println!("{json}"),
            Err(err) => println!("Quote payload unavailable: {err}"),
        }
    } else {
        render_quote(&view);
    }

    Ok(())
}

fn evaluate(
    args: &QuoteArgs,
    pricing: &PricingConfig,
    clock: Arc<dyn Clock>,
) -> Result<QuoteView, AppError> {
    let (product, context) = args.request().validate()?;
    let engine = QuoteEngine::with_clock(Arc::new(RuleRegistry::standard(pricing)), clock);
    let today = engine.today();
    let outcome = engine.evaluate_on(&product, &context, today);
    Ok(QuoteView::build(None, &product, &context, &outcome, today))
}

fn render_quote(view: &QuoteView) {
    println!("Quote for {} ({})", view.product_id, view.kind.label());
    println!(
        "Quantity {} | delivery {} | quoted {}",
        view.quantity, view.requested_delivery, view.quoted_on
    );
    println!("Base price: {}", view.base_price);

    if view.adjustments.is_empty() {
        println!("Adjustments: none");
    } else {
        println!("Adjustments");
        for adjustment in &view.adjustments {
            println!(
                "- {} ({:?}): {}",
                adjustment.label, adjustment.kind, adjustment.amount
            );
        }
    }

    println!("Final price: {}", view.final_price);
    println!("Visible fields: {}", join(&view.visible_fields));
    if view.required_fields.is_empty() {
        println!("Required fields: none");
    } else {
        println!("Required fields: {}", join(&view.required_fields));
    }
}

fn join<'a>(fields: impl IntoIterator<Item = &'a String>) -> String {
    fields
        .into_iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
