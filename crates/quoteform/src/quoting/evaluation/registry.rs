use std::fmt;

use crate::quoting::domain::ProductKind;
use super::config::PricingConfig;
use super::rules::{
    CertificationRequiredRule, ConditionalRequirementRule, FieldVisibilityRule, Rule, RulePhase,
    UrgencyFeeRule, VolumeDiscountRule,
};

/// Ordered rules for one product variant.
pub struct RuleSet {
    kind: ProductKind,
    rules: Vec<Box<dyn Rule>>,
}

impl RuleSet {
    pub fn new(kind: ProductKind) -> Self {
        Self {
            kind,
            rules: Vec::new(),
        }
    }

    pub fn with_rule(mut self, rule: impl Rule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn kind(&self) -> ProductKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rule_names(&self) -> Vec<&str> {
        self.ordered().into_iter().map(|rule| rule.name()).collect()
    }

    /// Rules grouped by phase, keeping declaration order inside each phase.
    pub fn ordered(&self) -> Vec<&dyn Rule> {
        let mut ordered: Vec<&dyn Rule> = Vec::with_capacity(self.rules.len());
        for phase in [
            RulePhase::Visibility,
            RulePhase::Pricing,
            RulePhase::Requirement,
        ] {
            for rule in self.rules.iter().filter(|rule| rule.phase() == phase) {
                ordered.push(rule.as_ref());
            }
        }
        ordered
    }

    fn validate(&self) -> Result<(), ConfigurationError> {
        let visibility: Vec<&Box<dyn Rule>> = self
            .rules
            .iter()
            .filter(|rule| rule.phase() == RulePhase::Visibility)
            .collect();

        let [rule] = visibility.as_slice() else {
            return Err(ConfigurationError::VisibilityRuleCount {
                kind: self.kind,
                found: visibility.len(),
            });
        };

        if rule.variant() != Some(self.kind) {
            return Err(ConfigurationError::ForeignVisibilityRule {
                kind: self.kind,
                rule: rule.name().to_string(),
            });
        }

        Ok(())
    }

    fn standard(kind: ProductKind, config: &PricingConfig) -> Self {
        let set = RuleSet::new(kind)
            .with_rule(FieldVisibilityRule::new(kind))
            .with_rule(VolumeDiscountRule::from_config(config))
            .with_rule(UrgencyFeeRule::from_config(config));

        match kind {
            ProductKind::Industrial => set.with_rule(CertificationRequiredRule::from_config(config)),
            ProductKind::Residential => set,
            ProductKind::Corporate => {
                set.with_rule(ConditionalRequirementRule::premium_support_contact())
            }
        }
    }
}

impl fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleSet")
            .field("kind", &self.kind)
            .field("rules", &self.rule_names())
            .finish()
    }
}

/// Rule sets for every product variant, built once and shared read-only.
#[derive(Debug)]
pub struct RuleRegistry {
    industrial: RuleSet,
    residential: RuleSet,
    corporate: RuleSet,
}

impl RuleRegistry {
    pub fn standard(config: &PricingConfig) -> Self {
        Self {
            industrial: RuleSet::standard(ProductKind::Industrial, config),
            residential: RuleSet::standard(ProductKind::Residential, config),
            corporate: RuleSet::standard(ProductKind::Corporate, config),
        }
    }

    pub fn builder() -> RuleRegistryBuilder {
        RuleRegistryBuilder::default()
    }

    pub fn rules_for(&self, kind: ProductKind) -> &RuleSet {
        match kind {
            ProductKind::Industrial => &self.industrial,
            ProductKind::Residential => &self.residential,
            ProductKind::Corporate => &self.corporate,
        }
    }
}

/// Assembles a custom registry; `build` checks every variant is covered consistently.
#[derive(Default)]
pub struct RuleRegistryBuilder {
    industrial: Option<RuleSet>,
    residential: Option<RuleSet>,
    corporate: Option<RuleSet>,
    duplicate: Option<ProductKind>,
}

impl RuleRegistryBuilder {
    pub fn register(mut self, set: RuleSet) -> Self {
        let kind = set.kind();
        let slot = match kind {
            ProductKind::Industrial => &mut self.industrial,
            ProductKind::Residential => &mut self.residential,
            ProductKind::Corporate => &mut self.corporate,
        };
        if slot.is_some() && self.duplicate.is_none() {
            self.duplicate = Some(kind);
        }
        *slot = Some(set);
        self
    }

    pub fn build(self) -> Result<RuleRegistry, ConfigurationError> {
        if let Some(kind) = self.duplicate {
            return Err(ConfigurationError::DuplicateRuleSet(kind));
        }

        let industrial = checked(self.industrial, ProductKind::Industrial)?;
        let residential = checked(self.residential, ProductKind::Residential)?;
        let corporate = checked(self.corporate, ProductKind::Corporate)?;

        Ok(RuleRegistry {
            industrial,
            residential,
            corporate,
        })
    }
}

fn checked(set: Option<RuleSet>, kind: ProductKind) -> Result<RuleSet, ConfigurationError> {
    let set = set.ok_or(ConfigurationError::MissingRuleSet(kind))?;
    set.validate()?;
    Ok(set)
}

/// Raised when a custom registry is inconsistent. Fatal at startup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("no rule set registered for {} products", .0.label())]
    MissingRuleSet(ProductKind),
    #[error("rule set for {} products registered more than once", .0.label())]
    DuplicateRuleSet(ProductKind),
    #[error("{} rule set must hold exactly one visibility rule (found {found})", .kind.label())]
    VisibilityRuleCount { kind: ProductKind, found: usize },
    #[error("visibility rule '{rule}' does not belong to the {} rule set", .kind.label())]
    ForeignVisibilityRule { kind: ProductKind, rule: String },
}
