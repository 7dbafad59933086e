//! Weight-based pricing.
//!
//! Every price in the shop is a per-pound rate applied to the measured weight.
//! Amounts are kept as integer cents (`Money`) so two-decimal rounding happens
//! exactly once, at computation time.

use std::collections::BTreeMap;

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use thriftstock_core::{DomainError, DomainResult, ValueObject};

use crate::record::Tier;

/// Grams in one avoirdupois pound.
pub const GRAMS_PER_POUND: f64 = 453.592;

/// Fixed acquisition cost per pound (CAD) used when no configuration overrides it.
pub const DEFAULT_COST_PER_LB: f64 = 1.79;

/// Upper bound for any per-pound rate (CAD).
pub const MAX_RATE_PER_LB: f64 = 10_000.0;

/// Convert a raw weight in grams to pounds.
pub fn grams_to_pounds(grams: f64) -> f64 {
    grams / GRAMS_PER_POUND
}

/// Monetary amount in CAD, stored as cents.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Money(i64);

impl ValueObject for Money {}

impl Money {
    pub const ZERO: Money = Money(0);

    /// Largest amount (in dollars, either sign) accepted when parsing.
    pub const MAX_DOLLARS: f64 = 1_000_000_000.0;

    pub fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Round a dollar amount to the nearest cent (half away from zero).
    pub fn from_dollars(amount: f64) -> Self {
        Self((amount * 100.0).round() as i64)
    }

    pub fn cents(&self) -> i64 {
        self.0
    }

    pub fn as_dollars(&self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl core::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl core::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, |acc, m| acc + m)
    }
}

impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl FromStr for Money {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let amount: f64 = s
            .trim()
            .trim_start_matches('$')
            .parse()
            .map_err(|_| DomainError::validation(format!("invalid amount: {s:?}")))?;
        if !amount.is_finite() || amount.abs() > Money::MAX_DOLLARS {
            return Err(DomainError::validation(format!("invalid amount: {s:?}")));
        }
        Ok(Money::from_dollars(amount))
    }
}

impl TryFrom<String> for Money {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Money> for String {
    fn from(value: Money) -> Self {
        value.to_string()
    }
}

/// Per-pound retail rate for each tier (CAD).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RateTable(BTreeMap<Tier, f64>);

impl RateTable {
    pub fn new(rates: impl IntoIterator<Item = (Tier, f64)>) -> Self {
        Self(rates.into_iter().collect())
    }

    pub fn rate(&self, tier: Tier) -> Option<f64> {
        self.0.get(&tier).copied()
    }

    pub fn set(&mut self, tier: Tier, rate: f64) {
        self.0.insert(tier, rate);
    }

    pub fn iter(&self) -> impl Iterator<Item = (Tier, f64)> + '_ {
        self.0.iter().map(|(t, r)| (*t, *r))
    }
}

impl Default for RateTable {
    /// Non-subscriber rates.
    fn default() -> Self {
        Self::new([
            (Tier::One, 7.50),
            (Tier::Two, 5.50),
            (Tier::Three, 4.00),
            (Tier::Bundle, 3.75),
        ])
    }
}

/// Retail price for a weight in pounds at the tier's rate.
///
/// Fails with `UnknownTier` when the table has no rate for `tier`; there is no
/// zero-price fallback.
pub fn compute_price(weight_lb: f64, tier: Tier, rates: &RateTable) -> DomainResult<Money> {
    let rate = rates
        .rate(tier)
        .ok_or_else(|| DomainError::unknown_tier(tier.to_string()))?;
    Ok(Money::from_dollars(weight_lb * rate))
}

/// Acquisition cost for a weight in pounds at a fixed per-pound rate.
pub fn compute_cost(weight_lb: f64, cost_per_lb: f64) -> Money {
    Money::from_dollars(weight_lb * cost_per_lb)
}

/// Everything needed to price a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingPolicy {
    #[serde(default)]
    pub rates: RateTable,
    #[serde(default = "default_cost_per_lb")]
    pub cost_per_lb: f64,
}

fn default_cost_per_lb() -> f64 {
    DEFAULT_COST_PER_LB
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            rates: RateTable::default(),
            cost_per_lb: DEFAULT_COST_PER_LB,
        }
    }
}

/// Price and cost computed together for one weight.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Quote {
    pub price: Money,
    pub cost: Money,
}

impl PricingPolicy {
    /// Every rate must be a finite, non-negative number no larger than
    /// [`MAX_RATE_PER_LB`].
    pub fn validate(&self) -> DomainResult<()> {
        let check = |what: String, rate: f64| {
            if rate.is_finite() && (0.0..=MAX_RATE_PER_LB).contains(&rate) {
                Ok(())
            } else {
                Err(DomainError::validation(format!(
                    "{what} must be between 0 and {MAX_RATE_PER_LB} CAD/lb (got {rate})"
                )))
            }
        };
        for (tier, rate) in self.rates.iter() {
            check(format!("rate for tier {tier}"), rate)?;
        }
        check("cost_per_lb".to_string(), self.cost_per_lb)
    }

    pub fn quote(&self, weight_g: f64, tier: Tier) -> DomainResult<Quote> {
        let weight_lb = grams_to_pounds(weight_g);
        Ok(Quote {
            price: compute_price(weight_lb, tier, &self.rates)?,
            cost: compute_cost(weight_lb, self.cost_per_lb),
        })
    }
}
