use chrono::{DateTime, Utc};
use core_config::Environment;
use domain_architecture::CanonicalResourceType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::iter::Sum;
use std::ops::{Add, AddAssign};
use strum::{Display, EnumIter, EnumString};

/// Micro-units per currency unit. Six places keep rate-card products exact.
pub const MICRO_UNITS: i64 = 1_000_000;

/// Currency enumeration
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, Default,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Usd,
}

/// Money representation with precision
///
/// Integer micro-units so that sums are exact and `annual == monthly × 12`
/// holds without rounding drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    /// Amount in millionths of the currency unit
    pub amount: i64,
    /// Currency type
    pub currency: Currency,
    /// Number of decimal places (always 6)
    pub decimal_places: i32,
}

impl Money {
    /// Create a new Money value from micro-units
    pub fn new(amount: i64, currency: Currency) -> Self {
        Self {
            amount,
            currency,
            decimal_places: 6,
        }
    }

    pub fn zero() -> Self {
        Self::new(0, Currency::Usd)
    }

    /// Create Money from a decimal value (e.g., 70.08 USD)
    ///
    /// Values outside the micro-unit range saturate; use
    /// [`Money::checked_from_decimal`] when the input is untrusted.
    pub fn from_decimal(value: f64, currency: Currency) -> Self {
        Self::new((value * MICRO_UNITS as f64).round() as i64, currency)
    }

    /// `None` when `value` is not finite or does not fit in micro-units.
    pub fn checked_from_decimal(value: f64, currency: Currency) -> Option<Self> {
        let micros = (value * MICRO_UNITS as f64).round();
        if !micros.is_finite() || micros.abs() >= i64::MAX as f64 {
            return None;
        }
        Some(Self::new(micros as i64, currency))
    }

    /// Convert to decimal value
    pub fn to_decimal(&self) -> f64 {
        self.amount as f64 / 10f64.powi(self.decimal_places)
    }

    /// Integer multiple (e.g. twelve months), saturating at the i64 bounds
    pub fn times(&self, factor: i64) -> Self {
        Self::new(self.amount.saturating_mul(factor), self.currency)
    }

    pub fn checked_times(&self, factor: i64) -> Option<Self> {
        self.amount
            .checked_mul(factor)
            .map(|amount| Self::new(amount, self.currency))
    }

    pub fn checked_add(&self, rhs: Money) -> Option<Self> {
        self.amount
            .checked_add(rhs.amount)
            .map(|amount| Self::new(amount, self.currency))
    }

    pub fn is_zero(&self) -> bool {
        self.amount == 0
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money::new(self.amount.saturating_add(rhs.amount), self.currency)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.amount = self.amount.saturating_add(rhs.amount);
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Money {
        iter.copied().sum()
    }
}

/// Cost roll-up category
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
pub enum CostCategory {
    Compute,
    Storage,
    Networking,
    Database,
    Monitoring,
    Security,
    Other,
}

/// One named input of a price, e.g. `{"VM Size", "Standard_D2s_v3"}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostFactor {
    pub name: String,
    pub value: String,
}

impl CostFactor {
    pub fn new(name: &str, value: impl ToString) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LineStatus {
    /// Priced from the catalog; included in totals
    Priced,
    /// No pricing model; reported at zero and excluded from totals
    Unpriced,
}

/// One resource's cost entry. Immutable once computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostLineItem {
    pub resource_id: String,
    pub resource_name: String,
    pub canonical_type: CanonicalResourceType,
    pub sku: Option<String>,
    pub monthly_cost: Money,
    pub annual_cost: Money,
    pub cost_factors: Vec<CostFactor>,
    pub assumptions: Vec<String>,
    pub category: CostCategory,
    pub status: LineStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment_multiplier: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region_multiplier: Option<f64>,
}

impl CostLineItem {
    pub fn is_priced(&self) -> bool {
        self.status == LineStatus::Priced
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RecommendationKind {
    ReservedCapacity,
    DevTestPricing,
    BSeriesCompute,
    SqlTierAboveWorkload,
    SkuAboveEnvironment,
    RightSize,
    StorageTiering,
    NetworkConsolidation,
}

/// Threshold-derived cost hint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub kind: RecommendationKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    pub message: String,
    /// Monthly saving if the hint is followed, when it can be computed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_monthly_savings: Option<Money>,
}

/// Cost estimate for one architecture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostReport {
    pub line_items: Vec<CostLineItem>,
    /// Present only for categories whose total is above zero
    pub category_totals: BTreeMap<CostCategory, Money>,
    pub total_monthly: Money,
    pub total_annual: Money,
    pub currency: Currency,
    pub environment: Environment,
    pub region: String,
    pub environment_multiplier: f64,
    pub region_multiplier: f64,
    pub recommendations: Vec<Recommendation>,
    pub warnings: Vec<String>,
    pub pricing_version: String,
    pub disclaimer: String,
    pub generated_at: DateTime<Utc>,
}

impl CostReport {
    pub fn line(&self, resource_id: &str) -> Option<&CostLineItem> {
        self.line_items
            .iter()
            .find(|line| line.resource_id == resource_id)
    }

    pub fn category_total(&self, category: CostCategory) -> Money {
        self.category_totals
            .get(&category)
            .copied()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_from_decimal_rounds_to_micro_units() {
        let money = Money::from_decimal(70.08, Currency::Usd);
        assert_eq!(money.amount, 70_080_000);
        assert_eq!(money.decimal_places, 6);
        assert!((money.to_decimal() - 70.08).abs() < 1e-9);
    }

    #[test]
    fn test_money_times_is_exact() {
        let monthly = Money::from_decimal(1.883333, Currency::Usd);
        assert_eq!(monthly.times(12).amount, monthly.amount * 12);
    }

    #[test]
    fn test_money_checked_from_decimal_rejects_out_of_range() {
        assert_eq!(
            Money::checked_from_decimal(1.5, Currency::Usd),
            Some(Money::from_decimal(1.5, Currency::Usd))
        );
        assert_eq!(Money::checked_from_decimal(1e18, Currency::Usd), None);
        assert_eq!(Money::checked_from_decimal(f64::NAN, Currency::Usd), None);
        assert_eq!(Money::checked_from_decimal(f64::INFINITY, Currency::Usd), None);
    }

    #[test]
    fn test_money_arithmetic_near_the_limit() {
        let huge = Money::new(i64::MAX / 2 + 1, Currency::Usd);

        assert_eq!(huge.checked_times(12), None);
        assert_eq!(huge.checked_add(huge), None);
        assert_eq!(huge.times(12).amount, i64::MAX);
        assert_eq!((huge + huge).amount, i64::MAX);

        let mut total = huge;
        total += huge;
        assert_eq!(total.amount, i64::MAX);

        let small = Money::from_decimal(2.0, Currency::Usd);
        assert_eq!(small.checked_times(12), Some(Money::from_decimal(24.0, Currency::Usd)));
        assert_eq!(small.checked_add(small), Some(Money::from_decimal(4.0, Currency::Usd)));
    }

    #[test]
    fn test_money_sum() {
        let items = [
            Money::from_decimal(1.5, Currency::Usd),
            Money::from_decimal(2.25, Currency::Usd),
        ];
        let total: Money = items.iter().sum();
        assert_eq!(total, Money::from_decimal(3.75, Currency::Usd));
    }

    #[test]
    fn test_money_serializes_as_struct() {
        let json = serde_json::to_value(Money::from_decimal(1.0, Currency::Usd)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "amount": 1_000_000, "currency": "USD", "decimal_places": 6 })
        );
    }

    #[test]
    fn test_categories_order_and_display() {
        assert!(CostCategory::Compute < CostCategory::Other);
        assert_eq!(CostCategory::Networking.to_string(), "Networking");
    }
}
