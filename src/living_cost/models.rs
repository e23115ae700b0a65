use crate::address::PostalCode;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque reference to the user a calculation belongs to
///
/// The core never dereferences it; the user entity lives outside.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerRef(String);

impl OwnerRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Calculation request
///
/// `annual_income` is expected in `[1, 100_000_000]`; callers enforce the
/// bound before entering the core.
#[derive(Debug, Clone)]
pub struct CalculationInput {
    pub postal_code: String,
    pub annual_income: i64,
    pub owner: Option<OwnerRef>,
}

impl CalculationInput {
    pub const MIN_ANNUAL_INCOME: i64 = 1;
    pub const MAX_ANNUAL_INCOME: i64 = 100_000_000;

    pub fn new(postal_code: impl Into<String>, annual_income: i64) -> Self {
        Self {
            postal_code: postal_code.into(),
            annual_income,
            owner: None,
        }
    }

    pub fn with_owner(mut self, owner: OwnerRef) -> Self {
        self.owner = Some(owner);
        self
    }
}

/// Monthly cost breakdown for one postal code and income
///
/// All amounts are in the smallest currency unit. The totals are always
/// derived from the five components, never stored alongside them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "CalculationSummary")]
pub struct CalculationResult {
    pub postal_code: PostalCode,
    pub region_name: String,
    pub annual_income: i64,
    pub monthly_rent: i64,
    pub monthly_utilities: i64,
    pub monthly_food: i64,
    pub monthly_communication: i64,
    pub monthly_others: i64,
}

impl CalculationResult {
    pub fn monthly_total(&self) -> i64 {
        self.monthly_rent
            + self.monthly_utilities
            + self.monthly_food
            + self.monthly_communication
            + self.monthly_others
    }

    pub fn annual_total(&self) -> i64 {
        self.monthly_total() * super::rates::MONTHS_PER_YEAR
    }
}

/// Serialized form of [`CalculationResult`] with the derived totals
#[derive(Debug, Clone, Serialize)]
pub struct CalculationSummary {
    pub postal_code: PostalCode,
    pub region_name: String,
    pub annual_income: i64,
    pub monthly_rent: i64,
    pub monthly_utilities: i64,
    pub monthly_food: i64,
    pub monthly_communication: i64,
    pub monthly_others: i64,
    pub monthly_total: i64,
    pub annual_total: i64,
}

impl From<CalculationResult> for CalculationSummary {
    fn from(result: CalculationResult) -> Self {
        let monthly_total = result.monthly_total();
        let annual_total = result.annual_total();
        Self {
            postal_code: result.postal_code,
            region_name: result.region_name,
            annual_income: result.annual_income,
            monthly_rent: result.monthly_rent,
            monthly_utilities: result.monthly_utilities,
            monthly_food: result.monthly_food,
            monthly_communication: result.monthly_communication,
            monthly_others: result.monthly_others,
            monthly_total,
            annual_total,
        }
    }
}
