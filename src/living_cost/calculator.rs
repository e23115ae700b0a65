use crate::address::{AddressResolver, PostalCode};
use crate::error::CostError;
use crate::history::{HistoryRecord, HistoryStore};
use crate::living_cost::models::{CalculationInput, CalculationResult, OwnerRef};
use crate::living_cost::rates::{
    RateTable, FOOD_RATE_PERCENT, MAX_RENT_RATE_PERCENT, MONTHLY_COMMUNICATION_FEE,
    MONTHS_PER_YEAR, OTHERS_RATE_PERCENT, UTILITIES_RATE_PERCENT,
};
use std::sync::Arc;
use tracing::{debug, info};

/// Computes the monthly cost breakdown and records it for known owners
pub struct CostEstimator {
    resolver: AddressResolver,
    rates: Arc<RateTable>,
    history: Arc<HistoryStore>,
}

impl CostEstimator {
    pub fn new(resolver: AddressResolver, rates: Arc<RateTable>, history: Arc<HistoryStore>) -> Self {
        Self {
            resolver,
            rates,
            history,
        }
    }

    /// Calculate the breakdown for `input`
    ///
    /// Resolver errors propagate unchanged. A region that resolves to nothing
    /// (fallback miss) or has no rent entry fails with `UnknownRegion`. When an
    /// owner is present the result is appended to history; if that append fails
    /// the result is discarded and the error returned.
    pub async fn calculate(&self, input: &CalculationInput) -> Result<CalculationResult, CostError> {
        let postal_code = PostalCode::parse(&input.postal_code)?;
        let region_name = self
            .resolver
            .resolve_code(&postal_code)
            .await?
            .ok_or_else(|| {
                CostError::UnknownRegion(format!(
                    "no region resolved for postal code {}",
                    crate::logging::MaskedPostalCode::new(postal_code.as_str())
                ))
            })?;

        let average_rent = self.rates.average_rent(&region_name)?;
        let result = compute_breakdown(postal_code, region_name, input.annual_income, average_rent);

        // Income and amounts stay out of the logs
        info!("Living cost calculation completed");

        if let Some(owner) = &input.owner {
            self.record(owner, &result).await?;
        }

        Ok(result)
    }

    async fn record(&self, owner: &OwnerRef, result: &CalculationResult) -> Result<HistoryRecord, CostError> {
        debug!("Saving calculation history");
        let record = self.history.append(owner, result).await?;
        debug!(id = record.id, "Calculation history saved");
        Ok(record)
    }
}

/// Deterministic breakdown arithmetic
///
/// Integer math with truncating division at each step, in this order:
/// the rent cap and the income-based items divide by twelve first.
pub fn compute_breakdown(
    postal_code: PostalCode,
    region_name: String,
    annual_income: i64,
    average_rent: i64,
) -> CalculationResult {
    let monthly_income = annual_income / MONTHS_PER_YEAR;

    let max_rent = monthly_income * MAX_RENT_RATE_PERCENT / 100;
    let monthly_rent = average_rent.min(max_rent);
    let monthly_utilities = monthly_rent * UTILITIES_RATE_PERCENT / 100;
    let monthly_food = monthly_income * FOOD_RATE_PERCENT / 100;
    let monthly_others = monthly_income * OTHERS_RATE_PERCENT / 100;

    CalculationResult {
        postal_code,
        region_name,
        annual_income,
        monthly_rent,
        monthly_utilities,
        monthly_food,
        monthly_communication: MONTHLY_COMMUNICATION_FEE,
        monthly_others,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::resolver::tests::{CountingLookup, StubLookup};
    use crate::history::{PageRequest, SearchFilter};

    async fn estimator(stub: StubLookup) -> (CostEstimator, Arc<HistoryStore>) {
        let history = Arc::new(HistoryStore::in_memory().await.unwrap());
        let rates = Arc::new(RateTable::builtin());
        let resolver = AddressResolver::new(CountingLookup::new(stub), rates.clone());
        (CostEstimator::new(resolver, rates, history.clone()), history)
    }

    fn tokyo(annual_income: i64) -> CalculationResult {
        compute_breakdown(
            PostalCode::parse("1000001").unwrap(),
            "東京都".to_string(),
            annual_income,
            80000,
        )
    }

    #[test]
    fn test_tokyo_scenario() {
        let result = tokyo(6_000_000);
        assert_eq!(result.monthly_rent, 80000);
        assert_eq!(result.monthly_utilities, 9600);
        assert_eq!(result.monthly_food, 60000);
        assert_eq!(result.monthly_communication, 4000);
        assert_eq!(result.monthly_others, 25000);
        assert_eq!(result.monthly_total(), 178600);
        assert_eq!(result.annual_total(), 2_143_200);
    }

    #[test]
    fn test_low_income_caps_rent() {
        let result = tokyo(120_000);
        // 120_000 / 12 * 25 / 100
        assert_eq!(result.monthly_rent, 2500);
        assert_eq!(result.monthly_utilities, 300);
        assert_eq!(result.monthly_food, 1200);
        assert_eq!(result.monthly_others, 500);
        assert_eq!(result.monthly_total(), 8500);
    }

    #[test]
    fn test_truncation_order() {
        // 1_000_007 / 12 = 83_333 first, then * 25 / 100 = 20_833
        let result = tokyo(1_000_007);
        assert_eq!(result.monthly_rent, 20_833);
        assert_eq!(result.monthly_utilities, 2_499);
        assert_eq!(result.monthly_food, 9_999);
        assert_eq!(result.monthly_others, 4_166);
    }

    #[test]
    fn test_invariants_hold_across_incomes() {
        for income in [1, 11, 12, 999, 120_000, 3_840_000, 6_000_000, 99_999_999, 100_000_000] {
            let result = tokyo(income);
            let sum = result.monthly_rent
                + result.monthly_utilities
                + result.monthly_food
                + result.monthly_communication
                + result.monthly_others;
            assert_eq!(result.monthly_total(), sum);
            assert_eq!(result.annual_total(), sum * 12);
            assert!(result.monthly_rent <= 80000);
            assert!(result.monthly_rent <= income / 12 * 25 / 100);
            assert!(result.monthly_rent >= 0);
        }
    }

    #[tokio::test]
    async fn test_calculate_is_deterministic() {
        let (estimator, _) = estimator(StubLookup::Found("東京都")).await;
        let input = CalculationInput::new("100-0001", 6_000_000);
        let first = estimator.calculate(&input).await.unwrap();
        let second = estimator.calculate(&input).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.postal_code.as_str(), "1000001");
        assert_eq!(first.monthly_total(), 178600);
    }

    #[tokio::test]
    async fn test_anonymous_calculation_is_not_recorded() {
        let (estimator, history) = estimator(StubLookup::Found("東京都")).await;
        estimator
            .calculate(&CalculationInput::new("1000001", 6_000_000))
            .await
            .unwrap();
        assert_eq!(history.count(&SearchFilter::default()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_owned_calculation_is_recorded() {
        let (estimator, history) = estimator(StubLookup::Found("東京都")).await;
        let owner = OwnerRef::new("user-1");
        let input = CalculationInput::new("1000001", 6_000_000).with_owner(owner.clone());
        let result = estimator.calculate(&input).await.unwrap();

        let records = history
            .search(&SearchFilter::for_owner(owner), PageRequest::first(10))
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].result, result);
    }

    #[tokio::test]
    async fn test_failed_append_discards_result() {
        let history = Arc::new(HistoryStore::unmigrated_in_memory().await.unwrap());
        let rates = Arc::new(RateTable::builtin());
        let resolver = AddressResolver::new(CountingLookup::new(StubLookup::Found("東京都")), rates.clone());
        let estimator = CostEstimator::new(resolver, rates, history);

        let input = CalculationInput::new("1000001", 6_000_000).with_owner(OwnerRef::new("user-1"));
        let err = estimator.calculate(&input).await.unwrap_err();
        assert!(matches!(err, CostError::Persistence(_)));

        // Anonymous calculations never touch the store
        assert!(estimator
            .calculate(&CalculationInput::new("1000001", 6_000_000))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_region_without_rent_is_unknown_region() {
        let (estimator, _) = estimator(StubLookup::Found("沖縄県")).await;
        let err = estimator
            .calculate(&CalculationInput::new("9000001", 6_000_000))
            .await
            .unwrap_err();
        assert!(matches!(err, CostError::UnknownRegion(name) if name == "沖縄県"));
    }

    #[tokio::test]
    async fn test_fallback_hit_without_rent_is_unknown_region() {
        // Lookup down, prefix 26 falls back to 京都府, which has no rent entry
        let (estimator, _) = estimator(StubLookup::Unreachable).await;
        let err = estimator
            .calculate(&CalculationInput::new("2600001", 6_000_000))
            .await
            .unwrap_err();
        assert!(matches!(err, CostError::UnknownRegion(name) if name == "京都府"));
    }

    #[tokio::test]
    async fn test_fallback_hit_with_rent_calculates() {
        let (estimator, _) = estimator(StubLookup::Unreachable).await;
        let result = estimator
            .calculate(&CalculationInput::new("100-0001", 6_000_000))
            .await
            .unwrap();
        assert_eq!(result.region_name, "東京都");
        assert_eq!(result.monthly_total(), 178600);
    }

    #[tokio::test]
    async fn test_fallback_miss_is_unknown_region_in_estimator() {
        let (estimator, history) = estimator(StubLookup::Unreachable).await;

        // The resolver itself reports the miss as "no region" without an error
        assert_eq!(estimator.resolver.resolve("9990001").await.unwrap(), None);

        let input = CalculationInput::new("9990001", 6_000_000).with_owner(OwnerRef::new("user-1"));
        let err = estimator.calculate(&input).await.unwrap_err();
        assert!(matches!(err, CostError::UnknownRegion(_)));
        assert_eq!(history.count(&SearchFilter::default()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_not_found_propagates_unchanged() {
        let (estimator, _) = estimator(StubLookup::Empty).await;
        let err = estimator
            .calculate(&CalculationInput::new("1000001", 6_000_000))
            .await
            .unwrap_err();
        assert!(matches!(err, CostError::PostalCodeNotFound(_)));
    }
}
