//! Component wiring
//!
//! Builds the rate table, lookup client, resolver, history store and estimator
//! once from configuration and hands them to callers.

use crate::address::{AddressLookup, AddressResolver, ZipCloudClient};
use crate::config::Config;
use crate::error::CostError;
use crate::history::{database, HistoryStore};
use crate::living_cost::{CostEstimator, RateTable};
use std::sync::Arc;

pub struct LivingCostApp {
    pub rates: Arc<RateTable>,
    pub resolver: AddressResolver,
    pub estimator: CostEstimator,
    pub history: Arc<HistoryStore>,
}

impl LivingCostApp {
    /// Connect to the configured database and the zipcloud lookup service
    pub async fn from_config(config: &Config) -> Result<Self, CostError> {
        let client = ZipCloudClient::new(&config.lookup)
            .map_err(|e| CostError::ExternalApi(format!("Failed to build lookup client: {}", e)))?;
        let pool = database::connect(&config.database).await?;

        Ok(Self::with_parts(
            config,
            Arc::new(client),
            Arc::new(HistoryStore::new(pool)),
        ))
    }

    /// Assemble from an explicit lookup collaborator and store
    pub fn with_parts(config: &Config, lookup: Arc<dyn AddressLookup>, history: Arc<HistoryStore>) -> Self {
        let rates = Arc::new(RateTable::from_config(&config.rates));
        let resolver = AddressResolver::new(lookup, rates.clone());
        let estimator = CostEstimator::new(resolver.clone(), rates.clone(), history.clone());

        Self {
            rates,
            resolver,
            estimator,
            history,
        }
    }
}
