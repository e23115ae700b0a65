//! Reference data: baseline rent per region and the fallback prefix map
//!
//! Loaded once at startup into a read-only [`RateTable`] and shared through an
//! `Arc`; nothing mutates it afterwards.

use crate::config::RatesConfig;
use crate::error::CostError;
use serde::Serialize;
use std::collections::HashMap;

pub const MONTHS_PER_YEAR: i64 = 12;
/// Rent cap as a share of monthly income (%)
pub const MAX_RENT_RATE_PERCENT: i64 = 25;
/// Utilities as a share of monthly rent (%)
pub const UTILITIES_RATE_PERCENT: i64 = 12;
/// Food as a share of monthly income (%)
pub const FOOD_RATE_PERCENT: i64 = 12;
/// Other expenses as a share of monthly income (%)
pub const OTHERS_RATE_PERCENT: i64 = 5;
/// Flat monthly communication cost
pub const MONTHLY_COMMUNICATION_FEE: i64 = 4000;

/// Administrative region with its baseline monthly rent
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Region {
    pub code: String,
    pub name: String,
    pub average_rent: i64,
}

impl Region {
    fn new(code: &str, name: &str, average_rent: i64) -> Self {
        Self {
            code: code.to_string(),
            name: name.to_string(),
            average_rent,
        }
    }
}

/// Region and prefix lookup tables
#[derive(Debug, Clone)]
pub struct RateTable {
    regions: HashMap<String, Region>,
    prefixes: HashMap<String, String>,
}

impl RateTable {
    pub fn new(
        regions: impl IntoIterator<Item = Region>,
        prefixes: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        Self {
            regions: regions.into_iter().map(|r| (r.name.clone(), r)).collect(),
            prefixes: prefixes.into_iter().collect(),
        }
    }

    /// Built-in reference data
    pub fn builtin() -> Self {
        Self::new(builtin_regions(), builtin_prefixes())
    }

    /// Built-in data with configured overrides. An empty section keeps the
    /// built-in entries for that table.
    pub fn from_config(config: &RatesConfig) -> Self {
        let regions = if config.regions.is_empty() {
            builtin_regions()
        } else {
            config
                .regions
                .iter()
                .map(|r| Region::new(&r.code, &r.name, r.average_rent))
                .collect()
        };

        let prefixes = if config.prefixes.is_empty() {
            builtin_prefixes()
        } else {
            config
                .prefixes
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()
        };

        Self::new(regions, prefixes)
    }

    pub fn region(&self, name: &str) -> Option<&Region> {
        self.regions.get(name)
    }

    /// Baseline monthly rent for a region
    pub fn average_rent(&self, name: &str) -> Result<i64, CostError> {
        self.region(name)
            .map(|r| r.average_rent)
            .ok_or_else(|| CostError::UnknownRegion(name.to_string()))
    }

    /// Region name registered for a two-digit postal prefix
    pub fn region_for_prefix(&self, prefix: &str) -> Option<&str> {
        self.prefixes.get(prefix).map(String::as_str)
    }

    /// All regions, ordered by code
    pub fn regions(&self) -> Vec<&Region> {
        let mut regions: Vec<&Region> = self.regions.values().collect();
        regions.sort_by(|a, b| a.code.cmp(&b.code));
        regions
    }

    /// All prefix entries, ordered by prefix
    pub fn prefixes(&self) -> Vec<(&str, &str)> {
        let mut prefixes: Vec<(&str, &str)> = self
            .prefixes
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        prefixes.sort();
        prefixes
    }
}

impl Default for RateTable {
    fn default() -> Self {
        Self::builtin()
    }
}

fn builtin_regions() -> Vec<Region> {
    vec![
        Region::new("01", "北海道", 50000),
        Region::new("13", "東京都", 80000),
        Region::new("21", "岐阜県", 60000),
        Region::new("27", "大阪府", 60000),
    ]
}

fn builtin_prefixes() -> Vec<(String, String)> {
    [
        ("10", "東京都"),
        ("11", "埼玉県"),
        ("12", "千葉県"),
        ("14", "神奈川県"),
        ("26", "京都府"),
        ("27", "大阪府"),
        ("50", "岐阜県"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RegionConfig;

    #[test]
    fn test_builtin_average_rent() {
        let table = RateTable::builtin();
        assert_eq!(table.average_rent("東京都").unwrap(), 80000);
        assert_eq!(table.average_rent("北海道").unwrap(), 50000);
    }

    #[test]
    fn test_missing_region_is_unknown_region() {
        let table = RateTable::builtin();
        // Kyoto is reachable via the prefix fallback but has no rent entry
        assert_eq!(table.region_for_prefix("26"), Some("京都府"));
        let err = table.average_rent("京都府").unwrap_err();
        assert!(matches!(err, CostError::UnknownRegion(name) if name == "京都府"));
    }

    #[test]
    fn test_prefix_lookup() {
        let table = RateTable::builtin();
        assert_eq!(table.region_for_prefix("10"), Some("東京都"));
        assert_eq!(table.region_for_prefix("99"), None);
    }

    #[test]
    fn test_regions_sorted_by_code() {
        let table = RateTable::builtin();
        let codes: Vec<&str> = table.regions().iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, vec!["01", "13", "21", "27"]);
    }

    #[test]
    fn test_from_config_overrides_regions_only() {
        let config = RatesConfig {
            regions: vec![RegionConfig {
                code: "13".to_string(),
                name: "東京都".to_string(),
                average_rent: 95000,
            }],
            prefixes: Default::default(),
        };

        let table = RateTable::from_config(&config);
        assert_eq!(table.average_rent("東京都").unwrap(), 95000);
        assert!(table.region("北海道").is_none());
        // Prefix map falls back to built-in data
        assert_eq!(table.region_for_prefix("50"), Some("岐阜県"));
    }
}
