pub mod calculator;
pub mod models;
pub mod rates;

pub use calculator::{compute_breakdown, CostEstimator};
pub use models::{CalculationInput, CalculationResult, CalculationSummary, OwnerRef};
pub use rates::{RateTable, Region};
