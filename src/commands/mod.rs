//! Command implementations for the CLI
//!
//! - calculate: Estimate living costs for a postal code
//! - history: Query saved calculations
//! - config: Configuration display and validation

pub mod calculate;
pub mod config;
pub mod history;
