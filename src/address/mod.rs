//! Postal code → region resolution
//!
//! - `postal_code`: normalized seven-digit code
//! - `client`: external lookup collaborator and its zipcloud implementation
//! - `resolver`: primary lookup with the prefix-table fallback

pub mod client;
pub mod postal_code;
pub mod resolver;

pub use client::{AddressLookup, AddressResult, LookupError, LookupResponse, ZipCloudClient};
pub use postal_code::PostalCode;
pub use resolver::AddressResolver;
