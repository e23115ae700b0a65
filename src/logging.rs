//! Privacy-safe log helpers
//!
//! Calculation inputs are personal data. Incomes, owner identities and computed
//! amounts never reach the logs; postal codes only appear masked.

use std::fmt;

/// Masked postal code for log output
///
/// Shows the first three characters and replaces the rest with `****`.
///
/// # Example
/// ```
/// use living_cost::logging::MaskedPostalCode;
///
/// assert_eq!(MaskedPostalCode::new("1000001").to_string(), "100****");
/// assert_eq!(MaskedPostalCode::new("10").to_string(), "****");
/// ```
#[derive(Clone, Copy, Debug)]
pub struct MaskedPostalCode<'a> {
    inner: &'a str,
}

impl<'a> MaskedPostalCode<'a> {
    pub fn new(code: &'a str) -> Self {
        Self { inner: code }
    }
}

impl fmt::Display for MaskedPostalCode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.get(..3) {
            Some(visible) if self.inner.len() > 3 => write!(f, "{}****", visible),
            _ => write!(f, "****"),
        }
    }
}
