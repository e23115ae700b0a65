use crate::error::CostError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Normalized seven-digit postal code
///
/// Hyphens are stripped before validation, so `"100-0001"` and `"1000001"`
/// parse to the same value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostalCode(String);

impl PostalCode {
    pub const LEN: usize = 7;

    pub fn parse(raw: &str) -> Result<Self, CostError> {
        let code = normalize(raw);
        if code.len() != Self::LEN || !code.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CostError::InvalidParameter(format!(
                "postalCode must be 7 digits: {}",
                crate::logging::MaskedPostalCode::new(raw)
            )));
        }
        Ok(Self(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First two digits, the key of the fallback prefix table
    pub fn prefix(&self) -> &str {
        &self.0[..2]
    }
}

impl fmt::Display for PostalCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Strip hyphens from a raw postal code
pub fn normalize(raw: &str) -> String {
    raw.trim().replace('-', "")
}
