use thiserror::Error;

/// Errors raised by the cost-of-living core.
///
/// The set is closed: every call site either handles a specific kind or
/// forwards it unchanged. Only `ExternalApi` triggers in-process recovery
/// (the prefix fallback in the address resolver).
#[derive(Debug, Error)]
pub enum CostError {
    /// Malformed caller input or a malformed upstream response
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    /// The primary lookup answered, but knows no address for the code
    #[error("Postal code not found: {0}")]
    PostalCodeNotFound(String),
    /// Transport or network failure of the primary lookup
    #[error("External API error: {0}")]
    ExternalApi(String),
    /// The rate table has no entry for the resolved region
    #[error("Unknown region: {0}")]
    UnknownRegion(String),
    /// Insert, search or count failure from the record store
    #[error("Persistence error: {0}")]
    Persistence(#[from] sqlx::Error),
}

impl CostError {
    /// Stable name of the error kind, for callers that present errors
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidParameter(_) => "invalid_parameter",
            Self::PostalCodeNotFound(_) => "postal_code_not_found",
            Self::ExternalApi(_) => "external_api_error",
            Self::UnknownRegion(_) => "unknown_region",
            Self::Persistence(_) => "persistence_error",
        }
    }
}

impl From<sqlx::migrate::MigrateError> for CostError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        Self::Persistence(sqlx::Error::Migrate(Box::new(err)))
    }
}
