use crate::address::client::{AddressLookup, LookupResponse};
use crate::address::PostalCode;
use crate::error::CostError;
use crate::living_cost::RateTable;
use crate::logging::MaskedPostalCode;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Resolves postal codes to region names
///
/// The external lookup is authoritative. Only a transport failure
/// (`ExternalApi`) falls back to the two-digit prefix table; an upstream
/// "not found" is final.
#[derive(Clone)]
pub struct AddressResolver {
    lookup: Arc<dyn AddressLookup>,
    rates: Arc<RateTable>,
}

impl AddressResolver {
    pub fn new(lookup: Arc<dyn AddressLookup>, rates: Arc<RateTable>) -> Self {
        Self { lookup, rates }
    }

    /// Resolve a raw postal code (hyphens allowed)
    ///
    /// Returns `Ok(None)` when the lookup was unreachable and the prefix table
    /// has no entry either. Unlike the primary path, that miss raises no error.
    pub async fn resolve(&self, postal_code: &str) -> Result<Option<String>, CostError> {
        let code = PostalCode::parse(postal_code)?;
        self.resolve_code(&code).await
    }

    pub async fn resolve_code(&self, code: &PostalCode) -> Result<Option<String>, CostError> {
        match self.resolve_remote(code).await {
            Ok(region) => Ok(Some(region)),
            Err(CostError::ExternalApi(reason)) => {
                warn!(
                    postal_code = %MaskedPostalCode::new(code.as_str()),
                    error = %reason,
                    "Postal code lookup unavailable, using prefix fallback"
                );
                Ok(self.resolve_from_prefix(code))
            }
            Err(e) => Err(e),
        }
    }

    async fn resolve_remote(&self, code: &PostalCode) -> Result<String, CostError> {
        let response = self
            .lookup
            .lookup(code)
            .await
            .map_err(|e| CostError::ExternalApi(e.to_string()))?;

        let region = first_region(code, response)?;
        info!(
            postal_code = %MaskedPostalCode::new(code.as_str()),
            region = %region,
            "Resolved region from postal code"
        );
        Ok(region)
    }

    fn resolve_from_prefix(&self, code: &PostalCode) -> Option<String> {
        let region = self.rates.region_for_prefix(code.prefix()).map(str::to_string);
        debug!(
            prefix = code.prefix(),
            hit = region.is_some(),
            "Prefix fallback lookup"
        );
        region
    }
}

fn first_region(code: &PostalCode, response: LookupResponse) -> Result<String, CostError> {
    match response.status {
        Some(LookupResponse::STATUS_OK) => {}
        Some(status) => {
            return Err(CostError::InvalidParameter(format!(
                "lookup status {}: {}",
                status,
                response.message.unwrap_or_default()
            )))
        }
        None => {
            return Err(CostError::InvalidParameter(
                "lookup response has no status".to_string(),
            ))
        }
    }

    response
        .results
        .unwrap_or_default()
        .into_iter()
        .next()
        .map(|result| result.address1)
        .ok_or_else(|| {
            CostError::PostalCodeNotFound(MaskedPostalCode::new(code.as_str()).to_string())
        })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::address::client::{AddressResult, LookupError};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scripted lookup collaborator
    pub(crate) enum StubLookup {
        Found(&'static str),
        Empty,
        Status(Option<u16>),
        Unreachable,
    }

    pub(crate) struct CountingLookup {
        pub stub: StubLookup,
        pub calls: AtomicUsize,
        pub last_code: std::sync::Mutex<Option<String>>,
    }

    impl CountingLookup {
        pub(crate) fn new(stub: StubLookup) -> Arc<Self> {
            Arc::new(Self {
                stub,
                calls: AtomicUsize::new(0),
                last_code: std::sync::Mutex::new(None),
            })
        }
    }

    #[async_trait]
    impl AddressLookup for CountingLookup {
        async fn lookup(&self, code: &PostalCode) -> Result<LookupResponse, LookupError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_code.lock().unwrap() = Some(code.as_str().to_string());
            match &self.stub {
                StubLookup::Found(region) => Ok(LookupResponse {
                    status: Some(200),
                    message: None,
                    results: Some(vec![AddressResult {
                        address1: region.to_string(),
                        ..Default::default()
                    }]),
                }),
                StubLookup::Empty => Ok(LookupResponse {
                    status: Some(200),
                    message: None,
                    results: Some(vec![]),
                }),
                StubLookup::Status(status) => Ok(LookupResponse {
                    status: *status,
                    message: Some("bad request".to_string()),
                    results: None,
                }),
                StubLookup::Unreachable => Err(LookupError::HttpStatus(503)),
            }
        }
    }

    fn resolver(stub: StubLookup) -> (AddressResolver, Arc<CountingLookup>) {
        let lookup = CountingLookup::new(stub);
        let resolver = AddressResolver::new(lookup.clone(), Arc::new(RateTable::builtin()));
        (resolver, lookup)
    }

    #[tokio::test]
    async fn test_resolve_returns_first_result() {
        let (resolver, lookup) = resolver(StubLookup::Found("東京都"));
        let region = resolver.resolve("1000001").await.unwrap();
        assert_eq!(region.as_deref(), Some("東京都"));
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_resolve_is_hyphen_insensitive() {
        let (resolver, lookup) = resolver(StubLookup::Found("東京都"));
        let hyphenated = resolver.resolve("100-0001").await.unwrap();
        assert_eq!(lookup.last_code.lock().unwrap().as_deref(), Some("1000001"));
        let plain = resolver.resolve("1000001").await.unwrap();
        assert_eq!(hyphenated, plain);
    }

    #[tokio::test]
    async fn test_invalid_format_never_calls_lookup() {
        let (resolver, lookup) = resolver(StubLookup::Found("東京都"));
        let err = resolver.resolve("12345").await.unwrap_err();
        assert!(matches!(err, CostError::InvalidParameter(_)));
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_result_is_not_found_without_fallback() {
        // Prefix "10" would hit the fallback table if it were consulted
        let (resolver, _) = resolver(StubLookup::Empty);
        let err = resolver.resolve("1000001").await.unwrap_err();
        assert!(matches!(err, CostError::PostalCodeNotFound(_)));
    }

    #[tokio::test]
    async fn test_non_success_status_is_invalid_parameter() {
        let (resolver, _) = resolver(StubLookup::Status(Some(400)));
        let err = resolver.resolve("1000001").await.unwrap_err();
        assert!(matches!(err, CostError::InvalidParameter(_)));
    }

    #[tokio::test]
    async fn test_missing_status_is_invalid_parameter() {
        let (resolver, _) = resolver(StubLookup::Status(None));
        let err = resolver.resolve("1000001").await.unwrap_err();
        assert!(matches!(err, CostError::InvalidParameter(_)));
    }

    #[tokio::test]
    async fn test_transport_failure_falls_back_to_prefix() {
        let (resolver, _) = resolver(StubLookup::Unreachable);
        let region = resolver.resolve("260-0001").await.unwrap();
        assert_eq!(region.as_deref(), Some("京都府"));
    }

    #[tokio::test]
    async fn test_fallback_miss_is_none_without_error() {
        let (resolver, _) = resolver(StubLookup::Unreachable);
        let region = resolver.resolve("9990001").await.unwrap();
        assert!(region.is_none());
    }
}
