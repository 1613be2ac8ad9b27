//! Location resolver: walks the provider chain.
//!
//! Flow: composite query → primary → fallback → free → error.
//! Providers are tried strictly in order; the first usable result wins.

use super::chain::{ChainSlot, ProviderChain};
use super::types::{
    GeocodingStatus, HealthState, LocationQuery, ProviderLookupError, ProviderResult,
    ProviderStatus, ResolutionError, ResolvedLocation,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Well-known query used by the health probe.
pub const PROBE_QUERY: &str = "New York, NY";

/// The location resolver. Cheap to clone; the chain is shared read-only.
#[derive(Debug, Clone)]
pub struct LocationResolver {
    chain: Arc<ProviderChain>,
}

impl LocationResolver {
    pub fn new(chain: ProviderChain) -> Self {
        Self { chain: Arc::new(chain) }
    }

    /// Resolve a structured location through the full fallback chain.
    pub async fn resolve(&self, input: &LocationQuery) -> Result<ResolvedLocation, ResolutionError> {
        let query = input.composite();
        let result = self.resolve_query(&query).await?;
        Ok(ResolvedLocation::from_provider(input, query, result))
    }

    /// Resolve an already-built composite query string.
    pub async fn resolve_query(&self, query: &str) -> Result<ProviderResult, ResolutionError> {
        if query.trim().is_empty() {
            return Err(ResolutionError::EmptyQuery);
        }

        info!(query, "geocoding location");

        for slot in self.chain.slots() {
            match lookup(slot, query).await {
                Ok(result) => {
                    info!(
                        provider = %slot.provider.kind(),
                        role = %slot.role,
                        lat = result.latitude,
                        lon = result.longitude,
                        "geocoded"
                    );
                    return Ok(result);
                }
                Err(e) => {
                    warn!(
                        provider = %slot.provider.kind(),
                        role = %slot.role,
                        error = %e,
                        "geocoding failed, trying next provider"
                    );
                }
            }
        }

        Err(ResolutionError::Exhausted { query: query.to_string() })
    }

    /// Probe every provider in the chain once with a well-known query.
    pub async fn status(&self) -> GeocodingStatus {
        let mut providers = Vec::with_capacity(self.chain.slots().len());

        for slot in self.chain.slots() {
            let status = match lookup(slot, PROBE_QUERY).await {
                Ok(_) => HealthState::Working,
                Err(e) => {
                    debug!(provider = %slot.provider.kind(), error = %e, "probe failed");
                    HealthState::Error
                }
            };
            providers.push(ProviderStatus {
                name: slot.provider.kind().name().to_string(),
                role: slot.role,
                status,
            });
        }

        let status = if providers.iter().any(|p| p.status == HealthState::Working) {
            HealthState::Working
        } else {
            HealthState::Error
        };

        GeocodingStatus { status, providers }
    }
}

/// Run one provider lookup on the blocking pool.
async fn lookup(slot: &ChainSlot, query: &str) -> Result<ProviderResult, ProviderLookupError> {
    let provider = Arc::clone(&slot.provider);
    let query = query.to_string();

    tokio::task::spawn_blocking(move || provider.lookup(&query))
        .await
        .map_err(|e| ProviderLookupError::Task(e.to_string()))?
        .and_then(ProviderResult::validate)
}
