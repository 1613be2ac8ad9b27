//! Provider chain construction.
//!
//! Built once at startup from whichever paid credentials are configured:
//!
//! 1. Google key → Google is primary.
//! 2. OpenCage key → OpenCage is primary if nothing is yet, else fallback.
//! 3. No primary → Nominatim is primary.
//! 4. Otherwise Nominatim is appended as the free last resort.
//!
//! A paid provider that fails to initialize is logged and left out.

use super::providers::{Geocoder, HttpGeocoder};
use super::types::{ProviderInitError, ProviderKind, SlotRole};
use std::sync::Arc;
use tracing::{info, warn};

/// One entry of the chain, tagged with its role.
#[derive(Debug, Clone)]
pub struct ChainSlot {
    pub role: SlotRole,
    pub provider: Arc<dyn Geocoder>,
}

/// Outcome of setting up one paid provider.
#[derive(Debug)]
pub enum PaidSetup {
    NotConfigured(ProviderKind),
    Failed(ProviderInitError),
    Ready(Arc<dyn Geocoder>),
}

impl PaidSetup {
    fn from_key<G, F>(kind: ProviderKind, key: Option<&str>, init: F) -> Self
    where
        G: Geocoder + 'static,
        F: FnOnce(&str) -> Result<G, ProviderInitError>,
    {
        match key {
            None => Self::NotConfigured(kind),
            Some(key) => match init(key) {
                Ok(g) => Self::Ready(Arc::new(g)),
                Err(e) => Self::Failed(e),
            },
        }
    }
}

/// API keys for the paid providers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeocodingCredentials {
    pub google_api_key: Option<String>,
    pub opencage_api_key: Option<String>,
}

/// Ordered, immutable list of providers to try.
#[derive(Debug, Clone)]
pub struct ProviderChain {
    slots: Vec<ChainSlot>,
}

impl ProviderChain {
    /// Build the production chain from configured credentials.
    pub fn from_credentials(creds: &GeocodingCredentials, agent: ureq::Agent) -> Self {
        let google = PaidSetup::from_key(
            ProviderKind::Google,
            creds.google_api_key.as_deref(),
            |k| HttpGeocoder::google(k, agent.clone()),
        );
        let opencage = PaidSetup::from_key(
            ProviderKind::OpenCage,
            creds.opencage_api_key.as_deref(),
            |k| HttpGeocoder::opencage(k, agent.clone()),
        );
        let free: Arc<dyn Geocoder> = Arc::new(HttpGeocoder::nominatim(agent));

        Self::assemble(google, opencage, free)
    }

    /// Apply the slot policy to already-initialized providers.
    pub fn assemble(first: PaidSetup, second: PaidSetup, free: Arc<dyn Geocoder>) -> Self {
        let mut slots: Vec<ChainSlot> = Vec::with_capacity(3);

        for setup in [first, second] {
            match setup {
                PaidSetup::NotConfigured(kind) => {
                    info!(provider = %kind, "no API key configured, skipping");
                }
                PaidSetup::Failed(e) => {
                    warn!(error = %e, "failed to initialize geocoder");
                }
                PaidSetup::Ready(provider) => {
                    let role = if slots.is_empty() { SlotRole::Primary } else { SlotRole::Fallback };
                    info!(provider = %provider.kind(), role = %role, "geocoder initialized");
                    slots.push(ChainSlot { role, provider });
                }
            }
        }

        if slots.is_empty() {
            info!(provider = %free.kind(), "using free geocoder as primary");
            slots.push(ChainSlot { role: SlotRole::Primary, provider: free });
        } else {
            info!(provider = %free.kind(), "free geocoder kept as last resort");
            slots.push(ChainSlot { role: SlotRole::Free, provider: free });
        }

        let chain = Self { slots };
        info!(layout = ?chain.layout(), "geocoding chain ready");
        chain
    }

    /// Slots in the order they are tried.
    pub fn slots(&self) -> &[ChainSlot] {
        &self.slots
    }

    /// `(role, provider)` pairs in try order.
    pub fn layout(&self) -> Vec<(SlotRole, ProviderKind)> {
        self.slots.iter().map(|s| (s.role, s.provider.kind())).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::providers::http_agent;
    use std::time::Duration;

    fn build(google: Option<&str>, opencage: Option<&str>) -> ProviderChain {
        let creds = GeocodingCredentials {
            google_api_key: google.map(str::to_string),
            opencage_api_key: opencage.map(str::to_string),
        };
        ProviderChain::from_credentials(&creds, http_agent(Duration::from_secs(1)))
    }

    #[test]
    fn test_no_credentials_free_is_primary() {
        let chain = build(None, None);
        assert_eq!(chain.layout(), vec![(SlotRole::Primary, ProviderKind::Nominatim)]);
    }

    #[test]
    fn test_google_only() {
        let chain = build(Some("g-key"), None);
        assert_eq!(
            chain.layout(),
            vec![
                (SlotRole::Primary, ProviderKind::Google),
                (SlotRole::Free, ProviderKind::Nominatim),
            ]
        );
    }

    #[test]
    fn test_opencage_only_is_promoted() {
        let chain = build(None, Some("oc-key"));
        assert_eq!(
            chain.layout(),
            vec![
                (SlotRole::Primary, ProviderKind::OpenCage),
                (SlotRole::Free, ProviderKind::Nominatim),
            ]
        );
    }

    #[test]
    fn test_both_keys() {
        let chain = build(Some("g-key"), Some("oc-key"));
        assert_eq!(
            chain.layout(),
            vec![
                (SlotRole::Primary, ProviderKind::Google),
                (SlotRole::Fallback, ProviderKind::OpenCage),
                (SlotRole::Free, ProviderKind::Nominatim),
            ]
        );
        assert_eq!(chain.slots()[0].provider.kind(), ProviderKind::Google);
    }

    #[test]
    fn test_malformed_google_key_skipped() {
        let chain = build(Some("bad key with spaces"), Some("oc-key"));
        assert_eq!(
            chain.layout(),
            vec![
                (SlotRole::Primary, ProviderKind::OpenCage),
                (SlotRole::Free, ProviderKind::Nominatim),
            ]
        );
    }

    #[test]
    fn test_all_paid_invalid_falls_back_to_free() {
        let chain = build(Some(""), Some("\t"));
        assert_eq!(chain.layout(), vec![(SlotRole::Primary, ProviderKind::Nominatim)]);
    }

    #[test]
    fn test_construction_is_deterministic() {
        for (g, oc) in [(None, None), (Some("g"), None), (None, Some("o")), (Some("g"), Some("o"))] {
            assert_eq!(build(g, oc).layout(), build(g, oc).layout());
        }
    }
}
