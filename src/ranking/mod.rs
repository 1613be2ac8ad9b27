//! Ranking data: DataForSEO client and the joint organic + maps fetch.

pub mod client;
pub mod types;

pub use client::{DataForSeoClient, RankingError, RankingSource};
pub use types::{
    Device, FetchOutcome, MapResult, OrganicResult, RankingRequest, RankingRequestBody,
    RankingResults, RequestDefaults, ValidationError,
};

use crate::location::ResolvedLocation;
use std::sync::Arc;
use tracing::{error, info};

/// Fetch organic and maps results concurrently. Each side resolves on its
/// own; a failure on one never cancels or fails the other.
pub async fn fetch_rankings(
    source: Arc<dyn RankingSource>,
    request: &RankingRequest,
    location: &ResolvedLocation,
) -> (FetchOutcome<OrganicResult>, FetchOutcome<MapResult>) {
    let organic = {
        let source = Arc::clone(&source);
        let request = request.clone();
        let location = location.clone();
        tokio::task::spawn_blocking(move || source.organic(&request, &location))
    };
    let maps = {
        let source = Arc::clone(&source);
        let request = request.clone();
        let location = location.clone();
        tokio::task::spawn_blocking(move || source.maps(&request, &location))
    };

    let (organic, maps) = tokio::join!(organic, maps);

    let organic = settle("organic", organic);
    let maps = settle("maps", maps);

    if let FetchOutcome::Items(items) = &organic {
        info!(count = items.len(), "organic results");
    }
    if let FetchOutcome::Items(items) = &maps {
        info!(count = items.len(), "maps results");
    }

    (organic, maps)
}

fn settle<T>(
    label: &str,
    joined: Result<Result<Vec<T>, RankingError>, tokio::task::JoinError>,
) -> FetchOutcome<T> {
    let result = joined
        .map_err(|e| RankingError::Task(e.to_string()))
        .and_then(|inner| inner);

    match result {
        Ok(items) => FetchOutcome::Items(items),
        Err(e) => {
            error!(source = label, error = %e, "ranking fetch failed");
            FetchOutcome::Failed(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::LocationQuery;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    struct StubSource {
        fail_organic: bool,
        fail_maps: bool,
        panic_maps: bool,
        calls: AtomicUsize,
    }

    impl RankingSource for StubSource {
        fn organic(&self, request: &RankingRequest, _: &ResolvedLocation) -> Result<Vec<OrganicResult>, RankingError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_organic {
                return Err(RankingError::Status(500));
            }
            Ok((1..=request.depth)
                .map(|p| OrganicResult { position: Some(p), ..Default::default() })
                .collect())
        }

        fn maps(&self, _: &RankingRequest, _: &ResolvedLocation) -> Result<Vec<MapResult>, RankingError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.panic_maps {
                panic!("maps exploded");
            }
            if self.fail_maps {
                return Err(RankingError::Network("timed out".into()));
            }
            Ok(vec![MapResult { position: Some(1), ..Default::default() }])
        }

        fn test_connection(&self) -> bool {
            true
        }

        fn base_url(&self) -> &str {
            "stub"
        }
    }

    fn request() -> RankingRequest {
        RankingRequest {
            keyword: "coffee".into(),
            location: LocationQuery::new("Austin, TX"),
            language_code: "en".into(),
            device: Device::Desktop,
            depth: 3,
        }
    }

    fn location() -> ResolvedLocation {
        ResolvedLocation {
            address: "Austin, TX".into(),
            pincode: None,
            latitude: 30.27,
            longitude: -97.74,
            city: Some("Austin".into()),
            country: Some("United States".into()),
        }
    }

    #[tokio::test]
    async fn test_both_succeed() {
        let source = Arc::new(StubSource::default());
        let (organic, maps) = fetch_rankings(source.clone(), &request(), &location()).await;
        assert_eq!(organic.into_items().len(), 3);
        assert_eq!(maps.into_items().len(), 1);
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_organic_failure_does_not_affect_maps() {
        let source = Arc::new(StubSource { fail_organic: true, ..Default::default() });
        let (organic, maps) = fetch_rankings(source, &request(), &location()).await;
        assert!(organic.is_failed());
        assert!(organic.into_items().is_empty());
        assert_eq!(maps.into_items().len(), 1);
    }

    #[tokio::test]
    async fn test_maps_failure_does_not_affect_organic() {
        let source = Arc::new(StubSource { fail_maps: true, ..Default::default() });
        let (organic, maps) = fetch_rankings(source, &request(), &location()).await;
        assert_eq!(organic.into_items().len(), 3);
        assert!(maps.is_failed());
    }

    #[tokio::test]
    async fn test_panicking_fetch_is_contained() {
        let source = Arc::new(StubSource { panic_maps: true, ..Default::default() });
        let (organic, maps) = fetch_rankings(source, &request(), &location()).await;
        assert!(!organic.is_failed());
        assert!(maps.is_failed());
    }
}
