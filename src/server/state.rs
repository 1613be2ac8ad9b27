use crate::location::LocationResolver;
use crate::ranking::{RankingSource, RequestDefaults};
use std::sync::Arc;

/// Read-only state shared by every request.
pub struct AppState {
    pub resolver: LocationResolver,
    pub ranking: Arc<dyn RankingSource>,
    pub defaults: RequestDefaults,
}
