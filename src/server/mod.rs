mod handlers;
mod state;
mod static_files;

use axum::http::{header, HeaderValue};
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::Settings;
use crate::location::{http_agent, LocationResolver, ProviderChain};
use crate::ranking::DataForSeoClient;

pub use state::AppState;

/// Build the shared state from settings.
pub fn build_state(settings: &Settings) -> AppState {
    let agent = http_agent(settings.request_timeout);
    let chain = ProviderChain::from_credentials(&settings.geocoding_credentials(), agent.clone());
    let ranking = DataForSeoClient::new(
        settings.dataforseo_url(),
        &settings.dataforseo_login,
        &settings.dataforseo_password,
        agent,
    );

    AppState {
        resolver: LocationResolver::new(chain),
        ranking: Arc::new(ranking),
        defaults: settings.request_defaults(),
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/api/status", get(handlers::api_status))
        .route("/api/check-rankings", post(handlers::check_rankings))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ));

    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .merge(api)
        .layer(CatchPanicLayer::custom(handlers::panic_response))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start(host: &str, port: u16, state: AppState) -> std::io::Result<()> {
    let app = build_router(Arc::new(state));
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Rank tracker listening on http://{}", addr);

    axum::serve(listener, app).await
}
