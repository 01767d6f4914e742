use analytics::AnalyticsEngine;
use axum::{routing::get, Router};
use configuration::Config;
use price_source::{CsvPriceSource, PriceSource};
use std::sync::Arc;
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
// Note: Tracing is initialized by the binary that starts the server.

pub mod error;
pub mod handlers;

/// The shared application state that all handlers can access.
#[derive(Clone)]
pub struct AppState {
    pub engine: AnalyticsEngine,
    pub source: Arc<dyn PriceSource>,
    /// Ticker text used when a request names no tickers.
    pub default_tickers: String,
}

impl AppState {
    pub fn from_config(config: &Config) -> Self {
        Self {
            engine: AnalyticsEngine::new(config.analysis),
            source: Arc::new(CsvPriceSource::new(config.data.prices_dir.clone())),
            default_tickers: config.server.default_tickers.clone(),
        }
    }
}

/// Builds the application routes on top of `state`.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods(Any)
        .allow_headers(AllowHeaders::any());

    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/analysis", get(handlers::get_analysis))
        .with_state(Arc::new(state))
        .layer(cors)
        // Logs every incoming request.
        .layer(TraceLayer::new_for_http())
}

/// The main function to configure and run the web server.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let addr = config.server.socket_addr();
    let app = build_router(AppState::from_config(config));

    tracing::info!(
        prices_dir = %config.data.prices_dir.display(),
        "Web server listening on http://{}",
        addr
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
