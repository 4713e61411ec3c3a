//! Mini App Backend
//!
//! Authenticates Telegram Mini App launch data and proxies the feed record held
//! in an external JSON document store.

mod api;
mod auth;
mod config;
mod errors;
mod models;
mod store;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use auth::AuthGate;
use config::Config;
use store::{JsonBinClient, RecordRepository};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub records: Arc<RecordRepository>,
    pub gate: AuthGate,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            records: Arc::new(RecordRepository::new(JsonBinClient::from_config(&config))),
            gate: AuthGate::from_config(&config),
            config: Arc::new(config),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(config.log_json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!config.log_json).then(|| tracing_subscriber::fmt::layer()))
        .init();

    tracing::info!("Starting Mini App Backend");
    tracing::info!("Document store: {}", config.record_url());
    tracing::info!(
        "Store access key: {}",
        if config.store_access_key.is_some() { "set" } else { "missing" }
    );
    tracing::info!("Admin id: {:?}", config.admin_id);
    tracing::info!(
        "Write policy: {}",
        if config.require_admin_for_write { "admin only" } else { "open" }
    );
    tracing::info!("Bind address: {}", config.bind_addr);

    if config.bot_token.is_none() {
        tracing::warn!(
            "No bot token configured (MINIAPP_BOT_TOKEN). Signed launch data will be refused!"
        );
    }
    if !config.require_admin_for_write {
        tracing::warn!("Any caller may overwrite the record (MINIAPP_REQUIRE_ADMIN_FOR_WRITE=false)");
    }

    let bind_addr = config.bind_addr;

    // Create application state
    let state = AppState::new(config);

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!("Server listening on {}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers(Any);

    // Clone the gate for the auth layer
    let gate = state.gate.clone();

    // API routes
    let api_routes = Router::new()
        .route("/check-admin", get(api::check_admin))
        .route("/data", get(api::get_data))
        .route("/data", post(api::save_data))
        .route("/ton-address", get(api::ton_address))
        // Apply launch data auth middleware
        .layer(middleware::from_fn(move |req, next| {
            auth::launch_auth_layer(gate.clone(), req, next)
        }));

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
