//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors, but application-level
//! errors should use `kernel::error::AppError`.

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use axum::{
    Json, Router, http,
    http::{Method, header},
    routing::get,
};
use gatekeeper::models::CurrentSession;
use gatekeeper::{
    GatekeeperConfig, GatekeeperState, HttpAuthProvider, HttpAuthProviderConfig,
    RedisRateLimitStore, auth_router, protect,
};
use platform::config::{Environment, parse_path_list};
use platform::rate_limit::RateLimitConfig;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// Re-export unified error types for use in handlers
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,gatekeeper=info,platform=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = gatekeeper_config()?;
    tracing::info!(
        environment = %config.environment,
        protected = ?config.protected_prefixes,
        "Gatekeeper configured"
    );

    // Auth provider
    let auth_url = env::var("AUTH_SERVICE_URL").unwrap_or_else(|_| config.auth_origin.clone());
    let provider = HttpAuthProvider::new(HttpAuthProviderConfig {
        base_url: auth_url,
        api_key: env::var("AUTH_SERVICE_ANON_KEY").unwrap_or_default(),
        secure_cookies: config.is_production(),
        request_timeout: config.auth_timeout,
        ..HttpAuthProviderConfig::default()
    })
    .context("Failed to build auth service client")?;

    // Counting store is optional; rate limiting degrades open without it
    let store = match env::var("REDIS_URL") {
        Ok(url) => match RedisRateLimitStore::connect(&url).await {
            Ok(store) => {
                tracing::info!("Connected to rate limit store");
                Some(store)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Rate limit store unavailable, continuing without rate limiting");
                None
            }
        },
        Err(_) => {
            tracing::warn!("REDIS_URL not set, rate limiting disabled");
            None
        }
    };

    let state = GatekeeperState::new(provider, store, config)?;

    // CORS configuration
    let frontend_origins = env::var("FRONTEND_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:40922,http://127.0.0.1:40922".to_string());

    let allowed_origins: Vec<http::HeaderValue> = frontend_origins
        .split(',')
        .filter_map(|origin| origin.trim().parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::HeaderName::from_static(gatekeeper::handlers::CSRF_HEADER),
        ]))
        .allow_credentials(true);

    // Build router
    let app = Router::new()
        .route("/health", get(health))
        .route("/account", get(account))
        .route("/api/debug", get(debug_info))
        .nest("/api/auth", auth_router(state.clone()))
        .layer(cors);

    let app = protect(app, state).layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from_str(
        &env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:31113".to_string()),
    )
    .context("BIND_ADDR must be host:port")?;
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Build the gatekeeper configuration from the environment
fn gatekeeper_config() -> anyhow::Result<GatekeeperConfig> {
    let environment = match env::var("APP_ENV") {
        Ok(raw) => Environment::from_str(&raw)?,
        Err(_) => Environment::default(),
    };

    let mut config = GatekeeperConfig {
        environment,
        ..GatekeeperConfig::default()
    };

    if let Ok(raw) = env::var("PROTECTED_PREFIXES") {
        config.protected_prefixes = parse_path_list(&raw);
    }
    if let Ok(raw) = env::var("DEBUG_PATHS") {
        config.debug_paths = parse_path_list(&raw);
    }
    if let Ok(path) = env::var("SIGN_IN_PATH") {
        config.sign_in_path = path;
    }

    let max_requests = env_number("AUTH_RATE_LIMIT_MAX", config.auth_rate_limit.max_requests)?;
    let window_secs = env_number(
        "AUTH_RATE_LIMIT_WINDOW_SECS",
        config.auth_rate_limit.window.as_secs(),
    )?;
    config.auth_rate_limit = RateLimitConfig::new(max_requests, window_secs);

    config.auth_timeout = Duration::from_millis(env_number(
        "AUTH_TIMEOUT_MS",
        config.auth_timeout.as_millis() as u64,
    )?);
    config.store_timeout = Duration::from_millis(env_number(
        "RATE_LIMIT_STORE_TIMEOUT_MS",
        config.store_timeout.as_millis() as u64,
    )?);

    if let Ok(url) = env::var("AUTH_SERVICE_URL") {
        config = config.with_auth_url(&url)?;
    }

    config.validate()?;
    Ok(config)
}

fn env_number<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{name} must be a number")),
        Err(_) => Ok(default),
    }
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Reachable only with a session; the gatekeeper redirects everyone else
async fn account(session: CurrentSession) -> Json<Value> {
    Json(json!({
        "userId": session.user().map(|u| u.to_string()),
    }))
}

/// Hidden outside development
async fn debug_info() -> Json<Value> {
    Json(json!({
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
