/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use pantry_api::{app::AppState, config::Config};
/// use pantry_shared::db::pool::create_pool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = create_pool(config.database.clone()).await?;
/// let state = AppState::new(pool, config);
/// let app = pantry_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```
use crate::{
    config::Config,
    middleware::{auth::require_auth, security::SecurityHeadersLayer},
    routes,
};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{delete, get, post},
    Router,
};
use chrono::Duration;
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }

    /// Lifetime of newly issued tokens
    pub fn token_lifetime(&self) -> Duration {
        self.config.jwt.expiration()
    }
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.allows_any_origin() {
        // Development mode: permissive CORS
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .expose_headers([header::AUTHORIZATION])
        .max_age(std::time::Duration::from_secs(3600))
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET /up                          # Health check (public)
/// └── /api/v1/
///     ├── POST   /signup               # public
///     ├── POST   /login                # public
///     ├── DELETE /logout               # checks its own token
///     ├── /spaces, /storages, /items   # bearer token required
///     ├── /purchase_sessions
///     ├── /subscription
///     └── /profile
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Security headers
/// 2. CORS (tower-http CorsLayer)
/// 3. Response compression (gzip, brotli)
/// 4. Logging (tower-http TraceLayer)
/// 5. Authentication (resource routes only)
pub fn build_router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/signup", post(routes::auth::signup))
        .route("/login", post(routes::auth::login))
        .route("/logout", delete(routes::auth::logout));

    let resource_routes = Router::new()
        .route(
            "/spaces",
            get(routes::spaces::index).post(routes::spaces::create),
        )
        .route(
            "/spaces/:id",
            get(routes::spaces::show)
                .patch(routes::spaces::update)
                .put(routes::spaces::update)
                .delete(routes::spaces::destroy),
        )
        .route("/spaces/:id/image", delete(routes::spaces::destroy_image))
        .route(
            "/storages",
            get(routes::storages::index).post(routes::storages::create),
        )
        .route(
            "/storages/:id",
            get(routes::storages::show)
                .patch(routes::storages::update)
                .put(routes::storages::update)
                .delete(routes::storages::destroy),
        )
        .route("/storages/:id/image", delete(routes::storages::destroy_image))
        .route("/items", get(routes::items::index).post(routes::items::create))
        .route("/items/low_stock", get(routes::items::low_stock))
        .route("/items/out_of_stock", get(routes::items::out_of_stock))
        .route(
            "/items/:id",
            get(routes::items::show)
                .patch(routes::items::update)
                .put(routes::items::update)
                .delete(routes::items::destroy),
        )
        .route("/items/:id/image", delete(routes::items::destroy_image))
        .route(
            "/purchase_sessions",
            get(routes::purchase_sessions::index).post(routes::purchase_sessions::create),
        )
        .route(
            "/purchase_sessions/:id",
            get(routes::purchase_sessions::show)
                .patch(routes::purchase_sessions::update)
                .put(routes::purchase_sessions::update)
                .delete(routes::purchase_sessions::destroy),
        )
        .route(
            "/subscription",
            get(routes::subscription::show)
                .patch(routes::subscription::update)
                .put(routes::subscription::update),
        )
        .route(
            "/profile",
            get(routes::profile::show)
                .patch(routes::profile::update)
                .put(routes::profile::update),
        )
        .route("/profile/image", delete(routes::profile::destroy_image))
        .layer(axum::middleware::from_fn_with_state(state.clone(), require_auth));

    let v1_routes = Router::new().merge(auth_routes).merge(resource_routes);

    Router::new()
        .route("/up", get(routes::health::health_check))
        .nest("/api/v1", v1_routes)
        .fallback(routes::health::not_found)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CompressionLayer::new())
        .layer(cors_layer(&state.config))
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}
