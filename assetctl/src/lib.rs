//! # assetctl: multi-tenant asset management
//!
//! `assetctl` is the backend for a small asset register shared by many companies. A company
//! registers once, its founding user becomes the company's system admin, and from then on admins
//! manage users while everyone in the company records assets, files them under asset groups, and
//! tracks the vendor each asset came from and the status it is in.
//!
//! ## Tenancy
//!
//! Every row except the company itself carries a `company_id`, and every route below
//! `/api/1.0/companies/{company_id}` is scoped to that id. The bearer token names the caller's
//! company; a caller asking about any other company is answered with `401` before the handler looks
//! at the database, so the existence of another tenant's rows never leaks.
//!
//! ## Request Flow
//!
//! 1. [`errors::error_envelope`] wraps every response so that errors carry `path` and `timestamp`
//! 2. [`auth::identity::resolve_identity`] turns `Authorization: Bearer <token>` into an
//!    [`auth::identity::Identity`] when the token verifies and its user is still active
//! 3. The handler runs its [`auth::policies`] guard against the path, then talks to the
//!    repositories in [`db::handlers`], opening a transaction for multi-row writes
//!
//! ## Modules
//!
//! - [`api`]: Axum handlers and the request/response models
//! - [`auth`]: tokens, password hashing, identity resolution and route guards
//! - [`db`]: repositories, database models and per-company seed data
//! - [`config`]: YAML + environment configuration
//! - [`validation`]: field rules and their messages
//!
//! ## Getting Started
//!
//! ```no_run
//! use assetctl::{Application, Config, config::Args};
//! use clap::Parser;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load(&Args::parse())?;
//!     assetctl::telemetry::init_telemetry(config.enable_otel_export)?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async { tokio::signal::ctrl_c().await.unwrap() }).await
//! }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
mod openapi;
pub mod telemetry;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod types;
pub mod validation;

use std::str::FromStr;

use anyhow::Context;
use axum::{
    Json, Router,
    http::{
        self, HeaderValue,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    middleware::{from_fn, from_fn_with_state},
    routing::{get, patch, post},
};
use bon::Builder;
use sqlx::{
    ConnectOptions, PgPool,
    postgres::{PgConnectOptions, PgPoolOptions},
};
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument};
use utoipa::OpenApi;

pub use config::Config;

use crate::{
    api::handlers::{asset_groups, assets, auth as auth_handlers, companies, statuses, users, vendors},
    config::CorsOrigin,
    openapi::ApiDoc,
};

/// Prefix every route is mounted under.
pub const API_PREFIX: &str = "/api/1.0";

/// Shared state handed to every handler.
///
/// # Example
///
/// ```ignore
/// let state = AppState::builder().db(pool).config(config).build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
}

/// Get the assetctl database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Connect to the configured database and bring its schema up to date.
async fn setup_database(config: &Config) -> anyhow::Result<PgPool> {
    let url = config
        .database
        .url
        .as_deref()
        .context("no database configured: set DATABASE_URL or database.url")?;
    let settings = &config.database.pool;

    let options = PgConnectOptions::from_str(url)?.log_slow_statements(log::LevelFilter::Warn, settings.slow_statement_threshold);

    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(settings.acquire_timeout)
        .idle_timeout(Some(settings.idle_timeout).filter(|d| !d.is_zero()))
        .max_lifetime(Some(settings.max_lifetime).filter(|d| !d.is_zero()))
        .connect_with(options)
        .await?;

    migrator().run(&pool).await?;
    Ok(pool)
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let cors_config = &config.cors;

    let allow_origin = if cors_config.allowed_origins.iter().any(|o| matches!(o, CorsOrigin::Wildcard)) {
        AllowOrigin::any()
    } else {
        let mut origins = Vec::new();
        for origin in &cors_config.allowed_origins {
            if let CorsOrigin::Url(url) = origin {
                // Origins never carry the trailing slash `Url` adds
                origins.push(url.as_str().trim_end_matches('/').parse::<HeaderValue>()?);
            }
        }
        AllowOrigin::list(origins)
    };

    let mut cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([http::Method::GET, http::Method::POST, http::Method::PATCH, http::Method::DELETE])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .allow_credentials(cors_config.allow_credentials);

    if let Some(max_age) = cors_config.max_age {
        cors = cors.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Routes under [`API_PREFIX`], still waiting for their state.
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/auth", post(auth_handlers::authenticate))
        .route("/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        // Companies
        .route("/companies", post(companies::register_company))
        .route(
            "/companies/{company_id}",
            get(companies::get_company)
                .patch(companies::update_company)
                .delete(companies::delete_company),
        )
        // Users
        .route("/companies/{company_id}/users", get(users::list_users).post(users::create_user))
        .route(
            "/companies/{company_id}/users/{user_id}",
            get(users::get_user).patch(users::update_user).delete(users::delete_user),
        )
        .route("/companies/{company_id}/users/{user_id}/password", patch(users::update_password))
        .route("/companies/{company_id}/users/{user_id}/activate", patch(users::activate_user))
        .route("/companies/{company_id}/users/{user_id}/deactivate", patch(users::activate_user))
        // Asset groups
        .route(
            "/companies/{company_id}/asset-groups",
            get(asset_groups::list_asset_groups).post(asset_groups::create_asset_group),
        )
        .route(
            "/companies/{company_id}/asset-groups/{asset_group_id}",
            get(asset_groups::get_asset_group)
                .patch(asset_groups::update_asset_group)
                .delete(asset_groups::delete_asset_group),
        )
        .route("/companies/{company_id}/asset-groups/{asset_group_id}/assets", get(asset_groups::list_asset_group_assets))
        // Assets
        .route("/companies/{company_id}/assets", get(assets::list_assets).post(assets::create_asset))
        .route(
            "/companies/{company_id}/assets/{asset_id}",
            get(assets::get_asset).patch(assets::update_asset).delete(assets::delete_asset),
        )
        // Vendors
        .route("/companies/{company_id}/vendors", get(vendors::list_vendors).post(vendors::create_vendor))
        .route(
            "/companies/{company_id}/vendors/{vendor_id}",
            get(vendors::get_vendor).patch(vendors::update_vendor).delete(vendors::delete_vendor),
        )
        .route("/companies/{company_id}/vendors/{vendor_id}/assets", get(vendors::list_vendor_assets))
        // Statuses
        .route(
            "/companies/{company_id}/asset-status",
            get(statuses::list_statuses).post(statuses::create_status),
        )
        .route("/companies/{company_id}/asset-status/{status_id}", get(statuses::get_status))
        .route("/companies/{company_id}/asset-status/{status_id}/assets", get(statuses::list_status_assets))
}

/// Build the application router with all endpoints and middleware.
///
/// Layers, outermost first: CORS, request tracing, the error envelope, identity resolution.
#[instrument(skip_all)]
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    let cors = create_cors_layer(&state.config)?;

    let router = Router::new()
        .nest(API_PREFIX, api_routes())
        .fallback(api::handlers::not_found)
        .layer(from_fn_with_state(state.clone(), auth::identity::resolve_identity))
        .layer(from_fn(errors::error_envelope))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state);

    Ok(router)
}

/// Main application: the router, the pool behind it, and the configuration it was built from.
///
/// # Lifecycle
///
/// 1. **Create**: [`Application::new`] connects to the database, runs migrations and builds the
///    router
/// 2. **Serve**: [`Application::serve`] binds to a TCP port and starts handling requests
/// 3. **Shutdown**: When the shutdown future resolves, in-flight requests finish and the pool is
///    closed
pub struct Application {
    router: Router,
    config: Config,
    pool: PgPool,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        Self::new_with_pool(config, None).await
    }

    /// Create an application on top of an existing pool, e.g. one handed out by `#[sqlx::test]`.
    pub async fn new_with_pool(config: Config, pool: Option<PgPool>) -> anyhow::Result<Self> {
        debug!("Starting assetctl with configuration: {:#?}", config);

        let pool = match pool {
            Some(pool) => {
                migrator().run(&pool).await?;
                pool
            }
            None => setup_database(&config).await?,
        };

        let state = AppState::builder().db(pool.clone()).config(config.clone()).build();
        let router = build_router(state)?;

        Ok(Self { router, config, pool })
    }

    /// Convert application into a test server (for tests)
    #[cfg(any(test, feature = "test-utils"))]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router.into_make_service()).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!("assetctl listening on http://{}{}", bind_addr, API_PREFIX);

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Closing database connections...");
        self.pool.close().await;

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}
