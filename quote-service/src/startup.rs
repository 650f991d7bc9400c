//! Application startup and lifecycle management.

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use service_core::error::AppError;
use service_core::middleware::rate_limit::{create_ip_rate_limiter, ip_rate_limit_middleware};

use crate::config::QuoteConfig;
use crate::handlers::{health, public, quotes};
use crate::services::{init_metrics, Database, PgAuditSink, QuoteComposer, SharingGateway, TransitionPolicy};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: QuoteConfig,
    pub db: Database,
    pub composer: QuoteComposer,
    pub sharing: SharingGateway,
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: QuoteConfig) -> Result<Self, AppError> {
        Self::build_internal(config, true).await
    }

    /// Build the application without running migrations.
    /// Use this in tests when migrations are already applied by the test harness.
    pub async fn build_without_migrations(config: QuoteConfig) -> Result<Self, AppError> {
        Self::build_internal(config, false).await
    }

    async fn build_internal(config: QuoteConfig, run_migrations: bool) -> Result<Self, AppError> {
        init_metrics();

        let db = Database::new(
            &config.database.url,
            config.database.max_connections,
            config.database.min_connections,
        )
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to connect to PostgreSQL");
            e
        })?;

        if run_migrations {
            db.run_migrations().await.map_err(|e| {
                tracing::error!(error = %e, "Failed to run migrations");
                e
            })?;
        }

        let transitions = if config.strict_transitions {
            TransitionPolicy::forward_only()
        } else {
            TransitionPolicy::permissive()
        };
        let audit = Arc::new(PgAuditSink::new(db.pool().clone()));

        let composer = QuoteComposer::new(db.clone(), audit.clone(), transitions);
        let sharing = SharingGateway::new(db.clone(), audit);

        let state = AppState {
            config: config.clone(),
            db,
            composer,
            sharing,
        };

        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!(error = %e, addr = %addr, "Failed to bind listener");
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(port = port, "Quote service listener bound");

        Ok(Self {
            port,
            listener,
            state,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Get a reference to the database.
    pub fn db(&self) -> &Database {
        &self.state.db
    }

    /// Run the application until stopped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        // Unauthenticated public surface, throttled per IP.
        let public_limiter = create_ip_rate_limiter(
            self.state.config.rate_limit.public_requests_per_minute,
            60,
        );
        let public_routes = Router::new()
            .route("/quotes/public/:public_id", get(public::get_public_quote))
            .route(
                "/quotes/public/:public_id/response",
                put(public::record_public_response),
            )
            .layer(middleware::from_fn_with_state(
                public_limiter,
                ip_rate_limit_middleware,
            ))
            // Public links are opened straight from client browsers.
            .layer(CorsLayer::permissive());

        let quote_routes = Router::new()
            .route("/quotes", post(quotes::create_quote).get(quotes::list_quotes))
            .route(
                "/quotes/:id",
                get(quotes::get_quote)
                    .put(quotes::update_quote)
                    .delete(quotes::delete_quote),
            )
            .route("/quotes/:id/status", put(quotes::update_quote_status))
            .route("/quotes/:id/duplicate", post(quotes::duplicate_quote));

        let router = Router::new()
            .route("/health", get(health::health_check))
            .route("/ready", get(health::readiness_check))
            .route("/metrics", get(health::metrics_endpoint))
            .merge(public_routes)
            .merge(quote_routes)
            .layer(TraceLayer::new_for_http())
            .layer(middleware::from_fn(
                crate::middleware::metrics_middleware,
            ))
            .with_state(self.state);

        tracing::info!(
            service = "quote-service",
            version = env!("CARGO_PKG_VERSION"),
            port = self.port,
            "Service ready to accept connections"
        );

        axum::serve(
            self.listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
    }
}
