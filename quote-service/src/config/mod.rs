//! Environment-driven configuration for quote-service.

use anyhow::Result;
use dotenvy::dotenv;
use serde::Deserialize;
use service_core::config::Config as CoreConfig;
use std::env;

#[derive(Deserialize, Clone, Debug)]
pub struct QuoteConfig {
    pub common: CoreConfig,
    pub database: DatabaseConfig,
    pub rate_limit: RateLimitConfig,
    /// When true, status transitions follow the forward-only graph instead
    /// of the permissive default.
    pub strict_transitions: bool,
    pub service_name: String,
    pub log_level: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// Per-IP throttle applied to the unauthenticated public routes.
#[derive(Deserialize, Clone, Debug)]
pub struct RateLimitConfig {
    pub public_requests_per_minute: u32,
}

impl QuoteConfig {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let port = env::var("QUOTE_SERVICE_PORT")
            .unwrap_or_else(|_| "3007".to_string())
            .parse()?;

        let db_url = env::var("QUOTE_DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("QUOTE_DATABASE_URL must be set"))?;
        let max_connections = env::var("QUOTE_DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()?;
        let min_connections = env::var("QUOTE_DATABASE_MIN_CONNECTIONS")
            .unwrap_or_else(|_| "2".to_string())
            .parse()?;

        let public_requests_per_minute = env::var("QUOTE_PUBLIC_RATE_LIMIT_PER_MINUTE")
            .unwrap_or_else(|_| "60".to_string())
            .parse()?;

        let strict_transitions = env::var("QUOTE_STRICT_TRANSITIONS")
            .unwrap_or_else(|_| "false".to_string())
            .parse()
            .unwrap_or(false);

        let log_level = env::var("QUOTE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            common: CoreConfig { port },
            database: DatabaseConfig {
                url: db_url,
                max_connections,
                min_connections,
            },
            rate_limit: RateLimitConfig {
                public_requests_per_minute,
            },
            strict_transitions,
            service_name: "quote-service".to_string(),
            log_level,
        })
    }
}
