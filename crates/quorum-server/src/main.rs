//! # quorum-server
//!
//! HTTP server for the Quorum forum.
//!
//! This binary provides:
//! - **REST API** (axum) for questions, answers, replies, voting,
//!   notifications and profiles
//! - **Stateless JWT sessions** issued at signup/login
//! - **Per-IP rate limiting** to protect against abuse

mod api;
mod config;
mod error;
mod rate_limit;

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use quorum_forum::{AuthGateway, Forum};
use quorum_store::Database;

use crate::api::AppState;
use crate::config::ServerConfig;
use crate::rate_limit::RateLimiter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Tracing first, so config loading can log (respects RUST_LOG).
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,quorum_server=debug")),
        )
        .init();

    info!("Starting Quorum server v{}", env!("CARGO_PKG_VERSION"));

    let config = ServerConfig::from_env();
    info!(
        instance = %config.instance_name,
        addr = %config.http_addr,
        registration_open = config.registration_open,
        "Loaded configuration"
    );

    let db = match &config.db_path {
        Some(path) => Database::open_at(path)?,
        None => Database::new()?,
    };
    if let Some(path) = db.path() {
        info!(path = %path.display(), "Database ready");
    }

    let auth = AuthGateway::new(&config.jwt_secret, config.token_ttl_secs);
    let forum = Arc::new(Forum::new(db, auth));

    let rate_limiter = RateLimiter::new(config.rate_limit_rps, config.rate_limit_burst);

    // Periodic rate limiter cleanup (every 5 minutes, evict buckets idle >10 min).
    let rl = rate_limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(300));
        loop {
            interval.tick().await;
            rl.purge_stale(600.0).await;
        }
    });

    let http_addr = config.http_addr;
    let state = AppState {
        forum,
        config: Arc::new(config),
        rate_limiter,
    };

    tokio::select! {
        result = api::serve(state, http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
