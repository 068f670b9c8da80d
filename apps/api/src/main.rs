mod auth;
mod config;
mod db;
mod errors;
mod features;
mod models;
mod navigation;
mod roles;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::roles::backend::{PgRoleBackend, RoleBackend, StubRoleBackend};
use crate::roles::cache::{InMemoryRoleCache, RedisRoleCache, RoleCache};
use crate::roles::detector::StubActivitySignals;
use crate::roles::registry::RoleRegistry;
use crate::roles::store::RoleDeps;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on malformed values)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Hireboard API v{}", env!("CARGO_PKG_VERSION"));

    // Role cache: Redis when configured, in-process otherwise
    let cache: Arc<dyn RoleCache> = match &config.redis_url {
        Some(url) => {
            let client = redis::Client::open(url.as_str())?;
            info!("Role cache: Redis (prefix '{}')", config.role_cache_prefix);
            Arc::new(RedisRoleCache::new(client, config.role_cache_prefix.clone()))
        }
        None => {
            info!("Role cache: in-process (REDIS_URL not set)");
            Arc::new(InMemoryRoleCache::new())
        }
    };

    // Role backend: Postgres when configured, stub otherwise
    let backend: Arc<dyn RoleBackend> = match &config.database_url {
        Some(url) => {
            info!("Role backend: PostgreSQL");
            Arc::new(PgRoleBackend::new(create_pool(url)?))
        }
        None => {
            info!("Role backend: stub (DATABASE_URL not set)");
            Arc::new(StubRoleBackend)
        }
    };

    let feature_flags = config.feature_flags;
    let enabled: Vec<&str> = feature_flags
        .entries()
        .into_iter()
        .filter(|(_, on)| *on)
        .map(|(f, _)| f.as_str())
        .collect();
    info!("Enabled features: {}", enabled.join(", "));

    // Build app state
    let state = AppState {
        config: config.clone(),
        roles: RoleRegistry::new(RoleDeps {
            cache,
            backend,
            signals: Arc::new(StubActivitySignals),
        })
        .with_idle_ttl(Duration::from_secs(config.role_store_idle_secs)),
        feature_flags,
    };

    // Build router
    // TODO: restrict CORS to the frontend origin once it has a fixed domain
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
