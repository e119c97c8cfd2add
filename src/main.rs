mod accounts;
mod app;
mod clock;
mod config;
mod db;
mod error;
mod gate;
mod handlers;
mod models;
mod policy;
mod rate_limiter;
mod state;
mod validation;

use std::{net::SocketAddr, sync::Arc, time::Duration};

use dotenvy::dotenv;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::{
    accounts::ensure_admin,
    clock::SystemClock,
    config::Config,
    db::{init_db, open_db},
    rate_limiter::RateLimits,
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cfg = Arc::new(Config::from_env()?);
    if cfg.trust_proxy {
        warn!("TRUST_PROXY is enabled: client identity is taken from X-Forwarded-For/X-Real-IP");
    }
    for policy in [&cfg.auth_policy, &cfg.api_policy, &cfg.strict_policy] {
        info!(
            policy = policy.name,
            window_ms = policy.window_ms,
            max_requests = policy.max_requests,
            "rate limit policy"
        );
    }

    let db = Arc::new(open_db(&cfg.db_path).map_err(|err| anyhow::anyhow!(err))?);
    init_db(&db).map_err(|err| anyhow::anyhow!(err))?;
    if let Some(seed) = &cfg.admin {
        ensure_admin(&db, cfg.bcrypt_cost, seed)
            .await
            .map_err(|err| anyhow::anyhow!(err))?;
    }

    let limits = Arc::new(RateLimits::new(&cfg, Arc::new(SystemClock)));

    if cfg.rate_limit_sweep_secs > 0 {
        let limits = limits.clone();
        let every = Duration::from_secs(cfg.rate_limit_sweep_secs);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                let removed = limits.sweep().await;
                if removed > 0 {
                    debug!(removed, "evicted expired rate limit windows");
                }
            }
        });
    }

    let state = AppState {
        db,
        cfg: cfg.clone(),
        limits,
    };
    let app = app::router(state)?;

    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr).await?;
    info!("listening on {}", cfg.bind_addr);
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received");
}
