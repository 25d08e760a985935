//! Grants Server - HTTP surface of grants-ui
//!
//! Serves the form journeys, the agreements pass-through, static assets and
//! a few operational routes over `warp`.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod handlers;
pub mod logging;
pub mod reply;
pub mod routes;
pub mod state;

pub use logging::init_tracing;
pub use routes::routes;
pub use state::AppState;

use anyhow::Context;
use grants_config::AppConfig;
use std::net::SocketAddr;

/// Load state from configuration and serve until interrupted
pub async fn serve(config: AppConfig) -> anyhow::Result<()> {
    let bind = config.server.bind_address();
    let addr: SocketAddr = tokio::net::lookup_host(bind.as_str())
        .await
        .with_context(|| format!("cannot resolve bind address {bind}"))?
        .next()
        .with_context(|| format!("no address for {bind}"))?;

    config.log_summary();
    let state = AppState::from_config(config).context("failed to initialise application")?;
    tracing::info!(forms = state.engine.registry().len(), "forms registered");

    let (bound, server) = warp::serve(routes(state))
        .try_bind_with_graceful_shutdown(addr, async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %err, "failed to listen for shutdown signal");
            }
        })
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(address = %bound, "grants-ui listening");
    server.await;
    tracing::info!("grants-ui stopped");
    Ok(())
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
