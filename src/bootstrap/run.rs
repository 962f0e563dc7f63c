use std::net::SocketAddr;

use anyhow::Context;
use hs_core::config::AppConfig;
use tracing::{error, info};

use super::wiring::wire_services;
use crate::web;

pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:3000";

/// Wire the services and serve HTTP until Ctrl-C.
pub async fn run_app(config: AppConfig) -> anyhow::Result<()> {
    let bind_address = if config.bind_address.trim().is_empty() {
        DEFAULT_BIND_ADDRESS
    } else {
        config.bind_address.trim()
    };
    let addr: SocketAddr = bind_address
        .parse()
        .with_context(|| format!("Invalid bind address: {bind_address}"))?;

    let services = wire_services(&config).map_err(|err| {
        error!(error = %err, "failed to wire services");
        err
    })?;

    let (bound, server) = warp::serve(web::routes(services))
        .try_bind_with_graceful_shutdown(addr, shutdown_signal())
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(address = %bound, "homestead listening");

    server.await;
    info!("homestead stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
