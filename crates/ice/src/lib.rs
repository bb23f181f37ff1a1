// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! relay-ice: issues short-lived TURN relay credentials over HTTP.

pub mod client;
pub mod config;
pub mod credential;
pub mod transport;

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::config::IceConfig;
use crate::credential::Issuer;
use crate::transport::{build_router, IceState};

/// Run the credential service until shutdown.
pub async fn run(config: IceConfig) -> anyhow::Result<()> {
    let secret = config.secret().ok_or_else(|| anyhow::anyhow!("TURN_SECRET not configured"))?;
    let relay_host =
        config.relay_host().ok_or_else(|| anyhow::anyhow!("TURN_HOST not configured"))?;
    let issuer = Issuer::new(secret, relay_host, config.ttl_secs());

    let addr = format!("{}:{}", config.host, config.port);
    let shutdown = CancellationToken::new();
    spawn_signal_handler(shutdown.clone());

    let router = build_router(Arc::new(IceState { issuer }));
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(relay = %relay_host, ttl = config.ttl_secs(), "relay-ice listening on {addr}");
    axum::serve(listener, router).with_graceful_shutdown(shutdown.cancelled_owned()).await?;

    Ok(())
}

/// Cancel `shutdown` on SIGTERM or SIGINT.
pub fn spawn_signal_handler(shutdown: CancellationToken) {
    tokio::spawn(async move {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()).ok();
        let mut sigint =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt()).ok();

        tokio::select! {
            _ = async {
                if let Some(ref mut s) = sigterm { s.recv().await } else { std::future::pending().await }
            } => {
                tracing::info!("received SIGTERM");
            }
            _ = async {
                if let Some(ref mut s) = sigint { s.recv().await } else { std::future::pending().await }
            } => {
                tracing::info!("received SIGINT");
            }
        }
        shutdown.cancel();
    });
}
