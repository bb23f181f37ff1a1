// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! signalgw: HTTP signaling gateway for WebRTC peers, backed by an object
//! store. Agents announce themselves with heartbeat markers, and peers
//! exchange SDP blobs under per-session keys.

pub mod client;
pub mod config;
pub mod error;
pub mod gateway;
pub mod key;
pub mod listing;
pub mod presence;
pub mod state;
pub mod store;
pub mod transport;

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::config::{SignalConfig, StoreKind};
use crate::state::SignalState;
use crate::store::{MemoryStore, ObjectStore, S3Store};
use crate::transport::build_router;

/// Run the signaling gateway until shutdown.
pub async fn run(config: SignalConfig) -> anyhow::Result<()> {
    let store = connect_store(&config).await?;
    let state = Arc::new(SignalState::new(store, config.timeouts(), config.max_body_bytes));

    let addr = format!("{}:{}", config.host, config.port);
    let shutdown = CancellationToken::new();
    spawn_signal_handler(shutdown.clone());

    let router = build_router(state);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(
        store = ?config.store,
        timeouts = ?config.timeouts(),
        "signalgw listening on {addr}"
    );
    axum::serve(listener, router).with_graceful_shutdown(shutdown.cancelled_owned()).await?;

    Ok(())
}

async fn connect_store(config: &SignalConfig) -> anyhow::Result<Arc<dyn ObjectStore>> {
    match config.store {
        StoreKind::S3 => {
            let s3 = config.s3().ok_or_else(|| anyhow::anyhow!("SIGNAL_BUCKET not configured"))?;
            let limit = config.timeouts().io;
            let store = tokio::time::timeout(limit, S3Store::connect(s3))
                .await
                .map_err(|_| anyhow::anyhow!("S3 store did not answer within {limit:?}"))??;
            Ok(Arc::new(store))
        }
        StoreKind::Memory => {
            tracing::warn!("using in-memory store; signaling state is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
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
