// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client-side cache of relay credentials fetched from `GET /ice`.
//!
//! Peers keep one [`IceClient`] per process. [`IceClient::servers`] returns
//! the cached ICE servers, refetching once they are within [`SKEW_SECS`] of
//! expiry. A failed refetch keeps serving the previous servers and retries
//! after [`MIN_REFRESH_SECS`]; only a failed first fetch is an error.

use std::sync::{Arc, Once};
use std::time::Duration;

use reqwest::Client;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::credential::{epoch_secs, IceResponse, IceServer};

/// Refresh this many seconds before the credentials expire.
pub const SKEW_SECS: u64 = 300;

/// Never refresh more often than this.
pub const MIN_REFRESH_SECS: u64 = 60;

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

static CRYPTO_INIT: Once = Once::new();

/// Install the rustls crypto provider (needed for reqwest even on plain HTTP).
pub fn ensure_crypto_provider() {
    CRYPTO_INIT.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

struct Cached {
    servers: Vec<IceServer>,
    expires_at: u64,
}

/// Fetches and caches ICE servers from the credential service.
pub struct IceClient {
    endpoint: String,
    client: Client,
    cached: RwLock<Option<Cached>>,
}

impl IceClient {
    /// `endpoint` is the full `/ice` URL, optionally with `?u=<identity>`.
    pub fn new(endpoint: impl Into<String>) -> Self {
        ensure_crypto_provider();
        let client = Client::builder().timeout(HTTP_TIMEOUT).build().unwrap_or_default();
        Self { endpoint: endpoint.into(), client, cached: RwLock::new(None) }
    }

    /// Fetch a fresh credential set without touching the cache.
    pub async fn fetch(&self) -> anyhow::Result<IceResponse> {
        let resp = self.client.get(&self.endpoint).send().await?.error_for_status()?;
        let body: IceResponse = resp.json().await?;
        if body.ice_servers.is_empty() {
            anyhow::bail!("iceServers empty");
        }
        Ok(body)
    }

    /// Return cached servers, refetching when close to expiry.
    pub async fn servers(&self) -> anyhow::Result<Vec<IceServer>> {
        self.ensure_fresh(epoch_secs()).await
    }

    /// Unix time at which the cached credentials expire (0 when empty).
    pub async fn expires_at(&self) -> u64 {
        self.cached.read().await.as_ref().map(|c| c.expires_at).unwrap_or(0)
    }

    async fn ensure_fresh(&self, now: u64) -> anyhow::Result<Vec<IceServer>> {
        {
            let cached = self.cached.read().await;
            if let Some(c) = cached.as_ref() {
                if !needs_refresh(c.expires_at, now) {
                    return Ok(c.servers.clone());
                }
            }
        }

        let mut cached = self.cached.write().await;
        match self.fetch().await {
            Ok(resp) => {
                let ttl = resp.ttl.max(MIN_REFRESH_SECS);
                tracing::info!(servers = resp.ice_servers.len(), ttl, "ICE servers fetched");
                let servers = resp.ice_servers;
                *cached = Some(Cached { servers: servers.clone(), expires_at: now + ttl });
                Ok(servers)
            }
            Err(e) => match cached.as_mut() {
                Some(c) => {
                    tracing::warn!(err = %e, "ICE refresh failed, keeping previous servers");
                    c.expires_at = now + MIN_REFRESH_SECS;
                    Ok(c.servers.clone())
                }
                None => Err(e.context("no ICE configuration available")),
            },
        }
    }

    /// Spawn a task that keeps the cache fresh until `cancel` fires.
    ///
    /// Fetches immediately, then again shortly before expiry. `on_refresh`
    /// receives the servers and their remaining lifetime in seconds after
    /// every attempt that yields servers.
    pub fn spawn_auto_refresh<F>(
        self: Arc<Self>,
        cancel: CancellationToken,
        on_refresh: F,
    ) -> JoinHandle<()>
    where
        F: Fn(&[IceServer], u64) + Send + Sync + 'static,
    {
        tokio::spawn(async move {
            loop {
                match self.servers().await {
                    Ok(servers) => {
                        let remaining = self.expires_at().await.saturating_sub(epoch_secs());
                        on_refresh(&servers, remaining);
                    }
                    Err(e) => tracing::warn!(err = %e, "ICE refresh error"),
                }

                let delay = refresh_delay(self.expires_at().await, epoch_secs());
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(Duration::from_secs(delay)) => {}
                }
            }
        })
    }
}

/// Whether credentials expiring at `expires_at` should be refetched at `now`.
pub fn needs_refresh(expires_at: u64, now: u64) -> bool {
    now + SKEW_SECS >= expires_at
}

/// Seconds to wait before the next refresh attempt.
///
/// Aims for [`SKEW_SECS`] before expiry, clamped to at least [`MIN_REFRESH_SECS`].
pub fn refresh_delay(expires_at: u64, now: u64) -> u64 {
    let refresh_at = expires_at.saturating_sub(SKEW_SECS).max(now + MIN_REFRESH_SECS);
    (refresh_at - now).max(MIN_REFRESH_SECS)
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
