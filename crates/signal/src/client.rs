// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed HTTP client for the signaling gateway.
//!
//! Agents use [`SignalClient::spawn_heartbeat`] to stay listed and
//! [`SignalClient::wait_next_offer`] to pick up new sessions. Controllers use
//! [`SignalClient::list_agents`] and exchange SDP through
//! [`SignalClient::put_text`] and [`SignalClient::wait_and_get`].

use std::sync::{Arc, Once};
use std::time::Duration;

use bytes::Bytes;
use reqwest::{Client, StatusCode, Url};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::key::validate;
use crate::presence::ready_key;

/// Floor on every polling interval.
pub const MIN_POLL: Duration = Duration::from_millis(50);

/// Floor on the heartbeat period.
pub const MIN_HEARTBEAT: Duration = Duration::from_secs(1);

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

const OFFER_SUFFIX: &str = "/offer.sdp";

static CRYPTO_INIT: Once = Once::new();

/// Install the rustls crypto provider (needed for reqwest even on plain HTTP).
pub fn ensure_crypto_provider() {
    CRYPTO_INIT.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

/// An offer waiting in an agent's mailbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfferRef {
    pub session_id: String,
    pub key: String,
}

/// Recognize `sessions/<agent>/<session>/.../offer.sdp`.
pub fn parse_offer_key(key: &str) -> Option<OfferRef> {
    if !key.ends_with(OFFER_SUFFIX) {
        return None;
    }
    let parts: Vec<&str> = key.split('/').collect();
    if parts.len() < 4 {
        return None;
    }
    Some(OfferRef { session_id: parts[2].to_owned(), key: key.to_owned() })
}

/// Mailbox prefix for `agent_id`.
pub fn session_prefix(agent_id: &str) -> String {
    format!("sessions/{agent_id}/")
}

/// HTTP client for one signaling gateway.
pub struct SignalClient {
    base: String,
    client: Client,
}

impl SignalClient {
    /// `base_url` is the gateway root, e.g. `http://signal.local:9090`.
    pub fn new(base_url: impl Into<String>) -> Self {
        ensure_crypto_provider();
        let mut base = base_url.into();
        while base.ends_with('/') {
            base.pop();
        }
        let client = Client::builder().timeout(HTTP_TIMEOUT).build().unwrap_or_default();
        Self { base, client }
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    /// `<base>/<op>/<key>`, with each key segment percent-encoded so the
    /// gateway decodes exactly `key`. Keys are checked locally first.
    fn object_url(&self, op: &str, key: &str) -> anyhow::Result<Url> {
        let key = validate(key)?;
        if key.split('/').any(|segment| segment == ".") {
            anyhow::bail!("key {key:?} has a '.' segment, which URLs cannot carry");
        }
        let mut url = Url::parse(&self.base)?;
        url.path_segments_mut()
            .map_err(|()| anyhow::anyhow!("base url cannot carry a path: {}", self.base))?
            .pop_if_empty()
            .push(op)
            .extend(key.split('/'));
        Ok(url)
    }

    fn query_url(&self, path: &str, name: &str, value: &str) -> anyhow::Result<Url> {
        let mut url = Url::parse(&format!("{}/{path}", self.base))?;
        url.query_pairs_mut().append_pair(name, value);
        Ok(url)
    }

    pub async fn put(&self, key: &str, payload: impl Into<Bytes>) -> anyhow::Result<()> {
        let url = self.object_url("put", key)?;
        self.client.post(url).body(payload.into()).send().await?.error_for_status()?;
        Ok(())
    }

    pub async fn put_text(&self, key: &str, text: &str) -> anyhow::Result<()> {
        self.put(key, Bytes::copy_from_slice(text.as_bytes())).await
    }

    /// Fetch the object at `key`; `None` when it does not exist.
    pub async fn get(&self, key: &str) -> anyhow::Result<Option<Bytes>> {
        let url = self.object_url("get", key)?;
        let resp = self.client.get(url).send().await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Ok(Some(resp.error_for_status()?.bytes().await?))
    }

    pub async fn get_text(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.get(key).await?.map(|b| String::from_utf8_lossy(&b).into_owned()))
    }

    pub async fn delete(&self, key: &str) -> anyhow::Result<()> {
        let url = self.object_url("delete", key)?;
        self.client.delete(url).send().await?.error_for_status()?;
        Ok(())
    }

    pub async fn touch(&self, key: &str) -> anyhow::Result<()> {
        let url = self.object_url("touch", key)?;
        self.client.post(url).send().await?.error_for_status()?;
        Ok(())
    }

    pub async fn list(&self, prefix: &str) -> anyhow::Result<Vec<String>> {
        let url = self.query_url("list", "prefix", prefix)?;
        Ok(self.client.get(url).send().await?.error_for_status()?.json().await?)
    }

    /// Ids of agents whose heartbeat is younger than `max_age_secs`.
    pub async fn list_agents(&self, max_age_secs: u64) -> anyhow::Result<Vec<String>> {
        let url = self.query_url("agents", "maxAgeSec", &max_age_secs.to_string())?;
        Ok(self.client.get(url).send().await?.error_for_status()?.json().await?)
    }

    /// Poll `key` until it exists or `timeout` elapses.
    ///
    /// Transient failures count as "not yet"; only the deadline is an error.
    pub async fn wait_and_get(
        &self,
        key: &str,
        timeout: Duration,
        interval: Duration,
    ) -> anyhow::Result<Bytes> {
        let deadline = Instant::now() + timeout;
        let interval = interval.max(MIN_POLL);
        while Instant::now() < deadline {
            match self.get(key).await {
                Ok(Some(payload)) => return Ok(payload),
                Ok(None) => {}
                Err(e) => tracing::debug!(key, err = %e, "poll failed"),
            }
            tokio::time::sleep(interval).await;
        }
        anyhow::bail!("timed out waiting for {key}")
    }

    /// Poll the agent's mailbox until an offer appears or `timeout` elapses.
    pub async fn wait_next_offer(
        &self,
        agent_id: &str,
        timeout: Duration,
        poll: Duration,
    ) -> Option<OfferRef> {
        let prefix = session_prefix(agent_id);
        let deadline = Instant::now() + timeout;
        let poll = poll.max(MIN_POLL);
        while Instant::now() < deadline {
            match self.list(&prefix).await {
                Ok(keys) => {
                    if let Some(offer) = keys.iter().find_map(|k| parse_offer_key(k)) {
                        return Some(offer);
                    }
                }
                Err(e) => tracing::debug!(prefix, err = %e, "mailbox poll failed"),
            }
            tokio::time::sleep(poll).await;
        }
        None
    }

    /// Spawn a task that touches `agents/<agent_id>/ready` every `period`
    /// until `cancel` fires. The first touch happens immediately.
    pub fn spawn_heartbeat(
        self: Arc<Self>,
        agent_id: String,
        period: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let key = ready_key(&agent_id);
        let period = period.max(MIN_HEARTBEAT);
        tokio::spawn(async move {
            tracing::info!(agent = %agent_id, ?period, "presence heartbeat started");
            loop {
                if let Err(e) = self.touch(&key).await {
                    tracing::warn!(agent = %agent_id, err = %e, "heartbeat failed");
                }
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(period) => {}
                }
            }
            tracing::info!(agent = %agent_id, "presence heartbeat stopped");
        })
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
