// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Time-limited TURN relay credentials (TURN REST API scheme).
//!
//! The username is `"<expiry>:<identity>"` and the password is
//! `base64(hmac_sha1(secret, username))`. Relay servers configured with the
//! same shared secret recompute the digest to authenticate peers, so the
//! HMAC-SHA1 + standard base64 pairing is fixed by the relay, not by us.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use ring::hmac;
use serde::{Deserialize, Serialize};

/// Identity embedded when the caller does not supply one.
pub const DEFAULT_IDENTITY: &str = "anon";

/// Credential lifetime used when none (or a non-positive one) is configured.
pub const DEFAULT_TTL_SECS: u64 = 3600;

/// Standard TURN listening port.
pub const TURN_PORT: u16 = 3478;

/// A signed relay credential set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub urls: Vec<String>,
    pub username: String,
    pub credential: String,
    pub ttl: u64,
}

/// Issues credentials for a single relay host with a fixed secret and TTL.
#[derive(Debug, Clone)]
pub struct Issuer {
    key: hmac::Key,
    relay_host: String,
    ttl: u64,
}

impl Issuer {
    pub fn new(secret: &str, relay_host: impl Into<String>, ttl: u64) -> Self {
        let ttl = if ttl == 0 { DEFAULT_TTL_SECS } else { ttl };
        Self {
            key: hmac::Key::new(hmac::HMAC_SHA1_FOR_LEGACY_USE_ONLY, secret.as_bytes()),
            relay_host: relay_host.into(),
            ttl,
        }
    }

    pub fn ttl(&self) -> u64 {
        self.ttl
    }

    pub fn relay_host(&self) -> &str {
        &self.relay_host
    }

    /// Issue a credential expiring `ttl` seconds from now.
    pub fn issue(&self, identity: Option<&str>) -> Credential {
        self.issue_at(identity, epoch_secs())
    }

    /// Issue a credential as if the current unix time were `now`.
    pub fn issue_at(&self, identity: Option<&str>, now: u64) -> Credential {
        let identity = match identity {
            Some(u) if !u.is_empty() => u,
            _ => DEFAULT_IDENTITY,
        };
        let expiry = now.saturating_add(self.ttl);
        let username = format!("{expiry}:{identity}");
        let credential = sign_with(&self.key, &username);
        Credential { urls: relay_urls(&self.relay_host), username, credential, ttl: self.ttl }
    }
}

/// Compute `base64(hmac_sha1(secret, message))`.
pub fn sign(secret: &str, message: &str) -> String {
    let key = hmac::Key::new(hmac::HMAC_SHA1_FOR_LEGACY_USE_ONLY, secret.as_bytes());
    sign_with(&key, message)
}

fn sign_with(key: &hmac::Key, message: &str) -> String {
    let tag = hmac::sign(key, message.as_bytes());
    STANDARD.encode(tag.as_ref())
}

/// UDP and TCP variants of the relay endpoint, in that order.
pub fn relay_urls(host: &str) -> Vec<String> {
    vec![
        format!("turn:{host}:{TURN_PORT}?transport=udp"),
        format!("turn:{host}:{TURN_PORT}?transport=tcp"),
    ]
}

/// A single ICE server entry as exchanged with WebRTC peers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceServer {
    #[serde(deserialize_with = "one_or_many")]
    pub urls: Vec<String>,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub credential: String,
}

/// Body of `GET /ice`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IceResponse {
    pub ice_servers: Vec<IceServer>,
    #[serde(default = "default_ttl")]
    pub ttl: u64,
}

fn default_ttl() -> u64 {
    DEFAULT_TTL_SECS
}

impl From<Credential> for IceResponse {
    fn from(c: Credential) -> Self {
        Self {
            ice_servers: vec![IceServer {
                urls: c.urls,
                username: c.username,
                credential: c.credential,
            }],
            ttl: c.ttl,
        }
    }
}

/// Accept `"urls": "turn:..."` as well as `"urls": ["turn:...", ...]`.
fn one_or_many<'de, D>(de: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Urls {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Urls::deserialize(de)? {
        Urls::One(u) => vec![u],
        Urls::Many(v) => v,
    })
}

/// Current unix time in whole seconds.
pub fn epoch_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
#[path = "credential_tests.rs"]
mod tests;
