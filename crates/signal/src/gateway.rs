// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Validated, time-bounded operations over the object store.
//!
//! Every operation validates its key before touching the store and runs the
//! store call under the timeout for its class. Timeouts surface as
//! [`StoreError::Timeout`]; nothing is retried here.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use bytes::Bytes;

use crate::error::SignalError;
use crate::key::{self, KeyError};
use crate::listing::{self, PrefixError};
use crate::presence;
use crate::store::{bounded, ObjectStore, StoreError, StoredObject};

/// Per-class bounds on store calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Multi-page enumeration.
    pub list: Duration,
    /// Single-object read/write/delete.
    pub io: Duration,
    /// Heartbeat writes.
    pub touch: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            list: Duration::from_secs(30),
            io: Duration::from_secs(20),
            touch: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error(transparent)]
    InvalidKey(#[from] KeyError),
    #[error(transparent)]
    InvalidPrefix(#[from] PrefixError),
    #[error("object not found")]
    NotFound,
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl GatewayError {
    /// API error code for this failure.
    pub fn code(&self) -> SignalError {
        match self {
            Self::InvalidKey(_) | Self::InvalidPrefix(_) => SignalError::BadRequest,
            Self::NotFound => SignalError::NotFound,
            Self::Store(_) => SignalError::StoreError,
        }
    }
}

pub struct Gateway {
    store: Arc<dyn ObjectStore>,
    timeouts: Timeouts,
}

impl Gateway {
    pub fn new(store: Arc<dyn ObjectStore>, timeouts: Timeouts) -> Self {
        Self { store, timeouts }
    }

    pub fn timeouts(&self) -> Timeouts {
        self.timeouts
    }

    /// Write `payload` at `key`, replacing any existing object.
    pub async fn put(&self, key: &str, payload: Bytes) -> Result<(), GatewayError> {
        let key = key::validate(key)?;
        bounded(self.timeouts.io, self.store.put(key, payload)).await?;
        Ok(())
    }

    /// Read the full object at `key`.
    pub async fn get(&self, key: &str) -> Result<StoredObject, GatewayError> {
        let key = key::validate(key)?;
        bounded(self.timeouts.io, self.store.get(key)).await?.ok_or(GatewayError::NotFound)
    }

    pub async fn delete(&self, key: &str) -> Result<(), GatewayError> {
        let key = key::validate(key)?;
        bounded(self.timeouts.io, self.store.delete(key)).await?;
        Ok(())
    }

    /// Write an empty payload at `key` to advance its modification time.
    pub async fn touch(&self, key: &str) -> Result<(), GatewayError> {
        let key = key::validate(key)?;
        bounded(self.timeouts.touch, self.store.put(key, Bytes::new())).await?;
        Ok(())
    }

    /// Live agent ids as of `now`, sorted.
    pub async fn ready_agents(
        &self,
        max_age_secs: u64,
        now: SystemTime,
    ) -> Result<Vec<String>, GatewayError> {
        let ids = bounded(
            self.timeouts.list,
            presence::list_ready_agents(self.store.as_ref(), max_age_secs, now),
        )
        .await?;
        Ok(ids)
    }

    /// All keys under a validated prefix, in store order.
    pub async fn list(&self, prefix: Option<&str>) -> Result<Vec<String>, GatewayError> {
        let prefix = listing::validate_prefix(prefix)?;
        let keys =
            bounded(self.timeouts.list, listing::list_keys(self.store.as_ref(), prefix)).await?;
        Ok(keys)
    }
}

#[cfg(test)]
#[path = "gateway_tests.rs"]
mod tests;
