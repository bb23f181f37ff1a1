// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Abstract key-addressed blob store.
//!
//! The store owns persistence and assigns `last_modified` on every write.
//! Nothing here assumes more than eventual visibility of writes.

pub mod memory;
pub mod s3;

use std::future::Future;
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use bytes::Bytes;

pub use memory::MemoryStore;
pub use s3::{S3Config, S3Store};

/// A stored payload with its store-assigned modification time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub payload: Bytes,
    pub last_modified: SystemTime,
}

/// Listing entry: key plus modification time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMeta {
    pub key: String,
    pub last_modified: SystemTime,
}

/// One page of a prefix listing.
#[derive(Debug, Clone, Default)]
pub struct ListPage {
    pub objects: Vec<ObjectMeta>,
    /// Token for the next page; `None` on the last page.
    pub next: Option<String>,
}

/// Store error type
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store operation timed out after {0:?}")]
    Timeout(Duration),
    #[error("store request failed: {0}")]
    Backend(String),
}

/// Flat key → blob store with prefix listing.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write `payload` at `key`, replacing any existing object.
    async fn put(&self, key: &str, payload: Bytes) -> Result<(), StoreError>;

    /// Read the full object, or `None` if absent.
    async fn get(&self, key: &str) -> Result<Option<StoredObject>, StoreError>;

    /// Remove `key`. Removing an absent key succeeds.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// List one page of objects whose key starts with `prefix`.
    async fn list_page(
        &self,
        prefix: &str,
        continuation: Option<String>,
    ) -> Result<ListPage, StoreError>;
}

/// Gather every page of a prefix listing, in store order.
pub async fn list_all(
    store: &dyn ObjectStore,
    prefix: &str,
) -> Result<Vec<ObjectMeta>, StoreError> {
    let mut objects = Vec::new();
    let mut continuation = None;
    loop {
        let page = store.list_page(prefix, continuation).await?;
        objects.extend(page.objects);
        match page.next {
            Some(token) => continuation = Some(token),
            None => return Ok(objects),
        }
    }
}

/// Run a store call under `limit`. Elapsing drops (cancels) the call.
pub async fn bounded<T, F>(limit: Duration, fut: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout(limit)),
    }
}
