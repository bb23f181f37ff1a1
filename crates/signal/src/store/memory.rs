// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process object store.
//!
//! Backs the `memory` store mode for local development and the test suite.
//! Keys list in lexicographic order; pages continue after the last key
//! returned, so writes between pages behave like a real paginated store.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::time::SystemTime;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::RwLock;

use super::{ListPage, ObjectMeta, ObjectStore, StoreError, StoredObject};

/// Default number of keys per listing page.
pub const DEFAULT_PAGE_SIZE: usize = 1000;

#[derive(Debug)]
pub struct MemoryStore {
    objects: RwLock<BTreeMap<String, StoredObject>>,
    page_size: usize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(page_size: usize) -> Self {
        Self { objects: RwLock::new(BTreeMap::new()), page_size: page_size.max(1) }
    }

    /// Write `payload` with an explicit modification time.
    pub async fn put_at(&self, key: &str, payload: Bytes, last_modified: SystemTime) {
        self.objects.write().await.insert(key.to_owned(), StoredObject { payload, last_modified });
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put(&self, key: &str, payload: Bytes) -> Result<(), StoreError> {
        let mut objects = self.objects.write().await;
        let now = SystemTime::now();
        // Keep modification times monotonic per key even if the wall clock steps back.
        let last_modified = match objects.get(key) {
            Some(prev) if prev.last_modified > now => prev.last_modified,
            _ => now,
        };
        objects.insert(key.to_owned(), StoredObject { payload, last_modified });
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<StoredObject>, StoreError> {
        Ok(self.objects.read().await.get(key).cloned())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.objects.write().await.remove(key);
        Ok(())
    }

    async fn list_page(
        &self,
        prefix: &str,
        continuation: Option<String>,
    ) -> Result<ListPage, StoreError> {
        let objects = self.objects.read().await;
        let lower = match continuation {
            Some(after) => Bound::Excluded(after),
            None => Bound::Included(prefix.to_owned()),
        };

        let mut page: Vec<ObjectMeta> = objects
            .range((lower, Bound::Unbounded))
            .take_while(|(k, _)| k.starts_with(prefix))
            .take(self.page_size + 1)
            .map(|(k, v)| ObjectMeta { key: k.clone(), last_modified: v.last_modified })
            .collect();

        let next = if page.len() > self.page_size {
            page.truncate(self.page_size);
            page.last().map(|m| m.key.clone())
        } else {
            None
        };
        Ok(ListPage { objects: page, next })
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
