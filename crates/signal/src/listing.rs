// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Prefix enumeration over the store.

use crate::store::{list_all, ObjectStore, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PrefixError {
    #[error("prefix required")]
    Missing,
    #[error("invalid prefix")]
    Invalid,
}

/// A prefix is mandatory, must not be rooted and must not traverse.
pub fn validate_prefix(prefix: Option<&str>) -> Result<&str, PrefixError> {
    let prefix = prefix.filter(|p| !p.is_empty()).ok_or(PrefixError::Missing)?;
    if prefix.starts_with('/') || prefix.contains("..") {
        return Err(PrefixError::Invalid);
    }
    Ok(prefix)
}

/// Every key under `prefix`, across all pages, in store order.
pub async fn list_keys(store: &dyn ObjectStore, prefix: &str) -> Result<Vec<String>, StoreError> {
    Ok(list_all(store, prefix).await?.into_iter().map(|m| m.key).collect())
}

#[cfg(test)]
#[path = "listing_tests.rs"]
mod tests;
