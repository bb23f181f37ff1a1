// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Object key validation.
//!
//! Keys address a flat namespace and are stored exactly as given. The only
//! constraints keep callers from escaping their intended path.

/// Reason a key was rejected. Checks run in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum KeyError {
    #[error("empty key")]
    Empty,
    #[error("key must not start with a slash")]
    LeadingSlash,
    #[error("key must not contain parent-reference '..'")]
    ParentReference,
    #[error("key must not contain a doubled separator '//'")]
    DoubledSeparator,
}

/// Validate an object key, returning it unchanged on success.
pub fn validate(key: &str) -> Result<&str, KeyError> {
    if key.is_empty() {
        return Err(KeyError::Empty);
    }
    if key.starts_with('/') || key.starts_with('\\') {
        return Err(KeyError::LeadingSlash);
    }
    if key.contains("..") {
        return Err(KeyError::ParentReference);
    }
    if key.contains("//") {
        return Err(KeyError::DoubledSeparator);
    }
    Ok(key)
}

#[cfg(test)]
#[path = "key_tests.rs"]
mod tests;
