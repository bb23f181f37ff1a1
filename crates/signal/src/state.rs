// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use crate::gateway::{Gateway, Timeouts};
use crate::store::ObjectStore;

/// Shared signaling state. Immutable after startup; the store is the only
/// shared resource.
pub struct SignalState {
    pub gateway: Gateway,
    /// Largest accepted request body, in bytes.
    pub max_body_bytes: usize,
}

impl SignalState {
    pub fn new(store: Arc<dyn ObjectStore>, timeouts: Timeouts, max_body_bytes: usize) -> Self {
        Self { gateway: Gateway::new(store, timeouts), max_body_bytes }
    }
}
