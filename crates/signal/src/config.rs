// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use crate::gateway::Timeouts;
use crate::store::S3Config;

/// Default request body cap (2 MiB); SDP blobs are a few KiB.
pub const DEFAULT_MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Object store backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum StoreKind {
    /// S3 or any S3-compatible service.
    S3,
    /// Process-local map. Contents are lost on restart.
    Memory,
}

/// Configuration for the signaling gateway.
#[derive(Debug, Clone, clap::Parser)]
#[command(name = "signalgw", version, about = "HTTP signaling gateway over an object store")]
pub struct SignalConfig {
    /// Host to bind on.
    #[arg(long, default_value = "0.0.0.0", env = "SIGNAL_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 9090, env = "SIGNAL_PORT")]
    pub port: u16,

    /// Object store backend.
    #[arg(long, value_enum, default_value = "s3", env = "SIGNAL_STORE")]
    pub store: StoreKind,

    /// Bucket holding signaling objects (required for the s3 store).
    #[arg(long, env = "SIGNAL_BUCKET")]
    pub bucket: Option<String>,

    /// AWS region override.
    #[arg(long, env = "AWS_REGION")]
    pub region: Option<String>,

    /// Custom S3 endpoint URL (MinIO, R2, ...).
    #[arg(long, env = "SIGNAL_S3_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Bound on multi-page listings, in milliseconds.
    #[arg(long, default_value_t = 30_000, env = "SIGNAL_LIST_TIMEOUT_MS")]
    pub list_timeout_ms: u64,

    /// Bound on single-object reads, writes and deletes, in milliseconds.
    #[arg(long, default_value_t = 20_000, env = "SIGNAL_IO_TIMEOUT_MS")]
    pub io_timeout_ms: u64,

    /// Bound on heartbeat writes, in milliseconds.
    #[arg(long, default_value_t = 10_000, env = "SIGNAL_TOUCH_TIMEOUT_MS")]
    pub touch_timeout_ms: u64,

    /// Largest accepted request body, in bytes.
    #[arg(long, default_value_t = DEFAULT_MAX_BODY_BYTES, env = "SIGNAL_MAX_BODY_BYTES")]
    pub max_body_bytes: usize,

    /// Log format (json or text).
    #[arg(long, default_value = "text", env = "SIGNAL_LOG_FORMAT")]
    pub log_format: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "SIGNAL_LOG_LEVEL")]
    pub log_level: String,
}

impl SignalConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.store == StoreKind::S3 && self.bucket().is_none() {
            anyhow::bail!("--bucket (SIGNAL_BUCKET) is required for the s3 store");
        }
        if self.list_timeout_ms == 0 || self.io_timeout_ms == 0 || self.touch_timeout_ms == 0 {
            anyhow::bail!("store timeouts must be non-zero");
        }
        if self.max_body_bytes == 0 {
            anyhow::bail!("--max-body-bytes must be non-zero");
        }
        Ok(())
    }

    pub fn bucket(&self) -> Option<&str> {
        self.bucket.as_deref().filter(|b| !b.is_empty())
    }

    pub fn timeouts(&self) -> Timeouts {
        Timeouts {
            list: Duration::from_millis(self.list_timeout_ms),
            io: Duration::from_millis(self.io_timeout_ms),
            touch: Duration::from_millis(self.touch_timeout_ms),
        }
    }

    /// S3 settings, when the s3 store is selected and a bucket is set.
    pub fn s3(&self) -> Option<S3Config> {
        if self.store != StoreKind::S3 {
            return None;
        }
        Some(S3Config {
            bucket: self.bucket()?.to_owned(),
            region: self.region.clone().filter(|r| !r.is_empty()),
            endpoint: self.endpoint.clone().filter(|e| !e.is_empty()),
        })
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
