// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::credential::DEFAULT_TTL_SECS;

/// Configuration for the relay credential service.
#[derive(Debug, Clone, clap::Parser)]
#[command(name = "relay-ice", version, about = "Issues short-lived TURN relay credentials")]
pub struct IceConfig {
    /// Host to bind on.
    #[arg(long, default_value = "0.0.0.0", env = "ICE_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 8080, env = "ICE_PORT")]
    pub port: u16,

    /// Shared secret configured on the TURN relay (`static-auth-secret`).
    #[arg(long, env = "TURN_SECRET", hide_env_values = true)]
    pub turn_secret: Option<String>,

    /// Public hostname of the TURN relay.
    #[arg(long, env = "TURN_HOST")]
    pub turn_host: Option<String>,

    /// Credential lifetime in seconds. Unset, non-numeric or non-positive
    /// values use the default.
    #[arg(long, env = "TURN_TTL", allow_hyphen_values = true)]
    pub turn_ttl: Option<String>,

    /// Log format (json or text).
    #[arg(long, default_value = "text", env = "ICE_LOG_FORMAT")]
    pub log_format: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "ICE_LOG_LEVEL")]
    pub log_level: String,
}

impl IceConfig {
    /// Reject configurations that would issue unusable credentials.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.secret().is_none() {
            anyhow::bail!("--turn-secret (TURN_SECRET) must be set");
        }
        if self.relay_host().is_none() {
            anyhow::bail!("--turn-host (TURN_HOST) must be set");
        }
        Ok(())
    }

    pub fn secret(&self) -> Option<&str> {
        self.turn_secret.as_deref().filter(|s| !s.is_empty())
    }

    pub fn relay_host(&self) -> Option<&str> {
        self.turn_host.as_deref().filter(|s| !s.is_empty())
    }

    pub fn ttl_secs(&self) -> u64 {
        self.turn_ttl
            .as_deref()
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .and_then(|secs| u64::try_from(secs).ok())
            .filter(|&secs| secs > 0)
            .unwrap_or(DEFAULT_TTL_SECS)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
