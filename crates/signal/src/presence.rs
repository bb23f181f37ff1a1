// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent presence as a view over `agents/<id>/ready` markers.
//!
//! An agent is live while its marker's store-assigned `last_modified` is
//! strictly after `now - max_age`. Agents heartbeat by touching the marker;
//! nothing about presence is stored besides the marker itself.

use std::collections::BTreeSet;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::store::{list_all, ObjectStore, StoreError};

/// Reserved namespace for presence markers.
pub const AGENTS_PREFIX: &str = "agents/";

/// Final segment of a presence marker key.
pub const READY_MARKER: &str = "ready";

/// Freshness window used when the caller gives none (or an unusable one).
pub const DEFAULT_MAX_AGE_SECS: u64 = 60;

/// Marker key for `agent_id`.
pub fn ready_key(agent_id: &str) -> String {
    format!("{AGENTS_PREFIX}{agent_id}/{READY_MARKER}")
}

/// Extract the agent id from `agents/<id>/ready`; any other shape is `None`.
pub fn parse_ready_key(key: &str) -> Option<&str> {
    let mut parts = key.split('/');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some("agents"), Some(id), Some(READY_MARKER), None) => Some(id),
        _ => None,
    }
}

/// Resolve a `maxAgeSec` override. Missing, non-numeric and non-positive
/// values all fall back to [`DEFAULT_MAX_AGE_SECS`].
pub fn resolve_max_age(raw: Option<&str>) -> u64 {
    raw.and_then(|v| v.parse::<i64>().ok())
        .filter(|n| *n > 0)
        .map(|n| n as u64)
        .unwrap_or(DEFAULT_MAX_AGE_SECS)
}

/// Oldest modification time that no longer counts as live.
pub fn cutoff(now: SystemTime, max_age_secs: u64) -> SystemTime {
    now.checked_sub(Duration::from_secs(max_age_secs)).unwrap_or(UNIX_EPOCH)
}

/// List live agent ids, sorted ascending.
pub async fn list_ready_agents(
    store: &dyn ObjectStore,
    max_age_secs: u64,
    now: SystemTime,
) -> Result<Vec<String>, StoreError> {
    let cutoff = cutoff(now, max_age_secs);
    let objects = list_all(store, AGENTS_PREFIX).await?;

    let mut live = BTreeSet::new();
    for obj in &objects {
        let Some(id) = parse_ready_key(&obj.key) else {
            continue;
        };
        if obj.last_modified > cutoff {
            live.insert(id.to_owned());
        }
    }
    Ok(live.into_iter().collect())
}

#[cfg(test)]
#[path = "presence_tests.rs"]
mod tests;
