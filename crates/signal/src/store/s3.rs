// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! S3-backed object store (AWS or any S3-compatible service).
//!
//! Credentials come from the standard AWS provider chain (environment,
//! profile, instance/task role). Only the bucket is required.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::{ByteStream, DateTime};
use aws_sdk_s3::Client;
use bytes::Bytes;

use super::{ListPage, ObjectMeta, ObjectStore, StoreError, StoredObject};

/// S3 configuration
#[derive(Debug, Clone)]
pub struct S3Config {
    /// Bucket holding all signaling objects.
    pub bucket: String,
    /// AWS region (defaults to the provider chain's region).
    pub region: Option<String>,
    /// Custom endpoint URL for S3-compatible services (MinIO, R2, ...).
    pub endpoint: Option<String>,
}

pub struct S3Store {
    client: Client,
    bucket: String,
}

impl S3Store {
    /// Build the client and check that the bucket is reachable with the
    /// resolved credentials. Missing credentials or access fail here, not
    /// on the first request.
    pub async fn connect(config: S3Config) -> anyhow::Result<Self> {
        let mut loader = aws_config::from_env();
        if let Some(ref region) = config.region {
            loader = loader.region(aws_sdk_s3::config::Region::new(region.clone()));
        }
        let shared = loader.load().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if let Some(ref endpoint) = config.endpoint {
            // Most S3-compatible services only support path-style addressing.
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        let store = Self { client: Client::from_conf(builder.build()), bucket: config.bucket };
        store.check_access().await?;
        tracing::info!(bucket = %store.bucket, endpoint = ?config.endpoint, "S3 store connected");
        Ok(store)
    }

    async fn check_access(&self) -> anyhow::Result<()> {
        self.client.head_bucket().bucket(&self.bucket).send().await.map_err(|e| {
            anyhow::anyhow!(
                "cannot access bucket {} (check AWS credentials and permissions): {}",
                self.bucket,
                DisplayErrorContext(e)
            )
        })?;
        Ok(())
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

fn backend_err(op: &str, key: &str, err: impl std::error::Error) -> StoreError {
    StoreError::Backend(format!("{op} {key}: {}", DisplayErrorContext(err)))
}

fn to_system_time(dt: &DateTime) -> SystemTime {
    match u64::try_from(dt.secs()) {
        Ok(secs) => UNIX_EPOCH + Duration::new(secs, dt.subsec_nanos()),
        Err(_) => UNIX_EPOCH,
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn put(&self, key: &str, payload: Bytes) -> Result<(), StoreError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .cache_control("no-cache")
            .content_type("text/plain; charset=utf-8")
            .body(ByteStream::from(payload))
            .send()
            .await
            .map_err(|e| backend_err("put", key, e))?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<StoredObject>, StoreError> {
        match self.client.get_object().bucket(&self.bucket).key(key).send().await {
            Ok(output) => {
                let last_modified =
                    output.last_modified().map(to_system_time).unwrap_or_else(SystemTime::now);
                let data = output
                    .body
                    .collect()
                    .await
                    .map_err(|e| backend_err("read", key, e))?;
                Ok(Some(StoredObject { payload: data.into_bytes(), last_modified }))
            }
            Err(e) => {
                let service_err = e.into_service_error();
                if service_err.is_no_such_key() {
                    Ok(None)
                } else {
                    Err(backend_err("get", key, service_err))
                }
            }
        }
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| backend_err("delete", key, e))?;
        Ok(())
    }

    async fn list_page(
        &self,
        prefix: &str,
        continuation: Option<String>,
    ) -> Result<ListPage, StoreError> {
        let output = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(prefix)
            .set_continuation_token(continuation)
            .send()
            .await
            .map_err(|e| backend_err("list", prefix, e))?;

        let objects = output
            .contents()
            .iter()
            .filter_map(|obj| {
                let key = obj.key()?;
                // Missing timestamps read as the epoch: listed, but never fresh.
                let last_modified = obj.last_modified().map(to_system_time).unwrap_or(UNIX_EPOCH);
                Some(ObjectMeta { key: key.to_owned(), last_modified })
            })
            .collect();

        Ok(ListPage { objects, next: output.next_continuation_token().map(str::to_owned) })
    }
}

#[cfg(test)]
#[path = "s3_tests.rs"]
mod tests;
