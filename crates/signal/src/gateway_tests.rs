// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use bytes::Bytes;

use super::*;
use crate::store::{ListPage, MemoryStore};

/// Delays every call by `delay` before delegating to an in-memory store.
struct SlowStore {
    inner: MemoryStore,
    delay: Duration,
}

#[async_trait]
impl ObjectStore for SlowStore {
    async fn put(&self, key: &str, payload: Bytes) -> Result<(), StoreError> {
        tokio::time::sleep(self.delay).await;
        self.inner.put(key, payload).await
    }

    async fn get(&self, key: &str) -> Result<Option<StoredObject>, StoreError> {
        tokio::time::sleep(self.delay).await;
        self.inner.get(key).await
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        tokio::time::sleep(self.delay).await;
        self.inner.delete(key).await
    }

    async fn list_page(
        &self,
        prefix: &str,
        continuation: Option<String>,
    ) -> Result<ListPage, StoreError> {
        tokio::time::sleep(self.delay).await;
        self.inner.list_page(prefix, continuation).await
    }
}

/// Fails every call and counts how often it was reached.
#[derive(Default)]
struct FailingStore {
    calls: AtomicU32,
}

impl FailingStore {
    fn fail(&self) -> StoreError {
        self.calls.fetch_add(1, Ordering::SeqCst);
        StoreError::Backend("access denied".to_owned())
    }
}

#[async_trait]
impl ObjectStore for FailingStore {
    async fn put(&self, _key: &str, _payload: Bytes) -> Result<(), StoreError> {
        Err(self.fail())
    }

    async fn get(&self, _key: &str) -> Result<Option<StoredObject>, StoreError> {
        Err(self.fail())
    }

    async fn delete(&self, _key: &str) -> Result<(), StoreError> {
        Err(self.fail())
    }

    async fn list_page(
        &self,
        _prefix: &str,
        _continuation: Option<String>,
    ) -> Result<ListPage, StoreError> {
        Err(self.fail())
    }
}

fn memory_gateway() -> (Arc<MemoryStore>, Gateway) {
    let store = Arc::new(MemoryStore::new());
    let gateway = Gateway::new(Arc::clone(&store) as Arc<dyn ObjectStore>, Timeouts::default());
    (store, gateway)
}

#[tokio::test]
async fn put_then_get_round_trips() -> anyhow::Result<()> {
    let (_, gateway) = memory_gateway();
    let payloads: [&[u8]; 3] =
        [b"", b"v=0\r\no=- 0 0 IN IP4 127.0.0.1\r\n", &[0u8, 255, 1, 254, 0, 0, 10, 13]];

    for payload in payloads {
        gateway.put("sessions/a/1/offer.sdp", Bytes::copy_from_slice(payload)).await?;
        let obj = gateway.get("sessions/a/1/offer.sdp").await?;
        assert_eq!(obj.payload.as_ref(), payload);
    }
    Ok(())
}

#[tokio::test]
async fn put_overwrites() -> anyhow::Result<()> {
    let (_, gateway) = memory_gateway();
    gateway.put("k", Bytes::from_static(b"one")).await?;
    gateway.put("k", Bytes::from_static(b"two")).await?;
    assert_eq!(gateway.get("k").await?.payload, Bytes::from_static(b"two"));
    Ok(())
}

#[tokio::test]
async fn missing_object_is_not_found() -> anyhow::Result<()> {
    let (_, gateway) = memory_gateway();
    let err = gateway.get("nope").await.err().ok_or_else(|| anyhow::anyhow!("expected error"))?;
    assert!(matches!(err, GatewayError::NotFound));
    assert_eq!(err.code(), SignalError::NotFound);
    Ok(())
}

#[tokio::test]
async fn delete_is_idempotent() -> anyhow::Result<()> {
    let (store, gateway) = memory_gateway();
    gateway.put("k", Bytes::from_static(b"x")).await?;
    gateway.delete("k").await?;
    gateway.delete("k").await?;
    assert!(store.is_empty().await);
    Ok(())
}

#[tokio::test]
async fn touch_refreshes_modification_time() -> anyhow::Result<()> {
    let (store, gateway) = memory_gateway();
    let earlier = SystemTime::now() - Duration::from_secs(300);
    store.put_at("agents/a/ready", Bytes::new(), earlier).await;

    gateway.touch("agents/a/ready").await?;
    let obj = gateway.get("agents/a/ready").await?;
    assert!(obj.last_modified >= earlier);
    assert!(obj.last_modified > earlier + Duration::from_secs(60));
    assert!(obj.payload.is_empty());
    Ok(())
}

#[tokio::test]
async fn touch_creates_missing_marker() -> anyhow::Result<()> {
    let (store, gateway) = memory_gateway();
    gateway.touch("agents/new/ready").await?;
    assert_eq!(store.len().await, 1);
    Ok(())
}

#[tokio::test]
async fn invalid_keys_never_reach_the_store() -> anyhow::Result<()> {
    let store = Arc::new(FailingStore::default());
    let gateway = Gateway::new(Arc::clone(&store) as Arc<dyn ObjectStore>, Timeouts::default());

    for key in ["", "/etc/passwd", "a/../../b", "a//b"] {
        for result in [
            gateway.put(key, Bytes::new()).await,
            gateway.get(key).await.map(|_| ()),
            gateway.delete(key).await,
            gateway.touch(key).await,
        ] {
            let err = result.err().ok_or_else(|| anyhow::anyhow!("expected rejection"))?;
            assert!(matches!(err, GatewayError::InvalidKey(_)), "{key:?}: {err:?}");
            assert_eq!(err.code(), SignalError::BadRequest);
        }
    }
    assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    Ok(())
}

#[tokio::test]
async fn store_failures_surface_as_store_errors() -> anyhow::Result<()> {
    let gateway = Gateway::new(Arc::new(FailingStore::default()), Timeouts::default());

    let err = gateway.put("k", Bytes::new()).await.err();
    assert!(matches!(err, Some(GatewayError::Store(StoreError::Backend(_)))));

    let err = gateway.ready_agents(60, SystemTime::now()).await.err();
    assert!(matches!(err, Some(GatewayError::Store(_))), "listing errors are not empty lists");

    let err = gateway.list(Some("agents/")).await.err();
    assert_eq!(err.map(|e| e.code()), Some(SignalError::StoreError));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn slow_io_times_out() -> anyhow::Result<()> {
    let store = SlowStore { inner: MemoryStore::new(), delay: Duration::from_secs(60) };
    let timeouts = Timeouts { io: Duration::from_secs(20), ..Timeouts::default() };
    let gateway = Gateway::new(Arc::new(store), timeouts);

    let err = gateway.get("k").await.err();
    assert!(
        matches!(err, Some(GatewayError::Store(StoreError::Timeout(d))) if d == Duration::from_secs(20)),
        "got {err:?}"
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn touch_uses_the_shortest_bound() -> anyhow::Result<()> {
    let store = SlowStore { inner: MemoryStore::new(), delay: Duration::from_secs(5) };
    let timeouts = Timeouts {
        list: Duration::from_secs(30),
        io: Duration::from_secs(20),
        touch: Duration::from_secs(1),
    };
    let gateway = Gateway::new(Arc::new(store), timeouts);

    gateway.put("agents/a/ready", Bytes::new()).await?;
    let err = gateway.touch("agents/a/ready").await.err();
    assert!(matches!(err, Some(GatewayError::Store(StoreError::Timeout(_)))), "got {err:?}");
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn listing_bound_covers_all_pages() -> anyhow::Result<()> {
    let inner = MemoryStore::with_page_size(1);
    for id in ["a", "b", "c", "d"] {
        inner.put(&crate::presence::ready_key(id), Bytes::new()).await?;
    }
    // Four pages at 10s each exceed a 30s listing bound.
    let store = SlowStore { inner, delay: Duration::from_secs(10) };
    let gateway = Gateway::new(Arc::new(store), Timeouts::default());

    let err = gateway.ready_agents(60, SystemTime::now()).await.err();
    assert!(matches!(err, Some(GatewayError::Store(StoreError::Timeout(_)))), "got {err:?}");
    Ok(())
}

#[tokio::test]
async fn list_rejects_bad_prefixes() -> anyhow::Result<()> {
    let (_, gateway) = memory_gateway();
    for prefix in [None, Some(""), Some("/x"), Some("..")] {
        let err = gateway.list(prefix).await.err();
        assert!(matches!(err, Some(GatewayError::InvalidPrefix(_))), "{prefix:?}: {err:?}");
    }
    Ok(())
}
