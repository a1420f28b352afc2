//! TimeoutStore - fetch ごとに期限を付けるラッパー
//!
//! タイムアウトは transport 層の関心事なので、キャッシュではなくここで扱う。

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::ports::{RemoteStore, StoreError};

pub struct TimeoutStore<S> {
    inner: S,
    timeout: Duration,
}

impl<S: RemoteStore> TimeoutStore<S> {
    pub fn new(inner: S, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

#[async_trait]
impl<S: RemoteStore> RemoteStore for TimeoutStore<S> {
    async fn fetch(&self, hash_id: &str) -> Result<Bytes, StoreError> {
        tokio::time::timeout(self.timeout, self.inner.fetch(hash_id))
            .await
            .map_err(|_| StoreError::Timeout(self.timeout))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::InMemoryRemoteStore;

    #[tokio::test]
    async fn slow_fetch_times_out() {
        let slow = InMemoryRemoteStore::new().with_latency(Duration::from_millis(200));
        slow.insert("h1", b"one".to_vec());
        let store = TimeoutStore::new(slow, Duration::from_millis(20));

        assert!(matches!(store.fetch("h1").await, Err(StoreError::Timeout(_))));
    }

    #[tokio::test]
    async fn fast_fetch_passes_through() {
        let fast = InMemoryRemoteStore::new();
        fast.insert("h1", b"one".to_vec());
        let store = TimeoutStore::new(fast, Duration::from_secs(1));

        assert_eq!(store.fetch("h1").await.unwrap(), Bytes::from_static(b"one"));
    }
}
