//! InMemoryRemoteStore - 開発用・テスト用のリモートストア
//!
//! # 機能
//! - hash id ごとの fetch 回数カウント（重複取得の検出用）
//! - 人工的な遅延（取得中の合流を再現する）
//! - 失敗の注入

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::{Mutex, RwLock};

use crate::ports::{RemoteStore, StoreError};

#[derive(Default)]
pub struct InMemoryRemoteStore {
    blobs: RwLock<HashMap<String, Bytes>>,
    failures: RwLock<HashMap<String, String>>,
    fetch_counts: Mutex<HashMap<String, usize>>,
    latency: Option<Duration>,
}

impl InMemoryRemoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 全ての fetch を `latency` だけ遅らせる
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn insert(&self, hash_id: impl Into<String>, content: impl Into<Bytes>) {
        self.blobs.write().insert(hash_id.into(), content.into());
    }

    /// リモート側で evict された状態を再現する
    pub fn remove(&self, hash_id: &str) -> Option<Bytes> {
        self.blobs.write().remove(hash_id)
    }

    /// 以降の fetch を `StoreError::Unavailable` で失敗させる
    pub fn fail_with(&self, hash_id: impl Into<String>, message: impl Into<String>) {
        self.failures.write().insert(hash_id.into(), message.into());
    }

    pub fn clear_failure(&self, hash_id: &str) {
        self.failures.write().remove(hash_id);
    }

    pub fn fetch_count(&self, hash_id: &str) -> usize {
        self.fetch_counts.lock().get(hash_id).copied().unwrap_or(0)
    }

    pub fn total_fetches(&self) -> usize {
        self.fetch_counts.lock().values().sum()
    }
}

#[async_trait]
impl RemoteStore for InMemoryRemoteStore {
    async fn fetch(&self, hash_id: &str) -> Result<Bytes, StoreError> {
        *self
            .fetch_counts
            .lock()
            .entry(hash_id.to_string())
            .or_default() += 1;

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        if let Some(message) = self.failures.read().get(hash_id) {
            return Err(StoreError::Unavailable(message.clone()));
        }

        self.blobs
            .read()
            .get(hash_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(hash_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fetch_counts_every_call() {
        let store = InMemoryRemoteStore::new();
        store.insert("h1", b"one".to_vec());

        assert_eq!(store.fetch("h1").await.unwrap(), Bytes::from_static(b"one"));
        assert_eq!(store.fetch("h1").await.unwrap(), Bytes::from_static(b"one"));
        assert!(matches!(store.fetch("h2").await, Err(StoreError::NotFound(_))));

        assert_eq!(store.fetch_count("h1"), 2);
        assert_eq!(store.fetch_count("h2"), 1);
        assert_eq!(store.total_fetches(), 3);
    }

    #[tokio::test]
    async fn injected_failure_can_be_cleared() {
        let store = InMemoryRemoteStore::new();
        store.insert("h1", b"one".to_vec());
        store.fail_with("h1", "down");

        assert!(matches!(store.fetch("h1").await, Err(StoreError::Unavailable(_))));
        store.clear_failure("h1");
        assert!(store.fetch("h1").await.is_ok());
    }

    #[tokio::test]
    async fn removed_content_is_not_found() {
        let store = InMemoryRemoteStore::new();
        store.insert("h1", b"one".to_vec());
        store.remove("h1");
        assert!(matches!(store.fetch("h1").await, Err(StoreError::NotFound(_))));
    }
}
