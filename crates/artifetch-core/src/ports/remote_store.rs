//! RemoteStore port - hash id でバイト列を取得するリモートサービス
//!
//! 取得プロトコル自体は不透明（fetch(hash_id) -> bytes | error）。
//! タイムアウトもこの層の責務で、`StoreError::Timeout` として返す。

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// StoreError は transport 層のエラー
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("content not found: {0}")]
    NotFound(String),

    #[error("remote store unavailable: {0}")]
    Unavailable(String),

    #[error("fetch timed out after {0:?}")]
    Timeout(Duration),

    #[error("invalid hash id: {0}")]
    InvalidId(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("fetch aborted: {0}")]
    Aborted(String),
}

/// RemoteStore は hash id から中身を取得する
///
/// # 設計原則
/// - 全体を取得するか失敗するか（部分的なバイト列は返さない）
/// - リトライしない（上位層の責務）
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn fetch(&self, hash_id: &str) -> Result<Bytes, StoreError>;
}
