//! Errors - エラー型と分類
//!
//! # 分類
//! - UnresolvedArtifactKind: どの parser も record を claim しなかった（skip / warn）
//! - MalformedRecord: parser は claim したが handle を構築できなかった
//! - RemoteFetch: リモート取得の失敗（リトライは上位層の責務）
//! - LocalWrite: copy_to 中のファイルシステム失敗

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::ports::StoreError;

/// ArtifactError はアーティファクト操作のドメインエラー
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("no remote handler claims artifact record id={id}")]
    UnresolvedArtifactKind { id: String },

    #[error("malformed {flavor} record id={id}: {reason}")]
    MalformedRecord {
        flavor: String,
        id: String,
        reason: String,
    },

    #[error(transparent)]
    RemoteFetch(#[from] RemoteFetchError),

    #[error("failed to write artifact to {}", path.display())]
    LocalWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ArtifactError {
    pub fn malformed(flavor: &str, id: &str, reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            flavor: flavor.to_string(),
            id: id.to_string(),
            reason: reason.into(),
        }
    }

    pub fn local_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::LocalWrite {
            path: path.into(),
            source,
        }
    }

    /// 呼び出し側が skip してよいエラーかどうか
    pub fn is_unresolved(&self) -> bool {
        matches!(self, Self::UnresolvedArtifactKind { .. })
    }
}

/// RemoteFetchError はリモート取得の失敗
///
/// 同じ hash id を待っている全員に同じ失敗を配るため `Clone` にしている。
/// 原因の `StoreError` は `Arc` で共有する。
#[derive(Debug, Clone, Error)]
#[error("remote fetch failed for hash_id={hash_id}")]
pub struct RemoteFetchError {
    hash_id: String,
    #[source]
    source: Arc<StoreError>,
}

impl RemoteFetchError {
    pub fn new(hash_id: impl Into<String>, source: StoreError) -> Self {
        Self {
            hash_id: hash_id.into(),
            source: Arc::new(source),
        }
    }

    pub fn hash_id(&self) -> &str {
        &self.hash_id
    }

    pub fn cause(&self) -> &StoreError {
        &self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn remote_fetch_error_keeps_hash_id_and_cause() {
        let err = RemoteFetchError::new("abc123", StoreError::NotFound("abc123".into()));
        assert_eq!(err.hash_id(), "abc123");
        assert!(matches!(err.cause(), StoreError::NotFound(_)));

        let wrapped: ArtifactError = err.clone().into();
        assert!(wrapped.to_string().contains("abc123"));
        assert!(wrapped.source().is_some());
    }

    #[test]
    fn unresolved_is_distinct_from_malformed() {
        let unresolved = ArtifactError::UnresolvedArtifactKind { id: "x".into() };
        let malformed = ArtifactError::malformed("cas", "x", "empty digest");
        assert!(unresolved.is_unresolved());
        assert!(!malformed.is_unresolved());
        assert_eq!(malformed.to_string(), "malformed cas record id=x: empty digest");
    }

    #[test]
    fn local_write_mentions_destination() {
        let err = ArtifactError::local_write(
            "/out/libfoo.jar",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.to_string().contains("/out/libfoo.jar"));
    }
}
