//! LocalDirStore - ディレクトリを CAS として扱うストア
//!
//! `<root>/<digest>` を返す。digest は hash id から prefix を取り除いたもの。
//!
//! ```text
//! root/
//! ├── abc123def456...     # content file (digest as filename)
//! └── ...
//! ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;

use crate::ports::{RemoteStore, StoreError};

#[derive(Debug, Clone)]
pub struct LocalDirStore {
    root: PathBuf,
    prefix: String,
}

impl LocalDirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            prefix: String::new(),
        }
    }

    /// hash id の先頭から取り除く prefix（例: `"cas:"`）
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, hash_id: &str) -> Result<PathBuf, StoreError> {
        let digest = hash_id
            .strip_prefix(self.prefix.as_str())
            .ok_or_else(|| StoreError::InvalidId(hash_id.to_string()))?;
        if digest.is_empty()
            || digest == "."
            || digest == ".."
            || digest.contains(['/', '\\'])
        {
            return Err(StoreError::InvalidId(hash_id.to_string()));
        }
        Ok(self.root.join(digest))
    }
}

#[async_trait]
impl RemoteStore for LocalDirStore {
    async fn fetch(&self, hash_id: &str) -> Result<Bytes, StoreError> {
        let path = self.path_for(hash_id)?;
        match tokio::fs::read(&path).await {
            Ok(content) => Ok(Bytes::from(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(hash_id.to_string()))
            }
            Err(e) => Err(StoreError::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[tokio::test]
    async fn serves_file_by_digest() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("abc123"), b"jar").unwrap();
        let store = LocalDirStore::new(dir.path()).with_prefix("cas:");

        assert_eq!(store.fetch("cas:abc123").await.unwrap(), Bytes::from_static(b"jar"));
        assert!(matches!(store.fetch("cas:missing").await, Err(StoreError::NotFound(_))));
    }

    #[rstest]
    #[case::wrong_prefix("other:abc123")]
    #[case::empty_digest("cas:")]
    #[case::parent_dir("cas:..")]
    #[case::nested("cas:a/b")]
    #[case::backslash("cas:a\\b")]
    #[tokio::test]
    async fn rejects_unsafe_ids(#[case] hash_id: &str) {
        let store = LocalDirStore::new("/nonexistent").with_prefix("cas:");
        assert!(matches!(store.fetch(hash_id).await, Err(StoreError::InvalidId(_))));
    }
}
