//! RemoteArtifact - リモートにある成果物の handle
//!
//! identity と、それを取得できる RemoteStore の組。
//! prefetch / open_stream / copy_to は PrefetchCache に委譲する。

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::cache::{ArtifactReader, PrefetchCache, PrefetchHandle};
use crate::domain::{ArtifactError, ArtifactIdentity, ArtifactRecord};
use crate::ports::RemoteStore;

#[derive(Clone)]
pub struct RemoteArtifact {
    identity: ArtifactIdentity,
    flavor: Arc<str>,
    store: Arc<dyn RemoteStore>,
}

impl RemoteArtifact {
    pub fn new(identity: ArtifactIdentity, flavor: &str, store: Arc<dyn RemoteStore>) -> Self {
        Self {
            identity,
            flavor: Arc::from(flavor),
            store,
        }
    }

    pub fn identity(&self) -> &ArtifactIdentity {
        &self.identity
    }

    /// 中身が異なればこの id も異なる。リモートキャッシュからの取得キーになる。
    pub fn hash_id(&self) -> &str {
        self.identity.hash_id()
    }

    pub fn relative_path(&self) -> &str {
        self.identity.relative_path()
    }

    pub fn sync_time_millis(&self) -> i64 {
        self.identity.sync_time_millis()
    }

    /// この handle を構築した parser の flavor
    pub fn flavor(&self) -> &str {
        &self.flavor
    }

    pub fn store(&self) -> &Arc<dyn RemoteStore> {
        &self.store
    }

    pub fn to_record(&self) -> ArtifactRecord {
        self.identity.to_record()
    }

    pub fn prefetch(&self, cache: &PrefetchCache) -> PrefetchHandle {
        cache.prefetch(self)
    }

    pub async fn open_stream(&self, cache: &PrefetchCache) -> Result<ArtifactReader, ArtifactError> {
        cache.open_stream(self).await
    }

    pub async fn copy_to(
        &self,
        cache: &PrefetchCache,
        dest: impl AsRef<Path>,
    ) -> Result<(), ArtifactError> {
        cache.copy_to(self, dest).await
    }
}

impl fmt::Debug for RemoteArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteArtifact")
            .field("identity", &self.identity)
            .field("flavor", &self.flavor)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheConfig;
    use crate::impls::InMemoryRemoteStore;
    use std::io::Read;

    fn artifact(store: Arc<InMemoryRemoteStore>) -> RemoteArtifact {
        RemoteArtifact::new(ArtifactIdentity::new("out/libfoo.jar", "abc123", 1000), "mem", store)
    }

    #[test]
    fn to_record_uses_identity_fields() {
        let artifact = artifact(Arc::new(InMemoryRemoteStore::new()));
        assert_eq!(artifact.to_record(), ArtifactRecord::new("out/libfoo.jar", "abc123", 1000));
        assert_eq!(artifact.flavor(), "mem");
        assert_eq!(artifact.hash_id(), "abc123");
    }

    #[tokio::test]
    async fn capabilities_delegate_to_cache() {
        let store = Arc::new(InMemoryRemoteStore::new());
        store.insert("abc123", b"jar bytes".to_vec());
        let cache = PrefetchCache::current(CacheConfig::default());
        let artifact = artifact(store.clone());

        artifact.prefetch(&cache).wait().await.unwrap();

        let mut content = String::new();
        artifact
            .open_stream(&cache)
            .await
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "jar bytes");
        assert_eq!(store.fetch_count("abc123"), 1);
    }
}
