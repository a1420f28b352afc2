//! PrefetchCache - リモート成果物のメモリキャッシュ
//!
//! hash id ごとに高々 1 つのリモート取得しか走らせない。
//! 取得中に来た呼び出しは同じ `Shared` future に合流する。
//!
//! # 構造
//! ```text
//! PrefetchCache (Arc<Inner>)
//!   slots: Mutex<Slots>
//!     entries: HashMap<hash_id, Slot>   Slot = Fetching(SharedFetch) | Cached(Bytes)
//!     lru: LruState                      Cached のみ追跡（byte budget）
//! ```
//!
//! # ロック
//! - Mutex は状態遷移（Absent → Fetching → Cached）の間だけ握る
//! - Cached のバイト列は immutable な `Bytes` なのでロックなしで共有できる
//! - 取得は tokio task として spawn するので、待っている側が drop しても止まらない

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};

use bytes::Bytes;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tracing::{debug, warn};

use super::config::CacheConfig;
use super::lru::LruState;
use super::reader::ArtifactReader;
use super::stats::{CacheStats, Counters};
use crate::artifact::RemoteArtifact;
use crate::domain::{ArtifactError, CacheState, RemoteFetchError};
use crate::ports::StoreError;

type FetchResult = Result<Bytes, RemoteFetchError>;

/// 同じ hash id への並行呼び出しが合流する future
type SharedFetch = Shared<BoxFuture<'static, FetchResult>>;

/// キャッシュ済みエントリが追い出し・無効化されるたびに `(hash_id, size)` で呼ばれる
pub type EvictionListener = Arc<dyn Fn(&str, u64) + Send + Sync>;

enum Slot {
    Fetching(SharedFetch),
    Cached(Bytes),
}

struct Slots {
    entries: HashMap<String, Slot>,
    lru: LruState,
}

enum Lookup {
    Ready(Bytes),
    Pending(SharedFetch),
}

struct Inner {
    slots: Mutex<Slots>,
    config: CacheConfig,
    runtime: Handle,
    counters: Counters,
    listener: Option<EvictionListener>,
}

#[derive(Clone)]
pub struct PrefetchCache {
    inner: Arc<Inner>,
}

impl PrefetchCache {
    /// 取得 task は `runtime` 上に spawn される
    pub fn new(config: CacheConfig, runtime: Handle) -> Self {
        Self::build(config, runtime, None)
    }

    pub fn with_listener(config: CacheConfig, runtime: Handle, listener: EvictionListener) -> Self {
        Self::build(config, runtime, Some(listener))
    }

    /// 呼び出し元の runtime を使う
    ///
    /// # Panics
    /// `tokio::spawn` と同じく、tokio runtime の外で呼ぶと panic する。
    pub fn current(config: CacheConfig) -> Self {
        Self::new(config, Handle::current())
    }

    fn build(config: CacheConfig, runtime: Handle, listener: Option<EvictionListener>) -> Self {
        Self {
            inner: Arc::new(Inner {
                slots: Mutex::new(Slots {
                    entries: HashMap::new(),
                    lru: LruState::new(config.max_bytes),
                }),
                config,
                runtime,
                counters: Counters::default(),
                listener,
            }),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    /// ブロックせずにキャッシュを温める
    ///
    /// - Cached: 何もしない
    /// - Fetching: 実行中の取得に合流
    /// - Absent: 取得を spawn
    ///
    /// 失敗はログに残すだけで、次に中身を要求した呼び出しが受け取る。
    pub fn prefetch(&self, artifact: &RemoteArtifact) -> PrefetchHandle {
        match self.inner.lookup_or_start(artifact) {
            Lookup::Ready(_) => PrefetchHandle { fetch: None },
            Lookup::Pending(fetch) => PrefetchHandle { fetch: Some(fetch) },
        }
    }

    /// 成果物のバイト列を読む。未取得なら先に取得する
    pub async fn open_stream(&self, artifact: &RemoteArtifact) -> Result<ArtifactReader, ArtifactError> {
        let bytes = match self.inner.lookup_or_start(artifact) {
            Lookup::Ready(bytes) => bytes,
            Lookup::Pending(fetch) => fetch.await?,
        };
        Ok(ArtifactReader::new(bytes))
    }

    /// 成果物を `dest` にコピーする（既存ファイルはアトミックに置き換え）
    ///
    /// `dest` と同じディレクトリの一時ファイルに書き切ってから rename する。
    /// 失敗時は `dest` の元の内容が残る。
    /// パーミッションは既存の `dest` を引き継ぎ、新規なら umask に従う。
    pub async fn copy_to(
        &self,
        artifact: &RemoteArtifact,
        dest: impl AsRef<Path>,
    ) -> Result<(), ArtifactError> {
        let dest = dest.as_ref().to_path_buf();
        let bytes = self.open_stream(artifact).await?.into_bytes();

        let path = dest.clone();
        let written = self
            .inner
            .runtime
            .spawn_blocking(move || write_atomically(&path, &bytes))
            .await
            .map_err(|e| ArtifactError::local_write(dest.clone(), std::io::Error::other(e)))?;
        written?;

        debug!(hash_id = artifact.hash_id(), dest = %dest.display(), "copied artifact");
        Ok(())
    }

    /// 実際にバイト列を保持している間だけ true
    pub fn contains(&self, hash_id: &str) -> bool {
        self.state(hash_id).is_cached()
    }

    pub fn state(&self, hash_id: &str) -> CacheState {
        match self.inner.slots.lock().entries.get(hash_id) {
            None => CacheState::Absent,
            Some(Slot::Fetching(_)) => CacheState::Fetching,
            Some(Slot::Cached(_)) => CacheState::Cached,
        }
    }

    /// `hash_id` のキャッシュを捨てる。実行中の取得には触らない
    ///
    /// 取り除いたエントリがあれば true。
    pub fn invalidate(&self, hash_id: &str) -> bool {
        let removed = {
            let mut guard = self.inner.slots.lock();
            let slots = &mut *guard;
            match slots.entries.get(hash_id) {
                Some(Slot::Cached(_)) => {
                    slots.entries.remove(hash_id);
                    slots.lru.remove(hash_id).map(|size| (hash_id.to_string(), size))
                }
                _ => None,
            }
        };
        let found = removed.is_some();
        self.inner.evicted(removed.into_iter().collect());
        found
    }

    /// キャッシュ済みエントリを全部捨てる。実行中の取得はそのまま続く
    pub fn clear(&self) {
        let removed: Vec<(String, u64)> = {
            let mut guard = self.inner.slots.lock();
            let slots = &mut *guard;
            let cached: Vec<String> = slots
                .entries
                .iter()
                .filter(|(_, slot)| matches!(slot, Slot::Cached(_)))
                .map(|(id, _)| id.clone())
                .collect();
            cached
                .into_iter()
                .filter_map(|id| {
                    slots.entries.remove(&id);
                    slots.lru.remove(&id).map(|size| (id, size))
                })
                .collect()
        };
        self.inner.evicted(removed);
    }

    pub fn stats(&self) -> CacheStats {
        let mut stats = self.inner.counters.snapshot();
        let slots = self.inner.slots.lock();
        stats.cached_bytes = slots.lru.current_bytes();
        for slot in slots.entries.values() {
            match slot {
                Slot::Fetching(_) => stats.pending_fetches += 1,
                Slot::Cached(_) => stats.entries += 1,
            }
        }
        stats
    }
}

impl Inner {
    fn lookup_or_start(self: &Arc<Self>, artifact: &RemoteArtifact) -> Lookup {
        let hash_id = artifact.hash_id();
        let mut guard = self.slots.lock();
        let slots = &mut *guard;

        match slots.entries.get(hash_id) {
            Some(Slot::Cached(bytes)) => {
                let bytes = bytes.clone();
                slots.lru.touch(hash_id);
                Counters::bump(&self.counters.hits);
                debug!(hash_id, "cache hit");
                return Lookup::Ready(bytes);
            }
            Some(Slot::Fetching(fetch)) => {
                Counters::bump(&self.counters.joined);
                debug!(hash_id, "joining in-flight fetch");
                return Lookup::Pending(fetch.clone());
            }
            None => {}
        }

        Counters::bump(&self.counters.misses);
        let fetch = self.spawn_fetch(artifact);
        slots
            .entries
            .insert(hash_id.to_string(), Slot::Fetching(fetch.clone()));
        Lookup::Pending(fetch)
    }

    /// slots のロックを握った状態で呼ぶこと
    /// （task が完了するより先に `Fetching` slot が入っている必要がある）
    fn spawn_fetch(self: &Arc<Self>, artifact: &RemoteArtifact) -> SharedFetch {
        let hash_id = artifact.hash_id().to_string();
        let store = Arc::clone(artifact.store());
        let inner = Arc::clone(self);
        let task_hash_id = hash_id.clone();

        debug!(hash_id = %hash_id, flavor = artifact.flavor(), "starting remote fetch");
        let task = self.runtime.spawn(async move {
            let result = match AssertUnwindSafe(store.fetch(&task_hash_id)).catch_unwind().await {
                Ok(fetched) => fetched.map_err(|e| RemoteFetchError::new(task_hash_id.as_str(), e)),
                Err(_) => Err(RemoteFetchError::new(
                    task_hash_id.as_str(),
                    StoreError::Aborted("remote store panicked".to_string()),
                )),
            };
            inner.complete(&task_hash_id, &result);
            result
        });

        // 止まった slot がキャッシュを生かし続けないよう Weak
        let weak: Weak<Inner> = Arc::downgrade(self);
        async move {
            match task.await {
                Ok(result) => result,
                Err(e) => {
                    if let Some(inner) = weak.upgrade() {
                        inner.abandon(&hash_id);
                    }
                    Err(RemoteFetchError::new(hash_id, StoreError::Aborted(e.to_string())))
                }
            }
        }
        .boxed()
        .shared()
    }

    fn complete(&self, hash_id: &str, result: &FetchResult) {
        let evicted = {
            let mut guard = self.slots.lock();
            let slots = &mut *guard;
            slots.entries.remove(hash_id);

            match result {
                Ok(bytes) => {
                    let size = bytes.len() as u64;
                    if size > self.config.entry_limit() {
                        debug!(hash_id, size, "artifact exceeds entry limit; not retained");
                        Vec::new()
                    } else {
                        let evicted = slots.lru.admit(hash_id, size);
                        for (victim, _) in &evicted {
                            slots.entries.remove(victim);
                        }
                        slots
                            .entries
                            .insert(hash_id.to_string(), Slot::Cached(bytes.clone()));
                        debug!(hash_id, size, "cached artifact");
                        evicted
                    }
                }
                Err(e) => {
                    Counters::bump(&self.counters.fetch_failures);
                    warn!(hash_id, error = %e.cause(), "remote fetch failed");
                    Vec::new()
                }
            }
        };
        self.evicted(evicted);
    }

    /// 完了を報告しないまま終わった task の `Fetching` slot を片付ける
    fn abandon(&self, hash_id: &str) {
        let mut slots = self.slots.lock();
        if matches!(slots.entries.get(hash_id), Some(Slot::Fetching(_))) {
            slots.entries.remove(hash_id);
            warn!(hash_id, "fetch task aborted");
        }
    }

    fn evicted(&self, removed: Vec<(String, u64)>) {
        if removed.is_empty() {
            return;
        }
        Counters::add(&self.counters.evictions, removed.len() as u64);
        for (hash_id, size) in &removed {
            debug!(hash_id = %hash_id, size, "evicted artifact");
            if let Some(listener) = &self.listener {
                listener(hash_id, *size);
            }
        }
    }
}

/// prefetch のハンドル。drop しても取得はキャンセルされない
#[must_use = "dropping the handle is fine; await `wait` to observe completion"]
pub struct PrefetchHandle {
    fetch: Option<SharedFetch>,
}

impl PrefetchHandle {
    /// prefetch 時点で既にキャッシュ済みだったら true
    pub fn was_cached(&self) -> bool {
        self.fetch.is_none()
    }

    pub async fn wait(self) -> Result<(), RemoteFetchError> {
        match self.fetch {
            Some(fetch) => fetch.await.map(|_| ()),
            None => Ok(()),
        }
    }
}

fn write_atomically(dest: &Path, bytes: &[u8]) -> Result<(), ArtifactError> {
    use std::io::Write;

    let fail = |source| ArtifactError::local_write(dest, source);
    let dir: PathBuf = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).map_err(fail)?;

    // 一時ファイルは drop で消えるので、途中で return しても残らない
    #[cfg_attr(not(unix), allow(unused_mut))]
    let mut builder = tempfile::Builder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        // 既定の 0600 ではなく、通常のファイル作成と同じく umask を効かせる
        builder.permissions(std::fs::Permissions::from_mode(0o666));
    }
    let mut tmp = builder.tempfile_in(&dir).map_err(fail)?;
    if let Ok(existing) = std::fs::metadata(dest) {
        tmp.as_file()
            .set_permissions(existing.permissions())
            .map_err(fail)?;
    }
    tmp.write_all(bytes).map_err(fail)?;
    tmp.as_file().sync_all().map_err(fail)?;
    tmp.persist(dest).map_err(|e| fail(e.error))?;
    Ok(())
}
