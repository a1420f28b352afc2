//! Cache - リモート成果物の prefetch / 読み取り
//!
//! # 主要コンポーネント
//! - **PrefetchCache**: hash id ごとに 1 つの取得だけを走らせるメモリキャッシュ
//! - **ArtifactReader**: キャッシュ済み or 取得直後のバイト列を読むアダプタ
//! - **CacheConfig**: byte budget（LRU）の設定
//! - **CacheStats**: hit / miss / eviction の集計

mod config;
mod lru;
mod prefetch;
mod reader;
mod stats;

pub use self::config::{CacheConfig, DEFAULT_MAX_BYTES, DEFAULT_MAX_ENTRY_BYTES};
pub use self::prefetch::{EvictionListener, PrefetchCache, PrefetchHandle};
pub use self::reader::ArtifactReader;
pub use self::stats::CacheStats;
