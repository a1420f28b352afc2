//! CacheConfig - キャッシュのサイズ設定

use serde::{Deserialize, Serialize};

/// キャッシュ全体の既定 byte budget（512 MiB）
pub const DEFAULT_MAX_BYTES: u64 = 512 * 1024 * 1024;

/// メモリに保持する 1 成果物の既定上限（64 MiB）
pub const DEFAULT_MAX_ENTRY_BYTES: u64 = 64 * 1024 * 1024;

/// キャッシュのサイズ設定
///
/// 合計が `max_bytes` を超えたら LRU 順に追い出す。
/// `max_entry_bytes` より大きい成果物は取得した呼び出し元には返すが、保持はしない。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub max_bytes: u64,
    pub max_entry_bytes: u64,
}

impl CacheConfig {
    pub fn with_max_bytes(max_bytes: u64) -> Self {
        Self {
            max_bytes,
            ..Default::default()
        }
    }

    /// 実際に保持できる最大エントリサイズ
    pub fn entry_limit(&self) -> u64 {
        self.max_entry_bytes.min(self.max_bytes)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_BYTES,
            max_entry_bytes: DEFAULT_MAX_ENTRY_BYTES,
        }
    }
}
