//! State - hash id ごとのキャッシュ状態
//!
//! # 状態遷移
//! - Absent --prefetch/open_stream--> Fetching
//! - Fetching --success--> Cached
//! - Fetching --failure--> Absent（待っている全員にエラーを配る）
//! - Cached --eviction/invalidate--> Absent（呼び出し側には見えない）

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheState {
    Absent,
    Fetching,
    Cached,
}

impl CacheState {
    pub fn is_cached(self) -> bool {
        self == Self::Cached
    }
}
