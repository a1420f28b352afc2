//! ArtifactIdentity - リモートにあるビルド成果物の識別子
//!
//! hash_id が同じなら中身はバイト単位で同一。
//! relative_path は別の hash_id で再利用されうる（新しいビルドで置き換えられた場合）。

use std::fmt;

use serde::{Deserialize, Serialize};

use super::record::ArtifactRecord;
use crate::ports::Clock;

/// ArtifactIdentity は構築後に変更できない
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactIdentity {
    relative_path: String,
    hash_id: String,
    sync_time_millis: i64,
}

impl ArtifactIdentity {
    pub fn new(
        relative_path: impl Into<String>,
        hash_id: impl Into<String>,
        sync_time_millis: i64,
    ) -> Self {
        Self {
            relative_path: relative_path.into(),
            hash_id: hash_id.into(),
            sync_time_millis,
        }
    }

    /// 現在時刻を sync 開始時刻として記録する
    pub fn stamped<C: Clock + ?Sized>(
        relative_path: impl Into<String>,
        hash_id: impl Into<String>,
        clock: &C,
    ) -> Self {
        Self::new(relative_path, hash_id, clock.now().timestamp_millis())
    }

    pub fn relative_path(&self) -> &str {
        &self.relative_path
    }

    pub fn hash_id(&self) -> &str {
        &self.hash_id
    }

    pub fn sync_time_millis(&self) -> i64 {
        self.sync_time_millis
    }

    pub fn to_record(&self) -> ArtifactRecord {
        ArtifactRecord {
            relative_path: self.relative_path.clone(),
            id: self.hash_id.clone(),
            sync_start_time_millis: self.sync_time_millis,
        }
    }
}

impl From<&ArtifactRecord> for ArtifactIdentity {
    fn from(record: &ArtifactRecord) -> Self {
        Self::new(
            record.relative_path.clone(),
            record.id.clone(),
            record.sync_start_time_millis,
        )
    }
}

impl From<ArtifactRecord> for ArtifactIdentity {
    fn from(record: ArtifactRecord) -> Self {
        Self::new(record.relative_path, record.id, record.sync_start_time_millis)
    }
}

impl fmt::Display for ArtifactIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.relative_path, self.hash_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::FixedClock;
    use chrono::{TimeZone, Utc};

    #[test]
    fn record_roundtrip_preserves_identity() {
        let identity = ArtifactIdentity::new("out/libfoo.jar", "abc123", 1000);
        let record = identity.to_record();

        assert_eq!(record.relative_path, "out/libfoo.jar");
        assert_eq!(record.id, "abc123");
        assert_eq!(record.sync_start_time_millis, 1000);
        assert_eq!(ArtifactIdentity::from(&record), identity);
        assert_eq!(ArtifactIdentity::from(record), identity);
    }

    #[test]
    fn stamped_uses_clock_millis() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let identity = ArtifactIdentity::stamped("out/a.jar", "h1", &FixedClock::new(now));
        assert_eq!(identity.sync_time_millis(), now.timestamp_millis());
    }

    #[test]
    fn display_shows_path_and_hash() {
        let identity = ArtifactIdentity::new("out/a.jar", "h1", 0);
        assert_eq!(identity.to_string(), "out/a.jar@h1");
    }
}
