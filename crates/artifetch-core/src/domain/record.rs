//! ArtifactRecord - 成果物のシリアライズ形式
//!
//! ビルド結果の層とやり取りする永続化フォーマット。
//! 3 つのフィールド名は wire 上の契約なので変えないこと。

use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactRecord {
    pub relative_path: String,
    pub id: String,
    pub sync_start_time_millis: i64,
}

impl ArtifactRecord {
    pub fn new(
        relative_path: impl Into<String>,
        id: impl Into<String>,
        sync_start_time_millis: i64,
    ) -> Self {
        Self {
            relative_path: relative_path.into(),
            id: id.into(),
            sync_start_time_millis,
        }
    }
}

/// record の JSON 配列を読む
pub fn read_records<R: Read>(reader: R) -> Result<Vec<ArtifactRecord>, serde_json::Error> {
    serde_json::from_reader(reader)
}

/// record を整形済み JSON 配列として書く
pub fn write_records<W: Write>(
    writer: W,
    records: &[ArtifactRecord],
) -> Result<(), serde_json::Error> {
    serde_json::to_writer_pretty(writer, records)
}
