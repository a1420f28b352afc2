//! ArtifactParser port - record を RemoteArtifact に変換する
//!
//! 新しいリモートバックエンドを追加するときの唯一の統合ポイント。
//! StoreRegistry に登録順で問い合わせられる。

use crate::artifact::RemoteArtifact;
use crate::domain::{ArtifactError, ArtifactRecord};

/// ArtifactParser は特定の flavor の record を claim する
///
/// # 戻り値
/// - `Ok(Some(_))`: claim して handle を構築できた
/// - `Ok(None)`: この parser の担当ではない
/// - `Err(MalformedRecord)`: claim したが構築に失敗した（None とは区別する）
pub trait ArtifactParser: Send + Sync {
    fn flavor(&self) -> &str;

    fn parse(&self, record: &ArtifactRecord) -> Result<Option<RemoteArtifact>, ArtifactError>;
}
