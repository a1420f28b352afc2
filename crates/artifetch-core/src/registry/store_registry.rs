//! StoreRegistry - parser の登録順リスト
//!
//! 起動時に RegistryBuilder で組み立て、以降は読み取り専用。
//! `Send + Sync` なので複数タスクから同時に resolve してよい。

use std::sync::Arc;

use tracing::warn;

use crate::artifact::RemoteArtifact;
use crate::domain::{ArtifactError, ArtifactRecord};
use crate::ports::ArtifactParser;

pub struct StoreRegistry {
    parsers: Vec<Arc<dyn ArtifactParser>>,
}

/// resolve_all の結果
///
/// unresolved / malformed はスキップされた record。呼び出し側で報告する。
#[derive(Debug, Default)]
pub struct ResolveReport {
    pub resolved: Vec<RemoteArtifact>,
    pub unresolved: Vec<ArtifactRecord>,
    pub malformed: Vec<(ArtifactRecord, ArtifactError)>,
}

impl ResolveReport {
    pub fn skipped(&self) -> usize {
        self.unresolved.len() + self.malformed.len()
    }
}

impl StoreRegistry {
    pub(crate) fn new(parsers: Vec<Arc<dyn ArtifactParser>>) -> Self {
        Self { parsers }
    }

    /// 登録順に parser を試し、最初に claim したものを返す
    ///
    /// どの parser も claim しなければ `Ok(None)`。
    /// claim した parser が構築に失敗した場合は `MalformedRecord` を返す。
    pub fn resolve(&self, record: &ArtifactRecord) -> Result<Option<RemoteArtifact>, ArtifactError> {
        for parser in &self.parsers {
            if let Some(artifact) = parser.parse(record)? {
                return Ok(Some(artifact));
            }
        }
        Ok(None)
    }

    /// `resolve` と同じだが、未解決を `UnresolvedArtifactKind` として返す
    pub fn resolve_required(&self, record: &ArtifactRecord) -> Result<RemoteArtifact, ArtifactError> {
        self.resolve(record)?
            .ok_or_else(|| ArtifactError::UnresolvedArtifactKind {
                id: record.id.clone(),
            })
    }

    /// まとめて resolve し、解決できなかった record は warn してスキップする
    pub fn resolve_all<'a, I>(&self, records: I) -> ResolveReport
    where
        I: IntoIterator<Item = &'a ArtifactRecord>,
    {
        let mut report = ResolveReport::default();
        for record in records {
            match self.resolve(record) {
                Ok(Some(artifact)) => report.resolved.push(artifact),
                Ok(None) => {
                    warn!(id = %record.id, path = %record.relative_path, "no remote handler for artifact; skipping");
                    report.unresolved.push(record.clone());
                }
                Err(e) => {
                    warn!(id = %record.id, error = %e, "malformed artifact record; skipping");
                    report.malformed.push((record.clone(), e));
                }
            }
        }
        report
    }

    /// 登録順の flavor 一覧
    pub fn flavors(&self) -> Vec<String> {
        self.parsers.iter().map(|p| p.flavor().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.parsers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parsers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ArtifactIdentity;
    use crate::impls::{InMemoryRemoteStore, PrefixParser};
    use crate::registry::RegistryBuilder;

    fn registry() -> StoreRegistry {
        let store = Arc::new(InMemoryRemoteStore::new());
        RegistryBuilder::new()
            .register(PrefixParser::new("cas", "cas:", store.clone()))
            .unwrap()
            .register(PrefixParser::new("fallback", "", store))
            .unwrap()
            .build()
            .unwrap()
    }

    #[test]
    fn first_matching_parser_wins() {
        let registry = registry();
        let cas = registry
            .resolve(&ArtifactRecord::new("out/a.jar", "cas:h1", 1))
            .unwrap()
            .unwrap();
        let other = registry
            .resolve(&ArtifactRecord::new("out/b.jar", "h2", 2))
            .unwrap()
            .unwrap();

        assert_eq!(cas.flavor(), "cas");
        assert_eq!(other.flavor(), "fallback");
    }

    #[test]
    fn roundtrip_across_every_parser() {
        let registry = registry();
        for identity in [
            ArtifactIdentity::new("out/libfoo.jar", "cas:abc123", 1000),
            ArtifactIdentity::new("out/libfoo.jar", "abc123", 1000),
            ArtifactIdentity::new("gen/x.srcjar", "cas:def", 0),
        ] {
            let artifact = registry.resolve_required(&identity.to_record()).unwrap();
            assert_eq!(artifact.identity(), &identity);
        }
    }

    #[test]
    fn no_parser_yields_none_and_unresolved() {
        let store = Arc::new(InMemoryRemoteStore::new());
        let registry = RegistryBuilder::new()
            .register(PrefixParser::new("cas", "cas:", store))
            .unwrap()
            .build()
            .unwrap();
        let record = ArtifactRecord::new("out/a.jar", "s3:h1", 1);

        assert!(registry.resolve(&record).unwrap().is_none());
        let err = registry.resolve_required(&record).unwrap_err();
        assert!(err.is_unresolved());
    }

    #[test]
    fn malformed_claim_is_not_collapsed_to_none() {
        let registry = registry();
        let err = registry
            .resolve(&ArtifactRecord::new("out/a.jar", "cas:", 1))
            .unwrap_err();
        assert!(matches!(err, ArtifactError::MalformedRecord { .. }));
    }

    #[test]
    fn resolve_all_partitions_records() {
        let store = Arc::new(InMemoryRemoteStore::new());
        let registry = RegistryBuilder::new()
            .register(PrefixParser::new("cas", "cas:", store))
            .unwrap()
            .build()
            .unwrap();
        let records = vec![
            ArtifactRecord::new("out/a.jar", "cas:h1", 1),
            ArtifactRecord::new("out/b.jar", "s3:h2", 1),
            ArtifactRecord::new("out/c.jar", "cas:", 1),
        ];

        let report = registry.resolve_all(&records);
        assert_eq!(report.resolved.len(), 1);
        assert_eq!(report.unresolved, vec![records[1].clone()]);
        assert_eq!(report.malformed.len(), 1);
        assert_eq!(report.skipped(), 2);
    }

    #[test]
    fn flavors_keep_registration_order() {
        assert_eq!(registry().flavors(), vec!["cas", "fallback"]);
    }
}
