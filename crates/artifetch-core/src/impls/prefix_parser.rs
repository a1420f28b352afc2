//! PrefixParser - id の prefix で record を claim する parser
//!
//! 空の prefix は全ての record を claim する。

use std::sync::Arc;

use crate::artifact::RemoteArtifact;
use crate::domain::{ArtifactError, ArtifactIdentity, ArtifactRecord};
use crate::ports::{ArtifactParser, RemoteStore};

pub struct PrefixParser {
    flavor: String,
    prefix: String,
    store: Arc<dyn RemoteStore>,
}

impl PrefixParser {
    pub fn new(
        flavor: impl Into<String>,
        prefix: impl Into<String>,
        store: Arc<dyn RemoteStore>,
    ) -> Self {
        Self {
            flavor: flavor.into(),
            prefix: prefix.into(),
            store,
        }
    }

    fn validate(&self, record: &ArtifactRecord, digest: &str) -> Result<(), ArtifactError> {
        let malformed = |reason: &str| ArtifactError::malformed(&self.flavor, &record.id, reason);
        if digest.is_empty() {
            return Err(malformed("empty digest"));
        }
        if digest.chars().any(|c| c.is_whitespace() || c == '/') {
            return Err(malformed("digest contains whitespace or '/'"));
        }
        if record.relative_path.is_empty() {
            return Err(malformed("empty relative_path"));
        }
        if record.sync_start_time_millis < 0 {
            return Err(malformed("negative sync_start_time_millis"));
        }
        Ok(())
    }
}

impl ArtifactParser for PrefixParser {
    fn flavor(&self) -> &str {
        &self.flavor
    }

    fn parse(&self, record: &ArtifactRecord) -> Result<Option<RemoteArtifact>, ArtifactError> {
        let Some(digest) = record.id.strip_prefix(self.prefix.as_str()) else {
            return Ok(None);
        };
        self.validate(record, digest)?;
        Ok(Some(RemoteArtifact::new(
            ArtifactIdentity::from(record),
            &self.flavor,
            Arc::clone(&self.store),
        )))
    }
}
