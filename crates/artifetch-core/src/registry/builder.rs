//! RegistryBuilder - 起動時の parser 登録
//!
//! # Fail-fast 設計
//! - expect_flavors() で期待される flavor を登録
//! - build() 時に「期待集合 ⊆ 登録済み集合」をチェック
//! - 不足があれば BuildError を返す

use std::sync::Arc;

use super::store_registry::StoreRegistry;
use crate::ports::ArtifactParser;

/// # 使用例
/// ```ignore
/// let registry = RegistryBuilder::new()
///     .register(PrefixParser::new("cas", "cas:", store))?
///     .expect_flavors(&["cas"])
///     .build()?;
/// ```
pub struct RegistryBuilder {
    parsers: Vec<Arc<dyn ArtifactParser>>,
    expected_flavors: Option<Vec<String>>,
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Parser for flavor '{0}' is already registered")]
    AlreadyRegistered(String),
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Missing flavors: {0:?}. These flavors were expected but not registered.")]
    MissingFlavors(Vec<String>),
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self {
            parsers: Vec::new(),
            expected_flavors: None,
        }
    }

    /// parser を末尾に追加する（resolve は登録順）
    pub fn register<P: ArtifactParser + 'static>(self, parser: P) -> Result<Self, RegistryError> {
        self.register_shared(Arc::new(parser))
    }

    pub fn register_shared(mut self, parser: Arc<dyn ArtifactParser>) -> Result<Self, RegistryError> {
        if self.parsers.iter().any(|p| p.flavor() == parser.flavor()) {
            return Err(RegistryError::AlreadyRegistered(parser.flavor().to_string()));
        }
        self.parsers.push(parser);
        Ok(self)
    }

    pub fn expect_flavors(mut self, flavors: &[&str]) -> Self {
        self.expected_flavors = Some(flavors.iter().map(|f| f.to_string()).collect());
        self
    }

    pub fn build(self) -> Result<StoreRegistry, BuildError> {
        if let Some(expected) = &self.expected_flavors {
            let missing: Vec<String> = expected
                .iter()
                .filter(|flavor| !self.parsers.iter().any(|p| p.flavor() == flavor.as_str()))
                .cloned()
                .collect();
            if !missing.is_empty() {
                return Err(BuildError::MissingFlavors(missing));
            }
        }
        Ok(StoreRegistry::new(self.parsers))
    }
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}
