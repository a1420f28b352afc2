//! Registry - リモートバックエンドの登録と record の解決
//!
//! プラグイン探索の代わりに、起動時に明示的に parser を登録する。

pub mod builder;
pub mod store_registry;

pub use self::builder::{BuildError, RegistryBuilder, RegistryError};
pub use self::store_registry::{ResolveReport, StoreRegistry};
