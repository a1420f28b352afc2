//! artifetch-core
//!
//! リモートキャッシュ上にあるビルド成果物を、必要になったときだけ
//! 安全にメモリへ取り込むためのクライアント。
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ArtifactIdentity, ArtifactRecord, CacheState, errors）
//! - **ports**: 抽象化レイヤー（RemoteStore, ArtifactParser, Clock）
//! - **registry**: parser の登録と record の解決（StoreRegistry, RegistryBuilder）
//! - **cache**: PrefetchCache, ArtifactReader
//! - **impls**: 実装（InMemoryRemoteStore, LocalDirStore, TimeoutStore, PrefixParser）
//!
//! # 流れ
//! record → `StoreRegistry::resolve` → `RemoteArtifact` → `prefetch` → `open_stream` / `copy_to`

pub mod artifact;
pub mod cache;
pub mod domain;
pub mod impls;
pub mod ports;
pub mod registry;

pub use self::artifact::RemoteArtifact;
pub use self::cache::{ArtifactReader, CacheConfig, CacheStats, PrefetchCache, PrefetchHandle};
pub use self::domain::{ArtifactError, ArtifactIdentity, ArtifactRecord, CacheState, RemoteFetchError};
pub use self::registry::{RegistryBuilder, StoreRegistry};
