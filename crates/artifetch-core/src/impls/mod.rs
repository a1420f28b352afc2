//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **InMemoryRemoteStore**: 開発用・テスト用（fetch 回数のカウント付き）
//! - **LocalDirStore**: ディレクトリを CAS として読む
//! - **TimeoutStore**: 任意のストアに fetch 期限を付ける
//! - **PrefixParser**: id の prefix で record を claim する

pub mod inmem_store;
pub mod local_dir;
pub mod prefix_parser;
pub mod timeout;

pub use self::inmem_store::InMemoryRemoteStore;
pub use self::local_dir::LocalDirStore;
pub use self::prefix_parser::PrefixParser;
pub use self::timeout::TimeoutStore;
