//! Domain model (identities, records, cache state, errors).
//!
//! - identity / record: ビルド結果の層と共有する識別子と wire 形式
//! - state: hash id ごとのキャッシュ状態
//! - errors: 呼び出し側が区別して扱うエラー分類

pub mod errors;
pub mod identity;
pub mod record;
pub mod state;

pub use self::errors::{ArtifactError, RemoteFetchError};
pub use self::identity::ArtifactIdentity;
pub use self::record::{ArtifactRecord, read_records, write_records};
pub use self::state::CacheState;
