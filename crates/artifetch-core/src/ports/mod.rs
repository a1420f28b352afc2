//! Ports - 抽象化レイヤー
//!
//! 外部システム（リモート CAS、時刻）へのインターフェースを定義します。
//! 具体的な実装は `impls` に置きます。

pub mod clock;
pub mod parser;
pub mod remote_store;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::parser::ArtifactParser;
pub use self::remote_store::{RemoteStore, StoreError};
