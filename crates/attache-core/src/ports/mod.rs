//! Ports - 外部とのインターフェース（trait による抽象化）
//!
//! - `AssetStore`: リモートのアセットサービス（add / delete / get）
//! - `PreviewAllocator`: ホスト側のローカルプレビューリソース
//! - `Clock`, `IdGenerator`: 時刻と ID（テストで差し替え可能）

pub mod asset_store;
pub mod clock;
pub mod id_generator;
pub mod preview_allocator;

pub use self::asset_store::{AddAssetRequest, AssetStore, StoredPayload};
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::preview_allocator::{PreviewAllocator, PreviewHandle};
