//! App - アップロードのライフサイクル（アプリケーション層）
//!
//! # 構成要素
//! - **AssetManagerBuilder**: ワイヤリングと起動時検証
//! - **AssetManager**: 公開 API（追加、削除、一括アップロード、committed の削除）
//! - **WorkerLoop**: アップロードジョブの単一コンシューマ
//! - **PreviewManager**: ローカルプレビューとリモートプレビューのキャッシュ
//! - **EventHub**: 変更通知
//! - **InputAdapter**: ファイルピッカーとドラッグ&ドロップの入力

pub mod builder;
pub mod events;
pub mod input;
pub mod orchestrator;
pub mod preview;
pub mod status;
pub(crate) mod worker_loop;

pub use self::builder::{AssetManagerBuilder, BuildError};
pub use self::events::{AssetEvent, EventHub};
pub use self::input::{DroppedItem, InputAdapter, InputSource};
pub use self::orchestrator::{AddReport, AssetManager, Rejection};
pub use self::preview::PreviewManager;
pub use self::status::QueueCounts;
