//! attache-core
//!
//! Upload queue and lifecycle manager for file attachments of a parent record.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, file, asset, state, outcome, events, errors）
//! - **ports**: 抽象化レイヤー（AssetStore, PreviewAllocator, Clock, IdGenerator）
//! - **impls**: 実装（InMemoryAssetStore など開発・テスト用）
//! - **queue**: 検証、pending キュー、committed 集合
//! - **app**: アプリケーションロジック（AssetManager, builder, worker_loop, preview, events, input）
//! - **config**: アップロード上限とチャネルサイズ

pub mod app;
pub mod config;
pub mod domain;
pub mod impls;
pub mod ports;
pub mod queue;

pub use app::{AddReport, AssetEvent, AssetManager, AssetManagerBuilder, BuildError, QueueCounts};
pub use config::UploadConfig;
pub use domain::{CommittedAsset, ParentId, PendingId, PendingStatus, SelectedFile, UploadMode};
