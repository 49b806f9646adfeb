//! AssetStore port - リモートアセットサービスの抽象化
//!
//! 通信プロトコル（HTTP, gRPC など）は実装側の責務。
//! すべての呼び出しは失敗しうるが、panic ではなく値で失敗を返す。
//! タイムアウトとリトライも実装側で扱う。

use async_trait::async_trait;
use bytes::Bytes;

use crate::domain::{CommittedAsset, ParentId, StoreError};

/// Everything the store needs to persist one asset.
#[derive(Debug, Clone)]
pub struct AddAssetRequest {
    pub parent: ParentId,
    pub filename: String,
    pub mime_type: String,
    pub payload: Bytes,
}

/// Bytes of a persisted asset as returned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredPayload {
    pub payload: Bytes,
    pub mime_type: String,
}

/// AssetStore はアセットを parent 単位で保存
///
/// # キャンセル
/// - 呼び出し元は future を完了前に drop することがある（実行中に削除されたアップロード）
/// - その場合、実装はローカルに中途半端な状態を残さないこと
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Persist an asset under `request.parent`.
    async fn add_asset(&self, request: AddAssetRequest) -> Result<CommittedAsset, StoreError>;

    /// Remove an asset by filename.
    async fn delete_asset(&self, parent: &ParentId, filename: &str) -> Result<(), StoreError>;

    /// Fetch an asset's bytes, used for previews.
    async fn get_asset(&self, parent: &ParentId, filename: &str) -> Result<StoredPayload, StoreError>;
}
