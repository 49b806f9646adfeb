//! State - アイテムのアップロード状態と manager のモード

use serde::{Deserialize, Serialize};

use super::ids::ParentId;

/// PendingStatus は pending アセットの状態を表現
///
/// # 状態遷移
/// - Pending -> Uploading -> （commit されてキューから外れる）
/// - Pending -> Uploading -> Error（メッセージ付きでキューに残る）
///
/// `Error` から出る遷移はない。再試行するには削除して追加し直す。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingStatus {
    /// Waiting for its upload to be dispatched.
    Pending,

    /// Store call in flight.
    Uploading,

    /// Last upload failed.
    Error,
}

impl PendingStatus {
    /// Is this item eligible for dispatch?
    pub fn is_dispatchable(self) -> bool {
        matches!(self, PendingStatus::Pending)
    }
}

/// How additions are turned into store calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode", content = "parent")]
pub enum UploadMode {
    /// The parent exists: every accepted file is uploaded right away.
    Immediate(ParentId),

    /// The parent does not exist yet: files wait for `upload_all_pending`.
    Deferred,
}

impl UploadMode {
    pub fn parent(&self) -> Option<&ParentId> {
        match self {
            UploadMode::Immediate(parent) => Some(parent),
            UploadMode::Deferred => None,
        }
    }
}
