//! Errors - エラー型と分類
//!
//! # 分類
//! - `ValidationError`: キューに入る前に拒否（状態は作らない）
//! - `UploadError`: 1 アイテム単位（`PendingStatus::Error` + メッセージになる）
//! - `DeleteError` / `FetchPreviewError`: 呼び出した操作 1 回の範囲
//! - `StoreError`: store port が返すエラー（上記がラップする）

use thiserror::Error;

use super::ids::PendingId;

/// A file the queue refuses to accept.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("File too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: u64, max: u64 },
}

/// StoreError はリモート store が返すエラー
///
/// ログのために業務上の拒否と通信障害を分けているが、
/// アップロードの状態遷移ではどちらも同じに扱う。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The store answered and said no (quota, duplicate name, ...).
    #[error("{0}")]
    Rejected(String),

    /// The store could not be reached or the exchange broke down.
    #[error("transport error: {0}")]
    Transport(String),

    #[error("asset not found: {0}")]
    NotFound(String),
}

impl StoreError {
    pub fn rejected(message: impl Into<String>) -> Self {
        StoreError::Rejected(message.into())
    }

    pub fn transport(message: impl Into<String>) -> Self {
        StoreError::Transport(message.into())
    }
}

/// Outcome of a single upload attempt that did not commit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The item was removed while its call was in flight.
    #[error("upload cancelled")]
    Cancelled,
}

/// Errors from queue-level operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    #[error("no pending asset with id {0}")]
    NotFound(PendingId),

    #[error("upload worker has shut down")]
    Closed,
}

/// Removing a committed asset failed; local state is unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeleteError {
    #[error("no committed asset named {0}")]
    NotFound(String),

    #[error("no parent bound; nothing has been committed remotely")]
    NoParent,

    #[error("delete failed: {0}")]
    Store(#[from] StoreError),
}

/// Fetching preview bytes for a committed asset failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchPreviewError {
    #[error("no committed asset named {0}")]
    NotFound(String),

    #[error("preview fetch failed: {0}")]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_messages_are_user_facing() {
        assert_eq!(
            ValidationError::UnsupportedType("text/plain".to_string()).to_string(),
            "Unsupported file type: text/plain"
        );
        assert_eq!(
            ValidationError::FileTooLarge { size: 52_428_801, max: 52_428_800 }.to_string(),
            "File too large: 52428801 bytes (max: 52428800 bytes)"
        );
    }

    #[test]
    fn rejected_store_error_keeps_store_message() {
        let err = UploadError::from(StoreError::rejected("quota exceeded"));
        assert_eq!(err.to_string(), "quota exceeded");
    }
}
