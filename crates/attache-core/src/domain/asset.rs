//! Asset records as seen by callers.

use serde::{Deserialize, Serialize};

use super::ids::{PendingId, PreviewKey};
use super::state::PendingStatus;

/// An asset already persisted and attached to a parent.
///
/// `filename` is the key: unique within one parent's asset set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommittedAsset {
    pub filename: String,
    pub mime_type: String,
    pub size: u64,
}

impl CommittedAsset {
    pub fn new(filename: impl Into<String>, mime_type: impl Into<String>, size: u64) -> Self {
        Self {
            filename: filename.into(),
            mime_type: mime_type.into(),
            size,
        }
    }
}

/// Read-only view of a queued asset, without its payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingSnapshot {
    pub id: PendingId,
    pub filename: String,
    pub mime_type: String,
    pub size: u64,
    pub status: PendingStatus,
    pub error: Option<String>,

    /// Key to render the local preview with, if one is live.
    pub preview: Option<PreviewKey>,

    /// Dispatch order stamp, set when the item entered `Uploading`.
    pub upload_seq: Option<u64>,
}
