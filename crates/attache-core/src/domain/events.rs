//! Events - ドメインイベント（pending キューと committed 集合の変更）

use serde::{Deserialize, Serialize};

use super::ids::{ParentId, PendingId};

/// One mutation of the pending queue or of the committed set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AssetEventKind {
    PendingAdded { id: PendingId, filename: String },
    PendingRemoved { id: PendingId, filename: String },
    UploadStarted { id: PendingId, filename: String, seq: u64 },
    UploadFailed { id: PendingId, filename: String, error: String },
    UploadCancelled { id: PendingId, filename: String },
    Committed { id: PendingId, filename: String },
    CommittedRemoved { filename: String },
    CommittedReset { total: usize },
    BatchStarted { parent: ParentId, items: usize },
    BatchFinished { parent: ParentId, succeeded: usize, failed: usize },
}

impl AssetEventKind {
    /// Short name used in log fields.
    pub fn name(&self) -> &'static str {
        match self {
            AssetEventKind::PendingAdded { .. } => "pending_added",
            AssetEventKind::PendingRemoved { .. } => "pending_removed",
            AssetEventKind::UploadStarted { .. } => "upload_started",
            AssetEventKind::UploadFailed { .. } => "upload_failed",
            AssetEventKind::UploadCancelled { .. } => "upload_cancelled",
            AssetEventKind::Committed { .. } => "committed",
            AssetEventKind::CommittedRemoved { .. } => "committed_removed",
            AssetEventKind::CommittedReset { .. } => "committed_reset",
            AssetEventKind::BatchStarted { .. } => "batch_started",
            AssetEventKind::BatchFinished { .. } => "batch_finished",
        }
    }
}
