//! Per-item upload outcome.
//!
//! Used to report how each item of a batch ended without re-reading the queue.

use serde::{Deserialize, Serialize};

use super::asset::CommittedAsset;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum UploadOutcome {
    /// Persisted; the item left the queue and joined the committed set.
    Committed(CommittedAsset),

    /// The store call failed; the item stays queued with this message.
    Failed(String),

    /// The item was removed before or during its call.
    Cancelled,

    /// The item was not dispatchable (already failed or uploading).
    Skipped,
}

impl UploadOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, UploadOutcome::Committed(_))
    }

    /// Does this outcome make a batch unsuccessful?
    ///
    /// Items the user removed are no longer part of the batch.
    pub fn is_failure(&self) -> bool {
        matches!(self, UploadOutcome::Failed(_) | UploadOutcome::Skipped)
    }
}
