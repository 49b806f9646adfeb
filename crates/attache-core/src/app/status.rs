//! Status - キューの件数

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueCounts {
    pub pending: usize,
    pub uploading: usize,
    pub error: usize,
    pub committed: usize,
}

impl QueueCounts {
    /// Anything still in the queue, whatever its status.
    pub fn queued(&self) -> usize {
        self.pending + self.uploading + self.error
    }

    /// Are there files the user added that are not persisted yet?
    pub fn has_unsaved(&self) -> bool {
        self.queued() > 0
    }
}
