//! Pending asset record: file + upload state + owned preview.

use std::time::Instant;

use tokio_util::sync::CancellationToken;

use crate::domain::{PendingId, PendingSnapshot, PendingStatus, SelectedFile};
use crate::ports::PreviewHandle;

/// A file in the queue, not yet persisted.
///
/// Design:
/// - The queue holds these in insertion order; this is the only copy.
/// - State transitions happen through the methods here, never by field writes
///   from outside the queue module.
/// - The preview handle is owned by the record and released with it.
#[derive(Debug)]
pub struct PendingAsset {
    pub(crate) id: PendingId,
    pub(crate) file: SelectedFile,
    pub(crate) status: PendingStatus,
    pub(crate) error: Option<String>,
    pub(crate) preview: Option<PreviewHandle>,

    /// Set when the record enters `Uploading`; strictly increasing per queue.
    pub(crate) upload_seq: Option<u64>,

    /// Live while an upload is in flight.
    pub(crate) cancel: Option<CancellationToken>,

    pub(crate) created_at: Instant,
    pub(crate) updated_at: Instant,
}

impl PendingAsset {
    pub fn new(id: PendingId, file: SelectedFile, preview: Option<PreviewHandle>) -> Self {
        let now = Instant::now();
        Self {
            id,
            file,
            status: PendingStatus::Pending,
            error: None,
            preview,
            upload_seq: None,
            cancel: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> PendingId {
        self.id
    }

    pub fn file(&self) -> &SelectedFile {
        &self.file
    }

    pub fn status(&self) -> PendingStatus {
        self.status
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Mark as uploading and hand out the token the call runs under.
    pub fn start_upload(&mut self, seq: u64) -> CancellationToken {
        let token = CancellationToken::new();
        self.status = PendingStatus::Uploading;
        self.error = None;
        self.upload_seq = Some(seq);
        self.cancel = Some(token.clone());
        self.updated_at = Instant::now();
        token
    }

    /// Mark as failed; the record and its preview stay for inspection.
    pub fn mark_error(&mut self, message: String) {
        self.status = PendingStatus::Error;
        self.error = Some(message);
        self.cancel = None;
        self.updated_at = Instant::now();
    }

    /// Abort an in-flight call, if any.
    pub fn cancel_upload(&mut self) -> bool {
        match self.cancel.take() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Release the preview now; the record stays usable without it.
    pub fn release_preview(&mut self) {
        if let Some(preview) = self.preview.take() {
            preview.release();
        }
    }

    pub fn snapshot(&self) -> PendingSnapshot {
        PendingSnapshot {
            id: self.id,
            filename: self.file.name.clone(),
            mime_type: self.file.mime_type.clone(),
            size: self.file.size(),
            status: self.status,
            error: self.error.clone(),
            preview: self.preview.as_ref().map(PreviewHandle::key),
            upload_seq: self.upload_seq,
        }
    }
}
