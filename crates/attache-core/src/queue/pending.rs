//! Pending queue: ordered collection of not-yet-persisted assets.
//!
//! Design:
//! - Strict insertion order; duplicate filenames are allowed (the store
//!   decides about duplicates).
//! - Ids are unique within the queue.
//! - The queue never talks to the network.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::record::PendingAsset;
use super::validator::FileValidator;
use crate::domain::{PendingId, PendingSnapshot, PendingStatus, SelectedFile, ValidationError};
use crate::ports::{IdGenerator, PreviewHandle};

/// What the upload worker needs to issue one store call.
#[derive(Debug)]
pub struct UploadTicket {
    pub id: PendingId,
    pub file: SelectedFile,
    pub seq: u64,
    pub cancel: CancellationToken,
}

pub struct PendingQueue {
    items: VecDeque<PendingAsset>,
    validator: FileValidator,
    ids: Arc<dyn IdGenerator>,
    next_seq: u64,
}

impl PendingQueue {
    pub fn new(validator: FileValidator, ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            items: VecDeque::new(),
            validator,
            ids,
            next_seq: 1,
        }
    }

    /// Validate `file` and append it at the tail.
    ///
    /// On a violation nothing is created and `preview` is never called.
    pub fn add<F>(&mut self, file: SelectedFile, preview: F) -> Result<PendingId, ValidationError>
    where
        F: FnOnce(&SelectedFile) -> Option<PreviewHandle>,
    {
        self.validator.validate(&file.descriptor())?;

        let id = self.ids.generate_pending_id();
        let handle = preview(&file);
        self.items.push_back(PendingAsset::new(id, file, handle));
        Ok(id)
    }

    /// Remove a record, aborting its upload and releasing its preview.
    pub fn remove(&mut self, id: PendingId) -> Option<PendingSnapshot> {
        let index = self.position(id)?;
        let mut record = self.items.remove(index)?;
        let was_uploading = record.cancel_upload();
        let snapshot = record.snapshot();
        record.release_preview();
        tracing::debug!(id = %id, was_uploading, "removed pending asset");
        Some(snapshot)
    }

    /// Move a `Pending` record to `Uploading`, stamping the next sequence number.
    ///
    /// Returns `None` when the record is gone or not dispatchable.
    pub fn start_upload(&mut self, id: PendingId) -> Option<UploadTicket> {
        let seq = self.next_seq;
        let record = self.get_mut(id)?;
        if !record.status().is_dispatchable() {
            return None;
        }
        let cancel = record.start_upload(seq);
        let ticket = UploadTicket {
            id,
            file: record.file().clone(),
            seq,
            cancel,
        };
        self.next_seq += 1;
        Some(ticket)
    }

    /// Record a failed upload. Returns false if the record was removed meanwhile.
    pub fn mark_error(&mut self, id: PendingId, message: String) -> bool {
        match self.get_mut(id) {
            Some(record) => {
                record.mark_error(message);
                true
            }
            None => false,
        }
    }

    /// Take a successfully uploaded record out of the queue.
    ///
    /// Its preview is released here; the committed side allocates its own.
    pub fn take_committed(&mut self, id: PendingId) -> Option<PendingSnapshot> {
        let index = self.position(id)?;
        let mut record = self.items.remove(index)?;
        record.cancel = None;
        tracing::debug!(
            id = %id,
            queued_ms = record.created_at.elapsed().as_millis() as u64,
            upload_ms = record.updated_at.elapsed().as_millis() as u64,
            "pending asset committed"
        );
        let snapshot = record.snapshot();
        record.release_preview();
        Some(snapshot)
    }

    pub fn get(&self, id: PendingId) -> Option<&PendingAsset> {
        self.items.iter().find(|record| record.id() == id)
    }

    fn get_mut(&mut self, id: PendingId) -> Option<&mut PendingAsset> {
        self.items.iter_mut().find(|record| record.id() == id)
    }

    fn position(&self, id: PendingId) -> Option<usize> {
        self.items.iter().position(|record| record.id() == id)
    }

    /// Ids in insertion order with the given status.
    pub fn ids_with_status(&self, status: PendingStatus) -> Vec<PendingId> {
        self.items
            .iter()
            .filter(|record| record.status() == status)
            .map(PendingAsset::id)
            .collect()
    }

    pub fn count(&self, status: PendingStatus) -> usize {
        self.items.iter().filter(|record| record.status() == status).count()
    }

    pub fn snapshot(&self) -> Vec<PendingSnapshot> {
        self.items.iter().map(PendingAsset::snapshot).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Drop every record, cancelling in-flight calls and releasing previews.
    pub fn clear(&mut self) {
        for mut record in self.items.drain(..) {
            record.cancel_upload();
            record.release_preview();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::InMemoryPreviewAllocator;
    use crate::ports::{PreviewAllocator, SystemClock, UlidGenerator};

    fn queue() -> PendingQueue {
        PendingQueue::new(FileValidator::default(), Arc::new(UlidGenerator::new(SystemClock)))
    }

    fn png(name: &str) -> SelectedFile {
        SelectedFile::new(name, "image/png", vec![0u8; 16])
    }

    #[test]
    fn add_appends_in_insertion_order() {
        let mut queue = queue();
        let a = queue.add(png("a.png"), |_| None).unwrap();
        let b = queue.add(png("b.png"), |_| None).unwrap();
        let a2 = queue.add(png("a.png"), |_| None).unwrap();

        let names: Vec<_> = queue.snapshot().into_iter().map(|s| s.filename).collect();
        assert_eq!(names, vec!["a.png", "b.png", "a.png"]);
        assert_eq!(queue.ids_with_status(PendingStatus::Pending), vec![a, b, a2]);
    }

    #[test]
    fn rejected_file_leaves_queue_unchanged() {
        let mut queue = queue();
        let mut preview_requested = false;
        let err = queue
            .add(SelectedFile::new("b.txt", "text/plain", vec![0u8; 1024]), |_| {
                preview_requested = true;
                None
            })
            .unwrap_err();

        assert_eq!(err.to_string(), "Unsupported file type: text/plain");
        assert!(queue.is_empty());
        assert!(!preview_requested);
    }

    #[test]
    fn start_upload_stamps_increasing_sequence() {
        let mut queue = queue();
        let a = queue.add(png("a.png"), |_| None).unwrap();
        let b = queue.add(png("b.png"), |_| None).unwrap();

        let first = queue.start_upload(a).unwrap();
        let second = queue.start_upload(b).unwrap();
        assert!(first.seq < second.seq);
        assert_eq!(queue.get(a).unwrap().status(), PendingStatus::Uploading);

        // not dispatchable twice
        assert!(queue.start_upload(a).is_none());
    }

    #[test]
    fn remove_cancels_and_releases() {
        let allocator = Arc::new(InMemoryPreviewAllocator::new());
        let mut queue = queue();
        let dyn_allocator: Arc<dyn PreviewAllocator> = allocator.clone();
        let id = queue
            .add(png("a.png"), |file| {
                Some(PreviewHandle::allocate(dyn_allocator, file.payload.clone(), &file.mime_type))
            })
            .unwrap();
        let ticket = queue.start_upload(id).unwrap();

        let removed = queue.remove(id).unwrap();
        assert_eq!(removed.filename, "a.png");
        assert!(ticket.cancel.is_cancelled());
        assert!(allocator.stats().is_balanced());
        assert!(queue.remove(id).is_none());
    }

    #[test]
    fn failed_record_keeps_preview() {
        let allocator = Arc::new(InMemoryPreviewAllocator::new());
        let mut queue = queue();
        let dyn_allocator: Arc<dyn PreviewAllocator> = allocator.clone();
        let id = queue
            .add(png("a.png"), |file| {
                Some(PreviewHandle::allocate(dyn_allocator, file.payload.clone(), &file.mime_type))
            })
            .unwrap();
        queue.start_upload(id).unwrap();
        assert!(queue.mark_error(id, "quota exceeded".to_string()));

        let record = queue.get(id).unwrap();
        assert_eq!(record.status(), PendingStatus::Error);
        assert_eq!(record.error(), Some("quota exceeded"));
        assert_eq!(allocator.stats().live, 1);

        queue.clear();
        assert!(allocator.stats().is_balanced());
    }

    #[test]
    fn committed_record_leaves_queue_without_its_preview() {
        let allocator = Arc::new(InMemoryPreviewAllocator::new());
        let mut queue = queue();
        let dyn_allocator: Arc<dyn PreviewAllocator> = allocator.clone();
        let id = queue
            .add(png("a.png"), |file| {
                Some(PreviewHandle::allocate(dyn_allocator, file.payload.clone(), &file.mime_type))
            })
            .unwrap();
        let ticket = queue.start_upload(id).unwrap();

        let snapshot = queue.take_committed(id).unwrap();
        assert_eq!(snapshot.filename, "a.png");
        assert_eq!(snapshot.upload_seq, Some(ticket.seq));
        assert!(queue.is_empty());
        assert!(allocator.stats().is_balanced());
        assert!(queue.take_committed(id).is_none());
    }
}
