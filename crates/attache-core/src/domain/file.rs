//! Local files handed to the queue.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// A file as selected by the user, payload held in memory.
///
/// Cloning is cheap: the payload is a reference-counted `Bytes`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub mime_type: String,
    pub payload: Bytes,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            payload: payload.into(),
        }
    }

    pub fn size(&self) -> u64 {
        self.payload.len() as u64
    }

    pub fn descriptor(&self) -> FileDescriptor {
        FileDescriptor {
            name: self.name.clone(),
            mime_type: self.mime_type.clone(),
            size: self.size(),
        }
    }
}

/// What the validator looks at: name, type and size, never the bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescriptor {
    pub name: String,
    pub mime_type: String,
    pub size: u64,
}

/// Coarse media family derived from a mime type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
    Document,
}

impl MediaKind {
    pub fn of(mime_type: &str) -> Self {
        let normalized = mime_type.trim().to_ascii_lowercase();
        if normalized.starts_with("image/") {
            MediaKind::Image
        } else if normalized.starts_with("video/") {
            MediaKind::Video
        } else {
            MediaKind::Document
        }
    }

    /// Pending files get a local preview only for images.
    pub fn has_local_preview(self) -> bool {
        matches!(self, MediaKind::Image)
    }

    /// Committed files are previewed from the remote store for images and video.
    pub fn has_remote_preview(self) -> bool {
        matches!(self, MediaKind::Image | MediaKind::Video)
    }
}
