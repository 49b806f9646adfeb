//! Upload configuration.
//!
//! Defaults match the remote store's limits; a host may load overrides from
//! any serde source (the CLI uses a TOML file plus environment variables).

use serde::{Deserialize, Serialize};

/// 50 MiB.
pub const DEFAULT_MAX_FILE_BYTES: u64 = 50 * 1024 * 1024;

pub const DEFAULT_ALLOWED_MIME_TYPES: [&str; 7] = [
    "image/png",
    "image/jpeg",
    "image/gif",
    "image/webp",
    "video/mp4",
    "video/webm",
    "application/pdf",
];

pub const DEFAULT_EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Largest accepted payload, inclusive.
    pub max_file_bytes: u64,

    /// Accepted mime types, compared case-insensitively.
    pub allowed_mime_types: Vec<String>,

    /// Buffer of the event broadcast channel. Slow subscribers lag past this.
    pub event_capacity: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            allowed_mime_types: DEFAULT_ALLOWED_MIME_TYPES.iter().map(|s| s.to_string()).collect(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}
