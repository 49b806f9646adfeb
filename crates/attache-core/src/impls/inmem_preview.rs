//! In-memory preview allocator.
//!
//! Keeps preview bytes in a map and counts every allocation and release, so
//! tests can assert that nothing leaked and nothing was released twice.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use bytes::Bytes;
use serde::Serialize;

use crate::domain::PreviewKey;
use crate::ports::{IdGenerator, PreviewAllocator, SystemClock, UlidGenerator};

/// Allocation counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PreviewStats {
    pub allocated: u64,
    pub released: u64,
    pub live: usize,

    /// Releases of a key that was not live (double release or foreign key).
    pub invalid_releases: u64,
}

impl PreviewStats {
    /// Every allocation was released exactly once.
    pub fn is_balanced(&self) -> bool {
        self.live == 0 && self.allocated == self.released && self.invalid_releases == 0
    }
}

#[derive(Default)]
struct PreviewState {
    live: HashMap<PreviewKey, Bytes>,
    allocated: u64,
    released: u64,
    invalid_releases: u64,
}

pub struct InMemoryPreviewAllocator {
    state: Mutex<PreviewState>,
    ids: Box<dyn IdGenerator>,
}

impl InMemoryPreviewAllocator {
    pub fn new() -> Self {
        Self::with_id_generator(Box::new(UlidGenerator::new(SystemClock)))
    }

    pub fn with_id_generator(ids: Box<dyn IdGenerator>) -> Self {
        Self {
            state: Mutex::new(PreviewState::default()),
            ids,
        }
    }

    pub fn stats(&self) -> PreviewStats {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        PreviewStats {
            allocated: state.allocated,
            released: state.released,
            live: state.live.len(),
            invalid_releases: state.invalid_releases,
        }
    }

    pub fn is_live(&self, key: PreviewKey) -> bool {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.live.contains_key(&key)
    }
}

impl Default for InMemoryPreviewAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl PreviewAllocator for InMemoryPreviewAllocator {
    fn allocate(&self, payload: Bytes, _mime_type: &str) -> PreviewKey {
        let key = self.ids.generate_preview_key();
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.live.insert(key, payload);
        state.allocated += 1;
        key
    }

    fn release(&self, key: PreviewKey) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.live.remove(&key).is_some() {
            state.released += 1;
        } else {
            tracing::warn!(key = %key, "release of a preview that is not live");
            state.invalid_releases += 1;
        }
    }

    fn resolve(&self, key: PreviewKey) -> Option<Bytes> {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.live.get(&key).cloned()
    }
}
