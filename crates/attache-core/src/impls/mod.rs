//! Implementations of the ports for development and tests.
//!
//! - `InMemoryAssetStore`: a remote store kept in a map
//! - `InMemoryPreviewAllocator`: previews kept in a map, with allocation counters

pub mod inmem_preview;
pub mod inmem_store;

pub use self::inmem_preview::{InMemoryPreviewAllocator, PreviewStats};
pub use self::inmem_store::{InMemoryAssetStore, StoreCall};
