//! Domain - ドメインモデル（ids, file, asset, state, outcome, events, errors）

pub mod asset;
pub mod errors;
pub mod events;
pub mod file;
pub mod ids;
pub mod outcome;
pub mod state;

pub use asset::{CommittedAsset, PendingSnapshot};
pub use errors::{
    DeleteError, FetchPreviewError, QueueError, StoreError, UploadError, ValidationError,
};
pub use events::AssetEventKind;
pub use file::{FileDescriptor, MediaKind, SelectedFile};
pub use ids::{Id, IdMarker, ParentId, PendingId, PreviewKey};
pub use outcome::UploadOutcome;
pub use state::{PendingStatus, UploadMode};
