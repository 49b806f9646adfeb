//! Queue structures: validation, the pending queue and the committed set.
//!
//! Everything here is synchronous and owned by the manager's state lock;
//! the async orchestration lives in `app`.

mod committed;
mod pending;
mod record;
mod validator;

pub use committed::CommittedSet;
pub use pending::{PendingQueue, UploadTicket};
pub use record::PendingAsset;
pub use validator::FileValidator;
