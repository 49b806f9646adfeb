//! Events - 変更通知
//!
//! pending キューと committed 集合の変更はすべて `AssetEvent` として
//! broadcast チャネルに流れる。購読者の数に制限はなく、receiver を drop
//! すれば購読解除になる。

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use super::status::QueueCounts;
use crate::domain::AssetEventKind;

/// 何が変わったかと、変更直後の件数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetEvent {
    #[serde(flatten)]
    pub kind: AssetEventKind,
    pub counts: QueueCounts,
}

#[derive(Debug, Clone)]
pub struct EventHub {
    tx: broadcast::Sender<AssetEvent>,
}

impl EventHub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AssetEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub(crate) fn emit(&self, kind: AssetEventKind, counts: QueueCounts) {
        tracing::debug!(event = kind.name(), pending = counts.pending, committed = counts.committed, "asset event");
        // no subscribers is fine
        let _ = self.tx.send(AssetEvent { kind, counts });
    }
}
