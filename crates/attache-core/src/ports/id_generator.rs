//! IdGenerator port - ID 生成の抽象化
//!
//! # 実装
//! - **UlidGenerator**: `Clock` のタイムスタンプ + 乱数ビットの ULID

use ulid::Ulid;

use crate::domain::ids::{PendingId, PreviewKey};
use crate::ports::Clock;

/// IdGenerator は調整なしで一意な ID を生成
///
/// # Thread Safety
/// - `Send + Sync` を要求（共有キューから使える）
pub trait IdGenerator: Send + Sync {
    fn generate_pending_id(&self) -> PendingId;

    fn generate_preview_key(&self) -> PreviewKey;
}

/// UlidGenerator は ULID ベースの ID 生成器
///
/// タイムスタンプ部分は Clock から取るので、テストで FixedClock を使えば
/// 先頭部分が決定的な ID になります。
pub struct UlidGenerator<C> {
    clock: C,
}

impl<C: Clock> UlidGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    fn next_ulid(&self) -> Ulid {
        let timestamp_ms = self.clock.now().timestamp_millis() as u64;
        Ulid::from_parts(timestamp_ms, rand::random())
    }
}

impl<C: Clock> IdGenerator for UlidGenerator<C> {
    fn generate_pending_id(&self) -> PendingId {
        PendingId::from(self.next_ulid())
    }

    fn generate_preview_key(&self) -> PreviewKey {
        PreviewKey::from(self.next_ulid())
    }
}
