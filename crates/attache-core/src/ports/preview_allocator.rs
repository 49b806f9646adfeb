//! PreviewAllocator port - 一時的なプレビューリソースの抽象化
//!
//! プレビューリソースの実体（object URL, デコード済みテクスチャ, 一時ファイル）は
//! ホスト UI が決める。このクレートはバイト列から確保して解放できればよい。
//!
//! 所有権は `PreviewHandle` が持つ。確保 1 回につき handle 1 つで、
//! release または drop のときにちょうど 1 回解放される。

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;

use crate::domain::PreviewKey;

pub trait PreviewAllocator: Send + Sync {
    /// Allocate a preview resource for `payload`.
    fn allocate(&self, payload: Bytes, mime_type: &str) -> PreviewKey;

    /// Free a resource. Called at most once per key, by `PreviewHandle`.
    fn release(&self, key: PreviewKey);

    /// Bytes behind a live key, `None` once released.
    fn resolve(&self, key: PreviewKey) -> Option<Bytes>;
}

/// PreviewHandle は 1 つのプレビュー確保を所有するガード
///
/// # 所有権
/// - `Clone` しない（pending か committed のどちらか 1 レコードだけが持つ）
/// - pending から committed へ移るときはこの handle を解放し、committed 側で別に確保する
pub struct PreviewHandle {
    key: PreviewKey,
    allocator: Arc<dyn PreviewAllocator>,
}

impl PreviewHandle {
    pub fn allocate(allocator: Arc<dyn PreviewAllocator>, payload: Bytes, mime_type: &str) -> Self {
        let key = allocator.allocate(payload, mime_type);
        Self { key, allocator }
    }

    /// Non-owning key for rendering.
    pub fn key(&self) -> PreviewKey {
        self.key
    }

    pub fn bytes(&self) -> Option<Bytes> {
        self.allocator.resolve(self.key)
    }

    /// Release now instead of at end of scope.
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        self.allocator.release(self.key);
    }
}

impl fmt::Debug for PreviewHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreviewHandle").field("key", &self.key).finish()
    }
}
