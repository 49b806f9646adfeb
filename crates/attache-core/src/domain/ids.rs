//! Domain identifiers (strongly-typed IDs).
//!
//! ## ULID + Phantom Type パターン
//! ID はすべて ULID で、共通実装はジェネリック型 `Id<T>` にまとめています。
//! `T` は実行時には使わないマーカー型で、`PendingId` を `PreviewKey` の
//! 位置に渡すとコンパイルエラーになります。
//!
//! ## ParentId
//! parent（アセットの添付先レコード）の ID は呼び出し元が持つものなので、
//! ULID ではなく不透明な文字列です。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use ulid::Ulid;

/// IdMarker は各 ID 型のマーカー trait
///
/// Display で使うプレフィックス（"pending-", "preview-"）を提供します。
pub trait IdMarker: Send + Sync + 'static {
    fn prefix() -> &'static str;
}

/// ジェネリック ID 型（ULID ベース）
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Id<T: IdMarker> {
    ulid: Ulid,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Id<T> {
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self {
            ulid,
            _marker: PhantomData,
        }
    }

    pub fn as_ulid(&self) -> Ulid {
        self.ulid
    }
}

impl<T: IdMarker> From<Ulid> for Id<T> {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl<T: IdMarker> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", T::prefix(), self.ulid)
    }
}

/// Marker for pending assets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Pending {}

impl IdMarker for Pending {
    fn prefix() -> &'static str {
        "pending-"
    }
}

/// Marker for preview handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Preview {}

impl IdMarker for Preview {
    fn prefix() -> &'static str {
        "preview-"
    }
}

/// Identifier of a queued, not yet persisted asset. Unique within a queue.
pub type PendingId = Id<Pending>;

/// Key of a live preview allocation. Non-owning; the guard owns the allocation.
pub type PreviewKey = Id<Preview>;

/// Identifier of the parent record assets are attached to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParentId(String);

impl ParentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ParentId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ParentId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for ParentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
