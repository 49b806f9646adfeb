//! PreviewManager - pending のローカルプレビューと committed のリモートプレビュー
//!
//! # 所有権
//! - ローカルプレビューの handle は呼び出し元に返され、ちょうど 1 つの
//!   pending レコードが持つ
//! - リモートプレビューの handle はこの manager のキャッシュ（filename がキー）が持ち、
//!   呼び出し元には `PreviewKey` だけを渡す
//! - pending と committed で handle を共有しない

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use bytes::Bytes;
use tokio::sync::OnceCell;

use crate::domain::{CommittedAsset, FetchPreviewError, MediaKind, ParentId, PreviewKey, SelectedFile};
use crate::ports::{AssetStore, PreviewAllocator, PreviewHandle};

type RemoteSlot = Arc<OnceCell<PreviewHandle>>;

pub struct PreviewManager {
    allocator: Arc<dyn PreviewAllocator>,
    store: Arc<dyn AssetStore>,
    remote: Mutex<HashMap<String, RemoteSlot>>,
}

impl PreviewManager {
    pub fn new(allocator: Arc<dyn PreviewAllocator>, store: Arc<dyn AssetStore>) -> Self {
        Self {
            allocator,
            store,
            remote: Mutex::new(HashMap::new()),
        }
    }

    /// Allocate a preview from in-memory bytes. Images only.
    pub fn create_local_preview(&self, file: &SelectedFile) -> Option<PreviewHandle> {
        if !MediaKind::of(&file.mime_type).has_local_preview() {
            return None;
        }
        Some(PreviewHandle::allocate(
            Arc::clone(&self.allocator),
            file.payload.clone(),
            &file.mime_type,
        ))
    }

    /// committed の画像・動画のプレビュー（初回だけ取得してキャッシュ）
    ///
    /// リモートプレビューを持たない種類は `Ok(None)`。取得に失敗した場合は
    /// 何もキャッシュしないので、次の呼び出しで再取得する。
    pub async fn fetch_remote_preview(
        &self,
        parent: &ParentId,
        asset: &CommittedAsset,
    ) -> Result<Option<PreviewKey>, FetchPreviewError> {
        if !MediaKind::of(&asset.mime_type).has_remote_preview() {
            return Ok(None);
        }

        let slot = {
            let mut remote = self.remote.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(remote.entry(asset.filename.clone()).or_default())
        };

        let handle = slot
            .get_or_try_init(|| async {
                tracing::debug!(parent = %parent, filename = %asset.filename, "fetching remote preview");
                let stored = self.store.get_asset(parent, &asset.filename).await?;
                Ok::<_, FetchPreviewError>(PreviewHandle::allocate(
                    Arc::clone(&self.allocator),
                    stored.payload,
                    &stored.mime_type,
                ))
            })
            .await
            .inspect_err(|err| {
                tracing::warn!(parent = %parent, filename = %asset.filename, error = %err, "remote preview fetch failed");
            })?;
        let key = handle.key();

        // released or reset while the fetch was in flight: the handle dies with `slot`
        let current = {
            let remote = self.remote.lock().unwrap_or_else(PoisonError::into_inner);
            remote.get(&asset.filename).is_some_and(|cached| Arc::ptr_eq(cached, &slot))
        };
        Ok(current.then_some(key))
    }

    /// Drop the cached remote preview of one asset.
    pub fn release_remote(&self, filename: &str) -> bool {
        let slot = {
            let mut remote = self.remote.lock().unwrap_or_else(PoisonError::into_inner);
            remote.remove(filename)
        };
        slot.is_some_and(|slot| slot.initialized())
    }

    /// Drop every cached remote preview (asset list replaced, or teardown).
    pub fn clear_remote(&self) -> usize {
        let drained: Vec<RemoteSlot> = {
            let mut remote = self.remote.lock().unwrap_or_else(PoisonError::into_inner);
            remote.drain().map(|(_, slot)| slot).collect()
        };
        drained.iter().filter(|slot| slot.initialized()).count()
    }

    /// Number of remote previews currently cached.
    pub fn remote_count(&self) -> usize {
        let remote = self.remote.lock().unwrap_or_else(PoisonError::into_inner);
        remote.values().filter(|slot| slot.initialized()).count()
    }

    /// Bytes behind a live preview key.
    pub fn bytes(&self, key: PreviewKey) -> Option<Bytes> {
        self.allocator.resolve(key)
    }
}
