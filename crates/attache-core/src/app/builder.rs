//! AssetManagerBuilder - AssetManager の構築とワイヤリング
//!
//! # Fail-fast 設計
//! 動かない構成は `build()` の時点で BuildError にする。
//! - store が未設定
//! - parent がないのに committed アセットが渡された
//! - upload worker を spawn する tokio ランタイムがない

use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use super::events::EventHub;
use super::orchestrator::{AssetManager, ManagerState, Shared};
use super::preview::PreviewManager;
use super::worker_loop::worker_loop;
use crate::config::UploadConfig;
use crate::domain::{CommittedAsset, ParentId, UploadMode};
use crate::impls::InMemoryPreviewAllocator;
use crate::ports::{AssetStore, IdGenerator, PreviewAllocator, SystemClock, UlidGenerator};
use crate::queue::{CommittedSet, FileValidator, PendingQueue};

/// # 使用例
/// ```ignore
/// let manager = AssetManager::builder()
///     .store(Arc::new(InMemoryAssetStore::new()))
///     .parent("T1")
///     .build()?;
/// ```
pub struct AssetManagerBuilder {
    store: Option<Arc<dyn AssetStore>>,
    allocator: Option<Arc<dyn PreviewAllocator>>,
    ids: Option<Arc<dyn IdGenerator>>,
    config: UploadConfig,
    mode: UploadMode,
    initial_assets: Vec<CommittedAsset>,
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("an asset store is required")]
    MissingStore,

    #[error("{0} initial committed assets given without a parent")]
    InitialAssetsWithoutParent(usize),

    #[error("AssetManager must be built inside a tokio runtime")]
    NoRuntime,
}

impl AssetManagerBuilder {
    pub fn new() -> Self {
        Self {
            store: None,
            allocator: None,
            ids: None,
            config: UploadConfig::default(),
            mode: UploadMode::Deferred,
            initial_assets: Vec::new(),
        }
    }

    pub fn store(mut self, store: Arc<dyn AssetStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// 未設定なら `InMemoryPreviewAllocator`
    pub fn preview_allocator(mut self, allocator: Arc<dyn PreviewAllocator>) -> Self {
        self.allocator = Some(allocator);
        self
    }

    /// 未設定ならシステム時計の `UlidGenerator`
    pub fn id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = Some(ids);
        self
    }

    pub fn config(mut self, config: UploadConfig) -> Self {
        self.config = config;
        self
    }

    /// parent が既に存在する: immediate モード
    pub fn parent(mut self, parent: impl Into<ParentId>) -> Self {
        self.mode = UploadMode::Immediate(parent.into());
        self
    }

    /// parent がまだ存在しない: deferred モード（デフォルト）
    pub fn deferred(mut self) -> Self {
        self.mode = UploadMode::Deferred;
        self
    }

    /// parent に既に添付されているアセット
    pub fn initial_assets(mut self, assets: Vec<CommittedAsset>) -> Self {
        self.initial_assets = assets;
        self
    }

    /// AssetManager を構築し、upload worker を spawn
    pub fn build(self) -> Result<AssetManager, BuildError> {
        let store = self.store.ok_or(BuildError::MissingStore)?;
        if self.mode == UploadMode::Deferred && !self.initial_assets.is_empty() {
            return Err(BuildError::InitialAssetsWithoutParent(self.initial_assets.len()));
        }
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| BuildError::NoRuntime)?;

        let allocator = self
            .allocator
            .unwrap_or_else(|| Arc::new(InMemoryPreviewAllocator::new()) as Arc<dyn PreviewAllocator>);
        let ids = self
            .ids
            .unwrap_or_else(|| Arc::new(UlidGenerator::new(SystemClock)) as Arc<dyn IdGenerator>);

        let state = ManagerState {
            mode: self.mode,
            queue: PendingQueue::new(FileValidator::from_config(&self.config), ids),
            committed: CommittedSet::new(self.initial_assets),
        };
        let previews = PreviewManager::new(allocator, Arc::clone(&store));
        let events = EventHub::new(self.config.event_capacity);
        let shared = Arc::new(Shared::new(state, store, previews, events));

        let (jobs_tx, jobs_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let worker = runtime.spawn(worker_loop(Arc::clone(&shared), jobs_rx, shutdown_rx));

        Ok(AssetManager::from_parts(shared, jobs_tx, shutdown_tx, worker))
    }
}

impl Default for AssetManagerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetManager {
    pub fn builder() -> AssetManagerBuilder {
        AssetManagerBuilder::new()
    }
}
