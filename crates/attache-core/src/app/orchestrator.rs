//! AssetManager - アップロードのライフサイクル管理
//!
//! # モード
//! - **Immediate**: parent が存在する。受理したファイルはすぐに upload worker へ渡す。
//! - **Deferred**: `upload_all_pending(target)` が呼ばれるまで `Pending` のまま待ち、
//!   store は一度も呼ばない。
//!
//! どちらのモードも同じ単一コンシューマ（`worker_loop`）に流すので、
//! 呼び出しが重なってもアップロードは到着順に 1 件ずつ実行される。
//!
//! # ロック
//! キューと committed 集合は 1 つの `tokio::sync::Mutex` の中にある。
//! store 呼び出しの間はロックを保持しない。

use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;
use tokio::sync::{Mutex, broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use super::events::{AssetEvent, EventHub};
use super::preview::PreviewManager;
use super::status::QueueCounts;
use super::worker_loop::UploadJob;
use crate::domain::{
    AssetEventKind, CommittedAsset, DeleteError, FetchPreviewError, ParentId, PendingId,
    PendingSnapshot, PendingStatus, PreviewKey, QueueError, SelectedFile, UploadMode,
    UploadOutcome, ValidationError,
};
use crate::ports::AssetStore;
use crate::queue::{CommittedSet, PendingQueue};

pub(crate) struct ManagerState {
    pub mode: UploadMode,
    pub queue: PendingQueue,
    pub committed: CommittedSet,
}

impl ManagerState {
    pub fn counts(&self) -> QueueCounts {
        QueueCounts {
            pending: self.queue.count(PendingStatus::Pending),
            uploading: self.queue.count(PendingStatus::Uploading),
            error: self.queue.count(PendingStatus::Error),
            committed: self.committed.len(),
        }
    }
}

/// AssetManager と worker で共有する状態
pub(crate) struct Shared {
    pub state: Mutex<ManagerState>,
    pub store: Arc<dyn AssetStore>,
    pub previews: PreviewManager,
    pub events: EventHub,

    /// キュー済みまたは実行中のジョブ数
    outstanding: watch::Sender<usize>,
}

impl Shared {
    pub fn new(state: ManagerState, store: Arc<dyn AssetStore>, previews: PreviewManager, events: EventHub) -> Self {
        let (outstanding, _) = watch::channel(0);
        Self {
            state: Mutex::new(state),
            store,
            previews,
            events,
            outstanding,
        }
    }

    /// Publish an event with the counts of `state`.
    pub fn emit(&self, state: &ManagerState, kind: AssetEventKind) {
        self.events.emit(kind, state.counts());
    }

    pub fn job_queued(&self) {
        self.outstanding.send_modify(|n| *n += 1);
    }

    pub fn job_finished(&self) {
        self.outstanding.send_modify(|n| *n = n.saturating_sub(1));
    }
}

/// `add_files` が拒否したファイル
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejection {
    pub filename: String,
    pub message: String,
    #[serde(skip)]
    pub error: ValidationError,
}

/// 複数ファイル追加の結果（入力順）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AddReport {
    pub accepted: Vec<PendingId>,
    pub rejected: Vec<Rejection>,
}

/// AssetManager は 1 つの parent レコード（既存または作成予定）のアップロードキュー
///
/// # フロー
/// 1. add_files() で検証し、pending キューに積む
/// 2. immediate なら worker に即 dispatch、deferred なら upload_all_pending() まで待つ
/// 3. 成功したら committed 集合へ移し、失敗したら Error とメッセージを残す
pub struct AssetManager {
    shared: Arc<Shared>,
    jobs: mpsc::UnboundedSender<UploadJob>,
    shutdown_tx: watch::Sender<bool>,
    worker: JoinHandle<()>,
}

impl AssetManager {
    pub(crate) fn from_parts(
        shared: Arc<Shared>,
        jobs: mpsc::UnboundedSender<UploadJob>,
        shutdown_tx: watch::Sender<bool>,
        worker: JoinHandle<()>,
    ) -> Self {
        Self {
            shared,
            jobs,
            shutdown_tx,
            worker,
        }
    }

    /// Start listening to change notifications. Drop the receiver to stop.
    pub fn subscribe(&self) -> broadcast::Receiver<AssetEvent> {
        self.shared.events.subscribe()
    }

    pub async fn mode(&self) -> UploadMode {
        self.shared.state.lock().await.mode.clone()
    }

    /// Bind to an existing parent: later additions upload immediately.
    ///
    /// Items already waiting stay `Pending` until `upload_all_pending`.
    pub async fn bind_parent(&self, parent: impl Into<ParentId>) {
        let parent = parent.into();
        let mut state = self.shared.state.lock().await;
        tracing::info!(parent = %parent, "bound to parent");
        state.mode = UploadMode::Immediate(parent);
    }

    /// Validate a file and queue it.
    ///
    /// In immediate mode the upload is dispatched behind any earlier ones.
    /// A validation failure creates no state and is returned as is.
    pub async fn add_pending(&self, file: SelectedFile) -> Result<PendingId, ValidationError> {
        let filename = file.name.clone();
        let mut state = self.shared.state.lock().await;

        let id = state
            .queue
            .add(file, |file| self.shared.previews.create_local_preview(file))
            .inspect_err(|err| {
                tracing::info!(filename = %filename, error = %err, "file rejected");
            })?;
        tracing::debug!(id = %id, filename = %filename, "queued pending asset");
        self.shared.emit(
            &state,
            AssetEventKind::PendingAdded {
                id,
                filename: filename.clone(),
            },
        );

        if let UploadMode::Immediate(parent) = &state.mode {
            let job = UploadJob {
                id,
                parent: parent.clone(),
                reply: None,
            };
            if let Err(err) = self.dispatch(job) {
                tracing::warn!(id = %id, error = %err, "could not dispatch upload");
                state.queue.mark_error(id, err.to_string());
                self.shared.emit(
                    &state,
                    AssetEventKind::UploadFailed {
                        id,
                        filename,
                        error: err.to_string(),
                    },
                );
            }
        }

        Ok(id)
    }

    /// Add several files in order; rejections do not stop the rest.
    pub async fn add_files(&self, files: impl IntoIterator<Item = SelectedFile>) -> AddReport {
        let mut report = AddReport::default();
        for file in files {
            let filename = file.name.clone();
            match self.add_pending(file).await {
                Ok(id) => report.accepted.push(id),
                Err(error) => report.rejected.push(Rejection {
                    filename,
                    message: error.to_string(),
                    error,
                }),
            }
        }
        report
    }

    /// Remove a queued item, releasing its preview.
    ///
    /// A call not started yet will not start; a call in flight is aborted.
    pub async fn remove_pending(&self, id: PendingId) -> Result<PendingSnapshot, QueueError> {
        let mut state = self.shared.state.lock().await;
        let removed = state.queue.remove(id).ok_or(QueueError::NotFound(id))?;
        self.shared.emit(
            &state,
            AssetEventKind::PendingRemoved {
                id,
                filename: removed.filename.clone(),
            },
        );
        Ok(removed)
    }

    /// `Pending` のアイテムをすべて挿入順に `target` へアップロード
    ///
    /// 途中で失敗しても全件試行する。キューに失敗が 1 件もなければ `true`
    /// （呼び出し前から `Error` だったものも失敗に数える）。バッチ中に
    /// 削除されたアイテムは数えない。
    ///
    /// 結果にかかわらず、deferred の manager は最後に `target` へ束縛される。
    /// バッチ実行中に追加されたファイルはその時点で dispatch する。
    pub async fn upload_all_pending(&self, target: impl Into<ParentId>) -> bool {
        let target = target.into();

        let (ids, already_failed) = {
            let state = self.shared.state.lock().await;
            let ids = state.queue.ids_with_status(PendingStatus::Pending);
            self.shared.emit(
                &state,
                AssetEventKind::BatchStarted {
                    parent: target.clone(),
                    items: ids.len(),
                },
            );
            (ids, state.queue.count(PendingStatus::Error))
        };
        tracing::info!(parent = %target, items = ids.len(), already_failed, "batch upload started");

        let mut replies = Vec::with_capacity(ids.len());
        for id in ids {
            let (reply_tx, reply_rx) = oneshot::channel();
            let job = UploadJob {
                id,
                parent: target.clone(),
                reply: Some(reply_tx),
            };
            match self.dispatch(job) {
                Ok(()) => replies.push(reply_rx),
                Err(err) => {
                    tracing::warn!(id = %id, error = %err, "could not dispatch upload");
                    let (closed_tx, closed_rx) = oneshot::channel();
                    let _ = closed_tx.send(UploadOutcome::Failed(err.to_string()));
                    replies.push(closed_rx);
                }
            }
        }

        let mut succeeded = 0;
        let mut failed = 0;
        for reply in replies {
            let outcome = reply
                .await
                .unwrap_or_else(|_| UploadOutcome::Failed(QueueError::Closed.to_string()));
            if outcome.is_committed() {
                succeeded += 1;
            } else if outcome.is_failure() {
                failed += 1;
            }
        }

        {
            let mut state = self.shared.state.lock().await;
            if state.mode == UploadMode::Deferred {
                state.mode = UploadMode::Immediate(target.clone());
                // added while the batch ran, after its list was taken
                let late = state.queue.ids_with_status(PendingStatus::Pending);
                for id in late {
                    let job = UploadJob {
                        id,
                        parent: target.clone(),
                        reply: None,
                    };
                    if let Err(err) = self.dispatch(job) {
                        tracing::warn!(id = %id, error = %err, "could not dispatch upload");
                        state.queue.mark_error(id, err.to_string());
                    }
                }
            }
            self.shared.emit(
                &state,
                AssetEventKind::BatchFinished {
                    parent: target.clone(),
                    succeeded,
                    failed,
                },
            );
        }

        let all_ok = failed == 0 && already_failed == 0;
        tracing::info!(parent = %target, succeeded, failed, all_ok, "batch upload finished");
        all_ok
    }

    /// Wait until no upload is queued or in flight.
    pub async fn settled(&self) {
        let mut rx = self.shared.outstanding.subscribe();
        // sender lives in `shared`, which we hold
        let _ = rx.wait_for(|outstanding| *outstanding == 0).await;
    }

    /// Delete a committed asset from the store, then locally.
    ///
    /// On failure local state is untouched.
    pub async fn remove_committed(&self, filename: &str) -> Result<(), DeleteError> {
        let parent = {
            let state = self.shared.state.lock().await;
            if !state.committed.contains(filename) {
                return Err(DeleteError::NotFound(filename.to_string()));
            }
            state.mode.parent().cloned().ok_or(DeleteError::NoParent)?
        };

        self.shared
            .store
            .delete_asset(&parent, filename)
            .await
            .inspect_err(|err| {
                tracing::warn!(parent = %parent, filename = %filename, error = %err, "delete failed");
            })?;

        {
            let mut state = self.shared.state.lock().await;
            state.committed.remove(filename);
            self.shared.emit(
                &state,
                AssetEventKind::CommittedRemoved {
                    filename: filename.to_string(),
                },
            );
        }
        self.shared.previews.release_remote(filename);
        tracing::info!(parent = %parent, filename = %filename, "committed asset deleted");
        Ok(())
    }

    /// Replace the committed list (the caller's asset list changed identity).
    ///
    /// Every cached remote preview is released.
    pub async fn reset_committed(&self, assets: Vec<CommittedAsset>) {
        {
            let mut state = self.shared.state.lock().await;
            state.committed = CommittedSet::new(assets);
            let total = state.committed.len();
            self.shared.emit(&state, AssetEventKind::CommittedReset { total });
        }
        let released = self.shared.previews.clear_remote();
        tracing::debug!(released, "committed list reset");
    }

    /// Preview key for a committed image or video, fetched on first use.
    pub async fn fetch_remote_preview(&self, filename: &str) -> Result<Option<PreviewKey>, FetchPreviewError> {
        let (parent, asset) = {
            let state = self.shared.state.lock().await;
            let asset = state
                .committed
                .get(filename)
                .cloned()
                .ok_or_else(|| FetchPreviewError::NotFound(filename.to_string()))?;
            match state.mode.parent() {
                Some(parent) => (parent.clone(), asset),
                None => return Ok(None),
            }
        };
        self.shared.previews.fetch_remote_preview(&parent, &asset).await
    }

    /// Bytes behind a live preview key, pending or committed.
    pub fn preview_bytes(&self, key: PreviewKey) -> Option<Bytes> {
        self.shared.previews.bytes(key)
    }

    pub async fn pending(&self) -> Vec<PendingSnapshot> {
        self.shared.state.lock().await.queue.snapshot()
    }

    pub async fn pending_item(&self, id: PendingId) -> Option<PendingSnapshot> {
        let state = self.shared.state.lock().await;
        state.queue.get(id).map(|record| record.snapshot())
    }

    pub async fn committed(&self) -> Vec<CommittedAsset> {
        self.shared.state.lock().await.committed.list()
    }

    pub async fn counts(&self) -> QueueCounts {
        self.shared.state.lock().await.counts()
    }

    /// worker を止め、実行中のアップロードを中断し、プレビューをすべて解放
    ///
    /// キューに残ったジョブは捨てる。それを待つバッチは失敗として扱われる。
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        {
            let mut state = self.shared.state.lock().await;
            state.queue.clear();
        }
        drop(self.jobs);
        if let Err(err) = self.worker.await {
            tracing::warn!(error = %err, "upload worker ended abnormally");
        }

        let released = self.shared.previews.clear_remote();
        self.shared.outstanding.send_replace(0);
        tracing::info!(released_remote = released, "asset manager shut down");
    }

    fn dispatch(&self, job: UploadJob) -> Result<(), QueueError> {
        self.shared.job_queued();
        if self.jobs.send(job).is_err() {
            self.shared.job_finished();
            return Err(QueueError::Closed);
        }
        Ok(())
    }
}
