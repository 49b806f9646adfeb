//! WorkerLoop - アップロード実行ループ
//!
//! # フロー
//! 1. 次のジョブを受信（immediate の追加とバッチのアイテムは同じチャネル）
//! 2. ロック下でアイテムを `Pending -> Uploading` に遷移
//! 3. store を呼び出し、アイテムの CancellationToken と競争させる
//! 4. commit（キューから外して committed 集合へ）または `Error`
//! 5. ジョブを待っているバッチがあれば返信
//!
//! 同時に実行するジョブは 1 件だけなので、アイテム N+1 の呼び出しは
//! アイテム N の呼び出しが終わるまで始まらない。

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};

use super::orchestrator::Shared;
use crate::domain::{AssetEventKind, ParentId, PendingId, UploadError, UploadOutcome};
use crate::ports::AddAssetRequest;

/// アップロード対象の 1 アイテム
#[derive(Debug)]
pub(crate) struct UploadJob {
    pub id: PendingId,
    pub parent: ParentId,

    /// バッチのアイテムだけが持つ（バッチは全返信を待つ）
    pub reply: Option<oneshot::Sender<UploadOutcome>>,
}

pub(crate) async fn worker_loop(
    shared: Arc<Shared>,
    mut jobs: mpsc::UnboundedReceiver<UploadJob>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        let job = tokio::select! {
            changed = shutdown_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                continue;
            }
            job = jobs.recv() => job,
        };

        // every sender dropped
        let Some(job) = job else {
            break;
        };

        let outcome = upload_one(&shared, job.id, &job.parent).await;
        if let Some(reply) = job.reply {
            // the batch may have been dropped by its caller
            let _ = reply.send(outcome);
        }
        shared.job_finished();
    }

    tracing::debug!("upload worker stopped");
}

/// 両モード共通の 1 アイテム分のアップロード手順
pub(crate) async fn upload_one(shared: &Shared, id: PendingId, parent: &ParentId) -> UploadOutcome {
    let ticket = {
        let mut state = shared.state.lock().await;
        let Some(ticket) = state.queue.start_upload(id) else {
            // removed before its call began, or not dispatchable any more
            return match state.queue.get(id) {
                Some(record) => {
                    tracing::debug!(id = %id, status = ?record.status(), "skipping non-dispatchable item");
                    UploadOutcome::Skipped
                }
                None => UploadOutcome::Cancelled,
            };
        };
        shared.emit(
            &state,
            AssetEventKind::UploadStarted {
                id,
                filename: ticket.file.name.clone(),
                seq: ticket.seq,
            },
        );
        ticket
    };

    tracing::info!(id = %id, parent = %parent, filename = %ticket.file.name, seq = ticket.seq, "upload started");

    let request = AddAssetRequest {
        parent: parent.clone(),
        filename: ticket.file.name.clone(),
        mime_type: ticket.file.mime_type.clone(),
        payload: ticket.file.payload.clone(),
    };

    let result = tokio::select! {
        biased;
        _ = ticket.cancel.cancelled() => Err(UploadError::Cancelled),
        added = shared.store.add_asset(request) => added.map_err(UploadError::from),
    };

    let mut state = shared.state.lock().await;
    match result {
        Ok(asset) => {
            if state.queue.take_committed(id).is_none() {
                // removed after the store answered; the store has it regardless
                tracing::warn!(id = %id, filename = %asset.filename, "item removed after it was persisted");
            }
            if state.committed.insert(asset.clone()).is_some() {
                // same filename committed again: the cached bytes are stale
                shared.previews.release_remote(&asset.filename);
            }
            shared.emit(
                &state,
                AssetEventKind::Committed {
                    id,
                    filename: asset.filename.clone(),
                },
            );
            tracing::info!(id = %id, filename = %asset.filename, "upload committed");
            UploadOutcome::Committed(asset)
        }
        Err(UploadError::Cancelled) => {
            shared.emit(
                &state,
                AssetEventKind::UploadCancelled {
                    id,
                    filename: ticket.file.name.clone(),
                },
            );
            tracing::info!(id = %id, filename = %ticket.file.name, "upload cancelled");
            UploadOutcome::Cancelled
        }
        Err(err) => {
            let message = err.to_string();
            if !state.queue.mark_error(id, message.clone()) {
                // removed while the failing call was in flight
                tracing::debug!(id = %id, error = %message, "upload of removed item failed");
                return UploadOutcome::Cancelled;
            }
            tracing::warn!(id = %id, filename = %ticket.file.name, error = %message, "upload failed");
            shared.emit(
                &state,
                AssetEventKind::UploadFailed {
                    id,
                    filename: ticket.file.name.clone(),
                    error: message.clone(),
                },
            );
            UploadOutcome::Failed(message)
        }
    }
}
