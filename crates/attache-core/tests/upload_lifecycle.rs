//! Upload lifecycle against the in-memory store: both modes, partial
//! failure, ordering, removal and overlapping batches.

use std::sync::Arc;
use std::time::Duration;

use attache_core::domain::{AssetEventKind, StoreError};
use attache_core::impls::{InMemoryAssetStore, StoreCall};
use attache_core::{AssetEvent, AssetManager, ParentId, PendingStatus, SelectedFile, UploadMode};
use rstest::rstest;
use tokio::sync::broadcast;

fn png(name: &str, size: usize) -> SelectedFile {
    SelectedFile::new(name, "image/png", vec![7u8; size])
}

fn immediate(store: &Arc<InMemoryAssetStore>, parent: &str) -> AssetManager {
    AssetManager::builder().store(store.clone()).parent(parent).build().unwrap()
}

fn deferred(store: &Arc<InMemoryAssetStore>) -> AssetManager {
    AssetManager::builder().store(store.clone()).build().unwrap()
}

fn drain(rx: &mut broadcast::Receiver<AssetEvent>) -> Vec<AssetEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn added(calls: &[StoreCall]) -> Vec<String> {
    calls
        .iter()
        .filter(|call| matches!(call, StoreCall::Add { .. }))
        .map(|call| call.filename().to_string())
        .collect()
}

#[tokio::test]
async fn immediate_mode_uploads_valid_files_and_rejects_the_rest() {
    let store = Arc::new(InMemoryAssetStore::new());
    let manager = immediate(&store, "T1");

    let report = manager
        .add_files(vec![
            png("a.png", 1024 * 1024),
            SelectedFile::new("b.txt", "text/plain", vec![0u8; 1024]),
        ])
        .await;
    manager.settled().await;

    assert_eq!(report.accepted.len(), 1);
    assert_eq!(report.rejected.len(), 1);
    assert_eq!(report.rejected[0].filename, "b.txt");
    assert_eq!(report.rejected[0].message, "Unsupported file type: text/plain");

    assert!(manager.pending().await.is_empty());
    let committed: Vec<_> = manager.committed().await.into_iter().map(|a| a.filename).collect();
    assert_eq!(committed, vec!["a.png"]);
    assert_eq!(added(&store.calls().await), vec!["a.png"]);

    manager.shutdown().await;
}

#[tokio::test]
async fn deferred_batch_keeps_failed_item_with_its_message() {
    let store = Arc::new(InMemoryAssetStore::new());
    store.fail_next_add("a.png", StoreError::rejected("quota exceeded")).await;
    let manager = deferred(&store);

    manager.add_files(vec![png("a.png", 64), png("b.png", 64)]).await;
    assert!(store.calls().await.is_empty());

    let all_ok = manager.upload_all_pending("T2").await;
    assert!(!all_ok);

    let pending = manager.pending().await;
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].filename, "a.png");
    assert_eq!(pending[0].status, PendingStatus::Error);
    assert_eq!(pending[0].error.as_deref(), Some("quota exceeded"));

    let committed: Vec<_> = manager.committed().await.into_iter().map(|a| a.filename).collect();
    assert_eq!(committed, vec!["b.png"]);

    manager.shutdown().await;
}

#[tokio::test]
async fn immediate_mode_commits_successes_and_keeps_failures() {
    let store = Arc::new(InMemoryAssetStore::new());
    store.fail_next_add("f1.png", StoreError::transport("connection reset")).await;
    store.fail_next_add("f3.png", StoreError::rejected("quota exceeded")).await;
    let manager = immediate(&store, "T1");

    let files: Vec<_> = (0..5).map(|i| png(&format!("f{i}.png"), 32)).collect();
    manager.add_files(files).await;
    manager.settled().await;

    assert_eq!(manager.committed().await.len(), 3);
    let pending = manager.pending().await;
    let failed: Vec<_> = pending.iter().map(|p| p.filename.as_str()).collect();
    assert_eq!(failed, vec!["f1.png", "f3.png"]);
    assert!(pending.iter().all(|p| p.status == PendingStatus::Error));
    assert_eq!(pending[0].error.as_deref(), Some("transport error: connection reset"));

    manager.shutdown().await;
}

#[rstest]
#[case::all_succeed(&[], true)]
#[case::first_fails(&["f0.png"], false)]
#[case::last_fails(&["f3.png"], false)]
#[tokio::test]
async fn deferred_batch_attempts_every_item_once(#[case] failing: &[&str], #[case] expected: bool) {
    let store = Arc::new(InMemoryAssetStore::new());
    for name in failing {
        store.fail_next_add(*name, StoreError::rejected("nope")).await;
    }
    let manager = deferred(&store);
    let names: Vec<_> = (0..4).map(|i| format!("f{i}.png")).collect();
    manager.add_files(names.iter().map(|n| png(n, 16))).await;

    assert_eq!(manager.upload_all_pending("T1").await, expected);

    assert_eq!(added(&store.calls().await), names);
    assert_eq!(manager.committed().await.len(), names.len() - failing.len());
    assert_eq!(manager.counts().await.error, failing.len());

    manager.shutdown().await;
}

#[tokio::test]
async fn items_already_failed_make_the_next_batch_fail() {
    let store = Arc::new(InMemoryAssetStore::new());
    store.fail_next_add("a.png", StoreError::rejected("quota exceeded")).await;
    let manager = deferred(&store);
    manager.add_pending(png("a.png", 8)).await.unwrap();
    assert!(!manager.upload_all_pending("T1").await);

    // bound to T1 now: new items upload on their own
    assert_eq!(manager.mode().await, UploadMode::Immediate(ParentId::from("T1")));
    manager.add_pending(png("b.png", 8)).await.unwrap();
    manager.settled().await;
    assert_eq!(manager.committed().await.len(), 1);

    // a.png is still in Error and is not retried
    assert!(!manager.upload_all_pending("T1").await);
    assert_eq!(added(&store.calls().await), vec!["a.png", "b.png"]);

    manager.shutdown().await;
}

#[tokio::test]
async fn file_added_during_deferred_batch_uploads_once_bound() {
    let store = Arc::new(InMemoryAssetStore::with_latency(Duration::from_millis(100)));
    let manager = deferred(&store);
    manager.add_pending(png("a.png", 8)).await.unwrap();

    let (all_ok, late) = tokio::join!(manager.upload_all_pending("T1"), async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        manager.add_pending(png("late.png", 8)).await
    });
    late.unwrap();
    manager.settled().await;

    assert!(all_ok);
    assert_eq!(manager.mode().await, UploadMode::Immediate(ParentId::from("T1")));
    assert!(manager.pending().await.is_empty());
    assert_eq!(added(&store.calls().await), vec!["a.png", "late.png"]);
    let committed: Vec<_> = manager.committed().await.into_iter().map(|a| a.filename).collect();
    assert_eq!(committed, vec!["a.png", "late.png"]);

    manager.shutdown().await;
}

#[tokio::test]
async fn uploads_start_in_input_order() {
    let store = Arc::new(InMemoryAssetStore::new());
    let manager = deferred(&store);
    let mut rx = manager.subscribe();

    let names = ["c.png", "a.png", "b.png", "a.png"];
    manager.add_files(names.iter().map(|n| png(n, 8))).await;
    store.fail_next_add("a.png", StoreError::rejected("asset already exists: a.png")).await;
    manager.upload_all_pending("T1").await;

    let started: Vec<(String, u64)> = drain(&mut rx)
        .into_iter()
        .filter_map(|event| match event.kind {
            AssetEventKind::UploadStarted { filename, seq, .. } => Some((filename, seq)),
            _ => None,
        })
        .collect();

    let filenames: Vec<_> = started.iter().map(|(f, _)| f.as_str()).collect();
    assert_eq!(filenames, names);
    assert!(started.windows(2).all(|w| w[0].1 < w[1].1));

    manager.shutdown().await;
}

#[tokio::test]
async fn removing_before_the_call_prevents_it() {
    let store = Arc::new(InMemoryAssetStore::with_latency(Duration::from_millis(50)));
    let manager = deferred(&store);
    manager.add_pending(png("a.png", 8)).await.unwrap();
    let b = manager.add_pending(png("b.png", 8)).await.unwrap();

    let (all_ok, removed) = tokio::join!(manager.upload_all_pending("T1"), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        manager.remove_pending(b).await
    });

    assert!(all_ok);
    assert_eq!(removed.unwrap().filename, "b.png");
    assert_eq!(added(&store.calls().await), vec!["a.png"]);
    assert!(manager.pending().await.is_empty());

    manager.shutdown().await;
}

#[tokio::test]
async fn removing_during_the_call_aborts_it() {
    let store = Arc::new(InMemoryAssetStore::with_latency(Duration::from_millis(200)));
    let manager = deferred(&store);
    let mut rx = manager.subscribe();
    let a = manager.add_pending(png("a.png", 8)).await.unwrap();

    let (all_ok, removed) = tokio::join!(manager.upload_all_pending("T1"), async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        manager.remove_pending(a).await
    });

    assert!(all_ok);
    assert_eq!(removed.unwrap().status, PendingStatus::Uploading);
    assert!(manager.committed().await.is_empty());
    assert!(store.assets(&ParentId::from("T1")).await.is_empty());
    assert!(
        drain(&mut rx)
            .iter()
            .any(|event| matches!(event.kind, AssetEventKind::UploadCancelled { .. }))
    );

    manager.shutdown().await;
}

#[tokio::test]
async fn overlapping_additions_upload_one_at_a_time() {
    let store = Arc::new(InMemoryAssetStore::with_latency(Duration::from_millis(10)));
    let manager = immediate(&store, "T1");
    let mut rx = manager.subscribe();

    tokio::join!(
        manager.add_files(vec![png("a.png", 8), png("b.png", 8)]),
        manager.add_files(vec![png("c.png", 8), png("d.png", 8)]),
    );
    manager.settled().await;

    let events = drain(&mut rx);
    assert!(events.iter().all(|event| event.counts.uploading <= 1));

    // every start is followed by its own commit before the next start
    let lifecycle: Vec<_> = events
        .iter()
        .filter_map(|event| match &event.kind {
            AssetEventKind::UploadStarted { filename, .. } => Some(format!("start {filename}")),
            AssetEventKind::Committed { filename, .. } => Some(format!("commit {filename}")),
            _ => None,
        })
        .collect();
    assert_eq!(lifecycle.len(), 8);
    for pair in lifecycle.chunks(2) {
        assert_eq!(pair[0].replace("start", "commit"), pair[1]);
    }
    assert_eq!(manager.committed().await.len(), 4);

    manager.shutdown().await;
}

#[tokio::test]
async fn counts_track_unsaved_uploads() {
    let store = Arc::new(InMemoryAssetStore::new());
    let manager = deferred(&store);
    let mut rx = manager.subscribe();

    manager.add_pending(png("a.png", 8)).await.unwrap();
    assert!(manager.counts().await.has_unsaved());

    assert!(manager.upload_all_pending("T1").await);
    assert!(!manager.counts().await.has_unsaved());

    let names: Vec<_> = drain(&mut rx).iter().map(|event| event.kind.name()).collect();
    assert_eq!(
        names,
        vec!["pending_added", "batch_started", "upload_started", "committed", "batch_finished"]
    );

    manager.shutdown().await;
}

#[tokio::test]
async fn oversized_file_is_rejected_with_size_message() {
    let store = Arc::new(InMemoryAssetStore::new());
    let manager = deferred(&store);

    let err = manager
        .add_pending(SelectedFile::new("big.mp4", "video/mp4", vec![0u8; 52_428_801]))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "File too large: 52428801 bytes (max: 52428800 bytes)");
    assert!(manager.pending().await.is_empty());

    manager.shutdown().await;
}
