//! InputAdapter - ピッカーとドロップの入力を順序付きファイル列に変換
//!
//! 入力の正規化とドロップゾーンのハイライト状態だけを持つ。
//! 検証・プレビュー・アップロードは `AssetManager::add_files` の先で行う。

use super::orchestrator::{AddReport, AssetManager};
use crate::domain::SelectedFile;

/// ドラッグ&ドロップの 1 要素
#[derive(Debug, Clone)]
pub enum DroppedItem {
    File(SelectedFile),

    /// テキストやリンクなどファイル以外（無視する）
    Other { kind: String },
}

/// ファイルの入力元
#[derive(Debug, Clone)]
pub enum InputSource {
    Picker(Vec<SelectedFile>),
    Drop(Vec<DroppedItem>),
}

impl InputSource {
    /// Files in their original order, non-file drop items removed.
    pub fn into_files(self) -> Vec<SelectedFile> {
        match self {
            InputSource::Picker(files) => files,
            InputSource::Drop(items) => items
                .into_iter()
                .filter_map(|item| match item {
                    DroppedItem::File(file) => Some(file),
                    DroppedItem::Other { kind } => {
                        tracing::debug!(kind = %kind, "ignoring non-file drop item");
                        None
                    }
                })
                .collect(),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct InputAdapter {
    highlighted: bool,
}

impl InputAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a drag is hovering over the drop zone.
    pub fn is_highlighted(&self) -> bool {
        self.highlighted
    }

    pub fn drag_enter(&mut self) {
        self.highlighted = true;
    }

    pub fn drag_leave(&mut self) {
        self.highlighted = false;
    }

    /// Files chosen in a picker.
    pub async fn pick(&mut self, manager: &AssetManager, files: Vec<SelectedFile>) -> AddReport {
        self.submit(manager, InputSource::Picker(files)).await
    }

    /// Items dropped on the zone. Clears the highlight.
    pub async fn drop_items(&mut self, manager: &AssetManager, items: Vec<DroppedItem>) -> AddReport {
        self.submit(manager, InputSource::Drop(items)).await
    }

    pub async fn submit(&mut self, manager: &AssetManager, source: InputSource) -> AddReport {
        if matches!(source, InputSource::Drop(_)) {
            self.highlighted = false;
        }
        let files = source.into_files();
        if files.is_empty() {
            return AddReport::default();
        }
        tracing::debug!(files = files.len(), "submitting selected files");
        manager.add_files(files).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::impls::InMemoryAssetStore;

    fn file(name: &str, mime: &str) -> SelectedFile {
        SelectedFile::new(name, mime, vec![0u8; 8])
    }

    #[test]
    fn drag_toggles_highlight() {
        let mut adapter = InputAdapter::new();
        assert!(!adapter.is_highlighted());
        adapter.drag_enter();
        assert!(adapter.is_highlighted());
        adapter.drag_leave();
        assert!(!adapter.is_highlighted());
    }

    #[test]
    fn drop_keeps_file_order_and_skips_other_items() {
        let source = InputSource::Drop(vec![
            DroppedItem::File(file("b.png", "image/png")),
            DroppedItem::Other {
                kind: "text/uri-list".to_string(),
            },
            DroppedItem::File(file("a.pdf", "application/pdf")),
        ]);

        let names: Vec<_> = source.into_files().into_iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["b.png", "a.pdf"]);
    }

    #[tokio::test]
    async fn drop_feeds_manager_and_clears_highlight() {
        let store = Arc::new(InMemoryAssetStore::new());
        let manager = AssetManager::builder().store(store.clone()).build().unwrap();
        let mut adapter = InputAdapter::new();
        adapter.drag_enter();

        let report = adapter
            .drop_items(
                &manager,
                vec![
                    DroppedItem::File(file("a.png", "image/png")),
                    DroppedItem::File(file("notes.txt", "text/plain")),
                ],
            )
            .await;

        assert!(!adapter.is_highlighted());
        assert_eq!(report.accepted.len(), 1);
        assert_eq!(report.rejected[0].message, "Unsupported file type: text/plain");
        // deferred: nothing reaches the store
        assert!(store.calls().await.is_empty());
        manager.shutdown().await;
    }

    #[tokio::test]
    async fn empty_pick_adds_nothing() {
        let manager = AssetManager::builder()
            .store(Arc::new(InMemoryAssetStore::new()))
            .build()
            .unwrap();
        let mut adapter = InputAdapter::new();

        let report = adapter.pick(&manager, Vec::new()).await;
        assert_eq!(report, AddReport::default());
        assert!(manager.pending().await.is_empty());
        manager.shutdown().await;
    }
}
