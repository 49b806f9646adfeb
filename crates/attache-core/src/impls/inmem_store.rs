//! In-memory asset store (development and tests).
//!
//! Behaves like a remote store that enforces filename uniqueness per parent.
//! Failures can be scripted per filename, and an artificial latency makes
//! the suspension points observable.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::domain::{CommittedAsset, ParentId, StoreError};
use crate::ports::{AddAssetRequest, AssetStore, StoredPayload};

/// One call received by the store, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum StoreCall {
    Add { parent: ParentId, filename: String },
    Delete { parent: ParentId, filename: String },
    Get { parent: ParentId, filename: String },
}

impl StoreCall {
    pub fn filename(&self) -> &str {
        match self {
            StoreCall::Add { filename, .. }
            | StoreCall::Delete { filename, .. }
            | StoreCall::Get { filename, .. } => filename,
        }
    }
}

#[derive(Debug, Clone)]
struct StoredAsset {
    mime_type: String,
    payload: Bytes,
}

#[derive(Default)]
struct StoreState {
    assets: HashMap<ParentId, BTreeMap<String, StoredAsset>>,
    add_failures: HashMap<String, VecDeque<StoreError>>,
    delete_failures: HashMap<String, VecDeque<StoreError>>,
    get_failures: HashMap<String, VecDeque<StoreError>>,
    calls: Vec<StoreCall>,
}

impl StoreState {
    fn take_failure(failures: &mut HashMap<String, VecDeque<StoreError>>, filename: &str) -> Option<StoreError> {
        failures.get_mut(filename).and_then(VecDeque::pop_front)
    }
}

#[derive(Default)]
pub struct InMemoryAssetStore {
    state: Mutex<StoreState>,
    latency: Option<Duration>,
}

impl InMemoryAssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call sleeps this long before touching state.
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            state: Mutex::new(StoreState::default()),
            latency: Some(latency),
        }
    }

    /// Make the next `add_asset` for `filename` fail with `error`.
    pub async fn fail_next_add(&self, filename: impl Into<String>, error: StoreError) {
        let mut state = self.state.lock().await;
        state.add_failures.entry(filename.into()).or_default().push_back(error);
    }

    /// Make the next `delete_asset` for `filename` fail with `error`.
    pub async fn fail_next_delete(&self, filename: impl Into<String>, error: StoreError) {
        let mut state = self.state.lock().await;
        state.delete_failures.entry(filename.into()).or_default().push_back(error);
    }

    /// Make the next `get_asset` for `filename` fail with `error`.
    pub async fn fail_next_get(&self, filename: impl Into<String>, error: StoreError) {
        let mut state = self.state.lock().await;
        state.get_failures.entry(filename.into()).or_default().push_back(error);
    }

    /// Put an asset in place without going through `add_asset`.
    pub async fn seed(&self, parent: &ParentId, filename: impl Into<String>, mime_type: impl Into<String>, payload: Bytes) {
        let mut state = self.state.lock().await;
        state.assets.entry(parent.clone()).or_default().insert(
            filename.into(),
            StoredAsset {
                mime_type: mime_type.into(),
                payload,
            },
        );
    }

    /// Assets persisted under `parent`, ordered by filename.
    pub async fn assets(&self, parent: &ParentId) -> Vec<CommittedAsset> {
        let state = self.state.lock().await;
        state
            .assets
            .get(parent)
            .map(|assets| {
                assets
                    .iter()
                    .map(|(name, stored)| CommittedAsset::new(name.clone(), stored.mime_type.clone(), stored.payload.len() as u64))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub async fn calls(&self) -> Vec<StoreCall> {
        self.state.lock().await.calls.clone()
    }

    async fn delay(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    async fn record(&self, call: StoreCall) {
        self.state.lock().await.calls.push(call);
    }
}

#[async_trait]
impl AssetStore for InMemoryAssetStore {
    async fn add_asset(&self, request: AddAssetRequest) -> Result<CommittedAsset, StoreError> {
        self.record(StoreCall::Add {
            parent: request.parent.clone(),
            filename: request.filename.clone(),
        })
        .await;
        self.delay().await;

        let mut state = self.state.lock().await;
        if let Some(err) = StoreState::take_failure(&mut state.add_failures, &request.filename) {
            return Err(err);
        }

        let assets = state.assets.entry(request.parent.clone()).or_default();
        if assets.contains_key(&request.filename) {
            return Err(StoreError::rejected(format!("asset already exists: {}", request.filename)));
        }

        let committed = CommittedAsset::new(
            request.filename.clone(),
            request.mime_type.clone(),
            request.payload.len() as u64,
        );
        assets.insert(
            request.filename,
            StoredAsset {
                mime_type: request.mime_type,
                payload: request.payload,
            },
        );
        tracing::debug!(parent = %request.parent, filename = %committed.filename, "stored asset");
        Ok(committed)
    }

    async fn delete_asset(&self, parent: &ParentId, filename: &str) -> Result<(), StoreError> {
        self.record(StoreCall::Delete {
            parent: parent.clone(),
            filename: filename.to_string(),
        })
        .await;
        self.delay().await;

        let mut state = self.state.lock().await;
        if let Some(err) = StoreState::take_failure(&mut state.delete_failures, filename) {
            return Err(err);
        }

        state
            .assets
            .get_mut(parent)
            .and_then(|assets| assets.remove(filename))
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(filename.to_string()))
    }

    async fn get_asset(&self, parent: &ParentId, filename: &str) -> Result<StoredPayload, StoreError> {
        self.record(StoreCall::Get {
            parent: parent.clone(),
            filename: filename.to_string(),
        })
        .await;
        self.delay().await;

        let mut state = self.state.lock().await;
        if let Some(err) = StoreState::take_failure(&mut state.get_failures, filename) {
            return Err(err);
        }

        state
            .assets
            .get(parent)
            .and_then(|assets| assets.get(filename))
            .map(|stored| StoredPayload {
                payload: stored.payload.clone(),
                mime_type: stored.mime_type.clone(),
            })
            .ok_or_else(|| StoreError::NotFound(filename.to_string()))
    }
}
