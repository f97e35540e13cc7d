#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chunkstream::{ChunkStore, StoreError, StreamAccess};
use chunkstream_store::{Batch, InMemoryChunkStore, RecordKey, Reply, StoreResult};

/// Wraps an in-memory store and fails selected commands on demand.
#[derive(Default)]
pub struct FaultyStore {
    pub inner: InMemoryChunkStore,
    /// Fail every `list_append` whose 1-based call number is listed here.
    pub fail_appends: std::sync::Mutex<Vec<u64>>,
    pub fail_exec: AtomicBool,
    pub fail_set: AtomicBool,
    pub fail_index: AtomicBool,
    pub append_calls: AtomicU64,
    pub index_calls: AtomicU64,
}

impl FaultyStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn access(self: &Arc<Self>) -> StreamAccess {
        let store: Arc<dyn ChunkStore> = self.clone();
        StreamAccess::new(store)
    }

    fn injected(what: &str) -> StoreError {
        StoreError::Connection(format!("injected {what} failure"))
    }
}

#[async_trait]
impl ChunkStore for FaultyStore {
    async fn exists(&self, key: &RecordKey) -> StoreResult<bool> {
        self.inner.exists(key).await
    }

    async fn get(&self, key: &RecordKey) -> StoreResult<Option<Bytes>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &RecordKey, value: Bytes) -> StoreResult<()> {
        if self.fail_set.load(Ordering::SeqCst) {
            return Err(Self::injected("set"));
        }
        self.inner.set(key, value).await
    }

    async fn list_append(&self, key: &RecordKey, value: Bytes) -> StoreResult<u64> {
        let call = self.append_calls.fetch_add(1, Ordering::SeqCst) + 1;
        let fail = self
            .fail_appends
            .lock()
            .map(|calls| calls.contains(&call))
            .unwrap_or(false);
        if fail {
            return Err(Self::injected("append"));
        }
        self.inner.list_append(key, value).await
    }

    async fn list_length(&self, key: &RecordKey) -> StoreResult<u64> {
        self.inner.list_length(key).await
    }

    async fn list_index(&self, key: &RecordKey, index: u64) -> StoreResult<Option<Bytes>> {
        self.index_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_index.load(Ordering::SeqCst) {
            return Err(Self::injected("index"));
        }
        self.inner.list_index(key, index).await
    }

    async fn exec(&self, batch: Batch) -> StoreResult<Vec<Reply>> {
        if self.fail_exec.load(Ordering::SeqCst) {
            return Err(Self::injected("exec"));
        }
        self.inner.exec(batch).await
    }
}

/// Deterministic pseudo-random payload.
pub fn payload(len: usize, seed: u64) -> Vec<u8> {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    (0..len)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (state >> 33) as u8
        })
        .collect()
}
