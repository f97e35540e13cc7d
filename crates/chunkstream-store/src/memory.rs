use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::RwLock;

use crate::batch::{Batch, BatchOp, Reply};
use crate::error::{StoreError, StoreResult};
use crate::key::RecordKey;
use crate::traits::ChunkStore;

#[derive(Clone, Debug)]
enum Entry {
    Scalar(Bytes),
    List(Vec<Bytes>),
}

/// In-memory, HashMap-based chunk store.
///
/// Intended for tests and embedding. Records live behind a `RwLock`; a
/// [`Batch`] runs under a single write guard, so it is atomic with respect to
/// every other command on the same store.
pub struct InMemoryChunkStore {
    records: RwLock<HashMap<RecordKey, Entry>>,
}

impl InMemoryChunkStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Number of records currently stored (lists count once).
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Returns `true` if the store holds no records.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Remove every record.
    pub async fn clear(&self) {
        self.records.write().await.clear();
    }

    /// Sorted list of all record keys.
    pub async fn keys(&self) -> Vec<RecordKey> {
        let map = self.records.read().await;
        let mut keys: Vec<RecordKey> = map.keys().cloned().collect();
        keys.sort();
        keys
    }

    fn scalar<'a>(map: &'a HashMap<RecordKey, Entry>, key: &RecordKey) -> StoreResult<Option<&'a Bytes>> {
        match map.get(key) {
            None => Ok(None),
            Some(Entry::Scalar(value)) => Ok(Some(value)),
            Some(Entry::List(_)) => Err(StoreError::WrongType {
                key: key.clone(),
                expected: "scalar",
            }),
        }
    }

    fn list<'a>(map: &'a HashMap<RecordKey, Entry>, key: &RecordKey) -> StoreResult<Option<&'a Vec<Bytes>>> {
        match map.get(key) {
            None => Ok(None),
            Some(Entry::List(items)) => Ok(Some(items)),
            Some(Entry::Scalar(_)) => Err(StoreError::WrongType {
                key: key.clone(),
                expected: "list",
            }),
        }
    }
}

impl Default for InMemoryChunkStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChunkStore for InMemoryChunkStore {
    async fn exists(&self, key: &RecordKey) -> StoreResult<bool> {
        Ok(self.records.read().await.contains_key(key))
    }

    async fn get(&self, key: &RecordKey) -> StoreResult<Option<Bytes>> {
        let map = self.records.read().await;
        Ok(Self::scalar(&map, key)?.cloned())
    }

    async fn set(&self, key: &RecordKey, value: Bytes) -> StoreResult<()> {
        let mut map = self.records.write().await;
        map.insert(key.clone(), Entry::Scalar(value));
        Ok(())
    }

    async fn list_append(&self, key: &RecordKey, value: Bytes) -> StoreResult<u64> {
        let mut map = self.records.write().await;
        let entry = map
            .entry(key.clone())
            .or_insert_with(|| Entry::List(Vec::new()));
        match entry {
            Entry::List(items) => {
                items.push(value);
                Ok(items.len() as u64)
            }
            Entry::Scalar(_) => Err(StoreError::WrongType {
                key: key.clone(),
                expected: "list",
            }),
        }
    }

    async fn list_length(&self, key: &RecordKey) -> StoreResult<u64> {
        let map = self.records.read().await;
        Ok(Self::list(&map, key)?.map_or(0, |items| items.len() as u64))
    }

    async fn list_index(&self, key: &RecordKey, index: u64) -> StoreResult<Option<Bytes>> {
        let map = self.records.read().await;
        let Some(items) = Self::list(&map, key)? else {
            return Ok(None);
        };
        Ok(usize::try_from(index)
            .ok()
            .and_then(|i| items.get(i))
            .cloned())
    }

    async fn exec(&self, batch: Batch) -> StoreResult<Vec<Reply>> {
        let mut map = self.records.write().await;

        // Validate reads up front so a failing batch leaves no partial deletes.
        for op in batch.ops() {
            if let BatchOp::Get(key) = op {
                Self::scalar(&map, key)?;
            }
        }

        let mut replies = Vec::with_capacity(batch.len());
        for op in batch {
            let reply = match op {
                BatchOp::Exists(key) => Reply::Exists(map.contains_key(&key)),
                BatchOp::Get(key) => Reply::Value(Self::scalar(&map, &key)?.cloned()),
                BatchOp::Delete(key) => Reply::Deleted(map.remove(&key).is_some()),
            };
            replies.push(reply);
        }
        Ok(replies)
    }
}

impl std::fmt::Debug for InMemoryChunkStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.records.try_read().map(|m| m.len()).ok();
        f.debug_struct("InMemoryChunkStore")
            .field("record_count", &count)
            .finish()
    }
}
