use async_trait::async_trait;
use bytes::Bytes;

use crate::batch::{Batch, Reply};
use crate::error::StoreResult;
use crate::key::RecordKey;

/// Minimal command contract of an ordered key-value store.
///
/// All implementations must satisfy these invariants:
/// - Scalar records and list records are distinct value types. A list
///   command on a scalar record (or the reverse) fails with
///   [`StoreError::WrongType`](crate::StoreError::WrongType).
/// - List elements keep insertion order and are addressed by index only.
/// - Reading an absent record is not an error.
/// - A [`Batch`] either returns one reply per op, in order, or fails as a
///   whole.
/// - Errors are propagated, never retried.
#[async_trait]
pub trait ChunkStore: Send + Sync {
    /// Whether a scalar record exists.
    async fn exists(&self, key: &RecordKey) -> StoreResult<bool>;

    /// Read a scalar record. Returns `Ok(None)` if unset.
    async fn get(&self, key: &RecordKey) -> StoreResult<Option<Bytes>>;

    /// Overwrite a scalar record.
    async fn set(&self, key: &RecordKey, value: Bytes) -> StoreResult<()>;

    /// Append one element to a list, creating it if absent.
    /// Returns the list length after the append.
    async fn list_append(&self, key: &RecordKey, value: Bytes) -> StoreResult<u64>;

    /// Number of elements in a list, 0 if absent.
    async fn list_length(&self, key: &RecordKey) -> StoreResult<u64>;

    /// Element at `index`, or `Ok(None)` past the end.
    async fn list_index(&self, key: &RecordKey, index: u64) -> StoreResult<Option<Bytes>>;

    /// Execute a batch of commands together.
    async fn exec(&self, batch: Batch) -> StoreResult<Vec<Reply>>;
}
