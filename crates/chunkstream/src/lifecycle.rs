use chunkstream_store::{Batch, ChunkStore, Reply, StreamKeys};
use tracing::debug;

use crate::error::StreamResult;

/// Delete the chunk list, root record, and metadata of a stream in one batch.
///
/// Returns `Ok(true)` whenever the batch completes, including when none of
/// the records existed.
pub async fn delete_stream(store: &dyn ChunkStore, keys: &StreamKeys) -> StreamResult<bool> {
    let batch = keys
        .all()
        .into_iter()
        .fold(Batch::new(), |batch, key| batch.delete(key));
    let replies = store.exec(batch).await?;
    let removed = replies
        .iter()
        .filter(|reply| matches!(reply, Reply::Deleted(true)))
        .count();
    debug!(key = %keys.name(), removed, "stream records deleted");
    Ok(true)
}
