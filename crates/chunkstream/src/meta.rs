use bytes::Bytes;
use chunkstream_store::{Batch, ChunkStore, RecordKind, Reply, StoreError, StreamKeys};
use serde::Serialize;
use serde_json::Value;

use crate::error::{StreamError, StreamResult};
use crate::record::{json_type, merge, parse_record, Metadata};

/// Replace a stream's metadata record.
///
/// Returns `Ok(false)` without writing if the stream has no root record,
/// whatever `data` is. Otherwise `data` must serialize to a JSON object
/// (`null` is stored as `{}`); the whole record is overwritten, no
/// field-level merge happens on write.
pub async fn set_meta<T>(store: &dyn ChunkStore, keys: &StreamKeys, data: &T) -> StreamResult<bool>
where
    T: Serialize + ?Sized,
{
    if !store.exists(&keys.root).await? {
        return Ok(false);
    }

    let value = match serde_json::to_value(data)? {
        Value::Null => Value::Object(Metadata::new()),
        value @ Value::Object(_) => value,
        other => return Err(StreamError::InvalidMetadata(json_type(&other).to_string())),
    };

    store
        .set(&keys.meta, Bytes::from(serde_json::to_vec(&value)?))
        .await?;
    Ok(true)
}

/// Read a stream's root record merged with its metadata record.
///
/// Existence and both records are read in one batch. Returns `Ok(None)` if
/// the root record is absent. Metadata fields override root fields of the
/// same name.
pub async fn get_meta(store: &dyn ChunkStore, keys: &StreamKeys) -> StreamResult<Option<Metadata>> {
    let replies = store
        .exec(Batch::new().exists(&keys.root).get(&keys.root).get(&keys.meta))
        .await?;

    let [exists, root, meta]: [Reply; 3] = replies
        .try_into()
        .map_err(|r: Vec<Reply>| unexpected(format!("expected 3 replies, got {}", r.len())))?;

    if !exists.as_exists().ok_or_else(|| unexpected("exists reply"))? {
        return Ok(None);
    }
    let root = root.into_value().ok_or_else(|| unexpected("root reply"))?;
    let meta = meta.into_value().ok_or_else(|| unexpected("meta reply"))?;

    let base = parse_record(RecordKind::Root, root.as_deref())?;
    let overlay = parse_record(RecordKind::Meta, meta.as_deref())?;
    Ok(Some(merge(base, overlay)))
}

fn unexpected(what: impl Into<String>) -> StreamError {
    StreamError::Store(StoreError::Command(format!(
        "unexpected batch reply: {}",
        what.into()
    )))
}
