use std::sync::Arc;

use chunkstream_store::{ChunkStore, StreamKeys};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::StreamResult;
use crate::lifecycle::delete_stream;
use crate::meta::{get_meta, set_meta};
use crate::options::{ReadOptions, WriteOptions};
use crate::reader::StreamReader;
use crate::record::Metadata;
use crate::writer::StreamWriter;

/// Entry point for stream sessions, metadata, and deletion.
///
/// Owns a handle to the backing store; clones share that handle. Every
/// operation is keyed by a caller-chosen stream name.
#[derive(Clone)]
pub struct StreamAccess {
    store: Arc<dyn ChunkStore>,
}

impl StreamAccess {
    pub fn new(store: Arc<dyn ChunkStore>) -> Self {
        Self { store }
    }

    /// Connect to Redis with the given settings.
    #[cfg(feature = "redis")]
    pub async fn connect(config: &chunkstream_store::StoreConfig) -> StreamResult<Self> {
        let store = chunkstream_store::RedisChunkStore::connect(config).await?;
        Ok(Self::new(Arc::new(store)))
    }

    /// The underlying store handle.
    pub fn store(&self) -> &Arc<dyn ChunkStore> {
        &self.store
    }

    pub fn create_read_stream(&self, key: &str, options: ReadOptions) -> StreamReader {
        StreamReader::new(Arc::clone(&self.store), key, options)
    }

    pub fn create_write_stream(&self, key: &str, options: WriteOptions) -> StreamWriter {
        StreamWriter::new(Arc::clone(&self.store), key, options)
    }

    /// Remove chunks, root, and metadata. Always `Ok(true)` on success.
    pub async fn delete(&self, key: &str) -> StreamResult<bool> {
        delete_stream(self.store.as_ref(), &StreamKeys::new(key)).await
    }

    /// Replace the metadata record. `Ok(false)` if the stream does not exist.
    pub async fn set_meta<T>(&self, key: &str, data: &T) -> StreamResult<bool>
    where
        T: Serialize + ?Sized,
    {
        set_meta(self.store.as_ref(), &StreamKeys::new(key), data).await
    }

    /// Root record merged with metadata. `Ok(None)` if the stream does not
    /// exist.
    pub async fn get_meta(&self, key: &str) -> StreamResult<Option<Metadata>> {
        get_meta(self.store.as_ref(), &StreamKeys::new(key)).await
    }

    /// [`get_meta`](Self::get_meta) decoded into a caller type.
    pub async fn get_meta_as<T: DeserializeOwned>(&self, key: &str) -> StreamResult<Option<T>> {
        match self.get_meta(key).await? {
            Some(map) => Ok(Some(serde_json::from_value(Value::Object(map))?)),
            None => Ok(None),
        }
    }

    /// Whether the stream's root record exists.
    pub async fn exists(&self, key: &str) -> StreamResult<bool> {
        Ok(self.store.exists(&StreamKeys::new(key).root).await?)
    }

    /// Current number of chunks.
    pub async fn chunk_count(&self, key: &str) -> StreamResult<u64> {
        Ok(self.store.list_length(&StreamKeys::new(key).stream).await?)
    }
}

impl std::fmt::Debug for StreamAccess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamAccess").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chunkstream_store::InMemoryChunkStore;
    use serde::Deserialize;
    use serde_json::json;

    fn access() -> StreamAccess {
        StreamAccess::new(Arc::new(InMemoryChunkStore::new()))
    }

    #[tokio::test]
    async fn exists_tracks_root_record() {
        let access = access();
        assert!(!access.exists("k").await.unwrap());
        let mut writer = access.create_write_stream("k", WriteOptions::default());
        writer.write(&b"x"[..]).await.unwrap();
        writer.finish().await.unwrap();
        assert!(access.exists("k").await.unwrap());
        assert_eq!(access.chunk_count("k").await.unwrap(), 1);
        access.delete("k").await.unwrap();
        assert!(!access.exists("k").await.unwrap());
        assert_eq!(access.chunk_count("k").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn typed_get_meta() {
        #[derive(Deserialize)]
        struct Info {
            created: i64,
            title: String,
        }

        let access = access();
        let mut writer = access.create_write_stream("t", WriteOptions::default());
        writer.write(&b"x"[..]).await.unwrap();
        writer.finish().await.unwrap();
        access.set_meta("t", &json!({"title": "demo"})).await.unwrap();

        let info: Info = access.get_meta_as("t").await.unwrap().unwrap();
        assert_eq!(info.title, "demo");
        assert!(info.created > 0);
        assert!(access.get_meta_as::<Info>("missing").await.unwrap().is_none());
    }

    #[test]
    fn clones_share_store() {
        let a = access();
        let b = a.clone();
        assert!(Arc::ptr_eq(a.store(), b.store()));
    }
}
