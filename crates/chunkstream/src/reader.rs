use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use chunkstream_store::{ChunkStore, StreamKeys};
use futures::Stream;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::debug;

use crate::error::{StreamError, StreamResult};
use crate::options::ReadOptions;

/// Pull side of a stream session.
///
/// The chunk list length is captured on the first pull; chunks appended
/// after that are not visited. Chunks are fetched one at a time in
/// increasing index order. The first error ends the session.
pub struct StreamReader {
    store: Arc<dyn ChunkStore>,
    keys: StreamKeys,
    index: u64,
    len: Option<u64>,
    finished: bool,
}

impl StreamReader {
    pub fn new(store: Arc<dyn ChunkStore>, key: &str, options: ReadOptions) -> Self {
        Self {
            store,
            keys: StreamKeys::new(key),
            index: options.start_index,
            len: None,
            finished: false,
        }
    }

    pub fn key(&self) -> &str {
        self.keys.name()
    }

    /// Index of the next chunk to fetch.
    pub fn position(&self) -> u64 {
        self.index
    }

    /// Length captured on the first pull, if any pull happened yet.
    pub fn captured_len(&self) -> Option<u64> {
        self.len
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Fetch the next chunk. `Ok(None)` ends the sequence.
    pub async fn next_chunk(&mut self) -> StreamResult<Option<Bytes>> {
        if self.finished {
            return Ok(None);
        }

        let len = match self.len {
            Some(len) => len,
            None => {
                let fetched = self.store.list_length(&self.keys.stream).await;
                match fetched {
                    Ok(len) => {
                        self.len = Some(len);
                        len
                    }
                    Err(err) => return Err(self.fail(err.into())),
                }
            }
        };

        if self.index >= len {
            self.finished = true;
            return Ok(None);
        }

        let index = self.index;
        self.index += 1;
        let fetched = self.store.list_index(&self.keys.stream, index).await;
        match fetched {
            Ok(Some(chunk)) => Ok(Some(chunk)),
            Ok(None) => {
                // The list shrank underneath us (deleted or overwritten).
                debug!(key = %self.keys.name(), index, len, "chunk vanished, ending read");
                self.finished = true;
                Ok(None)
            }
            Err(err) => Err(self.fail(err.into())),
        }
    }

    /// Adapt into a [`Stream`] of chunks. The stream ends after the first
    /// error.
    pub fn into_stream(self) -> impl Stream<Item = StreamResult<Bytes>> + Send {
        futures::stream::unfold(Some(self), |state| async move {
            let mut reader = state?;
            match reader.next_chunk().await {
                Ok(Some(chunk)) => Some((Ok(chunk), Some(reader))),
                Ok(None) => None,
                Err(err) => Some((Err(err), None)),
            }
        })
    }

    /// Read every remaining chunk into one buffer.
    pub async fn read_to_end(&mut self) -> StreamResult<Bytes> {
        let mut buf = BytesMut::new();
        while let Some(chunk) = self.next_chunk().await? {
            buf.extend_from_slice(&chunk);
        }
        Ok(buf.freeze())
    }

    /// Write every remaining chunk to `sink`. Returns the number of bytes
    /// written.
    pub async fn copy_to<W>(&mut self, sink: &mut W) -> StreamResult<u64>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let mut total = 0u64;
        while let Some(chunk) = self.next_chunk().await? {
            sink.write_all(&chunk).await?;
            total += chunk.len() as u64;
        }
        sink.flush().await?;
        Ok(total)
    }

    fn fail(&mut self, err: StreamError) -> StreamError {
        self.finished = true;
        err
    }
}

impl std::fmt::Debug for StreamReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamReader")
            .field("key", &self.keys.name())
            .field("index", &self.index)
            .field("len", &self.len)
            .field("finished", &self.finished)
            .finish()
    }
}
