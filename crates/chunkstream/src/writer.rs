use std::pin::Pin;
use std::sync::Arc;
use std::task::{ready, Context, Poll};

use bytes::Bytes;
use chunkstream_store::{ChunkStore, StreamKeys};
use futures::future::{poll_fn, BoxFuture};
use futures::Sink;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, warn};

use crate::error::{StreamError, StreamResult};
use crate::lifecycle::delete_stream;
use crate::options::WriteOptions;
use crate::record::RootRecord;

/// Buffer size used by [`StreamWriter::copy_from`] when none is given.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Totals for a finished write session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WriteSummary {
    /// Chunks acknowledged by the store.
    pub chunks: u64,
    /// Bytes across acknowledged chunks.
    pub bytes: u64,
    /// Appends that failed and were skipped (tolerant mode only).
    pub failed_appends: u64,
}

/// What the first chunk of a session does before appending.
#[derive(Clone, Copy, Debug)]
enum SessionStart {
    /// Delete prior records, then write a fresh root.
    Replace,
    /// Keep prior records, write a root only if none exists.
    Extend,
}

struct AppendOutcome {
    bytes: u64,
    appended: bool,
}

/// Push side of a stream session.
///
/// Chunks are appended in call order, one store round-trip at a time, so
/// the chunk list reproduces input order. Empty chunks are skipped without
/// touching the store.
///
/// The writer also implements [`Sink<Bytes>`]: `poll_ready` resolves only
/// once the previous chunk has been acknowledged.
pub struct StreamWriter {
    store: Arc<dyn ChunkStore>,
    keys: StreamKeys,
    options: WriteOptions,
    started: bool,
    aborted: bool,
    summary: WriteSummary,
    pending: Option<BoxFuture<'static, StreamResult<AppendOutcome>>>,
}

impl StreamWriter {
    pub fn new(store: Arc<dyn ChunkStore>, key: &str, options: WriteOptions) -> Self {
        Self {
            store,
            keys: StreamKeys::new(key),
            options,
            started: false,
            aborted: false,
            summary: WriteSummary::default(),
            pending: None,
        }
    }

    pub fn key(&self) -> &str {
        self.keys.name()
    }

    pub fn options(&self) -> WriteOptions {
        self.options
    }

    /// Totals so far. Excludes an append that is still in flight.
    pub fn summary(&self) -> WriteSummary {
        self.summary
    }

    /// Append one chunk and wait for the store to acknowledge it.
    ///
    /// The first non-empty chunk of the session also prepares the stream
    /// (see [`WriteOptions::append`]). A failure while preparing aborts the
    /// session, and the chunk is not appended.
    pub async fn write(&mut self, chunk: impl Into<Bytes>) -> StreamResult<()> {
        self.flush().await?;
        self.enqueue(chunk.into())?;
        self.flush().await
    }

    /// Wait for any in-flight append.
    pub async fn flush(&mut self) -> StreamResult<()> {
        poll_fn(|cx| self.poll_pending(cx)).await
    }

    /// Wait for outstanding appends and return the session totals.
    pub async fn finish(mut self) -> StreamResult<WriteSummary> {
        self.flush().await?;
        debug!(
            key = %self.keys.name(),
            chunks = self.summary.chunks,
            bytes = self.summary.bytes,
            failed = self.summary.failed_appends,
            "write session finished"
        );
        Ok(self.summary)
    }

    /// Read `source` to the end, appending every read as one chunk of at
    /// most `chunk_size` bytes (0 selects [`DEFAULT_CHUNK_SIZE`]). Returns
    /// the number of bytes read.
    pub async fn copy_from<R>(&mut self, mut source: R, chunk_size: usize) -> StreamResult<u64>
    where
        R: AsyncRead + Unpin,
    {
        let chunk_size = if chunk_size == 0 {
            DEFAULT_CHUNK_SIZE
        } else {
            chunk_size
        };
        let mut buf = vec![0u8; chunk_size];
        let mut total = 0u64;
        loop {
            let n = source.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            total += n as u64;
            self.write(Bytes::copy_from_slice(&buf[..n])).await?;
        }
        Ok(total)
    }

    fn enqueue(&mut self, chunk: Bytes) -> StreamResult<()> {
        if self.aborted {
            return Err(StreamError::WriterAborted);
        }
        if chunk.is_empty() {
            return Ok(());
        }

        let start = if self.started {
            None
        } else if self.options.append {
            Some(SessionStart::Extend)
        } else {
            Some(SessionStart::Replace)
        };
        self.started = true;

        let store = Arc::clone(&self.store);
        let keys = self.keys.clone();
        let strict = self.options.strict_appends;
        let append: BoxFuture<'static, StreamResult<AppendOutcome>> = Box::pin(async move {
            if let Some(start) = start {
                begin_session(store.as_ref(), &keys, start).await?;
            }
            let bytes = chunk.len() as u64;
            match store.list_append(&keys.stream, chunk).await {
                Ok(_) => Ok(AppendOutcome {
                    bytes,
                    appended: true,
                }),
                Err(err) if !strict => {
                    warn!(key = %keys.name(), error = %err, "chunk append failed, continuing");
                    Ok(AppendOutcome {
                        bytes,
                        appended: false,
                    })
                }
                Err(err) => Err(err.into()),
            }
        });
        self.pending = Some(append);
        Ok(())
    }

    fn poll_pending(&mut self, cx: &mut Context<'_>) -> Poll<StreamResult<()>> {
        if let Some(pending) = self.pending.as_mut() {
            let outcome = ready!(pending.as_mut().poll(cx));
            self.pending = None;
            match outcome {
                Ok(AppendOutcome { bytes, appended: true }) => {
                    self.summary.chunks += 1;
                    self.summary.bytes += bytes;
                }
                Ok(AppendOutcome { appended: false, .. }) => {
                    self.summary.failed_appends += 1;
                }
                Err(err) => {
                    self.aborted = true;
                    return Poll::Ready(Err(err));
                }
            }
        }
        if self.aborted {
            return Poll::Ready(Err(StreamError::WriterAborted));
        }
        Poll::Ready(Ok(()))
    }
}

async fn begin_session(
    store: &dyn ChunkStore,
    keys: &StreamKeys,
    start: SessionStart,
) -> StreamResult<()> {
    match start {
        SessionStart::Replace => {
            delete_stream(store, keys).await?;
            store.set(&keys.root, RootRecord::now().to_bytes()?).await?;
            debug!(key = %keys.name(), "stream replaced");
        }
        SessionStart::Extend => {
            if !store.exists(&keys.root).await? {
                store.set(&keys.root, RootRecord::now().to_bytes()?).await?;
                debug!(key = %keys.name(), "stream created for append");
            }
        }
    }
    Ok(())
}

impl Sink<Bytes> for StreamWriter {
    type Error = StreamError;

    fn poll_ready(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<StreamResult<()>> {
        self.get_mut().poll_pending(cx)
    }

    fn start_send(self: Pin<&mut Self>, item: Bytes) -> StreamResult<()> {
        self.get_mut().enqueue(item)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<StreamResult<()>> {
        self.get_mut().poll_pending(cx)
    }

    fn poll_close(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<StreamResult<()>> {
        self.get_mut().poll_pending(cx)
    }
}

impl std::fmt::Debug for StreamWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamWriter")
            .field("key", &self.keys.name())
            .field("options", &self.options)
            .field("started", &self.started)
            .field("aborted", &self.aborted)
            .field("summary", &self.summary)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chunkstream_store::InMemoryChunkStore;
    use futures::SinkExt;

    fn setup() -> (Arc<InMemoryChunkStore>, Arc<dyn ChunkStore>) {
        let mem = Arc::new(InMemoryChunkStore::new());
        let store: Arc<dyn ChunkStore> = mem.clone();
        (mem, store)
    }

    async fn chunks(store: &InMemoryChunkStore, key: &str) -> Vec<Bytes> {
        let keys = StreamKeys::new(key);
        let len = store.list_length(&keys.stream).await.unwrap();
        let mut out = Vec::new();
        for i in 0..len {
            out.push(store.list_index(&keys.stream, i).await.unwrap().unwrap());
        }
        out
    }

    #[tokio::test]
    async fn writes_chunks_in_order() {
        let (mem, store) = setup();
        let mut writer = StreamWriter::new(store, "w", WriteOptions::default());
        writer.write(&b"alpha"[..]).await.unwrap();
        writer.write(&b"beta"[..]).await.unwrap();
        let summary = writer.finish().await.unwrap();

        assert_eq!(summary.chunks, 2);
        assert_eq!(summary.bytes, 9);
        assert_eq!(chunks(&mem, "w").await, vec![Bytes::from("alpha"), Bytes::from("beta")]);
        assert!(mem.exists(&StreamKeys::new("w").root).await.unwrap());
    }

    #[tokio::test]
    async fn empty_chunks_are_skipped() {
        let (mem, store) = setup();
        let mut writer = StreamWriter::new(store, "e", WriteOptions::default());
        writer.write(Bytes::new()).await.unwrap();
        writer.write(&b"x"[..]).await.unwrap();
        writer.write(Vec::<u8>::new()).await.unwrap();
        writer.write(&b"y"[..]).await.unwrap();
        assert_eq!(writer.finish().await.unwrap().chunks, 2);
        assert_eq!(chunks(&mem, "e").await.len(), 2);
    }

    #[tokio::test]
    async fn session_with_only_empty_chunks_touches_nothing() {
        let (mem, store) = setup();
        let keys = StreamKeys::new("idle");
        mem.set(&keys.root, Bytes::from_static(br#"{"created":1}"#)).await.unwrap();

        let mut writer = StreamWriter::new(store, "idle", WriteOptions::default());
        writer.write(Bytes::new()).await.unwrap();
        assert_eq!(writer.finish().await.unwrap(), WriteSummary::default());
        assert_eq!(
            mem.get(&keys.root).await.unwrap().unwrap(),
            Bytes::from_static(br#"{"created":1}"#)
        );
    }

    #[tokio::test]
    async fn replace_purges_previous_session() {
        let (mem, store) = setup();
        let keys = StreamKeys::new("r");
        mem.list_append(&keys.stream, Bytes::from_static(b"old")).await.unwrap();
        mem.set(&keys.root, Bytes::from_static(br#"{"created":1}"#)).await.unwrap();
        mem.set(&keys.meta, Bytes::from_static(br#"{"stale":true}"#)).await.unwrap();

        let mut writer = StreamWriter::new(store, "r", WriteOptions::default());
        writer.write(&b"new"[..]).await.unwrap();
        writer.finish().await.unwrap();

        assert_eq!(chunks(&mem, "r").await, vec![Bytes::from("new")]);
        assert!(!mem.exists(&keys.meta).await.unwrap());
        let root = mem.get(&keys.root).await.unwrap().unwrap();
        assert_ne!(&root[..], br#"{"created":1}"#);
    }

    #[tokio::test]
    async fn append_mode_keeps_existing_chunks() {
        let (mem, store) = setup();
        let keys = StreamKeys::new("a");
        mem.list_append(&keys.stream, Bytes::from_static(b"first")).await.unwrap();
        mem.set(&keys.root, Bytes::from_static(br#"{"created":1}"#)).await.unwrap();
        mem.set(&keys.meta, Bytes::from_static(br#"{"kept":true}"#)).await.unwrap();

        let mut writer = StreamWriter::new(store, "a", WriteOptions::append());
        writer.write(&b"second"[..]).await.unwrap();
        writer.finish().await.unwrap();

        assert_eq!(
            chunks(&mem, "a").await,
            vec![Bytes::from("first"), Bytes::from("second")]
        );
        assert_eq!(
            mem.get(&keys.root).await.unwrap().unwrap(),
            Bytes::from_static(br#"{"created":1}"#)
        );
        assert!(mem.exists(&keys.meta).await.unwrap());
    }

    #[tokio::test]
    async fn append_mode_creates_missing_root() {
        let (mem, store) = setup();
        let mut writer = StreamWriter::new(store, "fresh", WriteOptions::append());
        writer.write(&b"data"[..]).await.unwrap();
        writer.finish().await.unwrap();
        assert!(mem.exists(&StreamKeys::new("fresh").root).await.unwrap());
    }

    #[tokio::test]
    async fn sink_interface() {
        let (mem, store) = setup();
        let mut writer = StreamWriter::new(store, "sink", WriteOptions::default());
        let input = futures::stream::iter(
            ["one", "", "two", "three"]
                .into_iter()
                .map(|s| Ok::<_, StreamError>(Bytes::from(s))),
        );
        writer.send_all(&mut Box::pin(input)).await.unwrap();
        writer.close().await.unwrap();

        assert_eq!(writer.summary().chunks, 3);
        assert_eq!(
            chunks(&mem, "sink").await,
            vec![Bytes::from("one"), Bytes::from("two"), Bytes::from("three")]
        );
    }

    #[tokio::test]
    async fn copy_from_splits_into_chunks() {
        let (mem, store) = setup();
        let data: Vec<u8> = (0..=255u8).cycle().take(1000).collect();
        let mut writer = StreamWriter::new(store, "copy", WriteOptions::default());
        let read = writer.copy_from(&data[..], 300).await.unwrap();
        let summary = writer.finish().await.unwrap();

        assert_eq!(read, 1000);
        assert_eq!(summary.bytes, 1000);
        let stored = chunks(&mem, "copy").await;
        assert!(stored.iter().all(|c| c.len() <= 300));
        assert_eq!(stored.concat(), data);
    }

    #[test]
    fn debug_shows_key() {
        let (_, store) = setup();
        let writer = StreamWriter::new(store, "dbg", WriteOptions::default());
        assert!(format!("{writer:?}").contains("dbg"));
        assert_eq!(writer.key(), "dbg");
    }
}
