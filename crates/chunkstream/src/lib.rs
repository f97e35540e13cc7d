//! Append-only chunked byte streams on an ordered key-value store.
//!
//! A stream is written as a sequence of binary chunks under a caller-chosen
//! name, read back in order, and carries a mutable JSON metadata record.
//!
//! - [`StreamWriter`] -- push side; the first chunk of a session replaces
//!   (or, with [`WriteOptions::append`], extends) the stream
//! - [`StreamReader`] -- pull side; reads chunks `start_index..len` where
//!   `len` is captured on the first pull
//! - [`set_meta`] / [`get_meta`] -- metadata gated on the root record,
//!   merged over it on read
//! - [`delete_stream`] -- removes every record of a stream in one batch
//! - [`StreamAccess`] -- all of the above behind one owned store handle
//!
//! ```
//! use std::sync::Arc;
//! use chunkstream::{ReadOptions, StreamAccess, WriteOptions};
//! use chunkstream_store::InMemoryChunkStore;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let access = StreamAccess::new(Arc::new(InMemoryChunkStore::new()));
//!
//! let mut writer = access.create_write_stream("greeting", WriteOptions::default());
//! writer.write("hello, ").await?;
//! writer.write("world").await?;
//! writer.finish().await?;
//!
//! let mut reader = access.create_read_stream("greeting", ReadOptions::default());
//! assert_eq!(&reader.read_to_end().await?[..], b"hello, world");
//! # Ok::<(), chunkstream::StreamError>(())
//! # }).unwrap();
//! ```
//!
//! # Consistency
//!
//! Nothing here coordinates concurrent sessions on the same name. Callers
//! must not run two writers, or a writer and a delete, on one stream at the
//! same time if they need a consistent result.

pub mod access;
pub mod error;
pub mod lifecycle;
pub mod meta;
pub mod options;
pub mod reader;
pub mod record;
pub mod writer;

pub use access::StreamAccess;
pub use error::{StreamError, StreamResult};
pub use lifecycle::delete_stream;
pub use meta::{get_meta, set_meta};
pub use options::{ReadOptions, WriteOptions};
pub use reader::StreamReader;
pub use record::{Metadata, RootRecord};
pub use writer::{StreamWriter, WriteSummary, DEFAULT_CHUNK_SIZE};

pub use chunkstream_store::{ChunkStore, StoreConfig, StoreError, StreamKeys};
