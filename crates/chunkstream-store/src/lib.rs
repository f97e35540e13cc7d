//! Ordered key-value store contract for chunked byte streams.
//!
//! Every logical stream is kept as three records under one caller-chosen
//! name:
//!
//! - a **stream** list of binary chunks, addressed by index
//! - a **root** scalar holding the JSON creation record
//! - a **meta** scalar holding caller-managed JSON
//!
//! Records are addressed with [`RecordKey`] (name plus [`RecordKind`]) so a
//! name that happens to contain a suffix-like string can never alias another
//! stream's records.
//!
//! # Storage Backends
//!
//! All backends implement the [`ChunkStore`] trait:
//!
//! - [`InMemoryChunkStore`] -- `HashMap`-based store for tests and embedding
//! - `RedisChunkStore` -- Redis lists and strings (cargo feature `redis`)
//!
//! # Design Rules
//!
//! 1. Lists are append-only from the stream layer's point of view.
//! 2. Reading an absent record is `Ok(None)` / `Ok(0)`, never an error.
//! 3. Batches fail as a whole; partial replies are never returned.
//! 4. The store never interprets record contents.
//! 5. All errors are propagated, never retried.

pub mod batch;
pub mod config;
pub mod error;
pub mod key;
pub mod memory;
#[cfg(feature = "redis")]
pub mod redis_store;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use batch::{Batch, BatchOp, Reply};
pub use config::StoreConfig;
pub use error::{StoreError, StoreResult};
pub use key::{RecordKey, RecordKind, StreamKeys};
pub use memory::InMemoryChunkStore;
#[cfg(feature = "redis")]
pub use redis_store::RedisChunkStore;
pub use traits::ChunkStore;
