use serde::{Deserialize, Serialize};

/// Options for a write session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriteOptions {
    /// Keep existing chunks and add after them. When `false`, the first
    /// non-empty chunk purges the stream's chunks, root, and metadata.
    pub append: bool,
    /// Fail the session when a chunk append fails. When `false`, a failed
    /// append is logged and counted, and the session carries on.
    pub strict_appends: bool,
}

impl WriteOptions {
    /// Append to an existing stream instead of replacing it.
    pub fn append() -> Self {
        Self {
            append: true,
            ..Self::default()
        }
    }

    pub fn with_strict_appends(mut self, strict: bool) -> Self {
        self.strict_appends = strict;
        self
    }
}

/// Options for a read session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadOptions {
    /// Index of the first chunk to yield.
    pub start_index: u64,
}

impl ReadOptions {
    pub fn from_index(start_index: u64) -> Self {
        Self { start_index }
    }
}
