use std::fmt;

use serde::{Deserialize, Serialize};

/// The three records kept for every logical stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    /// Ordered list of chunks.
    Stream,
    /// Creation record; its presence means the stream exists.
    Root,
    /// Caller-managed metadata.
    Meta,
}

impl RecordKind {
    /// Tag used when flattening a [`RecordKey`] into a single backend key.
    pub const fn tag(&self) -> &'static str {
        match self {
            RecordKind::Stream => "stream",
            RecordKind::Root => "root",
            RecordKind::Meta => "meta",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Address of one record: a caller-supplied stream name plus the record kind.
///
/// The name is kept verbatim. Two keys are equal only if both the name and
/// the kind match, so a stream named `"a:root"` never aliases the root record
/// of a stream named `"a"`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordKey {
    pub name: String,
    pub kind: RecordKind,
}

impl RecordKey {
    pub fn new(name: impl Into<String>, kind: RecordKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Flat backend key, `<name>:<tag>`.
    ///
    /// No tag is a suffix of another, so the encoding is injective.
    pub fn encode(&self) -> String {
        format!("{}:{}", self.name, self.kind.tag())
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.kind.tag())
    }
}

/// All record keys belonging to one stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StreamKeys {
    pub stream: RecordKey,
    pub root: RecordKey,
    pub meta: RecordKey,
}

impl StreamKeys {
    pub fn new(name: &str) -> Self {
        Self {
            stream: RecordKey::new(name, RecordKind::Stream),
            root: RecordKey::new(name, RecordKind::Root),
            meta: RecordKey::new(name, RecordKind::Meta),
        }
    }

    /// The stream name these keys were derived from.
    pub fn name(&self) -> &str {
        &self.stream.name
    }

    /// Keys in deletion order.
    pub fn all(&self) -> [&RecordKey; 3] {
        [&self.stream, &self.root, &self.meta]
    }
}
