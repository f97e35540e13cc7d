use bytes::Bytes;

use crate::key::RecordKey;

/// One command inside a [`Batch`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BatchOp {
    Exists(RecordKey),
    Get(RecordKey),
    Delete(RecordKey),
}

/// Reply to a single [`BatchOp`], in the same position as the op.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reply {
    Exists(bool),
    /// Scalar value, `None` if unset.
    Value(Option<Bytes>),
    /// Whether a record was removed.
    Deleted(bool),
}

impl Reply {
    pub fn as_exists(&self) -> Option<bool> {
        match self {
            Reply::Exists(b) => Some(*b),
            _ => None,
        }
    }

    pub fn into_value(self) -> Option<Option<Bytes>> {
        match self {
            Reply::Value(v) => Some(v),
            _ => None,
        }
    }
}

/// An ordered group of commands executed together.
///
/// Built with chained calls:
///
/// ```
/// use chunkstream_store::{Batch, StreamKeys};
///
/// let keys = StreamKeys::new("clip");
/// let batch = Batch::new().delete(&keys.stream).delete(&keys.root).delete(&keys.meta);
/// assert_eq!(batch.len(), 3);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Batch {
    ops: Vec<BatchOp>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exists(mut self, key: &RecordKey) -> Self {
        self.ops.push(BatchOp::Exists(key.clone()));
        self
    }

    pub fn get(mut self, key: &RecordKey) -> Self {
        self.ops.push(BatchOp::Get(key.clone()));
        self
    }

    pub fn delete(mut self, key: &RecordKey) -> Self {
        self.ops.push(BatchOp::Delete(key.clone()));
        self
    }

    pub fn ops(&self) -> &[BatchOp] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

impl IntoIterator for Batch {
    type Item = BatchOp;
    type IntoIter = std::vec::IntoIter<BatchOp>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::StreamKeys;

    #[test]
    fn ops_keep_insertion_order() {
        let keys = StreamKeys::new("s");
        let batch = Batch::new().exists(&keys.root).get(&keys.root).get(&keys.meta);
        assert_eq!(
            batch.ops(),
            &[
                BatchOp::Exists(keys.root.clone()),
                BatchOp::Get(keys.root.clone()),
                BatchOp::Get(keys.meta.clone()),
            ]
        );
    }

    #[test]
    fn empty_batch() {
        assert!(Batch::new().is_empty());
    }

    #[test]
    fn reply_accessors() {
        assert_eq!(Reply::Exists(true).as_exists(), Some(true));
        assert_eq!(Reply::Deleted(true).as_exists(), None);
        assert_eq!(Reply::Value(None).into_value(), Some(None));
        assert_eq!(Reply::Exists(false).into_value(), None);
    }
}
