use bytes::Bytes;
use chrono::{DateTime, TimeZone, Utc};
use chunkstream_store::RecordKind;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{StreamError, StreamResult};

/// A JSON object, as returned by metadata reads.
pub type Metadata = Map<String, Value>;

/// Creation record written once per write session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootRecord {
    /// Milliseconds since the UNIX epoch.
    pub created: i64,
}

impl RootRecord {
    pub fn now() -> Self {
        Self {
            created: Utc::now().timestamp_millis(),
        }
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.created).single()
    }

    pub fn to_bytes(&self) -> StreamResult<Bytes> {
        Ok(Bytes::from(serde_json::to_vec(self)?))
    }
}

/// Parse a stored JSON record into an object.
///
/// Unset or empty values and JSON `null` yield an empty object. Any other
/// non-object value is rejected.
pub(crate) fn parse_record(kind: RecordKind, raw: Option<&[u8]>) -> StreamResult<Metadata> {
    let Some(raw) = raw.filter(|r| !r.is_empty()) else {
        return Ok(Metadata::new());
    };
    match serde_json::from_slice::<Value>(raw)? {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Metadata::new()),
        other => Err(StreamError::InvalidRecord {
            kind,
            reason: format!("expected a JSON object, found {}", json_type(&other)),
        }),
    }
}

/// Shallow merge: fields of `overlay` replace same-named fields of `base`.
pub(crate) fn merge(mut base: Metadata, overlay: Metadata) -> Metadata {
    for (field, value) in overlay {
        base.insert(field, value);
    }
    base
}

pub(crate) fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
