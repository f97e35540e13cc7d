use async_trait::async_trait;
use bytes::Bytes;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, ConnectionAddr, ConnectionInfo, RedisConnectionInfo, Value};
use tracing::{debug, info};

use crate::batch::{Batch, BatchOp, Reply};
use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::key::RecordKey;
use crate::traits::ChunkStore;

/// Redis-backed chunk store.
///
/// Lists map to RPUSH/LLEN/LINDEX, scalars to EXISTS/GET/SET, and batches to
/// a MULTI/EXEC pipeline. Record keys are flattened with
/// [`RecordKey::encode`]. The connection is multiplexed, so clones of this
/// store share one socket.
#[derive(Clone)]
pub struct RedisChunkStore {
    conn: MultiplexedConnection,
}

impl RedisChunkStore {
    /// Open a connection using the given settings.
    pub async fn connect(config: &StoreConfig) -> StoreResult<Self> {
        let client = redis::Client::open(connection_info(config))
            .map_err(|e| StoreError::Config(e.to_string()))?;
        let conn = client.get_multiplexed_async_connection().await?;
        info!(host = %config.host, port = config.port, db = config.db, "connected to redis");
        Ok(Self { conn })
    }

    /// Wrap an existing connection.
    pub fn from_connection(conn: MultiplexedConnection) -> Self {
        Self { conn }
    }
}

/// Connection parameters built field by field, so credentials are never
/// parsed back out of a URL.
fn connection_info(config: &StoreConfig) -> ConnectionInfo {
    ConnectionInfo {
        addr: ConnectionAddr::Tcp(config.host.clone(), config.port),
        redis: RedisConnectionInfo {
            db: i64::from(config.db),
            username: config.username.clone(),
            password: config.password.clone(),
            ..Default::default()
        },
    }
}

/// Pair each EXEC reply with the op that produced it.
fn decode_replies(ops: &[BatchOp], values: &[Value]) -> StoreResult<Vec<Reply>> {
    if values.len() != ops.len() {
        return Err(StoreError::Command(format!(
            "EXEC returned {} replies for {} commands",
            values.len(),
            ops.len()
        )));
    }
    ops.iter()
        .zip(values)
        .map(|(op, value)| match op {
            BatchOp::Exists(_) => decode::<bool>(value).map(Reply::Exists),
            BatchOp::Get(_) => {
                decode::<Option<Vec<u8>>>(value).map(|v| Reply::Value(v.map(Bytes::from)))
            }
            BatchOp::Delete(_) => decode::<bool>(value).map(Reply::Deleted),
        })
        .collect()
}

fn decode<T: redis::FromRedisValue>(value: &Value) -> StoreResult<T> {
    Ok(redis::from_redis_value(value)?)
}

fn wrong_type(err: redis::RedisError, key: &RecordKey, expected: &'static str) -> StoreError {
    if err.code() == Some("WRONGTYPE") {
        StoreError::WrongType {
            key: key.clone(),
            expected,
        }
    } else {
        err.into()
    }
}

#[async_trait]
impl ChunkStore for RedisChunkStore {
    async fn exists(&self, key: &RecordKey) -> StoreResult<bool> {
        let mut conn = self.conn.clone();
        let exists: bool = conn.exists(key.encode()).await?;
        Ok(exists)
    }

    async fn get(&self, key: &RecordKey) -> StoreResult<Option<Bytes>> {
        let mut conn = self.conn.clone();
        let value: Option<Vec<u8>> = conn
            .get(key.encode())
            .await
            .map_err(|e| wrong_type(e, key, "scalar"))?;
        Ok(value.map(Bytes::from))
    }

    async fn set(&self, key: &RecordKey, value: Bytes) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        conn.set::<_, _, ()>(key.encode(), value.as_ref()).await?;
        Ok(())
    }

    async fn list_append(&self, key: &RecordKey, value: Bytes) -> StoreResult<u64> {
        let mut conn = self.conn.clone();
        let len: u64 = conn
            .rpush(key.encode(), value.as_ref())
            .await
            .map_err(|e| wrong_type(e, key, "list"))?;
        debug!(key = %key, len, "rpush");
        Ok(len)
    }

    async fn list_length(&self, key: &RecordKey) -> StoreResult<u64> {
        let mut conn = self.conn.clone();
        conn.llen(key.encode())
            .await
            .map_err(|e| wrong_type(e, key, "list"))
    }

    async fn list_index(&self, key: &RecordKey, index: u64) -> StoreResult<Option<Bytes>> {
        let Ok(index) = isize::try_from(index) else {
            return Ok(None);
        };
        let mut conn = self.conn.clone();
        let value: Option<Vec<u8>> = conn
            .lindex(key.encode(), index)
            .await
            .map_err(|e| wrong_type(e, key, "list"))?;
        Ok(value.map(Bytes::from))
    }

    async fn exec(&self, batch: Batch) -> StoreResult<Vec<Reply>> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }

        let mut pipe = redis::pipe();
        pipe.atomic();
        for op in batch.ops() {
            match op {
                BatchOp::Exists(key) => pipe.cmd("EXISTS").arg(key.encode()),
                BatchOp::Get(key) => pipe.cmd("GET").arg(key.encode()),
                BatchOp::Delete(key) => pipe.cmd("DEL").arg(key.encode()),
            };
        }

        let mut conn = self.conn.clone();
        let values: Vec<Value> = pipe.query_async(&mut conn).await?;
        decode_replies(batch.ops(), &values)
    }
}

impl std::fmt::Debug for RedisChunkStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisChunkStore").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::StreamKeys;

    #[test]
    fn connection_info_keeps_reserved_characters() {
        let config = StoreConfig {
            host: "cache.internal".into(),
            port: 6380,
            db: 4,
            username: Some("app".into()),
            password: Some("p@ss/w#rd".into()),
        };
        let info = connection_info(&config);
        assert!(matches!(info.addr, ConnectionAddr::Tcp(ref host, 6380) if host == "cache.internal"));
        assert_eq!(info.redis.db, 4);
        assert_eq!(info.redis.username.as_deref(), Some("app"));
        assert_eq!(info.redis.password.as_deref(), Some("p@ss/w#rd"));
        assert!(redis::Client::open(info).is_ok());
    }

    #[test]
    fn replies_follow_op_order() {
        let keys = StreamKeys::new("clip");
        let batch = Batch::new()
            .exists(&keys.root)
            .get(&keys.root)
            .get(&keys.meta)
            .delete(&keys.stream);
        let values = [
            Value::Int(1),
            Value::BulkString(br#"{"created":1}"#.to_vec()),
            Value::Nil,
            Value::Int(0),
        ];
        let replies = decode_replies(batch.ops(), &values).unwrap();
        assert_eq!(
            replies,
            vec![
                Reply::Exists(true),
                Reply::Value(Some(Bytes::from_static(br#"{"created":1}"#))),
                Reply::Value(None),
                Reply::Deleted(false),
            ]
        );
    }

    #[test]
    fn reply_count_mismatch_is_command_error() {
        let keys = StreamKeys::new("clip");
        let batch = Batch::new().exists(&keys.root).get(&keys.meta);
        let err = decode_replies(batch.ops(), &[Value::Int(1)]).unwrap_err();
        assert!(matches!(err, StoreError::Command(_)));
    }

    #[test]
    fn mistyped_reply_is_an_error() {
        let keys = StreamKeys::new("clip");
        let batch = Batch::new().exists(&keys.root);
        let values = [Value::BulkString(b"not a number".to_vec())];
        assert!(decode_replies(batch.ops(), &values).is_err());
    }
}
