use crate::key::RecordKey;

/// Errors from store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store could not be reached or dropped the connection.
    #[error("connection error: {0}")]
    Connection(String),

    /// The store rejected or failed a command.
    #[error("command failed: {0}")]
    Command(String),

    /// A list command was issued against a scalar record, or vice versa.
    #[error("wrong value type for {key}: expected {expected}")]
    WrongType {
        key: RecordKey,
        expected: &'static str,
    },

    /// The connection configuration is invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error while loading configuration.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(feature = "redis")]
impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_connection_dropped() || err.is_connection_refusal() || err.is_io_error() {
            StoreError::Connection(err.to_string())
        } else {
            StoreError::Command(err.to_string())
        }
    }
}
