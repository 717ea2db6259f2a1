use consensus_core::{errors::ConsensusError, reachability::ReachabilityError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("RocksDB error: {0}")]
    RocksDb(#[from] rocksdb::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Key not found in {0}: {1}")]
    KeyNotFound(&'static str, String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Column family not found: {0}")]
    ColumnFamilyNotFound(String),

    #[error("Staging shard {0} holds a different key/value type")]
    StagingShardMismatch(&'static str),

    #[error("Database is closed")]
    DatabaseClosed,
}

pub type DbResult<T> = Result<T, DbError>;

impl DbError {
    pub fn is_key_not_found(&self) -> bool {
        matches!(self, DbError::KeyNotFound(..))
    }
}

impl From<bincode::Error> for DbError {
    fn from(err: bincode::Error) -> Self {
        DbError::Serialization(err.to_string())
    }
}

impl From<DbError> for ConsensusError {
    fn from(err: DbError) -> Self {
        ConsensusError::Db(err.to_string())
    }
}

impl From<DbError> for ReachabilityError {
    fn from(err: DbError) -> Self {
        ReachabilityError::StoreError(err.to_string())
    }
}

/// Converts a missing-key error into `None`
pub trait StoreResultExtensions<T> {
    fn optional(self) -> DbResult<Option<T>>;
}

impl<T> StoreResultExtensions<T> for DbResult<T> {
    fn optional(self) -> DbResult<Option<T>> {
        match self {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.is_key_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }
}
