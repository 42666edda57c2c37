//! Store errors
//!
//! Errors fall into two classes. Absence errors (a node, link, or link
//! endpoint does not exist) never reach callers of the public store API:
//! the transaction scope converts them into the operation's sentinel.
//! Every other variant is systemic and propagates after rollback.

use crate::config::ConfigError;
use thiserror::Error;

/// Store errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// No node with this external id
    #[error("Node {0} not found")]
    NodeNotFound(u64),

    /// No link for this triple
    #[error("Link ({id1}, {link_type}, {id2}) not found")]
    LinkNotFound { id1: u64, link_type: i64, id2: u64 },

    /// Link type has never been registered with the engine
    #[error("Link type {0} not registered")]
    LinkTypeNotFound(i64),

    /// RocksDB error
    #[error("RocksDB error: {0}")]
    Engine(#[from] rocksdb::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Column family missing from the opened engine
    #[error("Column family error: {0}")]
    ColumnFamily(String),

    /// Payload exceeds the configured bound
    #[error("Payload of {size} bytes exceeds limit of {limit} bytes")]
    PayloadTooLarge { size: usize, limit: usize },

    /// Stored bytes do not decode to a valid record
    #[error("Corrupt record: {0}")]
    CorruptRecord(String),

    /// Operation on a store that was never initialized or already closed
    #[error("Store is not initialized")]
    NotInitialized,
}

impl StoreError {
    /// Absence-class errors are converted to sentinels, never propagated
    pub fn is_absence(&self) -> bool {
        matches!(
            self,
            StoreError::NodeNotFound(_)
                | StoreError::LinkNotFound { .. }
                | StoreError::LinkTypeNotFound(_)
        )
    }

    pub(crate) fn link_not_found(id1: u64, link_type: i64, id2: u64) -> Self {
        StoreError::LinkNotFound { id1, link_type, id2 }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
