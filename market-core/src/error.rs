//! Error types for the marketplace ledger

use thiserror::Error;

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Marketplace ledger errors
#[derive(Error, Debug)]
pub enum Error {
    /// Rejected input (negative amount/price, malformed key)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Missing account or inventory item
    #[error("{0}")]
    NotFound(String),

    /// Strict create hit an existing record
    #[error("{0}")]
    AlreadyExists(String),

    /// Domain-state conflict (insufficient balance, listing unavailable)
    ///
    /// Displayed as the bare message because callers match on the text.
    #[error("{0}")]
    Conflict(String),

    /// Storage error (RocksDB)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Caller identity could not be established
    #[error("Identity error: {0}")]
    Identity(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rocksdb::Error> for Error {
    fn from(err: rocksdb::Error) -> Self {
        Error::Storage(err.to_string())
    }
}
