//! Error types for gtv_merkle

use thiserror::Error;

/// Result type alias for gtv_merkle operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building, annotating, hashing or verifying trees
#[derive(Error, Debug)]
pub enum Error {
    /// A disclosure path implies a shape the tree does not have
    #[error("Path and tree structure do not match: {0}")]
    StructuralMismatch(String),

    #[error("Duplicate map key: {0:?}")]
    DuplicateKey(String),

    /// A node variant or reference outside the known set (builder/engine version skew)
    #[error("Unknown node kind: {0}")]
    UnknownNodeKind(String),

    #[error("Pruned node {0} has no substitute digest")]
    MissingPrunedDigest(u32),

    #[error("Root mismatch: expected {expected}, computed {computed}")]
    RootMismatch { expected: String, computed: String },

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Invalid hash: {0}")]
    InvalidHash(String),

    #[error("Corruption detected: {0}")]
    Corruption(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Transaction {0} was rejected")]
    Rejected(String),

    #[error("Remote error: {0}")]
    Remote(String),

    #[error("Unexpected status from server: {0}")]
    UnexpectedStatus(String),

    #[error("Transaction {tx} not confirmed after {attempts} attempts")]
    ConfirmationTimeout { tx: String, attempts: u32 },
}
