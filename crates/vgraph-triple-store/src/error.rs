use thiserror::Error;

/// Triple store specific errors
#[derive(Error, Debug)]
pub enum TripleStoreError {
    /// Semaphore closed
    #[error("Semaphore closed")]
    SemaphoreClosed,

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Triple store backend rejected or failed an operation
    #[error("Triple store backend error during {op}: {message}")]
    Backend { op: &'static str, message: String },

    /// Read query exceeded its deadline
    #[error("Triple store {op} timed out after {timeout_ms}ms")]
    Timeout { op: &'static str, timeout_ms: u64 },

    /// Failed to parse a response or RDF payload
    #[error("Failed to parse response: {reason}")]
    ParseError { reason: String },

    /// Invalid SPARQL query or query input
    #[error("Invalid SPARQL query: {reason}")]
    InvalidQuery { reason: String },

    /// Serialization format not known to the store
    #[error("Unsupported RDF format: {0}")]
    UnsupportedFormat(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Convenient Result type alias
pub type Result<T> = std::result::Result<T, TripleStoreError>;
