use serde::Serialize;
use thiserror::Error;
use vgraph_reasoner::{ConsistencyError, InconsistencyReport, ProfileReport};
use vgraph_triple_store::error::TripleStoreError;

use crate::{config::ConfigError, services::LoaderError};

/// Failure of a lifecycle operation.
///
/// The variant set is closed; callers match it exhaustively and expose
/// [`LifecycleError::kind`] as the stable machine-readable name.
#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("Failed to parse document: {0}")]
    Parse(String),

    #[error("Document is empty: {0}")]
    EmptyDocument(String),

    #[error("Document violates the {} profile: {}", .0.profile, .0.summary())]
    ProfileViolation(ProfileReport),

    #[error("Document is inconsistent: {}", .0.summary())]
    Inconsistent(InconsistencyReport),

    #[error("Reasoning did not finish within {timeout_ms} ms")]
    ReasoningTimeout { timeout_ms: u64 },

    #[error("No current version of {document_iri}")]
    NotFound { document_iri: String },

    #[error("Edit would leave {} dangling objects: {}", objects.len(), objects.join(", "))]
    DanglingObjects { objects: Vec<String> },

    #[error("Store transaction failed: {0}")]
    StoreTransaction(#[from] TripleStoreError),
}

/// Stable names of the [`LifecycleError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    ParseError,
    EmptyDocumentError,
    ProfileViolationError,
    InconsistencyError,
    ReasoningTimeoutError,
    NotFoundError,
    DanglingObjectsError,
    StoreTransactionError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ParseError => "ParseError",
            ErrorKind::EmptyDocumentError => "EmptyDocumentError",
            ErrorKind::ProfileViolationError => "ProfileViolationError",
            ErrorKind::InconsistencyError => "InconsistencyError",
            ErrorKind::ReasoningTimeoutError => "ReasoningTimeoutError",
            ErrorKind::NotFoundError => "NotFoundError",
            ErrorKind::DanglingObjectsError => "DanglingObjectsError",
            ErrorKind::StoreTransactionError => "StoreTransactionError",
        }
    }
}

impl LifecycleError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LifecycleError::Parse(_) => ErrorKind::ParseError,
            LifecycleError::EmptyDocument(_) => ErrorKind::EmptyDocumentError,
            LifecycleError::ProfileViolation(_) => ErrorKind::ProfileViolationError,
            LifecycleError::Inconsistent(_) => ErrorKind::InconsistencyError,
            LifecycleError::ReasoningTimeout { .. } => ErrorKind::ReasoningTimeoutError,
            LifecycleError::NotFound { .. } => ErrorKind::NotFoundError,
            LifecycleError::DanglingObjects { .. } => ErrorKind::DanglingObjectsError,
            LifecycleError::StoreTransaction(_) => ErrorKind::StoreTransactionError,
        }
    }

    /// Structured diagnostics for display next to the message.
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            LifecycleError::ProfileViolation(report) => serde_json::to_value(report).ok(),
            LifecycleError::Inconsistent(report) => serde_json::to_value(report).ok(),
            LifecycleError::DanglingObjects { objects } => serde_json::to_value(objects).ok(),
            _ => None,
        }
    }

    /// Whether the failure happened before anything was written.
    pub fn is_rejection(&self) -> bool {
        !matches!(self, LifecycleError::StoreTransaction(_))
    }
}

impl From<LoaderError> for LifecycleError {
    fn from(error: LoaderError) -> Self {
        match error {
            LoaderError::Parse(message) => LifecycleError::Parse(message),
            LoaderError::UnsupportedFormat(format) => {
                LifecycleError::Parse(format!("Unsupported serialization format: {format}"))
            }
            LoaderError::Promotion(message) => {
                LifecycleError::Parse(format!("Identifier promotion failed: {message}"))
            }
            LoaderError::Empty(message) => LifecycleError::EmptyDocument(message),
            LoaderError::Store(error) => LifecycleError::StoreTransaction(error),
        }
    }
}

/// Top-level application error for the binary.
#[derive(Error, Debug)]
pub(crate) enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Triple store error: {0}")]
    TripleStore(#[from] TripleStoreError),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Usage(String),
}

impl AppError {
    /// JSON body printed on failure.
    pub(crate) fn to_json(&self) -> serde_json::Value {
        match self {
            AppError::Lifecycle(error) => serde_json::json!({
                "kind": error.kind(),
                "message": error.to_string(),
                "details": error.details(),
            }),
            other => serde_json::json!({
                "kind": "ApplicationError",
                "message": other.to_string(),
            }),
        }
    }
}

pub(crate) fn consistency_error(error: ConsistencyError, timeout_ms: u64) -> LifecycleError {
    match error {
        ConsistencyError::ProfileViolation(report) => LifecycleError::ProfileViolation(report),
        ConsistencyError::Inconsistent(report) => LifecycleError::Inconsistent(report),
        ConsistencyError::Cancelled => LifecycleError::ReasoningTimeout { timeout_ms },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_serialize_as_taxonomy_names() {
        let error = LifecycleError::NotFound {
            document_iri: "http://ex.org/doc".to_string(),
        };
        assert_eq!(
            serde_json::to_string(&error.kind()).unwrap_or_default(),
            "\"NotFoundError\""
        );
        assert_eq!(error.kind().as_str(), "NotFoundError");
        assert_eq!(error.to_string(), "No current version of http://ex.org/doc");
    }

    #[test]
    fn dangling_objects_are_listed() {
        let error = LifecycleError::DanglingObjects {
            objects: vec!["http://ex.org/a".to_string(), "http://ex.org/b".to_string()],
        };
        assert!(error.to_string().contains("2 dangling objects"));
        assert!(error.details().is_some());
        assert!(error.is_rejection());
    }

    #[test]
    fn loader_errors_map_to_taxonomy() {
        let error: LifecycleError = LoaderError::UnsupportedFormat("text/csv".to_string()).into();
        assert_eq!(error.kind(), ErrorKind::ParseError);
        let error: LifecycleError = LoaderError::Empty("no statements".to_string()).into();
        assert_eq!(error.kind(), ErrorKind::EmptyDocumentError);
    }
}
