use thiserror::Error;

use crate::{InconsistencyReport, ProfileReport};

#[derive(Debug, Error)]
pub enum ConsistencyError {
    #[error("Document violates the {} profile: {}", .0.profile, .0.summary())]
    ProfileViolation(ProfileReport),

    #[error("Document is inconsistent: {}", .0.summary())]
    Inconsistent(InconsistencyReport),

    #[error("Consistency check cancelled")]
    Cancelled,
}

impl ConsistencyError {
    /// Short label for logs and metrics.
    pub fn outcome(&self) -> &'static str {
        match self {
            ConsistencyError::ProfileViolation(_) => "profile_violation",
            ConsistencyError::Inconsistent(_) => "inconsistent",
            ConsistencyError::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown OWL profile: {0}")]
pub struct UnknownProfile(pub String);
