//! Consistency checking and inference materialization for graph documents.
//!
//! [`ConsistencyEngine`] validates a document against an OWL profile and
//! checks it for contradictions, producing a [`ReasonerHandle`] that the
//! [`InferenceMaterializer`] turns into a separate inferred document.

mod closure;
mod consistency;
mod error;
mod inference;
mod profile;

pub use closure::Closure;
pub use consistency::{
    CheckRequest, ConsistencyEngine, Inconsistency, InconsistencyKind, InconsistencyReport,
    ReasonerHandle, RuleConsistencyEngine,
};
pub use error::{ConsistencyError, UnknownProfile};
pub use inference::{InferenceCategory, InferenceMaterializer, InferredDocument};
pub use profile::{Profile, ProfileReport, ProfileViolation, ViolationKind, check_profile};
