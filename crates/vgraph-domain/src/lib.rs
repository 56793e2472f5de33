pub mod document;
mod edit;
mod identity;
mod version;
pub mod vocab;

pub use document::GraphDocument;
pub use edit::EditMode;
pub use identity::{DocumentIdentity, IdentityError, derive_inferred_iri};
pub use version::increment_version;
