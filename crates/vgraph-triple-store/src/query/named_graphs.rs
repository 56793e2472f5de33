//! Named graphs holding bookkeeping statements.
//!
//! Schema documents (shared vocabularies) and artifact documents (editable
//! project data) are tracked in separate graphs so artifact churn never
//! rewrites schema bookkeeping.

/// Management graph for schema documents
pub const SCHEMA_MANAGEMENT: &str = "urn:vgraph:graph:schema-management";

/// Management graph for artifact documents
pub const ARTIFACT_MANAGEMENT: &str = "urn:vgraph:graph:artifact-management";
