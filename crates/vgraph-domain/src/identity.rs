use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentityError {
    #[error("Document IRI must not be empty")]
    EmptyDocumentIri,
    #[error("Version IRI must not be empty")]
    EmptyVersionIri,
}

/// Derives the inferred graph IRI for a version.
///
/// Pure concatenation with a fixed prefix: the same version always maps to the
/// same inferred graph, and distinct versions never collide.
pub fn derive_inferred_iri(prefix: &str, version_iri: &str) -> String {
    format!("{prefix}{version_iri}")
}

/// Composite identity of a stored graph document.
///
/// `document_iri` is stable across revisions, `version_iri` is unique per
/// revision and `inferred_iri` names the graph holding the derived statements
/// for that revision, once one has been computed.
///
/// Two identities are equal when both base fields match and the inferred
/// fields are either both absent or both present and equal. An identity
/// without an inferred IRI is never equal to one that carries it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentIdentity {
    document_iri: String,
    version_iri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inferred_iri: Option<String>,
}

impl DocumentIdentity {
    pub fn new(
        document_iri: impl Into<String>,
        version_iri: impl Into<String>,
    ) -> Result<Self, IdentityError> {
        let document_iri = document_iri.into();
        let version_iri = version_iri.into();
        if document_iri.is_empty() {
            return Err(IdentityError::EmptyDocumentIri);
        }
        if version_iri.is_empty() {
            return Err(IdentityError::EmptyVersionIri);
        }
        Ok(Self {
            document_iri,
            version_iri,
            inferred_iri: None,
        })
    }

    pub fn document_iri(&self) -> &str {
        &self.document_iri
    }

    pub fn version_iri(&self) -> &str {
        &self.version_iri
    }

    pub fn inferred_iri(&self) -> Option<&str> {
        self.inferred_iri.as_deref()
    }

    /// Attach the inferred graph IRI derived from this version.
    pub fn with_derived_inferred(&self, prefix: &str) -> Self {
        Self {
            inferred_iri: Some(derive_inferred_iri(prefix, &self.version_iri)),
            ..self.clone()
        }
    }

    /// Attach an inferred graph IRI read back from a management graph.
    pub fn with_inferred(self, inferred_iri: impl Into<String>) -> Self {
        Self {
            inferred_iri: Some(inferred_iri.into()),
            ..self
        }
    }

    /// Same document, different revision. The inferred IRI is dropped since it
    /// belongs to the old revision.
    pub fn with_version(&self, version_iri: impl Into<String>) -> Self {
        Self {
            document_iri: self.document_iri.clone(),
            version_iri: version_iri.into(),
            inferred_iri: None,
        }
    }

    /// Identity without the inferred part.
    pub fn asserted(&self) -> Self {
        Self {
            inferred_iri: None,
            ..self.clone()
        }
    }
}

impl std::fmt::Display for DocumentIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<{}> version <{}>", self.document_iri, self.version_iri)?;
        if let Some(inferred) = &self.inferred_iri {
            write!(f, " inferred <{inferred}>")?;
        }
        Ok(())
    }
}
