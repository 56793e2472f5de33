use serde::{Deserialize, Serialize};

/// How an edit fragment is applied to the current version of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditMode {
    /// Union of the current statements and the fragment.
    #[default]
    Merge,
    /// Every statement about a subject the fragment mentions is dropped
    /// before the fragment is added.
    Replace,
}

impl EditMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            EditMode::Merge => "merge",
            EditMode::Replace => "replace",
        }
    }
}
