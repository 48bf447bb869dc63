//! Core data types that flow through an analysis.

use serde::{Deserialize, Serialize};

use crate::options::ModelSize;

/// A piece of input text with an optional identifying label (usually the
/// uploaded file name).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default, alias = "name")]
    pub label: Option<String>,
    pub text: String,
}

impl Document {
    /// Free text with no label.
    pub fn unlabelled(text: impl Into<String>) -> Self {
        Self {
            label: None,
            text: text.into(),
        }
    }

    pub fn labelled(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            text: text.into(),
        }
    }
}

/// A resolved, ready-to-use language model.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ModelHandle {
    /// Concrete model identifier, e.g. `"en_core_web_sm"`.
    pub name: String,
    /// Short language code, e.g. `"en"`.
    pub language: String,
    pub size: ModelSize,
}
