//! Retrieval types: historical precedent matches and the coarse filters used
//! to narrow the similarity search.

use serde::{Deserialize, Serialize};

/// A historical case returned by the precedent similarity search.
///
/// Owned by the precedent store; read-only to the pipeline. `distance` is
/// whatever score the backend reports (lower is closer for L2/cosine
/// distance) and may be absent for backends that do not expose one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrecedentMatch {
    pub case_id: String,
    pub full_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f32>,
}

/// Coarse categorical hints derived from the complaint text.
///
/// Used server-side to narrow the similarity search. Empty filters degrade
/// retrieval to pure vector similarity — never an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaseFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_type: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key_themes: Vec<String>,
}

impl CaseFilters {
    pub fn is_empty(&self) -> bool {
        self.product_type.is_none() && self.key_themes.is_empty()
    }
}
