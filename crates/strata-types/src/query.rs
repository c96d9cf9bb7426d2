//! Query endpoint request and response types.

use serde::{Deserialize, Serialize};

/// A natural-language question against the knowledge base.
///
/// Optional fields fall back to the configured search defaults. A missing
/// `query` deserializes to an empty string and is rejected by the service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimension: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hierarchical: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub k: Option<usize>,
}

impl QueryRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }
}

/// A citation shown to the caller for one retrieved source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceCitation {
    /// Display file name.
    pub key: String,
    pub similarity: f32,
    /// Modality-appropriate locator (page, time range, line range).
    pub text_preview: String,
}

/// Answer to a query, including the citations it was grounded on.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    pub answer: String,
    pub sources: Vec<SourceCitation>,
    pub model: String,
    pub query: String,
    pub dimension: usize,
    pub results_found: usize,
    pub processing_steps: Vec<String>,
}
