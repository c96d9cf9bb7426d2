//! AWS Bedrock Runtime request/response types.
//!
//! Two API families are used:
//! - async invoke (`/async-invoke`) for segmented embedding jobs, whose model
//!   input is the core [`JobRequest`] payload as-is;
//! - model invoke (`/model/{id}/invoke`) for single query embeddings and for
//!   Claude generation. The Claude body omits `model` (it is in the URL path)
//!   and requires `anthropic_version`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use strata_types::job::{JobRequest, SCHEMA_VERSION};
use strata_types::llm::ContentBlock;

// ---------------------------------------------------------------------------
// Async invoke
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartAsyncInvokeRequest<'a> {
    pub model_id: &'a str,
    pub model_input: &'a JobRequest,
    pub output_data_config: OutputDataConfig,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputDataConfig {
    pub s3_output_data_config: S3OutputDataConfig,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct S3OutputDataConfig {
    pub s3_uri: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartAsyncInvokeResponse {
    pub invocation_arn: String,
}

/// `GET /async-invoke/{arn}` response. Unknown fields are ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AsyncInvokeStatus {
    pub status: String,
    #[serde(default)]
    pub failure_message: Option<String>,
    #[serde(default)]
    pub submit_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_modified_time: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Single (query) embedding
// ---------------------------------------------------------------------------

pub const TASK_SINGLE_EMBEDDING: &str = "SINGLE_EMBEDDING";
pub const PURPOSE_GENERIC_RETRIEVAL: &str = "GENERIC_RETRIEVAL";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleEmbeddingRequest<'a> {
    pub schema_version: &'static str,
    pub task_type: &'static str,
    pub single_embedding_params: SingleEmbeddingParams<'a>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleEmbeddingParams<'a> {
    pub embedding_purpose: &'static str,
    pub embedding_dimension: usize,
    pub text: TextInput<'a>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextInput<'a> {
    pub truncation_mode: &'static str,
    pub value: &'a str,
}

impl<'a> SingleEmbeddingRequest<'a> {
    pub fn for_query(text: &'a str, dimension: usize) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            task_type: TASK_SINGLE_EMBEDDING,
            single_embedding_params: SingleEmbeddingParams {
                embedding_purpose: PURPOSE_GENERIC_RETRIEVAL,
                embedding_dimension: dimension,
                text: TextInput {
                    truncation_mode: "END",
                    value: text,
                },
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingResponse {
    #[serde(default)]
    pub embeddings: Vec<EmbeddingEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddingEntry {
    #[serde(default)]
    pub embedding_type: Option<String>,
    pub embedding: Vec<f32>,
}

// ---------------------------------------------------------------------------
// Claude generation
// ---------------------------------------------------------------------------

/// Request body for Claude on Bedrock.
#[derive(Debug, Clone, Serialize)]
pub struct ClaudeRequest<'a> {
    pub anthropic_version: &'static str,
    pub max_tokens: u32,
    pub messages: Vec<ClaudeMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClaudeMessage<'a> {
    pub role: &'static str,
    pub content: &'a [ContentBlock],
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClaudeResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub content: Vec<ClaudeContent>,
    #[serde(default)]
    pub stop_reason: Option<String>,
    #[serde(default)]
    pub usage: Option<ClaudeUsage>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClaudeContent {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClaudeUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}
