//! GenerationProvider trait definition.
//!
//! The generative-answer service: takes one user turn of multimodal content
//! blocks and returns generated text.

use strata_types::llm::{GenerationRequest, GenerationResponse, LlmError};

/// Trait for generation backends (Claude on Bedrock, etc.).
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
/// Implementations live in strata-infra (e.g., `BedrockGenerationProvider`).
pub trait GenerationProvider: Send + Sync {
    /// Human-readable provider name (e.g., "bedrock").
    fn name(&self) -> &str;

    /// Model identifier reported back to callers.
    fn model(&self) -> &str;

    /// Generate an answer for the given content.
    fn generate(
        &self,
        request: &GenerationRequest,
    ) -> impl std::future::Future<Output = Result<GenerationResponse, LlmError>> + Send;
}
