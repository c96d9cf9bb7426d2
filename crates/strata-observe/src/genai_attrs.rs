//! OpenTelemetry GenAI Semantic Convention attribute constants.
//!
//! Spans around embedding-service and generation-service calls carry these
//! attributes so exported traces line up with other GenAI instrumentation.
//! Field names are written inline in `tracing::info_span!` calls; the values
//! below are the canonical names and the operation/provider values.
//!
//! Span naming convention: `"gen_ai.{operation}"` (e.g., `"gen_ai.embed"`).

// --- Required attributes ---

/// The name of the operation being performed (e.g., "embed", "generate").
pub const GEN_AI_OPERATION_NAME: &str = "gen_ai.operation.name";

/// The name of the GenAI provider (e.g., "aws.bedrock").
pub const GEN_AI_PROVIDER_NAME: &str = "gen_ai.provider.name";

// --- Recommended attributes ---

/// The model ID requested.
pub const GEN_AI_REQUEST_MODEL: &str = "gen_ai.request.model";

/// The sampling temperature for the request.
pub const GEN_AI_REQUEST_TEMPERATURE: &str = "gen_ai.request.temperature";

/// The maximum number of output tokens requested.
pub const GEN_AI_REQUEST_MAX_TOKENS: &str = "gen_ai.request.max_tokens";

/// Requested embedding dimension.
pub const GEN_AI_REQUEST_EMBEDDING_DIMENSION: &str = "gen_ai.request.embedding.dimension";

/// The number of input tokens consumed.
pub const GEN_AI_USAGE_INPUT_TOKENS: &str = "gen_ai.usage.input_tokens";

/// The number of output tokens generated.
pub const GEN_AI_USAGE_OUTPUT_TOKENS: &str = "gen_ai.usage.output_tokens";

/// The finish reason for the response (e.g., "end_turn", "max_tokens").
pub const GEN_AI_RESPONSE_FINISH_REASONS: &str = "gen_ai.response.finish_reasons";

/// The unique response/message ID from the provider.
pub const GEN_AI_RESPONSE_ID: &str = "gen_ai.response.id";

// --- Operation name values ---

/// Synchronous single-input embedding (query path).
pub const OP_EMBED: &str = "embed";

/// Asynchronous segmented-embedding job submission.
pub const OP_START_EMBEDDING_JOB: &str = "start_embedding_job";

/// Asynchronous job status check.
pub const OP_GET_EMBEDDING_JOB: &str = "get_embedding_job";

/// Answer generation from retrieved evidence.
pub const OP_GENERATE: &str = "generate";

// --- Provider name values ---

/// AWS Bedrock provider identifier.
pub const PROVIDER_BEDROCK: &str = "aws.bedrock";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_names_share_namespace() {
        for name in [
            GEN_AI_OPERATION_NAME,
            GEN_AI_PROVIDER_NAME,
            GEN_AI_REQUEST_MODEL,
            GEN_AI_REQUEST_EMBEDDING_DIMENSION,
            GEN_AI_RESPONSE_ID,
        ] {
            assert!(name.starts_with("gen_ai."), "{name}");
        }
    }
}
