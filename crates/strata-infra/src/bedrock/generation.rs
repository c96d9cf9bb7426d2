//! BedrockGenerationProvider -- concrete [`GenerationProvider`] for Claude on
//! AWS Bedrock.
//!
//! Sends one user turn of multimodal content blocks to the non-streaming
//! `invoke` endpoint and returns the concatenated text blocks.

use secrecy::SecretString;
use tracing::Instrument;

use strata_core::llm::provider::GenerationProvider;
use strata_observe::genai_attrs;
use strata_types::llm::{GenerationRequest, GenerationResponse, LlmError};

use super::transport::{BedrockTransport, TransportError};
use super::types::{ClaudeContent, ClaudeMessage, ClaudeRequest, ClaudeResponse};

/// Claude on AWS Bedrock.
///
/// Does not derive Debug: the transport holds the bearer token.
pub struct BedrockGenerationProvider {
    transport: BedrockTransport,
    model_id: String,
}

impl BedrockGenerationProvider {
    /// The Anthropic API version for Bedrock.
    const API_VERSION: &'static str = "bedrock-2023-05-31";

    pub fn new(api_key: &SecretString, model: &str, region: &str) -> Result<Self, LlmError> {
        let transport = BedrockTransport::new(api_key, region).map_err(map_transport_error)?;
        let model_id = Self::to_bedrock_model_id(model, transport.region());
        Ok(Self { transport, model_id })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.transport = self.transport.with_endpoint(endpoint);
        self
    }

    /// Convert a bare Claude model name to a Bedrock inference profile ID.
    ///
    /// Names that already contain a `.` (`anthropic.claude-...`,
    /// `eu.anthropic.claude-...`) are returned unchanged; otherwise the region
    /// shorthand (`eu-west-1` -> `eu`) is prefixed.
    pub fn to_bedrock_model_id(model: &str, region: &str) -> String {
        if model.contains('.') {
            model.to_string()
        } else {
            let region_prefix = region.split('-').next().unwrap_or("us");
            format!("{region_prefix}.anthropic.{model}-v1:0")
        }
    }

    fn to_claude_request<'a>(&self, request: &'a GenerationRequest) -> ClaudeRequest<'a> {
        ClaudeRequest {
            anthropic_version: Self::API_VERSION,
            max_tokens: request.max_tokens,
            messages: vec![ClaudeMessage {
                role: "user",
                content: &request.content,
            }],
            temperature: request.temperature,
        }
    }
}

impl GenerationProvider for BedrockGenerationProvider {
    fn name(&self) -> &str {
        "bedrock"
    }

    fn model(&self) -> &str {
        &self.model_id
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, LlmError> {
        let images = request.content.iter().filter(|b| b.is_image()).count();
        let span = tracing::info_span!(
            "gen_ai.generate",
            gen_ai.operation.name = genai_attrs::OP_GENERATE,
            gen_ai.provider.name = genai_attrs::PROVIDER_BEDROCK,
            gen_ai.request.model = %self.model_id,
            gen_ai.request.max_tokens = request.max_tokens,
            gen_ai.request.temperature = ?request.temperature,
            gen_ai.response.id = tracing::field::Empty,
            gen_ai.response.finish_reasons = tracing::field::Empty,
            gen_ai.usage.input_tokens = tracing::field::Empty,
            gen_ai.usage.output_tokens = tracing::field::Empty,
            images,
        );
        async {
            let url = self
                .transport
                .url(&["model", &self.model_id, "invoke"])
                .map_err(map_transport_error)?;
            let response: ClaudeResponse = self
                .transport
                .post_json(url, &self.to_claude_request(request))
                .await
                .map_err(map_transport_error)?;

            let current = tracing::Span::current();
            if let Some(id) = &response.id {
                current.record(genai_attrs::GEN_AI_RESPONSE_ID, id.as_str());
            }
            if let Some(reason) = &response.stop_reason {
                current.record(genai_attrs::GEN_AI_RESPONSE_FINISH_REASONS, reason.as_str());
            }
            if let Some(usage) = &response.usage {
                current.record(genai_attrs::GEN_AI_USAGE_INPUT_TOKENS, usage.input_tokens);
                current.record(genai_attrs::GEN_AI_USAGE_OUTPUT_TOKENS, usage.output_tokens);
            }

            Ok(GenerationResponse {
                text: response_text(&response)?,
                model: response.model.unwrap_or_else(|| self.model_id.clone()),
            })
        }
        .instrument(span)
        .await
    }
}

fn response_text(response: &ClaudeResponse) -> Result<String, LlmError> {
    let text = response
        .content
        .iter()
        .filter_map(|block| match block {
            ClaudeContent::Text { text } => Some(text.as_str()),
            ClaudeContent::Other => None,
        })
        .collect::<Vec<_>>()
        .join("");
    if text.is_empty() {
        return Err(LlmError::EmptyResponse);
    }
    Ok(text)
}

fn map_transport_error(e: TransportError) -> LlmError {
    match e {
        TransportError::Status { status, body } => match status {
            401 | 403 => LlmError::AuthenticationFailed,
            400 => LlmError::InvalidRequest(body),
            429 => LlmError::RateLimited { retry_after_ms: None },
            529 => LlmError::Overloaded(body),
            s if s >= 500 => LlmError::Provider {
                message: format!("Bedrock server error HTTP {s}: {body}"),
            },
            s => LlmError::Provider {
                message: format!("HTTP {s}: {body}"),
            },
        },
        TransportError::Decode(msg) => LlmError::Deserialization(msg),
        other => LlmError::Provider {
            message: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_types::llm::ContentBlock;

    fn make_provider() -> BedrockGenerationProvider {
        BedrockGenerationProvider::new(
            &SecretString::from("bedrock-api-key-test-not-real".to_string()),
            "anthropic.claude-3-5-sonnet-20241022-v2:0",
            "us-east-1",
        )
        .unwrap()
    }

    #[test]
    fn test_provider_name_and_model() {
        let provider = make_provider();
        assert_eq!(provider.name(), "bedrock");
        assert_eq!(provider.model(), "anthropic.claude-3-5-sonnet-20241022-v2:0");
    }

    #[test]
    fn test_model_id_mapping() {
        assert_eq!(
            BedrockGenerationProvider::to_bedrock_model_id("claude-sonnet-4-5-20250929", "eu-west-1"),
            "eu.anthropic.claude-sonnet-4-5-20250929-v1:0"
        );
        let id = "us.anthropic.claude-sonnet-4-5-20250929-v1:0";
        assert_eq!(BedrockGenerationProvider::to_bedrock_model_id(id, "eu-west-1"), id);
    }

    #[test]
    fn test_request_carries_all_blocks_in_one_turn() {
        let provider = make_provider();
        let request = GenerationRequest {
            content: vec![
                ContentBlock::image_base64("image/png", "AAAA"),
                ContentBlock::text("What is shown?"),
            ],
            max_tokens: 2048,
            temperature: Some(0.7),
        };
        let json = serde_json::to_value(provider.to_claude_request(&request)).unwrap();
        assert_eq!(json["anthropic_version"], "bedrock-2023-05-31");
        assert_eq!(json["max_tokens"], 2048);
        assert_eq!(json["messages"].as_array().unwrap().len(), 1);
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"][0]["type"], "image");
        assert_eq!(json["messages"][0]["content"][1]["text"], "What is shown?");
    }

    #[test]
    fn test_response_text_joins_text_blocks() {
        let response = ClaudeResponse {
            id: None,
            model: None,
            content: vec![
                ClaudeContent::Text { text: "Hello ".into() },
                ClaudeContent::Other,
                ClaudeContent::Text { text: "world".into() },
            ],
            stop_reason: None,
            usage: None,
        };
        assert_eq!(response_text(&response).unwrap(), "Hello world");
    }

    #[test]
    fn test_empty_response_is_error() {
        let response = ClaudeResponse {
            id: None,
            model: None,
            content: vec![],
            stop_reason: None,
            usage: None,
        };
        assert!(matches!(response_text(&response), Err(LlmError::EmptyResponse)));
    }

    #[test]
    fn test_status_mapping() {
        let status = |status: u16| TransportError::Status {
            status,
            body: "x".into(),
        };
        assert!(matches!(map_transport_error(status(401)), LlmError::AuthenticationFailed));
        assert!(matches!(map_transport_error(status(400)), LlmError::InvalidRequest(_)));
        assert!(matches!(map_transport_error(status(429)), LlmError::RateLimited { .. }));
        assert!(matches!(map_transport_error(status(529)), LlmError::Overloaded(_)));
        assert!(matches!(map_transport_error(status(503)), LlmError::Provider { .. }));
    }
}
