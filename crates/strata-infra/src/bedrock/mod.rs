//! AWS Bedrock adapters.
//!
//! [`BedrockEmbeddingClient`] implements the embedding service (async
//! segmented jobs plus synchronous query embeddings) and
//! [`BedrockGenerationProvider`] implements answer generation with Claude.
//! Both authenticate with a Bedrock API key sent as a Bearer token.

mod embedding;
mod generation;
mod transport;
pub mod types;

pub use embedding::BedrockEmbeddingClient;
pub use generation::BedrockGenerationProvider;
