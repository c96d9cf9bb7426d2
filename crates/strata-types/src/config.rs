//! Configuration types for Strata.
//!
//! `StrataConfig` represents the `config.toml` in the data directory. Every
//! field has a default, so an empty file (or no file) yields a working
//! configuration.

use serde::{Deserialize, Serialize};

use std::path::PathBuf;

/// Top-level configuration.
///
/// Loaded from `~/.strata/config.toml`. All sections have sensible defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StrataConfig {
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub ingestion: IngestionConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub evidence: EvidenceConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

// ---------------------------------------------------------------------------
// Embedding
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_model")]
    pub model_id: String,
    #[serde(default = "default_region")]
    pub region: String,
    /// Dimensions every segment is stored at. The largest is the job dimension.
    #[serde(default = "default_dimensions")]
    pub dimensions: Vec<usize>,
    #[serde(default = "default_text_max_chars")]
    pub text_max_chars: usize,
    #[serde(default = "default_media_segment_seconds")]
    pub media_segment_seconds: u32,
    #[serde(default = "default_image_detail_level")]
    pub image_detail_level: String,
    #[serde(default = "default_video_embedding_mode")]
    pub video_embedding_mode: String,
}

fn default_embedding_model() -> String {
    "amazon.nova-2-multimodal-embeddings-v1:0".to_string()
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_dimensions() -> Vec<usize> {
    vec![256, 384, 1024, 3072]
}

fn default_text_max_chars() -> usize {
    32_000
}

fn default_media_segment_seconds() -> u32 {
    5
}

fn default_image_detail_level() -> String {
    "STANDARD_IMAGE".to_string()
}

fn default_video_embedding_mode() -> String {
    "AUDIO_VIDEO_COMBINED".to_string()
}

impl EmbeddingConfig {
    /// Dimension the embedding job is asked to produce (the largest configured).
    pub fn job_dimension(&self) -> usize {
        self.dimensions.iter().copied().max().unwrap_or(3072)
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model_id: default_embedding_model(),
            region: default_region(),
            dimensions: default_dimensions(),
            text_max_chars: default_text_max_chars(),
            media_segment_seconds: default_media_segment_seconds(),
            image_detail_level: default_image_detail_level(),
            video_embedding_mode: default_video_embedding_mode(),
        }
    }
}

// ---------------------------------------------------------------------------
// Ingestion
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionConfig {
    /// Bucket the embedding service writes job output to.
    #[serde(default = "default_output_bucket")]
    pub output_bucket: String,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Applied by the workflow driver around a whole ingestion.
    #[serde(default = "default_workflow_timeout_secs")]
    pub workflow_timeout_secs: u64,
    #[serde(default = "default_max_page_concurrency")]
    pub max_page_concurrency: usize,
}

fn default_output_bucket() -> String {
    "strata-embeddings-output".to_string()
}

fn default_poll_interval_secs() -> u64 {
    30
}

fn default_workflow_timeout_secs() -> u64 {
    2 * 60 * 60
}

fn default_max_page_concurrency() -> usize {
    10
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            output_bucket: default_output_bucket(),
            poll_interval_secs: default_poll_interval_secs(),
            workflow_timeout_secs: default_workflow_timeout_secs(),
            max_page_concurrency: default_max_page_concurrency(),
        }
    }
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

/// How the second hierarchical pass is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HierarchicalStrategy {
    /// Search the higher-dimension index independently.
    #[default]
    ReSearch,
    /// Re-rank first-pass candidates locally using their returned vectors.
    ReRank,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_query_dimension")]
    pub default_dimension: usize,
    #[serde(default = "default_k")]
    pub default_k: usize,
    #[serde(default = "default_hierarchical")]
    pub hierarchical: bool,
    #[serde(default = "default_first_pass_dimension")]
    pub first_pass_dimension: usize,
    #[serde(default = "default_first_pass_k")]
    pub first_pass_k: usize,
    #[serde(default = "default_second_pass_dimension")]
    pub second_pass_dimension: usize,
    /// Defaults to the request's `k`.
    #[serde(default)]
    pub second_pass_k: Option<usize>,
    #[serde(default)]
    pub strategy: HierarchicalStrategy,
    #[serde(default = "default_similarity_floor")]
    pub similarity_floor: f32,
}

fn default_query_dimension() -> usize {
    1024
}

fn default_k() -> usize {
    5
}

fn default_hierarchical() -> bool {
    true
}

fn default_first_pass_dimension() -> usize {
    256
}

fn default_first_pass_k() -> usize {
    20
}

fn default_second_pass_dimension() -> usize {
    1024
}

fn default_similarity_floor() -> f32 {
    0.60
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_dimension: default_query_dimension(),
            default_k: default_k(),
            hierarchical: default_hierarchical(),
            first_pass_dimension: default_first_pass_dimension(),
            first_pass_k: default_first_pass_k(),
            second_pass_dimension: default_second_pass_dimension(),
            second_pass_k: None,
            strategy: HierarchicalStrategy::default(),
            similarity_floor: default_similarity_floor(),
        }
    }
}

// ---------------------------------------------------------------------------
// Evidence
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceConfig {
    #[serde(default = "default_text_char_budget")]
    pub text_char_budget: usize,
    #[serde(default = "default_image_max_bytes")]
    pub image_max_bytes: u64,
}

fn default_text_char_budget() -> usize {
    2000
}

fn default_image_max_bytes() -> u64 {
    5 * 1024 * 1024
}

impl Default for EvidenceConfig {
    fn default() -> Self {
        Self {
            text_char_budget: default_text_char_budget(),
            image_max_bytes: default_image_max_bytes(),
        }
    }
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_generation_model")]
    pub model_id: String,
    /// Region of the generation endpoint, if different from the embedding one.
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
}

fn default_generation_model() -> String {
    "anthropic.claude-3-5-sonnet-20241022-v2:0".to_string()
}

fn default_max_tokens() -> u32 {
    2048
}

fn default_temperature() -> f64 {
    0.7
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model_id: default_generation_model(),
            region: None,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

// ---------------------------------------------------------------------------
// Storage / server
// ---------------------------------------------------------------------------

/// Which vector index implementation backs the dimension indexes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexBackend {
    #[default]
    Lance,
    Memory,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory buckets are mapped under. Defaults to `{data_dir}/blobs`.
    #[serde(default)]
    pub blob_root: Option<PathBuf>,
    /// LanceDB directory. Defaults to `{data_dir}/vectors`.
    #[serde(default)]
    pub vector_path: Option<PathBuf>,
    #[serde(default)]
    pub index_backend: IndexBackend,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}
