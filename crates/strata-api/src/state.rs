//! Application state wiring all services together.
//!
//! AppState holds the ingestion orchestrator and query service used by both
//! the CLI and the REST API. The core pipelines are written against ports;
//! AppState pins them to the concrete infra adapters chosen by config.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;

use strata_core::embedding::box_service::BoxEmbeddingService;
use strata_core::ingest::machine::{BoxScheduler, TokioScheduler};
use strata_core::ingest::orchestrator::{IngestContext, IngestionOrchestrator};
use strata_core::llm::box_provider::BoxGenerationProvider;
use strata_core::retrieval::engine::RetrievalEngine;
use strata_core::retrieval::evidence::EvidenceAssembler;
use strata_core::retrieval::service::QueryService;
use strata_core::storage::box_blob_store::BoxBlobStore;
use strata_core::storage::extractor::BoxDocumentExtractor;
use strata_core::vector::box_index::BoxVectorIndex;
use strata_infra::bedrock::{BedrockEmbeddingClient, BedrockGenerationProvider};
use strata_infra::config::{
    bedrock_api_key, blob_root, load_config, resolve_data_dir, vector_path, API_KEY_VARS,
};
use strata_infra::storage::{LocalBlobStore, PrerenderedPageExtractor};
use strata_infra::vector::{InMemoryVectorIndex, LanceVectorIndex, LanceVectorStore};
use strata_types::config::{IndexBackend, StrataConfig};

/// Shared application state.
///
/// Used by both CLI commands and REST API handlers. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: IngestionOrchestrator,
    pub query_service: Arc<QueryService>,
    /// Concrete blob store, for uploads from the CLI.
    pub blobs: LocalBlobStore,
    pub config: Arc<StrataConfig>,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Initialize the application state: load config, connect the index,
    /// wire Bedrock and storage adapters into the pipelines.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        tokio::fs::create_dir_all(&data_dir)
            .await
            .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;

        let config = load_config(&data_dir).await;

        let api_key = bedrock_api_key().with_context(|| {
            format!("No Bedrock API key found. Set one of: {}", API_KEY_VARS.join(", "))
        })?;

        let embedder = BedrockEmbeddingClient::new(
            &api_key,
            config.embedding.model_id.clone(),
            &config.embedding.region,
        )?;
        let generation_region = config
            .generation
            .region
            .clone()
            .unwrap_or_else(|| embedder.region().to_string());
        let generator =
            BedrockGenerationProvider::new(&api_key, &config.generation.model_id, &generation_region)?;

        let index = match config.storage.index_backend {
            IndexBackend::Lance => {
                let path = vector_path(&config, &data_dir);
                let store = LanceVectorStore::new(path.clone())
                    .await
                    .with_context(|| format!("Failed to open vector store at {}", path.display()))?;
                let existing = store.dimensions().await?;
                tracing::info!(path = %path.display(), ?existing, "vector indexes found");
                BoxVectorIndex::new(LanceVectorIndex::new(store))
            }
            IndexBackend::Memory => BoxVectorIndex::new(InMemoryVectorIndex::new()),
        };

        let blobs = LocalBlobStore::new(blob_root(&config, &data_dir));
        tracing::info!(
            data_dir = %data_dir.display(),
            blob_root = %blobs.root().display(),
            index_backend = ?config.storage.index_backend,
            "application state initialized"
        );

        Ok(Self::from_parts(
            BoxEmbeddingService::new(embedder),
            BoxGenerationProvider::new(generator),
            index,
            blobs,
            config,
            data_dir,
        ))
    }

    /// Wire already-constructed adapters into the pipelines.
    pub fn from_parts(
        embedder: BoxEmbeddingService,
        generator: BoxGenerationProvider,
        index: BoxVectorIndex,
        blobs: LocalBlobStore,
        config: StrataConfig,
        data_dir: PathBuf,
    ) -> Self {
        let embedder = Arc::new(embedder);
        let index = Arc::new(index);
        let boxed_blobs = Arc::new(BoxBlobStore::new(blobs.clone()));
        let extractor = Arc::new(BoxDocumentExtractor::new(PrerenderedPageExtractor::new(
            Arc::new(blobs.clone()),
        )));

        let orchestrator = IngestionOrchestrator::new(IngestContext {
            embedder: embedder.clone(),
            index: index.clone(),
            blobs: boxed_blobs.clone(),
            extractor,
            scheduler: Arc::new(BoxScheduler::new(TokioScheduler)),
            config: config.clone(),
        });

        let engine = RetrievalEngine::new(embedder, index, config.search.clone());
        let evidence = EvidenceAssembler::new(boxed_blobs, config.evidence.clone());
        let query_service = QueryService::new(
            engine,
            evidence,
            Arc::new(generator),
            config.generation.clone(),
            config.embedding.dimensions.clone(),
        );

        Self {
            orchestrator,
            query_service: Arc::new(query_service),
            blobs,
            config: Arc::new(config),
            data_dir,
        }
    }
}
