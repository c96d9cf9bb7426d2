//! Query service: question in, grounded answer out.

use std::sync::Arc;

use strata_types::config::GenerationConfig;
use strata_types::error::RetrievalError;
use strata_types::llm::GenerationRequest;
use strata_types::query::{QueryRequest, QueryResponse};

use crate::llm::box_provider::BoxGenerationProvider;

use super::citation::format_sources;
use super::engine::{filter_by_floor, no_results_message, RetrievalEngine};
use super::evidence::EvidenceAssembler;

pub struct QueryService {
    engine: RetrievalEngine,
    evidence: EvidenceAssembler,
    generator: Arc<BoxGenerationProvider>,
    generation: GenerationConfig,
    /// Dimensions that have an index.
    dimensions: Vec<usize>,
}

impl QueryService {
    pub fn new(
        engine: RetrievalEngine,
        evidence: EvidenceAssembler,
        generator: Arc<BoxGenerationProvider>,
        generation: GenerationConfig,
        dimensions: Vec<usize>,
    ) -> Self {
        Self {
            engine,
            evidence,
            generator,
            generation,
            dimensions,
        }
    }

    pub fn model(&self) -> &str {
        self.generator.model()
    }

    /// Answer one question.
    #[tracing::instrument(skip_all, fields(query_len = request.query.len()))]
    pub async fn answer(&self, request: &QueryRequest) -> Result<QueryResponse, RetrievalError> {
        let query = request.query.trim();
        if query.is_empty() {
            return Err(RetrievalError::InvalidRequest("Query is required".to_string()));
        }

        let settings = self.engine.settings();
        let dimension = request.dimension.unwrap_or(settings.default_dimension);
        if !self.dimensions.contains(&dimension) {
            return Err(RetrievalError::InvalidRequest(format!(
                "dimension must be one of {:?}",
                self.dimensions
            )));
        }
        let k = request.k.unwrap_or(settings.default_k).max(1);
        let hierarchical = request.hierarchical.unwrap_or(settings.hierarchical);
        let floor = settings.similarity_floor;
        let floor_pct = format!("{:.0}%", floor * 100.0);

        let mut steps = Vec::new();
        let embed_dimension = if hierarchical {
            dimension.max(settings.second_pass_dimension)
        } else {
            dimension
        };
        steps.push(format!(
            "Embedding query at {embed_dimension} dimensions using {}",
            self.engine.model_id()
        ));
        let vector = self.engine.embed_query(query, embed_dimension).await?;
        steps.push("Query embedded successfully".to_string());

        let results = if hierarchical {
            steps.push(format!(
                "Hierarchical search: first pass at {}d for top {} candidates",
                settings.first_pass_dimension, settings.first_pass_k
            ));
            let outcome = self.engine.hierarchical_search(&vector, k).await?;
            steps.push(format!("Found {} candidates from fast search", outcome.candidates));
            steps.push(format!(
                "Second pass at {}d refined to {} matches",
                settings.second_pass_dimension,
                outcome.results.len()
            ));
            outcome.results
        } else {
            steps.push(format!("Searching {dimension}d vector index"));
            let results = self.engine.simple_search(&vector, dimension, k).await?;
            steps.push(format!("Found {} potential matches", results.len()));
            results
        };

        let total = results.len();
        let relevant = filter_by_floor(results, floor);
        steps.push(format!(
            "Filtered to {} highly relevant sources (>= {floor_pct} similarity)",
            relevant.len()
        ));
        tracing::info!(total, relevant = relevant.len(), hierarchical, dimension, "search complete");

        if relevant.is_empty() {
            steps.push(format!("No relevant sources found above {floor_pct} similarity threshold"));
            return Ok(QueryResponse {
                answer: no_results_message(total, floor),
                sources: Vec::new(),
                model: self.model().to_string(),
                query: query.to_string(),
                dimension,
                results_found: 0,
                processing_steps: steps,
            });
        }

        steps.push("Fetching media content and preparing context".to_string());
        let content = self.evidence.assemble(query, &relevant).await;

        steps.push(format!("Generating response with {}", self.model()));
        let generated = self
            .generator
            .generate(&GenerationRequest {
                content,
                max_tokens: self.generation.max_tokens,
                temperature: Some(self.generation.temperature),
            })
            .await
            .map_err(|e| RetrievalError::Generation(e.to_string()))?;
        steps.push("Response generated successfully".to_string());

        Ok(QueryResponse {
            answer: generated.text,
            sources: format_sources(&relevant),
            model: self.model().to_string(),
            query: query.to_string(),
            dimension,
            results_found: relevant.len(),
            processing_steps: steps,
        })
    }
}
