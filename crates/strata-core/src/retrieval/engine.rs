//! Retrieval engine.
//!
//! Embeds queries and searches the per-dimension indexes, either in a single
//! pass or hierarchically: a cheap low-dimension pass for recall followed by
//! a higher-dimension pass for precision.

use std::collections::HashMap;
use std::sync::Arc;

use strata_types::config::{HierarchicalStrategy, SearchConfig};
use strata_types::error::RetrievalError;
use strata_types::vector::{DistanceMetric, RetrievalResult};

use crate::embedding::box_service::BoxEmbeddingService;
use crate::transform::{cosine_similarity, truncate_and_normalize};
use crate::vector::box_index::BoxVectorIndex;

/// Results of a two-pass search.
#[derive(Debug, Clone)]
pub struct HierarchicalOutcome {
    pub results: Vec<RetrievalResult>,
    /// Number of candidates the first pass returned.
    pub candidates: usize,
    /// The strategy that actually ran.
    pub strategy: HierarchicalStrategy,
}

pub struct RetrievalEngine {
    embedder: Arc<BoxEmbeddingService>,
    index: Arc<BoxVectorIndex>,
    settings: SearchConfig,
}

impl RetrievalEngine {
    pub fn new(embedder: Arc<BoxEmbeddingService>, index: Arc<BoxVectorIndex>, settings: SearchConfig) -> Self {
        Self {
            embedder,
            index,
            settings,
        }
    }

    pub fn settings(&self) -> &SearchConfig {
        &self.settings
    }

    pub fn model_id(&self) -> &str {
        self.embedder.model_id()
    }

    /// Embed a query at exactly `dimension` dimensions.
    pub async fn embed_query(&self, text: &str, dimension: usize) -> Result<Vec<f32>, RetrievalError> {
        let vector = self
            .embedder
            .embed_text(text, dimension)
            .await
            .map_err(|e| RetrievalError::Embedding(e.to_string()))?;
        if vector.len() != dimension {
            return Err(RetrievalError::Embedding(format!(
                "expected a {dimension}-dimensional query embedding, got {}",
                vector.len()
            )));
        }
        tracing::debug!(dimension, "query embedded");
        Ok(vector)
    }

    /// Nearest neighbours in the `dimension` index.
    ///
    /// A longer query vector is truncated and renormalized first.
    pub async fn simple_search(
        &self,
        vector: &[f32],
        dimension: usize,
        k: usize,
    ) -> Result<Vec<RetrievalResult>, RetrievalError> {
        let query = fit_query(vector, dimension)?;

        let metric = self.index.metric();
        let matches = self
            .index
            .query(dimension, &query, k)
            .await
            .map_err(|e| RetrievalError::Search(e.to_string()))?;
        tracing::debug!(dimension, k, found = matches.len(), "index searched");

        Ok(matches
            .into_iter()
            .map(|m| RetrievalResult::from_match(m, metric))
            .collect())
    }

    /// Two-pass search returning at most `second_pass_k` (default `final_k`)
    /// results from the precise pass.
    pub async fn hierarchical_search(
        &self,
        vector: &[f32],
        final_k: usize,
    ) -> Result<HierarchicalOutcome, RetrievalError> {
        let s = &self.settings;
        let second_k = s.second_pass_k.unwrap_or(final_k);

        if s.strategy == HierarchicalStrategy::ReRank && self.index.returns_vectors() {
            let candidates = self
                .simple_search(vector, s.first_pass_dimension, s.first_pass_k)
                .await?;
            let precise = fit_query(vector, s.second_pass_dimension)?;
            let keys: Vec<String> = candidates.iter().map(|r| r.key.clone()).collect();
            let stored = self
                .index
                .vectors(s.second_pass_dimension, &keys)
                .await
                .map_err(|e| RetrievalError::Search(e.to_string()))?;
            tracing::debug!(
                candidates = keys.len(),
                rescored = stored.len(),
                dimension = s.second_pass_dimension,
                "re-ranking first-pass candidates"
            );

            let count = candidates.len();
            return Ok(HierarchicalOutcome {
                results: rerank(candidates, &precise, &stored, self.index.metric(), second_k),
                candidates: count,
                strategy: HierarchicalStrategy::ReRank,
            });
        }

        if s.strategy == HierarchicalStrategy::ReRank {
            tracing::debug!("index cannot return stored vectors, searching the precise index instead");
        }

        let (first, second) = tokio::join!(
            self.simple_search(vector, s.first_pass_dimension, s.first_pass_k),
            self.simple_search(vector, s.second_pass_dimension, second_k),
        );
        let candidates = first?.len();
        Ok(HierarchicalOutcome {
            results: second?,
            candidates,
            strategy: HierarchicalStrategy::ReSearch,
        })
    }
}

/// The query at exactly `dimension` values, truncated and renormalized when
/// longer.
fn fit_query(vector: &[f32], dimension: usize) -> Result<Vec<f32>, RetrievalError> {
    match vector.len() {
        len if len == dimension => Ok(vector.to_vec()),
        len if len > dimension => {
            truncate_and_normalize(vector, dimension).map_err(|e| RetrievalError::Search(e.to_string()))
        }
        len => Err(RetrievalError::Search(format!(
            "a {len}-dimensional query cannot search the {dimension}d index"
        ))),
    }
}

/// Re-score candidates against `query` using the stored vectors in `stored`.
///
/// Scores go through `metric` so they share the `[0, 1]` scale of index
/// similarities. A candidate with no stored vector of at least the query's
/// length keeps its index similarity.
pub fn rerank(
    results: Vec<RetrievalResult>,
    query: &[f32],
    stored: &HashMap<String, Vec<f32>>,
    metric: DistanceMetric,
    k: usize,
) -> Vec<RetrievalResult> {
    let mut scored: Vec<RetrievalResult> = results
        .into_iter()
        .map(|mut r| {
            if let Some(v) = stored.get(&r.key).filter(|v| !v.is_empty() && v.len() >= query.len()) {
                let cosine = cosine_similarity(query, &v[..query.len()]);
                r.similarity = metric.similarity_from_cosine(cosine);
                r.distance = metric.distance_from_cosine(cosine);
            }
            r
        })
        .collect();
    scored.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
    scored.truncate(k);
    scored
}

/// Drop results below `floor`, preserving order.
pub fn filter_by_floor(results: Vec<RetrievalResult>, floor: f32) -> Vec<RetrievalResult> {
    results.into_iter().filter(|r| r.similarity >= floor).collect()
}

/// Answer returned when no result survives the similarity floor.
pub fn no_results_message(total: usize, floor: f32) -> String {
    if total == 0 {
        return "I have no information in the knowledge base to answer that question.\n\n\
                The knowledge base appears to be empty or your query did not match any indexed content.\n\n\
                Try:\n\
                \u{2022} Checking that files have been uploaded to the source bucket\n\
                \u{2022} Waiting a few minutes if files were just uploaded\n\
                \u{2022} Verifying that ingestion completed successfully"
            .to_string();
    }
    format!(
        "I couldn't find relevant information in the knowledge base to answer that question.\n\n\
         I found {total} potential matches, but none were similar enough to your query \
         (below {:.0}% similarity threshold).\n\n\
         Try:\n\
         \u{2022} Using different keywords or phrasing\n\
         \u{2022} Being more specific about what you're looking for\n\
         \u{2022} Asking about content you know exists in the uploaded files",
        floor * 100.0
    )
}
