//! Evidence assembly.
//!
//! Turns surviving search results into the multimodal content handed to the
//! generation service: inline images first, then one instructional text
//! block carrying text excerpts, media segment descriptions and the
//! question. A source that cannot be fetched contributes nothing.

use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

use strata_types::config::EvidenceConfig;
use strata_types::llm::ContentBlock;
use strata_types::media::ObjectLocation;
use strata_types::segment::Modality;
use strata_types::vector::{RetrievalResult, VectorMetadata};

use crate::storage::box_blob_store::BoxBlobStore;

const NO_CONTEXT: &str = "No additional context";

pub struct EvidenceAssembler {
    blobs: Arc<BoxBlobStore>,
    settings: EvidenceConfig,
}

impl EvidenceAssembler {
    pub fn new(blobs: Arc<BoxBlobStore>, settings: EvidenceConfig) -> Self {
        Self { blobs, settings }
    }

    /// Build the content blocks for `query` from `results`, in result order.
    pub async fn assemble(&self, query: &str, results: &[RetrievalResult]) -> Vec<ContentBlock> {
        let mut blocks = Vec::new();
        let mut context = Vec::new();

        for result in results {
            let metadata = &result.metadata;
            let file_name = metadata.file_name();
            match metadata.modality() {
                Some(Modality::Image) => {
                    let Some(location) = source_location(metadata) else {
                        continue;
                    };
                    let Some(bytes) = self.fetch_image(&location).await else {
                        continue;
                    };
                    let media_type = if location.key.ends_with(".png") {
                        "image/png"
                    } else {
                        "image/jpeg"
                    };
                    blocks.push(ContentBlock::image_base64(media_type, BASE64.encode(&bytes)));

                    let n = blocks.len();
                    let is_pdf = metadata.get_bool("isPdf").unwrap_or(false);
                    match metadata.get_u64("processedPage").filter(|p| is_pdf && *p > 0) {
                        Some(page) => context.push(format!("Image {n}: Page {page} from {file_name}")),
                        None => context.push(format!("Image {n}: {file_name}")),
                    }
                }
                Some(Modality::Text) => {
                    let Some(location) = source_location(metadata) else {
                        continue;
                    };
                    if let Some(content) = self.fetch_text(&location, metadata).await {
                        context.push(format!("Text Source - {file_name}:\n{content}"));
                    }
                }
                Some(modality @ (Modality::Video | Modality::Audio)) => {
                    let index = metadata.get_u64("segmentIndex").unwrap_or(0);
                    let start = metadata.get_f64("segmentStartSeconds").unwrap_or(0.0);
                    let end = metadata.get_f64("segmentEndSeconds").unwrap_or(0.0);
                    context.push(format!(
                        "{modality} Source - {file_name} (segment {index}: {start:.1}s - {end:.1}s)"
                    ));
                }
                None => {
                    tracing::debug!(key = %result.key, "result has no recognised modality");
                }
            }
        }

        let context_text = if context.is_empty() {
            NO_CONTEXT.to_string()
        } else {
            context.join("\n\n")
        };
        blocks.push(ContentBlock::text(prompt(&context_text, query)));
        blocks
    }

    /// Image bytes, or `None` when the object is missing or over the inline
    /// size limit. The size is checked before downloading.
    async fn fetch_image(&self, location: &ObjectLocation) -> Option<Vec<u8>> {
        let info = match self.blobs.head(location).await {
            Ok(info) => info,
            Err(e) => {
                tracing::warn!(%location, "could not fetch image: {e}");
                return None;
            }
        };
        if info.size_bytes > self.settings.image_max_bytes {
            tracing::warn!(
                %location,
                size = info.size_bytes,
                limit = self.settings.image_max_bytes,
                "image exceeds the inline size limit"
            );
            return None;
        }
        match self.blobs.get(location).await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                tracing::warn!(%location, "could not fetch image: {e}");
                None
            }
        }
    }

    async fn fetch_text(&self, location: &ObjectLocation, metadata: &VectorMetadata) -> Option<String> {
        let bytes = match self.blobs.get(location).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(%location, "could not fetch text: {e}");
                return None;
            }
        };
        let full = String::from_utf8_lossy(&bytes);

        let excerpt: String = match (
            metadata.get_u64("segmentStartCharPosition"),
            metadata.get_u64("segmentEndCharPosition"),
        ) {
            (Some(start), Some(end)) => full
                .chars()
                .skip(start as usize)
                .take(end.saturating_sub(start) as usize)
                .collect(),
            _ => full.into_owned(),
        };

        Some(truncate_excerpt(excerpt, self.settings.text_char_budget))
    }
}

/// Cut `text` to `budget` characters, appending a marker when shortened.
pub fn truncate_excerpt(text: String, budget: usize) -> String {
    if text.chars().count() <= budget {
        return text;
    }
    let kept: String = text.chars().take(budget).collect();
    format!("{kept}\n\n[Content truncated - showing first {budget} characters]")
}

fn source_location(metadata: &VectorMetadata) -> Option<ObjectLocation> {
    let uri = metadata.get_str("sourceS3Uri").filter(|u| !u.is_empty())?;
    match uri.parse() {
        Ok(location) => Some(location),
        Err(e) => {
            tracing::warn!(%uri, "ignoring source: {e}");
            None
        }
    }
}

fn prompt(context: &str, query: &str) -> String {
    format!(
        "You are a helpful assistant answering questions based on a multimodal knowledge base.\n\
         \n\
         The images above show relevant content from the knowledge base. Additional context:\n\
         {context}\n\
         \n\
         User Question: {query}\n\
         \n\
         Instructions:\n\
         - Analyze the images carefully and extract all relevant information\n\
         - For document pages, read any text visible in the images\n\
         - Combine information from all sources to provide a comprehensive answer\n\
         - Cite which sources you used (e.g., \"According to Page 3 of document.pdf...\")\n\
         - Be specific and detailed based on what you can see in the images\n\
         - If you need more information than what's provided, acknowledge the limitation\n\
         \n\
         Answer:"
    )
}
