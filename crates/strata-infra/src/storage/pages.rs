//! Discovery of pre-rendered document artifacts.
//!
//! Rendering happens outside Strata. For a document at `docs/report.pdf` the
//! renderer writes page images to `pdf-pages/docs/report/page_{n}.png` and,
//! for `docs/report.docx`, the extracted text to `docx-text/docs/report.txt`,
//! both in the document's own bucket.

use std::sync::Arc;

use strata_core::storage::blob_store::BlobStore;
use strata_core::storage::extractor::DocumentExtractor;
use strata_types::error::ServiceError;
use strata_types::media::{DOCX_TEXT_PREFIX, MediaKind, ObjectLocation, PDF_PAGES_PREFIX, SourceObject};

pub struct PrerenderedPageExtractor<B> {
    blobs: Arc<B>,
}

impl<B> PrerenderedPageExtractor<B> {
    pub fn new(blobs: Arc<B>) -> Self {
        Self { blobs }
    }
}

/// Document key without its extension.
fn key_stem(key: &str) -> &str {
    let name_start = key.rfind('/').map_or(0, |i| i + 1);
    match key[name_start..].rfind('.') {
        Some(dot) if dot > 0 => &key[..name_start + dot],
        _ => key,
    }
}

/// Page number embedded in a page file name (`page_12.png` -> 12).
fn page_number(location: &ObjectLocation) -> Option<u64> {
    let name = location.file_name();
    let stem = name.rsplit_once('.').map_or(name, |(stem, _)| stem);
    let digits: String = stem
        .chars()
        .rev()
        .take_while(|c| c.is_ascii_digit())
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    digits.parse().ok()
}

fn is_page_image(location: &ObjectLocation) -> bool {
    matches!(MediaKind::from_extension(&location.extension()), Ok(MediaKind::Image(_)))
}

impl<B: BlobStore + 'static> DocumentExtractor for PrerenderedPageExtractor<B> {
    async fn pages(&self, document: &SourceObject) -> Result<Vec<ObjectLocation>, ServiceError> {
        let prefix = ObjectLocation::new(
            document.location.bucket.clone(),
            format!("{PDF_PAGES_PREFIX}{}/", key_stem(&document.location.key)),
        );
        let mut pages: Vec<ObjectLocation> = self
            .blobs
            .list(&prefix)
            .await?
            .into_iter()
            .filter(is_page_image)
            .collect();
        // page_2 before page_10
        pages.sort_by(|a, b| {
            page_number(a)
                .cmp(&page_number(b))
                .then_with(|| a.key.cmp(&b.key))
        });
        tracing::debug!(document = %document.location, pages = pages.len(), "rendered pages found");
        Ok(pages)
    }

    async fn extracted_text(&self, document: &SourceObject) -> Result<ObjectLocation, ServiceError> {
        let location = ObjectLocation::new(
            document.location.bucket.clone(),
            format!("{DOCX_TEXT_PREFIX}{}.txt", key_stem(&document.location.key)),
        );
        self.blobs.head(&location).await?;
        Ok(location)
    }
}
