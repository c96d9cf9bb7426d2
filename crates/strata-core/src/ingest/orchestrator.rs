//! Ingestion orchestrator.
//!
//! Runs one uploaded object through the full pipeline: resolve its metadata,
//! pick the media kind, submit the embedding job, poll it to completion and
//! write every dimension variant of every segment. Scanned documents fan out
//! into one job per rendered page, bounded by a semaphore; a failed page
//! never aborts its siblings.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::Instrument;
use uuid::Uuid;

use strata_types::config::StrataConfig;
use strata_types::error::IngestError;
use strata_types::media::{MediaKind, ObjectLocation, SourceObject};

use crate::embedding::box_service::BoxEmbeddingService;
use crate::storage::box_blob_store::BoxBlobStore;
use crate::storage::extractor::BoxDocumentExtractor;
use crate::vector::box_index::BoxVectorIndex;

use super::job_config::{build_job_request, output_location};
use super::machine::{run_to_completion, BoxScheduler, JobMachine};
use super::report::{IngestionReport, PageReport};
use super::writer::IndexWriter;

const UNKNOWN_CONTENT_TYPE: &str = "unknown";

/// Collaborators shared by every ingestion run.
pub struct IngestContext {
    pub embedder: Arc<BoxEmbeddingService>,
    pub index: Arc<BoxVectorIndex>,
    pub blobs: Arc<BoxBlobStore>,
    pub extractor: Arc<BoxDocumentExtractor>,
    pub scheduler: Arc<BoxScheduler>,
    pub config: StrataConfig,
}

/// Drives ingestion runs. Cheap to clone.
#[derive(Clone)]
pub struct IngestionOrchestrator {
    ctx: Arc<IngestContext>,
}

impl IngestionOrchestrator {
    pub fn new(ctx: IngestContext) -> Self {
        Self { ctx: Arc::new(ctx) }
    }

    pub fn context(&self) -> &IngestContext {
        &self.ctx
    }

    /// Ingest one uploaded object and report the outcome.
    ///
    /// Never returns an error: every failure is captured in the report. No
    /// deadline applies here; see [`super::driver::drive`].
    pub async fn ingest(&self, location: ObjectLocation) -> IngestionReport {
        let run_id = Uuid::now_v7();
        let span = tracing::info_span!("ingest", %run_id, source = %location);
        self.run(run_id, location).instrument(span).await
    }

    async fn run(&self, run_id: Uuid, location: ObjectLocation) -> IngestionReport {
        let started_at = Utc::now();

        let object = match prepare(&self.ctx, &location).await {
            Ok(object) => object,
            Err(e) => {
                tracing::warn!("cannot read source object: {e}");
                return IngestionReport::failed(run_id, location, None, &e, started_at);
            }
        };

        let kind = match MediaKind::from_extension(&object.file_type) {
            Ok(kind) => kind,
            Err(e) => {
                tracing::warn!(file_type = %object.file_type, "rejecting unsupported upload");
                return IngestionReport::failed(run_id, location, Some(&object), &e, started_at);
            }
        };

        let report = match self.dispatch(&object, kind).await {
            Ok((stored, pages)) => IngestionReport::completed(run_id, &object, stored, pages, started_at),
            Err(e) => IngestionReport::failed(run_id, location, Some(&object), &e, started_at),
        };

        tracing::info!(
            object_id = %object.object_id,
            status = %report.status,
            vectors_stored = report.vectors_stored,
            "ingestion finished"
        );
        report
    }

    async fn dispatch(
        &self,
        object: &SourceObject,
        kind: MediaKind,
    ) -> Result<(usize, Vec<PageReport>), IngestError> {
        match kind {
            MediaKind::Pdf => self.ingest_document_pages(object).await,
            MediaKind::Docx => {
                let text = self
                    .ctx
                    .extractor
                    .extracted_text(object)
                    .await
                    .map_err(|e| IngestError::Extraction(e.to_string()))?;
                let text_object = derived_text_object(&self.ctx, object, text).await?;
                let stored = ingest_single(&self.ctx, text_object, MediaKind::Text).await?;
                Ok((stored, Vec::new()))
            }
            kind => {
                let stored = ingest_single(&self.ctx, object.clone(), kind).await?;
                Ok((stored, Vec::new()))
            }
        }
    }

    async fn ingest_document_pages(
        &self,
        document: &SourceObject,
    ) -> Result<(usize, Vec<PageReport>), IngestError> {
        let pages = self
            .ctx
            .extractor
            .pages(document)
            .await
            .map_err(|e| IngestError::Extraction(e.to_string()))?;

        match pages.len() {
            0 => Err(IngestError::Extraction(format!(
                "no rendered pages found for {}",
                document.location
            ))),
            1 => {
                let page = ingest_page(&self.ctx, document, pages[0].clone(), 1, 1).await?;
                Ok((page, Vec::new()))
            }
            total => {
                tracing::info!(total, "fanning out document pages");
                let reports = self.fan_out(document, pages).await;
                let stored = reports.iter().map(|p| p.vectors_stored).sum();
                Ok((stored, reports))
            }
        }
    }

    /// Ingest every page concurrently, at most `max_page_concurrency` at a time.
    async fn fan_out(&self, document: &SourceObject, pages: Vec<ObjectLocation>) -> Vec<PageReport> {
        let total = pages.len() as u32;
        let permits = self.ctx.config.ingestion.max_page_concurrency.max(1);
        let semaphore = Arc::new(Semaphore::new(permits));
        let mut join_set = JoinSet::new();

        for (idx, page_location) in pages.into_iter().enumerate() {
            let page_number = idx as u32 + 1;
            let ctx = Arc::clone(&self.ctx);
            let semaphore = Arc::clone(&semaphore);
            let document = document.clone();
            let span = tracing::info_span!("page", page_number);

            join_set.spawn(
                async move {
                    let object_id = format!("{}_page_{page_number}", document.object_id);
                    let result = match semaphore.acquire_owned().await {
                        Ok(_permit) => ingest_page(&ctx, &document, page_location, page_number, total).await,
                        Err(e) => Err(IngestError::Source(format!("page scheduling closed: {e}"))),
                    };
                    match result {
                        Ok(vectors_stored) => PageReport {
                            page_number,
                            object_id,
                            vectors_stored,
                            error: None,
                        },
                        Err(e) => {
                            tracing::warn!("page failed: {e}");
                            PageReport {
                                page_number,
                                object_id,
                                vectors_stored: 0,
                                error: Some(e.to_string()),
                            }
                        }
                    }
                }
                .instrument(span),
            );
        }

        let mut reports = Vec::with_capacity(total as usize);
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(report) => reports.push(report),
                Err(e) => tracing::error!("page task panicked: {e}"),
            }
        }
        reports.sort_by_key(|p| p.page_number);
        reports
    }
}

/// Read object attributes and build the immutable source object.
async fn prepare(ctx: &IngestContext, location: &ObjectLocation) -> Result<SourceObject, IngestError> {
    let info = ctx
        .blobs
        .head(location)
        .await
        .map_err(|e| IngestError::Source(format!("{location}: {e}")))?;

    Ok(SourceObject {
        file_name: location.file_name().to_string(),
        file_type: location.extension(),
        size_bytes: info.size_bytes,
        uploaded_at: info.last_modified,
        content_type: info
            .content_type
            .unwrap_or_else(|| UNKNOWN_CONTENT_TYPE.to_string()),
        object_id: SourceObject::generate_object_id(&location.key, Utc::now()),
        location: location.clone(),
        page: None,
    })
}

/// The extracted text of a word document, shown under the document's name.
async fn derived_text_object(
    ctx: &IngestContext,
    document: &SourceObject,
    text: ObjectLocation,
) -> Result<SourceObject, IngestError> {
    let info = ctx
        .blobs
        .head(&text)
        .await
        .map_err(|e| IngestError::Extraction(format!("{text}: {e}")))?;
    Ok(SourceObject {
        file_type: text.extension(),
        size_bytes: info.size_bytes,
        content_type: info.content_type.unwrap_or_else(|| "text/plain".to_string()),
        location: text,
        file_name: document.file_name.clone(),
        uploaded_at: document.uploaded_at,
        object_id: document.object_id.clone(),
        page: None,
    })
}

async fn ingest_page(
    ctx: &IngestContext,
    document: &SourceObject,
    page_location: ObjectLocation,
    page_number: u32,
    total_pages: u32,
) -> Result<usize, IngestError> {
    let info = ctx
        .blobs
        .head(&page_location)
        .await
        .map_err(|e| IngestError::Extraction(format!("{page_location}: {e}")))?;
    let content_type = info
        .content_type
        .unwrap_or_else(|| UNKNOWN_CONTENT_TYPE.to_string());
    let page = document.page_object(page_location, page_number, total_pages, info.size_bytes, content_type);
    let kind = MediaKind::from_extension(&page.file_type)?;
    ingest_single(ctx, page, kind).await
}

/// Submit, poll and store one embeddable object.
async fn ingest_single(ctx: &IngestContext, object: SourceObject, kind: MediaKind) -> Result<usize, IngestError> {
    let request = build_job_request(&object, kind, &ctx.config.embedding)?;
    let output = output_location(&object, &ctx.config.ingestion);
    let poll_interval = Duration::from_secs(ctx.config.ingestion.poll_interval_secs);

    let machine = JobMachine::submit(&ctx.embedder, object, request, output, poll_interval).await?;
    let job = run_to_completion(machine, &ctx.embedder, &ctx.scheduler).await?;

    IndexWriter::new(&ctx.blobs, &ctx.index, &ctx.config.embedding.dimensions)
        .store_job_output(&job)
        .await
}
