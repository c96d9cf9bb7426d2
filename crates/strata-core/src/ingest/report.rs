//! Ingestion run reports.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use strata_types::error::IngestError;
use strata_types::media::{ObjectLocation, SourceObject};

/// Terminal outcome of one ingestion run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestionStatus {
    Succeeded,
    /// Some document pages failed; the rest were stored.
    PartiallySucceeded,
    Failed,
}

impl std::fmt::Display for IngestionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IngestionStatus::Succeeded => write!(f, "succeeded"),
            IngestionStatus::PartiallySucceeded => write!(f, "partially_succeeded"),
            IngestionStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Outcome of one document page.
#[derive(Debug, Clone, Serialize)]
pub struct PageReport {
    pub page_number: u32,
    pub object_id: String,
    pub vectors_stored: usize,
    pub error: Option<String>,
}

impl PageReport {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Summary of one ingestion run.
#[derive(Debug, Clone, Serialize)]
pub struct IngestionReport {
    pub run_id: Uuid,
    pub object_id: Option<String>,
    pub location: ObjectLocation,
    pub file_name: Option<String>,
    pub status: IngestionStatus,
    pub vectors_stored: usize,
    /// Per-page outcomes, in page order. Empty unless a document fanned out.
    pub pages: Vec<PageReport>,
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl IngestionReport {
    pub(crate) fn failed(
        run_id: Uuid,
        location: ObjectLocation,
        object: Option<&SourceObject>,
        error: &IngestError,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            run_id,
            object_id: object.map(|o| o.object_id.clone()),
            location,
            file_name: object.map(|o| o.file_name.clone()),
            status: IngestionStatus::Failed,
            vectors_stored: 0,
            pages: Vec::new(),
            error: Some(error.to_string()),
            started_at,
            finished_at: Utc::now(),
        }
    }

    pub(crate) fn completed(
        run_id: Uuid,
        object: &SourceObject,
        vectors_stored: usize,
        pages: Vec<PageReport>,
        started_at: DateTime<Utc>,
    ) -> Self {
        let failed_pages = pages.iter().filter(|p| !p.succeeded()).count();
        let (status, error) = match failed_pages {
            0 => (IngestionStatus::Succeeded, None),
            n if n == pages.len() => (
                IngestionStatus::Failed,
                Some(format!("all {n} pages failed")),
            ),
            n => (
                IngestionStatus::PartiallySucceeded,
                Some(format!("{n} of {} pages failed", pages.len())),
            ),
        };
        Self {
            run_id,
            object_id: Some(object.object_id.clone()),
            location: object.location.clone(),
            file_name: Some(object.file_name.clone()),
            status,
            vectors_stored,
            pages,
            error,
            started_at,
            finished_at: Utc::now(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status != IngestionStatus::Failed
    }
}
