//! Workflow driver.
//!
//! Bounds a whole ingestion run by `workflow_timeout_secs`. The orchestrator
//! and the job state machine carry no deadline of their own; the CLI and the
//! HTTP trigger both ingest through [`drive`].

use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;

use strata_types::error::IngestError;
use strata_types::media::ObjectLocation;

use super::orchestrator::IngestionOrchestrator;
use super::report::IngestionReport;

/// Ingest `location`, failing the run once the workflow timeout elapses.
pub async fn drive(orchestrator: &IngestionOrchestrator, location: ObjectLocation) -> IngestionReport {
    let timeout_secs = orchestrator.context().config.ingestion.workflow_timeout_secs;
    let started_at = Utc::now();

    match tokio::time::timeout(Duration::from_secs(timeout_secs), orchestrator.ingest(location.clone())).await {
        Ok(report) => report,
        Err(_) => {
            let error = IngestError::Timeout(timeout_secs);
            tracing::error!(source = %location, timeout_secs, "ingestion abandoned: {error}");
            IngestionReport::failed(Uuid::now_v7(), location, None, &error, started_at)
        }
    }
}
