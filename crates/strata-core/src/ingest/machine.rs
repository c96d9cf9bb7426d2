//! Embedding job state machine.
//!
//! `SUBMITTED -> POLLING -> {COMPLETED | FAILED}`
//!
//! The machine holds no thread and never sleeps: [`JobMachine::advance`]
//! performs exactly one transition and tells the caller whether to wait
//! before re-entering. A [`Scheduler`] performs the waits. There is no
//! timeout counter here; an overall deadline belongs to whoever drives the
//! machine.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use strata_types::error::IngestError;
use strata_types::job::{EmbeddingJob, JobRequest, JobStatus};
use strata_types::media::{ObjectLocation, SourceObject};

use crate::embedding::box_service::BoxEmbeddingService;

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Performs the external delay between status checks.
pub trait Scheduler: Send + Sync {
    fn wait(&self, delay: Duration) -> impl Future<Output = ()> + Send;
}

/// Scheduler backed by `tokio::time::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioScheduler;

impl Scheduler for TokioScheduler {
    fn wait(&self, delay: Duration) -> impl Future<Output = ()> + Send {
        tokio::time::sleep(delay)
    }
}

pub trait SchedulerDyn: Send + Sync {
    fn wait_boxed(&self, delay: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;
}

impl<T: Scheduler> SchedulerDyn for T {
    fn wait_boxed(&self, delay: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(self.wait(delay))
    }
}

/// Type-erased scheduler.
pub struct BoxScheduler {
    inner: Box<dyn SchedulerDyn + Send + Sync>,
}

impl BoxScheduler {
    pub fn new<T: Scheduler + 'static>(scheduler: T) -> Self {
        Self {
            inner: Box::new(scheduler),
        }
    }

    pub async fn wait(&self, delay: Duration) {
        self.inner.wait_boxed(delay).await
    }
}

// ---------------------------------------------------------------------------
// JobMachine
// ---------------------------------------------------------------------------

/// Current phase of a job.
#[derive(Debug, Clone, PartialEq)]
pub enum JobPhase {
    Submitted,
    Polling { checks: u32 },
    Completed,
    Failed { reason: String },
}

/// What the driver should do after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Wait this long, then call `advance` again.
    Wait(Duration),
    /// The machine reached a terminal phase.
    Done,
}

/// Lifecycle of one submitted embedding job.
#[derive(Debug)]
pub struct JobMachine {
    job: EmbeddingJob,
    phase: JobPhase,
    poll_interval: Duration,
}

impl JobMachine {
    /// Submit the job and return a machine in the `Submitted` phase.
    pub async fn submit(
        embedder: &BoxEmbeddingService,
        object: SourceObject,
        request: JobRequest,
        output: ObjectLocation,
        poll_interval: Duration,
    ) -> Result<Self, IngestError> {
        let handle = embedder
            .start_job(&request, &output)
            .await
            .map_err(|e| IngestError::Embedding(format!("submitting job for {}: {e}", object.location)))?;
        tracing::info!(object_id = %object.object_id, %handle, %output, "embedding job submitted");

        Ok(Self {
            job: EmbeddingJob {
                object,
                request,
                handle,
                output,
                status: JobStatus::Submitted,
            },
            phase: JobPhase::Submitted,
            poll_interval,
        })
    }

    pub fn phase(&self) -> &JobPhase {
        &self.phase
    }

    pub fn job(&self) -> &EmbeddingJob {
        &self.job
    }

    /// Perform one transition.
    pub async fn advance(&mut self, embedder: &BoxEmbeddingService) -> Step {
        match &self.phase {
            JobPhase::Submitted => {
                self.phase = JobPhase::Polling { checks: 0 };
                Step::Wait(self.poll_interval)
            }
            JobPhase::Polling { checks } => {
                let checks = checks + 1;
                match embedder.job_status(&self.job.handle).await {
                    Ok(report) => {
                        self.job.status = report.status;
                        match report.status {
                            JobStatus::Completed => {
                                tracing::info!(handle = %self.job.handle, checks, "embedding job completed");
                                self.phase = JobPhase::Completed;
                                Step::Done
                            }
                            JobStatus::Failed => {
                                let reason = report
                                    .failure_message
                                    .unwrap_or_else(|| report.external_status.clone());
                                tracing::warn!(handle = %self.job.handle, %reason, "embedding job failed");
                                self.phase = JobPhase::Failed { reason };
                                Step::Done
                            }
                            JobStatus::Submitted | JobStatus::InProgress => {
                                tracing::debug!(handle = %self.job.handle, checks, status = %report.external_status, "embedding job still running");
                                self.phase = JobPhase::Polling { checks };
                                Step::Wait(self.poll_interval)
                            }
                        }
                    }
                    Err(e) => {
                        tracing::warn!(handle = %self.job.handle, "status check failed: {e}");
                        self.job.status = JobStatus::Failed;
                        self.phase = JobPhase::Failed {
                            reason: format!("status check failed: {e}"),
                        };
                        Step::Done
                    }
                }
            }
            JobPhase::Completed | JobPhase::Failed { .. } => Step::Done,
        }
    }

    /// Consume a terminal machine into its completed job or failure.
    pub fn into_outcome(self) -> Result<EmbeddingJob, IngestError> {
        match self.phase {
            JobPhase::Completed => Ok(self.job),
            JobPhase::Failed { reason } => Err(IngestError::JobFailed {
                handle: self.job.handle,
                reason,
            }),
            JobPhase::Submitted | JobPhase::Polling { .. } => Err(IngestError::JobFailed {
                handle: self.job.handle,
                reason: "job has not reached a terminal state".to_string(),
            }),
        }
    }
}

/// Drive a machine to a terminal phase, waiting on the scheduler between
/// checks.
pub async fn run_to_completion(
    mut machine: JobMachine,
    embedder: &BoxEmbeddingService,
    scheduler: &BoxScheduler,
) -> Result<EmbeddingJob, IngestError> {
    loop {
        match machine.advance(embedder).await {
            Step::Wait(delay) => scheduler.wait(delay).await,
            Step::Done => return machine.into_outcome(),
        }
    }
}
