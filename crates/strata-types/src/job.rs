//! Asynchronous embedding job types.
//!
//! `JobRequest` is the wire payload submitted to the embedding service. The
//! modality configuration is an enum flattened into the params object, so a
//! request always carries exactly one of `text`, `image`, `video` or `audio`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use std::fmt;

use crate::media::{ObjectLocation, SourceObject};

pub const SCHEMA_VERSION: &str = "nova-multimodal-embed-v1";
pub const TASK_SEGMENTED_EMBEDDING: &str = "SEGMENTED_EMBEDDING";
pub const PURPOSE_GENERIC_INDEX: &str = "GENERIC_INDEX";

/// Name of the manifest a completed job writes under its output prefix.
pub const RESULT_MANIFEST: &str = "segmented-embedding-result.json";

/// Lifecycle status of an embedding job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Submitted,
    InProgress,
    Completed,
    Failed,
}

impl JobStatus {
    /// Map the embedding service's status vocabulary onto ours.
    ///
    /// `Expired` counts as a failure; anything unrecognised is still running.
    pub fn from_external(status: &str) -> Self {
        match status {
            "Completed" => JobStatus::Completed,
            "Failed" | "Expired" => JobStatus::Failed,
            _ => JobStatus::InProgress,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Submitted => write!(f, "SUBMITTED"),
            JobStatus::InProgress => write!(f, "IN_PROGRESS"),
            JobStatus::Completed => write!(f, "COMPLETED"),
            JobStatus::Failed => write!(f, "FAILED"),
        }
    }
}

/// Result of one status check against the embedding service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatusReport {
    pub status: JobStatus,
    /// The raw status string returned by the service.
    pub external_status: String,
    pub failure_message: Option<String>,
    pub submit_time: Option<DateTime<Utc>>,
    pub last_modified_time: Option<DateTime<Utc>>,
}

impl JobStatusReport {
    pub fn from_external(
        external_status: impl Into<String>,
        failure_message: Option<String>,
    ) -> Self {
        let external_status = external_status.into();
        Self {
            status: JobStatus::from_external(&external_status),
            external_status,
            failure_message,
            submit_time: None,
            last_modified_time: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Job request payload
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRequest {
    pub schema_version: String,
    pub task_type: String,
    pub segmented_embedding_params: SegmentedEmbeddingParams,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentedEmbeddingParams {
    pub embedding_purpose: String,
    pub embedding_dimension: usize,
    #[serde(flatten)]
    pub modality: ModalityConfig,
}

/// Modality-specific job configuration. Exactly one is sent per job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModalityConfig {
    Text(TextJobConfig),
    Image(ImageJobConfig),
    Video(VideoJobConfig),
    Audio(AudioJobConfig),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaSource {
    pub s3_location: S3Location,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct S3Location {
    pub uri: String,
}

impl From<&ObjectLocation> for MediaSource {
    fn from(location: &ObjectLocation) -> Self {
        Self {
            s3_location: S3Location {
                uri: location.uri(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextJobConfig {
    pub truncation_mode: String,
    pub source: MediaSource,
    pub segmentation_config: CharSegmentation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharSegmentation {
    pub max_length_chars: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageJobConfig {
    pub format: String,
    pub source: MediaSource,
    pub detail_level: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoJobConfig {
    pub format: String,
    pub source: MediaSource,
    pub embedding_mode: String,
    pub segmentation_config: TimeSegmentation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioJobConfig {
    pub format: String,
    pub source: MediaSource,
    pub segmentation_config: TimeSegmentation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSegmentation {
    pub duration_seconds: u32,
}

// ---------------------------------------------------------------------------
// EmbeddingJob
// ---------------------------------------------------------------------------

/// One asynchronous unit of embedding work. Lives only for the duration of
/// an ingestion.
#[derive(Debug, Clone)]
pub struct EmbeddingJob {
    pub object: SourceObject,
    pub request: JobRequest,
    /// Opaque handle returned by the service on submission.
    pub handle: String,
    /// Prefix the service writes its output under.
    pub output: ObjectLocation,
    pub status: JobStatus,
}

impl EmbeddingJob {
    /// Last `/`-separated segment of the job handle.
    pub fn invocation_id(&self) -> &str {
        self.handle.rsplit('/').next().unwrap_or(&self.handle)
    }

    /// Location of the result manifest for this job.
    pub fn manifest_location(&self) -> ObjectLocation {
        self.output.join(self.invocation_id()).join(RESULT_MANIFEST)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_external_status_mapping() {
        assert_eq!(JobStatus::from_external("Completed"), JobStatus::Completed);
        assert_eq!(JobStatus::from_external("Failed"), JobStatus::Failed);
        assert_eq!(JobStatus::from_external("Expired"), JobStatus::Failed);
        assert_eq!(JobStatus::from_external("InProgress"), JobStatus::InProgress);
        assert_eq!(JobStatus::from_external("Scheduled"), JobStatus::InProgress);
    }

    #[test]
    fn test_job_status_display_matches_serde() {
        for status in [
            JobStatus::Submitted,
            JobStatus::InProgress,
            JobStatus::Completed,
            JobStatus::Failed,
        ] {
            let json = serde_json::to_value(status).unwrap();
            assert_eq!(json, serde_json::Value::String(status.to_string()));
        }
    }

    #[test]
    fn test_modality_flattens_into_params() {
        let request = JobRequest {
            schema_version: SCHEMA_VERSION.to_string(),
            task_type: TASK_SEGMENTED_EMBEDDING.to_string(),
            segmented_embedding_params: SegmentedEmbeddingParams {
                embedding_purpose: PURPOSE_GENERIC_INDEX.to_string(),
                embedding_dimension: 3072,
                modality: ModalityConfig::Audio(AudioJobConfig {
                    format: "mp3".into(),
                    source: (&ObjectLocation::new("b", "a.mp3")).into(),
                    segmentation_config: TimeSegmentation { duration_seconds: 5 },
                }),
            },
        };
        let json = serde_json::to_value(&request).unwrap();
        let params = &json["segmentedEmbeddingParams"];
        assert_eq!(params["embeddingDimension"], 3072);
        assert_eq!(params["audio"]["source"]["s3Location"]["uri"], "s3://b/a.mp3");
        assert_eq!(params["audio"]["segmentationConfig"]["durationSeconds"], 5);
        assert!(params.get("text").is_none());

        let back: JobRequest = serde_json::from_value(json).unwrap();
        assert_eq!(back, request);
    }

    #[test]
    fn test_manifest_location_uses_invocation_id() {
        let object = SourceObject {
            location: ObjectLocation::new("in", "a.txt"),
            file_name: "a.txt".into(),
            file_type: ".txt".into(),
            size_bytes: 1,
            uploaded_at: Utc::now(),
            content_type: "text/plain".into(),
            object_id: "a_txt_1".into(),
            page: None,
        };
        let job = EmbeddingJob {
            request: JobRequest {
                schema_version: SCHEMA_VERSION.into(),
                task_type: TASK_SEGMENTED_EMBEDDING.into(),
                segmented_embedding_params: SegmentedEmbeddingParams {
                    embedding_purpose: PURPOSE_GENERIC_INDEX.into(),
                    embedding_dimension: 3072,
                    modality: ModalityConfig::Image(ImageJobConfig {
                        format: "png".into(),
                        source: (&object.location).into(),
                        detail_level: "STANDARD_IMAGE".into(),
                    }),
                },
            },
            object,
            handle: "arn:aws:bedrock:us-east-1:123:async-invoke/inv42".into(),
            output: ObjectLocation::new("out", "a_txt_1"),
            status: JobStatus::Submitted,
        };
        assert_eq!(job.invocation_id(), "inv42");
        assert_eq!(
            job.manifest_location().uri(),
            "s3://out/a_txt_1/inv42/segmented-embedding-result.json"
        );
    }
}
