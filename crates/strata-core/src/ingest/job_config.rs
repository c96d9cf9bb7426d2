//! Job request construction.
//!
//! Maps an object's media kind onto the fully specified job configuration
//! submitted to the embedding service.

use strata_types::config::{EmbeddingConfig, IngestionConfig};
use strata_types::error::IngestError;
use strata_types::job::{
    AudioJobConfig, CharSegmentation, ImageJobConfig, JobRequest, MediaSource, ModalityConfig,
    SegmentedEmbeddingParams, TextJobConfig, TimeSegmentation, VideoJobConfig,
    PURPOSE_GENERIC_INDEX, SCHEMA_VERSION, TASK_SEGMENTED_EMBEDDING,
};
use strata_types::media::{MediaKind, ObjectLocation, SourceObject};

const TRUNCATE_END: &str = "END";

/// Build the job request for a single embeddable object.
///
/// Documents must be resolved to their pages or extracted text first.
pub fn build_job_request(
    object: &SourceObject,
    kind: MediaKind,
    config: &EmbeddingConfig,
) -> Result<JobRequest, IngestError> {
    let source = MediaSource::from(&object.location);
    let time_segments = TimeSegmentation {
        duration_seconds: config.media_segment_seconds,
    };

    let modality = match kind {
        MediaKind::Text => ModalityConfig::Text(TextJobConfig {
            truncation_mode: TRUNCATE_END.to_string(),
            source,
            segmentation_config: CharSegmentation {
                max_length_chars: config.text_max_chars,
            },
        }),
        MediaKind::Image(format) => ModalityConfig::Image(ImageJobConfig {
            format: format.to_string(),
            source,
            detail_level: config.image_detail_level.clone(),
        }),
        MediaKind::Video(format) => ModalityConfig::Video(VideoJobConfig {
            format: format.to_string(),
            source,
            embedding_mode: config.video_embedding_mode.clone(),
            segmentation_config: time_segments,
        }),
        MediaKind::Audio(format) => ModalityConfig::Audio(AudioJobConfig {
            format: format.to_string(),
            source,
            segmentation_config: time_segments,
        }),
        MediaKind::Pdf | MediaKind::Docx => {
            return Err(IngestError::Extraction(format!(
                "{} must be ingested through its derived artifacts",
                object.location
            )));
        }
    };

    Ok(JobRequest {
        schema_version: SCHEMA_VERSION.to_string(),
        task_type: TASK_SEGMENTED_EMBEDDING.to_string(),
        segmented_embedding_params: SegmentedEmbeddingParams {
            embedding_purpose: PURPOSE_GENERIC_INDEX.to_string(),
            embedding_dimension: config.job_dimension(),
            modality,
        },
    })
}

/// Where the embedding service should write output for this object.
pub fn output_location(object: &SourceObject, config: &IngestionConfig) -> ObjectLocation {
    ObjectLocation::new(config.output_bucket.clone(), object.object_id.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn object(key: &str) -> SourceObject {
        let location = ObjectLocation::new("uploads", key);
        SourceObject {
            file_name: location.file_name().to_string(),
            file_type: location.extension(),
            location,
            size_bytes: 10,
            uploaded_at: Utc::now(),
            content_type: "unknown".into(),
            object_id: "obj_1".into(),
            page: None,
        }
    }

    fn params(key: &str) -> serde_json::Value {
        let obj = object(key);
        let kind = MediaKind::from_extension(&obj.file_type).unwrap();
        let req = build_job_request(&obj, kind, &EmbeddingConfig::default()).unwrap();
        serde_json::to_value(req).unwrap()
    }

    #[test]
    fn test_text_request() {
        let json = params("notes/hello.txt");
        assert_eq!(json["schemaVersion"], "nova-multimodal-embed-v1");
        assert_eq!(json["taskType"], "SEGMENTED_EMBEDDING");
        let p = &json["segmentedEmbeddingParams"];
        assert_eq!(p["embeddingPurpose"], "GENERIC_INDEX");
        assert_eq!(p["embeddingDimension"], 3072);
        assert_eq!(p["text"]["truncationMode"], "END");
        assert_eq!(p["text"]["segmentationConfig"]["maxLengthChars"], 32000);
        assert_eq!(p["text"]["source"]["s3Location"]["uri"], "s3://uploads/notes/hello.txt");
    }

    #[test]
    fn test_image_request() {
        let json = params("photo.JPEG");
        let p = &json["segmentedEmbeddingParams"];
        assert_eq!(p["image"]["format"], "jpeg");
        assert_eq!(p["image"]["detailLevel"], "STANDARD_IMAGE");
        assert!(p.get("video").is_none());
    }

    #[test]
    fn test_video_request() {
        let json = params("clip.mov");
        let v = &json["segmentedEmbeddingParams"]["video"];
        assert_eq!(v["format"], "mov");
        assert_eq!(v["embeddingMode"], "AUDIO_VIDEO_COMBINED");
        assert_eq!(v["segmentationConfig"]["durationSeconds"], 5);
    }

    #[test]
    fn test_audio_request() {
        let json = params("talk.wav");
        let a = &json["segmentedEmbeddingParams"]["audio"];
        assert_eq!(a["format"], "wav");
        assert_eq!(a["segmentationConfig"]["durationSeconds"], 5);
    }

    #[test]
    fn test_documents_are_rejected() {
        let obj = object("scan.pdf");
        let err = build_job_request(&obj, MediaKind::Pdf, &EmbeddingConfig::default()).unwrap_err();
        assert!(matches!(err, IngestError::Extraction(_)));
    }

    #[test]
    fn test_output_location() {
        let loc = output_location(&object("a.txt"), &IngestionConfig::default());
        assert_eq!(loc.uri(), "s3://strata-embeddings-output/obj_1");
    }
}
