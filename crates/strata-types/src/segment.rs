//! Segments produced by completed embedding jobs.
//!
//! The job output is parsed at the boundary into typed `Segment`s whose
//! position metadata is a tagged union, so a text segment can never carry a
//! time range and vice versa. Flattening to the storage wire format happens
//! only in the metadata combiner.

use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

/// Modality tag attached to every segment and stored vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Modality {
    Text,
    Image,
    Video,
    Audio,
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Modality::Text => write!(f, "TEXT"),
            Modality::Image => write!(f, "IMAGE"),
            Modality::Video => write!(f, "VIDEO"),
            Modality::Audio => write!(f, "AUDIO"),
        }
    }
}

impl FromStr for Modality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "TEXT" => Ok(Modality::Text),
            "IMAGE" => Ok(Modality::Image),
            "VIDEO" => Ok(Modality::Video),
            "AUDIO" => Ok(Modality::Audio),
            other => Err(format!("invalid modality: '{other}'")),
        }
    }
}

/// Where a segment sits inside its source object.
#[derive(Debug, Clone, PartialEq)]
pub enum SegmentPosition {
    /// Character range of a text segment.
    Text {
        start_char: u64,
        end_char: u64,
        truncated_char_length: Option<u64>,
    },
    /// Time window of an audio or video segment.
    TimeRange { start_seconds: f64, end_seconds: f64 },
    /// Rendered page of a document.
    Page { page_number: u32, total_pages: u32 },
    /// The whole object (e.g. a freestanding image).
    Whole,
}

/// One embeddable unit produced by a completed job.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub index: u32,
    pub modality: Modality,
    pub position: SegmentPosition,
    /// Full-precision embedding.
    pub vector: Vec<f32>,
}

// ---------------------------------------------------------------------------
// Job output wire format
// ---------------------------------------------------------------------------

/// Status attached to manifest entries and segment lines.
pub const STATUS_SUCCESS: &str = "SUCCESS";
pub const STATUS_PARTIAL_SUCCESS: &str = "PARTIAL_SUCCESS";

/// Top-level manifest written by a completed job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobManifest {
    #[serde(default)]
    pub source_file_uri: Option<String>,
    #[serde(default)]
    pub embedding_dimension: Option<usize>,
    #[serde(default)]
    pub embedding_results: Vec<ManifestEntry>,
}

/// One modality's output within a manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    pub embedding_type: String,
    pub status: String,
    pub output_file_uri: String,
    #[serde(default)]
    pub failure_reason: Option<String>,
}

impl ManifestEntry {
    /// Whether segments in this entry should be read.
    pub fn is_usable(&self) -> bool {
        self.status == STATUS_SUCCESS || self.status == STATUS_PARTIAL_SUCCESS
    }
}

/// One line of a line-delimited segment file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentLine {
    #[serde(default)]
    pub embedding: Vec<f32>,
    #[serde(default)]
    pub segment_metadata: SegmentLineMetadata,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentLineMetadata {
    #[serde(default)]
    pub segment_index: Option<u32>,
    pub segment_start_seconds: Option<f64>,
    pub segment_end_seconds: Option<f64>,
    pub segment_start_char_position: Option<u64>,
    pub segment_end_char_position: Option<u64>,
    pub truncated_char_length: Option<u64>,
}

impl SegmentLine {
    pub fn is_success(&self) -> bool {
        self.status.as_deref() == Some(STATUS_SUCCESS)
    }

    /// Validate this line into a typed segment of the given modality.
    ///
    /// Position fields that do not belong to the modality are ignored.
    pub fn into_segment(self, modality: Modality) -> Result<Segment, String> {
        if self.embedding.is_empty() {
            return Err("segment line has no embedding".to_string());
        }
        let meta = self.segment_metadata;
        let position = match modality {
            Modality::Text => match (meta.segment_start_char_position, meta.segment_end_char_position)
            {
                (Some(start_char), Some(end_char)) => SegmentPosition::Text {
                    start_char,
                    end_char,
                    truncated_char_length: meta.truncated_char_length,
                },
                _ => SegmentPosition::Whole,
            },
            Modality::Video | Modality::Audio => {
                match (meta.segment_start_seconds, meta.segment_end_seconds) {
                    (Some(start_seconds), end) => SegmentPosition::TimeRange {
                        start_seconds,
                        end_seconds: end.unwrap_or(start_seconds),
                    },
                    _ => SegmentPosition::Whole,
                }
            }
            Modality::Image => SegmentPosition::Whole,
        };
        Ok(Segment {
            index: meta.segment_index.unwrap_or(0),
            modality,
            position,
            vector: self.embedding,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modality_roundtrip() {
        for m in [Modality::Text, Modality::Image, Modality::Video, Modality::Audio] {
            let parsed: Modality = m.to_string().parse().unwrap();
            assert_eq!(parsed, m);
        }
        assert!("AUDIO_VIDEO_COMBINED".parse::<Modality>().is_err());
    }

    #[test]
    fn test_manifest_parsing() {
        let json = r#"{
            "sourceFileUri": "s3://in/clip.mp4",
            "embeddingDimension": 3072,
            "embeddingResults": [
                {"embeddingType": "VIDEO", "status": "SUCCESS", "outputFileUri": "s3://out/x/embedding-video.jsonl"},
                {"embeddingType": "AUDIO", "status": "FAILURE", "outputFileUri": "s3://out/x/embedding-audio.jsonl", "failureReason": "no track"}
            ]
        }"#;
        let manifest: JobManifest = serde_json::from_str(json).unwrap();
        assert_eq!(manifest.embedding_results.len(), 2);
        assert!(manifest.embedding_results[0].is_usable());
        assert!(!manifest.embedding_results[1].is_usable());
    }

    #[test]
    fn test_text_line_into_segment() {
        let line: SegmentLine = serde_json::from_str(
            r#"{"embedding":[0.1,0.2],"status":"SUCCESS","segmentMetadata":{"segmentIndex":3,"segmentStartCharPosition":160,"segmentEndCharPosition":400,"segmentStartSeconds":1.0}}"#,
        )
        .unwrap();
        assert!(line.is_success());
        let seg = line.into_segment(Modality::Text).unwrap();
        assert_eq!(seg.index, 3);
        assert_eq!(
            seg.position,
            SegmentPosition::Text {
                start_char: 160,
                end_char: 400,
                truncated_char_length: None
            }
        );
    }

    #[test]
    fn test_video_line_into_segment() {
        let line: SegmentLine = serde_json::from_str(
            r#"{"embedding":[1.0],"status":"SUCCESS","segmentMetadata":{"segmentIndex":1,"segmentStartSeconds":5.0,"segmentEndSeconds":10.0}}"#,
        )
        .unwrap();
        let seg = line.into_segment(Modality::Video).unwrap();
        assert_eq!(
            seg.position,
            SegmentPosition::TimeRange {
                start_seconds: 5.0,
                end_seconds: 10.0
            }
        );
    }

    #[test]
    fn test_line_without_embedding_is_rejected() {
        let line: SegmentLine = serde_json::from_str(r#"{"status":"SUCCESS"}"#).unwrap();
        assert!(line.into_segment(Modality::Image).is_err());
    }
}
