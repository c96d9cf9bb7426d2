//! Metadata combiner.
//!
//! Merges the three provenance layers of a stored vector into one flat
//! record: source-object attributes, segment position and modality, and
//! processing-time attributes. The typed segment position is flattened here,
//! at the storage edge, and the record is then sanitized to the value types
//! the index accepts.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use strata_types::media::SourceObject;
use strata_types::segment::{Segment, SegmentPosition};
use strata_types::vector::{MetadataValue, VectorMetadata};

/// Build the raw combined record for one (segment, dimension) pair.
pub fn combine(
    object: &SourceObject,
    segment: &Segment,
    dimension: usize,
    processed_at: DateTime<Utc>,
) -> Map<String, Value> {
    let mut m = Map::new();

    m.insert("sourceS3Uri".into(), object.location.uri().into());
    m.insert("fileName".into(), object.file_name.clone().into());
    m.insert("fileType".into(), object.file_type.clone().into());
    m.insert("fileSize".into(), object.size_bytes.into());
    m.insert("uploadTimestamp".into(), object.uploaded_at.to_rfc3339().into());
    m.insert("contentType".into(), object.content_type.clone().into());
    m.insert("objectId".into(), object.object_id.clone().into());

    m.insert("segmentIndex".into(), segment.index.into());
    m.insert("modalityType".into(), segment.modality.to_string().into());

    m.insert("embeddingDimension".into(), dimension.into());
    m.insert("processingTimestamp".into(), processed_at.to_rfc3339().into());

    match &segment.position {
        SegmentPosition::Text {
            start_char,
            end_char,
            truncated_char_length,
        } => {
            m.insert("segmentStartCharPosition".into(), (*start_char).into());
            m.insert("segmentEndCharPosition".into(), (*end_char).into());
            if let Some(len) = truncated_char_length {
                m.insert("truncatedCharLength".into(), (*len).into());
            }
        }
        SegmentPosition::TimeRange {
            start_seconds,
            end_seconds,
        } => {
            m.insert("segmentStartSeconds".into(), (*start_seconds).into());
            m.insert("segmentEndSeconds".into(), (*end_seconds).into());
        }
        SegmentPosition::Page {
            page_number,
            total_pages,
        } => {
            m.insert("processedPage".into(), (*page_number).into());
            m.insert("totalPages".into(), (*total_pages).into());
            m.insert("isPdf".into(), true.into());
            let parent = object.page.as_ref().map(|p| p.parent.uri());
            m.insert("parentS3Uri".into(), parent.into());
        }
        SegmentPosition::Whole => {}
    }

    m
}

/// Restrict a record to index-accepted value types.
///
/// Null becomes `""`, arrays become lists of strings, nested objects are
/// dropped. Strings, numbers and booleans are kept as they are.
pub fn sanitize(raw: &Map<String, Value>) -> VectorMetadata {
    let mut out = VectorMetadata::new();
    for (key, value) in raw {
        let clean = match value {
            Value::Null => MetadataValue::String(String::new()),
            Value::Bool(b) => MetadataValue::Bool(*b),
            Value::Number(n) => MetadataValue::Number(n.clone()),
            Value::String(s) => MetadataValue::String(s.clone()),
            Value::Array(items) => MetadataValue::List(items.iter().map(scalar_text).collect()),
            Value::Object(_) => continue,
        };
        out.insert(key.clone(), clean);
    }
    out
}

/// Combined and sanitized metadata for one stored vector.
pub fn build_metadata(
    object: &SourceObject,
    segment: &Segment,
    dimension: usize,
    processed_at: DateTime<Utc>,
) -> VectorMetadata {
    sanitize(&combine(object, segment, dimension, processed_at))
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
