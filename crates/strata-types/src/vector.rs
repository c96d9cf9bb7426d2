//! Stored vectors, sanitized metadata and search results.

use serde::{Deserialize, Serialize};

use std::collections::BTreeMap;

use crate::segment::Modality;

/// Index name for a given embedding dimension.
pub fn index_name(dimension: usize) -> String {
    format!("embeddings-{dimension}d")
}

/// A metadata value accepted by the vector index.
///
/// Nested objects are not representable; absent values are stored as an
/// empty string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    List(Vec<String>),
}

impl From<&str> for MetadataValue {
    fn from(s: &str) -> Self {
        MetadataValue::String(s.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(s: String) -> Self {
        MetadataValue::String(s)
    }
}

impl From<bool> for MetadataValue {
    fn from(b: bool) -> Self {
        MetadataValue::Bool(b)
    }
}

impl From<u64> for MetadataValue {
    fn from(n: u64) -> Self {
        MetadataValue::Number(n.into())
    }
}

impl From<u32> for MetadataValue {
    fn from(n: u32) -> Self {
        MetadataValue::Number(n.into())
    }
}

impl From<f64> for MetadataValue {
    fn from(n: f64) -> Self {
        serde_json::Number::from_f64(n)
            .map(MetadataValue::Number)
            .unwrap_or_else(|| MetadataValue::String(n.to_string()))
    }
}

/// Flat, sanitized metadata record attached to a stored vector.
///
/// Lookups are lenient: numeric accessors also accept numbers stored as
/// strings, since some indexes stringify everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VectorMetadata(pub BTreeMap<String, MetadataValue>);

impl VectorMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<MetadataValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&MetadataValue> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.0.get(key)? {
            MetadataValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        match self.0.get(key)? {
            MetadataValue::Number(n) => n.as_f64(),
            MetadataValue::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        match self.0.get(key)? {
            MetadataValue::Number(n) => n.as_u64().or_else(|| n.as_f64().map(|f| f as u64)),
            MetadataValue::String(s) => {
                let s = s.trim();
                s.parse::<u64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().map(|f| f as u64))
            }
            _ => None,
        }
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.0.get(key)? {
            MetadataValue::Bool(b) => Some(*b),
            MetadataValue::String(s) => Some(s.eq_ignore_ascii_case("true")),
            _ => None,
        }
    }

    /// Modality tag, if present and recognised.
    pub fn modality(&self) -> Option<Modality> {
        self.get_str("modalityType")?.parse().ok()
    }

    /// Display file name, or `"Unknown"`.
    pub fn file_name(&self) -> &str {
        self.get_str("fileName").unwrap_or("Unknown")
    }
}

/// The persisted unit: one (segment, dimension) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredVector {
    /// `{objectId}_segment_{segmentIndex}`.
    pub key: String,
    pub dimension: usize,
    pub vector: Vec<f32>,
    pub metadata: VectorMetadata,
}

impl StoredVector {
    pub fn key_for(object_id: &str, segment_index: u32) -> String {
        format!("{object_id}_segment_{segment_index}")
    }
}

/// A raw match returned by the vector index.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexMatch {
    pub key: String,
    pub distance: f32,
    pub metadata: VectorMetadata,
}

/// Distance normalization of an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    /// Cosine distance in `[0, 2]`.
    Cosine,
    /// A metric already normalized to `[0, 1]`.
    Normalized,
}

impl DistanceMetric {
    pub fn range(&self) -> f32 {
        match self {
            DistanceMetric::Cosine => 2.0,
            DistanceMetric::Normalized => 1.0,
        }
    }

    /// Convert an index distance into a similarity in `[0, 1]`.
    pub fn similarity(&self, distance: f32) -> f32 {
        (1.0 - distance / self.range()).clamp(0.0, 1.0)
    }

    /// The distance this metric reports for a cosine in `[-1, 1]`.
    pub fn distance_from_cosine(&self, cosine: f32) -> f32 {
        (1.0 - cosine) * self.range() / 2.0
    }

    /// Similarity for a locally computed cosine, on the same scale as
    /// [`DistanceMetric::similarity`].
    pub fn similarity_from_cosine(&self, cosine: f32) -> f32 {
        self.similarity(self.distance_from_cosine(cosine))
    }
}

/// A ranked search result with similarity in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalResult {
    pub key: String,
    pub similarity: f32,
    pub distance: f32,
    pub metadata: VectorMetadata,
}

impl RetrievalResult {
    pub fn from_match(m: IndexMatch, metric: DistanceMetric) -> Self {
        Self {
            similarity: metric.similarity(m.distance),
            key: m.key,
            distance: m.distance,
            metadata: m.metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_name() {
        assert_eq!(index_name(256), "embeddings-256d");
        assert_eq!(index_name(3072), "embeddings-3072d");
    }

    #[test]
    fn test_cosine_similarity_boundaries() {
        let m = DistanceMetric::Cosine;
        assert!((m.similarity(0.0) - 1.0).abs() < 1e-6);
        assert!((m.similarity(1.0) - 0.5).abs() < 1e-6);
        assert!((m.similarity(2.0) - 0.0).abs() < 1e-6);
    }

    #[test]
    fn test_local_cosine_matches_index_scale() {
        for m in [DistanceMetric::Cosine, DistanceMetric::Normalized] {
            assert!((m.similarity_from_cosine(1.0) - 1.0).abs() < 1e-6);
            assert!((m.similarity_from_cosine(0.0) - 0.5).abs() < 1e-6);
            assert!(m.similarity_from_cosine(-1.0).abs() < 1e-6);
        }
        // an in-memory cosine index reports distance 1 - cos
        let cosine = 0.3_f32;
        assert!(
            (DistanceMetric::Cosine.similarity_from_cosine(cosine)
                - DistanceMetric::Cosine.similarity(1.0 - cosine))
            .abs()
                < 1e-6
        );
    }

    #[test]
    fn test_normalized_similarity_boundaries() {
        let m = DistanceMetric::Normalized;
        assert!((m.similarity(0.0) - 1.0).abs() < 1e-6);
        assert!((m.similarity(1.0) - 0.0).abs() < 1e-6);
        assert_eq!(m.similarity(1.5), 0.0);
    }

    #[test]
    fn test_metadata_lenient_accessors() {
        let mut meta = VectorMetadata::new();
        meta.insert("processedPage", "3");
        meta.insert("segmentStartSeconds", 12.5);
        meta.insert("isPdf", "True");
        meta.insert("modalityType", "IMAGE");
        assert_eq!(meta.get_u64("processedPage"), Some(3));
        assert_eq!(meta.get_f64("segmentStartSeconds"), Some(12.5));
        assert_eq!(meta.get_bool("isPdf"), Some(true));
        assert_eq!(meta.modality(), Some(Modality::Image));
        assert_eq!(meta.file_name(), "Unknown");
    }

    #[test]
    fn test_metadata_serializes_flat() {
        let mut meta = VectorMetadata::new();
        meta.insert("fileSize", 42u64);
        meta.insert("isPdf", true);
        meta.insert("tags", MetadataValue::List(vec!["a".into(), "b".into()]));
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["fileSize"], 42);
        assert_eq!(json["isPdf"], true);
        assert_eq!(json["tags"][1], "b");

        let back: VectorMetadata = serde_json::from_value(json).unwrap();
        assert_eq!(back, meta);
    }
}
