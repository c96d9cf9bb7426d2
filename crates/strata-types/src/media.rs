//! Source objects and media classification.
//!
//! A `SourceObject` is created once per trigger event and stays immutable for
//! the lifetime of its ingestion. Document pages are modelled as source objects
//! that point at the rendered page image but keep the parent's file name.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

use crate::error::IngestError;

/// Prefix under which rendered document pages are written.
pub const PDF_PAGES_PREFIX: &str = "pdf-pages/";

/// Prefix under which extracted document text is written.
pub const DOCX_TEXT_PREFIX: &str = "docx-text/";

/// Location of an object in blob storage, rendered as `s3://bucket/key`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectLocation {
    pub bucket: String,
    pub key: String,
}

impl ObjectLocation {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// The `s3://bucket/key` form used in job requests and metadata.
    pub fn uri(&self) -> String {
        self.to_string()
    }

    /// Last path segment of the key.
    pub fn file_name(&self) -> &str {
        self.key.rsplit('/').next().unwrap_or(&self.key)
    }

    /// Lower-cased extension including the leading dot, or empty.
    pub fn extension(&self) -> String {
        let name = self.file_name();
        match name.rfind('.') {
            Some(idx) if idx > 0 => name[idx..].to_lowercase(),
            _ => String::new(),
        }
    }

    /// Append a path segment to this location's key.
    pub fn join(&self, segment: &str) -> Self {
        let key = if self.key.is_empty() {
            segment.to_string()
        } else {
            format!("{}/{}", self.key.trim_end_matches('/'), segment)
        };
        Self::new(self.bucket.clone(), key)
    }
}

impl fmt::Display for ObjectLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}

impl FromStr for ObjectLocation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s
            .strip_prefix("s3://")
            .ok_or_else(|| format!("invalid object uri: '{s}'"))?;
        let (bucket, key) = rest.split_once('/').unwrap_or((rest, ""));
        if bucket.is_empty() {
            return Err(format!("object uri has no bucket: '{s}'"));
        }
        Ok(Self::new(bucket, key))
    }
}

/// Attributes of a stored object, as reported by blob storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlobInfo {
    pub size_bytes: u64,
    pub last_modified: DateTime<Utc>,
    pub content_type: Option<String>,
}

/// Embeddable media families, resolved from a file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Text,
    Image(&'static str),
    Video(&'static str),
    Audio(&'static str),
    /// Scanned document fanned out into rendered page images.
    Pdf,
    /// Word document ingested through its extracted text.
    Docx,
}

impl MediaKind {
    /// Resolve an extension (with leading dot, any case).
    pub fn from_extension(ext: &str) -> Result<Self, IngestError> {
        let kind = match ext.to_lowercase().as_str() {
            ".txt" | ".md" | ".json" | ".csv" => MediaKind::Text,
            ".png" => MediaKind::Image("png"),
            ".jpg" | ".jpeg" => MediaKind::Image("jpeg"),
            ".gif" => MediaKind::Image("gif"),
            ".webp" => MediaKind::Image("webp"),
            ".mp4" => MediaKind::Video("mp4"),
            ".mov" => MediaKind::Video("mov"),
            ".mkv" => MediaKind::Video("mkv"),
            ".webm" => MediaKind::Video("webm"),
            ".flv" => MediaKind::Video("flv"),
            ".mpeg" => MediaKind::Video("mpeg"),
            ".mpg" => MediaKind::Video("mpg"),
            ".wmv" => MediaKind::Video("wmv"),
            ".3gp" => MediaKind::Video("3gp"),
            ".mp3" => MediaKind::Audio("mp3"),
            ".wav" => MediaKind::Audio("wav"),
            ".ogg" => MediaKind::Audio("ogg"),
            ".pdf" => MediaKind::Pdf,
            ".docx" => MediaKind::Docx,
            other => return Err(IngestError::UnsupportedType(other.to_string())),
        };
        Ok(kind)
    }
}

/// Page provenance carried by a source object produced from a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentPage {
    /// 1-based page number.
    pub page_number: u32,
    pub total_pages: u32,
    pub parent: ObjectLocation,
}

/// An uploaded object, immutable once ingestion starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceObject {
    pub location: ObjectLocation,
    /// Display name shown in citations.
    pub file_name: String,
    /// Lower-cased extension with the leading dot.
    pub file_type: String,
    pub size_bytes: u64,
    pub uploaded_at: DateTime<Utc>,
    pub content_type: String,
    pub object_id: String,
    /// Set when this object is one rendered page of a document.
    pub page: Option<DocumentPage>,
}

impl SourceObject {
    /// Generate the object identifier for a key at the given trigger time.
    ///
    /// `/` and `.` in the key become `_`, followed by the time as
    /// `YYYYmmddHHMMSS`.
    pub fn generate_object_id(key: &str, at: DateTime<Utc>) -> String {
        let safe = key.replace(['/', '.'], "_");
        format!("{safe}_{}", at.format("%Y%m%d%H%M%S"))
    }

    /// Derive the object for one page of this document.
    ///
    /// The page keeps the parent's display name and gets an identifier
    /// suffixed with its page number.
    pub fn page_object(
        &self,
        page_location: ObjectLocation,
        page_number: u32,
        total_pages: u32,
        size_bytes: u64,
        content_type: String,
    ) -> SourceObject {
        let file_type = page_location.extension();
        SourceObject {
            location: page_location,
            file_name: self.file_name.clone(),
            file_type,
            size_bytes,
            uploaded_at: self.uploaded_at,
            content_type,
            object_id: format!("{}_page_{page_number}", self.object_id),
            page: Some(DocumentPage {
                page_number,
                total_pages,
                parent: self.location.clone(),
            }),
        }
    }
}

/// Whether a key lives under a derived-artifact prefix and must not re-trigger
/// ingestion.
pub fn is_derived_artifact(key: &str) -> bool {
    key.starts_with(PDF_PAGES_PREFIX) || key.starts_with(DOCX_TEXT_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_location_roundtrip() {
        let loc: ObjectLocation = "s3://media/docs/report.PDF".parse().unwrap();
        assert_eq!(loc.bucket, "media");
        assert_eq!(loc.key, "docs/report.PDF");
        assert_eq!(loc.file_name(), "report.PDF");
        assert_eq!(loc.extension(), ".pdf");
        assert_eq!(loc.to_string(), "s3://media/docs/report.PDF");
    }

    #[test]
    fn test_location_rejects_non_s3() {
        assert!("https://example.com/a".parse::<ObjectLocation>().is_err());
        assert!("s3:///key".parse::<ObjectLocation>().is_err());
    }

    #[test]
    fn test_location_join() {
        let loc = ObjectLocation::new("out", "obj_1");
        assert_eq!(loc.join("inv-9").key, "obj_1/inv-9");
        assert_eq!(ObjectLocation::new("out", "").join("x").key, "x");
    }

    #[test]
    fn test_extension_without_dot() {
        assert_eq!(ObjectLocation::new("b", "README").extension(), "");
        assert_eq!(ObjectLocation::new("b", ".hidden").extension(), "");
    }

    #[test]
    fn test_media_kind_resolution() {
        assert_eq!(MediaKind::from_extension(".md").unwrap(), MediaKind::Text);
        assert_eq!(MediaKind::from_extension(".JPG").unwrap(), MediaKind::Image("jpeg"));
        assert_eq!(MediaKind::from_extension(".3gp").unwrap(), MediaKind::Video("3gp"));
        assert_eq!(MediaKind::from_extension(".ogg").unwrap(), MediaKind::Audio("ogg"));
        assert_eq!(MediaKind::from_extension(".PDF").unwrap(), MediaKind::Pdf);
    }

    #[test]
    fn test_media_kind_unsupported() {
        let err = MediaKind::from_extension(".exe").unwrap_err();
        assert!(matches!(err, IngestError::UnsupportedType(ref e) if e == ".exe"));
    }

    #[test]
    fn test_generate_object_id() {
        let at = Utc.with_ymd_and_hms(2025, 3, 14, 9, 26, 53).unwrap();
        assert_eq!(
            SourceObject::generate_object_id("docs/hello.txt", at),
            "docs_hello_txt_20250314092653"
        );
    }

    #[test]
    fn test_page_object_keeps_parent_name() {
        let parent = SourceObject {
            location: ObjectLocation::new("in", "scan.pdf"),
            file_name: "scan.pdf".into(),
            file_type: ".pdf".into(),
            size_bytes: 10,
            uploaded_at: Utc::now(),
            content_type: "application/pdf".into(),
            object_id: "scan_pdf_20250101000000".into(),
            page: None,
        };
        let page = parent.page_object(
            ObjectLocation::new("in", "pdf-pages/scan/page_2.png"),
            2,
            5,
            99,
            "image/png".into(),
        );
        assert_eq!(page.object_id, "scan_pdf_20250101000000_page_2");
        assert_eq!(page.file_name, "scan.pdf");
        assert_eq!(page.file_type, ".png");
        let meta = page.page.unwrap();
        assert_eq!(meta.total_pages, 5);
        assert_eq!(meta.parent.key, "scan.pdf");
    }

    #[test]
    fn test_derived_artifact_prefixes() {
        assert!(is_derived_artifact("pdf-pages/scan/page_1.png"));
        assert!(is_derived_artifact("docx-text/memo.txt"));
        assert!(!is_derived_artifact("uploads/pdf-pages.txt"));
    }
}
