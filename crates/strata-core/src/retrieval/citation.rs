//! Source citations shown alongside an answer.

use strata_types::query::SourceCitation;
use strata_types::segment::Modality;
use strata_types::vector::{RetrievalResult, VectorMetadata};

/// Approximate characters per line when turning offsets into line numbers.
const CHARS_PER_LINE: u64 = 80;

pub fn format_sources(results: &[RetrievalResult]) -> Vec<SourceCitation> {
    results
        .iter()
        .map(|r| SourceCitation {
            key: r.metadata.file_name().to_string(),
            similarity: r.similarity,
            text_preview: locator(&r.metadata),
        })
        .collect()
}

/// Modality-appropriate position of a result inside its source.
pub fn locator(metadata: &VectorMetadata) -> String {
    let modality = metadata.modality();
    let is_pdf = metadata.get_bool("isPdf").unwrap_or(false);
    let mut parts = Vec::new();

    if is_pdf || (modality == Some(Modality::Image) && metadata.contains("processedPage")) {
        if let Some(page) = metadata.get_u64("processedPage") {
            parts.push(format!("Page {page}"));
        }
    } else if matches!(modality, Some(Modality::Video | Modality::Audio)) {
        if let Some(start) = metadata.get_f64("segmentStartSeconds") {
            let end = metadata.get_f64("segmentEndSeconds").unwrap_or(start);
            parts.push(format!("{}-{}", clock(start), clock(end)));
        }
    } else if modality == Some(Modality::Text) {
        if let Some(start) = metadata.get_u64("segmentStartCharPosition") {
            let end = metadata.get_u64("segmentEndCharPosition").unwrap_or(start);
            let (first, last) = (start / CHARS_PER_LINE + 1, end / CHARS_PER_LINE + 1);
            if first == last {
                parts.push(format!("~Line {first}"));
            } else {
                parts.push(format!("~Lines {first}-{last}"));
            }
        }
    }

    if parts.is_empty() {
        metadata
            .get_str("modalityType")
            .unwrap_or("Unknown")
            .to_string()
    } else {
        parts.join(" | ")
    }
}

/// `M:SS`
fn clock(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(pairs: &[(&str, serde_json::Value)]) -> VectorMetadata {
        let raw: serde_json::Map<String, serde_json::Value> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect();
        serde_json::from_value(serde_json::Value::Object(raw)).unwrap()
    }

    #[test]
    fn test_page_locator() {
        let m = meta(&[
            ("modalityType", "IMAGE".into()),
            ("isPdf", true.into()),
            ("processedPage", 3.into()),
        ]);
        assert_eq!(locator(&m), "Page 3");
    }

    #[test]
    fn test_page_locator_from_string_metadata() {
        let m = meta(&[
            ("modalityType", "IMAGE".into()),
            ("isPdf", "True".into()),
            ("processedPage", "7".into()),
        ]);
        assert_eq!(locator(&m), "Page 7");
    }

    #[test]
    fn test_time_locator() {
        let m = meta(&[
            ("modalityType", "VIDEO".into()),
            ("segmentStartSeconds", 5.0.into()),
            ("segmentEndSeconds", 10.0.into()),
        ]);
        assert_eq!(locator(&m), "0:05-0:10");

        let m = meta(&[("modalityType", "AUDIO".into()), ("segmentStartSeconds", 65.5.into())]);
        assert_eq!(locator(&m), "1:05-1:05");
    }

    #[test]
    fn test_line_locator() {
        let m = meta(&[
            ("modalityType", "TEXT".into()),
            ("segmentStartCharPosition", 0.into()),
            ("segmentEndCharPosition", 200.into()),
        ]);
        assert_eq!(locator(&m), "~Lines 1-3");

        let m = meta(&[
            ("modalityType", "TEXT".into()),
            ("segmentStartCharPosition", 10.into()),
            ("segmentEndCharPosition", 50.into()),
        ]);
        assert_eq!(locator(&m), "~Line 1");
    }

    #[test]
    fn test_modality_fallback() {
        let m = meta(&[("modalityType", "IMAGE".into())]);
        assert_eq!(locator(&m), "IMAGE");
        assert_eq!(locator(&VectorMetadata::new()), "Unknown");
    }

    #[test]
    fn test_format_sources_uses_file_name() {
        let results = vec![RetrievalResult {
            key: "doc_pdf_1_page_3_segment_0".into(),
            similarity: 0.91,
            distance: 0.18,
            metadata: meta(&[
                ("fileName", "doc.pdf".into()),
                ("modalityType", "IMAGE".into()),
                ("isPdf", true.into()),
                ("processedPage", 3.into()),
            ]),
        }];
        let sources = format_sources(&results);
        assert_eq!(sources[0].key, "doc.pdf");
        assert_eq!(sources[0].text_preview, "Page 3");
        assert_eq!(sources[0].similarity, 0.91);
    }
}
