//! Upload trigger decoding.
//!
//! Storage notifications deliver keys form-encoded (`+` for space, `%XX`
//! escapes). Keys under derived-artifact prefixes are dropped so rendered
//! pages and extracted text never re-trigger their own ingestion.

use strata_types::media::{is_derived_artifact, ObjectLocation};

/// What to do with an upload event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerDecision {
    Ingest(ObjectLocation),
    Skip { key: String, reason: String },
}

/// Decode an upload event into an ingestion decision.
pub fn decode_trigger(bucket: &str, raw_key: &str) -> TriggerDecision {
    let key = decode_key(raw_key);
    if key.is_empty() || key.ends_with('/') {
        return TriggerDecision::Skip {
            key,
            reason: "not an object key".to_string(),
        };
    }
    if is_derived_artifact(&key) {
        tracing::debug!(%key, "skipping derived artifact");
        return TriggerDecision::Skip {
            key,
            reason: "derived artifact prefix".to_string(),
        };
    }
    TriggerDecision::Ingest(ObjectLocation::new(bucket, key))
}

/// Decode a form-encoded key. Malformed escapes are kept literally.
pub fn decode_key(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b'%' if i + 2 < bytes.len() => {
                match (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                    (Some(hi), Some(lo)) => {
                        out.push(hi << 4 | lo);
                        i += 3;
                    }
                    _ => {
                        out.push(b'%');
                        i += 1;
                    }
                }
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}
