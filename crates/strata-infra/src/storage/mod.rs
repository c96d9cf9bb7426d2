//! Blob storage and document artifact discovery.
//!
//! [`LocalBlobStore`] maps `s3://bucket/key` onto `{root}/{bucket}/{key}`;
//! [`PrerenderedPageExtractor`] finds the page images and extracted text an
//! external renderer wrote under the derived-artifact prefixes.

use std::path::Path;

pub mod local;
pub mod pages;

pub use local::LocalBlobStore;
pub use pages::PrerenderedPageExtractor;

/// Detect MIME type from file extension.
pub fn detect_mime(filename: &str) -> String {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        // Text
        "txt" => "text/plain",
        "md" | "markdown" => "text/markdown",
        "csv" => "text/csv",
        "json" => "application/json",

        // Documents
        "pdf" => "application/pdf",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",

        // Images
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",

        // Video
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "mkv" => "video/x-matroska",
        "webm" => "video/webm",
        "flv" => "video/x-flv",
        "mpeg" | "mpg" => "video/mpeg",
        "wmv" => "video/x-ms-wmv",
        "3gp" => "video/3gpp",

        // Audio
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "ogg" => "audio/ogg",

        // Default
        _ => "application/octet-stream",
    }
    .to_string()
}
