//! Foreground ingestion command.

use std::path::Path;

use anyhow::{Context, Result};
use comfy_table::{presets, Cell, Color, ContentArrangement, Table};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use strata_core::ingest::driver::drive;
use strata_core::ingest::report::{IngestionReport, IngestionStatus};
use strata_core::ingest::trigger::{decode_trigger, TriggerDecision};
use strata_types::media::ObjectLocation;

use crate::state::AppState;

/// Ingest one object and print the run report.
///
/// # Examples
///
/// ```bash
/// # Object already in the blob root
/// strata ingest media-uploads docs/report.pdf
///
/// # Upload a local file first
/// strata ingest media-uploads clips/intro.mp4 --file ./intro.mp4
/// ```
pub async fn ingest(
    state: &AppState,
    bucket: &str,
    key: &str,
    file: Option<&Path>,
    json: bool,
    quiet: bool,
) -> Result<()> {
    let location = match decode_trigger(bucket, key) {
        TriggerDecision::Ingest(location) => location,
        TriggerDecision::Skip { key, reason } => {
            if json {
                let body = serde_json::json!({"accepted": false, "bucket": bucket, "key": key, "reason": reason});
                println!("{}", serde_json::to_string_pretty(&body)?);
            } else if !quiet {
                println!();
                println!("  {} Skipped {}: {}", style("i").blue().bold(), style(&key).yellow(), reason);
                println!();
            }
            return Ok(());
        }
    };

    if let Some(path) = file {
        upload(state, path, &location).await?;
    }

    let spinner = if json || quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new_spinner()
    };
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg} {elapsed:.dim}")?);
    spinner.set_message(format!("Ingesting {location}..."));
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));

    let report = drive(&state.orchestrator, location).await;

    spinner.finish_and_clear();

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if !quiet {
        print_report(&report);
    }

    if !report.is_success() {
        anyhow::bail!(
            "ingestion failed: {}",
            report.error.as_deref().unwrap_or("unknown error")
        );
    }
    Ok(())
}

async fn upload(state: &AppState, path: &Path, location: &ObjectLocation) -> Result<()> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    state.blobs.put(location, &bytes).await?;
    tracing::info!(%location, size = bytes.len(), "uploaded local file");
    Ok(())
}

fn status_cell(status: IngestionStatus) -> Cell {
    match status {
        IngestionStatus::Succeeded => Cell::new("● succeeded").fg(Color::Green),
        IngestionStatus::PartiallySucceeded => Cell::new("◐ partial").fg(Color::Yellow),
        IngestionStatus::Failed => Cell::new("○ failed").fg(Color::Red),
    }
}

fn print_report(report: &IngestionReport) {
    let elapsed = report.finished_at - report.started_at;

    println!();
    println!(
        "  {} {}",
        style("⚡").bold(),
        style(report.file_name.as_deref().unwrap_or(&report.location.key)).cyan().bold()
    );
    println!("  Source:   {}", style(&report.location).dim());
    if let Some(object_id) = &report.object_id {
        println!("  Object:   {}", style(object_id).dim());
    }
    println!("  Status:   {}", report.status);
    println!("  Vectors:  {}", style(report.vectors_stored).bold());
    println!("  Elapsed:  {:.1}s", elapsed.num_milliseconds() as f64 / 1000.0);
    if let Some(error) = &report.error {
        println!("  Error:    {}", style(error).red());
    }

    if !report.pages.is_empty() {
        let mut table = Table::new();
        table.load_preset(presets::UTF8_FULL_CONDENSED);
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec![
            Cell::new("Page").fg(Color::White),
            Cell::new("Status").fg(Color::White),
            Cell::new("Vectors").fg(Color::White),
            Cell::new("Error").fg(Color::White),
        ]);
        for page in &report.pages {
            let status = if page.succeeded() {
                IngestionStatus::Succeeded
            } else {
                IngestionStatus::Failed
            };
            table.add_row(vec![
                Cell::new(page.page_number).fg(Color::Cyan),
                status_cell(status),
                Cell::new(page.vectors_stored),
                Cell::new(page.error.as_deref().unwrap_or("")).fg(Color::DarkGrey),
            ]);
        }
        println!();
        println!("{table}");
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::{state, StubGenerator};

    #[tokio::test]
    async fn test_upload_writes_under_blob_root() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(&dir, StubGenerator::default());
        let local = dir.path().join("notes.txt");
        tokio::fs::write(&local, "hello").await.unwrap();

        let location = ObjectLocation::new("uploads", "docs/notes.txt");
        upload(&state, &local, &location).await.unwrap();

        let stored = tokio::fs::read(dir.path().join("blobs/uploads/docs/notes.txt")).await.unwrap();
        assert_eq!(stored, b"hello");
    }

    #[tokio::test]
    async fn test_unsupported_type_fails_the_command() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(&dir, StubGenerator::default());
        let local = dir.path().join("archive.zip");
        tokio::fs::write(&local, "PK").await.unwrap();

        let result = ingest(&state, "uploads", "archive.zip", Some(&local), false, true).await;
        assert!(result.unwrap_err().to_string().contains("ingestion failed"));
    }

    #[tokio::test]
    async fn test_derived_artifact_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(&dir, StubGenerator::default());
        assert!(ingest(&state, "uploads", "docx-text/memo.txt", None, false, true).await.is_ok());
    }
}
