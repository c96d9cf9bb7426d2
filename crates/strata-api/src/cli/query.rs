//! Query command: ask a question and print the grounded answer.

use anyhow::Result;
use comfy_table::{presets, Cell, CellAlignment, Color, ContentArrangement, Table};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use strata_types::query::{QueryRequest, QueryResponse, SourceCitation};

use crate::state::AppState;

/// Answer a question from the knowledge base.
///
/// # Examples
///
/// ```bash
/// strata query "What does the onboarding video cover?"
/// strata query "quarterly revenue" --flat -d 256 -k 10
/// ```
pub async fn query(
    state: &AppState,
    text: String,
    dimension: Option<usize>,
    k: Option<usize>,
    flat: bool,
    json: bool,
    verbose: bool,
) -> Result<()> {
    let request = QueryRequest {
        query: text,
        dimension,
        hierarchical: flat.then_some(false),
        k,
    };

    let spinner = if json {
        ProgressBar::hidden()
    } else {
        ProgressBar::new_spinner()
    };
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    spinner.set_message("Searching the knowledge base...");
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));

    let result = state.query_service.answer(&request).await;
    spinner.finish_and_clear();
    let response = result?;

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    print_response(&response, verbose);
    Ok(())
}

fn sources_table(sources: &[SourceCitation]) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("#").fg(Color::White),
        Cell::new("Source").fg(Color::White),
        Cell::new("Location").fg(Color::White),
        Cell::new("Similarity").fg(Color::White),
    ]);

    for (i, source) in sources.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1).fg(Color::DarkGrey),
            Cell::new(&source.key).fg(Color::Cyan),
            Cell::new(&source.text_preview),
            Cell::new(format!("{:.1}%", source.similarity * 100.0)).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

fn print_response(response: &QueryResponse, verbose: bool) {
    println!();
    println!("{}", response.answer);
    println!();

    if response.sources.is_empty() {
        println!("  {} No sources above the similarity threshold.", style("i").blue().bold());
    } else {
        println!("{}", sources_table(&response.sources));
    }
    println!();
    println!(
        "  {} {} source{} · {}d · {}",
        style("⚡").bold(),
        style(response.results_found).bold(),
        if response.results_found == 1 { "" } else { "s" },
        response.dimension,
        style(&response.model).dim()
    );

    if verbose {
        println!();
        println!("  {}", style("── Steps ──").dim());
        for step in &response.processing_steps {
            println!("  {} {}", style("›").dim(), step);
        }
    }
    println!();
}
