//! CLI command definitions and dispatch for the `strata` binary.
//!
//! Uses clap derive macros for argument parsing.

pub mod ingest;
pub mod query;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Multimodal Matryoshka embedding ingestion and retrieval.
#[derive(Parser)]
#[command(name = "strata", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Ingest one object: embed it and store every dimension variant.
    Ingest {
        /// Bucket holding the object.
        bucket: String,

        /// Object key, as delivered by the upload notification.
        key: String,

        /// Upload this local file to the object location first.
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Ask a question against the knowledge base.
    #[command(alias = "ask")]
    Query {
        /// The question.
        text: String,

        /// Index dimension to search.
        #[arg(short, long)]
        dimension: Option<usize>,

        /// Number of sources to retrieve.
        #[arg(short)]
        k: Option<usize>,

        /// Single-pass search at `--dimension` instead of the two-pass search.
        #[arg(long)]
        flat: bool,
    },

    /// Start the REST API server.
    Serve {
        /// Port to listen on (defaults to `server.port` in config.toml).
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to (defaults to `server.host` in config.toml).
        #[arg(long)]
        host: Option<String>,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}
