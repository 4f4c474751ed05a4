//! CLI command definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "pharmos",
    version,
    about = "Pharmaceutical research orchestration engine"
)]
pub struct Cli {
    /// Path to a config file (defaults to pharmos.{jsonc,json,yml,yaml})
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a research query through the plan-execute-synthesize pipeline
    Research {
        /// Free-text research question
        query: String,

        /// Write the markdown report to this file
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Ingest these documents into the internal knowledge base before
        /// the run (plain text or markdown)
        #[arg(long)]
        ingest: Vec<PathBuf>,

        /// Force deterministic simulated data sources (no worker network
        /// traffic; the generation backend is still required)
        #[arg(long)]
        simulated: bool,
    },

    /// List the worker agent catalog
    Agents,
}
