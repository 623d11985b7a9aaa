//! Entry point for the refdb_prep binary.
//!
//! Converts directories of raw taxonomic reference exports into
//! deduplicated, header-standardized FASTA files:
//! 1. Convert raw text to FASTA with permissive decoding.
//! 2. Normalize headers (quotes, field count, ASCII) and clean sequences.
//! 3. Report duplicate headers and accession IDs for operator review.
//! 4. Keep the longest sequence per accession, first-seen order.
//! 5. Standardize headers to a fixed field count.
//!
//! Progress is persisted per file and stage, so an interrupted run resumes
//! where it stopped.

mod cli;
mod config;
mod error;
mod fasta;
mod formatter;
mod header;
mod pipeline;
mod seq;
mod state;
mod taxonomy;
mod utils;

use clap::Parser;
use env_logger::Env;
use log::error;

use cli::{run_cli, Cli};

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if let Err(e) = run_cli(cli) {
        error!("pipeline failed: {:#}", e);
        std::process::exit(1);
    }
}
