use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;

use crate::config::{default_expected_fields, PipelineConfig};
use crate::formatter::{LineFormatter, NoopFormatter, SeqkitFormatter};
use crate::pipeline::{report, Pipeline};
use crate::utils::WorkerPool;

/// Preprocessing pipeline for taxonomic reference FASTA databases.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full preprocessing pipeline over a directory of raw files
    Run {
        /// Directory of raw .txt / .fasta input files
        #[arg(short, long)]
        input: PathBuf,

        /// Root directory for stage outputs, reports and state
        #[arg(short, long, default_value = "pipeline_out")]
        output: PathBuf,

        /// Worker threads per stage (0 = one per core)
        #[arg(short = 't', long, default_value_t = 8)]
        threads: usize,

        /// Semicolon-delimited fields every header is fitted to
        #[arg(long, default_value_t = default_expected_fields())]
        expected_fields: usize,

        /// Discard previous outputs and state instead of resuming
        #[arg(long)]
        fresh: bool,

        /// Skip the external seqkit reformatting of deduplicated files
        #[arg(long)]
        no_reformat: bool,

        /// Name or path of the seqkit binary
        #[arg(long, default_value = "seqkit")]
        seqkit: String,
    },

    /// Audit a directory of FASTA files for duplicate headers and accessions
    Report {
        /// Directory of .fasta files to analyze
        #[arg(short, long)]
        input: PathBuf,

        /// Directory the CSV reports are written to
        #[arg(short, long, default_value = "reports")]
        output: PathBuf,

        /// Worker threads (0 = one per core)
        #[arg(short = 't', long, default_value_t = 8)]
        threads: usize,
    },
}

/// Main entry point for CLI
pub fn run_cli(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Run {
            input,
            output,
            threads,
            expected_fields,
            fresh,
            no_reformat,
            seqkit,
        } => {
            let mut config = PipelineConfig::new(input, output);
            config.workers = threads;
            config.expected_fields = expected_fields;
            config.fresh = fresh;

            let formatter: Arc<dyn LineFormatter> = if no_reformat {
                Arc::new(NoopFormatter)
            } else {
                Arc::new(SeqkitFormatter::new(seqkit))
            };

            let summary = Pipeline::new(config.clone(), formatter)
                .run()
                .context("pipeline run failed")?;

            println!(
                "Processed {} file(s): {} complete, {} failed",
                summary.total_files,
                summary.completed,
                summary.failed.len()
            );
            for (filename, stages) in &summary.failed {
                println!("  {} failed at: {}", filename, stages.join(", "));
            }
            println!(
                "Final standardized files: {}",
                config.standardized_dir().display()
            );
            println!("Reports: {}", config.report_dir().display());
            if !summary.failed.is_empty() {
                println!("Re-run with the same arguments to retry the failed files.");
            }
            Ok(())
        }

        Commands::Report {
            input,
            output,
            threads,
        } => {
            let mut files = Vec::new();
            for entry in std::fs::read_dir(&input)
                .with_context(|| format!("cannot read {}", input.display()))?
            {
                let path = entry?.path();
                if path.is_file()
                    && path
                        .extension()
                        .map_or(false, |ext| ext.eq_ignore_ascii_case("fasta"))
                {
                    files.push(path);
                }
            }
            files.sort();
            info!("analyzing {} file(s) for duplicates", files.len());

            let pool = WorkerPool::new(threads)?;
            let results = pool.run(files, |path| {
                let filename = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                report::analyze_file(&path, &filename)
            });

            let mut found = Vec::new();
            for result in results {
                match result {
                    Ok(file) => found.push(file),
                    Err(e) => eprintln!("Error analyzing file: {}", e),
                }
            }

            std::fs::create_dir_all(&output)?;
            let (headers, accessions) = report::write_reports(&output, &found)?;
            println!("Duplicate header report: {}", headers.display());
            println!("Duplicate accession report: {}", accessions.display());
            Ok(())
        }
    }
}
