//! Stage orchestration.
//!
//! Stages run strictly in sequence across the batch; within a stage, files
//! go through a fixed-size worker pool with no cross-file ordering. Every
//! per-file result is recorded in the workflow state before the next stage
//! starts, so a killed run resumes from the last recorded stage per file.

pub mod convert;
pub mod dedup;
pub mod normalize;
pub mod report;
pub mod standardize;
pub mod summary;

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use log::{debug, error, info, warn};

use crate::config::{is_input_file, PipelineConfig};
use crate::error::PipelineError;
use crate::formatter::LineFormatter;
use crate::state::{Stage, StateMap, StateStore, StateWriter};
use crate::utils::WorkerPool;

/// One file's identity through the run: the `.fasta` output filename every
/// stage shares, plus the raw input path it started from.
#[derive(Debug, Clone)]
struct PipelineFile {
    filename: String,
    input: PathBuf,
}

/// A single unit of stage work.
#[derive(Debug, Clone)]
struct StageJob {
    filename: String,
    input: PathBuf,
    output: PathBuf,
}

/// Outcome of a full run, derived from the final state.
#[derive(Debug)]
pub struct RunSummary {
    pub total_files: usize,
    pub completed: usize,
    /// Filename and the stages it failed at.
    pub failed: Vec<(String, Vec<&'static str>)>,
}

pub struct Pipeline {
    config: PipelineConfig,
    formatter: Arc<dyn LineFormatter>,
}

impl Pipeline {
    pub fn new(config: PipelineConfig, formatter: Arc<dyn LineFormatter>) -> Self {
        Pipeline { config, formatter }
    }

    pub fn run(&self) -> Result<RunSummary, PipelineError> {
        if self.config.fresh {
            self.clear_previous_run()?;
        }
        self.prepare_dirs()?;

        let files = self.discover_inputs()?;
        if files.is_empty() {
            warn!(
                "no .txt or .fasta inputs in {}",
                self.config.input_dir.display()
            );
        }

        let writer = StateWriter::spawn(StateStore::load(&self.config.state_file));
        let pool = WorkerPool::new(self.config.effective_workers())?;
        info!(
            "processing {} file(s) with {} worker(s), alphabet {}, formatter {}",
            files.len(),
            pool.threads(),
            self.config.alphabet.symbols(),
            self.formatter.name()
        );

        let snapshot = writer.checkpoint()?;
        info!("converting raw inputs to FASTA");
        self.run_stage(
            &pool,
            &writer,
            Stage::Converted,
            self.stage_jobs(&files, &snapshot, Stage::Converted),
            |job| convert::convert_file(&job.input, &job.output),
        );

        let snapshot = writer.checkpoint()?;
        info!("normalizing headers and cleaning sequences");
        self.run_stage(
            &pool,
            &writer,
            Stage::Filtered,
            self.stage_jobs(&files, &snapshot, Stage::Filtered),
            |job| normalize::normalize_file(&job.input, &job.output, &self.config),
        );

        let snapshot = writer.checkpoint()?;
        self.generate_reports(&pool, &files, &snapshot);

        info!("eliminating duplicates, keeping the longest sequence per accession");
        self.run_stage(
            &pool,
            &writer,
            Stage::Deduplicated,
            self.stage_jobs(&files, &snapshot, Stage::Deduplicated),
            |job| {
                let stats = dedup::dedup_file(&job.input, &job.output, &self.config.alphabet)?;
                if stats.total == 0 {
                    warn!("{}: {}", job.filename, PipelineError::EmptyInput);
                } else {
                    info!(
                        "{}: kept {} of {} record(s) ({} malformed)",
                        job.filename, stats.kept, stats.total, stats.malformed
                    );
                }
                if let Err(e) = self.formatter.format_file(&job.output) {
                    warn!(
                        "{}: continuing without line reformatting: {}",
                        job.filename, e
                    );
                }
                Ok(())
            },
        );

        let snapshot = writer.checkpoint()?;
        info!("standardizing headers of deduplicated files");
        self.run_stage(
            &pool,
            &writer,
            Stage::Standardized,
            self.stage_jobs(&files, &snapshot, Stage::Standardized),
            |job| standardize::standardize_file(&job.input, &job.output, self.config.expected_fields),
        );

        let snapshot = writer.checkpoint()?;
        self.generate_summary(&pool, &files, &snapshot);

        let store = writer.finish()?;
        Ok(self.summarize_run(&files, &store))
    }

    /// Runs one stage over its eligible files, recording every per-file
    /// outcome through the state writer. Errors never escape a worker.
    fn run_stage<F>(
        &self,
        pool: &WorkerPool,
        writer: &StateWriter,
        stage: Stage,
        jobs: Vec<StageJob>,
        op: F,
    ) where
        F: Fn(&StageJob) -> Result<(), PipelineError> + Send + Sync,
    {
        let tagged: Vec<_> = jobs
            .into_iter()
            .map(|job| (job, writer.handle()))
            .collect();
        pool.run(tagged, |(job, state)| match op(&job) {
            Ok(()) => {
                debug!("{}: {} done", job.filename, stage.as_str());
                state.record(&job.filename, stage, None);
            }
            Err(e) => {
                error!("{} failed for {}: {}", stage.as_str(), job.filename, e);
                state.record(&job.filename, stage, Some(e.to_string()));
            }
        });
    }

    /// Read-only duplicate audit over the filtered files. Failures here are
    /// logged and never stop the pipeline.
    fn generate_reports(&self, pool: &WorkerPool, files: &[PipelineFile], snapshot: &StateMap) {
        info!("generating duplicate reports");
        let filtered_dir = self.config.filtered_dir();
        let eligible: Vec<String> = files
            .iter()
            .filter(|f| {
                snapshot
                    .get(&f.filename)
                    .map(|s| s.stage_done(Stage::Filtered))
                    .unwrap_or(false)
            })
            .map(|f| f.filename.clone())
            .collect();

        let results = pool.run(eligible, |filename| {
            report::analyze_file(&filtered_dir.join(&filename), &filename)
        });
        let mut found = Vec::new();
        for result in results {
            match result {
                Ok(file) => found.push(file),
                Err(e) => error!("duplicate analysis failed: {}", e),
            }
        }
        let with_duplicates = found.iter().filter(|f| f.has_duplicates()).count();
        info!(
            "{} of {} analyzed file(s) contain duplicates",
            with_duplicates,
            found.len()
        );
        if let Err(e) = report::write_reports(&self.config.report_dir(), &found) {
            error!("could not write duplicate reports: {}", e);
        }
    }

    /// Statistics over the standardized outputs, written next to the
    /// duplicate reports. Also non-fatal.
    fn generate_summary(&self, pool: &WorkerPool, files: &[PipelineFile], snapshot: &StateMap) {
        let standardized_dir = self.config.standardized_dir();
        let eligible: Vec<String> = files
            .iter()
            .filter(|f| {
                snapshot
                    .get(&f.filename)
                    .map(|s| s.stage_done(Stage::Standardized))
                    .unwrap_or(false)
            })
            .map(|f| f.filename.clone())
            .collect();

        let results = pool.run(eligible, |filename| {
            summary::summarize_file(&standardized_dir.join(&filename), &filename)
        });
        let mut summaries = Vec::new();
        for result in results {
            match result {
                Ok(s) => summaries.push(s),
                Err(e) => error!("summary failed: {}", e),
            }
        }
        if let Err(e) = summary::write_summary(&self.config.report_dir(), &summaries) {
            error!("could not write run summary: {}", e);
        }
    }

    /// Selects the files a stage still has to process: the previous stage
    /// must be recorded successful and the stage itself must not be.
    fn stage_jobs(
        &self,
        files: &[PipelineFile],
        snapshot: &StateMap,
        stage: Stage,
    ) -> Vec<StageJob> {
        let (input_dir, output_dir) = self.stage_io(stage);
        files
            .iter()
            .filter_map(|file| {
                let state = snapshot.get(&file.filename).cloned().unwrap_or_default();
                if state.stage_done(stage) {
                    info!(
                        "skipping {} ({} already done)",
                        file.filename,
                        stage.as_str()
                    );
                    return None;
                }
                if let Some(previous) = stage.previous() {
                    if !state.stage_done(previous) {
                        debug!(
                            "{} not eligible for {} ({} incomplete)",
                            file.filename,
                            stage.as_str(),
                            previous.as_str()
                        );
                        return None;
                    }
                }
                let input = match stage {
                    Stage::Converted => file.input.clone(),
                    _ => input_dir.join(&file.filename),
                };
                Some(StageJob {
                    filename: file.filename.clone(),
                    input,
                    output: output_dir.join(&file.filename),
                })
            })
            .collect()
    }

    /// Input and output directories of a stage.
    fn stage_io(&self, stage: Stage) -> (PathBuf, PathBuf) {
        match stage {
            Stage::Converted => (self.config.input_dir.clone(), self.config.converted_dir()),
            Stage::Filtered => (self.config.converted_dir(), self.config.filtered_dir()),
            Stage::Deduplicated => (self.config.filtered_dir(), self.config.dedup_dir()),
            Stage::Standardized => (self.config.dedup_dir(), self.config.standardized_dir()),
        }
    }

    /// Lists raw inputs, mapping each to its shared `.fasta` output name.
    fn discover_inputs(&self) -> Result<Vec<PipelineFile>, PipelineError> {
        let mut files: Vec<PipelineFile> = Vec::new();
        for entry in fs::read_dir(&self.config.input_dir)? {
            let path = entry?.path();
            if !path.is_file() || !is_input_file(&path) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                warn!("skipping input with unusable name: {}", path.display());
                continue;
            };
            let filename = format!("{}.fasta", stem);
            if files.iter().any(|f| f.filename == filename) {
                warn!(
                    "skipping {}: output name {} already claimed",
                    path.display(),
                    filename
                );
                continue;
            }
            files.push(PipelineFile {
                filename,
                input: path,
            });
        }
        files.sort_by(|a, b| a.filename.cmp(&b.filename));
        Ok(files)
    }

    fn prepare_dirs(&self) -> Result<(), PipelineError> {
        fs::create_dir_all(&self.config.output_root)?;
        for dir in self.config.stage_dirs() {
            fs::create_dir_all(&dir)?;
        }
        Ok(())
    }

    /// Deletes stage outputs and state so the run starts from nothing.
    fn clear_previous_run(&self) -> Result<(), PipelineError> {
        info!("clearing previous outputs and state for a fresh run");
        for dir in self.config.stage_dirs() {
            if dir.exists() {
                fs::remove_dir_all(&dir)?;
            }
        }
        StateStore::clear(&self.config.state_file);
        Ok(())
    }

    fn summarize_run(&self, files: &[PipelineFile], store: &StateStore) -> RunSummary {
        let mut completed = 0;
        let mut failed = Vec::new();
        for file in files {
            match store.get(&file.filename) {
                Some(state) if state.complete() => completed += 1,
                Some(state) => failed.push((file.filename.clone(), state.failed_stages())),
                None => failed.push((file.filename.clone(), Vec::new())),
            }
        }
        RunSummary {
            total_files: files.len(),
            completed,
            failed,
        }
    }
}
