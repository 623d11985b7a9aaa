//! Pipeline configuration.
//!
//! One explicit value object built by the CLI and passed by reference to
//! every component; there is no module-level mutable configuration.

use std::path::{Path, PathBuf};

use crate::seq::Alphabet;
use crate::taxonomy::Rank;

/// Default header width: the accession plus one field per taxonomic rank.
pub fn default_expected_fields() -> usize {
    1 + Rank::all().len()
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory of raw `.txt` / `.fasta` input files.
    pub input_dir: PathBuf,

    /// Root under which the per-stage output directories live.
    pub output_root: PathBuf,

    /// Path of the JSON workflow state file.
    pub state_file: PathBuf,

    /// Worker threads per stage. 0 means one per logical core.
    pub workers: usize,

    /// Semicolon-delimited fields every header is fitted to.
    pub expected_fields: usize,

    /// Allowed sequence characters.
    pub alphabet: Alphabet,

    /// Clear stage directories and state before running.
    pub fresh: bool,
}

impl PipelineConfig {
    pub fn new(input_dir: PathBuf, output_root: PathBuf) -> Self {
        let state_file = output_root.join("workflow_state.json");
        PipelineConfig {
            input_dir,
            output_root,
            state_file,
            workers: 8,
            expected_fields: default_expected_fields(),
            alphabet: Alphabet::default(),
            fresh: false,
        }
    }

    pub fn effective_workers(&self) -> usize {
        if self.workers == 0 {
            num_cpus::get()
        } else {
            self.workers
        }
    }

    pub fn converted_dir(&self) -> PathBuf {
        self.output_root.join("converted_fasta")
    }

    pub fn filtered_dir(&self) -> PathBuf {
        self.output_root.join("filtered_fasta")
    }

    pub fn dedup_dir(&self) -> PathBuf {
        self.output_root.join("deduplicated_fasta")
    }

    pub fn standardized_dir(&self) -> PathBuf {
        self.output_root.join("standardized_fasta")
    }

    pub fn report_dir(&self) -> PathBuf {
        self.output_root.join("reports")
    }

    /// Stage output directories in processing order.
    pub fn stage_dirs(&self) -> Vec<PathBuf> {
        vec![
            self.converted_dir(),
            self.filtered_dir(),
            self.dedup_dir(),
            self.standardized_dir(),
            self.report_dir(),
        ]
    }
}

/// True for the input extensions the converter accepts.
pub fn is_input_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let e = e.to_lowercase();
            e == "txt" || e == "fasta"
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_expected_fields() {
        // accession + kingdom..species
        assert_eq!(default_expected_fields(), 8);
    }

    #[test]
    fn test_stage_dirs_live_under_output_root() {
        let cfg = PipelineConfig::new(PathBuf::from("in"), PathBuf::from("out"));
        for dir in cfg.stage_dirs() {
            assert!(dir.starts_with("out"));
        }
        assert_eq!(cfg.state_file, PathBuf::from("out/workflow_state.json"));
    }

    #[test]
    fn test_effective_workers() {
        let mut cfg = PipelineConfig::new(PathBuf::from("in"), PathBuf::from("out"));
        cfg.workers = 3;
        assert_eq!(cfg.effective_workers(), 3);
        cfg.workers = 0;
        assert!(cfg.effective_workers() >= 1);
    }

    #[test]
    fn test_is_input_file() {
        assert!(is_input_file(Path::new("a.txt")));
        assert!(is_input_file(Path::new("b.FASTA")));
        assert!(!is_input_file(Path::new("c.csv")));
        assert!(!is_input_file(Path::new("noext")));
    }
}
