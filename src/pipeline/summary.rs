//! Run statistics over the standardized outputs.
//!
//! Parses the final artifacts with `needletail`, which doubles as a
//! structural sanity check: a file the strict parser rejects would not be
//! usable downstream either. Results land in one CSV next to the duplicate
//! reports.

use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use needletail::parse_fastx_file;

use crate::error::PipelineError;
use crate::header::rank_fields;
use crate::taxonomy::is_unclassified;

pub const SUMMARY_FILENAME: &str = "run_summary.csv";

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FileSummary {
    pub filename: String,
    pub records: usize,
    pub bases: usize,
    pub min_length: usize,
    pub max_length: usize,
    /// Records whose every rank field is the unclassified placeholder.
    pub unclassified: usize,
}

pub fn summarize_file(path: &Path, filename: &str) -> Result<FileSummary, PipelineError> {
    let mut summary = FileSummary {
        filename: filename.to_string(),
        ..FileSummary::default()
    };

    // the strict parser rejects empty files, but an empty artifact is a
    // valid result of deduplicating zero records
    if fs::metadata(path)?.len() == 0 {
        return Ok(summary);
    }

    let mut reader = parse_fastx_file(path)
        .map_err(|e| PipelineError::Format(format!("{}: {}", path.display(), e)))?;
    while let Some(record) = reader.next() {
        let record =
            record.map_err(|e| PipelineError::Format(format!("{}: {}", path.display(), e)))?;
        let len = record.seq().len();

        summary.records += 1;
        summary.bases += len;
        summary.max_length = summary.max_length.max(len);
        summary.min_length = if summary.records == 1 {
            len
        } else {
            summary.min_length.min(len)
        };

        let header = format!(">{}", String::from_utf8_lossy(record.id()));
        let ranks = rank_fields(&header);
        if !ranks.is_empty() && ranks.iter().all(|r| is_unclassified(r)) {
            summary.unclassified += 1;
        }
    }

    Ok(summary)
}

pub fn write_summary(
    report_dir: &Path,
    summaries: &[FileSummary],
) -> Result<PathBuf, PipelineError> {
    let path = report_dir.join(SUMMARY_FILENAME);
    let mut writer = csv::Writer::from_path(&path)?;
    writer.write_record([
        "Filename",
        "Sequences",
        "Bases",
        "Min Length",
        "Max Length",
        "Fully Unclassified",
    ])?;
    for summary in summaries {
        writer.write_record(&[
            summary.filename.clone(),
            summary.records.to_string(),
            summary.bases.to_string(),
            summary.min_length.to_string(),
            summary.max_length.to_string(),
            summary.unclassified.to_string(),
        ])?;
    }
    writer.flush()?;
    info!(
        "run summary for {} file(s) written to {}",
        summaries.len(),
        path.display()
    );
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_summarize_counts_records_and_bases() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("x.fasta");
        fs::write(
            &path,
            ">A;Fungi;Asco;\nACGTACGT\n>B;.;.;\nAC\n>C;Fungi;.;\nACGT\n",
        )
        .unwrap();

        let summary = summarize_file(&path, "x.fasta").unwrap();
        assert_eq!(summary.records, 3);
        assert_eq!(summary.bases, 14);
        assert_eq!(summary.min_length, 2);
        assert_eq!(summary.max_length, 8);
        assert_eq!(summary.unclassified, 1);
    }

    #[test]
    fn test_summarize_empty_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.fasta");
        fs::write(&path, "").unwrap();

        let summary = summarize_file(&path, "empty.fasta").unwrap();
        assert_eq!(summary.records, 0);
        assert_eq!(summary.bases, 0);
    }

    #[test]
    fn test_write_summary_csv() {
        let dir = tempdir().unwrap();
        let summaries = vec![FileSummary {
            filename: "x.fasta".to_string(),
            records: 2,
            bases: 10,
            min_length: 4,
            max_length: 6,
            unclassified: 0,
        }];
        let path = write_summary(dir.path(), &summaries).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("x.fasta,2,10,4,6,0"));
    }
}
