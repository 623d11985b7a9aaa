//! Read-only duplicate audit.
//!
//! Counts occurrences of every full header and every accession per file and
//! writes two CSV reports for operator review: repeated headers with their
//! line numbers, and repeated accessions with the contributing headers.
//! Nothing here mutates pipeline artifacts.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use itertools::Itertools;
use log::info;

use crate::error::PipelineError;
use crate::fasta::HEADER_MARKER;
use crate::header::accession;

pub const HEADER_REPORT_FILENAME: &str = "duplicate_full_headers_report.csv";
pub const ACCESSION_REPORT_FILENAME: &str = "duplicate_accession_ids_report.csv";

const PLACEHOLDER: &str = "No duplicates found";

/// Occurrences of one header value within a file.
#[derive(Debug, Default, Clone)]
struct HeaderHits {
    count: usize,
    lines: Vec<usize>,
}

/// Occurrences of one accession within a file.
#[derive(Debug, Default, Clone)]
struct AccessionHits {
    count: usize,
    headers: Vec<String>,
}

/// Duplicate findings for a single file.
#[derive(Debug, Default)]
pub struct FileDuplicates {
    pub filename: String,
    headers: IndexMap<String, HeaderHits>,
    accessions: IndexMap<String, AccessionHits>,
}

impl FileDuplicates {
    pub fn has_duplicates(&self) -> bool {
        self.headers.values().any(|h| h.count > 1)
            || self.accessions.values().any(|a| a.count > 1)
    }
}

/// Scans one file, recording line numbers per header and contributing
/// headers per accession.
pub fn analyze_file(path: &Path, filename: &str) -> Result<FileDuplicates, PipelineError> {
    let reader = BufReader::new(File::open(path)?);
    let mut found = FileDuplicates {
        filename: filename.to_string(),
        ..FileDuplicates::default()
    };

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if !line.starts_with(HEADER_MARKER) {
            continue;
        }
        let line_number = index + 1;

        let hits = found.headers.entry(line.to_string()).or_default();
        hits.count += 1;
        hits.lines.push(line_number);

        if let Some(acc) = accession(line) {
            let hits = found.accessions.entry(acc.to_string()).or_default();
            hits.count += 1;
            hits.headers.push(line.to_string());
        }
    }

    Ok(found)
}

/// Writes both reports. Each report carries a single placeholder row when no
/// duplicates exist, rather than an empty table.
pub fn write_reports(
    report_dir: &Path,
    results: &[FileDuplicates],
) -> Result<(PathBuf, PathBuf), PipelineError> {
    let header_path = report_dir.join(HEADER_REPORT_FILENAME);
    let accession_path = report_dir.join(ACCESSION_REPORT_FILENAME);

    let mut header_writer = csv::Writer::from_path(&header_path)?;
    header_writer.write_record(["Filename", "Full Header", "Repetitions", "Line Numbers"])?;
    let mut header_rows = 0usize;
    for file in results {
        for (header, hits) in &file.headers {
            if hits.count > 1 {
                header_writer.write_record(&[
                    file.filename.clone(),
                    header.clone(),
                    hits.count.to_string(),
                    hits.lines.iter().join(", "),
                ])?;
                header_rows += 1;
            }
        }
    }
    if header_rows == 0 {
        header_writer.write_record([PLACEHOLDER, "", "", ""])?;
    }
    header_writer.flush()?;

    let mut accession_writer = csv::Writer::from_path(&accession_path)?;
    accession_writer.write_record(["Filename", "Accession ID", "Repetitions", "Headers"])?;
    let mut accession_rows = 0usize;
    for file in results {
        for (acc, hits) in &file.accessions {
            if hits.count > 1 {
                accession_writer.write_record(&[
                    file.filename.clone(),
                    acc.clone(),
                    hits.count.to_string(),
                    hits.headers.iter().join(" | "),
                ])?;
                accession_rows += 1;
            }
        }
    }
    if accession_rows == 0 {
        accession_writer.write_record([PLACEHOLDER, "", "", ""])?;
    }
    accession_writer.flush()?;

    info!(
        "duplicate reports written: {} header rows, {} accession rows",
        header_rows, accession_rows
    );
    Ok((header_path, accession_path))
}
