//! Dedup stage: one record per accession, longest cleaned sequence wins.
//!
//! Records stream through in file order. The stored record for a key is
//! replaced only on a strictly longer cleaned sequence, so equal lengths
//! keep the first-seen record, and output order is first-seen key order.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use indexmap::map::Entry;
use indexmap::IndexMap;
use log::warn;

use crate::error::PipelineError;
use crate::fasta::{write_records, FastaReader, Record};
use crate::header::accession;
use crate::seq::Alphabet;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct DedupStats {
    /// Records parsed from the input.
    pub total: usize,
    /// Unique records written out.
    pub kept: usize,
    /// Records skipped for a missing accession.
    pub malformed: usize,
}

pub fn dedup_file(
    input: &Path,
    output: &Path,
    alphabet: &Alphabet,
) -> Result<DedupStats, PipelineError> {
    let mut stats = DedupStats::default();
    let mut unique: IndexMap<String, Record> = IndexMap::new();

    for record in FastaReader::from_path(input)? {
        let record = record?;
        stats.total += 1;

        let Some(key) = accession(&record.header).map(str::to_string) else {
            stats.malformed += 1;
            warn!(
                "{}: {}",
                input.display(),
                PipelineError::Format(format!("header without accession: {}", record.header))
            );
            continue;
        };

        let cleaned = Record {
            header: record.header,
            sequence: alphabet.clean(&record.sequence),
        };
        match unique.entry(key) {
            Entry::Occupied(mut existing) => {
                if cleaned.sequence.len() > existing.get().sequence.len() {
                    existing.insert(cleaned);
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(cleaned);
            }
        }
    }

    let records: Vec<Record> = unique.into_values().collect();
    stats.kept = records.len();

    let mut out = BufWriter::new(File::create(output)?);
    write_records(&mut out, &records)?;
    out.flush()?;

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn run_dedup(input_text: &str) -> (DedupStats, String) {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.fasta");
        let output = dir.path().join("out.fasta");
        fs::write(&input, input_text).unwrap();
        let stats = dedup_file(&input, &output, &Alphabet::default()).unwrap();
        (stats, fs::read_to_string(&output).unwrap())
    }

    #[test]
    fn test_longer_sequence_replaces_shorter() {
        let (stats, out) =
            run_dedup(">ACC1;Fungi;Ascomycota\nAC-GT\n>ACC1;Fungi;Ascomycota\nACGTACGT\n");
        assert_eq!(stats.total, 2);
        assert_eq!(stats.kept, 1);
        assert_eq!(out, ">ACC1;Fungi;Ascomycota\nACGTACGT\n");
    }

    #[test]
    fn test_equal_length_keeps_first_seen() {
        let (stats, out) = run_dedup(">A;first\nACGT\n>A;second\nTTTT\n");
        assert_eq!(stats.kept, 1);
        assert_eq!(out, ">A;first\nACGT\n");
    }

    #[test]
    fn test_gap_characters_do_not_count_toward_length() {
        // second record is longer raw but shorter once gaps are cleaned
        let (_, out) = run_dedup(">A;x\nACGTA\n>A;y\nAC--G---T\n");
        assert_eq!(out, ">A;x\nACGTA\n");
    }

    #[test]
    fn test_first_seen_key_order_is_preserved() {
        let (_, out) = run_dedup(
            ">B;x\nAA\n>A;x\nCC\n>B;x\nAAAA\n>C;x\nGG\n",
        );
        assert_eq!(out, ">B;x\nAAAA\n>A;x\nCC\n>C;x\nGG\n");
    }

    #[test]
    fn test_zero_records_yields_empty_output() {
        let (stats, out) = run_dedup("no fasta content here\n");
        assert_eq!(stats, DedupStats::default());
        assert_eq!(out, "");
    }

    #[test]
    fn test_malformed_headers_are_skipped() {
        let (stats, out) = run_dedup(">;Fungi\nACGT\n>A;Fungi\nTT\n");
        assert_eq!(stats.malformed, 1);
        assert_eq!(stats.kept, 1);
        assert_eq!(out, ">A;Fungi\nTT\n");
    }

    #[test]
    fn test_sequences_are_cleaned_and_uppercased() {
        let (_, out) = run_dedup(">A;x\nac-gt n\n");
        assert_eq!(out, ">A;x\nACGTN\n");
    }
}
