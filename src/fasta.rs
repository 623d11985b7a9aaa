//! Lenient line-level FASTA reading and writing.
//!
//! The strict `needletail` parser is reserved for the final summary pass;
//! intermediate stage files can be arbitrarily dirty, so this reader only
//! assumes "header lines start with the marker, everything else is sequence".
//! Lines before the first header and blank lines are skipped.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;

/// First character of a FASTA header line.
pub const HEADER_MARKER: char = '>';

/// True for a header line, including the quote-wrapped form seen in raw
/// exports (`">ACC;..."`).
pub fn is_header_line(line: &str) -> bool {
    line.starts_with(HEADER_MARKER) || line.starts_with("\">")
}

/// One parsed record: the full header line (marker included) and the
/// concatenated sequence body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub header: String,
    pub sequence: String,
}

impl Record {
    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "{}", self.header)?;
        writeln!(out, "{}", self.sequence)
    }
}

/// Streaming record iterator over any buffered reader.
pub struct FastaReader<R: BufRead> {
    lines: io::Lines<R>,
    pending_header: Option<String>,
    done: bool,
}

impl FastaReader<BufReader<File>> {
    pub fn from_path(path: &Path) -> io::Result<Self> {
        Ok(FastaReader::new(BufReader::new(File::open(path)?)))
    }
}

impl<R: BufRead> FastaReader<R> {
    pub fn new(reader: R) -> Self {
        FastaReader {
            lines: reader.lines(),
            pending_header: None,
            done: false,
        }
    }
}

impl<R: BufRead> Iterator for FastaReader<R> {
    type Item = io::Result<Record>;

    fn next(&mut self) -> Option<io::Result<Record>> {
        if self.done {
            return None;
        }
        let mut sequence = String::new();
        loop {
            match self.lines.next() {
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(e));
                }
                Some(Ok(line)) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    if line.starts_with(HEADER_MARKER) {
                        let header = self.pending_header.replace(line.to_string());
                        match header {
                            Some(header) => return Some(Ok(Record { header, sequence })),
                            // lines before the first header were skipped
                            None => continue,
                        }
                    } else if self.pending_header.is_some() {
                        sequence.push_str(line);
                    }
                }
                None => {
                    self.done = true;
                    return self
                        .pending_header
                        .take()
                        .map(|header| Ok(Record { header, sequence }));
                }
            }
        }
    }
}

/// Writes records in order, one header line and one sequence line each.
pub fn write_records<W: Write>(out: &mut W, records: &[Record]) -> io::Result<()> {
    for record in records {
        record.write_to(out)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn read_all(input: &str) -> Vec<Record> {
        FastaReader::new(Cursor::new(input.to_string()))
            .collect::<io::Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn test_reads_records_with_multiline_sequences() {
        let records = read_all(">A;Fungi\nACGT\nTTAA\n>B;Fungi\nGGGG\n");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].header, ">A;Fungi");
        assert_eq!(records[0].sequence, "ACGTTTAA");
        assert_eq!(records[1].header, ">B;Fungi");
        assert_eq!(records[1].sequence, "GGGG");
    }

    #[test]
    fn test_skips_blank_lines_and_leading_junk() {
        let records = read_all("junk line\n\n>A\n\nAC\nGT\n");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].sequence, "ACGT");
    }

    #[test]
    fn test_empty_input_yields_no_records() {
        assert!(read_all("").is_empty());
        assert!(read_all("no headers here\nat all\n").is_empty());
    }

    #[test]
    fn test_record_with_no_sequence_lines() {
        let records = read_all(">A;Fungi\n>B;Fungi\nACGT\n");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].sequence, "");
        assert_eq!(records[1].sequence, "ACGT");
    }

    #[test]
    fn test_is_header_line() {
        assert!(is_header_line(">ACC"));
        assert!(is_header_line("\">ACC;Fungi\""));
        assert!(!is_header_line("ACGT"));
    }

    #[test]
    fn test_write_records_round_trip() {
        let records = vec![
            Record {
                header: ">A;Fungi;".to_string(),
                sequence: "ACGT".to_string(),
            },
            Record {
                header: ">B;Fungi;".to_string(),
                sequence: "TT".to_string(),
            },
        ];
        let mut buf = Vec::new();
        write_records(&mut buf, &records).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            ">A;Fungi;\nACGT\n>B;Fungi;\nTT\n"
        );
    }
}
