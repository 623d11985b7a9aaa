//! Filter stage: header normalization plus sequence cleaning, one line at a
//! time.
//!
//! Headers lose their quoting artifacts, are fitted to the configured field
//! count and folded to ASCII. Sequence lines are cleaned against the
//! alphabet, which removes gap characters. The output file appears
//! atomically: lines go to a temp file in the destination directory that is
//! renamed into place only on full success, so a failure leaves no partial
//! artifact behind.

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::fasta::is_header_line;
use crate::header::normalize_header;

pub fn normalize_file(
    input: &Path,
    output: &Path,
    config: &PipelineConfig,
) -> Result<(), PipelineError> {
    let reader = BufReader::new(File::open(input)?);
    let dir = output.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;

    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if is_header_line(line) {
            writeln!(tmp, "{}", normalize_header(line, config.expected_fields))?;
        } else {
            writeln!(tmp, "{}", config.alphabet.clean(line))?;
        }
    }

    tmp.flush()?;
    tmp.persist(output).map_err(|e| PipelineError::Io(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn test_config() -> PipelineConfig {
        PipelineConfig::new(PathBuf::from("in"), PathBuf::from("out"))
    }

    #[test]
    fn test_normalizes_headers_and_cleans_sequences() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("a.fasta");
        let output = dir.path().join("out.fasta");
        fs::write(
            &input,
            "\">ACC1;Fungí;Asco;c;o;f;g;s;extra\"\nac-gt\nACG-T\n",
        )
        .unwrap();

        normalize_file(&input, &output, &test_config()).unwrap();
        assert_eq!(
            fs::read_to_string(&output).unwrap(),
            ">ACC1;Fungi;Asco;c;o;f;g;s\nACGT\nACGT\n"
        );
    }

    #[test]
    fn test_short_header_is_padded() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("a.fasta");
        let output = dir.path().join("out.fasta");
        fs::write(&input, ">ACC1;Fungi\nACGT\n").unwrap();

        normalize_file(&input, &output, &test_config()).unwrap();
        assert_eq!(
            fs::read_to_string(&output).unwrap(),
            ">ACC1;Fungi;.;.;.;.;.;.\nACGT\n"
        );
    }

    #[test]
    fn test_failure_leaves_no_output() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("out.fasta");
        let err = normalize_file(&dir.path().join("absent.fasta"), &output, &test_config());
        assert!(err.is_err());
        assert!(!output.exists());
        // no stray temp files either
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
