//! Convert stage: raw text to a FASTA-shaped copy.
//!
//! Content passes through byte for byte apart from permissive decoding;
//! undecodable bytes are substituted so that one bad export cannot poison
//! the rest of the batch.

use std::borrow::Cow;
use std::fs;
use std::path::Path;

use log::debug;

use crate::error::PipelineError;

/// Copies `input` to `output` with replacement decoding. Any open, read or
/// write failure is a `Conversion` error for this file only.
pub fn convert_file(input: &Path, output: &Path) -> Result<(), PipelineError> {
    let bytes = fs::read(input).map_err(|e| {
        PipelineError::Conversion(format!("cannot read {}: {}", input.display(), e))
    })?;

    let text = String::from_utf8_lossy(&bytes);
    if let Cow::Owned(_) = text {
        debug!(
            "{}: replaced undecodable bytes during conversion",
            input.display()
        );
    }

    fs::write(output, text.as_bytes()).map_err(|e| {
        PipelineError::Conversion(format!("cannot write {}: {}", output.display(), e))
    })?;
    Ok(())
}
