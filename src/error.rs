//! Error taxonomy shared by every pipeline stage.

use std::io;
use thiserror::Error;

use crate::state::StateError;
use crate::utils::parallel::PoolError;

/// Errors raised while processing a single file. All variants except `State`
/// are caught at file granularity and recorded in the workflow state; they
/// never abort the batch.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("conversion failed: {0}")]
    Conversion(String),

    #[error("malformed record: {0}")]
    Format(String),

    #[error("no sequences found")]
    EmptyInput,

    #[error("external formatter failed: {0}")]
    ExternalTool(String),

    #[error("report error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Pool(#[from] PoolError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let e = PipelineError::ExternalTool("seqkit exited with status 2".into());
        assert_eq!(
            e.to_string(),
            "external formatter failed: seqkit exited with status 2"
        );
        assert_eq!(PipelineError::EmptyInput.to_string(), "no sequences found");
    }
}
