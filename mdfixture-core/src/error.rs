//! Error taxonomy shared by generation and export.
//!
//! Nothing here is retried: every variant propagates unchanged to the caller
//! of the failing operation.

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FixtureError {
    /// The requested keyword span does not fit in the generated content.
    #[error("keyword span needs {required} tokens but content only has {available}")]
    GenerationBounds { required: usize, available: usize },

    #[error("invalid date {input:?}, expected DD/MM/YYYY")]
    InvalidDate { input: String },

    #[error("invalid options for block {kind:?}: {reason}")]
    InvalidBlock { kind: String, reason: String },

    /// The external converter ran and exited non-zero.
    #[error("converter {program} failed (exit {exit_code:?}): {stderr}")]
    ConversionProcess {
        program: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("converter {program} could not be started: {source}")]
    ConverterUnavailable {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("headless render failed: {0}")]
    Render(String),

    #[error("io error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot compose email: {0}")]
    MailCompose(String),
}

impl FixtureError {
    pub(crate) fn io(path: impl AsRef<Path>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.as_ref().to_path_buf();
        move |source| FixtureError::Io { path, source }
    }
}
