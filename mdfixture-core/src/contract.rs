//! # contract: seams between the export pipeline and the outside world
//!
//! The pipeline never spawns a converter or drives a browser directly. It goes
//! through the two traits below so that production code plugs in the pandoc
//! and headless Chrome implementations from [`crate::export`], while tests
//! plug in `mockall` doubles.
//!
//! ## Mocking & Testing
//! - Both traits carry `automock`; the generated `MockDocumentConverter` and
//!   `MockPageRenderer` are exported under the default `test-export-mocks`
//!   feature so integration tests in other crates can use them.
//! - Mocks are expected to create the output file themselves when a test
//!   relies on the pipeline re-reading it.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

use crate::error::FixtureError;

/// Everything one converter invocation needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionJob {
    /// Intermediate markdown file to read.
    pub input: PathBuf,
    /// Final artifact; its extension selects the output format.
    pub output: PathBuf,
    /// Caller supplied arguments, passed through untouched.
    pub extra_args: Vec<String>,
    /// File injected into the document header (PDF no-hyphenation control).
    pub include_in_header: Option<PathBuf>,
}

/// Result of every export: the persisted path and the bytes re-read from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    pub path: PathBuf,
    pub bytes: Vec<u8>,
}

/// Turns a markdown file into another document format.
/// Implementations report a non-zero exit as [`FixtureError::ConversionProcess`].
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait DocumentConverter: Send + Sync {
    async fn convert(&self, job: &ConversionJob) -> Result<(), FixtureError>;
}

/// Opens a local HTML page headlessly and writes a full-page PNG screenshot.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait PageRenderer: Send + Sync {
    async fn screenshot(&self, page: &Path, destination: &Path) -> Result<(), FixtureError>;
}
