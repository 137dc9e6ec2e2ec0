//! Batch pipeline: compose → export for every configured document.
//!
//! This is what the CLI runs. Each [`DocumentJob`] is composed from its block
//! requests and exported to its target (explicit, or inferred from the output
//! extension). Jobs run in order and the run is fail-fast: the first error is
//! returned unchanged and later jobs are not attempted.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::blocks::BlockRequest;
use crate::compose::DocumentComposer;
use crate::contract::{DocumentConverter, PageRenderer};
use crate::error::FixtureError;
use crate::export::{ExportPipeline, ExportTarget};

/// One document to generate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentJob {
    pub output: PathBuf,
    #[serde(default)]
    pub target: Option<ExportTarget>,
    #[serde(default)]
    pub blocks: Vec<BlockRequest>,
}

impl DocumentJob {
    pub fn resolved_target(&self) -> ExportTarget {
        self.target
            .clone()
            .unwrap_or_else(|| ExportTarget::infer(&self.output))
    }
}

#[derive(Debug)]
pub struct SynthesiseReport {
    pub documents: Vec<DocumentReport>,
}

#[derive(Debug)]
pub struct DocumentReport {
    pub path: PathBuf,
    pub target: &'static str,
    pub bytes_written: usize,
}

pub async fn synthesise<C, R>(
    jobs: &[DocumentJob],
    composer: &mut DocumentComposer,
    pipeline: &ExportPipeline<C, R>,
) -> Result<SynthesiseReport, FixtureError>
where
    C: DocumentConverter,
    R: PageRenderer,
{
    info!(jobs = jobs.len(), "Starting document synthesis");
    let mut documents = Vec::with_capacity(jobs.len());

    for job in jobs {
        let target = job.resolved_target();
        info!(output = %job.output.display(), target = target.kind(), "Composing document");

        let content = composer.generate(&job.blocks).inspect_err(|e| {
            error!(output = %job.output.display(), error = %e, "Composition failed");
        })?;
        let exported = pipeline
            .export(&job.output, &content, &target, composer.provider_mut())
            .await
            .inspect_err(|e| {
                error!(output = %job.output.display(), error = %e, "Export failed");
            })?;

        documents.push(DocumentReport {
            path: exported.path,
            target: target.kind(),
            bytes_written: exported.bytes.len(),
        });
    }

    info!(documents = documents.len(), "Document synthesis complete");
    Ok(SynthesiseReport { documents })
}
