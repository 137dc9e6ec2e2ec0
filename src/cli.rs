use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mdfixture_core::compose::DocumentComposer;
use mdfixture_core::export::ExportPipeline;
use mdfixture_core::random::RandomContentProvider;
use mdfixture_core::synthesise::synthesise;
use std::path::PathBuf;

use crate::load_config::{load_blocks, load_config, seed_from_env};

/// CLI for mdfixture: generate synthetic documents for search/OCR fixtures.
#[derive(Parser)]
#[clap(
    name = "mdfixture",
    version,
    about = "Generate markdown fixture documents and export them as markdown, PDF, images or email"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate and export every document listed in the given config file
    Generate {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
        /// Seed for reproducible content, overrides config and environment
        #[clap(long)]
        seed: Option<u64>,
    },
    /// Compose a single document from a YAML list of blocks and print it
    Compose {
        /// Path to the YAML block list
        #[clap(long)]
        blocks: PathBuf,
        /// Seed for reproducible content
        #[clap(long)]
        seed: Option<u64>,
    },
}

fn provider(seed: Option<u64>) -> RandomContentProvider {
    match seed {
        Some(seed) => RandomContentProvider::with_seed(seed),
        None => RandomContentProvider::new(),
    }
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Generate { config, seed } => {
            let config = load_config(config)?;
            let mut composer = DocumentComposer::new(provider(seed.or(config.seed)));
            let pipeline = ExportPipeline::from_config(config.export.clone());

            println!("Generate starting...");
            let report = synthesise(&config.documents, &mut composer, &pipeline)
                .await
                .context("Generation failed")?;
            println!("Generate complete.\nReport:");
            for document in &report.documents {
                println!(
                    "  {} ({}, {} bytes)",
                    document.path.display(),
                    document.target,
                    document.bytes_written
                );
            }
            Ok(())
        }
        Commands::Compose { blocks, seed } => {
            let blocks = load_blocks(blocks)?;
            let seed = match seed {
                Some(seed) => Some(seed),
                None => seed_from_env()?,
            };
            let mut composer = DocumentComposer::new(provider(seed));
            let document = composer.generate(&blocks)?;
            print!("{document}");
            Ok(())
        }
    }
}
