use anyhow::{Context, Result};
use mdfixture_core::blocks::BlockRequest;
use mdfixture_core::config::ExportConfig;
use mdfixture_core::synthesise::DocumentJob;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

pub const SEED_ENV: &str = "MDFIXTURE_SEED";
pub const CONVERTER_ENV: &str = "MDFIXTURE_CONVERTER";

#[derive(Deserialize)]
struct StaticConfig {
    #[serde(default)]
    seed: Option<u64>,
    #[serde(default)]
    export: ExportConfig,
    #[serde(default)]
    documents: Vec<DocumentJob>,
}

/// Fully merged configuration: YAML file plus environment overrides.
#[derive(Debug)]
pub struct FixtureConfig {
    pub seed: Option<u64>,
    pub export: ExportConfig,
    pub documents: Vec<DocumentJob>,
}

/// Loads a YAML config file and applies `MDFIXTURE_SEED` and
/// `MDFIXTURE_CONVERTER` when they are set.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<FixtureConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let content = read(path_ref)?;
    let static_conf: StaticConfig = serde_yaml::from_str(&content).map_err(|e| {
        error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
        anyhow::anyhow!("Failed to parse config YAML {:?}: {e}", path_ref)
    })?;

    let mut export = static_conf.export;
    if let Ok(converter) = std::env::var(CONVERTER_ENV) {
        info!(converter = %converter, "Converter overridden from environment");
        export.converter = PathBuf::from(converter);
    }

    let seed = match seed_from_env()? {
        Some(seed) => Some(seed),
        None => static_conf.seed,
    };

    export.trace_loaded();
    info!(
        seed = ?seed,
        documents = static_conf.documents.len(),
        "Config loaded and merged successfully"
    );

    Ok(FixtureConfig {
        seed,
        export,
        documents: static_conf.documents,
    })
}

/// Loads a YAML sequence of block requests.
pub fn load_blocks<P: AsRef<Path>>(path: P) -> Result<Vec<BlockRequest>> {
    let path_ref = path.as_ref();
    let content = read(path_ref)?;
    let blocks: Vec<BlockRequest> = serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse block list {:?}", path_ref))?;
    info!(blocks = blocks.len(), path = ?path_ref, "Loaded block requests");
    Ok(blocks)
}

/// `MDFIXTURE_SEED`, if set. A value that is not a u64 is an error.
pub fn seed_from_env() -> Result<Option<u64>> {
    match std::env::var(SEED_ENV) {
        Ok(raw) => match raw.trim().parse::<u64>() {
            Ok(seed) => Ok(Some(seed)),
            Err(e) => {
                error!(error = ?e, raw = %raw, "MDFIXTURE_SEED must be an unsigned integer");
                Err(anyhow::anyhow!("{SEED_ENV} must be an unsigned integer: {e}"))
            }
        },
        Err(_) => Ok(None),
    }
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| {
        error!(error = ?e, path = ?path, "Failed to read file");
        anyhow::anyhow!("Failed to read {:?}: {}", path, e)
    })
}
