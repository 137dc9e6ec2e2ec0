use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info};

/// Settings for the external collaborators used by the export pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Converter executable, resolved through `PATH` when not absolute.
    pub converter: PathBuf,
    /// Chrome/Chromium binary; autodetected when unset.
    pub browser: Option<PathBuf>,
    /// Directory holding the shared no-hyphenation control file.
    pub scratch_dir: PathBuf,
    /// Page margin passed to the converter on every side.
    pub margin: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            converter: PathBuf::from("pandoc"),
            browser: None,
            scratch_dir: std::env::temp_dir(),
            margin: "10pt".to_string(),
        }
    }
}

impl ExportConfig {
    pub fn trace_loaded(&self) {
        info!(
            converter = %self.converter.display(),
            browser = ?self.browser,
            scratch_dir = %self.scratch_dir.display(),
            margin = %self.margin,
            "Loaded ExportConfig"
        );
        debug!(?self, "ExportConfig loaded (full debug)");
    }
}
