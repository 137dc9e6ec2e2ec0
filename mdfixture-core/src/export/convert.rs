use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Instant;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{error, info};

use crate::contract::{ConversionJob, DocumentConverter};
use crate::error::FixtureError;

const MARGIN_SIDES: [&str; 4] = ["left", "right", "top", "bottom"];

/// Runs `pandoc` (or a compatible executable) as a child process.
#[derive(Debug, Clone)]
pub struct PandocConverter {
    program: PathBuf,
    margin: String,
}

impl PandocConverter {
    pub fn new(program: impl Into<PathBuf>, margin: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            margin: margin.into(),
        }
    }

    /// `<input> -f markdown -o <output> <extra args> -V margin-*=<margin> [--include-in-header=<file>]`
    pub fn command_args(&self, job: &ConversionJob) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            job.input.clone().into_os_string(),
            "-f".into(),
            "markdown".into(),
            "-o".into(),
            job.output.clone().into_os_string(),
        ];
        args.extend(job.extra_args.iter().map(OsString::from));
        for side in MARGIN_SIDES {
            args.push("-V".into());
            args.push(format!("margin-{side}={}", self.margin).into());
        }
        if let Some(header) = &job.include_in_header {
            let mut flag = OsString::from("--include-in-header=");
            flag.push(header);
            args.push(flag);
        }
        args
    }
}

#[async_trait]
impl DocumentConverter for PandocConverter {
    async fn convert(&self, job: &ConversionJob) -> Result<(), FixtureError> {
        let started_at = Instant::now();
        let program = self.program.display().to_string();
        let args = self.command_args(job);
        info!(
            program = %program,
            input = %job.input.display(),
            output = %job.output.display(),
            args = ?args,
            "Converting markdown"
        );

        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| {
                error!(program = %program, error = %source, "Failed to launch converter process");
                FixtureError::ConverterUnavailable {
                    program: program.clone(),
                    source,
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            error!(
                program = %program,
                status = ?output.status,
                stderr = %stderr,
                elapsed_ms = started_at.elapsed().as_millis() as u64,
                "Converter exited with non-zero code"
            );
            return Err(FixtureError::ConversionProcess {
                program,
                exit_code: output.status.code(),
                stderr,
            });
        }

        info!(
            output = %job.output.display(),
            elapsed_ms = started_at.elapsed().as_millis() as u64,
            "Converter finished"
        );
        Ok(())
    }
}
