//! # export: persist a markdown document as its final artifact
//!
//! Every operation is one linear sequence:
//! write markdown → (markdown target: done) | (convert or render → delete
//! intermediates → done).
//!
//! Intermediates (`.md`, `.html`, `.css`) are created next to the destination
//! under random names and belong to the call that created them. They are
//! removed on success. When the converter fails, the intermediate markdown is
//! left on disk and the error is returned as is.
//!
//! The returned bytes are always re-read from the destination file.

pub mod convert;
pub mod mail;
pub mod render;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::ExportConfig;
use crate::contract::{ConversionJob, DocumentConverter, ExportedFile, PageRenderer};
use crate::error::FixtureError;
use crate::random::RandomContentProvider;

pub use convert::PandocConverter;
pub use mail::{CaptureTransport, EmailFields, MailAttachment};
pub use render::ChromeRenderer;

/// Stylesheet applied to pages rendered for screenshots. Monospace keeps OCR
/// of the resulting images predictable.
pub const PAGE_STYLESHEET: &str = "html {\n  font-family: \"DejaVu Sans Mono\", \"Courier New\", monospace;\n}\n";

/// LaTeX header that disables hyphenation in PDF output.
pub const NO_HYPHENATION: &str = "\\exhyphenpenalty=10000 \\hyphenpenalty=10000";

const NO_HYPHENATION_FILE: &str = "nohyphenation";

/// Where and how a composed document ends up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ExportTarget {
    Markdown,
    /// Converted by the external converter, format chosen by extension.
    File {
        #[serde(default)]
        args: Vec<String>,
    },
    Image,
    Email(EmailFields),
}

impl ExportTarget {
    /// Target implied by the destination's extension.
    pub fn infer(destination: &Path) -> Self {
        match extension(destination).as_deref() {
            Some("md") | Some("markdown") => ExportTarget::Markdown,
            Some("eml") => ExportTarget::Email(EmailFields::default()),
            Some("png") | Some("jpg") | Some("jpeg") => ExportTarget::Image,
            _ => ExportTarget::File { args: Vec::new() },
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ExportTarget::Markdown => "markdown",
            ExportTarget::File { .. } => "file",
            ExportTarget::Image => "image",
            ExportTarget::Email(_) => "email",
        }
    }
}

pub struct ExportPipeline<C, R> {
    converter: C,
    renderer: R,
    config: ExportConfig,
}

impl ExportPipeline<PandocConverter, ChromeRenderer> {
    pub fn from_config(config: ExportConfig) -> Self {
        let converter = PandocConverter::new(config.converter.clone(), config.margin.clone());
        let renderer = ChromeRenderer::new(config.browser.clone());
        Self::new(converter, renderer, config)
    }
}

impl<C, R> ExportPipeline<C, R>
where
    C: DocumentConverter,
    R: PageRenderer,
{
    pub fn new(converter: C, renderer: R, config: ExportConfig) -> Self {
        Self {
            converter,
            renderer,
            config,
        }
    }

    /// `provider` fills in synthetic email headers; other targets leave it
    /// untouched.
    pub async fn export(
        &self,
        destination: &Path,
        content: &str,
        target: &ExportTarget,
        provider: &mut RandomContentProvider,
    ) -> Result<ExportedFile, FixtureError> {
        match target {
            ExportTarget::Markdown => self.save_markdown(destination, content).await,
            ExportTarget::File { args } => self.save_file(destination, content, args).await,
            ExportTarget::Image => self.save_image(destination, content).await,
            ExportTarget::Email(fields) => {
                self.save_email(destination, content, fields, provider)
                    .await
            }
        }
    }

    /// Writes `content` verbatim, whatever the extension of `destination`.
    pub async fn save_markdown(
        &self,
        destination: &Path,
        content: &str,
    ) -> Result<ExportedFile, FixtureError> {
        create_dir(&parent_dir(destination)).await?;
        write(destination, content.as_bytes()).await?;
        finish(destination).await
    }

    /// Writes `content` as markdown, converting it when `destination` is not a
    /// markdown file.
    pub async fn save_file(
        &self,
        destination: &Path,
        content: &str,
        converter_args: &[String],
    ) -> Result<ExportedFile, FixtureError> {
        if is_markdown(destination) {
            return self.save_markdown(destination, content).await;
        }

        let dir = parent_dir(destination);
        create_dir(&dir).await?;

        let markdown = intermediate(&dir, "md");
        write(&markdown, content.as_bytes()).await?;
        debug!(intermediate = %markdown.display(), "Wrote intermediate markdown");

        let include_in_header = if extension(destination).as_deref() == Some("pdf") {
            Some(self.write_no_hyphenation().await?)
        } else {
            None
        };
        let job = ConversionJob {
            input: markdown.clone(),
            output: destination.to_path_buf(),
            extra_args: converter_args.to_vec(),
            include_in_header,
        };

        if let Err(e) = self.converter.convert(&job).await {
            warn!(
                intermediate = %markdown.display(),
                error = %e,
                "Conversion failed, intermediate markdown left in place"
            );
            return Err(e);
        }

        remove(&markdown).await?;
        finish(destination).await
    }

    /// Renders `content` to a standalone HTML page and screenshots it.
    pub async fn save_image(
        &self,
        destination: &Path,
        content: &str,
    ) -> Result<ExportedFile, FixtureError> {
        let dir = parent_dir(destination);
        create_dir(&dir).await?;

        let stylesheet = intermediate(&dir, "css");
        write(&stylesheet, PAGE_STYLESHEET.as_bytes()).await?;

        let page = intermediate(&dir, "html");
        let args = vec![
            "-s".to_string(),
            "--css".to_string(),
            file_name(&stylesheet),
            "--metadata".to_string(),
            format!("pagetitle={}", file_stem(&page)),
        ];
        self.save_file(&page, content, &args).await?;

        self.renderer.screenshot(&page, destination).await?;

        remove(&page).await?;
        remove(&stylesheet).await?;
        finish(destination).await
    }

    /// Writes `body` as a MIME message with a rendered HTML alternative.
    /// Missing `from`, `to` and `subject` are drawn from `provider`.
    pub async fn save_email(
        &self,
        destination: &Path,
        body: &str,
        fields: &EmailFields,
        provider: &mut RandomContentProvider,
    ) -> Result<ExportedFile, FixtureError> {
        let attachments = mail::normalize_attachments(&fields.attachments)?;

        let dir = parent_dir(destination);
        create_dir(&dir).await?;

        let page = intermediate(&dir, "html");
        let rendered = self.save_file(&page, body, &[]).await?;
        let html = String::from_utf8_lossy(&rendered.bytes);

        let message = mail::compose_message(fields, body, &html, &attachments, provider).await?;
        let raw = mail::capture(&message);

        write(destination, &raw).await?;
        remove(&page).await?;
        finish(destination).await
    }

    async fn write_no_hyphenation(&self) -> Result<PathBuf, FixtureError> {
        create_dir(&self.config.scratch_dir).await?;
        let path = self.config.scratch_dir.join(NO_HYPHENATION_FILE);
        write(&path, NO_HYPHENATION.as_bytes()).await?;
        Ok(path)
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
}

fn is_markdown(path: &Path) -> bool {
    matches!(extension(path).as_deref(), Some("md") | Some("markdown"))
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn intermediate(dir: &Path, ext: &str) -> PathBuf {
    dir.join(format!("{}.{ext}", Uuid::new_v4().simple()))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

async fn create_dir(dir: &Path) -> Result<(), FixtureError> {
    fs::create_dir_all(dir).await.map_err(FixtureError::io(dir))
}

async fn write(path: &Path, bytes: &[u8]) -> Result<(), FixtureError> {
    fs::write(path, bytes).await.map_err(FixtureError::io(path))
}

async fn remove(path: &Path) -> Result<(), FixtureError> {
    fs::remove_file(path).await.map_err(FixtureError::io(path))?;
    debug!(path = %path.display(), "Removed intermediate file");
    Ok(())
}

async fn finish(destination: &Path) -> Result<ExportedFile, FixtureError> {
    let bytes = fs::read(destination)
        .await
        .map_err(FixtureError::io(destination))?;
    info!(
        path = %destination.display(),
        bytes = bytes.len(),
        "Export complete"
    );
    Ok(ExportedFile {
        path: destination.to_path_buf(),
        bytes,
    })
}
