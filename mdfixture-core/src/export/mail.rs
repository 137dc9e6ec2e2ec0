use std::convert::Infallible;
use std::path::{Path, PathBuf};

use lettre::address::Envelope;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart};
use lettre::{Message, Transport};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::error::FixtureError;
use crate::random::{ContentRequest, RandomContentProvider};

/// Header fields and attachments for an email export. Missing `from`, `to`
/// and `subject` are filled with synthetic values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailFields {
    pub from: Option<String>,
    pub to: Vec<String>,
    pub cc: Vec<String>,
    pub bcc: Vec<String>,
    pub subject: Option<String>,
    /// Absolute paths of files to attach.
    pub attachments: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailAttachment {
    pub filename: String,
    pub path: PathBuf,
}

/// Serializes messages instead of sending them.
#[derive(Debug, Clone, Copy, Default)]
pub struct CaptureTransport;

impl Transport for CaptureTransport {
    type Ok = Vec<u8>;
    type Error = Infallible;

    fn send_raw(&self, _envelope: &Envelope, email: &[u8]) -> Result<Self::Ok, Self::Error> {
        Ok(email.to_vec())
    }
}

pub fn normalize_attachments(paths: &[PathBuf]) -> Result<Vec<MailAttachment>, FixtureError> {
    paths
        .iter()
        .map(|path| {
            if !path.is_absolute() {
                error!(path = %path.display(), "Attachment path is not absolute");
                return Err(FixtureError::MailCompose(format!(
                    "attachment path must be absolute: {}",
                    path.display()
                )));
            }
            let filename = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .ok_or_else(|| {
                    FixtureError::MailCompose(format!(
                        "attachment path has no file name: {}",
                        path.display()
                    ))
                })?;
            Ok(MailAttachment {
                filename,
                path: path.clone(),
            })
        })
        .collect()
}

/// Builds a `multipart/mixed` message: a plain/html alternative part followed
/// by one part per attachment.
pub async fn compose_message(
    fields: &EmailFields,
    text: &str,
    html: &str,
    attachments: &[MailAttachment],
    provider: &mut RandomContentProvider,
) -> Result<Message, FixtureError> {
    let from = match &fields.from {
        Some(from) => from.clone(),
        None => provider.email(),
    };
    let to = if fields.to.is_empty() {
        vec![provider.email()]
    } else {
        fields.to.clone()
    };
    let subject = match &fields.subject {
        Some(subject) => subject.clone(),
        None => provider.sentence(&ContentRequest::default())?,
    };
    debug!(from = %from, to = ?to, subject = %subject, "Composing email");

    let mut builder = Message::builder().from(mailbox(&from)?).subject(subject);
    for address in &to {
        builder = builder.to(mailbox(address)?);
    }
    for address in &fields.cc {
        builder = builder.cc(mailbox(address)?);
    }
    for address in &fields.bcc {
        builder = builder.bcc(mailbox(address)?);
    }

    let mut body = MultiPart::mixed().multipart(MultiPart::alternative_plain_html(
        text.to_string(),
        html.to_string(),
    ));
    for attachment in attachments {
        let content = tokio::fs::read(&attachment.path).await.map_err(|e| {
            error!(path = %attachment.path.display(), error = %e, "Failed to read attachment");
            FixtureError::MailCompose(format!(
                "cannot read attachment {}: {e}",
                attachment.path.display()
            ))
        })?;
        body = body.singlepart(
            Attachment::new(attachment.filename.clone()).body(content, content_type(&attachment.path)?),
        );
    }

    builder
        .multipart(body)
        .map_err(|e| FixtureError::MailCompose(e.to_string()))
}

/// Raw MIME bytes for `message`; nothing leaves the process.
pub fn capture(message: &Message) -> Vec<u8> {
    match CaptureTransport.send(message) {
        Ok(raw) => raw,
        Err(never) => match never {},
    }
}

fn mailbox(address: &str) -> Result<Mailbox, FixtureError> {
    address.parse().map_err(|e| {
        error!(address = %address, error = %e, "Invalid email address");
        FixtureError::MailCompose(format!("invalid address {address:?}: {e}"))
    })
}

fn content_type(path: &Path) -> Result<ContentType, FixtureError> {
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    ContentType::parse(mime.as_ref())
        .map_err(|e| FixtureError::MailCompose(format!("bad content type {mime}: {e}")))
}
