//! Markdown block rendering.
//!
//! Every block is rendered from [`RandomContentProvider`] output, escaped so
//! the generated prose cannot be read as markdown syntax, and terminated by
//! exactly one newline.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::FixtureError;
use crate::random::{ContentRequest, RandomContentProvider};

/// 1x1 transparent PNG used when an image block has no `src`.
pub const DEFAULT_IMAGE: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

const TABLE_RULE: &str = "-----";

/// Untyped block request as it appears in configuration: a `block` kind and
/// the remaining fields as options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockRequest {
    pub block: String,
    #[serde(flatten)]
    pub options: Map<String, Value>,
}

impl BlockRequest {
    pub fn new(block: impl Into<String>) -> Self {
        Self {
            block: block.into(),
            options: Map::new(),
        }
    }

    pub fn option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeaderOptions {
    pub level: usize,
    #[serde(flatten)]
    pub text: ContentRequest,
}

impl Default for HeaderOptions {
    fn default() -> Self {
        Self {
            level: 1,
            text: ContentRequest::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListOptions {
    pub ordered: bool,
    #[serde(flatten)]
    pub text: ContentRequest,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageOptions {
    pub src: String,
    #[serde(flatten)]
    pub text: ContentRequest,
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self {
            src: DEFAULT_IMAGE.to_string(),
            text: ContentRequest::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableOptions {
    pub rows: usize,
    pub cols: usize,
    #[serde(flatten)]
    pub text: ContentRequest,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            rows: 2,
            cols: 3,
            text: ContentRequest::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BlockSpec {
    Header(HeaderOptions),
    Paragraphs(ContentRequest),
    List(ListOptions),
    CodeBlock(ContentRequest),
    Quote(ContentRequest),
    Link(ContentRequest),
    Image(ImageOptions),
    Table(TableOptions),
}

impl BlockSpec {
    /// Resolves a request by kind, case-insensitively. `Ok(None)` means the
    /// kind is not one we render.
    pub fn from_request(request: &BlockRequest) -> Result<Option<Self>, FixtureError> {
        let kind = request.block.as_str();
        let spec = match kind.to_ascii_lowercase().as_str() {
            "header" => BlockSpec::Header(parse_options(request)?),
            "paragraphs" => BlockSpec::Paragraphs(parse_options(request)?),
            "list" => BlockSpec::List(parse_options(request)?),
            "codeblock" => BlockSpec::CodeBlock(parse_options(request)?),
            "quote" => BlockSpec::Quote(parse_options(request)?),
            "link" => BlockSpec::Link(parse_options(request)?),
            "image" => BlockSpec::Image(parse_options(request)?),
            "table" => BlockSpec::Table(parse_options(request)?),
            _ => return Ok(None),
        };
        Ok(Some(spec))
    }
}

fn parse_options<T: DeserializeOwned>(request: &BlockRequest) -> Result<T, FixtureError> {
    serde_json::from_value(Value::Object(request.options.clone())).map_err(|e| {
        FixtureError::InvalidBlock {
            kind: request.block.clone(),
            reason: e.to_string(),
        }
    })
}

/// Escapes generated text so it renders literally.
pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' | '`' | '*' | '_' | '#' | '/' | '(' | ')' | '[' | ']' => {
                escaped.push('\\');
                escaped.push(c);
            }
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

pub struct DocumentBlockBuilder {
    provider: RandomContentProvider,
}

impl DocumentBlockBuilder {
    pub fn new(provider: RandomContentProvider) -> Self {
        Self { provider }
    }

    pub fn provider_mut(&mut self) -> &mut RandomContentProvider {
        &mut self.provider
    }

    pub fn render(&mut self, spec: &BlockSpec) -> Result<String, FixtureError> {
        match spec {
            BlockSpec::Header(options) => self.header(options),
            BlockSpec::Paragraphs(request) => self.paragraphs(request),
            BlockSpec::List(options) => self.list(options),
            BlockSpec::CodeBlock(request) => self.code_block(request),
            BlockSpec::Quote(request) => self.quote(request),
            BlockSpec::Link(request) => self.link(request),
            BlockSpec::Image(options) => self.image(options),
            BlockSpec::Table(options) => self.table(options),
        }
    }

    /// Levels outside 1..=6 are clamped so the header stays valid markdown.
    pub fn header(&mut self, options: &HeaderOptions) -> Result<String, FixtureError> {
        let hashes = "#".repeat(options.level.clamp(1, 6));
        let text = escape_markdown(&self.provider.sentence(&options.text)?);
        Ok(format!("{hashes} {text}\n"))
    }

    pub fn paragraphs(&mut self, request: &ContentRequest) -> Result<String, FixtureError> {
        let text = escape_markdown(&self.provider.paragraphs(request)?);
        Ok(format!("{text}\n"))
    }

    pub fn list(&mut self, options: &ListOptions) -> Result<String, FixtureError> {
        let text = escape_markdown(&self.provider.paragraphs(&options.text)?);
        let items: Vec<String> = text
            .split('\n')
            .enumerate()
            .map(|(idx, line)| {
                let mark = if options.ordered {
                    format!("{}.", idx + 1)
                } else {
                    "-".to_string()
                };
                format!("{mark} {}", line.trim())
            })
            .collect();
        Ok(format!("{}\n", items.join("\n")))
    }

    pub fn code_block(&mut self, request: &ContentRequest) -> Result<String, FixtureError> {
        let text = escape_markdown(&self.provider.paragraphs(request)?);
        Ok(format!("```text\n{text}\n```\n"))
    }

    pub fn quote(&mut self, request: &ContentRequest) -> Result<String, FixtureError> {
        let text = escape_markdown(&self.provider.paragraphs(request)?);
        let lines: Vec<String> = text
            .split('\n')
            .map(|line| format!("> {}", line.trim()))
            .collect();
        Ok(format!("{}\n", lines.join("\n")))
    }

    pub fn link(&mut self, request: &ContentRequest) -> Result<String, FixtureError> {
        let text = escape_markdown(&self.provider.sentence(request)?);
        let url = self.provider.url();
        Ok(format!("[{text}]({url})\n"))
    }

    pub fn image(&mut self, options: &ImageOptions) -> Result<String, FixtureError> {
        let text = escape_markdown(&self.provider.sentence(&options.text)?);
        Ok(format!("![{text}]({})\n", options.src))
    }

    /// All cells come from a single paragraphs call, so each keyword is
    /// placed once in the whole table rather than once per cell.
    pub fn table(&mut self, options: &TableOptions) -> Result<String, FixtureError> {
        let (rows, cols) = (options.rows, options.cols);
        if cols == 0 {
            return Err(FixtureError::InvalidBlock {
                kind: "table".to_string(),
                reason: "a table needs at least one column".to_string(),
            });
        }
        let request = ContentRequest {
            amount: Some((rows + 1) * cols),
            ..options.text.clone()
        };
        let text = escape_markdown(&self.provider.paragraphs(&request)?);
        let cells: Vec<&str> = text.split('\n').map(str::trim).collect();
        let row = |index: usize| -> String {
            let line: Vec<&str> = (index * cols..(index + 1) * cols)
                .map(|i| cells.get(i).copied().unwrap_or(""))
                .collect();
            format!("| {} |", line.join(" | "))
        };

        let mut lines = Vec::with_capacity(rows + 2);
        lines.push(row(0));
        lines.push(format!("| {} |", vec![TABLE_RULE; cols].join(" | ")));
        lines.extend((1..=rows).map(row));
        Ok(format!("{}\n", lines.join("\n")))
    }
}
