//! # random: lorem content with controlled keyword placement
//!
//! [`RandomContentProvider`] wraps the `fake` lorem/internet fakers around a
//! single seedable [`StdRng`], so one seed reproduces a whole document.
//!
//! ## Keyword injection
//! Keywords are spliced into the whitespace-tokenized text one at a time, in
//! order. Each insert sees the array as grown by the previous inserts:
//! - with a distance `D`, one start index `i` is drawn and keywords land at
//!   `i`, `i + D`, `i + 2D`, ...
//! - without a distance, every keyword gets its own uniform index.
//!
//! Newlines are swapped for a sentinel token before splitting so a keyword
//! never ends up glued to a raw newline.

use std::path::MAIN_SEPARATOR_STR;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use fake::faker::internet::en::{DomainSuffix, SafeEmail};
use fake::faker::lorem::en::{Paragraphs, Word, Words};
use fake::Fake;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::FixtureError;

const NEWLINE_SENTINEL: &str = "$NEWLINE$";
const DEFAULT_PARAGRAPHS: usize = 3;
const ONE_YEAR_DAYS: i64 = 365;

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// Shared content fields accepted by every block.
///
/// `content` replaces generated text verbatim; `amount` is the paragraph
/// count for paragraph-based blocks and the word count for sentences.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentRequest {
    pub amount: Option<usize>,
    pub content: Option<String>,
    pub keywords: Vec<String>,
    #[serde(alias = "kwDistance")]
    pub kw_distance: Option<usize>,
}

impl ContentRequest {
    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_distance(mut self, distance: usize) -> Self {
        self.kw_distance = Some(distance);
        self
    }

    pub fn with_amount(mut self, amount: usize) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// A zero distance means the same as no distance.
    fn distance(&self) -> Option<usize> {
        self.kw_distance.filter(|d| *d > 0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilenameOptions {
    pub length: usize,
    pub keywords: Vec<String>,
    pub kw_distance: Option<usize>,
    pub ext: String,
}

impl Default for FilenameOptions {
    fn default() -> Self {
        Self {
            length: 3,
            keywords: Vec::new(),
            kw_distance: None,
            ext: "txt".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirPathOptions {
    pub min_depth: usize,
    pub max_depth: usize,
    pub posix: bool,
}

impl Default for DirPathOptions {
    fn default() -> Self {
        Self {
            min_depth: 0,
            max_depth: 5,
            posix: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateOptions {
    /// Draw a date outside the window instead of inside it.
    pub reverse: bool,
    /// Return epoch seconds instead of a date-time.
    pub epoch: bool,
}

impl Default for DateOptions {
    fn default() -> Self {
        Self {
            reverse: false,
            epoch: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratedDate {
    Epoch(i64),
    DateTime(DateTime<Utc>),
}

impl GeneratedDate {
    fn new(value: DateTime<Utc>, epoch: bool) -> Self {
        if epoch {
            GeneratedDate::Epoch(value.timestamp())
        } else {
            GeneratedDate::DateTime(value)
        }
    }

    pub fn timestamp(&self) -> i64 {
        match self {
            GeneratedDate::Epoch(secs) => *secs,
            GeneratedDate::DateTime(value) => value.timestamp(),
        }
    }
}

pub struct RandomContentProvider {
    rng: StdRng,
}

impl Default for RandomContentProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomContentProvider {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        debug!(seed, "Seeded content provider");
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// `amount` paragraphs separated by `\n` (or the supplied content), with
    /// keywords injected.
    pub fn paragraphs(&mut self, request: &ContentRequest) -> Result<String, FixtureError> {
        let content = match &request.content {
            Some(content) => content.clone(),
            None => {
                let amount = request.amount.unwrap_or(DEFAULT_PARAGRAPHS);
                let paragraphs: Vec<String> =
                    Paragraphs(amount..amount + 1).fake_with_rng(&mut self.rng);
                // `fake` puts each sentence of a paragraph on its own line.
                paragraphs
                    .iter()
                    .map(|paragraph| paragraph.replace('\n', " "))
                    .collect::<Vec<_>>()
                    .join("\n")
            }
        };
        self.inject(&content, request, true)
    }

    /// One sentence of `amount` words (3 to 10 when unset), with keywords
    /// injected.
    pub fn sentence(&mut self, request: &ContentRequest) -> Result<String, FixtureError> {
        let content = match &request.content {
            Some(content) => content.clone(),
            None => self.lorem_sentence(request.amount),
        };
        self.inject(&content, request, false)
    }

    /// Fails with [`FixtureError::GenerationBounds`] when the keyword stride
    /// cannot be represented.
    pub fn filename(&mut self, options: &FilenameOptions) -> Result<String, FixtureError> {
        let keywords = &options.keywords;
        let stride = match options.kw_distance.filter(|d| *d > 0) {
            Some(distance) if !keywords.is_empty() => {
                Some((distance, keyword_span(keywords.len(), distance)?))
            }
            _ => None,
        };
        let mut words = self.words(options.length);

        if !keywords.is_empty() {
            match stride {
                None => {
                    words.extend(keywords.iter().cloned());
                    words.shuffle(&mut self.rng);
                }
                Some((distance, span)) => {
                    let filler = self.words(span);
                    words.extend(filler);
                    for (i, keyword) in keywords.iter().enumerate() {
                        words.insert(i * distance, keyword.clone());
                    }
                }
            }
        }

        Ok(format!("{}.{}", words.join("-"), options.ext))
    }

    pub fn word(&mut self, count: usize, sep: &str) -> String {
        self.words(count).join(sep)
    }

    pub fn slug(&mut self, count: usize) -> String {
        self.word(count, "-")
    }

    pub fn dir_path(&mut self, options: &DirPathOptions) -> String {
        let (low, high) = if options.min_depth <= options.max_depth {
            (options.min_depth, options.max_depth)
        } else {
            (options.max_depth, options.min_depth)
        };
        let depth = self.rng.gen_range(low..=high);
        if depth == 0 {
            return ".".to_string();
        }

        let segments: Vec<String> = (0..depth).map(|_| self.slug(3)).collect();
        let sep = if options.posix { "/" } else { MAIN_SEPARATOR_STR };
        segments.join(sep)
    }

    /// A date inside the last `days` days, or with `reverse` a date at least
    /// `days + 1` days back.
    pub fn date_within(&mut self, days: u32, options: DateOptions) -> GeneratedDate {
        let now = Utc::now();
        let value = if options.reverse {
            let reference = now - TimeDelta::days(i64::from(days) + 1);
            self.between(reference - TimeDelta::days(ONE_YEAR_DAYS), reference)
        } else {
            self.between(now - TimeDelta::days(i64::from(days)), now)
        };
        GeneratedDate::new(value, options.epoch)
    }

    /// A date between `start` and the day before `end` (both `DD/MM/YYYY`,
    /// midnight UTC); with `reverse`, a date up to a year outside that window.
    pub fn date_between(
        &mut self,
        start: &str,
        end: &str,
        options: DateOptions,
    ) -> Result<GeneratedDate, FixtureError> {
        let start = parse_day(start)?;
        let end = parse_day(end)? - TimeDelta::days(1);
        let year = TimeDelta::days(ONE_YEAR_DAYS);
        let second = TimeDelta::seconds(1);

        let value = if options.reverse {
            if self.rng.gen_bool(0.5) {
                self.between(start - year, start - second)
            } else {
                self.between(end + second, end + year)
            }
        } else {
            self.between(start, end)
        };
        Ok(GeneratedDate::new(value, options.epoch))
    }

    pub fn url(&mut self) -> String {
        let host: String = Word().fake_with_rng(&mut self.rng);
        let suffix: String = DomainSuffix().fake_with_rng(&mut self.rng);
        let path = self.slug(2);
        format!("https://{host}.{suffix}/{path}")
    }

    pub fn email(&mut self) -> String {
        SafeEmail().fake_with_rng(&mut self.rng)
    }

    fn words(&mut self, count: usize) -> Vec<String> {
        Words(count..count + 1).fake_with_rng(&mut self.rng)
    }

    fn lorem_sentence(&mut self, word_count: Option<usize>) -> String {
        let count = word_count.unwrap_or_else(|| self.rng.gen_range(3..=10));
        let sentence = self.words(count).join(" ");
        let mut chars = sentence.chars();
        match chars.next() {
            Some(first) => format!("{}{}.", first.to_uppercase(), chars.as_str()),
            None => String::new(),
        }
    }

    fn between(&mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> DateTime<Utc> {
        let (low, high) = (from.timestamp(), to.timestamp());
        if low >= high {
            return from;
        }
        let secs = self.rng.gen_range(low..=high);
        DateTime::from_timestamp(secs, 0).unwrap_or(from)
    }

    fn inject(
        &mut self,
        text: &str,
        request: &ContentRequest,
        protect_newlines: bool,
    ) -> Result<String, FixtureError> {
        let keywords = &request.keywords;
        if keywords.is_empty() {
            return Ok(text.to_string());
        }

        let protected = if protect_newlines {
            text.replace('\n', &format!("{NEWLINE_SENTINEL} "))
        } else {
            text.to_string()
        };
        let mut tokens: Vec<String> = WHITESPACE.split(&protected).map(str::to_owned).collect();

        match request.distance() {
            Some(distance) => {
                let span = keyword_span(keywords.len(), distance)?;
                if span >= tokens.len() {
                    warn!(
                        keywords = keywords.len(),
                        distance,
                        tokens = tokens.len(),
                        "Keyword span does not fit in content"
                    );
                    return Err(FixtureError::GenerationBounds {
                        required: span.saturating_add(1),
                        available: tokens.len(),
                    });
                }
                let mut index = self.rng.gen_range(0..=tokens.len() - span - 1);
                for keyword in keywords {
                    tokens.insert(index, keyword.clone());
                    index += distance;
                }
            }
            None => {
                for keyword in keywords {
                    let index = if tokens.is_empty() {
                        0
                    } else {
                        self.rng.gen_range(0..tokens.len())
                    };
                    tokens.insert(index, keyword.clone());
                }
            }
        }

        let joined = tokens.join(" ");
        Ok(if protect_newlines {
            joined.replace(NEWLINE_SENTINEL, "\n")
        } else {
            joined
        })
    }
}

/// Token distance from the first to the last of `count` keywords.
fn keyword_span(count: usize, distance: usize) -> Result<usize, FixtureError> {
    count
        .saturating_sub(1)
        .checked_mul(distance)
        .filter(|span| *span < usize::MAX)
        .ok_or_else(|| {
            warn!(keywords = count, distance, "Keyword span overflows");
            FixtureError::GenerationBounds {
                required: usize::MAX,
                available: 0,
            }
        })
}

fn parse_day(input: &str) -> Result<DateTime<Utc>, FixtureError> {
    NaiveDate::parse_from_str(input.trim(), "%d/%m/%Y")
        .ok()
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
        .ok_or_else(|| FixtureError::InvalidDate {
            input: input.to_string(),
        })
}
