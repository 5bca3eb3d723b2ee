//! HTML extraction and the per-document artifact model
//!
//! The scanner in [`parser`] turns raw HTML into an [`HtmlInfo`]: body words,
//! title words, outbound links with their anchor text, and an optional base
//! URL. [`HtmlInfo`] also defines the on-disk artifact format that downstream
//! indexing consumes.

mod parser;
mod tag;

pub use parser::HtmlParser;
pub use tag::{action_for, TagAction, TagInfo, TagKind};

use std::io::{self, Write};
use std::num::ParseIntError;

use thiserror::Error;

use crate::net::{Url, UrlError};

/// Errors raised while scanning HTML
#[derive(Debug, Error)]
pub enum HtmlError {
    #[error("malformed HTML: {0}")]
    Format(&'static str),
}

/// Errors raised while reading an artifact file body
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("malformed artifact: {0}")]
    Format(&'static str),
    #[error("malformed count: {0}")]
    Count(#[from] ParseIntError),
    #[error(transparent)]
    Url(#[from] UrlError),
}

/// An outbound link and the anchor text observed inside its element
#[derive(Debug, Clone)]
pub struct LinkInfo {
    pub url: Url,
    pub anchor_words: Vec<String>,
}

impl LinkInfo {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            anchor_words: Vec::new(),
        }
    }
}

/// Parsed document content
#[derive(Debug, Clone, Default)]
pub struct HtmlInfo {
    /// Body tokens in document order, lowercased
    pub words: Vec<String>,
    /// Tokens scoped to the `<title>` element
    pub title_words: Vec<String>,
    /// Outbound links in document order
    pub links: Vec<LinkInfo>,
    /// First valid `<base href>`, recorded but not applied
    pub base: Option<Url>,
}

impl HtmlInfo {
    /// Write the artifact body:
    ///
    /// ```text
    /// <wordCount> <w1> ... <wN>
    /// <titleWordCount> <t1> ... <tM>
    /// <linkCount>
    /// <link url>
    /// <anchorCount> <a1> ... <aK>
    /// ...
    /// <true|false>[ <base url>]
    /// ```
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        write!(writer, "{}", self.words.len())?;
        for word in &self.words {
            write!(writer, " {word}")?;
        }
        writeln!(writer)?;

        write!(writer, "{}", self.title_words.len())?;
        for word in &self.title_words {
            write!(writer, " {word}")?;
        }
        writeln!(writer)?;

        writeln!(writer, "{}", self.links.len())?;
        for link in &self.links {
            writeln!(writer, "{}", link.url)?;
            write!(writer, "{}", link.anchor_words.len())?;
            for word in &link.anchor_words {
                write!(writer, " {word}")?;
            }
            writeln!(writer)?;
        }

        match &self.base {
            Some(base) => writeln!(writer, "true {base}"),
            None => writeln!(writer, "false"),
        }
    }

    /// Parse an artifact body produced by [`write_to`](Self::write_to).
    ///
    /// Tokens never contain whitespace, so the body reads back as a plain
    /// whitespace-separated token stream.
    pub fn read_from(input: &str) -> Result<Self, ArtifactError> {
        let mut tokens = input.split_whitespace();
        let mut next = |what| tokens.next().ok_or(ArtifactError::Format(what));

        let num_words: usize = next("word count")?.parse()?;
        let mut words = Vec::with_capacity(num_words);
        for _ in 0..num_words {
            words.push(next("word")?.to_string());
        }

        let num_title_words: usize = next("title word count")?.parse()?;
        let mut title_words = Vec::with_capacity(num_title_words);
        for _ in 0..num_title_words {
            title_words.push(next("title word")?.to_string());
        }

        let num_links: usize = next("link count")?.parse()?;
        let mut links = Vec::with_capacity(num_links);
        for _ in 0..num_links {
            let url = Url::parse(next("link url")?)?;
            let num_anchor_words: usize = next("anchor word count")?.parse()?;
            let mut anchor_words = Vec::with_capacity(num_anchor_words);
            for _ in 0..num_anchor_words {
                anchor_words.push(next("anchor word")?.to_string());
            }
            links.push(LinkInfo { url, anchor_words });
        }

        let base = match next("base flag")? {
            "true" => Some(Url::parse(next("base url")?)?),
            "false" => None,
            _ => return Err(ArtifactError::Format("invalid base flag")),
        };

        Ok(Self {
            words,
            title_words,
            links,
            base,
        })
    }
}
