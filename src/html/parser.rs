//! Streaming HTML scanner
//!
//! Single left-to-right pass alternating between text and tag mode. Text is
//! tokenized into lowercased alphanumeric words; tags are classified through
//! the action table in [`super::tag`]. The scanner never builds a DOM: script,
//! style, and svg elements are skipped wholesale, title text is captured, and
//! anchor text accrues on the innermost open `<a>` link.
//!
//! URLs are emitted exactly as written in the document. Relative references
//! stay relative; resolution against the response URL happens at the crawler
//! layer.

use crate::net::Url;

use super::tag::{action_for, TagAction, TagInfo, TagKind};
use super::{HtmlError, HtmlInfo, LinkInfo};

/// Predicate deciding whether a discovered link is worth keeping
pub type LinkFilter = dyn Fn(&Url, &TagInfo) -> bool + Send + Sync;

/// Streaming tag scanner producing [`HtmlInfo`]
pub struct HtmlParser {
    link_filter: Box<LinkFilter>,
}

impl Default for HtmlParser {
    fn default() -> Self {
        Self::new()
    }
}

impl HtmlParser {
    /// A parser keeping every parseable link.
    pub fn new() -> Self {
        Self {
            link_filter: Box::new(|_, _| true),
        }
    }

    /// A parser with a custom link predicate.
    pub fn with_link_filter<F>(link_filter: F) -> Self
    where
        F: Fn(&Url, &TagInfo) -> bool + Send + Sync + 'static,
    {
        Self {
            link_filter: Box::new(link_filter),
        }
    }

    /// Scan a document into words, title words, links, and base URL.
    pub fn parse(&self, html: &str) -> Result<HtmlInfo, HtmlError> {
        let mut info = HtmlInfo::default();
        // Index into info.links of the currently open anchor, if any.
        let mut current_link: Option<usize> = None;

        let mut begin = 0;
        loop {
            // Text run up to the next tag.
            let tag_begin = html[begin..].find('<').map(|i| i + begin);
            let text_end = tag_begin.unwrap_or(html.len());
            for token in tokenize(&html[begin..text_end]) {
                if let Some(index) = current_link {
                    info.links[index].anchor_words.push(token.clone());
                }
                info.words.push(token);
            }

            let Some(tag_begin) = tag_begin else {
                break;
            };
            let tag_end = html[tag_begin..]
                .find('>')
                .map(|i| i + tag_begin + 1)
                .ok_or(HtmlError::Format("a closing angle bracket is missing"))?;
            let mut next = tag_end;

            let tag = TagInfo::parse(&html[tag_begin..tag_end])?;
            let action = action_for(&tag.name);
            match tag.kind {
                TagKind::Opening => match action {
                    TagAction::Anchor => {
                        if let Some(url) = self.filtered_url(&tag, "href") {
                            info.links.push(LinkInfo::new(url));
                            current_link = Some(info.links.len() - 1);
                        }
                    }
                    TagAction::Base => {
                        Self::record_base(&mut info, &tag);
                    }
                    TagAction::Embed => {
                        if let Some(url) = self.filtered_url(&tag, "src") {
                            info.links.push(LinkInfo::new(url));
                        }
                    }
                    TagAction::Title => {
                        let closing = tag.closing_tag();
                        let content_end = html[next..]
                            .find(&closing)
                            .map(|i| i + next)
                            .ok_or(HtmlError::Format("a closing tag is missing"))?;
                        info.title_words.extend(tokenize(&html[next..content_end]));
                        next = content_end + closing.len();
                    }
                    TagAction::DiscardElement => {
                        let closing = tag.closing_tag();
                        let content_end = html[next..]
                            .find(&closing)
                            .map(|i| i + next)
                            .ok_or(HtmlError::Format("a closing tag is missing"))?;
                        next = content_end + closing.len();
                    }
                    TagAction::Discard => {}
                },
                TagKind::Closing => {
                    if action == TagAction::Anchor {
                        current_link = None;
                    }
                }
                TagKind::SelfClosing => {
                    if action == TagAction::Base {
                        Self::record_base(&mut info, &tag);
                    }
                }
            }

            begin = next;
        }

        Ok(info)
    }

    /// Extract, preprocess, parse, and filter a URL attribute. Failures at any
    /// stage drop the link silently.
    fn filtered_url(&self, tag: &TagInfo, attr: &str) -> Option<Url> {
        let raw = preprocess_url(&tag.attr(attr)?)?;
        let url = Url::parse(&raw).ok()?;
        (self.link_filter)(&url, tag).then_some(url)
    }

    fn record_base(info: &mut HtmlInfo, tag: &TagInfo) {
        if info.base.is_some() {
            return;
        }
        if let Some(raw) = tag.attr("href").as_deref().and_then(preprocess_url) {
            if let Ok(url) = Url::parse(&raw) {
                info.base = Some(url);
            }
        }
    }
}

/// Clean a URL attribute value before parsing: reject on any whitespace,
/// reject pure fragment references, truncate at `#`.
fn preprocess_url(raw: &str) -> Option<String> {
    if raw.contains(char::is_whitespace) {
        return None;
    }
    match raw.find('#') {
        Some(0) => None,
        Some(pos) => Some(raw[..pos].to_string()),
        None => Some(raw.to_string()),
    }
}

/// Split on whitespace and normalize each token; empty results are dropped.
fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace().filter_map(clean_token).collect()
}

/// Trim leading and trailing non-alphanumerics, then lowercase.
fn clean_token(token: &str) -> Option<String> {
    let start = token.find(|c: char| c.is_alphanumeric())?;
    let last = token.rfind(|c: char| c.is_alphanumeric())?;
    let end = last + token[last..].chars().next()?.len_utf8();
    Some(token[start..end].to_lowercase())
}
