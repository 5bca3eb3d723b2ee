//! Tag classification for the streaming HTML scanner

use super::HtmlError;

/// Syntactic form of a tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    Opening,
    Closing,
    SelfClosing,
}

/// What the scanner does with a tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagAction {
    /// `<a>`: collect the href and track anchor text until the closing tag
    Anchor,
    /// `<base>`: first valid href becomes the document base
    Base,
    /// `<embed>`: collect the src, no anchor tracking
    Embed,
    /// `<title>`: tokenize the element text into title words
    Title,
    /// `<script>`/`<style>`/`<svg>`: skip the whole element
    DiscardElement,
    /// Everything else: ignore the tag, keep scanning text
    Discard,
}

/// Action for a lowercased tag name. Names without special handling discard.
pub fn action_for(name: &str) -> TagAction {
    match name {
        "a" => TagAction::Anchor,
        "base" => TagAction::Base,
        "embed" => TagAction::Embed,
        "title" => TagAction::Title,
        "script" | "style" | "svg" => TagAction::DiscardElement,
        _ => TagAction::Discard,
    }
}

/// A scanned tag: kind, lowercased name, and raw parameter text
///
/// Parameter lookup is a positional substring search over the raw text, not a
/// full attribute parser. That is deliberate: the input is untrusted HTML and
/// the scanner only ever needs `href`, `src`, and the language hints.
#[derive(Debug, Clone)]
pub struct TagInfo {
    pub kind: TagKind,
    pub name: String,
    params: String,
}

impl TagInfo {
    /// Parse one tag including its angle brackets.
    pub fn parse(tag: &str) -> Result<Self, HtmlError> {
        let bytes = tag.as_bytes();
        if bytes.len() < 2 {
            return Err(HtmlError::Format("tag too short"));
        }

        let leading_slash = bytes[1] == b'/';
        let trailing_slash = bytes[bytes.len() - 2] == b'/';
        let (kind, inner) = match (leading_slash, trailing_slash) {
            (false, false) => (TagKind::Opening, &tag[1..tag.len() - 1]),
            (true, false) => (TagKind::Closing, &tag[2..tag.len() - 1]),
            (false, true) => (TagKind::SelfClosing, &tag[1..tag.len() - 2]),
            (true, true) => return Err(HtmlError::Format("malformed tag")),
        };

        let name_end = inner
            .find(|c: char| c.is_whitespace())
            .unwrap_or(inner.len());
        Ok(Self {
            kind,
            name: inner[..name_end].to_lowercase(),
            params: inner[name_end..].to_string(),
        })
    }

    /// Look up a parameter value: find `name`, skip it plus the `=`, skip an
    /// optional opening quote, then read up to the next quote.
    pub fn attr(&self, name: &str) -> Option<String> {
        let pos = self.params.find(name)? + name.len() + 1;
        if pos >= self.params.len() {
            return None;
        }
        let mut rest = self.params.get(pos..)?;
        if rest.starts_with('\'') || rest.starts_with('"') {
            rest = &rest[1..];
        }
        let end = rest.find(['\'', '"']).unwrap_or(rest.len());
        Some(rest[..end].to_string())
    }

    /// The literal closing-tag text the scanner searches for.
    pub fn closing_tag(&self) -> String {
        format!("</{}>", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_tag_kinds() {
        let opening = TagInfo::parse("<a href=\"/x\">").unwrap();
        assert_eq!(opening.kind, TagKind::Opening);
        assert_eq!(opening.name, "a");

        let closing = TagInfo::parse("</a>").unwrap();
        assert_eq!(closing.kind, TagKind::Closing);
        assert_eq!(closing.name, "a");

        let self_closing = TagInfo::parse("<base href=\"/\" />").unwrap();
        assert_eq!(self_closing.kind, TagKind::SelfClosing);
        assert_eq!(self_closing.name, "base");

        assert!(TagInfo::parse("</a/>").is_err());
    }

    #[test]
    fn name_is_lowercased() {
        let tag = TagInfo::parse("<SCRIPT src=app.js>").unwrap();
        assert_eq!(tag.name, "script");
        assert_eq!(action_for(&tag.name), TagAction::DiscardElement);
    }

    #[test]
    fn attr_lookup_handles_quote_styles() {
        let double = TagInfo::parse("<a href=\"/x\" class=\"big\">").unwrap();
        assert_eq!(double.attr("href").as_deref(), Some("/x"));

        let single = TagInfo::parse("<a href='/y'>").unwrap();
        assert_eq!(single.attr("href").as_deref(), Some("/y"));

        let missing = TagInfo::parse("<a class=\"big\">").unwrap();
        assert_eq!(missing.attr("href"), None);
    }

    #[test]
    fn unknown_names_discard() {
        assert_eq!(action_for("div"), TagAction::Discard);
        assert_eq!(action_for("made-up-element"), TagAction::Discard);
        assert_eq!(action_for("a"), TagAction::Anchor);
        assert_eq!(action_for("title"), TagAction::Title);
    }
}
