//! Link and tag extraction from note bodies.
//!
//! These functions only split text. Resolving a destination to a note or
//! a file is up to the caller.

use std::sync::LazyLock;

use log::warn;
use regex::Regex;

static MARKDOWN_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(!?)\[([^\]]*)\]\(([^()\s]*)\)").expect("markdown link regex")
});

static WIKILINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(!?)\[\[([^\[\]|]+?)(?:\|([^\[\]]*))?\]\]").expect("wikilink regex")
});

/// One link occurrence in a body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkMatch<'a> {
    /// The exact substring of the body, e.g. `![alt](img.png)`
    pub text: &'a str,
    /// `"!"` for embeds, empty for plain references
    pub prefix: &'a str,
    pub description: &'a str,
    pub destination: &'a str,
}

impl LinkMatch<'_> {
    pub fn is_embed(&self) -> bool {
        self.prefix == "!"
    }
}

/// What a link destination points at, judged by its text alone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkTarget {
    Web,
    Note,
    Resource,
}

/// `destination` without its `#fragment`
pub fn strip_fragment(destination: &str) -> &str {
    destination.split('#').next().unwrap_or(destination)
}

pub fn classify_destination(destination: &str) -> LinkTarget {
    if destination.starts_with("http") {
        LinkTarget::Web
    } else if strip_fragment(destination).ends_with(".md") {
        LinkTarget::Note
    } else {
        LinkTarget::Resource
    }
}

/// Markdown links `[description](destination)` in body order
pub fn markdown_links(body: &str) -> impl Iterator<Item = LinkMatch<'_>> {
    MARKDOWN_LINK_RE.captures_iter(body).map(|caps| LinkMatch {
        text: caps.get(0).map_or("", |m| m.as_str()),
        prefix: caps.get(1).map_or("", |m| m.as_str()),
        description: caps.get(2).map_or("", |m| m.as_str()),
        destination: caps.get(3).map_or("", |m| m.as_str()),
    })
}

/// Wikilinks `[[destination|description]]` in body order.
///
/// The description is empty when the link has no alias.
pub fn wikilink_links(body: &str) -> impl Iterator<Item = LinkMatch<'_>> {
    WIKILINK_RE.captures_iter(body).map(|caps| LinkMatch {
        text: caps.get(0).map_or("", |m| m.as_str()),
        prefix: caps.get(1).map_or("", |m| m.as_str()),
        destination: caps.get(2).map_or("", |m| m.as_str()),
        description: caps.get(3).map_or("", |m| m.as_str()),
    })
}

/// Finds inline tags such as `#project/alpha`.
///
/// A tag must follow whitespace or the start of the body, so headings
/// (`# Title`) and anchors (`page#section`) are not tags. Purely numeric
/// tokens like `#1` are ignored.
#[derive(Debug, Clone)]
pub struct InlineTagMatcher {
    re: Option<Regex>,
}

impl InlineTagMatcher {
    pub fn new(markers: &[String]) -> Self {
        let alternatives: Vec<String> = markers
            .iter()
            .filter(|m| !m.is_empty())
            .map(|m| regex::escape(m))
            .collect();
        if alternatives.is_empty() {
            return Self { re: None };
        }
        let pattern = format!(
            r"(?:^|\s)(?:{})([\p{{L}}\p{{N}}_/-]+)",
            alternatives.join("|")
        );
        let re = match Regex::new(&pattern) {
            Ok(re) => Some(re),
            Err(e) => {
                warn!("Inline tag markers {:?} disabled: {}", markers, e);
                None
            }
        };
        Self { re }
    }

    /// Tags in `body`, deduplicated, in body order
    pub fn tags(&self, body: &str) -> Vec<String> {
        let Some(re) = &self.re else {
            return Vec::new();
        };
        let mut tags: Vec<String> = Vec::new();
        for cap in re.captures_iter(body) {
            let Some(tag) = cap.get(1).map(|m| m.as_str()) else {
                continue;
            };
            if tag.chars().all(|c| c.is_ascii_digit()) {
                continue;
            }
            if !tags.iter().any(|t| t == tag) {
                tags.push(tag.to_string());
            }
        }
        tags
    }
}

/// One-off form of [`InlineTagMatcher::tags`]. Converters keep a matcher
/// instead of calling this per note.
pub fn inline_tags(body: &str, markers: &[String]) -> Vec<String> {
    InlineTagMatcher::new(markers).tags(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markdown_links() {
        let body = "See [the docs](docs/intro.md) and ![diagram](img/a%20b.png).";
        let links: Vec<_> = markdown_links(body).collect();

        assert_eq!(links.len(), 2);
        assert_eq!(links[0].text, "[the docs](docs/intro.md)");
        assert_eq!(links[0].prefix, "");
        assert_eq!(links[0].description, "the docs");
        assert_eq!(links[0].destination, "docs/intro.md");
        assert!(links[1].is_embed());
        assert_eq!(links[1].destination, "img/a%20b.png");
    }

    #[test]
    fn test_wikilinks_with_and_without_alias() {
        let body = "[[note-id|Shown Text]] then ![[photo.jpg]] then [[Plain]]";
        let links: Vec<_> = wikilink_links(body).collect();

        assert_eq!(links.len(), 3);
        assert_eq!(links[0].text, "[[note-id|Shown Text]]");
        assert_eq!(links[0].destination, "note-id");
        assert_eq!(links[0].description, "Shown Text");
        assert!(links[1].is_embed());
        assert_eq!(links[1].destination, "photo.jpg");
        assert_eq!(links[2].description, "");
    }

    #[test]
    fn test_wikilink_is_not_a_markdown_link() {
        assert_eq!(markdown_links("[[Plain]] text").count(), 0);
    }

    #[test]
    fn test_classify_destination() {
        assert_eq!(classify_destination("https://example.com/a.md"), LinkTarget::Web);
        assert_eq!(classify_destination("Other%20Note.md"), LinkTarget::Note);
        assert_eq!(classify_destination("files/report.pdf"), LinkTarget::Resource);
        assert_eq!(classify_destination("Other.md#Heading"), LinkTarget::Note);
        assert_eq!(classify_destination("doc.pdf#page=2"), LinkTarget::Resource);
        assert_eq!(strip_fragment("Other.md#Heading"), "Other.md");
    }

    #[test]
    fn test_inline_tags() {
        let body = "# Heading\nThis is a #test and #nested/tag, not page#anchor or #42.\n#test again";
        let tags = inline_tags(body, &["#".to_string()]);
        assert_eq!(tags, vec!["test", "nested/tag"]);
    }

    #[test]
    fn test_tag_matcher_handles_several_markers() {
        let matcher = InlineTagMatcher::new(&["#".to_string(), "+".to_string()]);
        assert_eq!(matcher.tags("+first then #second and +first"), vec!["first", "second"]);
        assert_eq!(matcher.tags("a+b c#d"), Vec::<String>::new());
        assert!(InlineTagMatcher::new(&[]).tags("#none").is_empty());
    }
}
