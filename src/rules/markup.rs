// SPDX-License-Identifier: PMPL-1.0-or-later
//! Pattern-based markup scanning.
//!
//! Content is scanned with regular expressions rather than parsed into a
//! tree. Every function here is total: malformed markup yields fewer
//! matches, never an error.

use regex::Regex;
use std::sync::LazyLock;

static OPEN_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<([a-z][a-z0-9-]*)\b([^>]*)>").expect("valid regex"));

static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)([a-zA-Z_:][-a-zA-Z0-9_:.]*)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+)))?"#)
        .expect("valid regex")
});

static ANY_TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid regex"));

static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// An opening tag found in the content
#[derive(Debug, Clone, PartialEq)]
pub struct Tag {
    /// Lowercased element name
    pub name: String,
    /// Attributes in source order, names lowercased
    pub attrs: Vec<(String, Option<String>)>,
    /// Byte offset of `<`
    pub start: usize,
    /// Byte offset just past `>`
    pub end: usize,
    /// The tag as written
    pub raw: String,
}

impl Tag {
    /// Attribute value, `Some("")` for a bare attribute
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_deref().unwrap_or(""))
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.iter().any(|(k, _)| k == name)
    }

    /// Attribute value that is present and not blank
    pub fn non_empty_attr(&self, name: &str) -> Option<&str> {
        self.attr(name).filter(|v| !v.trim().is_empty())
    }

    /// Short form for issue messages, truncated for very long tags
    pub fn snippet(&self) -> String {
        truncate_chars(&self.raw, 120)
    }
}

/// An element with the markup between its opening and closing tag
#[derive(Debug, Clone)]
pub struct Element {
    pub tag: Tag,
    /// Inner markup; runs to the end of the content when the element is never closed
    pub inner: String,
    /// Whether a closing tag was found
    pub closed: bool,
}

impl Element {
    /// Visible text of the element
    pub fn text(&self) -> String {
        strip_tags(&self.inner)
    }
}

/// All opening tags, in document order
pub fn all_tags(content: &str) -> Vec<Tag> {
    OPEN_TAG_RE
        .captures_iter(content)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            Some(Tag {
                name: caps[1].to_lowercase(),
                attrs: parse_attrs(&caps[2]),
                start: whole.start(),
                end: whole.end(),
                raw: whole.as_str().to_string(),
            })
        })
        .collect()
}

/// Opening tags with one of the given names, in document order
pub fn find_tags(content: &str, names: &[&str]) -> Vec<Tag> {
    all_tags(content)
        .into_iter()
        .filter(|t| names.contains(&t.name.as_str()))
        .collect()
}

/// Elements with the given name together with their inner markup
pub fn find_elements(content: &str, name: &str) -> Vec<Element> {
    let lower = content.to_lowercase();
    let close = format!("</{}", name);

    find_tags(content, &[name])
        .into_iter()
        .map(|tag| {
            // Lowercasing can shift byte offsets for some scripts; fall back to
            // the unclosed form when the offset is no longer a boundary.
            let close_at = lower
                .get(tag.end..)
                .and_then(|rest| rest.find(&close))
                .map(|pos| tag.end + pos)
                .filter(|pos| content.is_char_boundary(*pos));
            let (inner, closed) = match close_at {
                Some(pos) => (content[tag.end..pos].to_string(), true),
                None => (content[tag.end..].to_string(), false),
            };
            Element { tag, inner, closed }
        })
        .collect()
}

fn parse_attrs(raw: &str) -> Vec<(String, Option<String>)> {
    ATTR_RE
        .captures_iter(raw)
        .map(|caps| {
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map(|m| m.as_str().to_string());
            (caps[1].to_lowercase(), value)
        })
        .collect()
}

/// Remove markup, decode the common entities and collapse whitespace
pub fn strip_tags(markup: &str) -> String {
    let text = ANY_TAG_RE.replace_all(markup, " ");
    let text = text
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");
    WHITESPACE_RE.replace_all(&text, " ").trim().to_string()
}

/// Truncate to at most `max` characters, marking the cut
pub fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max).collect();
        format!("{}...", cut)
    }
}

/// Cut to at most `max` characters with no marker, dropping trailing whitespace
pub fn clip_chars(text: &str, max: usize) -> String {
    let cut: String = text.chars().take(max).collect();
    cut.trim_end().to_string()
}
