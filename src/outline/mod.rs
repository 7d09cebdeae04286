//! Outline extraction from compiled markup.
//!
//! The outline is what the navigation sidebar lists: every `h1`..`h6`
//! element that carries an `id`, in document order.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::html::{decode_entities, plain_text};

static HEADING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<h([1-6])(\s[^>]*)?>(.*?)</h([1-6])\s*>").expect("valid heading regex")
});

static ID_ATTR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)(?:^|\s)id\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#)
        .expect("valid id attribute regex")
});

/// One navigable heading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineEntry {
    /// Anchor id, unique within the document
    pub id: String,
    /// Plain display text
    pub text: String,
    /// Heading level (1-6)
    pub level: u8,
}

/// Ordered headings of one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outline {
    entries: Vec<OutlineEntry>,
}

impl Outline {
    pub const fn new(entries: Vec<OutlineEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[OutlineEntry] {
        &self.entries
    }

    /// True when the document has no linkable headings. The navigation UI
    /// shows an explicit "no headings" state in this case.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.iter().any(|entry| entry.id == id)
    }

    pub fn get(&self, id: &str) -> Option<&OutlineEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, OutlineEntry> {
        self.entries.iter()
    }

    /// Smallest heading level present, used to indent relative to the
    /// shallowest heading.
    pub fn min_level(&self) -> Option<u8> {
        self.entries.iter().map(|entry| entry.level).min()
    }
}

impl<'a> IntoIterator for &'a Outline {
    type Item = &'a OutlineEntry;
    type IntoIter = std::slice::Iter<'a, OutlineEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Scan `markup` for heading elements and build the outline.
///
/// Headings without an `id` attribute (or with an empty one) stay in the
/// markup but are left out of the outline. Mismatched open/close levels are
/// treated as malformed and skipped. When two headings share an id only the
/// first is listed, since an anchor can only resolve to one of them.
///
/// # Example
///
/// ```
/// use blockpress::outline::extract_outline;
///
/// let outline = extract_outline("<h2 id=\"a\">A</h2><p>x</p><h3 id=\"b\">B</h3>");
/// let ids: Vec<_> = outline.iter().map(|e| e.id.as_str()).collect();
/// assert_eq!(ids, ["a", "b"]);
/// ```
pub fn extract_outline(markup: &str) -> Outline {
    let mut seen = HashSet::new();
    let entries = HEADING_RE
        .captures_iter(markup)
        .filter_map(|caps| {
            let (level, id) = heading_level_and_id(&caps)?;
            if !seen.insert(id.clone()) {
                tracing::debug!(%id, "skipping heading with a repeated id");
                return None;
            }
            let text = plain_text(caps.get(3).map_or("", |m| m.as_str()));
            Some(OutlineEntry { id, text, level })
        })
        .collect();
    Outline::new(entries)
}

/// Ids carried by well-formed heading elements in `markup`, in order and
/// including repeats.
pub fn heading_anchor_ids(markup: &str) -> Vec<String> {
    HEADING_RE
        .captures_iter(markup)
        .filter_map(|caps| heading_level_and_id(&caps).map(|(_, id)| id))
        .collect()
}

fn heading_level_and_id(caps: &regex::Captures<'_>) -> Option<(u8, String)> {
    let open = caps.get(1)?.as_str();
    let close = caps.get(4)?.as_str();
    if open != close {
        return None;
    }
    let level = open.parse::<u8>().ok()?;
    let id = heading_id_attr(caps.get(2).map_or("", |m| m.as_str()))?;
    Some((level, id))
}

fn heading_id_attr(attrs: &str) -> Option<String> {
    let caps = ID_ATTR_RE.captures(attrs)?;
    let raw = caps
        .get(1)
        .or_else(|| caps.get(2))
        .or_else(|| caps.get(3))?
        .as_str();
    let id = decode_entities(raw.trim());
    (!id.is_empty()).then_some(id)
}
