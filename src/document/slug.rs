//! Heading id derivation.
//!
//! Deriving ids from free text is lossy and collides easily, so the text
//! to id step is a pluggable [`HeadingIdStrategy`] and uniqueness within a
//! document is enforced separately by [`HeadingIds`].

use std::collections::{HashMap, HashSet};
use std::fmt::Debug;

use crate::html::plain_text;

/// Turns heading text into an anchor id.
///
/// Returning an empty string means "no id": the heading still renders but
/// is left out of the outline.
pub trait HeadingIdStrategy: Debug {
    fn heading_id(&self, text: &str) -> String;
}

/// Default strategy: lower-case, whitespace runs become `-`, everything
/// outside `[a-z0-9_-]` is dropped, and repeated or edge hyphens are
/// trimmed.
///
/// # Examples
///
/// ```
/// use blockpress::document::{HeadingIdStrategy, Slugify};
///
/// assert_eq!(Slugify.heading_id("Why  <b>Rust</b>?"), "why-rust");
/// assert_eq!(Slugify.heading_id("Step 2: apply"), "step-2-apply");
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct Slugify;

impl HeadingIdStrategy for Slugify {
    fn heading_id(&self, text: &str) -> String {
        slugify(&plain_text(text))
    }
}

/// Slug for already-plain text.
pub fn slugify(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_dash = false;
    for ch in text.trim().to_lowercase().chars() {
        if ch.is_whitespace() || ch == '-' {
            pending_dash = true;
        } else if ch.is_ascii_alphanumeric() || ch == '_' {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(ch);
        }
    }
    out
}

/// Per-document registry of issued heading ids.
///
/// Collisions get a numeric suffix: `intro`, `intro-2`, `intro-3`. A
/// suffixed id that an author also typed literally is skipped over.
#[derive(Debug, Default, Clone)]
pub struct HeadingIds {
    issued: HashSet<String>,
    next_suffix: HashMap<String, usize>,
}

impl HeadingIds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a unique id derived from `base`. Returns `None` for an empty
    /// base.
    pub fn allocate(&mut self, base: &str) -> Option<String> {
        if base.is_empty() {
            return None;
        }
        let mut candidate = base.to_string();
        let mut suffix = self.next_suffix.get(base).copied().unwrap_or(2);
        while self.issued.contains(&candidate) {
            candidate = format!("{base}-{suffix}");
            suffix += 1;
        }
        if candidate != base {
            self.next_suffix.insert(base.to_string(), suffix);
        }
        self.issued.insert(candidate.clone());
        Some(candidate)
    }

    /// Mark an id that is already present in the output, so later
    /// allocations step around it.
    pub fn reserve(&mut self, id: &str) {
        if !id.is_empty() {
            self.issued.insert(id.to_string());
        }
    }
}
