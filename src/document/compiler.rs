//! Document compilation: blocks in, one markup string out.

use std::rc::Rc;

use super::block::{Block, BlockContent};
use super::slug::{HeadingIdStrategy, HeadingIds, Slugify};
use super::transcode::{BlockContext, transcode_block};
use super::types::{Document, DocumentIdentity};
use crate::outline::{Outline, extract_outline, heading_anchor_ids};

/// Runs the transcoder over a block list, allocating unique heading ids.
#[derive(Debug)]
pub struct Compiler {
    strategy: Box<dyn HeadingIdStrategy>,
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

impl Compiler {
    /// Compiler using the default [`Slugify`] id strategy.
    pub fn new() -> Self {
        Self::with_strategy(Slugify)
    }

    pub fn with_strategy(strategy: impl HeadingIdStrategy + 'static) -> Self {
        Self {
            strategy: Box::new(strategy),
        }
    }

    /// Transcode `blocks` in order and concatenate the fragments.
    ///
    /// Output order follows input order exactly; nothing is merged,
    /// deduplicated or reordered.
    ///
    /// # Example
    ///
    /// ```
    /// use blockpress::document::{Block, Compiler};
    /// use serde_json::json;
    ///
    /// let blocks = vec![
    ///     Block::new("header", json!({ "text": "Essays", "level": 2 })),
    ///     Block::new("delimiter", json!({})),
    /// ];
    /// let html = Compiler::new().compile(&blocks);
    /// assert_eq!(html, "<h2 id=\"essays\">Essays</h2>\n<hr class=\"delimiter\" />\n");
    /// ```
    pub fn compile(&self, blocks: &[Block]) -> String {
        let _scope = crate::perf::scope("compile.blocks");
        let mut ids = HeadingIds::new();

        // Headings inside raw or other passthrough blocks keep their ids, so
        // reserve those before any header block picks one.
        let fragments: Vec<Option<String>> = blocks
            .iter()
            .map(|block| match block.content() {
                BlockContent::Header(_) => None,
                _ => {
                    let fragment = transcode_block(block, &BlockContext::default());
                    for id in heading_anchor_ids(&fragment) {
                        ids.reserve(&id);
                    }
                    Some(fragment)
                }
            })
            .collect();

        let mut html = String::new();
        for (block, fragment) in blocks.iter().zip(fragments) {
            if let Some(fragment) = fragment {
                html.push_str(&fragment);
            } else if let BlockContent::Header(header) = block.content() {
                let heading_id = ids.allocate(&self.strategy.heading_id(&header.text));
                let ctx = BlockContext {
                    heading_id: heading_id.as_deref(),
                };
                html.push_str(&transcode_block(block, &ctx));
            }
        }
        html
    }
}

/// Result of compiling one document identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledDocument {
    pub identity: DocumentIdentity,
    pub markup: String,
    pub outline: Outline,
}

impl CompiledDocument {
    /// True when the document had nothing to render.
    pub fn is_empty(&self) -> bool {
        self.markup.trim().is_empty()
    }
}

/// Keeps the last compiled document and recompiles only when the document
/// identity changes.
#[derive(Debug, Default)]
pub struct CompileCache {
    compiler: Compiler,
    current: Option<Rc<CompiledDocument>>,
    compile_count: usize,
}

impl CompileCache {
    pub fn new(compiler: Compiler) -> Self {
        Self {
            compiler,
            current: None,
            compile_count: 0,
        }
    }

    /// Compiled markup and outline for `doc`, reusing the cached result when
    /// the identity is unchanged.
    pub fn get_or_compile(&mut self, doc: &Document) -> Rc<CompiledDocument> {
        let identity = doc.identity();
        if let Some(current) = &self.current
            && current.identity == identity
        {
            tracing::debug!(doc = %identity.id, "compile cache hit");
            crate::perf::log_event("compile.cache.hit", &identity.id);
            return Rc::clone(current);
        }

        tracing::debug!(doc = %identity.id, blocks = doc.blocks.len(), "compiling document");
        crate::perf::log_event(
            "compile.cache.miss",
            format!("id={} fingerprint={:016x}", identity.id, identity.fingerprint),
        );
        let markup = self.compiler.compile(&doc.blocks);
        let outline = extract_outline(&markup);
        let compiled = Rc::new(CompiledDocument {
            identity,
            markup,
            outline,
        });
        self.compile_count += 1;
        self.current = Some(Rc::clone(&compiled));
        compiled
    }

    /// The most recent compilation, if any.
    pub fn current(&self) -> Option<&Rc<CompiledDocument>> {
        self.current.as_ref()
    }

    /// Number of compilations performed (cache misses).
    pub const fn compile_count(&self) -> usize {
        self.compile_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn header(text: &str, level: u8) -> Block {
        Block::new("header", json!({ "text": text, "level": level }))
    }

    #[test]
    fn test_compile_empty_is_empty_string() {
        assert_eq!(Compiler::new().compile(&[]), "");
    }

    #[test]
    fn test_compile_preserves_block_order() {
        let blocks = vec![
            Block::new("paragraph", json!({ "text": "first" })),
            Block::new("delimiter", json!({})),
            Block::new("paragraph", json!({ "text": "second" })),
        ];
        let html = Compiler::new().compile(&blocks);
        let first = html.find("first").unwrap();
        let hr = html.find("<hr").unwrap();
        let second = html.find("second").unwrap();
        assert!(first < hr && hr < second);
    }

    #[test]
    fn test_compile_does_not_merge_duplicate_blocks() {
        let block = Block::new("paragraph", json!({ "text": "same" }));
        let html = Compiler::new().compile(&[block.clone(), block]);
        assert_eq!(html.matches("<p>same</p>").count(), 2);
    }

    #[test]
    fn test_compile_suffixes_duplicate_heading_ids() {
        let html = Compiler::new().compile(&[header("FAQ", 2), header("FAQ", 2), header("faq", 3)]);
        assert!(html.contains("<h2 id=\"faq\">"));
        assert!(html.contains("<h2 id=\"faq-2\">"));
        assert!(html.contains("<h3 id=\"faq-3\">"));
    }

    #[test]
    fn test_header_steps_around_id_from_raw_markup() {
        let blocks = vec![
            Block::new("raw", json!({ "html": "<h2 id=\"faq\">FAQ (raw)</h2>" })),
            header("FAQ", 2),
        ];
        let html = Compiler::new().compile(&blocks);
        assert!(html.starts_with("<h2 id=\"faq\">FAQ (raw)</h2>"));
        assert!(html.contains("<h2 id=\"faq-2\">FAQ</h2>"));

        let outline = extract_outline(&html);
        let ids: Vec<_> = outline.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["faq", "faq-2"]);
    }

    #[test]
    fn test_raw_id_reserved_even_when_header_comes_first() {
        let blocks = vec![
            header("Intro", 2),
            Block::new("raw", json!({ "html": "<h3 id='intro'>Again</h3>" })),
        ];
        let html = Compiler::new().compile(&blocks);
        assert!(html.contains("<h2 id=\"intro-2\">Intro</h2>"));
        assert_eq!(extract_outline(&html).len(), 2);
    }

    #[test]
    fn test_ids_reset_between_compilations() {
        let compiler = Compiler::new();
        let a = compiler.compile(&[header("Intro", 2)]);
        let b = compiler.compile(&[header("Intro", 2)]);
        assert_eq!(a, b);
    }

    #[derive(Debug)]
    struct Numbered;

    impl HeadingIdStrategy for Numbered {
        fn heading_id(&self, text: &str) -> String {
            format!("section-{}", text.len())
        }
    }

    #[test]
    fn test_custom_strategy_replaces_slugify() {
        let html = Compiler::with_strategy(Numbered).compile(&[header("Intro", 1)]);
        assert_eq!(html, "<h1 id=\"section-5\">Intro</h1>\n");
    }

    #[test]
    fn test_cache_reuses_compilation_for_same_identity() {
        let doc = Document::from_blocks("post", vec![header("Intro", 2)]);
        let mut cache = CompileCache::default();
        let first = cache.get_or_compile(&doc);
        let second = cache.get_or_compile(&doc.clone());
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(cache.compile_count(), 1);
    }

    #[test]
    fn test_cache_recompiles_on_identity_change() {
        let mut cache = CompileCache::default();
        let a = Document::from_blocks("post", vec![header("Intro", 2)]);
        let b = Document::from_blocks("post", vec![header("Outro", 2)]);
        cache.get_or_compile(&a);
        let compiled = cache.get_or_compile(&b);
        assert_eq!(cache.compile_count(), 2);
        assert_eq!(compiled.outline.entries()[0].id, "outro");
    }

    #[test]
    fn test_compiled_empty_document() {
        let mut cache = CompileCache::default();
        let compiled = cache.get_or_compile(&Document::default());
        assert!(compiled.is_empty());
        assert!(compiled.outline.is_empty());
    }
}
