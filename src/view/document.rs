//! The post page: compiled body, outline and active section.

use std::cell::RefCell;
use std::rc::Rc;

use crate::document::{CompileCache, CompiledDocument, Document};
use crate::outline::Outline;
use crate::scroll::{FrameThrottle, HeadingPositions, NoLayout, ScrollSyncTracker};
use crate::signal::{Signal, Subscription};

struct DocumentState {
    cache: CompileCache,
    document: Option<Rc<Document>>,
    compiled: Option<Rc<CompiledDocument>>,
    tracker: ScrollSyncTracker,
    throttle: FrameThrottle<f64>,
    last_scroll: Option<f64>,
    positions: Box<dyn HeadingPositions>,
}

impl DocumentState {
    fn on_document(&mut self, doc: &Document) {
        let compiled = self.cache.get_or_compile(doc);
        let changed = self
            .compiled
            .as_ref()
            .is_none_or(|current| !Rc::ptr_eq(current, &compiled));
        if !changed {
            return;
        }
        self.tracker.retain_valid(&compiled.outline);
        self.document = Some(Rc::new(doc.clone()));
        let replaced = self.compiled.replace(compiled).is_some();
        if replaced {
            // Positions measured for the previous document no longer apply.
            // Wait for the new layout before tracking again.
            self.positions = Box::new(NoLayout);
            self.throttle.cancel();
        } else if let Some(scroll) = self.last_scroll {
            self.throttle.offer(scroll);
        }
    }

    fn on_scroll(&mut self, scroll: f64) {
        self.last_scroll = Some(scroll);
        self.throttle.offer(scroll);
    }
}

/// A post page bound to a document signal and a scroll signal.
///
/// Document changes recompile (through the identity cache) and re-extract
/// the outline. Scroll samples are coalesced and only touch the
/// active-section tracker, once per [`on_frame`](Self::on_frame).
///
/// Replacing the document with a different identity drops the heading
/// layout; the host supplies the new one through
/// [`set_heading_positions`](Self::set_heading_positions), which also
/// re-applies the last scroll offset.
pub struct DocumentView {
    state: Rc<RefCell<DocumentState>>,
    subscriptions: Vec<Subscription>,
}

impl std::fmt::Debug for DocumentView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("DocumentView")
            .field("document", &state.compiled.as_ref().map(|c| c.identity.id.clone()))
            .field("active", &state.tracker.active())
            .field("attached", &!self.subscriptions.is_empty())
            .finish_non_exhaustive()
    }
}

impl DocumentView {
    /// Subscribe to `documents` and `scroll`.
    pub fn attach(documents: &Signal<Document>, scroll: &Signal<f64>, threshold: f64) -> Self {
        let state = Rc::new(RefCell::new(DocumentState {
            cache: CompileCache::default(),
            document: None,
            compiled: None,
            tracker: ScrollSyncTracker::new(threshold),
            throttle: FrameThrottle::new(),
            last_scroll: None,
            positions: Box::new(NoLayout),
        }));

        let on_document = {
            let state = Rc::clone(&state);
            documents.subscribe(move |doc: &Document| state.borrow_mut().on_document(doc))
        };
        let on_scroll = {
            let state = Rc::clone(&state);
            scroll.subscribe(move |sample: &f64| state.borrow_mut().on_scroll(*sample))
        };

        Self {
            state,
            subscriptions: vec![on_document, on_scroll],
        }
    }

    /// Apply the newest pending scroll sample, if any. Call once per frame.
    ///
    /// Returns true if the active section changed. A sample that arrives
    /// before any document is kept and applied once one is compiled.
    pub fn on_frame(&self) -> bool {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        let Some(compiled) = state.compiled.clone() else {
            return false;
        };
        let Some(scroll) = state.throttle.take() else {
            return false;
        };
        let _scope = crate::perf::scope("scroll.frame");
        state
            .tracker
            .apply(&compiled.outline, state.positions.as_ref(), scroll)
    }

    /// Replace the heading layout, e.g. after a reflow. The last scroll
    /// offset is re-evaluated on the next frame.
    pub fn set_heading_positions(&self, positions: impl HeadingPositions + 'static) {
        let mut state = self.state.borrow_mut();
        state.positions = Box::new(positions);
        if let Some(scroll) = state.last_scroll {
            state.throttle.offer(scroll);
        }
    }

    /// Stop listening. Later document or scroll emissions are ignored and
    /// any pending sample is discarded.
    pub fn detach(&mut self) {
        self.subscriptions.clear();
        self.state.borrow_mut().throttle.cancel();
    }

    pub fn is_attached(&self) -> bool {
        !self.subscriptions.is_empty()
    }

    pub fn document(&self) -> Option<Rc<Document>> {
        self.state.borrow().document.clone()
    }

    pub fn compiled(&self) -> Option<Rc<CompiledDocument>> {
        self.state.borrow().compiled.clone()
    }

    /// Outline of the current document; empty before the first document.
    pub fn outline(&self) -> Outline {
        self.state
            .borrow()
            .compiled
            .as_ref()
            .map(|compiled| compiled.outline.clone())
            .unwrap_or_default()
    }

    pub fn active_section(&self) -> Option<String> {
        self.state.borrow().tracker.active().map(ToOwned::to_owned)
    }

    /// Number of compilations so far. Scrolling never increases this.
    pub fn compile_count(&self) -> usize {
        self.state.borrow().cache.compile_count()
    }

    /// Number of scroll samples the tracker evaluated.
    pub fn scroll_recomputations(&self) -> u64 {
        self.state.borrow().tracker.recomputations()
    }

    /// Article plus outline navigation for the current document.
    pub fn render(&self) -> Option<String> {
        let state = self.state.borrow();
        let document = state.document.as_ref()?;
        let compiled = state.compiled.as_ref()?;
        let mut html = super::chrome::render_outline_nav(&compiled.outline, state.tracker.active());
        html.push_str(&super::chrome::render_article(document, compiled));
        Some(html)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Block;
    use serde_json::json;
    use std::collections::HashMap;

    fn post(id: &str, headings: &[&str]) -> Document {
        let blocks = headings
            .iter()
            .map(|text| Block::new("header", json!({ "text": text, "level": 2 })))
            .collect();
        Document::from_blocks(id, blocks)
    }

    fn layout(pairs: &[(&str, f64)]) -> HashMap<String, f64> {
        pairs.iter().map(|(id, top)| ((*id).to_string(), *top)).collect()
    }

    #[test]
    fn test_document_change_compiles_and_extracts_outline() {
        let documents = Signal::new();
        let scroll = Signal::new();
        let view = DocumentView::attach(&documents, &scroll, 100.0);
        assert!(view.compiled().is_none());
        assert!(view.outline().is_empty());

        documents.emit(&post("p1", &["Intro", "Details"]));
        let ids: Vec<_> = view.outline().iter().map(|e| e.id.clone()).collect();
        assert_eq!(ids, ["intro", "details"]);
        assert_eq!(view.compile_count(), 1);
    }

    #[test]
    fn test_scroll_never_recompiles() {
        let documents = Signal::new();
        let scroll = Signal::new();
        let view = DocumentView::attach(&documents, &scroll, 100.0);
        documents.emit(&post("p1", &["Intro", "Details"]));
        view.set_heading_positions(layout(&[("intro", 0.0), ("details", 800.0)]));

        for offset in 0..50 {
            scroll.emit(&f64::from(offset * 20));
            view.on_frame();
        }
        assert_eq!(view.compile_count(), 1);
        assert_eq!(view.active_section().as_deref(), Some("details"));
    }

    #[test]
    fn test_same_identity_reemitted_is_cache_hit() {
        let documents = Signal::new();
        let scroll = Signal::new();
        let view = DocumentView::attach(&documents, &scroll, 100.0);
        let doc = post("p1", &["Intro"]);
        documents.emit(&doc);
        documents.emit(&doc.clone());
        assert_eq!(view.compile_count(), 1);

        documents.emit(&post("p1", &["Intro", "Added later"]));
        assert_eq!(view.compile_count(), 2);
    }

    #[test]
    fn test_samples_coalesce_to_latest_per_frame() {
        let documents = Signal::new();
        let scroll = Signal::new();
        let view = DocumentView::attach(&documents, &scroll, 100.0);
        documents.emit(&post("p1", &["A", "B", "C"]));
        view.set_heading_positions(layout(&[("a", 0.0), ("b", 400.0), ("c", 900.0)]));
        view.on_frame();
        let before = view.scroll_recomputations();

        scroll.emit(&1000.0);
        scroll.emit(&500.0);
        scroll.emit(&50.0);
        assert!(view.on_frame());
        assert_eq!(view.active_section().as_deref(), Some("a"));
        assert_eq!(view.scroll_recomputations(), before + 1);
        assert!(!view.on_frame());
    }

    #[test]
    fn test_sample_before_document_is_applied_later() {
        let documents = Signal::new();
        let scroll = Signal::new();
        let view = DocumentView::attach(&documents, &scroll, 100.0);
        view.set_heading_positions(layout(&[("a", 0.0), ("b", 400.0)]));
        scroll.emit(&450.0);
        assert!(!view.on_frame());

        documents.emit(&post("p1", &["A", "B"]));
        assert!(view.on_frame());
        assert_eq!(view.active_section().as_deref(), Some("b"));
    }

    #[test]
    fn test_switching_documents_drops_stale_active_id() {
        let documents = Signal::new();
        let scroll = Signal::new();
        let view = DocumentView::attach(&documents, &scroll, 100.0);
        documents.emit(&post("p1", &["Old"]));
        view.set_heading_positions(layout(&[("old", 0.0)]));
        scroll.emit(&10.0);
        view.on_frame();
        assert_eq!(view.active_section().as_deref(), Some("old"));

        documents.emit(&post("p2", &["New"]));
        assert_eq!(view.active_section(), None);
    }

    #[test]
    fn test_switching_documents_waits_for_new_layout() {
        let documents = Signal::new();
        let scroll = Signal::new();
        let view = DocumentView::attach(&documents, &scroll, 100.0);
        documents.emit(&post("p1", &["Overview", "Costs"]));
        view.set_heading_positions(layout(&[("overview", 0.0), ("costs", 600.0)]));
        scroll.emit(&100.0);
        assert!(view.on_frame());
        assert_eq!(view.active_section().as_deref(), Some("overview"));

        documents.emit(&post("p2", &["Intro", "Overview"]));
        assert!(!view.on_frame());
        scroll.emit(&120.0);
        view.on_frame();
        assert_eq!(view.active_section(), None);

        view.set_heading_positions(layout(&[("intro", 0.0), ("overview", 5000.0)]));
        assert!(view.on_frame());
        assert_eq!(view.active_section().as_deref(), Some("intro"));
    }

    #[test]
    fn test_detached_view_ignores_signals() {
        let documents = Signal::new();
        let scroll = Signal::new();
        let mut view = DocumentView::attach(&documents, &scroll, 100.0);
        documents.emit(&post("p1", &["A"]));
        view.set_heading_positions(layout(&[("a", 0.0)]));
        scroll.emit(&0.0);
        view.detach();

        assert!(!view.is_attached());
        assert_eq!(documents.subscriber_count(), 0);
        assert_eq!(scroll.subscriber_count(), 0);
        assert!(!view.on_frame());

        scroll.emit(&100.0);
        documents.emit(&post("p2", &["B"]));
        assert!(!view.on_frame());
        assert_eq!(view.compile_count(), 1);
        assert_eq!(view.scroll_recomputations(), 0);
    }

    #[test]
    fn test_dropping_view_releases_subscriptions() {
        let documents: Signal<Document> = Signal::new();
        let scroll: Signal<f64> = Signal::new();
        let view = DocumentView::attach(&documents, &scroll, 100.0);
        assert_eq!(documents.subscriber_count(), 1);
        drop(view);
        assert_eq!(documents.subscriber_count(), 0);
        assert_eq!(scroll.subscriber_count(), 0);
        documents.emit(&post("p1", &["A"]));
    }

    #[test]
    fn test_render_includes_nav_and_article() {
        let documents = Signal::new();
        let scroll = Signal::new();
        let view = DocumentView::attach(&documents, &scroll, 100.0);
        assert!(view.render().is_none());
        documents.emit(&post("p1", &["Intro"]));
        let html = view.render().unwrap();
        assert!(html.contains("<nav class=\"outline\""));
        assert!(html.contains("<h2 id=\"intro\">Intro</h2>"));
    }
}
