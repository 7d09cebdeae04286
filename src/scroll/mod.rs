//! Scroll-synchronized outline highlighting.
//!
//! The [`ScrollSyncTracker`] decides which outline entry is "active" for a
//! scroll offset. It scans the outline bottom-up and picks the first heading
//! whose rendered top is at or above `scroll + threshold`, which favors the
//! section filling the viewport over one that is only just entering it.

mod throttle;

use std::collections::{BTreeMap, HashMap};

pub use throttle::FrameThrottle;

use crate::outline::{Outline, OutlineEntry};

/// Default lookahead below the scroll offset, in pixels.
pub const DEFAULT_THRESHOLD_PX: f64 = 120.0;

/// Where heading elements ended up after layout.
///
/// Offsets are pixels from the top of the document. Headings the layout
/// has not placed yet return `None` and are ignored.
pub trait HeadingPositions {
    fn top_of(&self, id: &str) -> Option<f64>;
}

impl HeadingPositions for HashMap<String, f64> {
    fn top_of(&self, id: &str) -> Option<f64> {
        self.get(id).copied()
    }
}

impl HeadingPositions for BTreeMap<String, f64> {
    fn top_of(&self, id: &str) -> Option<f64> {
        self.get(id).copied()
    }
}

impl HeadingPositions for [(String, f64)] {
    fn top_of(&self, id: &str) -> Option<f64> {
        self.iter().find(|(key, _)| key == id).map(|(_, top)| *top)
    }
}

impl HeadingPositions for Vec<(String, f64)> {
    fn top_of(&self, id: &str) -> Option<f64> {
        self.as_slice().top_of(id)
    }
}

/// Layout that has not placed anything yet.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoLayout;

impl HeadingPositions for NoLayout {
    fn top_of(&self, _id: &str) -> Option<f64> {
        None
    }
}

/// Pick the active entry for one scroll sample.
///
/// # Example
///
/// ```
/// use std::collections::HashMap;
/// use blockpress::outline::{Outline, OutlineEntry};
/// use blockpress::scroll::active_entry;
///
/// let entry = |id: &str| OutlineEntry { id: id.into(), text: id.into(), level: 2 };
/// let outline = Outline::new(vec![entry("a"), entry("b"), entry("c")]);
/// let positions = HashMap::from([
///     ("a".to_string(), 0.0),
///     ("b".to_string(), 400.0),
///     ("c".to_string(), 900.0),
/// ]);
///
/// let active = active_entry(&outline, &positions, 500.0, 100.0).unwrap();
/// assert_eq!(active.id, "b");
/// ```
pub fn active_entry<'a, P>(
    outline: &'a Outline,
    positions: &P,
    scroll: f64,
    threshold: f64,
) -> Option<&'a OutlineEntry>
where
    P: HeadingPositions + ?Sized,
{
    let limit = scroll + threshold;
    outline
        .entries()
        .iter()
        .rev()
        .find(|entry| positions.top_of(&entry.id).is_some_and(|top| top <= limit))
}

/// Active-section state machine: `None` or one outline id.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollSyncTracker {
    threshold: f64,
    active: Option<String>,
    recomputations: u64,
}

impl Default for ScrollSyncTracker {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD_PX)
    }
}

impl ScrollSyncTracker {
    pub const fn new(threshold: f64) -> Self {
        Self {
            threshold,
            active: None,
            recomputations: 0,
        }
    }

    /// Id of the active outline entry, if any.
    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub const fn threshold(&self) -> f64 {
        self.threshold
    }

    /// How many samples have been evaluated.
    pub const fn recomputations(&self) -> u64 {
        self.recomputations
    }

    /// Evaluate one scroll sample. Returns true if the active section changed.
    pub fn apply<P>(&mut self, outline: &Outline, positions: &P, scroll: f64) -> bool
    where
        P: HeadingPositions + ?Sized,
    {
        self.recomputations += 1;
        let next = active_entry(outline, positions, scroll, self.threshold).map(|e| e.id.clone());
        if next == self.active {
            return false;
        }
        tracing::trace!(from = ?self.active, to = ?next, scroll, "active section changed");
        self.active = next;
        true
    }

    /// Drop the active section if `outline` no longer contains it.
    pub fn retain_valid(&mut self, outline: &Outline) {
        if self
            .active
            .as_deref()
            .is_some_and(|id| !outline.contains(id))
        {
            self.active = None;
        }
    }

    /// Back to the initial state.
    pub fn reset(&mut self) {
        self.active = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outline(ids: &[&str]) -> Outline {
        Outline::new(
            ids.iter()
                .map(|id| OutlineEntry {
                    id: (*id).to_string(),
                    text: id.to_uppercase(),
                    level: 2,
                })
                .collect(),
        )
    }

    fn positions(pairs: &[(&str, f64)]) -> HashMap<String, f64> {
        pairs
            .iter()
            .map(|(id, top)| ((*id).to_string(), *top))
            .collect()
    }

    #[test]
    fn test_initial_state_is_none() {
        let tracker = ScrollSyncTracker::default();
        assert_eq!(tracker.active(), None);
        assert_eq!(tracker.recomputations(), 0);
    }

    #[test]
    fn test_picks_last_heading_above_threshold() {
        let outline = outline(&["a", "b", "c"]);
        let layout = positions(&[("a", 0.0), ("b", 400.0), ("c", 900.0)]);
        let mut tracker = ScrollSyncTracker::new(100.0);
        assert!(tracker.apply(&outline, &layout, 500.0));
        assert_eq!(tracker.active(), Some("b"));
    }

    #[test]
    fn test_boundary_is_inclusive() {
        let outline = outline(&["a", "b"]);
        let layout = positions(&[("a", 0.0), ("b", 600.0)]);
        let mut tracker = ScrollSyncTracker::new(100.0);
        tracker.apply(&outline, &layout, 500.0);
        assert_eq!(tracker.active(), Some("b"));
    }

    #[test]
    fn test_nothing_above_threshold_is_none() {
        let outline = outline(&["a"]);
        let layout = positions(&[("a", 800.0)]);
        let mut tracker = ScrollSyncTracker::new(120.0);
        tracker.apply(&outline, &layout, 0.0);
        assert_eq!(tracker.active(), None);
    }

    #[test]
    fn test_unplaced_headings_are_skipped() {
        let outline = outline(&["a", "b", "c"]);
        let layout = positions(&[("a", 0.0), ("c", 2000.0)]);
        let mut tracker = ScrollSyncTracker::new(100.0);
        tracker.apply(&outline, &layout, 1000.0);
        assert_eq!(tracker.active(), Some("a"));
    }

    #[test]
    fn test_scrolling_back_up_moves_active_back() {
        let outline = outline(&["a", "b", "c"]);
        let layout = positions(&[("a", 0.0), ("b", 400.0), ("c", 900.0)]);
        let mut tracker = ScrollSyncTracker::new(100.0);
        tracker.apply(&outline, &layout, 1000.0);
        assert_eq!(tracker.active(), Some("c"));
        tracker.apply(&outline, &layout, 100.0);
        assert_eq!(tracker.active(), Some("a"));
    }

    #[test]
    fn test_apply_reports_unchanged() {
        let outline = outline(&["a"]);
        let layout = positions(&[("a", 0.0)]);
        let mut tracker = ScrollSyncTracker::default();
        assert!(tracker.apply(&outline, &layout, 10.0));
        assert!(!tracker.apply(&outline, &layout, 20.0));
        assert_eq!(tracker.recomputations(), 2);
    }

    #[test]
    fn test_empty_outline_stays_none() {
        let mut tracker = ScrollSyncTracker::default();
        assert!(!tracker.apply(&Outline::default(), &NoLayout, 300.0));
        assert_eq!(tracker.active(), None);
    }

    #[test]
    fn test_retain_valid_clears_stale_id() {
        let mut tracker = ScrollSyncTracker::default();
        tracker.apply(&outline(&["old"]), &positions(&[("old", 0.0)]), 0.0);
        tracker.retain_valid(&outline(&["new"]));
        assert_eq!(tracker.active(), None);
    }

    #[test]
    fn test_slice_positions() {
        let outline = outline(&["a", "b"]);
        let layout = vec![("a".to_string(), 0.0), ("b".to_string(), 50.0)];
        assert_eq!(active_entry(&outline, &layout, 0.0, 60.0).map(|e| e.id.as_str()), Some("b"));
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn active_is_always_an_outline_id(
                tops in proptest::collection::vec(0.0f64..5000.0, 0..12),
                scroll in 0.0f64..6000.0,
            ) {
                let ids: Vec<String> = (0..tops.len()).map(|i| format!("h{i}")).collect();
                let id_refs: Vec<&str> = ids.iter().map(String::as_str).collect();
                let outline = outline(&id_refs);
                let layout: HashMap<String, f64> = ids.iter().cloned().zip(tops.iter().copied()).collect();
                let mut tracker = ScrollSyncTracker::default();
                tracker.apply(&outline, &layout, scroll);
                if let Some(active) = tracker.active() {
                    prop_assert!(outline.contains(active));
                    let top = layout[active];
                    prop_assert!(top <= scroll + DEFAULT_THRESHOLD_PX);
                }
            }
        }
    }
}
