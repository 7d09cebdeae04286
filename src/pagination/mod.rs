//! Bounded, ellipsis-compressed pagination.
//!
//! Up to [`MAX_UNCOMPRESSED_PAGES`] pages are listed in full. Past that the
//! pager shows the first and last page, a window of [`NEIGHBORS`] pages on
//! either side of the current one, and ellipsis markers for the gaps.

use std::fmt;
use std::ops::Range;

/// Largest page count rendered without ellipses.
pub const MAX_UNCOMPRESSED_PAGES: usize = 7;

/// Pages shown on each side of the current page in compressed mode.
pub const NEIGHBORS: usize = 2;

/// Items per page on the blog index.
pub const DEFAULT_PAGE_SIZE: usize = 9;

/// One slot in the pager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageIndicator {
    Page(usize),
    Ellipsis,
}

impl fmt::Display for PageIndicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Page(n) => write!(f, "{n}"),
            Self::Ellipsis => f.write_str("..."),
        }
    }
}

/// Pager state for one `(total_items, page_size, current_page)` triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageWindow {
    indicators: Vec<PageIndicator>,
    current_page: usize,
    total_pages: usize,
    item_range: Range<usize>,
}

impl PageWindow {
    /// Window with no pages and no items.
    pub const fn empty() -> Self {
        Self {
            indicators: Vec::new(),
            current_page: 0,
            total_pages: 0,
            item_range: 0..0,
        }
    }

    pub fn indicators(&self) -> &[PageIndicator] {
        &self.indicators
    }

    /// Current page, clamped into `[1, total_pages]`; 0 when there are no
    /// pages.
    pub const fn current_page(&self) -> usize {
        self.current_page
    }

    pub const fn total_pages(&self) -> usize {
        self.total_pages
    }

    /// Index range of the items on the current page.
    pub fn item_range(&self) -> Range<usize> {
        self.item_range.clone()
    }

    /// The current page's slice of `items`.
    ///
    /// `items` should be the list the window was computed for; a shorter
    /// slice is truncated rather than panicking.
    pub fn items<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let end = self.item_range.end.min(items.len());
        let start = self.item_range.start.min(end);
        &items[start..end]
    }

    /// True when there is nothing to page through ("no results").
    pub const fn is_empty(&self) -> bool {
        self.total_pages == 0
    }

    pub const fn has_previous(&self) -> bool {
        self.current_page > 1
    }

    pub const fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }
}

/// Compute the pager for `total_items` split into pages of `page_size`.
///
/// A `page_size` of zero is treated as one. `current_page` is clamped.
///
/// # Example
///
/// ```
/// use blockpress::pagination::{paginate, PageIndicator::{Ellipsis, Page}};
///
/// let window = paginate(200, 9, 10);
/// assert_eq!(window.total_pages(), 23);
/// assert_eq!(
///     window.indicators(),
///     &[Page(1), Ellipsis, Page(8), Page(9), Page(10), Page(11), Page(12), Ellipsis, Page(23)]
/// );
/// ```
pub fn paginate(total_items: usize, page_size: usize, current_page: usize) -> PageWindow {
    let page_size = page_size.max(1);
    let total_pages = total_items.div_ceil(page_size);
    if total_pages == 0 {
        return PageWindow::empty();
    }

    let current_page = current_page.clamp(1, total_pages);
    let start = (current_page - 1) * page_size;
    let end = (start + page_size).min(total_items);

    PageWindow {
        indicators: indicators(total_pages, current_page),
        current_page,
        total_pages,
        item_range: start..end,
    }
}

fn indicators(total_pages: usize, current_page: usize) -> Vec<PageIndicator> {
    if total_pages <= MAX_UNCOMPRESSED_PAGES {
        return (1..=total_pages).map(PageIndicator::Page).collect();
    }

    let mut out = Vec::with_capacity(2 * NEIGHBORS + 5);
    out.push(PageIndicator::Page(1));
    if current_page > NEIGHBORS + 2 {
        out.push(PageIndicator::Ellipsis);
    }
    let window_start = current_page.saturating_sub(NEIGHBORS).max(2);
    let window_end = (current_page + NEIGHBORS).min(total_pages - 1);
    out.extend((window_start..=window_end).map(PageIndicator::Page));
    if current_page + NEIGHBORS + 1 < total_pages {
        out.push(PageIndicator::Ellipsis);
    }
    out.push(PageIndicator::Page(total_pages));
    out
}
