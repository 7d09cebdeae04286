//! The blog index: filtered, paginated post cards.

use std::cell::RefCell;
use std::rc::Rc;

use crate::document::PostSummary;
use crate::pagination::{DEFAULT_PAGE_SIZE, PageWindow, paginate};
use crate::signal::{Signal, Subscription};

/// One change to the listing parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingChange {
    Page(usize),
    Query(String),
    Category(Option<String>),
    PageSize(usize),
}

/// Current listing parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingParams {
    pub page: usize,
    pub page_size: usize,
    pub query: String,
    pub category: Option<String>,
}

impl Default for ListingParams {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            query: String::new(),
            category: None,
        }
    }
}

impl ListingParams {
    /// Apply `change`. A new query, category or page size starts over at
    /// page 1.
    pub fn apply(&mut self, change: ListingChange) {
        match change {
            ListingChange::Page(page) => self.page = page,
            ListingChange::Query(query) => {
                if query != self.query {
                    self.query = query;
                    self.page = 1;
                }
            }
            ListingChange::Category(category) => {
                if category != self.category {
                    self.category = category;
                    self.page = 1;
                }
            }
            ListingChange::PageSize(size) => {
                let size = size.max(1);
                if size != self.page_size {
                    self.page_size = size;
                    self.page = 1;
                }
            }
        }
    }
}

/// Posts matching `query` and `category`, in their original order.
///
/// The query is split on whitespace; every term must appear
/// (case-insensitively) in the title, description or category. The category
/// filter is an exact, case-insensitive match.
pub fn filter_posts<'a>(
    posts: &'a [PostSummary],
    query: &str,
    category: Option<&str>,
) -> Vec<&'a PostSummary> {
    let filter = PostFilter::new(query, category);
    posts.iter().filter(|post| filter.matches(post)).collect()
}

struct PostFilter<'a> {
    terms: Vec<String>,
    category: Option<&'a str>,
}

impl<'a> PostFilter<'a> {
    fn new(query: &str, category: Option<&'a str>) -> Self {
        Self {
            terms: query.split_whitespace().map(str::to_lowercase).collect(),
            category,
        }
    }

    fn matches(&self, post: &PostSummary) -> bool {
        let category_ok = self.category.is_none_or(|wanted| {
            post.category
                .as_deref()
                .is_some_and(|have| have.eq_ignore_ascii_case(wanted))
        });
        if !category_ok {
            return false;
        }
        if self.terms.is_empty() {
            return true;
        }
        let haystack = [
            post.title.as_str(),
            post.description.as_deref().unwrap_or_default(),
            post.category.as_deref().unwrap_or_default(),
        ]
        .join(" ")
        .to_lowercase();
        self.terms.iter().all(|term| haystack.contains(term.as_str()))
    }
}

struct ListingState {
    posts: Vec<PostSummary>,
    params: ListingParams,
    matched: Vec<usize>,
    window: PageWindow,
    recomputations: u64,
}

impl ListingState {
    fn recompute(&mut self) {
        let _scope = crate::perf::scope("listing.window");
        let filter = PostFilter::new(&self.params.query, self.params.category.as_deref());
        self.matched = self
            .posts
            .iter()
            .enumerate()
            .filter(|(_, post)| filter.matches(post))
            .map(|(index, _)| index)
            .collect();
        self.window = paginate(self.matched.len(), self.params.page_size, self.params.page);
        if !self.window.is_empty() {
            self.params.page = self.window.current_page();
        }
        self.recomputations += 1;
        tracing::debug!(
            matched = self.matched.len(),
            page = self.window.current_page(),
            total_pages = self.window.total_pages(),
            "listing recomputed"
        );
    }
}

/// The blog index bound to a listing-parameter signal.
pub struct ListingView {
    state: Rc<RefCell<ListingState>>,
    subscription: Option<Subscription>,
}

impl std::fmt::Debug for ListingView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("ListingView")
            .field("posts", &state.posts.len())
            .field("params", &state.params)
            .field("attached", &self.subscription.is_some())
            .finish_non_exhaustive()
    }
}

impl ListingView {
    /// Take ownership of `posts` and recompute on every `changes` emission.
    pub fn attach(
        posts: Vec<PostSummary>,
        params: ListingParams,
        changes: &Signal<ListingChange>,
    ) -> Self {
        let mut state = ListingState {
            posts,
            params,
            matched: Vec::new(),
            window: PageWindow::empty(),
            recomputations: 0,
        };
        state.recompute();
        let state = Rc::new(RefCell::new(state));

        let subscription = {
            let state = Rc::clone(&state);
            changes.subscribe(move |change: &ListingChange| {
                let mut state = state.borrow_mut();
                state.params.apply(change.clone());
                state.recompute();
            })
        };

        Self {
            state,
            subscription: Some(subscription),
        }
    }

    pub fn params(&self) -> ListingParams {
        self.state.borrow().params.clone()
    }

    pub fn window(&self) -> PageWindow {
        self.state.borrow().window.clone()
    }

    /// Number of posts passing the current filter.
    pub fn matched(&self) -> usize {
        self.state.borrow().matched.len()
    }

    /// Posts on the current page.
    pub fn page_items(&self) -> Vec<PostSummary> {
        let state = self.state.borrow();
        state
            .window
            .items(&state.matched)
            .iter()
            .map(|&index| state.posts[index].clone())
            .collect()
    }

    pub fn recomputations(&self) -> u64 {
        self.state.borrow().recomputations
    }

    pub fn detach(&mut self) {
        self.subscription = None;
    }

    pub fn is_attached(&self) -> bool {
        self.subscription.is_some()
    }

    /// Cards for the current page followed by the pager.
    pub fn render(&self) -> String {
        let window = self.window();
        let mut html = String::from("<section class=\"post-list\">\n");
        for post in self.page_items() {
            html.push_str(&super::chrome::render_card(&post));
        }
        html.push_str("</section>\n");
        html.push_str(&super::chrome::render_pager(&window));
        html
    }
}
