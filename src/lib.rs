// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. document::DocumentView)
    clippy::module_name_repetitions
)]

//! # Blockpress
//!
//! A content presentation engine for block-structured blog posts.
//!
//! Blockpress turns a post's ordered block list into HTML and keeps the
//! reading chrome in sync with it:
//! - Block transcoding (headers, lists, embeds, tables, code, ...)
//! - Document compilation with unique heading anchors
//! - Outline extraction for the navigation sidebar
//! - Scroll-synchronized active-section tracking
//! - Ellipsis-compressed pagination for the blog index
//!
//! ## Architecture
//!
//! Each external input is a [`signal::Signal`]:
//! - **Document change**: recompiles (cached by identity) and re-extracts
//!   the outline
//! - **Scroll sample**: coalesced per frame, updates the active section only
//! - **Listing parameters**: recomputes the page window only
//!
//! Views in [`view`] subscribe to these signals and release their
//! subscriptions when dropped.
//!
//! ## Modules
//!
//! - [`document`]: Block model, transcoder, compiler and loaders
//! - [`outline`]: Heading outline extraction
//! - [`scroll`]: Active-section tracking and frame throttling
//! - [`pagination`]: Page window computation
//! - [`view`]: Signal-bound views and page chrome
//! - [`highlight`]: Syntax highlighting for code blocks
//! - [`watcher`]: File watching for live reload
//! - [`config`]: Saved command-line defaults

pub mod config;
pub mod document;
pub mod highlight;
pub mod html;
pub mod outline;
pub mod pagination;
pub mod perf;
pub mod scroll;
pub mod signal;
pub mod view;
pub mod watcher;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::document::{Block, CompileCache, Compiler, Document, PostSummary};
    pub use crate::outline::{Outline, OutlineEntry, extract_outline};
    pub use crate::pagination::{PageIndicator, PageWindow, paginate};
    pub use crate::scroll::{FrameThrottle, HeadingPositions, ScrollSyncTracker};
    pub use crate::signal::{Signal, Subscription};
    pub use crate::view::{DocumentView, ListingChange, ListingParams, ListingView};
}
