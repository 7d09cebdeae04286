//! Views binding the engine to its input signals.
//!
//! A view subscribes to the signals it depends on and owns the resulting
//! state. Dropping (or detaching) a view releases its subscriptions.

pub mod chrome;
mod document;
mod listing;

pub use document::DocumentView;
pub use listing::{ListingChange, ListingParams, ListingView, filter_posts};
