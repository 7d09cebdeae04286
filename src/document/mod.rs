//! Block documents and their compilation to markup.
//!
//! This module handles:
//! - Decoding block records and post metadata
//! - Transcoding each block to an HTML fragment
//! - Compiling a block list with unique heading anchors
//! - Loading posts and the blog index from disk

mod block;
mod compiler;
mod load;
mod slug;
mod transcode;
mod types;

pub use block::{
    Block, BlockContent, ChecklistBlock, ChecklistItem, CodeBlock, DEFAULT_HEADER_LEVEL,
    EmbedBlock, HeaderBlock, ImageBlock, ListBlock, ListItem, ListStyle, ParagraphBlock,
    QuoteBlock, RawBlock, TableBlock,
};
pub use compiler::{CompileCache, CompiledDocument, Compiler};
pub use load::{LoadError, load_document, load_index, parse_document};
pub use slug::{HeadingIdStrategy, HeadingIds, Slugify, slugify};
pub use transcode::{BlockContext, transcode_block};
pub use types::{Document, DocumentIdentity, PostSummary, RelatedEntity};
