//! Reading posts and the blog index from disk.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use super::types::{Document, PostSummary};

/// Why a post or index file could not be loaded.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON in {path}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid JSON5 in {path}")]
    Json5 {
        path: PathBuf,
        #[source]
        source: json5::Error,
    },
}

/// An index file is either a bare list of posts or `{ "posts": [..] }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum IndexFile {
    List(Vec<PostSummary>),
    Wrapped { posts: Vec<PostSummary> },
}

/// Parse a post record from a JSON string.
///
/// # Errors
/// Returns the JSON error if `source` is not valid JSON. A record with
/// missing or malformed fields still parses; see [`Document`].
pub fn parse_document(source: &str) -> serde_json::Result<Document> {
    serde_json::from_str(source)
}

/// Load one post. Files ending in `.json5` are parsed as JSON5.
///
/// # Errors
/// Returns [`LoadError`] if the file cannot be read or parsed.
pub fn load_document(path: impl AsRef<Path>) -> Result<Document, LoadError> {
    let _scope = crate::perf::scope("load.document");
    load(path.as_ref())
}

/// Load the blog index used by the listing view.
///
/// # Errors
/// Returns [`LoadError`] if the file cannot be read or parsed.
pub fn load_index(path: impl AsRef<Path>) -> Result<Vec<PostSummary>, LoadError> {
    let _scope = crate::perf::scope("load.index");
    Ok(match load::<IndexFile>(path.as_ref())? {
        IndexFile::List(posts) | IndexFile::Wrapped { posts } => posts,
    })
}

fn load<T: DeserializeOwned>(path: &Path) -> Result<T, LoadError> {
    let source = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if is_json5(path) {
        json5::from_str(&source).map_err(|source| LoadError::Json5 {
            path: path.to_path_buf(),
            source,
        })
    } else {
        serde_json::from_str(&source).map_err(|source| LoadError::Json {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn is_json5(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json5"))
}
