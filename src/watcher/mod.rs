//! Live reload of a post file.
//!
//! Uses the notify crate for file system events. Changes are debounced, then
//! the post is reloaded and pushed into the document signal, which is the
//! only way a view learns about it.
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::time::{Duration, Instant};

use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};

use crate::document::{Document, LoadError, load_document};
use crate::signal::Signal;

/// Debounce used by `render --watch`.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(200);

/// The file a watcher cares about, in the forms OS events may name it.
#[derive(Debug, Clone)]
struct WatchTarget {
    root: PathBuf,
    path: PathBuf,
    name: Option<OsString>,
}

impl WatchTarget {
    fn new(path: &Path) -> Self {
        // Event paths from the OS are absolute and canonical.
        let path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        let name = path.file_name().map(std::ffi::OsStr::to_os_string);
        let root = watch_root_for(&path);
        Self { root, path, name }
    }

    /// Many backends only report the directory, so a directory-level event
    /// counts too.
    fn is_touched_by(&self, event: &Event) -> bool {
        event.paths.iter().any(|path| {
            path == &self.root
                || path == &self.path
                || self
                    .name
                    .as_ref()
                    .is_some_and(|name| path.file_name().is_some_and(|f| f == name))
        })
    }
}

/// Watches one post file and reloads it after a debounced change.
pub struct DocumentWatcher {
    _watcher: RecommendedWatcher,
    rx: Receiver<notify::Result<Event>>,
    target: WatchTarget,
    debounce: Duration,
    pending_since: Option<Instant>,
}

impl std::fmt::Debug for DocumentWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentWatcher")
            .field("target", &self.target.path)
            .field("debounce", &self.debounce)
            .field("pending", &self.pending_since.is_some())
            .finish_non_exhaustive()
    }
}

impl DocumentWatcher {
    /// Start watching `path`.
    ///
    /// # Errors
    /// Returns an error if the file watcher cannot be created or the
    /// containing directory cannot be watched.
    pub fn new(path: impl AsRef<Path>, debounce: Duration) -> notify::Result<Self> {
        let target = WatchTarget::new(path.as_ref());

        let (tx, rx) = mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = tx.send(res);
        })?;
        watcher.watch(&target.root, RecursiveMode::NonRecursive)?;
        tracing::debug!(path = %target.path.display(), "watching post file");

        Ok(Self {
            _watcher: watcher,
            rx,
            target,
            debounce,
            pending_since: None,
        })
    }

    /// Canonical path of the watched file.
    pub fn target_path(&self) -> &Path {
        &self.target.path
    }

    /// Drain queued events. Returns true once a change has settled for the
    /// debounce period.
    pub fn take_change_ready(&mut self) -> bool {
        let mut relevant = 0u32;
        let mut irrelevant = 0u32;
        while let Ok(event) = self.rx.try_recv() {
            match event {
                Ok(ev) if self.target.is_touched_by(&ev) => relevant += 1,
                Ok(ev) => {
                    irrelevant += 1;
                    crate::perf::log_event(
                        "watcher.irrelevant",
                        format!("kind={:?} paths={:?}", ev.kind, ev.paths),
                    );
                }
                Err(err) => {
                    tracing::warn!(%err, "file watcher error");
                    crate::perf::log_event("watcher.error", err.to_string());
                }
            }
        }

        if relevant + irrelevant > 0 {
            crate::perf::log_event(
                "watcher.poll",
                format!(
                    "relevant={relevant} irrelevant={irrelevant} target={}",
                    self.target.path.display()
                ),
            );
        }
        if relevant > 0 {
            self.pending_since = Some(Instant::now());
        }

        let Some(pending_since) = self.pending_since else {
            return false;
        };
        if pending_since.elapsed() >= self.debounce {
            self.pending_since = None;
            return true;
        }
        false
    }

    /// Reload the post if a debounced change is ready.
    pub fn poll(&mut self) -> Option<Result<Document, LoadError>> {
        if !self.take_change_ready() {
            return None;
        }
        Some(load_document(&self.target.path))
    }

    /// Reload on change and emit the new document on `documents`.
    ///
    /// A file that fails to load mid-save is reported and skipped; the
    /// previous document stays on screen.
    pub fn poll_into(&mut self, documents: &Signal<Document>) -> bool {
        match self.poll() {
            Some(Ok(doc)) => {
                tracing::debug!(doc = %doc.id, "post reloaded");
                documents.emit(&doc);
                true
            }
            Some(Err(err)) => {
                tracing::warn!(error = %err, "reload failed, keeping previous document");
                false
            }
            None => false,
        }
    }
}

fn watch_root_for(path: &Path) -> PathBuf {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}
