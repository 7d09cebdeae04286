//! Latest-wins coalescing of high-frequency samples.

/// Holds at most one pending sample. Offering a new sample replaces the old
/// one; the frame callback takes whatever is newest.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameThrottle<T> {
    pending: Option<T>,
    dropped: u64,
}

impl<T> Default for FrameThrottle<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FrameThrottle<T> {
    pub const fn new() -> Self {
        Self {
            pending: None,
            dropped: 0,
        }
    }

    /// Queue `sample`, superseding any sample not yet taken.
    pub fn offer(&mut self, sample: T) {
        if self.pending.replace(sample).is_some() {
            self.dropped += 1;
        }
    }

    /// Take the newest sample, if one arrived since the last take.
    pub fn take(&mut self) -> Option<T> {
        self.pending.take()
    }

    pub const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Discard the pending sample without applying it.
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    /// Samples superseded before they were applied.
    pub const fn dropped(&self) -> u64 {
        self.dropped
    }
}
