//! Shared page counter

use std::sync::atomic::{AtomicU64, Ordering};

/// Hands out page numbers to fetch workers
///
/// Numbers start at 1 and every call returns a value no other caller has
/// seen. The counter is advanced once per worker that gets as far as building
/// a request, not once per successful page.
#[derive(Debug, Default)]
pub struct PageCursor {
    position: AtomicU64,
}

impl PageCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next page number
    pub fn next(&self) -> u64 {
        self.position.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Number of page numbers handed out so far
    pub fn issued(&self) -> u64 {
        self.position.load(Ordering::SeqCst)
    }
}
