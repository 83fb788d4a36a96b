//! Latest-wins bookkeeping for callers that issue overlapping requests.
//!
//! Format calls can complete out of order. A caller takes a ticket before
//! each request and drops any response whose ticket is no longer the
//! latest one issued.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct RequestSequence {
    latest: AtomicU64,
}

impl RequestSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new ticket. Tickets start at 1 and only increase.
    pub fn next(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::SeqCst).saturating_add(1)
    }

    /// True if no ticket has been issued after `ticket`.
    pub fn is_latest(&self, ticket: u64) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket
    }

    pub fn latest(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }
}
