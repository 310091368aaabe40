//! Per-resource request tokens.
//!
//! Every resource the orchestrators fetch owns one token cell. A fetch
//! takes a fresh token before the await and checks it after: if a newer
//! request was issued in the meantime, the resolving response is stale
//! and must be discarded instead of applied. This is the guard the
//! original design only had on the root deal fetch, generalized to every
//! resource.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct RequestToken {
    latest: AtomicU64,
}

impl RequestToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new request, superseding any in flight.
    pub fn issue(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// True while `token` is still the newest issued request.
    pub fn is_current(&self, token: u64) -> bool {
        self.latest.load(Ordering::SeqCst) == token
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_newer_issue_supersedes_the_older() {
        let cell = RequestToken::new();
        let first = cell.issue();
        assert!(cell.is_current(first));

        let second = cell.issue();
        assert!(!cell.is_current(first));
        assert!(cell.is_current(second));
    }
}
