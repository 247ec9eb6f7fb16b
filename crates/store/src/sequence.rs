//! Request ordering guards for screens that issue overlapping loads.
//!
//! A screen that re-fetches on every keystroke must only apply the response
//! to its latest request; a screen running a bulk action must not start a
//! second one until the first finishes.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Hands out monotonically increasing tickets; only the newest is current.
#[derive(Debug, Default)]
pub struct RequestSequencer {
    latest: AtomicU64,
}

impl RequestSequencer {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            latest: AtomicU64::new(0),
        }
    }

    /// Start a request. Any earlier ticket stops being current.
    pub fn issue(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Whether no newer request has been issued since `ticket`.
    #[must_use]
    pub fn is_current(&self, ticket: u64) -> bool {
        self.latest.load(Ordering::Acquire) == ticket
    }
}

/// At most one holder at a time.
#[derive(Debug, Default)]
pub struct BusyFlag {
    busy: AtomicBool,
}

/// Releases the [`BusyFlag`] on drop.
#[derive(Debug)]
pub struct BusyGuard<'a> {
    flag: &'a BusyFlag,
}

impl BusyFlag {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            busy: AtomicBool::new(false),
        }
    }

    /// Take the flag, or `None` when another operation holds it.
    pub fn try_acquire(&self) -> Option<BusyGuard<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BusyGuard { flag: self })
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.flag.busy.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_latest_ticket_is_current() {
        let seq = RequestSequencer::new();
        let first = seq.issue();
        let second = seq.issue();
        assert!(!seq.is_current(first));
        assert!(seq.is_current(second));
    }

    #[test]
    fn test_busy_flag_is_exclusive() {
        let flag = BusyFlag::new();
        let guard = flag.try_acquire();
        assert!(guard.is_some());
        assert!(flag.is_busy());
        assert!(flag.try_acquire().is_none());
        drop(guard);
        assert!(!flag.is_busy());
        assert!(flag.try_acquire().is_some());
    }
}
