//! Engine counters
//!
//! Counters only, monotonic, reset on process start.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

#[derive(Debug, Default)]
pub struct MetricsRegistry {
    sweeps_run: AtomicU64,
    transitions_committed: AtomicU64,
    transition_failures: AtomicU64,
    signups_accepted: AtomicU64,
    signups_rejected: AtomicU64,
    removals: AtomicU64,
    waitlist_promotions: AtomicU64,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_sweeps(&self) {
        self.sweeps_run.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_transitions(&self) {
        self.transitions_committed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_transition_failures(&self) {
        self.transition_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_signups_accepted(&self) {
        self.signups_accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_signups_rejected(&self) {
        self.signups_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_removals(&self) {
        self.removals.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_waitlist_promotions(&self) {
        self.waitlist_promotions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            sweeps_run: self.sweeps_run.load(Ordering::Relaxed),
            transitions_committed: self.transitions_committed.load(Ordering::Relaxed),
            transition_failures: self.transition_failures.load(Ordering::Relaxed),
            signups_accepted: self.signups_accepted.load(Ordering::Relaxed),
            signups_rejected: self.signups_rejected.load(Ordering::Relaxed),
            removals: self.removals.load(Ordering::Relaxed),
            waitlist_promotions: self.waitlist_promotions.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time copy of all counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub sweeps_run: u64,
    pub transitions_committed: u64,
    pub transition_failures: u64,
    pub signups_accepted: u64,
    pub signups_rejected: u64,
    pub removals: u64,
    pub waitlist_promotions: u64,
}
