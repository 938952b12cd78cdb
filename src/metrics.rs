//! Commit decision counters
//!
//! Plain process-local counters over the dispatcher's decisions, read
//! through [`CoordinatorMetrics::snapshot`].

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters accumulated by the dispatcher.
#[derive(Debug, Default)]
pub struct CoordinatorMetrics {
    /// Stages announced as live.
    pub stages_started: AtomicU64,
    /// Stages retired.
    pub stages_ended: AtomicU64,
    /// Commit permissions granted.
    pub commits_granted: AtomicU64,
    /// Commit permissions denied.
    pub commits_denied: AtomicU64,
    /// Commit slots released after a holder's failure.
    pub locks_released: AtomicU64,
    /// Events dropped: malformed payloads or sends after shutdown.
    pub events_dropped: AtomicU64,
}

impl CoordinatorMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_stage_started(&self) {
        self.stages_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_stage_ended(&self) {
        self.stages_ended.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_decision(&self, granted: bool) {
        if granted {
            self.commits_granted.fetch_add(1, Ordering::Relaxed);
        } else {
            self.commits_denied.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_lock_released(&self) {
        self.locks_released.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_event_dropped(&self) {
        self.events_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Consistent-enough point-in-time copy of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            stages_started: self.stages_started.load(Ordering::Relaxed),
            stages_ended: self.stages_ended.load(Ordering::Relaxed),
            commits_granted: self.commits_granted.load(Ordering::Relaxed),
            commits_denied: self.commits_denied.load(Ordering::Relaxed),
            locks_released: self.locks_released.load(Ordering::Relaxed),
            events_dropped: self.events_dropped.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time view of the coordinator counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub stages_started: u64,
    pub stages_ended: u64,
    pub commits_granted: u64,
    pub commits_denied: u64,
    pub locks_released: u64,
    pub events_dropped: u64,
}
