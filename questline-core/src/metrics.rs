//! Runtime counters for the quest lifecycle.
//!
//! Lock-free `AtomicU64` counters incremented on the tick path and read on
//! export. The session owns one set; hosts can snapshot it for dashboards.

use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic counters for quest lifecycle events.
#[derive(Debug)]
pub struct QuestCounters {
    /// Directives turned into tokens.
    pub directives_parsed: AtomicU64,
    /// Directives stripped but dropped as malformed.
    pub directives_dropped: AtomicU64,
    /// Tokens accepted as quests.
    pub quests_accepted: AtomicU64,
    /// Tokens rejected by the spawner.
    pub quests_rejected: AtomicU64,
    /// Quests moved to `Completed`.
    pub quests_completed: AtomicU64,
    /// Hand-ins aborted by a failed inventory debit.
    pub hand_in_failures: AtomicU64,
    /// Snapshot records skipped during restore.
    pub restore_skipped: AtomicU64,
}

impl QuestCounters {
    /// Create a new set of zeroed counters.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            directives_parsed: AtomicU64::new(0),
            directives_dropped: AtomicU64::new(0),
            quests_accepted: AtomicU64::new(0),
            quests_rejected: AtomicU64::new(0),
            quests_completed: AtomicU64::new(0),
            hand_in_failures: AtomicU64::new(0),
            restore_skipped: AtomicU64::new(0),
        }
    }

    /// Add `n` to `counter`.
    pub fn add(counter: &AtomicU64, n: u64) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    /// Snapshot all counters for export.
    #[must_use]
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            directives_parsed: self.directives_parsed.load(Ordering::Relaxed),
            directives_dropped: self.directives_dropped.load(Ordering::Relaxed),
            quests_accepted: self.quests_accepted.load(Ordering::Relaxed),
            quests_rejected: self.quests_rejected.load(Ordering::Relaxed),
            quests_completed: self.quests_completed.load(Ordering::Relaxed),
            hand_in_failures: self.hand_in_failures.load(Ordering::Relaxed),
            restore_skipped: self.restore_skipped.load(Ordering::Relaxed),
        }
    }
}

impl Default for QuestCounters {
    fn default() -> Self {
        Self::new()
    }
}

/// A snapshot of counter values at a point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    /// Directives turned into tokens.
    pub directives_parsed: u64,
    /// Directives dropped as malformed.
    pub directives_dropped: u64,
    /// Quests accepted.
    pub quests_accepted: u64,
    /// Tokens rejected.
    pub quests_rejected: u64,
    /// Quests completed.
    pub quests_completed: u64,
    /// Failed hand-ins.
    pub hand_in_failures: u64,
    /// Skipped restore records.
    pub restore_skipped: u64,
}

impl CounterSnapshot {
    /// Format as Prometheus-compatible text.
    #[must_use]
    pub fn to_prometheus(&self) -> String {
        let rows = [
            ("directives_parsed", "Quest directives parsed", self.directives_parsed),
            ("directives_dropped", "Malformed quest directives dropped", self.directives_dropped),
            ("quests_accepted", "Quests accepted", self.quests_accepted),
            ("quests_rejected", "Quest tokens rejected", self.quests_rejected),
            ("quests_completed", "Quests completed", self.quests_completed),
            ("hand_in_failures", "Hand-ins aborted by inventory", self.hand_in_failures),
            ("restore_skipped", "Snapshot records skipped on restore", self.restore_skipped),
        ];
        rows.iter()
            .map(|(name, help, value)| {
                format!(
                    "# HELP questline_{name}_total {help}\n\
                     # TYPE questline_{name}_total counter\n\
                     questline_{name}_total {value}\n"
                )
            })
            .collect()
    }
}
