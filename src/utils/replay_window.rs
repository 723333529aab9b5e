//! Receive-side sequence tracking for replay protection.
//!
//! Each channel keeps one window per direction. A sequence number is accepted
//! at most once; anything older than the window is refused outright. Entries
//! below the window floor are dropped as the window advances, so memory is
//! bounded by the window size.

use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Default reorder tolerance for datagram transports
pub const DEFAULT_WINDOW_SIZE: u32 = 100;

/// How strictly incoming sequence numbers must increase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayPolicy {
    /// Every accepted sequence must exceed the last accepted one
    StrictMonotonic,
    /// Unseen sequences within `size` of the highest accepted are allowed
    Window { size: u32 },
}

impl Default for ReplayPolicy {
    fn default() -> Self {
        ReplayPolicy::Window {
            size: DEFAULT_WINDOW_SIZE,
        }
    }
}

/// Anti-replay window for one channel direction
#[derive(Debug, Clone)]
pub struct SequenceWindow {
    policy: ReplayPolicy,
    /// Highest sequence accepted so far
    highest: Option<u32>,
    /// Accepted sequences still inside the window
    seen: BTreeSet<u32>,
    accepted: u64,
    rejected: u64,
}

impl SequenceWindow {
    /// Create an empty window. A window size of 0 is treated as 1.
    pub fn new(policy: ReplayPolicy) -> Self {
        let policy = match policy {
            ReplayPolicy::Window { size } => ReplayPolicy::Window { size: size.max(1) },
            strict => strict,
        };
        Self {
            policy,
            highest: None,
            seen: BTreeSet::new(),
            accepted: 0,
            rejected: 0,
        }
    }

    /// Check a sequence number and record it if fresh.
    ///
    /// Returns `true` if the packet should be accepted, `false` if it is a
    /// replay or too old.
    pub fn check_and_record(&mut self, sequence: u32) -> bool {
        let fresh = match (self.policy, self.highest) {
            (_, None) => true,
            (ReplayPolicy::StrictMonotonic, Some(highest)) => sequence > highest,
            (ReplayPolicy::Window { size }, Some(highest)) => {
                if sequence > highest {
                    true
                } else if highest - sequence >= size {
                    debug!(sequence, highest, size, "Sequence below receive window");
                    false
                } else {
                    !self.seen.contains(&sequence)
                }
            }
        };

        if !fresh {
            self.rejected += 1;
            warn!(sequence, highest = ?self.highest, "Replayed or stale sequence rejected");
            return false;
        }

        self.record(sequence);
        true
    }

    fn record(&mut self, sequence: u32) {
        self.accepted += 1;
        let highest = self.highest.map_or(sequence, |h| h.max(sequence));
        self.highest = Some(highest);

        if let ReplayPolicy::Window { size } = self.policy {
            self.seen.insert(sequence);
            let floor = highest.saturating_sub(size - 1);
            if self.seen.first().is_some_and(|&lowest| lowest < floor) {
                self.seen = self.seen.split_off(&floor);
            }
        }
    }

    /// Highest sequence accepted so far
    pub fn highest(&self) -> Option<u32> {
        self.highest
    }

    /// Policy this window enforces
    pub fn policy(&self) -> ReplayPolicy {
        self.policy
    }

    /// Get current window statistics
    pub fn stats(&self) -> WindowStats {
        WindowStats {
            tracked: self.seen.len(),
            highest: self.highest,
            accepted: self.accepted,
            rejected: self.rejected,
        }
    }
}

impl Default for SequenceWindow {
    fn default() -> Self {
        Self::new(ReplayPolicy::default())
    }
}

/// Statistics about a sequence window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowStats {
    /// Sequences currently remembered
    pub tracked: usize,
    /// Highest accepted sequence
    pub highest: Option<u32>,
    /// Total accepted
    pub accepted: u64,
    /// Total rejected
    pub rejected: u64,
}
