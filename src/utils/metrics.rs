//! Observability and Metrics
//!
//! Counters for packets sealed and opened, and for every reason a packet is
//! dropped. Rejections are indistinguishable on the wire, so this is where
//! they are told apart.
//!
//! Uses atomic counters for thread-safe metrics collection.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, info};

/// Global metrics collector for channel operations
#[derive(Debug)]
pub struct Metrics {
    /// Seal attempts
    pub seal_total: AtomicU64,
    /// Packets successfully sealed
    pub seal_success: AtomicU64,
    /// Packets handed to the deserializer
    pub open_total: AtomicU64,
    /// Packets that authenticated and passed the replay check
    pub open_verified: AtomicU64,
    /// Bytes emitted by the serializer
    pub bytes_sealed: AtomicU64,
    /// Bytes handed to the deserializer
    pub bytes_opened: AtomicU64,
    /// Truncated or inconsistent framing
    pub malformed: AtomicU64,
    /// Headers declaring a mode this crate does not implement
    pub unsupported_mode: AtomicU64,
    /// AEAD tag mismatches
    pub auth_failures: AtomicU64,
    /// Authenticated packets refused by the replay window
    pub replays_rejected: AtomicU64,
    /// `get_dto` calls for the wrong type
    pub type_mismatches: AtomicU64,
    /// Start time for uptime calculation
    start_time: Instant,
}

impl Metrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            seal_total: AtomicU64::new(0),
            seal_success: AtomicU64::new(0),
            open_total: AtomicU64::new(0),
            open_verified: AtomicU64::new(0),
            bytes_sealed: AtomicU64::new(0),
            bytes_opened: AtomicU64::new(0),
            malformed: AtomicU64::new(0),
            unsupported_mode: AtomicU64::new(0),
            auth_failures: AtomicU64::new(0),
            replays_rejected: AtomicU64::new(0),
            type_mismatches: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record a seal attempt
    pub fn seal_attempt(&self) {
        self.seal_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a sealed packet
    pub fn seal_success(&self, byte_count: u64) {
        self.seal_success.fetch_add(1, Ordering::Relaxed);
        self.bytes_sealed.fetch_add(byte_count, Ordering::Relaxed);
    }

    /// Record a received packet
    pub fn open_attempt(&self, byte_count: u64) {
        self.open_total.fetch_add(1, Ordering::Relaxed);
        self.bytes_opened.fetch_add(byte_count, Ordering::Relaxed);
    }

    /// Record a verified packet
    pub fn open_verified(&self) {
        self.open_verified.fetch_add(1, Ordering::Relaxed);
    }

    pub fn malformed(&self) {
        self.malformed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn unsupported_mode(&self) {
        self.unsupported_mode.fetch_add(1, Ordering::Relaxed);
    }

    pub fn auth_failure(&self) {
        self.auth_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn replay_rejected(&self) {
        self.replays_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn type_mismatch(&self) {
        self.type_mismatches.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            seal_total: self.seal_total.load(Ordering::Relaxed),
            seal_success: self.seal_success.load(Ordering::Relaxed),
            open_total: self.open_total.load(Ordering::Relaxed),
            open_verified: self.open_verified.load(Ordering::Relaxed),
            bytes_sealed: self.bytes_sealed.load(Ordering::Relaxed),
            bytes_opened: self.bytes_opened.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
            unsupported_mode: self.unsupported_mode.load(Ordering::Relaxed),
            auth_failures: self.auth_failures.load(Ordering::Relaxed),
            replays_rejected: self.replays_rejected.load(Ordering::Relaxed),
            type_mismatches: self.type_mismatches.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }

    /// Log current metrics
    pub fn log_metrics(&self) {
        let snapshot = self.snapshot();
        info!(
            seal_total = snapshot.seal_total,
            seal_success = snapshot.seal_success,
            open_total = snapshot.open_total,
            open_verified = snapshot.open_verified,
            bytes_sealed = snapshot.bytes_sealed,
            bytes_opened = snapshot.bytes_opened,
            malformed = snapshot.malformed,
            unsupported_mode = snapshot.unsupported_mode,
            auth_failures = snapshot.auth_failures,
            replays_rejected = snapshot.replays_rejected,
            type_mismatches = snapshot.type_mismatches,
            uptime_seconds = snapshot.uptime_seconds,
            "Crypto DTO metrics snapshot"
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of metrics at a point in time
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub seal_total: u64,
    pub seal_success: u64,
    pub open_total: u64,
    pub open_verified: u64,
    pub bytes_sealed: u64,
    pub bytes_opened: u64,
    pub malformed: u64,
    pub unsupported_mode: u64,
    pub auth_failures: u64,
    pub replays_rejected: u64,
    pub type_mismatches: u64,
    pub uptime_seconds: u64,
}

/// Global metrics instance (lazy static for simplicity)
static METRICS: once_cell::sync::Lazy<Metrics> = once_cell::sync::Lazy::new(Metrics::new);

/// Get the global metrics instance
pub fn global_metrics() -> &'static Metrics {
    &METRICS
}

/// Timer for measuring operation duration
pub struct Timer {
    start: Instant,
    operation: &'static str,
}

impl Timer {
    /// Start timing an operation
    pub fn start(operation: &'static str) -> Self {
        Self {
            start: Instant::now(),
            operation,
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        debug!(
            operation = self.operation,
            duration_us = duration.as_micros() as u64,
            "Operation completed"
        );
    }
}
