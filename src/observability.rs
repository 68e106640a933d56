use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

/// Scan workflow counters
#[derive(Debug, Default)]
pub struct WorkflowMetrics {
    pub scans_accepted: AtomicU64,
    pub scans_ignored: AtomicU64,
    pub verifications_succeeded: AtomicU64,
    pub verifications_failed: AtomicU64,
    pub serves_succeeded: AtomicU64,
    pub serves_failed: AtomicU64,
}

impl WorkflowMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_scan_accepted(&self) {
        self.scans_accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_scan_ignored(&self) {
        self.scans_ignored.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_verification(&self, succeeded: bool) {
        if succeeded {
            self.verifications_succeeded.fetch_add(1, Ordering::Relaxed);
        } else {
            self.verifications_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_serve(&self, succeeded: bool) {
        if succeeded {
            self.serves_succeeded.fetch_add(1, Ordering::Relaxed);
        } else {
            self.serves_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn stats(&self) -> WorkflowStats {
        WorkflowStats {
            scans_accepted: self.scans_accepted.load(Ordering::Relaxed),
            scans_ignored: self.scans_ignored.load(Ordering::Relaxed),
            verifications_succeeded: self.verifications_succeeded.load(Ordering::Relaxed),
            verifications_failed: self.verifications_failed.load(Ordering::Relaxed),
            serves_succeeded: self.serves_succeeded.load(Ordering::Relaxed),
            serves_failed: self.serves_failed.load(Ordering::Relaxed),
        }
    }

    pub fn log_stats(&self) {
        let stats = self.stats();
        info!(
            scans_accepted = stats.scans_accepted,
            scans_ignored = stats.scans_ignored,
            verifications_succeeded = stats.verifications_succeeded,
            verifications_failed = stats.verifications_failed,
            serves_succeeded = stats.serves_succeeded,
            serves_failed = stats.serves_failed,
            "Scan workflow metrics"
        );
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WorkflowStats {
    pub scans_accepted: u64,
    pub scans_ignored: u64,
    pub verifications_succeeded: u64,
    pub verifications_failed: u64,
    pub serves_succeeded: u64,
    pub serves_failed: u64,
}

/// Time a remote call and log its duration
pub struct OperationTimer {
    operation: &'static str,
    start: Instant,
}

impl OperationTimer {
    pub fn new(operation: &'static str) -> Self {
        Self {
            operation,
            start: Instant::now(),
        }
    }

    pub fn finish(self, succeeded: bool) {
        let duration = self.start.elapsed();
        info!(
            operation = self.operation,
            succeeded,
            duration_ms = duration.as_millis() as u64,
            "Operation completed"
        );
    }
}
