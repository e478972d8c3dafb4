//! Controller mailbox monitoring.
//!
//! | Level    | Depth      |
//! |----------|------------|
//! | Normal   | < 32       |
//! | Warning  | 32-128     |
//! | Critical | > 128      |
//!
//! Host callbacks and UI requests share the mailbox with event-driven work, so
//! a deep mailbox shows up as a laggy overlay long before anything is dropped.

use crate::observability;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tracing::{debug, warn};

/// Mailbox depth below which the controller is healthy.
pub const CONTROLLER_MAILBOX_NORMAL: usize = 32;

/// Mailbox depth above which the controller is critical.
pub const CONTROLLER_MAILBOX_WARNING: usize = 128;

/// Mailbox depth level for alerting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailboxLevel {
    /// Below normal threshold.
    Normal,
    /// Between normal and warning thresholds.
    Warning,
    /// Above warning threshold.
    Critical,
}

/// Tracks the controller mailbox depth and processed message count.
#[derive(Debug)]
pub struct MailboxMonitor {
    controller_id: String,
    depth: AtomicUsize,
    peak_depth: AtomicUsize,
    messages_processed: AtomicU64,
}

impl MailboxMonitor {
    /// Create a monitor for the controller `controller_id`.
    #[must_use]
    pub fn new(controller_id: impl Into<String>) -> Self {
        Self {
            controller_id: controller_id.into(),
            depth: AtomicUsize::new(0),
            peak_depth: AtomicUsize::new(0),
            messages_processed: AtomicU64::new(0),
        }
    }

    /// Record the queue depth observed when a message was taken off the mailbox.
    pub fn record_dequeue(&self, remaining: usize) {
        let previous = self.depth.swap(remaining, Ordering::Relaxed);
        self.peak_depth.fetch_max(remaining, Ordering::Relaxed);
        self.messages_processed.fetch_add(1, Ordering::Relaxed);
        observability::set_mailbox_depth(remaining);

        match Self::level_for_depth(remaining) {
            MailboxLevel::Critical => {
                warn!(
                    target: "oc.actor.mailbox",
                    controller_id = %self.controller_id,
                    depth = remaining,
                    threshold = CONTROLLER_MAILBOX_WARNING,
                    "Mailbox depth critical"
                );
            }
            // Log once when crossing into the warning band
            MailboxLevel::Warning if previous < CONTROLLER_MAILBOX_NORMAL => {
                debug!(
                    target: "oc.actor.mailbox",
                    controller_id = %self.controller_id,
                    depth = remaining,
                    "Mailbox depth elevated"
                );
            }
            _ => {}
        }
    }

    /// Current mailbox depth.
    #[must_use]
    pub fn current_depth(&self) -> usize {
        self.depth.load(Ordering::Relaxed)
    }

    /// Peak mailbox depth.
    #[must_use]
    pub fn peak_depth(&self) -> usize {
        self.peak_depth.load(Ordering::Relaxed)
    }

    /// Total messages processed.
    #[must_use]
    pub fn messages_processed(&self) -> u64 {
        self.messages_processed.load(Ordering::Relaxed)
    }

    /// Current mailbox level.
    #[must_use]
    pub fn current_level(&self) -> MailboxLevel {
        Self::level_for_depth(self.current_depth())
    }

    fn level_for_depth(depth: usize) -> MailboxLevel {
        if depth > CONTROLLER_MAILBOX_WARNING {
            MailboxLevel::Critical
        } else if depth >= CONTROLLER_MAILBOX_NORMAL {
            MailboxLevel::Warning
        } else {
            MailboxLevel::Normal
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_mailbox_levels() {
        let monitor = MailboxMonitor::new("oc-test");
        assert_eq!(monitor.current_level(), MailboxLevel::Normal);

        monitor.record_dequeue(CONTROLLER_MAILBOX_NORMAL - 1);
        assert_eq!(monitor.current_level(), MailboxLevel::Normal);

        monitor.record_dequeue(CONTROLLER_MAILBOX_NORMAL);
        assert_eq!(monitor.current_level(), MailboxLevel::Warning);

        monitor.record_dequeue(CONTROLLER_MAILBOX_WARNING + 1);
        assert_eq!(monitor.current_level(), MailboxLevel::Critical);
    }

    #[test]
    fn test_peak_and_processed() {
        let monitor = MailboxMonitor::new("oc-test");

        monitor.record_dequeue(5);
        monitor.record_dequeue(9);
        monitor.record_dequeue(0);

        assert_eq!(monitor.current_depth(), 0);
        assert_eq!(monitor.peak_depth(), 9);
        assert_eq!(monitor.messages_processed(), 3);
    }
}
