//! Attach/detach scheduler for the overlay surface.
//!
//! The scheduler is a plain state machine owned by the controller actor. It does
//! not touch the host itself: it tells the actor what to do and when, and the
//! actor reports back once the host call finished. Because the actor runs every
//! handler to completion, `Attaching` and `Detaching` only exist for the duration
//! of one host call.
//!
//! # Phases
//!
//! ```text
//! Detached --request_attach--> AttachPending --take_due--> Attaching
//!     ^                            |                          |
//!     |<------request_detach-------+      complete_attach(ok) v
//!     |<----complete_detach---- Detaching <--request_detach-- Attached
//! ```
//!
//! Exactly one phase is current, so at most one of attached, attach-in-flight and
//! detach-in-flight can hold at any instant.

use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Where the overlay surface currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfacePhase {
    /// Not attached, nothing scheduled.
    Detached,
    /// Attach scheduled to run at `deadline`.
    AttachPending { deadline: Instant },
    /// Attach executing.
    Attaching,
    /// Attached to the host.
    Attached,
    /// Detach executing.
    Detaching,
}

impl SurfacePhase {
    /// Returns the phase as a string for logs and snapshots.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            SurfacePhase::Detached => "detached",
            SurfacePhase::AttachPending { .. } => "attach_pending",
            SurfacePhase::Attaching => "attaching",
            SurfacePhase::Attached => "attached",
            SurfacePhase::Detaching => "detaching",
        }
    }
}

/// Result of `AttachScheduler::request_attach`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachRequest {
    /// Already attached (or attaching); nothing to do.
    AlreadyAttached,
    /// A new deferred attach was scheduled.
    Scheduled { deadline: Instant },
    /// Folded into the attach that was already pending.
    Coalesced { deadline: Instant },
}

/// Result of `AttachScheduler::request_detach`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetachRequest {
    /// A pending attach was cancelled before it ran. The host was never touched.
    CancelledPending,
    /// The surface is attached; the caller must detach it and then call
    /// `complete_detach`.
    Detach,
    /// Nothing attached or pending.
    AlreadyDetached,
}

/// Serializes attach and detach of the overlay surface.
#[derive(Debug)]
pub struct AttachScheduler {
    phase: SurfacePhase,
    attaches: u64,
    aborted_attaches: u64,
    detaches: u64,
}

impl Default for AttachScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl AttachScheduler {
    /// Create a scheduler in the `Detached` phase.
    #[must_use]
    pub fn new() -> Self {
        Self {
            phase: SurfacePhase::Detached,
            attaches: 0,
            aborted_attaches: 0,
            detaches: 0,
        }
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> SurfacePhase {
        self.phase
    }

    /// Whether the overlay is attached.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.phase == SurfacePhase::Attached
    }

    /// Deadline of the pending attach, if any.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        match self.phase {
            SurfacePhase::AttachPending { deadline } => Some(deadline),
            _ => None,
        }
    }

    /// Successful attach executions so far.
    #[must_use]
    pub fn attach_count(&self) -> u64 {
        self.attaches
    }

    /// Attach executions abandoned because the host was unavailable.
    #[must_use]
    pub fn aborted_attach_count(&self) -> u64 {
        self.aborted_attaches
    }

    /// Detaches performed so far, pending-attach cancellations included.
    #[must_use]
    pub fn detach_count(&self) -> u64 {
        self.detaches
    }

    /// Ask for the overlay to be attached after `delay`.
    ///
    /// Repeated requests before the deadline coalesce into the pending one and
    /// keep its original deadline.
    pub fn request_attach(&mut self, delay: Duration, now: Instant) -> AttachRequest {
        match self.phase {
            SurfacePhase::Attached | SurfacePhase::Attaching => AttachRequest::AlreadyAttached,
            SurfacePhase::AttachPending { deadline } => {
                debug!(target: "oc.scheduler", "Attach request coalesced into pending attach");
                AttachRequest::Coalesced { deadline }
            }
            // Detaching never outlives a handler, so by the time a new request is
            // processed the queued detach has already run.
            SurfacePhase::Detached | SurfacePhase::Detaching => {
                let deadline = now + delay;
                self.phase = SurfacePhase::AttachPending { deadline };
                debug!(
                    target: "oc.scheduler",
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "Attach scheduled"
                );
                AttachRequest::Scheduled { deadline }
            }
        }
    }

    /// Move a due pending attach to `Attaching`.
    ///
    /// Returns `true` if the caller must now execute the attach and report back
    /// with `complete_attach`.
    pub fn take_due(&mut self, now: Instant) -> bool {
        match self.phase {
            SurfacePhase::AttachPending { deadline } if deadline <= now => {
                self.phase = SurfacePhase::Attaching;
                true
            }
            _ => false,
        }
    }

    /// Record the outcome of an attach execution.
    pub fn complete_attach(&mut self, attached: bool) {
        if self.phase != SurfacePhase::Attaching {
            debug!(
                target: "oc.scheduler",
                phase = self.phase.as_str(),
                "complete_attach outside of an attach, ignoring"
            );
            return;
        }

        if attached {
            self.attaches += 1;
            self.phase = SurfacePhase::Attached;
        } else {
            self.aborted_attaches += 1;
            self.phase = SurfacePhase::Detached;
        }
    }

    /// Ask for the overlay to be detached now.
    ///
    /// A pending attach is cancelled outright instead of being allowed to fire.
    pub fn request_detach(&mut self) -> DetachRequest {
        match self.phase {
            SurfacePhase::AttachPending { .. } => {
                self.phase = SurfacePhase::Detached;
                self.detaches += 1;
                debug!(target: "oc.scheduler", "Pending attach cancelled");
                DetachRequest::CancelledPending
            }
            SurfacePhase::Attached => {
                self.phase = SurfacePhase::Detaching;
                DetachRequest::Detach
            }
            SurfacePhase::Detached | SurfacePhase::Attaching | SurfacePhase::Detaching => {
                DetachRequest::AlreadyDetached
            }
        }
    }

    /// Record that the host detach finished.
    pub fn complete_detach(&mut self) {
        if self.phase == SurfacePhase::Detaching {
            self.detaches += 1;
            self.phase = SurfacePhase::Detached;
        }
    }
}
