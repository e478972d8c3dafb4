//! Actor implementation for the Overlay Controller.
//!
//! A single actor owns the overlay:
//!
//! ```text
//! OverlayControllerActor (one per host window)
//! ├── owns Roster, StreamRegistry, PresentationState, AttachScheduler
//! ├── owns the overlay content (Box<dyn OverlayView>)
//! └── consumes the EventSource subscription while enabled
//! ```
//!
//! # Modules
//!
//! - [`controller`] - `OverlayControllerActor` and its handle
//! - [`messages`] - Mailbox messages and the state snapshot
//! - [`metrics`] - Mailbox monitoring

pub mod controller;
pub mod messages;
pub mod metrics;

// Re-export primary types
pub use controller::{OverlayControllerActor, OverlayControllerHandle};
pub use messages::*;
pub use metrics::{MailboxLevel, MailboxMonitor};
