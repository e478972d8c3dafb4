//! Overlay Controller Library
//!
//! Reconciles conference lifecycle events into a single floating overlay:
//!
//! - Allocates overlay content when a conference starts and releases it when it ends
//! - Attaches the overlay to the host after a settle delay, coalescing bursts
//! - Keeps a de-duplicated roster and per-kind stream mappings in sync with the backend
//! - Pushes complete snapshots to the overlay view, never deltas
//! - Remembers expanded/minimized presentation across retained detaches
//!
//! # Modules
//!
//! - [`actors`] - The controller actor and its handle
//! - [`collaborators`] - Traits for everything the controller talks to
//! - [`config`] - Configuration from environment
//! - [`errors`] - Error types
//! - [`headless`] - Logging-only collaborators used by the binary
//! - [`observability`] - Metrics

pub mod actors;
pub mod collaborators;
pub mod config;
pub mod errors;
pub mod headless;
pub mod observability;
pub mod presentation;
pub mod roster;
pub mod scheduler;
pub mod streams;
