//! Common types shared across the overlay controller components.

#![warn(clippy::pedantic)]

/// Module for common error types
pub mod error;

/// Module for the conference data model (participants, streams, presentation)
pub mod types;

/// Module for the domain event vocabulary
pub mod events;
