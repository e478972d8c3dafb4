//! # OC Test Utilities
//!
//! Shared test utilities for the Overlay Controller.
//!
//! Every collaborator trait has a recording mock here, so tests can drive the
//! controller and assert on exactly what it asked of the host, the overlay view
//! and the audio layer.
//!
//! ## Modules
//!
//! - `mock_overlay` - Overlay factory/view that log every callback as a `ViewCall`
//! - `mock_host` - Host surface with toggles for surface availability and attach failures
//! - `mock_audio` - Audio cues that log every call, with failure injection
//! - `mock_errors` - Error sink that keeps every report
//! - `fixtures` - Participant builders, stream maps, event helpers
//! - `rig` - `TestRig`, a spawned controller wired to all of the above
//!
//! ## Usage
//!
//! ```rust,ignore
//! use oc_test_utils::*;
//!
//! #[tokio::test(start_paused = true)]
//! async fn test_example() {
//!     let rig = TestRig::spawn(ControllerConfig::default());
//!     rig.conference.go_live("conf-1");
//!
//!     rig.publish(events::joined("conf-1")).await;
//!     tokio::time::sleep(Duration::from_millis(1100)).await;
//!
//!     assert_eq!(rig.host.attach_calls(), 1);
//! }
//! ```

pub mod fixtures;
pub mod mock_audio;
pub mod mock_errors;
pub mod mock_host;
pub mod mock_overlay;
pub mod rig;

// Re-export commonly used items
pub use fixtures::*;
pub use mock_audio::*;
pub use mock_errors::*;
pub use mock_host::*;
pub use mock_overlay::*;
pub use rig::*;
