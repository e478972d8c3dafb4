//! Mock host surface provider.
//!
//! Can be configured to:
//! - Have or lack a root surface
//! - Report any lifecycle state
//! - Fail attach requests
//!
//! # Example
//!
//! ```rust,ignore
//! use oc_test_utils::MockHost;
//!
//! let host = MockHost::new();
//! host.set_surface_available(false);
//! // ... attach attempts now abort ...
//! assert_eq!(host.attach_calls(), 0);
//! ```

use overlay_controller::collaborators::{HostLifecycle, HostSurfaceProvider, SurfaceId};
use overlay_controller::errors::OverlayError;
use std::sync::Mutex;

/// Root surface id reported by default.
pub const MOCK_ROOT_SURFACE: &str = "mock-root";

#[derive(Debug)]
struct MockHostInner {
    surface_available: bool,
    lifecycle: HostLifecycle,
    fail_attach: bool,
    attached: bool,
    attach_calls: usize,
    detach_calls: usize,
}

/// Mock host for testing attach/detach behaviour.
#[derive(Debug)]
pub struct MockHost {
    inner: Mutex<MockHostInner>,
}

impl Default for MockHost {
    fn default() -> Self {
        Self {
            inner: Mutex::new(MockHostInner {
                surface_available: true,
                lifecycle: HostLifecycle::Resumed,
                fail_attach: false,
                attached: false,
                attach_calls: 0,
                detach_calls: 0,
            }),
        }
    }
}

impl MockHost {
    /// Create a resumed host with a root surface.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a host without a root surface.
    #[must_use]
    pub fn without_surface() -> Self {
        let host = Self::default();
        host.set_surface_available(false);
        host
    }

    /// Toggle the root surface.
    pub fn set_surface_available(&self, available: bool) {
        self.inner.lock().unwrap().surface_available = available;
    }

    /// Change the reported lifecycle state.
    pub fn set_lifecycle(&self, lifecycle: HostLifecycle) {
        self.inner.lock().unwrap().lifecycle = lifecycle;
    }

    /// Make attach requests fail.
    pub fn fail_attaches(&self, fail: bool) {
        self.inner.lock().unwrap().fail_attach = fail;
    }

    /// Remove the overlay from the host's side, without a `detach_overlay` call.
    pub fn drop_overlay(&self) {
        self.inner.lock().unwrap().attached = false;
    }

    /// Number of `attach_overlay` calls (failed ones included).
    #[must_use]
    pub fn attach_calls(&self) -> usize {
        self.inner.lock().unwrap().attach_calls
    }

    /// Number of `detach_overlay` calls.
    #[must_use]
    pub fn detach_calls(&self) -> usize {
        self.inner.lock().unwrap().detach_calls
    }
}

impl HostSurfaceProvider for MockHost {
    fn root_surface(&self) -> Option<SurfaceId> {
        let inner = self.inner.lock().unwrap();
        inner
            .surface_available
            .then(|| SurfaceId::new(MOCK_ROOT_SURFACE))
    }

    fn lifecycle_state(&self) -> HostLifecycle {
        self.inner.lock().unwrap().lifecycle
    }

    fn attach_overlay(&self, surface: &SurfaceId) -> Result<(), OverlayError> {
        let mut inner = self.inner.lock().unwrap();
        inner.attach_calls += 1;

        if inner.fail_attach {
            return Err(OverlayError::SurfaceUnavailable(format!(
                "mock host refused attach under {surface}"
            )));
        }

        inner.attached = true;
        Ok(())
    }

    fn detach_overlay(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.detach_calls += 1;
        inner.attached = false;
    }

    fn is_overlay_attached(&self) -> bool {
        self.inner.lock().unwrap().attached
    }
}
