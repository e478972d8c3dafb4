//! Stream registry: one participant-to-stream map per stream kind.
//!
//! Maps are only ever swapped wholesale from the backend's authoritative
//! snapshot. There is no per-key mutation, so a lost or duplicated stream
//! event can at worst delay consistency until the next re-pull.

use common::types::{StreamKind, StreamMap};

/// Camera and screen-share stream maps.
#[derive(Debug, Clone, Default)]
pub struct StreamRegistry {
    camera: StreamMap,
    screen_share: StreamMap,
}

impl StreamRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole map for `kind`.
    pub fn replace_all(&mut self, kind: StreamKind, mapping: StreamMap) {
        match kind {
            StreamKind::Camera => self.camera = mapping,
            StreamKind::ScreenShare => self.screen_share = mapping,
        }
    }

    /// Current map for `kind`.
    #[must_use]
    pub fn get(&self, kind: StreamKind) -> &StreamMap {
        match kind {
            StreamKind::Camera => &self.camera,
            StreamKind::ScreenShare => &self.screen_share,
        }
    }

    /// Drop both maps.
    pub fn clear(&mut self) {
        self.camera.clear();
        self.screen_share.clear();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use common::types::StreamHandle;

    fn mapping(entries: &[(&str, &str)]) -> StreamMap {
        entries
            .iter()
            .map(|(id, handle)| ((*id).to_string(), StreamHandle::new(*handle)))
            .collect()
    }

    #[test]
    fn test_replace_all_swaps_wholesale() {
        let mut registry = StreamRegistry::new();
        registry.replace_all(
            StreamKind::Camera,
            mapping(&[("alice", "cam-a"), ("bob", "cam-b")]),
        );

        // Authoritative map no longer lists alice: she must disappear, not linger
        registry.replace_all(StreamKind::Camera, mapping(&[("bob", "cam-b2")]));

        let camera = registry.get(StreamKind::Camera);
        assert_eq!(camera.len(), 1);
        assert_eq!(camera.get("bob"), Some(&StreamHandle::new("cam-b2")));
        assert!(camera.get("alice").is_none());
    }

    #[test]
    fn test_kinds_are_independent() {
        let mut registry = StreamRegistry::new();
        registry.replace_all(StreamKind::ScreenShare, mapping(&[("bob", "screen-b")]));

        assert!(registry.get(StreamKind::Camera).is_empty());
        assert_eq!(registry.get(StreamKind::ScreenShare).len(), 1);

        registry.clear();
        assert!(registry.get(StreamKind::ScreenShare).is_empty());
    }
}
