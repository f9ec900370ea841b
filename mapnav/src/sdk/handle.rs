//! Readiness slot for the loaded SDK.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use super::types::{MapSurface, TrackingPrimitive};

/// Loading stage of the mapping SDK, as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SdkStatus {
    /// Waiting for access tokens from the backend.
    #[default]
    FetchingToken,
    /// Tokens obtained, SDK script loading.
    LoadingSdk,
    /// SDK loaded, plugin bundle loading.
    LoadingPlugins,
    /// Map and plugins usable.
    Ready,
    /// Loading failed; the message is shown to the user.
    Failed(String),
}

impl SdkStatus {
    /// Message shown while the map is not usable.
    pub fn loading_message(&self) -> &str {
        match self {
            SdkStatus::FetchingToken => "Fetching access tokens...",
            SdkStatus::LoadingSdk => "Loading map SDK...",
            SdkStatus::LoadingPlugins => "Loading plugins...",
            SdkStatus::Ready => "Map ready",
            SdkStatus::Failed(msg) => msg,
        }
    }
}

impl fmt::Display for SdkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.loading_message())
    }
}

#[derive(Default)]
struct SdkSlot {
    status: SdkStatus,
    map: Option<Arc<dyn MapSurface>>,
    tracking: Option<Arc<dyn TrackingPrimitive>>,
}

/// Shared handle to the (possibly not yet loaded) mapping SDK.
///
/// Cheap to clone; all clones see the same slot.
#[derive(Clone, Default)]
pub struct SdkHandle {
    slot: Arc<RwLock<SdkSlot>>,
}

impl fmt::Debug for SdkHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slot = self.slot.read();
        f.debug_struct("SdkHandle")
            .field("status", &slot.status)
            .field("map", &slot.map.is_some())
            .field("tracking", &slot.tracking.is_some())
            .finish()
    }
}

impl SdkHandle {
    /// Create an empty (not loaded) handle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a handle that is already loaded.
    pub fn ready(map: Arc<dyn MapSurface>, tracking: Arc<dyn TrackingPrimitive>) -> Self {
        let handle = Self::new();
        handle.attach(map, tracking);
        handle
    }

    /// Record a loading stage.
    pub fn set_status(&self, status: SdkStatus) {
        tracing::debug!(status = %status, "Mapping SDK status");
        self.slot.write().status = status;
    }

    pub fn status(&self) -> SdkStatus {
        self.slot.read().status.clone()
    }

    /// Install the loaded map and tracking plugin.
    pub fn attach(&self, map: Arc<dyn MapSurface>, tracking: Arc<dyn TrackingPrimitive>) {
        let mut slot = self.slot.write();
        slot.map = Some(map);
        slot.tracking = Some(tracking);
        slot.status = SdkStatus::Ready;
        tracing::info!("Mapping SDK attached");
    }

    /// Forget the map and plugin (host unloaded them).
    pub fn detach(&self) {
        let mut slot = self.slot.write();
        slot.map = None;
        slot.tracking = None;
        slot.status = SdkStatus::FetchingToken;
        tracing::info!("Mapping SDK detached");
    }

    pub fn map(&self) -> Option<Arc<dyn MapSurface>> {
        self.slot.read().map.clone()
    }

    pub fn tracking(&self) -> Option<Arc<dyn TrackingPrimitive>> {
        self.slot.read().tracking.clone()
    }

    /// Both the map and the tracking plugin are available.
    pub fn is_ready(&self) -> bool {
        let slot = self.slot.read();
        slot.map.is_some() && slot.tracking.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sdk::memory::{InMemoryMap, RecordingTracker};

    #[test]
    fn test_new_handle_is_not_ready() {
        let handle = SdkHandle::new();
        assert!(!handle.is_ready());
        assert!(handle.map().is_none());
        assert_eq!(handle.status(), SdkStatus::FetchingToken);
    }

    #[test]
    fn test_attach_and_detach() {
        let map = Arc::new(InMemoryMap::new());
        let tracker = Arc::new(RecordingTracker::new());
        let handle = SdkHandle::new();
        let observer = handle.clone();

        handle.set_status(SdkStatus::LoadingPlugins);
        assert_eq!(observer.status().loading_message(), "Loading plugins...");

        handle.attach(map, tracker);
        assert!(observer.is_ready());
        assert_eq!(observer.status(), SdkStatus::Ready);

        handle.detach();
        assert!(!observer.is_ready());
    }

    #[test]
    fn test_failed_status_message() {
        let status = SdkStatus::Failed("Failed to load map SDK. Check token or network.".into());
        assert_eq!(status.to_string(), "Failed to load map SDK. Check token or network.");
    }
}
