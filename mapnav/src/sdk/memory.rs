//! In-process mapping SDK.
//!
//! [`InMemoryMap`] keeps a layer/source registry with the same rules a real
//! style has (unique ids, a source cannot go while a layer still draws from
//! it). [`RecordingTracker`] is a live-tracking plugin that draws its layers
//! onto an `InMemoryMap` and records every call, with configurable removal
//! behaviour so incomplete or failing SDK cleanup can be reproduced.
//!
//! Used by the headless CLI driver and by tests.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use super::types::{
    LayerDescriptor, MapStyle, MapSurface, SdkError, TrackingHandle, TrackingOptions,
    TrackingPrimitive, TrackingUpdate,
};

/// Source id the tracking plugin draws its route from.
pub const ROUTE_SOURCE_ID: &str = "tracking-route-source";

/// Layer id of the tracked route line.
pub const ROUTE_LAYER_ID: &str = "tracking-route-layer";

#[derive(Debug, Default)]
struct MapState {
    layers: Vec<LayerDescriptor>,
    sources: Vec<String>,
    style_unloaded: bool,
    failing: HashSet<String>,
}

/// Layer/source registry of a headless map.
#[derive(Debug, Default)]
pub struct InMemoryMap {
    state: Mutex<MapState>,
}

impl InMemoryMap {
    /// Create an empty map with a loaded style.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a layer. Fails if the id is taken or the source is unknown.
    pub fn add_layer(&self, layer: LayerDescriptor) -> Result<(), SdkError> {
        let mut state = self.state.lock();
        if state.layers.iter().any(|l| l.id == layer.id) {
            return Err(SdkError::Rejected(format!(
                "layer '{}' already exists",
                layer.id
            )));
        }
        if let Some(source) = &layer.source {
            if !state.sources.contains(source) {
                return Err(SdkError::Missing(source.clone()));
            }
        }
        state.layers.push(layer);
        Ok(())
    }

    /// Add a source. Fails if the id is taken.
    pub fn add_source(&self, id: impl Into<String>) -> Result<(), SdkError> {
        let id = id.into();
        let mut state = self.state.lock();
        if state.sources.contains(&id) {
            return Err(SdkError::Rejected(format!("source '{}' already exists", id)));
        }
        state.sources.push(id);
        Ok(())
    }

    /// Simulate the style being (un)available.
    pub fn set_style_loaded(&self, loaded: bool) {
        self.state.lock().style_unloaded = !loaded;
    }

    /// Make every removal of `id` fail.
    pub fn fail_removal_of(&self, id: impl Into<String>) {
        self.state.lock().failing.insert(id.into());
    }

    /// Let removals of `id` succeed again.
    pub fn heal_removal_of(&self, id: &str) {
        self.state.lock().failing.remove(id);
    }

    pub fn layer_ids(&self) -> Vec<String> {
        self.state.lock().layers.iter().map(|l| l.id.clone()).collect()
    }

    pub fn source_ids(&self) -> Vec<String> {
        self.state.lock().sources.clone()
    }
}

impl MapSurface for InMemoryMap {
    fn has_layer(&self, id: &str) -> bool {
        self.state.lock().layers.iter().any(|l| l.id == id)
    }

    fn remove_layer(&self, id: &str) -> Result<(), SdkError> {
        let mut state = self.state.lock();
        if state.failing.contains(id) {
            return Err(SdkError::Failed(format!("cannot remove layer '{}'", id)));
        }
        let before = state.layers.len();
        state.layers.retain(|l| l.id != id);
        if state.layers.len() == before {
            return Err(SdkError::Missing(id.to_string()));
        }
        Ok(())
    }

    fn has_source(&self, id: &str) -> bool {
        self.state.lock().sources.iter().any(|s| s == id)
    }

    fn remove_source(&self, id: &str) -> Result<(), SdkError> {
        let mut state = self.state.lock();
        if state.failing.contains(id) {
            return Err(SdkError::Failed(format!("cannot remove source '{}'", id)));
        }
        if let Some(user) = state
            .layers
            .iter()
            .find(|l| l.source.as_deref() == Some(id))
        {
            return Err(SdkError::Failed(format!(
                "source '{}' is in use by layer '{}'",
                id, user.id
            )));
        }
        let before = state.sources.len();
        state.sources.retain(|s| s != id);
        if state.sources.len() == before {
            return Err(SdkError::Missing(id.to_string()));
        }
        Ok(())
    }

    fn style(&self) -> Option<MapStyle> {
        let state = self.state.lock();
        if state.style_unloaded {
            return None;
        }
        Some(MapStyle {
            layers: state.layers.clone(),
            sources: state.sources.clone(),
        })
    }
}

/// How a [`RecordingTracker`] handle behaves when asked to remove itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RemoveBehavior {
    /// Removes every layer and source it added.
    #[default]
    Clean,
    /// Removes only the marker, leaving the route layer and source behind.
    Partial,
    /// Fails without removing anything.
    Fails,
    /// The handle has no removal capability.
    Absent,
}

/// Everything a [`RecordingTracker`] has been asked to do.
#[derive(Debug, Default, Clone)]
pub struct TrackerLog {
    pub created: Vec<TrackingOptions>,
    pub updates: Vec<TrackingUpdate>,
    pub removals: usize,
    /// Handles currently alive.
    pub live: usize,
    /// Highest number of handles alive at once.
    pub max_live: usize,
}

#[derive(Debug, Default)]
struct TrackerConfig {
    reject_with: Option<String>,
    remove: RemoveBehavior,
}

/// Live-tracking plugin that records calls and draws onto an [`InMemoryMap`].
#[derive(Debug, Default)]
pub struct RecordingTracker {
    map: Option<Arc<InMemoryMap>>,
    config: Mutex<TrackerConfig>,
    log: Arc<Mutex<TrackerLog>>,
    next_marker: AtomicU64,
}

impl RecordingTracker {
    /// A tracker that records calls but draws nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// A tracker that adds its route source, route layer and a marker layer
    /// to `map` for every visualization it creates.
    pub fn drawing_on(map: Arc<InMemoryMap>) -> Self {
        Self {
            map: Some(map),
            ..Self::default()
        }
    }

    /// Reject every subsequent creation with `reason`.
    pub fn reject_creation(&self, reason: impl Into<String>) {
        self.config.lock().reject_with = Some(reason.into());
    }

    /// Accept creations again.
    pub fn accept_creation(&self) {
        self.config.lock().reject_with = None;
    }

    /// Set how handles created from now on remove themselves.
    pub fn set_remove_behavior(&self, behavior: RemoveBehavior) {
        self.config.lock().remove = behavior;
    }

    /// Snapshot of the call log.
    pub fn log(&self) -> TrackerLog {
        self.log.lock().clone()
    }

    fn draw(&self, map: &InMemoryMap, marker_id: &str) -> Result<(), SdkError> {
        if !map.has_source(ROUTE_SOURCE_ID) {
            map.add_source(ROUTE_SOURCE_ID)?;
        }
        map.add_layer(LayerDescriptor::new(ROUTE_LAYER_ID).with_source(ROUTE_SOURCE_ID))?;
        map.add_layer(LayerDescriptor::new(marker_id))?;
        Ok(())
    }
}

impl TrackingPrimitive for RecordingTracker {
    fn create(
        &self,
        _map: Arc<dyn MapSurface>,
        options: TrackingOptions,
    ) -> Result<Box<dyn TrackingHandle>, SdkError> {
        let behavior = {
            let config = self.config.lock();
            if let Some(reason) = &config.reject_with {
                return Err(SdkError::Rejected(reason.clone()));
            }
            config.remove
        };

        let marker_id = format!(
            "tracking-marker-{}",
            self.next_marker.fetch_add(1, Ordering::Relaxed)
        );
        if let Some(map) = &self.map {
            self.draw(map, &marker_id)?;
        }

        let mut log = self.log.lock();
        log.created.push(options);
        log.live += 1;
        log.max_live = log.max_live.max(log.live);

        Ok(Box::new(RecordingHandle {
            map: self.map.clone(),
            log: Arc::clone(&self.log),
            marker_id,
            behavior,
        }))
    }
}

/// Handle returned by [`RecordingTracker`].
#[derive(Debug)]
struct RecordingHandle {
    map: Option<Arc<InMemoryMap>>,
    log: Arc<Mutex<TrackerLog>>,
    marker_id: String,
    behavior: RemoveBehavior,
}

impl TrackingHandle for RecordingHandle {
    fn tracking_call(&mut self, update: TrackingUpdate) -> Result<(), SdkError> {
        self.log.lock().updates.push(update);
        Ok(())
    }

    fn remove(&mut self) -> Result<(), SdkError> {
        match self.behavior {
            RemoveBehavior::Absent => return Err(SdkError::Unsupported("remove")),
            RemoveBehavior::Fails => {
                return Err(SdkError::Failed("tracking removal threw".to_string()))
            }
            RemoveBehavior::Clean | RemoveBehavior::Partial => {}
        }

        if let Some(map) = &self.map {
            // Absent ids are fine here; the handle may be removed twice
            let _ = map.remove_layer(&self.marker_id);
            if self.behavior == RemoveBehavior::Clean {
                let _ = map.remove_layer(ROUTE_LAYER_ID);
                let _ = map.remove_source(ROUTE_SOURCE_ID);
            }
        }
        self.log.lock().removals += 1;
        Ok(())
    }
}

impl Drop for RecordingHandle {
    fn drop(&mut self) {
        let mut log = self.log.lock();
        log.live = log.live.saturating_sub(1);
    }
}
