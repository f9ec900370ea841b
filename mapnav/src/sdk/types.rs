//! Traits and payloads of the external mapping SDK.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::route::RouteEndpoint;

/// Failures reported by the external SDK.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SdkError {
    /// The map or plugin bundle has not finished loading.
    #[error("Mapping SDK not loaded")]
    NotLoaded,

    /// The SDK refused the request.
    #[error("Rejected by mapping SDK: {0}")]
    Rejected(String),

    /// The handle does not offer this capability.
    #[error("Capability not supported: {0}")]
    Unsupported(&'static str),

    /// The referenced layer or source does not exist.
    #[error("No such layer or source: {0}")]
    Missing(String),

    /// Any other SDK-side failure.
    #[error("Mapping SDK error: {0}")]
    Failed(String),
}

/// A style layer as enumerated by the map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerDescriptor {
    pub id: String,
    /// Source the layer draws from, when it has one.
    pub source: Option<String>,
}

impl LayerDescriptor {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Snapshot of the map's current style.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapStyle {
    /// Layers in draw order.
    pub layers: Vec<LayerDescriptor>,
    /// Source ids.
    pub sources: Vec<String>,
}

/// The layer and source registry of a live map.
///
/// This is a single shared mutable resource; implementations use interior
/// mutability.
pub trait MapSurface: Send + Sync {
    fn has_layer(&self, id: &str) -> bool;

    fn remove_layer(&self, id: &str) -> Result<(), SdkError>;

    fn has_source(&self, id: &str) -> bool;

    fn remove_source(&self, id: &str) -> Result<(), SdkError>;

    /// Current style, or `None` while the style is not loaded.
    fn style(&self) -> Option<MapStyle>;
}

/// Presentation parameters for a new live-tracking visualization.
///
/// Passed through to the SDK verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackingOptions {
    pub start: RouteEndpoint,
    pub end: RouteEndpoint,
    pub fit_bounds: bool,
    pub icon_width: u32,
    pub stroke_width: u32,
    pub route_color: String,
    pub connector: bool,
    pub popup_html: String,
}

/// One position update pushed into a live-tracking visualization.
///
/// Everything except `location` is configuration the SDK applies while
/// recomputing; nothing here is derived by this crate.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackingUpdate {
    /// `[lng, lat]`.
    pub location: [f64; 2],
    /// Recalculate the route when the device has deviated from it.
    pub re_route: bool,
    pub heading: bool,
    /// Re-center the camera on the device.
    pub map_center: bool,
    /// Deviation tolerance in meters before a re-route is considered.
    pub buffer_m: u32,
    /// Settle time before the recompute is applied.
    pub delay: Duration,
    pub eta_refresh: bool,
    pub fit_bounds: bool,
}

/// The SDK's live-tracking plugin.
pub trait TrackingPrimitive: Send + Sync {
    /// Create a live-tracking visualization on `map`.
    fn create(
        &self,
        map: Arc<dyn MapSurface>,
        options: TrackingOptions,
    ) -> Result<Box<dyn TrackingHandle>, SdkError>;
}

/// Opaque handle to one live-tracking visualization.
pub trait TrackingHandle: Send {
    /// Push a position update (may trigger re-route/ETA recompute).
    fn tracking_call(&mut self, update: TrackingUpdate) -> Result<(), SdkError>;

    /// Remove the visualization from the map.
    ///
    /// Not every plugin build offers removal; the default reports
    /// `SdkError::Unsupported`.
    fn remove(&mut self) -> Result<(), SdkError> {
        Err(SdkError::Unsupported("remove"))
    }
}
