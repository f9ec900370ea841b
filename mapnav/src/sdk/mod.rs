//! Seams onto the external mapping SDK.
//!
//! The SDK is loaded by the host at runtime and owns everything geographic:
//! rendering, routing, distance and ETA. This crate only decides *when* the
//! SDK's live-tracking primitive is invoked and *with what data*, and which
//! map layers must be gone afterwards.
//!
//! - [`MapSurface`] - the map's layer/source registry
//! - [`TrackingPrimitive`] / [`TrackingHandle`] - the live-tracking plugin
//! - [`SdkHandle`] - readiness slot the host fills once both are loaded
//! - [`memory`] - in-process implementation for headless runs and tests

mod handle;
pub mod memory;
mod types;

pub use handle::{SdkHandle, SdkStatus};
pub use types::{
    LayerDescriptor, MapStyle, MapSurface, SdkError, TrackingHandle, TrackingOptions,
    TrackingPrimitive, TrackingUpdate,
};
