//! Navigation tracking.
//!
//! Turns device position updates into a managed live-tracking session bound
//! to the most recently computed route.
//!
//! - [`NavigationController`] - the state machine (`Idle`, `Starting`,
//!   `Active`, `Restarting`, `Stopping`)
//! - [`NavigationService`] / [`NavigationHandle`] - async event loop driving
//!   a controller from UI intents and position deliveries
//! - [`TrackingSession`] - one live visualization and its forwarding gate
//! - [`clean_map_surface`] - removal of leftover tracking layers
//!
//! # Example
//!
//! ```ignore
//! let controller = NavigationController::new(config, routes, sdk, positions);
//! let handle = NavigationService::spawn(controller);
//!
//! handle.start().await?;
//! println!("{:?}", handle.state().readout());
//! handle.stop().await?;
//! ```

mod cleanup;
mod controller;
mod error;
mod gate;
mod service;
mod session;
mod state;

pub use cleanup::{
    clean_map_surface, is_tracking_artifact, CleanupReport, CleanupWarning, TRACKING_ID_TOKEN,
    TRACKING_ROUTE_LAYER, TRACKING_ROUTE_SOURCE,
};
pub use controller::{NavigationController, StartStep, StartTicket};
pub use error::{ErrorClass, NavigationError};
pub use gate::ForwardingGate;
pub use service::{NavigationHandle, NavigationService};
pub use session::TrackingSession;
pub use state::{ControllerState, NavigationUiState};
