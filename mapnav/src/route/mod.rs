//! Route context consumed by the navigation controller.
//!
//! The route-planning feature of the mapping SDK computes routes on its own
//! schedule and publishes the most recent result. This module models that
//! result and exposes it to the controller through an injected, read-only
//! accessor ([`RouteProvider`]) instead of ambient global state.
//!
//! # Example
//!
//! ```
//! use mapnav::route::{DirectionResult, LatestRoute, RouteProvider};
//!
//! let latest = LatestRoute::new();
//! assert!(latest.latest().is_none());
//!
//! let result: DirectionResult = serde_json::from_str(
//!     r#"{"Request":[{"geoposition":"28.60,77.20"},{"geoposition":"28.65,77.30"}]}"#,
//! ).unwrap();
//! latest.publish(result);
//!
//! let route = latest.latest().expect("route should be valid");
//! assert_eq!(route.destination.latitude, 28.65);
//! ```

mod direction;
mod endpoint;
mod provider;

pub use direction::{DirectionResult, RouteRequest};
pub use endpoint::{RouteContext, RouteEndpoint, RouteError};
pub use provider::{LatestRoute, RouteProvider};
