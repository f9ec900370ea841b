//! MapNav - live navigation tracking on top of an external mapping SDK
//!
//! This library turns raw device position updates into a managed, resumable
//! live-tracking session synchronized with a previously computed route. The
//! mapping SDK itself (rendering, routing, ETA) is external and reached
//! through the traits in [`sdk`].
//!
//! # Modules
//!
//! - [`route`] - route endpoints and the injected latest-route accessor
//! - [`position`] - device position sources and the single-watch guard
//! - [`sdk`] - mapping SDK seams plus an in-process implementation
//! - [`navigation`] - the tracking controller and its event loop
//! - [`config`] - navigation settings and the INI config file
//! - [`logging`] - tracing subscriber setup

pub mod config;
pub mod logging;
pub mod navigation;
pub mod position;
pub mod route;
pub mod sdk;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
