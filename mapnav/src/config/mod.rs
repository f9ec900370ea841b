//! Configuration.
//!
//! [`NavigationConfig`] is what the controller runs with; its defaults are
//! the reference behaviour. [`ConfigFile`] persists overrides as INI at
//! `~/.mapnav/config.ini`, and [`ConfigKey`] addresses individual settings
//! for the CLI.
//!
//! # Example
//!
//! ```
//! use mapnav::config::NavigationConfig;
//! use std::time::Duration;
//!
//! let config = NavigationConfig::default()
//!     .with_settle_delay(Duration::from_millis(750));
//! assert_eq!(config.forward_interval, Duration::from_secs(15));
//! ```

mod file;
mod keys;

use std::path::PathBuf;
use std::time::Duration;

use crate::position::{PositionOptions, PositionSample};
use crate::route::RouteContext;
use crate::sdk::{TrackingOptions, TrackingUpdate};

pub use file::{config_file_path, ConfigError, ConfigFile};
pub use keys::ConfigKey;

/// Minimum interval between updates forwarded into a tracking session.
///
/// Each forwarded update may trigger a re-route/ETA recompute against the
/// SDK's routing backend.
pub const DEFAULT_FORWARD_INTERVAL: Duration = Duration::from_secs(15);

/// Pause between tearing down a session and starting its replacement.
///
/// Compensates for the SDK removing layers asynchronously; it is not a wait
/// on any completion signal.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(500);

/// Default route line color.
pub const DEFAULT_ROUTE_COLOR: &str = "#3b82f6";

/// Default popup shown on the device marker.
pub const DEFAULT_POPUP_HTML: &str = "<div class=\"p-2\"><strong>Your Location</strong></div>";

/// Presentation of a new tracking visualization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisualConfig {
    /// Fit the camera to the route on creation.
    pub fit_bounds: bool,
    /// Device marker width in pixels.
    pub icon_width: u32,
    /// Route stroke width in pixels.
    pub stroke_width: u32,
    pub route_color: String,
    /// Draw a connector between the device and the route.
    pub connector: bool,
    pub popup_html: String,
}

impl Default for VisualConfig {
    fn default() -> Self {
        Self {
            fit_bounds: true,
            icon_width: 70,
            stroke_width: 7,
            route_color: DEFAULT_ROUTE_COLOR.to_string(),
            connector: true,
            popup_html: DEFAULT_POPUP_HTML.to_string(),
        }
    }
}

impl VisualConfig {
    /// Creation options for a visualization of `route`.
    pub fn tracking_options(&self, route: &RouteContext) -> TrackingOptions {
        TrackingOptions {
            start: route.origin,
            end: route.destination,
            fit_bounds: self.fit_bounds,
            icon_width: self.icon_width,
            stroke_width: self.stroke_width,
            route_color: self.route_color.clone(),
            connector: self.connector,
            popup_html: self.popup_html.clone(),
        }
    }
}

/// Options attached to every forwarded position update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateOptions {
    pub re_route: bool,
    pub heading: bool,
    pub map_center: bool,
    /// Deviation tolerance in meters.
    pub buffer_m: u32,
    /// Settle time before the SDK applies a recompute.
    pub delay: Duration,
    pub eta_refresh: bool,
    pub fit_bounds: bool,
}

impl Default for UpdateOptions {
    fn default() -> Self {
        Self {
            re_route: true,
            heading: true,
            map_center: true,
            buffer_m: 50,
            delay: Duration::from_secs(3),
            eta_refresh: true,
            fit_bounds: true,
        }
    }
}

impl UpdateOptions {
    /// The update payload for `sample`.
    pub fn tracking_update(&self, sample: &PositionSample) -> TrackingUpdate {
        TrackingUpdate {
            location: sample.lng_lat(),
            re_route: self.re_route,
            heading: self.heading,
            map_center: self.map_center,
            buffer_m: self.buffer_m,
            delay: self.delay,
            eta_refresh: self.eta_refresh,
            fit_bounds: self.fit_bounds,
        }
    }
}

/// Everything the navigation controller is configured with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationConfig {
    /// Forwarding gate interval.
    pub forward_interval: Duration,
    /// Restart settle delay.
    pub settle_delay: Duration,
    pub position: PositionOptions,
    pub visual: VisualConfig,
    pub update: UpdateOptions,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            forward_interval: DEFAULT_FORWARD_INTERVAL,
            settle_delay: DEFAULT_SETTLE_DELAY,
            position: PositionOptions::default(),
            visual: VisualConfig::default(),
            update: UpdateOptions::default(),
        }
    }
}

impl NavigationConfig {
    pub fn with_forward_interval(mut self, interval: Duration) -> Self {
        self.forward_interval = interval;
        self
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    pub fn with_position(mut self, position: PositionOptions) -> Self {
        self.position = position;
        self
    }

    pub fn with_visual(mut self, visual: VisualConfig) -> Self {
        self.visual = visual;
        self
    }

    pub fn with_update(mut self, update: UpdateOptions) -> Self {
        self.update = update;
        self
    }
}

/// Logging setup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset (e.g. `info`).
    pub level: String,
    /// Directory for daily log files; `None` logs to stderr only.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::RouteEndpoint;

    #[test]
    fn test_reference_defaults() {
        let config = NavigationConfig::default();
        assert_eq!(config.forward_interval, Duration::from_millis(15_000));
        assert_eq!(config.settle_delay, Duration::from_millis(500));
        assert_eq!(config.visual.icon_width, 70);
        assert_eq!(config.visual.stroke_width, 7);
        assert_eq!(config.update.buffer_m, 50);
        assert_eq!(config.update.delay, Duration::from_millis(3000));
    }

    #[test]
    fn test_tracking_options_bind_route() {
        let route = RouteContext::new(
            RouteEndpoint::new(28.60, 77.20).unwrap(),
            RouteEndpoint::new(28.65, 77.30).unwrap(),
        );
        let options = VisualConfig::default().tracking_options(&route);

        assert_eq!(options.start, route.origin);
        assert_eq!(options.end, route.destination);
        assert_eq!(options.route_color, "#3b82f6");
        assert!(options.connector);
    }

    #[test]
    fn test_tracking_update_passes_options_through() {
        let update = UpdateOptions {
            buffer_m: 80,
            heading: false,
            ..UpdateOptions::default()
        }
        .tracking_update(&PositionSample::new(28.61, 77.23, 0));

        assert_eq!(update.location, [77.23, 28.61]);
        assert_eq!(update.buffer_m, 80);
        assert!(!update.heading);
        assert!(update.re_route);
    }
}
