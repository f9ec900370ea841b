//! Position samples, acquisition options and failures.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default per-request acquisition timeout.
pub const DEFAULT_ACQUISITION_TIMEOUT: Duration = Duration::from_secs(10);

/// A single device position fix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionSample {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Time the fix was taken, in milliseconds (source-defined epoch).
    pub timestamp_ms: u64,
}

impl PositionSample {
    pub fn new(latitude: f64, longitude: f64, timestamp_ms: u64) -> Self {
        Self {
            latitude,
            longitude,
            timestamp_ms,
        }
    }

    /// `[lng, lat]`, the order the tracking primitive expects.
    pub fn lng_lat(&self) -> [f64; 2] {
        [self.longitude, self.latitude]
    }

    /// Status readout: both coordinates to 5 decimal places.
    pub fn readout(&self) -> String {
        format!("{:.5}, {:.5}", self.latitude, self.longitude)
    }
}

impl fmt::Display for PositionSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {}ms", self.readout(), self.timestamp_ms)
    }
}

/// Options passed to every acquisition request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    /// Request the most accurate fix the device can produce.
    pub high_accuracy: bool,
    /// Oldest cached fix that may be returned (zero: never use a cached fix).
    pub maximum_age: Duration,
    /// Time allowed for a single acquisition before it fails.
    pub timeout: Duration,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            maximum_age: Duration::ZERO,
            timeout: DEFAULT_ACQUISITION_TIMEOUT,
        }
    }
}

/// Failure to obtain a position.
///
/// Messages are human readable; they end up in user-facing alerts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PositionError {
    /// The user (or platform) denied access to location.
    #[error("Location permission denied: {0}")]
    PermissionDenied(String),

    /// The device could not determine its position.
    #[error("Position unavailable: {0}")]
    Unavailable(String),

    /// No fix arrived within the configured timeout.
    #[error("Timed out acquiring position after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// The platform gave up on the request before producing a fix.
    #[error("Position request timed out: {0}")]
    TimedOut(String),

    /// The device has no location capability.
    #[error("Geolocation is not supported by this device")]
    Unsupported,

    /// A continuous watch is already running.
    #[error("A position watch is already active")]
    AlreadyWatching,
}

impl PositionError {
    /// Map a platform geolocation error code onto a variant.
    ///
    /// Codes follow the usual geolocation convention: 1 permission denied,
    /// 2 position unavailable, 3 timeout. Anything else is reported as
    /// unavailable.
    pub fn from_code(code: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match code {
            1 => PositionError::PermissionDenied(message),
            3 => PositionError::TimedOut(message),
            _ => PositionError::Unavailable(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = PositionOptions::default();
        assert!(options.high_accuracy);
        assert_eq!(options.maximum_age, Duration::ZERO);
        assert_eq!(options.timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_readout_five_decimals() {
        let sample = PositionSample::new(28.61, 77.23, 0);
        assert_eq!(sample.readout(), "28.61000, 77.23000");
    }

    #[test]
    fn test_lng_lat_order() {
        let sample = PositionSample::new(28.61, 77.23, 0);
        assert_eq!(sample.lng_lat(), [77.23, 28.61]);
    }

    #[test]
    fn test_from_code() {
        assert!(matches!(
            PositionError::from_code(1, "denied"),
            PositionError::PermissionDenied(m) if m == "denied"
        ));
        assert!(matches!(
            PositionError::from_code(2, "no signal"),
            PositionError::Unavailable(_)
        ));
        let timeout = PositionError::from_code(3, "Timeout expired after 5000ms");
        assert_eq!(
            timeout,
            PositionError::TimedOut("Timeout expired after 5000ms".into())
        );
        assert_eq!(
            timeout.to_string(),
            "Position request timed out: Timeout expired after 5000ms"
        );
        assert!(matches!(
            PositionError::from_code(42, "odd"),
            PositionError::Unavailable(_)
        ));
    }

    #[test]
    fn test_error_messages_are_readable() {
        let err = PositionError::Timeout(Duration::from_secs(10));
        assert_eq!(err.to_string(), "Timed out acquiring position after 10000ms");
        assert_eq!(
            PositionError::PermissionDenied("User denied Geolocation".into()).to_string(),
            "Location permission denied: User denied Geolocation"
        );
    }
}
