//! Route endpoints and the origin/destination pair.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced while reading route endpoints.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RouteError {
    /// The geoposition string is not of the form `"lat,lng"`.
    #[error("Malformed geoposition '{0}': expected \"lat,lng\"")]
    MalformedGeoposition(String),

    /// A coordinate lies outside the valid WGS84 range.
    #[error("Coordinate out of range: lat={latitude}, lng={longitude}")]
    OutOfRange { latitude: f64, longitude: f64 },
}

/// A single route endpoint in degrees (WGS84).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RouteEndpoint {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

impl RouteEndpoint {
    /// Create an endpoint, validating the coordinate range.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, RouteError> {
        let in_range = (-90.0..=90.0).contains(&latitude) && (-180.0..=180.0).contains(&longitude);
        if !in_range {
            return Err(RouteError::OutOfRange {
                latitude,
                longitude,
            });
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// The `"lat,lng"` form the tracking primitive expects.
    pub fn geoposition(&self) -> String {
        format!("{},{}", self.latitude, self.longitude)
    }
}

impl fmt::Display for RouteEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.5}, {:.5})", self.latitude, self.longitude)
    }
}

impl FromStr for RouteEndpoint {
    type Err = RouteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || RouteError::MalformedGeoposition(s.to_string());

        let (lat, lng) = s.split_once(',').ok_or_else(malformed)?;
        let latitude: f64 = lat.trim().parse().map_err(|_| malformed())?;
        let longitude: f64 = lng.trim().parse().map_err(|_| malformed())?;

        Self::new(latitude, longitude)
    }
}

/// Origin and destination of the most recently computed route.
///
/// Immutable once read; a fresh copy is taken every time the controller
/// needs one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RouteContext {
    pub origin: RouteEndpoint,
    pub destination: RouteEndpoint,
}

impl RouteContext {
    pub fn new(origin: RouteEndpoint, destination: RouteEndpoint) -> Self {
        Self {
            origin,
            destination,
        }
    }
}

impl fmt::Display for RouteContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.origin, self.destination)
    }
}
