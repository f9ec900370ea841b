//! Payload published by the external direction feature.
//!
//! Only the request list is read; everything else the direction plugin
//! reports (summaries, alternatives, ETA) belongs to the route-search UI.

use serde::{Deserialize, Serialize};

use super::endpoint::{RouteContext, RouteEndpoint};

/// One requested stop of a route computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteRequest {
    /// `"lat,lng"` as produced by the direction feature.
    pub geoposition: String,
}

impl RouteRequest {
    pub fn new(geoposition: impl Into<String>) -> Self {
        Self {
            geoposition: geoposition.into(),
        }
    }
}

/// Most recent result of the external route computation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DirectionResult {
    /// Ordered request endpoints (origin first).
    #[serde(rename = "Request", default)]
    pub requests: Vec<RouteRequest>,
}

impl DirectionResult {
    /// Build a result from an ordered list of endpoints.
    pub fn from_endpoints(endpoints: &[RouteEndpoint]) -> Self {
        Self {
            requests: endpoints
                .iter()
                .map(|e| RouteRequest::new(e.geoposition()))
                .collect(),
        }
    }

    /// Extract the route context, if this result is usable.
    ///
    /// The first two requests are origin and destination. Results with fewer
    /// than two requests, or whose first two geopositions do not parse, yield
    /// `None`.
    pub fn route_context(&self) -> Option<RouteContext> {
        let [start, end, ..] = self.requests.as_slice() else {
            return None;
        };

        let origin = match start.geoposition.parse() {
            Ok(endpoint) => endpoint,
            Err(e) => {
                tracing::warn!(
                    geoposition = %start.geoposition,
                    error = %e,
                    "Direction result has unusable origin"
                );
                return None;
            }
        };
        let destination = match end.geoposition.parse() {
            Ok(endpoint) => endpoint,
            Err(e) => {
                tracing::warn!(
                    geoposition = %end.geoposition,
                    error = %e,
                    "Direction result has unusable destination"
                );
                return None;
            }
        };

        Some(RouteContext::new(origin, destination))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_plugin_payload() {
        let json = r#"{
            "Request": [
                {"geoposition": "28.60,77.20"},
                {"geoposition": "28.65,77.30"}
            ],
            "Summary": {"distance": 12000}
        }"#;
        let result: DirectionResult = serde_json::from_str(json).unwrap();
        let route = result.route_context().unwrap();

        assert_eq!(route.origin.latitude, 28.60);
        assert_eq!(route.origin.longitude, 77.20);
        assert_eq!(route.destination.latitude, 28.65);
        assert_eq!(route.destination.longitude, 77.30);
    }

    #[test]
    fn test_missing_request_list_is_invalid() {
        let result: DirectionResult = serde_json::from_str("{}").unwrap();
        assert!(result.route_context().is_none());
    }

    #[test]
    fn test_single_request_is_invalid() {
        let result = DirectionResult {
            requests: vec![RouteRequest::new("28.60,77.20")],
        };
        assert!(result.route_context().is_none());
    }

    #[test]
    fn test_unparseable_endpoint_is_invalid() {
        let result = DirectionResult {
            requests: vec![RouteRequest::new("28.60,77.20"), RouteRequest::new("nowhere")],
        };
        assert!(result.route_context().is_none());
    }

    /// Collects formatted log output.
    #[derive(Clone, Default)]
    struct CapturedLogs(std::sync::Arc<parking_lot::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_unparseable_endpoint_is_logged_as_warning() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_writer(move || writer.clone())
            .finish();

        let result = DirectionResult {
            requests: vec![RouteRequest::new("PLACE01"), RouteRequest::new("28.65,77.30")],
        };
        let route = tracing::subscriber::with_default(subscriber, || result.route_context());
        assert!(route.is_none());

        let output = String::from_utf8_lossy(&logs.0.lock()).into_owned();
        assert!(output.contains("WARN"), "no warning in: {}", output);
        assert!(output.contains("unusable origin"));
        assert!(output.contains("PLACE01"));
    }

    #[test]
    fn test_via_points_use_second_request_as_destination() {
        let result = DirectionResult {
            requests: vec![
                RouteRequest::new("28.60,77.20"),
                RouteRequest::new("28.62,77.25"),
                RouteRequest::new("28.65,77.30"),
            ],
        };
        let route = result.route_context().unwrap();
        assert_eq!(route.destination.longitude, 77.25);
    }

    #[test]
    fn test_from_endpoints() {
        let a = RouteEndpoint::new(1.0, 2.0).unwrap();
        let b = RouteEndpoint::new(3.0, 4.0).unwrap();
        let result = DirectionResult::from_endpoints(&[a, b]);

        assert_eq!(result.requests.len(), 2);
        assert_eq!(result.route_context(), Some(RouteContext::new(a, b)));
    }
}
