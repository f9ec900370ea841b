//! Injected accessor for the latest route.

use tokio::sync::watch;

use super::direction::DirectionResult;
use super::endpoint::RouteContext;

/// Read-only access to the most recently computed route.
///
/// The controller calls [`latest`](RouteProvider::latest) at the moment it
/// needs a route and never caches the answer across a restart; the direction
/// feature may replace the route at any time.
pub trait RouteProvider: Send + Sync {
    /// Returns the current route, or `None` when no valid route exists.
    fn latest(&self) -> Option<RouteContext>;
}

impl<F> RouteProvider for F
where
    F: Fn() -> Option<RouteContext> + Send + Sync,
{
    fn latest(&self) -> Option<RouteContext> {
        self()
    }
}

/// Observable holder for the direction feature's latest result.
///
/// The direction feature publishes into it from its own callback; the
/// controller reads it through [`RouteProvider`]. Other parties can
/// [`subscribe`](LatestRoute::subscribe) to be told when it changes.
#[derive(Debug)]
pub struct LatestRoute {
    tx: watch::Sender<Option<DirectionResult>>,
}

impl LatestRoute {
    /// Create an empty holder (no route computed yet).
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    /// Replace the latest result.
    pub fn publish(&self, result: DirectionResult) {
        tracing::debug!(requests = result.requests.len(), "Direction result updated");
        self.tx.send_replace(Some(result));
    }

    /// Forget the latest result.
    pub fn clear(&self) {
        self.tx.send_replace(None);
    }

    /// Receive change notifications for the raw direction result.
    pub fn subscribe(&self) -> watch::Receiver<Option<DirectionResult>> {
        self.tx.subscribe()
    }
}

impl Default for LatestRoute {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteProvider for LatestRoute {
    fn latest(&self) -> Option<RouteContext> {
        self.tx
            .borrow()
            .as_ref()
            .and_then(DirectionResult::route_context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::RouteEndpoint;

    fn endpoints(a: (f64, f64), b: (f64, f64)) -> [RouteEndpoint; 2] {
        [
            RouteEndpoint::new(a.0, a.1).unwrap(),
            RouteEndpoint::new(b.0, b.1).unwrap(),
        ]
    }

    #[test]
    fn test_empty_holder_has_no_route() {
        assert!(LatestRoute::new().latest().is_none());
    }

    #[test]
    fn test_publish_replaces_route() {
        let latest = LatestRoute::new();
        latest.publish(DirectionResult::from_endpoints(&endpoints((1.0, 1.0), (2.0, 2.0))));
        latest.publish(DirectionResult::from_endpoints(&endpoints((1.0, 1.0), (3.0, 3.0))));

        assert_eq!(latest.latest().unwrap().destination.latitude, 3.0);
    }

    #[test]
    fn test_clear_invalidates_route() {
        let latest = LatestRoute::new();
        latest.publish(DirectionResult::from_endpoints(&endpoints((1.0, 1.0), (2.0, 2.0))));
        latest.clear();
        assert!(latest.latest().is_none());
    }

    #[test]
    fn test_subscribers_see_updates() {
        let latest = LatestRoute::new();
        let mut rx = latest.subscribe();
        latest.publish(DirectionResult::default());

        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_some());
    }

    #[test]
    fn test_closure_provider() {
        let [a, b] = endpoints((1.0, 1.0), (2.0, 2.0));
        let provider = move || Some(RouteContext::new(a, b));
        assert_eq!(provider.latest().unwrap().origin, a);
    }
}
