//! One live tracking visualization.

use std::fmt;
use std::sync::Arc;

use tokio::time::Instant;

use super::gate::ForwardingGate;
use crate::config::{NavigationConfig, UpdateOptions};
use crate::position::PositionSample;
use crate::route::RouteContext;
use crate::sdk::{MapSurface, SdkError, TrackingHandle, TrackingPrimitive};

/// Owns the SDK handle of one live-tracking visualization and the gate
/// deciding which samples reach it.
pub struct TrackingSession {
    handle: Box<dyn TrackingHandle>,
    route: RouteContext,
    gate: ForwardingGate,
    created_at: Instant,
    updates_forwarded: u64,
}

impl fmt::Debug for TrackingSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackingSession")
            .field("route", &self.route)
            .field("gate", &self.gate)
            .field("updates_forwarded", &self.updates_forwarded)
            .finish_non_exhaustive()
    }
}

impl TrackingSession {
    /// Create the visualization for `route` on `map`.
    ///
    /// The forwarding gate is armed at `now`.
    pub fn create(
        primitive: &dyn TrackingPrimitive,
        map: Arc<dyn MapSurface>,
        route: RouteContext,
        config: &NavigationConfig,
        now: Instant,
    ) -> Result<Self, SdkError> {
        let options = config.visual.tracking_options(&route);
        let handle = primitive.create(map, options)?;

        tracing::info!(route = %route, "Tracking session created");
        Ok(Self {
            handle,
            route,
            gate: ForwardingGate::armed(config.forward_interval, now),
            created_at: now,
            updates_forwarded: 0,
        })
    }

    pub fn route(&self) -> &RouteContext {
        &self.route
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// When an update was last pushed (creation time if none yet).
    pub fn last_update(&self) -> Instant {
        self.gate.last_passed()
    }

    pub fn updates_forwarded(&self) -> u64 {
        self.updates_forwarded
    }

    /// Offer a sample; it is pushed only if the gate lets it through.
    ///
    /// Returns whether the sample was forwarded.
    pub fn offer(&mut self, sample: &PositionSample, options: &UpdateOptions, now: Instant) -> bool {
        if !self.gate.try_pass(now) {
            tracing::trace!(sample = %sample, "Sample held back by forwarding gate");
            return false;
        }
        self.push_update(sample, options);
        true
    }

    /// Push one update into the visualization.
    ///
    /// SDK failures are logged; the sample still counts as forwarded.
    pub fn push_update(&mut self, sample: &PositionSample, options: &UpdateOptions) {
        self.updates_forwarded += 1;
        match self.handle.tracking_call(options.tracking_update(sample)) {
            Ok(()) => tracing::debug!(
                sample = %sample,
                forwarded = self.updates_forwarded,
                "Tracking position updated"
            ),
            Err(e) => tracing::warn!(error = %e, sample = %sample, "Tracking update failed"),
        }
    }

    /// Remove the visualization. Never fails; problems are logged.
    pub fn destroy(mut self) {
        match self.handle.remove() {
            Ok(()) => tracing::debug!("Tracking plugin removed"),
            Err(SdkError::Unsupported(_)) => {
                tracing::debug!("Tracking plugin has no remove capability")
            }
            Err(e) => tracing::warn!(error = %e, "Error removing tracking"),
        }
        tracing::info!(
            updates_forwarded = self.updates_forwarded,
            "Tracking session destroyed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::RouteEndpoint;
    use crate::sdk::memory::{InMemoryMap, RecordingTracker, RemoveBehavior};
    use std::time::Duration;

    fn route() -> RouteContext {
        RouteContext::new(
            RouteEndpoint::new(28.60, 77.20).unwrap(),
            RouteEndpoint::new(28.65, 77.30).unwrap(),
        )
    }

    fn create(tracker: &RecordingTracker, now: Instant) -> TrackingSession {
        TrackingSession::create(
            tracker,
            Arc::new(InMemoryMap::new()),
            route(),
            &NavigationConfig::default(),
            now,
        )
        .unwrap()
    }

    #[test]
    fn test_create_passes_visual_config() {
        let tracker = RecordingTracker::new();
        let session = create(&tracker, Instant::now());

        let log = tracker.log();
        assert_eq!(log.created.len(), 1);
        assert_eq!(log.created[0].start, route().origin);
        assert_eq!(log.created[0].icon_width, 70);
        assert_eq!(session.route(), &route());
    }

    #[test]
    fn test_create_failure_is_reported() {
        let tracker = RecordingTracker::new();
        tracker.reject_creation("bad key");

        let result = TrackingSession::create(
            &tracker,
            Arc::new(InMemoryMap::new()),
            route(),
            &NavigationConfig::default(),
            Instant::now(),
        );
        assert!(matches!(result, Err(SdkError::Rejected(_))));
    }

    #[test]
    fn test_offer_respects_gate_from_creation() {
        let tracker = RecordingTracker::new();
        let t0 = Instant::now();
        let mut session = create(&tracker, t0);
        let options = UpdateOptions::default();

        let early = PositionSample::new(28.611, 77.231, 2_000);
        let late = PositionSample::new(28.612, 77.232, 16_000);
        assert!(!session.offer(&early, &options, t0 + Duration::from_millis(2_000)));
        assert!(session.offer(&late, &options, t0 + Duration::from_millis(16_000)));

        let log = tracker.log();
        assert_eq!(log.updates.len(), 1);
        assert_eq!(log.updates[0].location, [77.232, 28.612]);
        assert_eq!(session.updates_forwarded(), 1);
        assert_eq!(session.last_update(), t0 + Duration::from_millis(16_000));
    }

    #[test]
    fn test_destroy_tolerates_failing_remove() {
        let tracker = RecordingTracker::new();
        tracker.set_remove_behavior(RemoveBehavior::Fails);
        let session = create(&tracker, Instant::now());

        session.destroy();
        assert_eq!(tracker.log().live, 0);
    }

    #[test]
    fn test_destroy_tolerates_absent_remove() {
        let tracker = RecordingTracker::new();
        tracker.set_remove_behavior(RemoveBehavior::Absent);
        let session = create(&tracker, Instant::now());

        session.destroy();
        let log = tracker.log();
        assert_eq!(log.removals, 0);
        assert_eq!(log.live, 0);
    }
}
