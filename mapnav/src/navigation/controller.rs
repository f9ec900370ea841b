//! The navigation state machine.
//!
//! [`NavigationController`] owns every piece of navigation state and is
//! driven synchronously: each method handles one event (start intent, stop
//! intent, position delivery, or the completion of a suspended step) and
//! returns. The two suspending steps of a start, the one-shot fix and the
//! restart settle delay, are handed back to the caller as a [`StartStep`]
//! tagged with a [`StartTicket`]. The caller runs them and reports back with
//! the ticket; a ticket invalidated by a stop in the meantime is discarded.
//!
//! [`NavigationService`](super::NavigationService) is the async event loop
//! that drives a controller.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

use super::cleanup::clean_map_surface;
use super::error::NavigationError;
use super::session::TrackingSession;
use super::state::{ControllerState, NavigationUiState};
use crate::config::NavigationConfig;
use crate::position::{BoxFuture, PositionEvent, PositionSample, PositionSource, PositionWatcher};
use crate::route::{RouteContext, RouteProvider};
use crate::sdk::SdkHandle;

/// Identifies one start attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartTicket(u64);

impl fmt::Display for StartTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "start#{}", self.0)
    }
}

/// What the caller must do next to progress a start.
pub enum StartStep {
    /// Await `fix`, then report it through
    /// [`complete_start`](NavigationController::complete_start).
    AcquireFix {
        ticket: StartTicket,
        fix: BoxFuture<'static, PositionEvent>,
    },
    /// Wait `delay`, then call
    /// [`settle_elapsed`](NavigationController::settle_elapsed).
    Settle { ticket: StartTicket, delay: Duration },
    /// A start is already in flight; its outcome applies to this request too.
    InProgress,
}

impl fmt::Debug for StartStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartStep::AcquireFix { ticket, .. } => {
                f.debug_struct("AcquireFix").field("ticket", ticket).finish()
            }
            StartStep::Settle { ticket, delay } => f
                .debug_struct("Settle")
                .field("ticket", ticket)
                .field("delay", delay)
                .finish(),
            StartStep::InProgress => f.write_str("InProgress"),
        }
    }
}

/// Navigation tracking controller.
///
/// Holds at most one [`TrackingSession`] and at most one position watch,
/// and keeps them in lockstep: the UI state reports `is_tracking` exactly
/// when both exist.
pub struct NavigationController {
    config: NavigationConfig,
    routes: Arc<dyn RouteProvider>,
    sdk: SdkHandle,
    watcher: PositionWatcher,
    state: ControllerState,
    session: Option<TrackingSession>,
    /// Route read when the current start entered `Starting`.
    pending_route: Option<RouteContext>,
    generation: u64,
    ui: watch::Sender<NavigationUiState>,
}

impl fmt::Debug for NavigationController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavigationController")
            .field("state", &self.state)
            .field("session", &self.session)
            .field("watcher", &self.watcher)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

impl NavigationController {
    pub fn new(
        config: NavigationConfig,
        routes: Arc<dyn RouteProvider>,
        sdk: SdkHandle,
        positions: Arc<dyn PositionSource>,
    ) -> Self {
        let watcher = PositionWatcher::new(positions, config.position);
        let (ui, _rx) = watch::channel(NavigationUiState::default());
        Self {
            config,
            routes,
            sdk,
            watcher,
            state: ControllerState::Idle,
            session: None,
            pending_route: None,
            generation: 0,
            ui,
        }
    }

    pub fn config(&self) -> &NavigationConfig {
        &self.config
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&TrackingSession> {
        self.session.as_ref()
    }

    pub fn watch_active(&self) -> bool {
        self.watcher.is_active()
    }

    /// Snapshot of the externally observable state.
    pub fn ui_state(&self) -> NavigationUiState {
        self.ui.borrow().clone()
    }

    /// Observe the externally observable state.
    pub fn subscribe(&self) -> watch::Receiver<NavigationUiState> {
        self.ui.subscribe()
    }

    /// Handle a start intent.
    ///
    /// From `Idle` the latest route is read and the one-shot fix requested.
    /// From `Active` the running session is torn down and a settle delay
    /// requested; the route is read only once it has elapsed.
    ///
    /// # Errors
    ///
    /// - `NavigationError::MapNotReady` if the SDK has not loaded
    /// - `NavigationError::NoRoute` if no valid route exists
    ///
    /// In both cases the state is unchanged.
    pub fn request_start(&mut self) -> Result<StartStep, NavigationError> {
        if self.state.is_pending() {
            tracing::debug!(state = %self.state, "Start already in progress");
            return Ok(StartStep::InProgress);
        }

        if !self.sdk.is_ready() {
            tracing::warn!(status = %self.sdk.status(), "Start requested before map is ready");
            return Err(self.report(NavigationError::MapNotReady));
        }

        match self.state {
            ControllerState::Active => {
                tracing::info!("Restarting navigation");
                self.teardown(ControllerState::Restarting);
                let ticket = self.next_ticket();
                Ok(StartStep::Settle {
                    ticket,
                    delay: self.config.settle_delay,
                })
            }
            _ => {
                let ticket = self.next_ticket();
                self.enter_starting(ticket)
            }
        }
    }

    /// The restart settle delay for `ticket` has elapsed.
    ///
    /// Returns `None` if the ticket is stale. Otherwise the latest route is
    /// read and the start proceeds, or fails with `NoRoute` and returns to
    /// `Idle`.
    pub fn settle_elapsed(
        &mut self,
        ticket: StartTicket,
    ) -> Option<Result<StartStep, NavigationError>> {
        if !self.is_current(ticket, ControllerState::Restarting) {
            tracing::debug!(ticket = %ticket, "Discarding stale settle delay");
            return None;
        }
        Some(self.enter_starting(ticket))
    }

    /// The one-shot fix for `ticket` has resolved.
    ///
    /// Returns `None` if the ticket is stale (a stop arrived meanwhile), in
    /// which case nothing is created. Otherwise creates the session, starts
    /// the watch and enters `Active`, or reverts to `Idle` on any failure.
    pub fn complete_start(
        &mut self,
        ticket: StartTicket,
        fix: PositionEvent,
        now: Instant,
    ) -> Option<Result<(), NavigationError>> {
        if !self.is_current(ticket, ControllerState::Starting) {
            tracing::debug!(ticket = %ticket, "Discarding late start completion");
            return None;
        }
        Some(self.activate(fix, now))
    }

    /// Handle a stop intent.
    ///
    /// Returns `false` (and does nothing) when already `Idle`. A stop during
    /// `Starting` or `Restarting` invalidates the start in flight.
    pub fn request_stop(&mut self) -> bool {
        match self.state {
            ControllerState::Idle | ControllerState::Stopping => {
                tracing::debug!("Stop requested while idle");
                false
            }
            state => {
                if state.is_pending() {
                    tracing::info!(state = %state, "Cancelling navigation start");
                    self.generation += 1;
                    self.pending_route = None;
                }
                self.teardown(ControllerState::Idle);
                tracing::info!("Navigation stopped");
                true
            }
        }
    }

    /// Wait for the next event of the running watch.
    ///
    /// Never resolves while no watch is running.
    pub async fn next_position(&mut self) -> PositionEvent {
        self.watcher.next_event().await
    }

    /// Handle one watch delivery.
    ///
    /// Every sample updates the displayed position; it reaches the session
    /// only if the forwarding gate lets it through. Watch errors are reported
    /// through `last_error` and tracking continues.
    pub fn on_position(&mut self, event: PositionEvent, now: Instant) {
        if self.state != ControllerState::Active {
            tracing::debug!(state = %self.state, "Ignoring position outside an active session");
            return;
        }

        let sample = match event {
            Ok(sample) => sample,
            Err(e) => {
                tracing::warn!(error = %e, "Position watch error");
                self.report(NavigationError::PositionAcquisition(e));
                return;
            }
        };

        if let Some(session) = self.session.as_mut() {
            session.offer(&sample, &self.config.update, now);
        }
        self.ui.send_modify(|ui| ui.last_known_position = Some(sample));
    }

    fn next_ticket(&mut self) -> StartTicket {
        self.generation += 1;
        StartTicket(self.generation)
    }

    fn is_current(&self, ticket: StartTicket, expected: ControllerState) -> bool {
        ticket.0 == self.generation && self.state == expected
    }

    fn enter_starting(&mut self, ticket: StartTicket) -> Result<StartStep, NavigationError> {
        let Some(route) = self.routes.latest() else {
            tracing::warn!("Start requested without a computed route");
            self.set_state(ControllerState::Idle);
            return Err(self.report(NavigationError::NoRoute));
        };

        tracing::info!(route = %route, ticket = %ticket, "Starting navigation");
        self.pending_route = Some(route);
        self.set_state(ControllerState::Starting);
        Ok(StartStep::AcquireFix {
            ticket,
            fix: self.watcher.acquire_fix(),
        })
    }

    fn activate(&mut self, fix: PositionEvent, now: Instant) -> Result<(), NavigationError> {
        let route = self.pending_route.take();
        match self.try_activate(route, fix, now) {
            Ok(sample) => {
                self.enter(ControllerState::Active);
                self.ui.send_modify(|ui| {
                    ui.phase = ControllerState::Active;
                    ui.is_tracking = true;
                    ui.last_known_position = Some(sample);
                    ui.last_error = None;
                });
                tracing::info!("Navigation active");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Navigation start failed");
                self.teardown(ControllerState::Idle);
                Err(self.report(e))
            }
        }
    }

    fn try_activate(
        &mut self,
        route: Option<RouteContext>,
        fix: PositionEvent,
        now: Instant,
    ) -> Result<PositionSample, NavigationError> {
        let sample = fix?;
        let route = route.ok_or(NavigationError::NoRoute)?;
        let (Some(map), Some(tracking)) = (self.sdk.map(), self.sdk.tracking()) else {
            return Err(NavigationError::MapNotReady);
        };

        let session = TrackingSession::create(&*tracking, map, route, &self.config, now)?;
        self.session = Some(session);
        self.watcher.begin()?;
        Ok(sample)
    }

    /// Stop sequence: cancel the watch, destroy the session, clean the map.
    ///
    /// Always completes; `after` is the state it ends in.
    fn teardown(&mut self, after: ControllerState) {
        // Stopping is internal and never published
        self.enter(ControllerState::Stopping);

        self.watcher.end();
        if let Some(session) = self.session.take() {
            session.destroy();
        }

        let map = self.sdk.map();
        clean_map_surface(map.as_deref());

        self.enter(after);
        self.ui.send_modify(|ui| {
            ui.phase = after;
            ui.is_tracking = false;
            ui.last_known_position = None;
        });
    }

    fn enter(&mut self, state: ControllerState) {
        if self.state != state {
            tracing::debug!(from = %self.state, to = %state, "Navigation state changed");
            self.state = state;
        }
    }

    fn set_state(&mut self, state: ControllerState) {
        self.enter(state);
        self.ui.send_if_modified(|ui| {
            let changed = ui.phase != state;
            ui.phase = state;
            changed
        });
    }

    fn report(&self, error: NavigationError) -> NavigationError {
        let message = error.user_message();
        self.ui.send_modify(|ui| ui.last_error = Some(message));
        error
    }
}

impl Drop for NavigationController {
    fn drop(&mut self) {
        if self.state != ControllerState::Idle {
            self.request_stop();
        }
    }
}
