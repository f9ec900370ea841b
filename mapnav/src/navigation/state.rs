//! Controller states and the externally observable navigation state.

use std::fmt;

use crate::position::PositionSample;

/// Lifecycle state of the navigation controller.
///
/// ```text
///            start                fix + session           stop
///   Idle ------------> Starting -----------------> Active -----> Stopping --> Idle
///    ^                  |   ^                        |
///    |   any failure    |   |    settle delay        | start
///    +------------------+   +------ Restarting <-----+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControllerState {
    #[default]
    Idle,
    /// Waiting for the one-shot fix.
    Starting,
    /// A session is live and the watch is running.
    Active,
    /// Old session torn down, waiting out the settle delay.
    Restarting,
    /// Tearing down.
    Stopping,
}

impl ControllerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ControllerState::Idle => "Idle",
            ControllerState::Starting => "Starting",
            ControllerState::Active => "Active",
            ControllerState::Restarting => "Restarting",
            ControllerState::Stopping => "Stopping",
        }
    }

    /// A start is in flight.
    pub fn is_pending(&self) -> bool {
        matches!(self, ControllerState::Starting | ControllerState::Restarting)
    }
}

impl fmt::Display for ControllerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the UI layer sees.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NavigationUiState {
    pub phase: ControllerState,
    /// A session and watch are live.
    pub is_tracking: bool,
    /// Most recent sample, updated on every delivery.
    pub last_known_position: Option<PositionSample>,
    /// Alert text of the latest failure, cleared by a successful start.
    pub last_error: Option<String>,
}

impl NavigationUiState {
    /// Coordinates to show while tracking.
    pub fn readout(&self) -> Option<String> {
        if !self.is_tracking {
            return None;
        }
        self.last_known_position.as_ref().map(PositionSample::readout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_idle() {
        let state = NavigationUiState::default();
        assert_eq!(state.phase, ControllerState::Idle);
        assert!(!state.is_tracking);
        assert!(state.readout().is_none());
    }

    #[test]
    fn test_readout_only_while_tracking() {
        let mut state = NavigationUiState {
            last_known_position: Some(PositionSample::new(28.61, 77.23, 0)),
            ..Default::default()
        };
        assert!(state.readout().is_none());

        state.is_tracking = true;
        assert_eq!(state.readout().as_deref(), Some("28.61000, 77.23000"));
    }

    #[test]
    fn test_pending_states() {
        assert!(ControllerState::Starting.is_pending());
        assert!(ControllerState::Restarting.is_pending());
        assert!(!ControllerState::Active.is_pending());
        assert!(!ControllerState::Idle.is_pending());
    }
}
