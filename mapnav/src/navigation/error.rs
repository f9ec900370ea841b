//! Navigation failures.

use thiserror::Error;

use crate::position::PositionError;
use crate::sdk::SdkError;

/// Broad category of a navigation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// A start was requested before its preconditions held.
    Precondition,
    /// The device could not produce a position.
    Acquisition,
    /// The SDK's tracking primitive failed.
    Session,
    /// The request was overtaken by a stop or shutdown.
    Cancelled,
}

/// Why a navigation start did not result in an active session.
///
/// None of these are fatal: the controller is back in `Idle` whenever one is
/// returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigationError {
    /// No valid route has been computed.
    #[error("No route available")]
    NoRoute,

    /// The map or tracking plugin has not loaded.
    #[error("Map or tracking plugin not ready")]
    MapNotReady,

    /// The device position could not be acquired.
    #[error("Failed to get location: {0}")]
    PositionAcquisition(#[from] PositionError),

    /// The tracking primitive refused to create a session.
    #[error("Failed to create tracking session: {0}")]
    SessionCreation(#[from] SdkError),

    /// A stop arrived before the start completed.
    #[error("Navigation start cancelled")]
    StartCancelled,

    /// The navigation service is no longer running.
    #[error("Navigation service has stopped")]
    ServiceStopped,
}

impl NavigationError {
    pub fn class(&self) -> ErrorClass {
        match self {
            NavigationError::NoRoute | NavigationError::MapNotReady => ErrorClass::Precondition,
            NavigationError::PositionAcquisition(_) => ErrorClass::Acquisition,
            NavigationError::SessionCreation(_) => ErrorClass::Session,
            NavigationError::StartCancelled | NavigationError::ServiceStopped => {
                ErrorClass::Cancelled
            }
        }
    }

    /// Text for the alert shown to the user.
    pub fn user_message(&self) -> String {
        match self {
            NavigationError::NoRoute => {
                "Please calculate a route in the direction panel first".to_string()
            }
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_classes() {
        assert_eq!(NavigationError::NoRoute.class(), ErrorClass::Precondition);
        assert_eq!(NavigationError::MapNotReady.class(), ErrorClass::Precondition);
        assert_eq!(
            NavigationError::from(PositionError::Unsupported).class(),
            ErrorClass::Acquisition
        );
        assert_eq!(
            NavigationError::from(SdkError::Rejected("no".into())).class(),
            ErrorClass::Session
        );
        assert_eq!(NavigationError::StartCancelled.class(), ErrorClass::Cancelled);
    }

    #[test]
    fn test_no_route_guidance() {
        assert_eq!(
            NavigationError::NoRoute.user_message(),
            "Please calculate a route in the direction panel first"
        );
    }

    #[test]
    fn test_acquisition_message_passes_through() {
        let err = NavigationError::from(PositionError::Timeout(Duration::from_secs(10)));
        assert_eq!(
            err.user_message(),
            "Failed to get location: Timed out acquiring position after 10000ms"
        );
    }
}
