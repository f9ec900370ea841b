//! The device location capability.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use tokio::sync::mpsc;

use super::types::{PositionError, PositionOptions, PositionSample};

/// Boxed future type for dyn-compatible async methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// One delivery from a position source: a fix or a failure.
pub type PositionEvent = Result<PositionSample, PositionError>;

/// Identifier of a continuous watch, issued by the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WatchId(pub u64);

impl fmt::Display for WatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "watch#{}", self.0)
    }
}

/// A running continuous watch.
#[derive(Debug)]
pub struct PositionStream {
    pub id: WatchId,
    pub events: mpsc::UnboundedReceiver<PositionEvent>,
}

/// Access to the device's location capability.
///
/// Implementations deliver events in whatever order the platform produces
/// them; consumers never reorder.
///
/// # Implementors
///
/// - `ReplayPositionSource` - replays a recorded track on a timeline
/// - host adapters bridging the platform geolocation API
pub trait PositionSource: Send + Sync {
    /// Acquire a single fix.
    fn current_position(&self, options: &PositionOptions) -> BoxFuture<'_, PositionEvent>;

    /// Start a continuous watch.
    ///
    /// Events flow through the returned stream until
    /// [`clear_watch`](PositionSource::clear_watch) is called with its id.
    fn watch_position(&self, options: &PositionOptions) -> Result<PositionStream, PositionError>;

    /// Stop a continuous watch. Unknown ids are ignored.
    fn clear_watch(&self, id: WatchId);
}
