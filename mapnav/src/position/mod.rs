//! Device position acquisition.
//!
//! The device location capability is reached through the [`PositionSource`]
//! trait. [`PositionWatcher`] wraps a source and enforces the subscription
//! rules the navigation controller relies on:
//!
//! - at most one continuous watch at a time
//! - cancelling is idempotent
//! - one-shot fixes are bounded by the configured timeout
//!
//! # Example
//!
//! ```ignore
//! let mut watcher = PositionWatcher::new(source, PositionOptions::default());
//!
//! let fix = watcher.acquire_fix().await?;
//! watcher.begin()?;
//! while let event = watcher.next_event().await {
//!     // ...
//! }
//! watcher.end();
//! ```

mod replay;
mod source;
mod types;
mod watcher;

pub use replay::{ReplayPositionSource, TrackEvent, TrackPoint};
pub use source::{BoxFuture, PositionEvent, PositionSource, PositionStream, WatchId};
pub use types::{PositionError, PositionOptions, PositionSample};
pub use watcher::PositionWatcher;
