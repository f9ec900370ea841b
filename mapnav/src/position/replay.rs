//! Position source that replays a recorded track.
//!
//! The track is a timeline that starts when the source is created. A one-shot
//! request returns the most recent event at or before "now" (waiting for the
//! first one if the timeline has not reached it yet); a watch delivers every
//! later event at its scheduled offset.
//!
//! Tracks are JSON lists:
//!
//! ```json
//! [
//!   {"offset_ms": 0,     "latitude": 28.61, "longitude": 77.23},
//!   {"offset_ms": 2000,  "latitude": 28.612, "longitude": 77.232},
//!   {"offset_ms": 9000,  "error": "signal lost", "code": 2},
//!   {"offset_ms": 16000, "latitude": 28.615, "longitude": 77.236}
//! ]
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::source::{BoxFuture, PositionEvent, PositionSource, PositionStream, WatchId};
use super::types::{PositionError, PositionOptions, PositionSample};

/// What happens at a point on the track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TrackEvent {
    Fix {
        latitude: f64,
        longitude: f64,
    },
    Error {
        error: String,
        #[serde(default)]
        code: Option<u16>,
    },
}

/// One scheduled event on a recorded track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    /// Offset from the start of the timeline.
    pub offset_ms: u64,
    #[serde(flatten)]
    pub event: TrackEvent,
}

impl TrackPoint {
    pub fn fix(offset_ms: u64, latitude: f64, longitude: f64) -> Self {
        Self {
            offset_ms,
            event: TrackEvent::Fix {
                latitude,
                longitude,
            },
        }
    }

    pub fn error(offset_ms: u64, message: impl Into<String>) -> Self {
        Self {
            offset_ms,
            event: TrackEvent::Error {
                error: message.into(),
                code: None,
            },
        }
    }

    fn offset(&self) -> Duration {
        Duration::from_millis(self.offset_ms)
    }

    fn to_event(&self) -> PositionEvent {
        match &self.event {
            TrackEvent::Fix {
                latitude,
                longitude,
            } => Ok(PositionSample::new(*latitude, *longitude, self.offset_ms)),
            TrackEvent::Error { error, code } => {
                Err(PositionError::from_code(code.unwrap_or(2), error.clone()))
            }
        }
    }
}

/// Replays a recorded track as a position source.
///
/// Watches run as tokio tasks, so [`watch_position`](PositionSource::watch_position)
/// must be called from within a runtime.
pub struct ReplayPositionSource {
    track: Arc<Vec<TrackPoint>>,
    origin: Instant,
    next_watch: AtomicU64,
    watches: Mutex<HashMap<WatchId, CancellationToken>>,
}

impl std::fmt::Debug for ReplayPositionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplayPositionSource")
            .field("points", &self.track.len())
            .field("active_watches", &self.watches.lock().len())
            .finish_non_exhaustive()
    }
}

impl ReplayPositionSource {
    /// Create a source whose timeline starts now.
    pub fn new(mut track: Vec<TrackPoint>) -> Self {
        track.sort_by_key(|p| p.offset_ms);
        Self {
            track: Arc::new(track),
            origin: Instant::now(),
            next_watch: AtomicU64::new(1),
            watches: Mutex::new(HashMap::new()),
        }
    }

    /// Load a JSON track file.
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let track: Vec<TrackPoint> = serde_json::from_str(&contents)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        Ok(Self::new(track))
    }

    /// Number of points on the track.
    pub fn len(&self) -> usize {
        self.track.len()
    }

    pub fn is_empty(&self) -> bool {
        self.track.is_empty()
    }

    /// Offset of the last point on the track.
    pub fn duration(&self) -> Duration {
        self.track.last().map(TrackPoint::offset).unwrap_or_default()
    }

    /// Number of watches that have not been cleared.
    pub fn active_watches(&self) -> usize {
        self.watches.lock().len()
    }
}

impl PositionSource for ReplayPositionSource {
    fn current_position(&self, _options: &PositionOptions) -> BoxFuture<'_, PositionEvent> {
        let elapsed = self.origin.elapsed();
        let point = self
            .track
            .iter()
            .rev()
            .find(|p| p.offset() <= elapsed)
            .or_else(|| self.track.first())
            .cloned();

        Box::pin(async move {
            let point =
                point.ok_or_else(|| PositionError::Unavailable("track is empty".to_string()))?;
            if point.offset() > elapsed {
                tokio::time::sleep(point.offset() - elapsed).await;
            }
            point.to_event()
        })
    }

    fn watch_position(&self, _options: &PositionOptions) -> Result<PositionStream, PositionError> {
        let id = WatchId(self.next_watch.fetch_add(1, Ordering::Relaxed));
        let token = CancellationToken::new();
        let (tx, rx) = mpsc::unbounded_channel();

        let elapsed = self.origin.elapsed();
        let upcoming: Vec<TrackPoint> = self
            .track
            .iter()
            .filter(|p| p.offset() > elapsed)
            .cloned()
            .collect();
        let origin = self.origin;
        let cancelled = token.clone();

        tokio::spawn(async move {
            for point in upcoming {
                tokio::select! {
                    _ = cancelled.cancelled() => return,
                    _ = tokio::time::sleep_until(origin + point.offset()) => {}
                }
                if tx.send(point.to_event()).is_err() {
                    return;
                }
            }
        });

        self.watches.lock().insert(id, token);
        Ok(PositionStream { id, events: rx })
    }

    fn clear_watch(&self, id: WatchId) {
        if let Some(token) = self.watches.lock().remove(&id) {
            token.cancel();
        }
    }
}
