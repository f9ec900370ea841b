//! Single-watch guard around a position source.

use std::sync::Arc;

use tokio::sync::mpsc;

use super::source::{BoxFuture, PositionEvent, PositionSource, WatchId};
use super::types::{PositionError, PositionOptions};

/// The one continuous watch currently running.
#[derive(Debug)]
struct ActiveWatch {
    id: WatchId,
    /// `None` once the source closed the stream.
    events: Option<mpsc::UnboundedReceiver<PositionEvent>>,
}

/// Owns the (at most one) continuous watch on a position source.
///
/// Dropping the watcher cancels any active watch.
pub struct PositionWatcher {
    source: Arc<dyn PositionSource>,
    options: PositionOptions,
    active: Option<ActiveWatch>,
}

impl std::fmt::Debug for PositionWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PositionWatcher")
            .field("options", &self.options)
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}

impl PositionWatcher {
    pub fn new(source: Arc<dyn PositionSource>, options: PositionOptions) -> Self {
        Self {
            source,
            options,
            active: None,
        }
    }

    pub fn options(&self) -> &PositionOptions {
        &self.options
    }

    /// Whether a continuous watch is running.
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Id of the running watch, if any.
    pub fn active_id(&self) -> Option<WatchId> {
        self.active.as_ref().map(|w| w.id)
    }

    /// Acquire one fix, bounded by the configured timeout.
    ///
    /// The returned future owns everything it needs, so it can be parked by
    /// an event loop while other events are handled.
    pub fn acquire_fix(&self) -> BoxFuture<'static, PositionEvent> {
        let source = Arc::clone(&self.source);
        let options = self.options;

        Box::pin(async move {
            match tokio::time::timeout(options.timeout, source.current_position(&options)).await {
                Ok(event) => event,
                Err(_) => Err(PositionError::Timeout(options.timeout)),
            }
        })
    }

    /// Start the continuous watch.
    ///
    /// # Errors
    ///
    /// - `PositionError::AlreadyWatching` if a watch is already running
    /// - whatever the source reports when the watch cannot be started
    pub fn begin(&mut self) -> Result<WatchId, PositionError> {
        if self.active.is_some() {
            return Err(PositionError::AlreadyWatching);
        }

        let stream = self.source.watch_position(&self.options)?;
        tracing::debug!(watch = %stream.id, "Position watch started");

        let id = stream.id;
        self.active = Some(ActiveWatch {
            id,
            events: Some(stream.events),
        });
        Ok(id)
    }

    /// Cancel the continuous watch.
    ///
    /// Returns `true` if a watch was running. Calling this with no active
    /// watch is a no-op.
    pub fn end(&mut self) -> bool {
        match self.active.take() {
            Some(watch) => {
                self.source.clear_watch(watch.id);
                tracing::debug!(watch = %watch.id, "Position watch cleared");
                true
            }
            None => false,
        }
    }

    /// Wait for the next watch event.
    ///
    /// Never resolves while no watch is running, or after the source has
    /// closed the stream; callers select on it alongside other events.
    pub async fn next_event(&mut self) -> PositionEvent {
        if let Some(watch) = self.active.as_mut() {
            if let Some(events) = watch.events.as_mut() {
                match events.recv().await {
                    Some(event) => return event,
                    None => {
                        tracing::warn!(watch = %watch.id, "Position source closed the watch stream");
                        watch.events = None;
                    }
                }
            }
        }
        std::future::pending().await
    }
}

impl Drop for PositionWatcher {
    fn drop(&mut self) {
        self.end();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::{PositionSample, PositionStream};
    use parking_lot::Mutex;
    use std::time::Duration;

    /// Source whose watches are fed by the test.
    #[derive(Default)]
    struct ManualSource {
        next_id: Mutex<u64>,
        senders: Mutex<Vec<(WatchId, mpsc::UnboundedSender<PositionEvent>)>>,
        cleared: Mutex<Vec<WatchId>>,
        hang: bool,
    }

    impl PositionSource for ManualSource {
        fn current_position(&self, _options: &PositionOptions) -> BoxFuture<'_, PositionEvent> {
            let hang = self.hang;
            Box::pin(async move {
                if hang {
                    std::future::pending::<()>().await;
                }
                Ok(PositionSample::new(28.61, 77.23, 0))
            })
        }

        fn watch_position(
            &self,
            _options: &PositionOptions,
        ) -> Result<PositionStream, PositionError> {
            let mut next = self.next_id.lock();
            *next += 1;
            let id = WatchId(*next);
            let (tx, rx) = mpsc::unbounded_channel();
            self.senders.lock().push((id, tx));
            Ok(PositionStream { id, events: rx })
        }

        fn clear_watch(&self, id: WatchId) {
            self.cleared.lock().push(id);
            self.senders.lock().retain(|(w, _)| *w != id);
        }
    }

    #[test]
    fn test_begin_twice_is_rejected() {
        let source = Arc::new(ManualSource::default());
        let mut watcher = PositionWatcher::new(source, PositionOptions::default());

        watcher.begin().unwrap();
        assert_eq!(watcher.begin(), Err(PositionError::AlreadyWatching));
        assert!(watcher.is_active());
    }

    #[test]
    fn test_end_is_idempotent() {
        let source = Arc::new(ManualSource::default());
        let mut watcher = PositionWatcher::new(source.clone(), PositionOptions::default());

        assert!(!watcher.end());
        let id = watcher.begin().unwrap();
        assert!(watcher.end());
        assert!(!watcher.end());

        assert_eq!(*source.cleared.lock(), vec![id]);
    }

    #[test]
    fn test_drop_clears_watch() {
        let source = Arc::new(ManualSource::default());
        let mut watcher = PositionWatcher::new(source.clone(), PositionOptions::default());
        watcher.begin().unwrap();
        drop(watcher);

        assert_eq!(source.cleared.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_next_event_delivers_in_order() {
        let source = Arc::new(ManualSource::default());
        let mut watcher = PositionWatcher::new(source.clone(), PositionOptions::default());
        watcher.begin().unwrap();

        {
            let senders = source.senders.lock();
            let tx = &senders[0].1;
            tx.send(Ok(PositionSample::new(1.0, 1.0, 1))).unwrap();
            tx.send(Err(PositionError::Unavailable("tunnel".into()))).unwrap();
        }

        assert_eq!(watcher.next_event().await.unwrap().timestamp_ms, 1);
        assert!(watcher.next_event().await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_next_event_pends_after_stream_closed() {
        let source = Arc::new(ManualSource::default());
        let mut watcher = PositionWatcher::new(source.clone(), PositionOptions::default());
        watcher.begin().unwrap();
        source.senders.lock().clear();

        let waited =
            tokio::time::timeout(Duration::from_secs(1), watcher.next_event()).await;
        assert!(waited.is_err());
        assert!(watcher.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_acquire_fix_times_out() {
        let source = Arc::new(ManualSource {
            hang: true,
            ..Default::default()
        });
        let watcher = PositionWatcher::new(source, PositionOptions::default());

        let result = watcher.acquire_fix().await;
        assert_eq!(result, Err(PositionError::Timeout(Duration::from_secs(10))));
    }

    #[tokio::test]
    async fn test_acquire_fix_returns_sample() {
        let source = Arc::new(ManualSource::default());
        let watcher = PositionWatcher::new(source, PositionOptions::default());

        let fix = watcher.acquire_fix().await.unwrap();
        assert_eq!(fix.readout(), "28.61000, 77.23000");
    }
}
