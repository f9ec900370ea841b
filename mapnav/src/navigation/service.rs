//! Async driver for a [`NavigationController`].
//!
//! The controller is moved into a single tokio task that serializes every
//! event it handles: commands from [`NavigationHandle`]s, the pending
//! continuation of a start (one-shot fix or settle delay), and deliveries
//! from the running position watch. A continuation is parked as a future
//! while other events are handled, so a stop can overtake a start.

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::controller::{NavigationController, StartStep, StartTicket};
use super::error::NavigationError;
use super::state::NavigationUiState;
use crate::position::{BoxFuture, PositionEvent};

type StartReply = oneshot::Sender<Result<(), NavigationError>>;

enum Command {
    Start(StartReply),
    Stop(oneshot::Sender<bool>),
    Shutdown(oneshot::Sender<()>),
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::Start(_) => f.write_str("Start"),
            Command::Stop(_) => f.write_str("Stop"),
            Command::Shutdown(_) => f.write_str("Shutdown"),
        }
    }
}

/// A suspended start step that has finished.
enum Continuation {
    Fix {
        ticket: StartTicket,
        event: PositionEvent,
    },
    Settled(StartTicket),
}

/// What woke the event loop.
enum Wake {
    Command(Option<Command>),
    Continuation(Continuation),
    Position(PositionEvent),
}

/// Spawns the navigation event loop.
pub struct NavigationService;

impl NavigationService {
    /// Move `controller` into a task on the current runtime.
    ///
    /// The loop runs until [`NavigationHandle::shutdown`] is called or every
    /// handle is dropped; either way the stop sequence runs first.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn spawn(controller: NavigationController) -> NavigationHandle {
        Self::spawn_with_join(controller).0
    }

    /// Like [`spawn`](Self::spawn), also returning the task handle.
    pub fn spawn_with_join(controller: NavigationController) -> (NavigationHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let ui = controller.subscribe();

        let event_loop = EventLoop {
            controller,
            commands: rx,
            pending: None,
            waiters: Vec::new(),
        };
        let task = tokio::spawn(event_loop.run());

        (NavigationHandle { commands: tx, ui }, task)
    }
}

/// Sends UI intents to a running navigation service.
///
/// Cheap to clone.
#[derive(Debug, Clone)]
pub struct NavigationHandle {
    commands: mpsc::UnboundedSender<Command>,
    ui: watch::Receiver<NavigationUiState>,
}

impl NavigationHandle {
    /// Start navigation, or restart it if already active.
    ///
    /// Resolves once the session is active or the start has failed. Calls
    /// made while a start is in flight share its outcome.
    pub async fn start(&self) -> Result<(), NavigationError> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(Command::Start(tx))
            .map_err(|_| NavigationError::ServiceStopped)?;
        rx.await.map_err(|_| NavigationError::ServiceStopped)?
    }

    /// Stop navigation.
    ///
    /// Returns `Ok(false)` if it was already idle.
    pub async fn stop(&self) -> Result<bool, NavigationError> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(Command::Stop(tx))
            .map_err(|_| NavigationError::ServiceStopped)?;
        rx.await.map_err(|_| NavigationError::ServiceStopped)
    }

    /// Stop navigation and end the event loop.
    pub async fn shutdown(&self) {
        let (tx, rx) = oneshot::channel();
        if self.commands.send(Command::Shutdown(tx)).is_ok() {
            let _ = rx.await;
        }
    }

    /// Observe the navigation state.
    pub fn subscribe(&self) -> watch::Receiver<NavigationUiState> {
        self.ui.clone()
    }

    /// Current navigation state.
    pub fn state(&self) -> NavigationUiState {
        self.ui.borrow().clone()
    }

    pub fn is_running(&self) -> bool {
        !self.commands.is_closed()
    }
}

struct EventLoop {
    controller: NavigationController,
    commands: mpsc::UnboundedReceiver<Command>,
    pending: Option<BoxFuture<'static, Continuation>>,
    /// Callers waiting on the start in flight.
    waiters: Vec<StartReply>,
}

impl EventLoop {
    async fn run(mut self) {
        tracing::debug!("Navigation service started");

        loop {
            let wake = tokio::select! {
                biased;
                command = self.commands.recv() => Wake::Command(command),
                done = next_continuation(&mut self.pending) => Wake::Continuation(done),
                event = self.controller.next_position() => Wake::Position(event),
            };

            match wake {
                Wake::Command(Some(Command::Start(reply))) => self.handle_start(reply),
                Wake::Command(Some(Command::Stop(reply))) => {
                    let stopped = self.handle_stop();
                    let _ = reply.send(stopped);
                }
                Wake::Command(Some(Command::Shutdown(reply))) => {
                    self.handle_stop();
                    let _ = reply.send(());
                    break;
                }
                Wake::Command(None) => {
                    tracing::debug!("All navigation handles dropped");
                    self.handle_stop();
                    break;
                }
                Wake::Continuation(done) => self.handle_continuation(done),
                Wake::Position(event) => self.controller.on_position(event, Instant::now()),
            }
        }

        tracing::debug!("Navigation service stopped");
    }

    fn handle_start(&mut self, reply: StartReply) {
        match self.controller.request_start() {
            Ok(StartStep::InProgress) => self.waiters.push(reply),
            Ok(step) => {
                self.waiters.push(reply);
                self.schedule(step);
            }
            Err(e) => {
                let _ = reply.send(Err(e));
            }
        }
    }

    fn handle_stop(&mut self) -> bool {
        self.pending = None;
        let stopped = self.controller.request_stop();
        self.resolve(Err(NavigationError::StartCancelled));
        stopped
    }

    fn handle_continuation(&mut self, done: Continuation) {
        match done {
            Continuation::Fix { ticket, event } => {
                if let Some(result) = self.controller.complete_start(ticket, event, Instant::now()) {
                    self.resolve(result);
                }
            }
            Continuation::Settled(ticket) => match self.controller.settle_elapsed(ticket) {
                Some(Ok(step)) => self.schedule(step),
                Some(Err(e)) => self.resolve(Err(e)),
                None => {}
            },
        }
    }

    fn schedule(&mut self, step: StartStep) {
        self.pending = match step {
            StartStep::AcquireFix { ticket, fix } => Some(Box::pin(async move {
                Continuation::Fix {
                    ticket,
                    event: fix.await,
                }
            })),
            StartStep::Settle { ticket, delay } => Some(Box::pin(async move {
                tokio::time::sleep(delay).await;
                Continuation::Settled(ticket)
            })),
            StartStep::InProgress => return,
        };
    }

    fn resolve(&mut self, result: Result<(), NavigationError>) {
        for waiter in self.waiters.drain(..) {
            let _ = waiter.send(result.clone());
        }
    }
}

/// Resolve the parked continuation, or never if there is none.
///
/// Cancel safe: the continuation stays parked until it completes.
async fn next_continuation(pending: &mut Option<BoxFuture<'static, Continuation>>) -> Continuation {
    match pending.as_mut() {
        Some(fut) => {
            let done = fut.await;
            *pending = None;
            done
        }
        None => std::future::pending().await,
    }
}
