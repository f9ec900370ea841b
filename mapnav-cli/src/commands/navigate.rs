//! Navigate command - run a navigation session against the headless SDK.
//!
//! The route comes from a direction result file and device positions from a
//! recorded track, replayed in real time. An optional restart (with an
//! optional new route) and stop can be scheduled; Ctrl+C stops early.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use mapnav::config::ConfigFile;
use mapnav::logging::{init_logging, LoggingGuard};
use mapnav::navigation::{is_tracking_artifact, NavigationController, NavigationService};
use mapnav::position::ReplayPositionSource;
use mapnav::route::{DirectionResult, LatestRoute, RouteProvider};
use mapnav::sdk::memory::{InMemoryMap, RecordingTracker};
use mapnav::sdk::{SdkHandle, SdkStatus};
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::error::CliError;

/// Time after the last track point at which the session is stopped when no
/// explicit stop is scheduled.
const TRACK_END_GRACE: Duration = Duration::from_secs(1);

/// Arguments for the navigate command.
pub struct NavigateArgs {
    pub route: PathBuf,
    pub track: PathBuf,
    pub restart_at: Option<u64>,
    pub reroute: Option<PathBuf>,
    pub stop_at: Option<u64>,
    pub config: Option<PathBuf>,
    pub verbose: bool,
}

/// A scheduled UI intent.
#[derive(Debug, Clone, PartialEq)]
enum Intent {
    Restart(Option<DirectionResult>),
    Stop,
}

/// Run the navigate command.
pub fn run(args: NavigateArgs) -> Result<(), CliError> {
    let config = match &args.config {
        Some(path) => ConfigFile::load_from(path)?,
        None => ConfigFile::load()?,
    };

    let mut logging = config.logging.clone();
    if args.verbose {
        logging.level = "debug".to_string();
    }
    let _guard: LoggingGuard = init_logging(&logging)?;

    let route = read_direction(&args.route)?;
    let reroute = args.reroute.as_deref().map(read_direction).transpose()?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .map_err(|e| CliError::RuntimeCreation(e.to_string()))?;

    runtime.block_on(simulate(args, config, route, reroute))
}

fn read_direction(path: &Path) -> Result<DirectionResult, CliError> {
    let contents = std::fs::read_to_string(path).map_err(|e| CliError::Input {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    serde_json::from_str(&contents).map_err(|e| CliError::Input {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Order the scheduled intents by time.
fn timeline(
    restart_at: Option<u64>,
    reroute: Option<DirectionResult>,
    stop_at: Duration,
) -> Vec<(Duration, Intent)> {
    let mut events = vec![(stop_at, Intent::Stop)];
    if let Some(ms) = restart_at {
        events.push((Duration::from_millis(ms), Intent::Restart(reroute)));
    }
    events.sort_by_key(|(at, _)| *at);
    events
}

async fn simulate(
    args: NavigateArgs,
    config: ConfigFile,
    route: DirectionResult,
    reroute: Option<DirectionResult>,
) -> Result<(), CliError> {
    let map = Arc::new(InMemoryMap::new());
    let tracker = Arc::new(RecordingTracker::drawing_on(Arc::clone(&map)));

    let sdk = SdkHandle::new();
    sdk.set_status(SdkStatus::LoadingSdk);
    sdk.set_status(SdkStatus::LoadingPlugins);
    sdk.attach(map.clone(), tracker.clone());

    let routes = Arc::new(LatestRoute::new());
    routes.publish(route);
    if let Some(context) = routes.latest() {
        println!("Route: {}", context);
    }

    let source = Arc::new(
        ReplayPositionSource::from_file(&args.track).map_err(|e| CliError::Input {
            path: args.track.clone(),
            message: e.to_string(),
        })?,
    );
    let stop_at = args
        .stop_at
        .map(Duration::from_millis)
        .unwrap_or_else(|| source.duration() + TRACK_END_GRACE);
    println!("Track: {} points over {:?}", source.len(), source.duration());

    let controller = NavigationController::new(
        config.navigation.clone(),
        routes.clone(),
        sdk,
        source,
    );
    let handle = NavigationService::spawn(controller);
    let started = Instant::now();

    let (interrupt_tx, mut interrupt) = mpsc::unbounded_channel();
    ctrlc::set_handler(move || {
        let _ = interrupt_tx.send(());
    })
    .map_err(|e| CliError::Config(format!("Failed to set signal handler: {}", e)))?;

    println!("Starting navigation...");
    handle.start().await?;
    println!("Navigation active. Press Ctrl+C to stop");
    println!();

    let mut updates = handle.subscribe();
    let printer = tokio::spawn(async move {
        let mut last = None;
        while updates.changed().await.is_ok() {
            let readout = updates.borrow_and_update().readout();
            if readout != last {
                if let Some(position) = &readout {
                    println!("[{:>7}ms] {}", started.elapsed().as_millis(), position);
                }
                last = readout;
            }
        }
    });

    for (at, intent) in timeline(args.restart_at, reroute, stop_at) {
        tokio::select! {
            _ = interrupt.recv() => {
                println!();
                println!("Received interrupt, stopping navigation...");
                break;
            }
            _ = tokio::time::sleep_until(started + at) => {}
        }

        match intent {
            Intent::Restart(next) => {
                if let Some(next) = next {
                    routes.publish(next);
                }
                println!("Restarting navigation...");
                if let Err(e) = handle.start().await {
                    tracing::warn!(error = %e, "Restart failed");
                    println!("Restart failed: {}", e.user_message());
                }
            }
            Intent::Stop => break,
        }
    }

    handle.shutdown().await;
    let _ = printer.await;

    let log = tracker.log();
    let leftovers: Vec<String> = map
        .layer_ids()
        .into_iter()
        .chain(map.source_ids())
        .filter(|id| is_tracking_artifact(id))
        .collect();

    println!();
    println!("Session Summary");
    println!("───────────────");
    println!("  Sessions created:  {}", log.created.len());
    println!("  Updates forwarded: {}", log.updates.len());
    println!("  Tracking layers left on map: {}", leftovers.len());
    println!("  Elapsed: {:?}", started.elapsed());
    Ok(())
}
