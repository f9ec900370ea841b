//! MapNav CLI - headless driver for navigation sessions
//!
//! `mapnav navigate` replays a recorded track against a computed route using
//! the in-process mapping SDK; `mapnav config` manages the config file.

mod commands;
mod error;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::config::ConfigCommands;
use commands::navigate::NavigateArgs;
use error::CliError;

#[derive(Parser)]
#[command(name = "mapnav")]
#[command(version = mapnav::VERSION)]
#[command(about = "Live navigation tracking on top of an external mapping SDK", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a navigation session from a route and a recorded track
    Navigate {
        /// Direction result JSON ({"Request": [{"geoposition": "lat,lng"}, ...]})
        #[arg(long)]
        route: PathBuf,

        /// Recorded track JSON ([{"offset_ms": 0, "latitude": .., "longitude": ..}, ...])
        #[arg(long)]
        track: PathBuf,

        /// Issue a second start (restart) this many milliseconds in
        #[arg(long, value_name = "MS")]
        restart_at: Option<u64>,

        /// Direction result published just before the restart
        #[arg(long, requires = "restart_at")]
        reroute: Option<PathBuf>,

        /// Stop this many milliseconds in (default: end of track)
        #[arg(long, value_name = "MS")]
        stop_at: Option<u64>,

        /// Config file to use instead of ~/.mapnav/config.ini
        #[arg(long)]
        config: Option<PathBuf>,

        /// Log at debug level
        #[arg(short, long)]
        verbose: bool,
    },

    /// View and modify configuration
    Config {
        /// Settings file to use instead of ~/.mapnav/config.ini
        #[arg(long, global = true, value_name = "PATH")]
        file: Option<PathBuf>,

        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();

    let result: Result<(), CliError> = match cli.command {
        Commands::Navigate {
            route,
            track,
            restart_at,
            reroute,
            stop_at,
            config,
            verbose,
        } => commands::navigate::run(NavigateArgs {
            route,
            track,
            restart_at,
            reroute,
            stop_at,
            config,
            verbose,
        }),
        Commands::Config { file, command } => commands::config::run(command, file.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_navigate() {
        let cli = Cli::try_parse_from([
            "mapnav",
            "navigate",
            "--route",
            "direction.json",
            "--track",
            "track.json",
            "--restart-at",
            "20000",
            "--reroute",
            "next.json",
        ])
        .unwrap();

        match cli.command {
            Commands::Navigate {
                restart_at,
                reroute,
                stop_at,
                ..
            } => {
                assert_eq!(restart_at, Some(20_000));
                assert_eq!(reroute, Some(PathBuf::from("next.json")));
                assert!(stop_at.is_none());
            }
            Commands::Config { .. } => panic!("expected navigate"),
        }
    }

    #[test]
    fn test_parse_config_with_file() {
        let cli =
            Cli::try_parse_from(["mapnav", "config", "list", "--file", "alt.ini"]).unwrap();

        match cli.command {
            Commands::Config { file, command } => {
                assert_eq!(file, Some(PathBuf::from("alt.ini")));
                assert!(matches!(command, ConfigCommands::List));
            }
            Commands::Navigate { .. } => panic!("expected config"),
        }
    }

    #[test]
    fn test_reroute_requires_restart() {
        let result = Cli::try_parse_from([
            "mapnav",
            "navigate",
            "--route",
            "a.json",
            "--track",
            "b.json",
            "--reroute",
            "c.json",
        ]);
        assert!(result.is_err());
    }
}
