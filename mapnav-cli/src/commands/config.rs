//! `mapnav config`: inspect and edit the settings file.
//!
//! Operates on `~/.mapnav/config.ini` unless `--file` names another one. A
//! missing file reads as all defaults; `set` creates it.

use std::path::{Path, PathBuf};

use clap::Subcommand;
use mapnav::config::{config_file_path, ConfigFile, ConfigKey};

use crate::error::CliError;

#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print one setting
    Get {
        /// Setting as section.key, e.g. navigation.settle_delay_ms
        key: String,
    },

    /// Change one setting and write the file
    Set {
        /// Setting as section.key, e.g. update.buffer
        key: String,

        /// New value, validated against the setting's type
        value: String,
    },

    /// Print every setting, marking those changed from the default
    List,

    /// Print the location of the settings file
    Path,
}

pub fn run(command: ConfigCommands, file: Option<&Path>) -> Result<(), CliError> {
    let path = settings_path(file)?;
    match command {
        ConfigCommands::Get { key } => {
            let key = parse_key(&key)?;
            println!("{}", display_value(&key.get(&read_settings(&path)?)));
        }
        ConfigCommands::Set { key, value } => {
            let key = parse_key(&key)?;
            let stored = write_setting(&path, key, &value)?;
            println!("{} = {}", key.name(), display_value(&stored));
        }
        ConfigCommands::List => print!("{}", render_settings(&read_settings(&path)?)),
        ConfigCommands::Path => println!("{}", path.display()),
    }
    Ok(())
}

fn settings_path(file: Option<&Path>) -> Result<PathBuf, CliError> {
    match file {
        Some(path) => Ok(path.to_path_buf()),
        None => config_file_path()
            .ok_or_else(|| CliError::Config("Cannot determine home directory".to_string())),
    }
}

fn read_settings(path: &Path) -> Result<ConfigFile, CliError> {
    if path.exists() {
        Ok(ConfigFile::load_from(path)?)
    } else {
        Ok(ConfigFile::default())
    }
}

/// Apply one setting and persist it; returns the value as stored.
fn write_setting(path: &Path, key: ConfigKey, value: &str) -> Result<String, CliError> {
    let mut settings = read_settings(path)?;
    key.set(&mut settings, value)?;
    settings.save_to(path)?;
    tracing::info!(key = %key.name(), path = %path.display(), "Setting saved");
    Ok(key.get(&settings))
}

fn parse_key(key: &str) -> Result<ConfigKey, CliError> {
    key.parse().map_err(|_| {
        CliError::Config(format!(
            "Unknown setting '{}'. Run 'mapnav config list' for the available settings.",
            key
        ))
    })
}

fn display_value(value: &str) -> &str {
    if value.is_empty() {
        "(not set)"
    } else {
        value
    }
}

/// One `[section]` block per section; non-default values are starred.
fn render_settings(settings: &ConfigFile) -> String {
    let defaults = ConfigFile::default();
    let mut out = String::new();
    let mut section = None;

    for key in ConfigKey::all() {
        if section != Some(key.section()) {
            if section.is_some() {
                out.push('\n');
            }
            out.push_str(&format!("[{}]\n", key.section()));
            section = Some(key.section());
        }

        let value = key.get(settings);
        let marker = if value != key.get(&defaults) { "*" } else { " " };
        out.push_str(&format!(
            "{} {} = {}\n",
            marker,
            key.key_name(),
            display_value(&value)
        ));
    }
    out
}
