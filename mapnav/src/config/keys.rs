//! Addressable configuration keys.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use super::file::{ConfigError, ConfigFile};

/// A single `section.key` setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    NavigationForwardIntervalMs,
    NavigationSettleDelayMs,
    PositionHighAccuracy,
    PositionMaximumAgeMs,
    PositionTimeoutMs,
    VisualFitBounds,
    VisualIconWidth,
    VisualStrokeWidth,
    VisualRouteColor,
    VisualConnector,
    VisualPopupHtml,
    UpdateReRoute,
    UpdateHeading,
    UpdateMapCenter,
    UpdateBuffer,
    UpdateDelayMs,
    UpdateEtaRefresh,
    UpdateFitBounds,
    LoggingLevel,
    LoggingDirectory,
}

const ALL_KEYS: &[ConfigKey] = &[
    ConfigKey::NavigationForwardIntervalMs,
    ConfigKey::NavigationSettleDelayMs,
    ConfigKey::PositionHighAccuracy,
    ConfigKey::PositionMaximumAgeMs,
    ConfigKey::PositionTimeoutMs,
    ConfigKey::VisualFitBounds,
    ConfigKey::VisualIconWidth,
    ConfigKey::VisualStrokeWidth,
    ConfigKey::VisualRouteColor,
    ConfigKey::VisualConnector,
    ConfigKey::VisualPopupHtml,
    ConfigKey::UpdateReRoute,
    ConfigKey::UpdateHeading,
    ConfigKey::UpdateMapCenter,
    ConfigKey::UpdateBuffer,
    ConfigKey::UpdateDelayMs,
    ConfigKey::UpdateEtaRefresh,
    ConfigKey::UpdateFitBounds,
    ConfigKey::LoggingLevel,
    ConfigKey::LoggingDirectory,
];

impl ConfigKey {
    /// Every key, grouped by section.
    pub fn all() -> &'static [ConfigKey] {
        ALL_KEYS
    }

    pub fn section(&self) -> &'static str {
        use ConfigKey::*;
        match self {
            NavigationForwardIntervalMs | NavigationSettleDelayMs => "navigation",
            PositionHighAccuracy | PositionMaximumAgeMs | PositionTimeoutMs => "position",
            VisualFitBounds | VisualIconWidth | VisualStrokeWidth | VisualRouteColor
            | VisualConnector | VisualPopupHtml => "visual",
            UpdateReRoute | UpdateHeading | UpdateMapCenter | UpdateBuffer | UpdateDelayMs
            | UpdateEtaRefresh | UpdateFitBounds => "update",
            LoggingLevel | LoggingDirectory => "logging",
        }
    }

    pub fn key_name(&self) -> &'static str {
        use ConfigKey::*;
        match self {
            NavigationForwardIntervalMs => "forward_interval_ms",
            NavigationSettleDelayMs => "settle_delay_ms",
            PositionHighAccuracy => "high_accuracy",
            PositionMaximumAgeMs => "maximum_age_ms",
            PositionTimeoutMs => "timeout_ms",
            VisualFitBounds => "fit_bounds",
            VisualIconWidth => "icon_width",
            VisualStrokeWidth => "stroke_width",
            VisualRouteColor => "route_color",
            VisualConnector => "connector",
            VisualPopupHtml => "popup_html",
            UpdateReRoute => "re_route",
            UpdateHeading => "heading",
            UpdateMapCenter => "map_center",
            UpdateBuffer => "buffer",
            UpdateDelayMs => "delay_ms",
            UpdateEtaRefresh => "eta_refresh",
            UpdateFitBounds => "fit_bounds",
            LoggingLevel => "level",
            LoggingDirectory => "directory",
        }
    }

    /// Full `section.key` name.
    pub fn name(&self) -> String {
        format!("{}.{}", self.section(), self.key_name())
    }

    /// Current value rendered as a string (empty when unset).
    pub fn get(&self, config: &ConfigFile) -> String {
        use ConfigKey::*;
        let nav = &config.navigation;
        match self {
            NavigationForwardIntervalMs => millis(nav.forward_interval),
            NavigationSettleDelayMs => millis(nav.settle_delay),
            PositionHighAccuracy => nav.position.high_accuracy.to_string(),
            PositionMaximumAgeMs => millis(nav.position.maximum_age),
            PositionTimeoutMs => millis(nav.position.timeout),
            VisualFitBounds => nav.visual.fit_bounds.to_string(),
            VisualIconWidth => nav.visual.icon_width.to_string(),
            VisualStrokeWidth => nav.visual.stroke_width.to_string(),
            VisualRouteColor => nav.visual.route_color.clone(),
            VisualConnector => nav.visual.connector.to_string(),
            VisualPopupHtml => nav.visual.popup_html.clone(),
            UpdateReRoute => nav.update.re_route.to_string(),
            UpdateHeading => nav.update.heading.to_string(),
            UpdateMapCenter => nav.update.map_center.to_string(),
            UpdateBuffer => nav.update.buffer_m.to_string(),
            UpdateDelayMs => millis(nav.update.delay),
            UpdateEtaRefresh => nav.update.eta_refresh.to_string(),
            UpdateFitBounds => nav.update.fit_bounds.to_string(),
            LoggingLevel => config.logging.level.clone(),
            LoggingDirectory => config
                .logging
                .directory
                .as_ref()
                .map(|d| d.to_string_lossy().to_string())
                .unwrap_or_default(),
        }
    }

    /// Validate and apply `value`.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigError> {
        use ConfigKey::*;
        let value = value.trim();
        let nav = &mut config.navigation;
        match self {
            NavigationForwardIntervalMs => nav.forward_interval = self.parse_millis(value)?,
            NavigationSettleDelayMs => nav.settle_delay = self.parse_millis(value)?,
            PositionHighAccuracy => nav.position.high_accuracy = self.parse_bool(value)?,
            PositionMaximumAgeMs => nav.position.maximum_age = self.parse_millis(value)?,
            PositionTimeoutMs => {
                let timeout = self.parse_millis(value)?;
                if timeout.is_zero() {
                    return Err(self.invalid(value, "timeout must be greater than zero"));
                }
                nav.position.timeout = timeout;
            }
            VisualFitBounds => nav.visual.fit_bounds = self.parse_bool(value)?,
            VisualIconWidth => nav.visual.icon_width = self.parse_u32(value)?,
            VisualStrokeWidth => nav.visual.stroke_width = self.parse_u32(value)?,
            VisualRouteColor => {
                if !is_hex_color(value) {
                    return Err(self.invalid(value, "expected a color like #3b82f6"));
                }
                nav.visual.route_color = value.to_string();
            }
            VisualConnector => nav.visual.connector = self.parse_bool(value)?,
            VisualPopupHtml => nav.visual.popup_html = value.to_string(),
            UpdateReRoute => nav.update.re_route = self.parse_bool(value)?,
            UpdateHeading => nav.update.heading = self.parse_bool(value)?,
            UpdateMapCenter => nav.update.map_center = self.parse_bool(value)?,
            UpdateBuffer => nav.update.buffer_m = self.parse_u32(value)?,
            UpdateDelayMs => nav.update.delay = self.parse_millis(value)?,
            UpdateEtaRefresh => nav.update.eta_refresh = self.parse_bool(value)?,
            UpdateFitBounds => nav.update.fit_bounds = self.parse_bool(value)?,
            LoggingLevel => {
                if value.is_empty() {
                    return Err(self.invalid(value, "level must not be empty"));
                }
                config.logging.level = value.to_string();
            }
            LoggingDirectory => {
                config.logging.directory = (!value.is_empty()).then(|| PathBuf::from(value));
            }
        }
        Ok(())
    }

    fn invalid(&self, value: &str, reason: &str) -> ConfigError {
        ConfigError::InvalidValue {
            key: self.name(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }

    fn parse_bool(&self, value: &str) -> Result<bool, ConfigError> {
        match value.to_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(true),
            "false" | "no" | "off" | "0" => Ok(false),
            _ => Err(self.invalid(value, "expected true or false")),
        }
    }

    fn parse_u32(&self, value: &str) -> Result<u32, ConfigError> {
        value
            .parse()
            .map_err(|_| self.invalid(value, "expected a non-negative integer"))
    }

    fn parse_millis(&self, value: &str) -> Result<Duration, ConfigError> {
        value
            .parse()
            .map(Duration::from_millis)
            .map_err(|_| self.invalid(value, "expected milliseconds"))
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        ConfigKey::all()
            .iter()
            .copied()
            .find(|k| k.name() == wanted)
            .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))
    }
}

fn millis(duration: Duration) -> String {
    duration.as_millis().to_string()
}

fn is_hex_color(value: &str) -> bool {
    match value.strip_prefix('#') {
        Some(hex) => {
            matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit())
        }
        None => false,
    }
}
