//! Configuration management for Keyboard Button
//!
//! Provides persistent configuration that is saved to and loaded from a
//! platform-specific config file.
//!
//! ## Config File Locations
//!
//! | Platform | Path |
//! |----------|------|
//! | Linux | `~/.config/keyboard-button/config.toml` |
//! | macOS | `~/Library/Application Support/keyboard-button/config.toml` |
//! | Windows | `%APPDATA%\keyboard-button\config.toml` |
//!
//! ## Example
//!
//! ```no_run
//! use keyboard_button::Config;
//!
//! // Load existing config or use defaults
//! let mut config = Config::load().unwrap_or_default();
//!
//! // Modify settings
//! config.button.long_press_delay_ms = 400;
//!
//! // Save to disk
//! config.save().expect("Failed to save config");
//! ```

use crate::button::gesture::{
    GestureSettings, DEFAULT_DOWN_GESTURE_RATIO, DEFAULT_LONG_PRESS_DELAY_MS,
};
use crate::button::{ButtonStyle, CalloutMetrics};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Error type for configuration operations
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to determine config directory
    #[error("Could not determine config directory")]
    NoConfigDir,
    /// IO error reading or writing config file
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// Failed to parse config file
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Failed to serialize config
    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Returns the path to the config file.
///
/// Creates the config directory if it doesn't exist.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
    let app_dir = config_dir.join("keyboard-button");

    if !app_dir.exists() {
        fs::create_dir_all(&app_dir)?;
    }

    Ok(app_dir.join("config.toml"))
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Keyboard style used for theme defaults
    #[serde(default)]
    pub style: ButtonStyle,
    /// Gesture timing and tolerances
    #[serde(default)]
    pub button: ButtonSettings,
    /// Option callout sizing
    #[serde(default)]
    pub callout: CalloutMetrics,
    /// UI settings
    #[serde(default)]
    pub ui: UiConfig,
}

/// Gesture timing and tolerance configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ButtonSettings {
    /// Hold time before the option callout appears
    pub long_press_delay_ms: u64,
    /// Downward travel, as a fraction of key height, that selects the alternate input
    pub down_gesture_ratio: f32,
    /// Tolerance around the key before a press is cancelled
    pub tracking_margin_inset: f32,
    /// Height taken off the option row for hosts with little vertical room
    pub callout_height_reduction: f32,
}

impl Default for ButtonSettings {
    fn default() -> Self {
        Self {
            long_press_delay_ms: DEFAULT_LONG_PRESS_DELAY_MS,
            down_gesture_ratio: DEFAULT_DOWN_GESTURE_RATIO,
            tracking_margin_inset: 0.0,
            callout_height_reduction: 0.0,
        }
    }
}

impl ButtonSettings {
    pub fn gesture_settings(&self) -> GestureSettings {
        GestureSettings {
            long_press_delay: Duration::from_millis(self.long_press_delay_ms),
            down_gesture_ratio: self.down_gesture_ratio.max(0.0),
            tracking_margin_inset: self.tracking_margin_inset.max(0.0),
            callout_height_reduction: self.callout_height_reduction.max(0.0),
        }
    }
}

/// UI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Refresh rate for UI updates (in Hz)
    pub refresh_rate_hz: u32,
    /// Status message lifetime in seconds
    pub status_duration_secs: u32,
    /// Color theme (dark/light)
    pub theme: Theme,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            refresh_rate_hz: 60,
            status_duration_secs: 3,
            theme: Theme::Dark,
        }
    }
}

/// Color theme options
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Theme {
    Dark,
    Light,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }
}

impl Config {
    /// Load configuration from the default config file.
    ///
    /// Returns the default configuration if the file doesn't exist.
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to the default config file.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = config_path()?;
        self.save_to(&path)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Get UI refresh interval as Duration
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_micros(1_000_000 / self.ui.refresh_rate_hz.max(1) as u64)
    }

    /// Defaults sized for a terminal grid, where one layout unit is one cell
    pub fn terminal() -> Self {
        Self {
            callout: CalloutMetrics::terminal(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn temp_config_path() -> PathBuf {
        env::temp_dir().join(format!("keyboard-button-test-{}.toml", std::process::id()))
    }

    #[test]
    fn config_default_values() {
        let config = Config::default();
        assert_eq!(config.button.long_press_delay_ms, 300);
        assert_eq!(config.button.tracking_margin_inset, 0.0);
        assert_eq!(config.button.callout_height_reduction, 0.0);
        assert_eq!(config.callout, CalloutMetrics::phone());
        assert_eq!(config.ui.refresh_rate_hz, 60);
        assert_eq!(config.ui.theme, Theme::Dark);
        assert_eq!(config.style, ButtonStyle::Phone);
    }

    #[test]
    fn gesture_settings_conversion() {
        let mut config = Config::default();
        config.button.long_press_delay_ms = 450;
        config.button.tracking_margin_inset = -3.0;
        let settings = config.button.gesture_settings();
        assert_eq!(settings.long_press_delay, Duration::from_millis(450));
        assert_eq!(settings.tracking_margin_inset, 0.0);
    }

    #[test]
    fn config_refresh_interval() {
        let config = Config::default();
        // 60 Hz = 16666 microseconds per frame
        assert_eq!(config.refresh_interval().as_micros(), 16666);
    }

    #[test]
    fn config_refresh_interval_zero_hz_does_not_divide_by_zero() {
        let mut config = Config::default();
        config.ui.refresh_rate_hz = 0;
        assert_eq!(config.refresh_interval().as_secs(), 1);
    }

    #[test]
    fn config_save_and_load_roundtrip() {
        let path = temp_config_path();

        let mut config = Config::terminal();
        config.button.long_press_delay_ms = 500;
        config.ui.theme = Theme::Light;
        config.style = ButtonStyle::Tablet;

        config.save_to(&path).expect("Failed to save config");
        let loaded = Config::load_from(&path).expect("Failed to load config");

        assert_eq!(loaded.button.long_press_delay_ms, 500);
        assert_eq!(loaded.ui.theme, Theme::Light);
        assert_eq!(loaded.style, ButtonStyle::Tablet);
        assert_eq!(loaded.callout, CalloutMetrics::terminal());

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn config_load_missing_file_fails() {
        let path = PathBuf::from("/nonexistent/path/config.toml");
        assert!(matches!(Config::load_from(&path), Err(ConfigError::Io(_))));
    }

    #[test]
    fn config_deserializes_partial_toml() {
        let toml_str = r#"
style = "Tablet"

[button]
long_press_delay_ms = 250
down_gesture_ratio = 0.5
tracking_margin_inset = 4.0
callout_height_reduction = 12.0

[ui]
refresh_rate_hz = 144
status_duration_secs = 5
theme = "Light"
"#;

        let config: Config = toml::from_str(toml_str).expect("Failed to deserialize");

        assert_eq!(config.button.long_press_delay_ms, 250);
        assert_eq!(config.button.down_gesture_ratio, 0.5);
        assert_eq!(config.button.tracking_margin_inset, 4.0);
        assert_eq!(config.button.callout_height_reduction, 12.0);
        assert_eq!(config.ui.refresh_rate_hz, 144);
        assert_eq!(config.ui.theme, Theme::Light);
        assert_eq!(config.style, ButtonStyle::Tablet);
        // Missing section falls back to defaults
        assert_eq!(config.callout, CalloutMetrics::phone());
    }

    #[test]
    fn config_serializes_to_toml() {
        let toml_str = toml::to_string_pretty(&Config::default()).expect("Failed to serialize");
        assert!(toml_str.contains("[button]"));
        assert!(toml_str.contains("[callout]"));
        assert!(toml_str.contains("[ui]"));
        assert!(toml_str.contains("long_press_delay_ms = 300"));
    }

    #[test]
    fn config_error_display() {
        let err = ConfigError::NoConfigDir;
        assert_eq!(err.to_string(), "Could not determine config directory");

        let io_err = ConfigError::Io(io::Error::new(io::ErrorKind::NotFound, "file not found"));
        assert!(io_err.to_string().contains("IO error"));
    }

    #[test]
    fn theme_toggles() {
        assert_eq!(Theme::Dark.toggled(), Theme::Light);
        assert_eq!(Theme::Light.toggled(), Theme::Dark);
    }
}
