//! Settings loading, persistence and CLI overrides for idle-jiggler.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::JiggleConfig;

/// Errors raised when settings cannot form a valid loop configuration.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Interval must be greater than 0")]
    ZeroInterval,

    #[error("Circle radius must be greater than 0")]
    ZeroRadius,

    #[error("Circle steps must be greater than 0")]
    ZeroSteps,
}

/// Persisted settings for idle-jiggler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Minutes part of the movement interval (default: 1).
    pub interval_minutes: u64,

    /// Seconds part of the movement interval (default: 0).
    pub interval_seconds: u64,

    /// Radius of the jiggle circle in pixels (default: 25).
    pub circle_radius: u32,

    /// Points per circle (default: 20).
    pub circle_steps: u32,

    /// Seconds of idle time required before moving (default: 30).
    pub idle_threshold: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            interval_minutes: 1,
            interval_seconds: 0,
            circle_radius: 25,
            circle_steps: 20,
            idle_threshold: 30,
        }
    }
}

/// Values given on the command line, layered over saved settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub minutes: Option<u64>,
    pub seconds: Option<u64>,
    /// Force the saved interval, ignoring `minutes` and `seconds`.
    pub load: bool,
    pub circle_radius: Option<u32>,
    pub circle_steps: Option<u32>,
    pub idle_threshold: Option<u64>,
}

impl Overrides {
    /// Whether the interval should come from saved settings.
    ///
    /// True with `--load`, when neither minutes nor seconds were given,
    /// or when both were given as zero.
    pub fn uses_saved_interval(&self) -> bool {
        if self.load {
            return true;
        }
        match (self.minutes, self.seconds) {
            (None, None) => true,
            (m, s) => m.unwrap_or(0) == 0 && s.unwrap_or(0) == 0,
        }
    }
}

impl Settings {
    /// Default settings file location.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("idle-jiggler").join("config.toml"))
    }

    /// Load settings from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;
        let settings: Settings = toml::from_str(&content)
            .with_context(|| format!("Failed to parse settings file: {}", path.display()))?;
        Ok(settings)
    }

    /// Load settings from `path`, or return defaults if missing or unreadable.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        if !path.exists() {
            debug!("No settings file at {}, using defaults", path.display());
            return Self::default();
        }

        match Self::load(path) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Could not load settings ({:#}), using defaults", e);
                Self::default()
            }
        }
    }

    /// Write settings to `path`, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize settings")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write settings file: {}", path.display()))?;
        Ok(())
    }

    /// Apply command line overrides on top of these settings.
    #[must_use]
    pub fn apply(&self, overrides: &Overrides) -> Self {
        let mut merged = self.clone();

        if !overrides.uses_saved_interval() {
            merged.interval_minutes = overrides.minutes.unwrap_or(0);
            merged.interval_seconds = overrides.seconds.unwrap_or(0);
        }
        if let Some(radius) = overrides.circle_radius {
            merged.circle_radius = radius;
        }
        if let Some(steps) = overrides.circle_steps {
            merged.circle_steps = steps;
        }
        if let Some(idle) = overrides.idle_threshold {
            merged.idle_threshold = idle;
        }

        merged
    }

    /// Total movement interval.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(
            self.interval_minutes
                .saturating_mul(60)
                .saturating_add(self.interval_seconds),
        )
    }

    /// Validate and convert into the loop configuration.
    pub fn jiggle_config(&self) -> Result<JiggleConfig, ConfigError> {
        let interval = self.interval();
        if interval.is_zero() {
            return Err(ConfigError::ZeroInterval);
        }
        if self.circle_radius == 0 {
            return Err(ConfigError::ZeroRadius);
        }
        if self.circle_steps == 0 {
            return Err(ConfigError::ZeroSteps);
        }

        Ok(JiggleConfig {
            interval,
            circle_radius: self.circle_radius,
            circle_steps: self.circle_steps,
            idle_threshold: Duration::from_secs(self.idle_threshold),
        })
    }
}
