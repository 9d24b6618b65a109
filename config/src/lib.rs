//! Configuration loading and parsing for Dozen.
//!
//! The on-disk format is TOML at `~/.dozen/config.toml`, overridable with the
//! `DOZEN_CONFIG` environment variable. Every key is optional; missing keys
//! take the defaults from `dozen-types`.
//!
//! ```toml
//! [state]
//! dimensions = 12
//! target_sum = 144.0
//! initial_min = 10.0
//! initial_max = 14.0
//!
//! [drivers]
//! rate_hz = 100.0
//! amplitude = 0.01
//!
//! [stabilizer]
//! protocol = "thomas-pulse"
//! jitter_backoff_ms = 25
//!
//! [display]
//! elevated_threshold = 1.0e15
//! saturated_threshold = 2.84e23
//! ```

use std::{
    env,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;
use thiserror::Error;

use dozen_types::{
    DriverSettings, Protocol, Settings, SettingsError, StabilizerSettings, StateSettings,
    Thresholds,
};

pub const CONFIG_ENV_VAR: &str = "DOZEN_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(#[from] SettingsError),
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DozenConfig {
    pub state: Option<StateConfig>,
    pub drivers: Option<DriversConfig>,
    pub stabilizer: Option<StabilizerConfig>,
    pub display: Option<DisplayConfig>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StateConfig {
    pub dimensions: Option<usize>,
    pub target_sum: Option<f64>,
    pub initial_min: Option<f64>,
    pub initial_max: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DriversConfig {
    pub rate_hz: Option<f64>,
    pub amplitude: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StabilizerConfig {
    pub protocol: Option<String>,
    pub spin_amplitude: Option<f64>,
    pub jitter_backoff_ms: Option<u64>,
    pub belief_scale: Option<f64>,
    pub dread_level: Option<f64>,
    pub shutdown_timeout_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DisplayConfig {
    pub elevated_threshold: Option<f64>,
    pub saturated_threshold: Option<f64>,
}

impl DozenConfig {
    /// Load the config file, if one exists.
    ///
    /// Returns `Ok(None)` when no path is known or the file does not exist.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        let Some(path) = config_path() else {
            return Ok(None);
        };
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content).map(Some)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    #[must_use]
    pub fn path() -> Option<PathBuf> {
        config_path()
    }

    /// Resolve into validated settings.
    ///
    /// An unrecognized protocol label is not an error: it logs a warning and
    /// falls back to the default protocol.
    pub fn resolve(&self) -> Result<Settings, ConfigError> {
        let state = resolve_state(self.state.as_ref())?;
        let drivers = resolve_drivers(self.drivers.as_ref())?;
        let stabilizer = resolve_stabilizer(self.stabilizer.as_ref(), self.display.as_ref())?;
        Ok(Settings {
            state,
            drivers,
            stabilizer,
        })
    }
}

fn resolve_state(raw: Option<&StateConfig>) -> Result<StateSettings, SettingsError> {
    let Some(raw) = raw else {
        return Ok(StateSettings::default());
    };
    let default_range = StateSettings::DEFAULT_INITIAL_RANGE;
    StateSettings::new(
        raw.dimensions.unwrap_or(StateSettings::DEFAULT_DIMENSIONS),
        raw.target_sum.unwrap_or(StateSettings::DEFAULT_TARGET_SUM),
        raw.initial_min.unwrap_or(default_range.start)..raw.initial_max.unwrap_or(default_range.end),
    )
}

fn resolve_drivers(raw: Option<&DriversConfig>) -> Result<DriverSettings, SettingsError> {
    let Some(raw) = raw else {
        return Ok(DriverSettings::default());
    };
    DriverSettings::new(
        raw.rate_hz.unwrap_or(DriverSettings::DEFAULT_RATE_HZ),
        raw.amplitude.unwrap_or(DriverSettings::DEFAULT_AMPLITUDE),
    )
}

fn resolve_stabilizer(
    raw: Option<&StabilizerConfig>,
    display: Option<&DisplayConfig>,
) -> Result<StabilizerSettings, SettingsError> {
    let mut builder = StabilizerSettings::builder();

    if let Some(display) = display {
        let thresholds = Thresholds::new(
            display
                .elevated_threshold
                .unwrap_or(Thresholds::DEFAULT_ELEVATED),
            display
                .saturated_threshold
                .unwrap_or(Thresholds::DEFAULT_SATURATED),
        )?;
        builder = builder.thresholds(thresholds);
    }

    let Some(raw) = raw else {
        return builder.build();
    };

    if let Some(label) = raw.protocol.as_deref() {
        builder = builder.protocol(resolve_protocol(label));
    }
    if let Some(value) = raw.spin_amplitude {
        builder = builder.spin_amplitude(value);
    }
    if let Some(ms) = raw.jitter_backoff_ms {
        builder = builder.jitter_backoff(Duration::from_millis(ms));
    }
    if let Some(value) = raw.belief_scale {
        builder = builder.belief_scale(value);
    }
    if let Some(value) = raw.dread_level {
        builder = builder.dread_level(value);
    }
    if let Some(ms) = raw.shutdown_timeout_ms {
        builder = builder.shutdown_timeout(Duration::from_millis(ms));
    }
    builder.build()
}

fn resolve_protocol(label: &str) -> Protocol {
    Protocol::from_label(label).unwrap_or_else(|| {
        let fallback = Protocol::default();
        tracing::warn!(label, %fallback, "Unknown protocol in config, using fallback");
        fallback
    })
}

/// Config file location: `$DOZEN_CONFIG` if set and non-empty, otherwise
/// `~/.dozen/config.toml`.
#[must_use]
pub fn config_path() -> Option<PathBuf> {
    if let Ok(raw) = env::var(CONFIG_ENV_VAR)
        && !raw.trim().is_empty()
    {
        return Some(PathBuf::from(raw));
    }
    dirs::home_dir().map(|home| home.join(".dozen").join("config.toml"))
}
