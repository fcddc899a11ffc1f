//! TOML session scripts: initial values plus an ordered list of events.
//!
//! ```toml
//! preset = "extended"
//!
//! [line]
//! length = 120
//! totalConsumers = 3
//! totalPower = 30.0
//!
//! [[events]]
//! op = "toggle_individual_mode"
//! enabled = true
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{ConfigError, WizardConfig};
use crate::line::{LineConfiguration, PowerType};
use crate::wizard::WizardEvent;

/// Failure to load a session script.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// File could not be read.
    #[error("cannot read \"{path}\": {source}")]
    Read {
        /// Script path.
        path: String,
        /// Underlying error.
        source: std::io::Error,
    },
    /// TOML is malformed or names unknown fields.
    #[error("invalid session script: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Partial initial values; anything left out comes from the defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct LineOverrides {
    /// Line length (m).
    pub length: Option<u32>,
    /// Conductor count.
    pub poles: Option<u32>,
    /// Line voltage (V).
    pub voltage: Option<u32>,
    /// Power feed type.
    pub power_type: Option<PowerType>,
    /// Consumer count.
    pub total_consumers: Option<u32>,
    /// Total power (kW).
    pub total_power: Option<f64>,
    /// Start in individual power mode.
    pub show_individual_powers: Option<bool>,
}

impl LineOverrides {
    /// Applies the overrides on top of `config.defaults`.
    ///
    /// The individual-mode flag is returned separately rather than set, so
    /// the session can switch it on through the reconciler.
    pub fn resolve(&self, config: &WizardConfig) -> (LineConfiguration, bool) {
        let d = &config.defaults;
        let line = LineConfiguration {
            length_m: self.length.unwrap_or(d.length_m),
            poles: self.poles.unwrap_or(d.poles),
            voltage_v: self.voltage.unwrap_or(d.voltage_v),
            power_type: self.power_type.unwrap_or(d.power_type),
            total_consumers: self.total_consumers.unwrap_or(d.total_consumers),
            total_power_kw: self.total_power.unwrap_or(d.total_power_kw),
            ..LineConfiguration::from_defaults(d)
        };
        let individual = self
            .show_individual_powers
            .unwrap_or(d.show_individual_powers);
        (line, individual)
    }
}

/// A recorded wizard session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionScript {
    /// Preset to run under when no explicit policy is given.
    #[serde(default)]
    pub preset: Option<String>,
    /// Initial values.
    #[serde(default)]
    pub line: LineOverrides,
    /// Events in dispatch order.
    #[serde(default)]
    pub events: Vec<WizardEvent>,
}

impl SessionScript {
    /// Parses a script from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ScriptError` if the file cannot be read or parsed.
    pub fn from_toml_file(path: &Path) -> Result<Self, ScriptError> {
        let content = fs::read_to_string(path).map_err(|source| ScriptError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a script from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ScriptError` if the TOML is invalid.
    pub fn from_toml_str(s: &str) -> Result<Self, ScriptError> {
        Ok(toml::from_str(s)?)
    }

    /// Configuration named by the script's preset, or `fallback` if it has none.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` for an unknown preset name.
    pub fn config_or(&self, fallback: WizardConfig) -> Result<WizardConfig, ConfigError> {
        match &self.preset {
            Some(name) => WizardConfig::from_preset(name),
            None => Ok(fallback),
        }
    }
}
