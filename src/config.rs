//! TOML-based wizard configuration: numeric field policy and form defaults.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::line::types::PowerType;

/// Absolute tolerance used when comparing summed individual powers to the total.
pub const DEFAULT_CONVERGENCE_TOLERANCE_KW: f64 = 0.1;

/// Line length above which the power type is forced to linear.
pub const DEFAULT_LINEAR_THRESHOLD_M: u32 = 150;

/// Inclusive numeric range for an integer form field.
///
/// # Examples
///
/// ```
/// use line_wizard::config::Bounds;
///
/// let poles = Bounds::new(1, 12);
/// assert!(poles.contains(12));
/// assert!(!poles.contains(0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Bounds {
    /// Smallest accepted value (inclusive).
    pub min: u32,
    /// Largest accepted value (inclusive).
    pub max: u32,
}

impl Bounds {
    /// Creates a new inclusive range.
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    /// Returns `true` when `value` lies within `[min, max]`.
    pub fn contains(&self, value: u32) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.min, self.max)
    }
}

/// Numeric field policy applied by the reconciler and the validator.
///
/// Deployments differ mainly in the accepted line length, so the whole
/// bound set is configuration rather than constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LineLimits {
    /// Accepted line length (m).
    pub length_m: Bounds,
    /// Accepted conductor count.
    pub poles: Bounds,
    /// Accepted line voltage (V).
    pub voltage_v: Bounds,
    /// Accepted number of consumers.
    pub consumers: Bounds,
    /// Upper bound for the total power (kW); the lower bound is exclusive zero.
    pub max_total_power_kw: f64,
    /// Upper bound for a single consumer's power (kW); lower bound is exclusive zero.
    pub max_individual_power_kw: f64,
    /// Length (m) above which the line must be fed linearly.
    pub linear_threshold_m: u32,
    /// Allowed absolute gap between summed individual powers and the total (kW).
    pub convergence_tolerance_kw: f64,
}

impl LineLimits {
    /// Bound set used by the short-line wizard (length 1–500 m).
    pub fn standard() -> Self {
        Self {
            length_m: Bounds::new(1, 500),
            poles: Bounds::new(1, 12),
            voltage_v: Bounds::new(24, 1000),
            consumers: Bounds::new(1, 20),
            max_total_power_kw: 20_000.0,
            max_individual_power_kw: 1_000.0,
            linear_threshold_m: DEFAULT_LINEAR_THRESHOLD_M,
            convergence_tolerance_kw: DEFAULT_CONVERGENCE_TOLERANCE_KW,
        }
    }

    /// Bound set used by the long-line wizard (length 4–1048 m).
    pub fn extended() -> Self {
        Self {
            length_m: Bounds::new(4, 1048),
            ..Self::standard()
        }
    }
}

impl Default for LineLimits {
    fn default() -> Self {
        Self::standard()
    }
}

/// Values a fresh wizard session starts from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LineDefaults {
    /// Initial line length (m).
    pub length_m: u32,
    /// Initial conductor count.
    pub poles: u32,
    /// Initial line voltage (V).
    pub voltage_v: u32,
    /// Initial power feed type.
    pub power_type: PowerType,
    /// Initial number of consumers.
    pub total_consumers: u32,
    /// Initial total power (kW); must be above zero for a fresh session to validate.
    pub total_power_kw: f64,
    /// Whether individual consumer powers start enabled.
    pub show_individual_powers: bool,
}

impl Default for LineDefaults {
    fn default() -> Self {
        Self {
            length_m: 30,
            poles: 4,
            voltage_v: 380,
            power_type: PowerType::End,
            total_consumers: 1,
            total_power_kw: 10.0,
            show_individual_powers: false,
        }
    }
}

/// Top-level wizard configuration parsed from TOML.
///
/// Every section has defaults matching the `standard` preset, so a partial
/// file only needs to name what it overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WizardConfig {
    /// Numeric field policy.
    #[serde(default)]
    pub limits: LineLimits,
    /// Initial form values.
    #[serde(default)]
    pub defaults: LineDefaults,
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"limits.poles"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl WizardConfig {
    /// Returns the `standard` preset (length 1–500 m).
    pub fn standard() -> Self {
        Self {
            limits: LineLimits::standard(),
            defaults: LineDefaults::default(),
        }
    }

    /// Returns the `extended` preset (length 4–1048 m).
    pub fn extended() -> Self {
        Self {
            limits: LineLimits::extended(),
            defaults: LineDefaults::default(),
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["standard", "extended"];

    /// Loads a configuration from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "standard" => Ok(Self::standard()),
            "extended" => Ok(Self::extended()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("limits", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Checks the policy for internal consistency and returns every problem found.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let l = &self.limits;

        for (field, bounds) in [
            ("limits.length_m", l.length_m),
            ("limits.poles", l.poles),
            ("limits.voltage_v", l.voltage_v),
            ("limits.consumers", l.consumers),
        ] {
            if bounds.min > bounds.max {
                errors.push(ConfigError::new(field, "min must be <= max"));
            }
        }
        if l.consumers.min == 0 {
            errors.push(ConfigError::new(
                "limits.consumers",
                "min must be >= 1 (a line always has a consumer)",
            ));
        }
        if !(l.max_total_power_kw.is_finite() && l.max_total_power_kw > 0.0) {
            errors.push(ConfigError::new("limits.max_total_power_kw", "must be > 0"));
        }
        if !(l.max_individual_power_kw.is_finite() && l.max_individual_power_kw > 0.0) {
            errors.push(ConfigError::new(
                "limits.max_individual_power_kw",
                "must be > 0",
            ));
        }
        if !(l.convergence_tolerance_kw.is_finite() && l.convergence_tolerance_kw >= 0.0) {
            errors.push(ConfigError::new(
                "limits.convergence_tolerance_kw",
                "must be >= 0",
            ));
        }

        let d = &self.defaults;
        for (field, value, bounds) in [
            ("defaults.length_m", d.length_m, l.length_m),
            ("defaults.poles", d.poles, l.poles),
            ("defaults.voltage_v", d.voltage_v, l.voltage_v),
            ("defaults.total_consumers", d.total_consumers, l.consumers),
        ] {
            if !bounds.contains(value) {
                errors.push(ConfigError::new(field, format!("must be in {bounds}")));
            }
        }
        if !(d.total_power_kw > 0.0 && d.total_power_kw <= l.max_total_power_kw) {
            errors.push(ConfigError::new(
                "defaults.total_power_kw",
                "must be in (0, limits.max_total_power_kw]",
            ));
        }
        if d.length_m > l.linear_threshold_m && d.power_type != PowerType::Linear {
            errors.push(ConfigError::new(
                "defaults.power_type",
                "must be \"linear\" when defaults.length_m exceeds limits.linear_threshold_m",
            ));
        }

        errors
    }
}
