//! Line configuration aggregate and power feed type.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use super::consumers::ConsumerSet;
use crate::config::LineDefaults;

/// How power is fed into the line.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PowerType {
    /// Fed from one end only.
    #[default]
    End,
    /// Fed at multiple points along the line.
    Linear,
}

/// Everything the wizard collects about one distribution line.
///
/// Serialized field names follow the form contract (`length`, `powerType`,
/// `totalPower`, ...), which is also what the HTTP surface accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineConfiguration {
    /// Line length (m).
    #[serde(rename = "length")]
    pub length_m: u32,
    /// Conductor count.
    pub poles: u32,
    /// Line voltage (V).
    #[serde(rename = "voltage")]
    pub voltage_v: u32,
    /// Power feed type.
    pub power_type: PowerType,
    /// Number of consumers on the line.
    pub total_consumers: u32,
    /// Total consumer power (kW).
    #[serde(rename = "totalPower")]
    pub total_power_kw: f64,
    /// Whether per-consumer powers are specified.
    pub show_individual_powers: bool,
    /// Per-consumer powers; empty unless `show_individual_powers` is set.
    #[serde(default)]
    pub individual_powers: ConsumerSet,
}

impl LineConfiguration {
    /// Builds a configuration from form defaults with no individual entries.
    ///
    /// Individual power mode is left off here; the reconciler populates the
    /// entries when it is switched on.
    pub fn from_defaults(defaults: &LineDefaults) -> Self {
        Self {
            length_m: defaults.length_m,
            poles: defaults.poles,
            voltage_v: defaults.voltage_v,
            power_type: defaults.power_type,
            total_consumers: defaults.total_consumers,
            total_power_kw: defaults.total_power_kw,
            show_individual_powers: false,
            individual_powers: ConsumerSet::new(),
        }
    }
}

impl Default for LineConfiguration {
    fn default() -> Self {
        Self::from_defaults(&LineDefaults::default())
    }
}

impl fmt::Display for LineConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Line Configuration ---")?;
        writeln!(f, "Length:          {} m", self.length_m)?;
        writeln!(f, "Poles:           {}", self.poles)?;
        writeln!(f, "Voltage:         {} V", self.voltage_v)?;
        writeln!(f, "Power type:      {}", self.power_type)?;
        writeln!(f, "Consumers:       {}", self.total_consumers)?;
        write!(f, "Total power:     {:.2} kW", self.total_power_kw)?;
        if self.show_individual_powers {
            for (i, power) in self.individual_powers.powers_kw().enumerate() {
                write!(f, "\n  consumer {:>2}:   {power:.2} kW", i + 1)?;
            }
            write!(
                f,
                "\n  sum:           {:.2} kW",
                self.individual_powers.sum_kw()
            )?;
        }
        Ok(())
    }
}
