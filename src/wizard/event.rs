//! Input events a presentation layer sends to a wizard session.

use serde::{Deserialize, Serialize};

use super::step::Step;
use crate::line::EditError;
use crate::validate::ErrorSet;

/// One user interaction.
///
/// Serialized with an `op` tag so session scripts can list events as
/// `[[events]]` tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum WizardEvent {
    /// Line length edited (m).
    SetLength {
        /// New length.
        length_m: u32,
    },
    /// Conductor count edited.
    SetPoles {
        /// New count.
        poles: u32,
    },
    /// Voltage edited (V).
    SetVoltage {
        /// New voltage.
        voltage_v: u32,
    },
    /// Power type picked; kept as the raw form value.
    SetPowerType {
        /// `"end"` or `"linear"`.
        power_type: String,
    },
    /// Consumer count edited.
    SetConsumerCount {
        /// New count.
        count: u32,
    },
    /// Total power edited (kW).
    SetTotalPower {
        /// New total.
        total_kw: f64,
    },
    /// Individual power checkbox toggled.
    ToggleIndividualMode {
        /// New state.
        enabled: bool,
    },
    /// One consumer's power edited (kW).
    SetEntryPower {
        /// Entry index.
        index: usize,
        /// New power.
        power_kw: f64,
    },
    /// "Add consumer" pressed.
    AddConsumer,
    /// "Remove" pressed on an entry.
    RemoveConsumer {
        /// Entry index.
        index: usize,
    },
    /// "Next" pressed.
    Advance,
    /// "Back" pressed.
    Back,
    /// "Reset" pressed: defaults restored, back to the first step.
    Reset,
}

impl WizardEvent {
    /// The `op` tag of this event.
    pub fn op(&self) -> &'static str {
        match self {
            Self::SetLength { .. } => "set_length",
            Self::SetPoles { .. } => "set_poles",
            Self::SetVoltage { .. } => "set_voltage",
            Self::SetPowerType { .. } => "set_power_type",
            Self::SetConsumerCount { .. } => "set_consumer_count",
            Self::SetTotalPower { .. } => "set_total_power",
            Self::ToggleIndividualMode { .. } => "toggle_individual_mode",
            Self::SetEntryPower { .. } => "set_entry_power",
            Self::AddConsumer => "add_consumer",
            Self::RemoveConsumer { .. } => "remove_consumer",
            Self::Advance => "advance",
            Self::Back => "back",
            Self::Reset => "reset",
        }
    }
}

/// What happened to an event.
#[derive(Debug, Clone, PartialEq)]
pub enum EventOutcome {
    /// Edit applied.
    Applied,
    /// Edit refused; state unchanged.
    Rejected(EditError),
    /// Moved to another step.
    Moved(Step),
    /// Stayed on the current step because its fields have errors.
    Blocked(ErrorSet),
    /// Navigation past the first or last step; nothing happened.
    Stayed(Step),
}

impl EventOutcome {
    /// Returns `true` unless the event was refused or blocked.
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Applied | Self::Moved(_) | Self::Stayed(_))
    }
}
