use thiserror::Error;

/// Reason an edit was refused. A refused edit leaves the configuration untouched.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EditError {
    /// Requested consumer count falls outside the configured range.
    #[error("consumer count {count} is outside {min}..={max}")]
    ConsumerCountOutOfRange {
        /// Rejected count.
        count: u32,
        /// Smallest accepted count.
        min: u32,
        /// Largest accepted count.
        max: u32,
    },
    /// Power value is negative, NaN or infinite.
    #[error("power must be a finite non-negative number (got {value})")]
    InvalidPower {
        /// Rejected value (kW).
        value: f64,
    },
    /// No consumer entry exists at the given index.
    #[error("no consumer entry at index {index} (have {len})")]
    EntryIndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Current entry count.
        len: usize,
    },
    /// Removing would leave the line without consumers.
    #[error("cannot remove the last consumer")]
    LastConsumer,
    /// Per-consumer edits need individual power mode.
    #[error("individual power mode is disabled")]
    IndividualModeDisabled,
    /// End feeding is not allowed on a line this long.
    #[error("power type is locked to linear for lines longer than {threshold_m} m (length is {length_m} m)")]
    LinearPowerTypeLocked {
        /// Current line length (m).
        length_m: u32,
        /// Forcing threshold (m).
        threshold_m: u32,
    },
    /// Power type string is not a known variant.
    #[error("unknown power type \"{value}\" (expected \"end\" or \"linear\")")]
    UnknownPowerType {
        /// Rejected input.
        value: String,
    },
}
