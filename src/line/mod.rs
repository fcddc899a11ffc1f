//! Line configuration model and the consumer power reconciler.

/// Per-consumer power entries.
pub mod consumers;
mod error;
pub mod reconciler;
/// Length / power-type rule and plain field setters.
mod rules;
pub mod types;

pub use consumers::{ConsumerPowerEntry, ConsumerSet, EntryId, PowerRecord};
pub use error::EditError;
pub use reconciler::{ConsumerPowerReconciler, IndividualPowerState, powers_converge};
pub use types::{LineConfiguration, PowerType};
