//! Step-by-step wizard driving a single line configuration.

pub mod event;
pub mod session;
/// Wizard pages and the fields each one owns.
pub mod step;

pub use event::{EventOutcome, WizardEvent};
pub use session::{StepSnapshot, SubmitError, WizardSession};
pub use step::Step;
