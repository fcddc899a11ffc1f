//! Line-configuration wizard: consumer power reconciliation, validation and
//! step-by-step session handling for low-voltage distribution lines.

pub mod config;
pub mod io;
/// Line configuration, consumer table and power reconciler.
pub mod line;
pub mod runner;
pub mod script;
pub mod telemetry;
pub mod validate;
pub mod wizard;

#[cfg(feature = "api")]
pub mod api;
