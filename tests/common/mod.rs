//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use line_wizard::config::{LineLimits, WizardConfig};
use line_wizard::line::{ConsumerPowerReconciler, LineConfiguration, PowerType};
use line_wizard::wizard::WizardSession;

/// Standard field policy (length 1–500 m, threshold 150 m, tolerance 0.1 kW).
pub fn default_limits() -> LineLimits {
    LineLimits::standard()
}

/// Short end-fed line with `consumers` consumers sharing `total_kw`.
pub fn line(consumers: u32, total_kw: f64) -> LineConfiguration {
    LineConfiguration {
        length_m: 50,
        poles: 4,
        voltage_v: 400,
        power_type: PowerType::End,
        total_consumers: consumers,
        total_power_kw: total_kw,
        show_individual_powers: false,
        individual_powers: Default::default(),
    }
}

/// Same as [`line`] with individual mode switched on through the reconciler.
pub fn individual_line(consumers: u32, total_kw: f64) -> LineConfiguration {
    let mut l = line(consumers, total_kw);
    ConsumerPowerReconciler::new(&mut l, &default_limits())
        .toggle_individual_mode(true)
        .expect("fixture count within range");
    l
}

/// Fresh session on the standard preset.
pub fn default_session() -> WizardSession {
    WizardSession::new(&WizardConfig::standard())
}

/// Collects entry powers into a `Vec`.
pub fn powers(line: &LineConfiguration) -> Vec<f64> {
    line.individual_powers.powers_kw().collect()
}

/// Asserts two floats agree to within `1e-9`.
pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}
