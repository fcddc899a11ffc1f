//! Length / power-type coupling and the plain field setters.

use std::str::FromStr;

use tracing::{debug, info};

use super::error::EditError;
use super::types::{LineConfiguration, PowerType};

impl LineConfiguration {
    /// Returns `true` if a line of this length must be fed linearly.
    pub fn requires_linear(&self, threshold_m: u32) -> bool {
        self.length_m > threshold_m
    }

    /// Sets the line length, forcing linear feeding beyond `threshold_m`.
    pub fn set_length(&mut self, length_m: u32, threshold_m: u32) {
        self.length_m = length_m;
        debug!(length_m, "length set");
        self.normalize(threshold_m);
    }

    /// Sets the power type.
    ///
    /// # Errors
    ///
    /// [`EditError::LinearPowerTypeLocked`] when asking for end feeding on a
    /// line longer than `threshold_m`.
    pub fn set_power_type(&mut self, power_type: PowerType, threshold_m: u32) -> Result<(), EditError> {
        if power_type != PowerType::Linear && self.requires_linear(threshold_m) {
            return Err(EditError::LinearPowerTypeLocked {
                length_m: self.length_m,
                threshold_m,
            });
        }
        self.power_type = power_type;
        debug!(%power_type, "power type set");
        Ok(())
    }

    /// Parses and sets the power type from its form value.
    ///
    /// # Errors
    ///
    /// [`EditError::UnknownPowerType`] for an unrecognised name, otherwise as
    /// [`LineConfiguration::set_power_type`].
    pub fn set_power_type_str(&mut self, value: &str, threshold_m: u32) -> Result<(), EditError> {
        let power_type = PowerType::from_str(value).map_err(|_| EditError::UnknownPowerType {
            value: value.to_string(),
        })?;
        self.set_power_type(power_type, threshold_m)
    }

    /// Sets the conductor count. Range checks belong to the validator.
    pub fn set_poles(&mut self, poles: u32) {
        self.poles = poles;
        debug!(poles, "poles set");
    }

    /// Sets the line voltage. Range checks belong to the validator.
    pub fn set_voltage(&mut self, voltage_v: u32) {
        self.voltage_v = voltage_v;
        debug!(voltage_v, "voltage set");
    }

    /// Forces linear feeding if the length requires it.
    ///
    /// Returns `true` if the power type was changed.
    pub fn normalize(&mut self, threshold_m: u32) -> bool {
        if self.requires_linear(threshold_m) && self.power_type != PowerType::Linear {
            info!(
                length_m = self.length_m,
                threshold_m, "power type forced to linear"
            );
            self.power_type = PowerType::Linear;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_line_forces_linear() {
        let mut line = LineConfiguration::default();
        assert_eq!(line.power_type, PowerType::End);
        line.set_length(200, 150);
        assert_eq!(line.power_type, PowerType::Linear);
    }

    #[test]
    fn threshold_itself_does_not_force() {
        let mut line = LineConfiguration::default();
        line.set_length(150, 150);
        assert_eq!(line.power_type, PowerType::End);
    }

    #[test]
    fn end_is_rejected_while_long() {
        let mut line = LineConfiguration::default();
        line.set_length(151, 150);
        let result = line.set_power_type(PowerType::End, 150);
        assert_eq!(
            result,
            Err(EditError::LinearPowerTypeLocked {
                length_m: 151,
                threshold_m: 150
            })
        );
        assert_eq!(line.power_type, PowerType::Linear);
    }

    #[test]
    fn shortening_keeps_linear_but_unlocks_end() {
        let mut line = LineConfiguration::default();
        line.set_length(300, 150);
        line.set_length(100, 150);
        assert_eq!(line.power_type, PowerType::Linear);
        assert!(line.set_power_type(PowerType::End, 150).is_ok());
        assert_eq!(line.power_type, PowerType::End);
    }

    #[test]
    fn unknown_power_type_string_is_rejected() {
        let mut line = LineConfiguration::default();
        let result = line.set_power_type_str("radial", 150);
        assert!(matches!(result, Err(EditError::UnknownPowerType { .. })));
        assert!(line.set_power_type_str("linear", 150).is_ok());
        assert_eq!(line.power_type, PowerType::Linear);
    }

    #[test]
    fn normalize_reports_change() {
        let mut line = LineConfiguration {
            length_m: 400,
            ..LineConfiguration::default()
        };
        assert!(line.normalize(150));
        assert!(!line.normalize(150));
    }
}
