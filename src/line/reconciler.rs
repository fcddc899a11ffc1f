//! Consumer power reconciliation.
//!
//! Keeps the per-consumer power list the same length as the consumer count
//! and spreads the total power evenly across it whenever the count or the
//! total changes. Manual per-entry edits are accepted as-is; whether they
//! still add up to the total is the validator's concern.
//!
//! Rebalancing rules:
//! - count change (including [`ConsumerPowerReconciler::add_consumer`]):
//!   resize, then overwrite every entry with `total / count`
//! - total change: overwrite every entry with `total / count`
//! - [`ConsumerPowerReconciler::remove_consumer`]: drop one entry, no rebalance

use serde::Serialize;
use strum::Display;
use tracing::debug;

use super::consumers::ConsumerSet;
use super::error::EditError;
use super::types::LineConfiguration;
use crate::config::{Bounds, LineLimits};

/// Where the individual-power subsystem currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum IndividualPowerState {
    /// Individual mode off; no entries exist.
    Disabled,
    /// Entries sum to the total within tolerance.
    EnabledConverged,
    /// Entries no longer sum to the total.
    EnabledDiverged,
}

impl IndividualPowerState {
    /// Returns `true` if a configuration in this state may be submitted.
    pub fn is_submittable(self) -> bool {
        !matches!(self, Self::EnabledDiverged)
    }
}

/// Even share of `total_kw` across `count` consumers; zero when either is zero.
///
/// # Examples
///
/// ```
/// use line_wizard::line::reconciler::even_share_kw;
///
/// assert_eq!(even_share_kw(30.0, 3), 10.0);
/// assert_eq!(even_share_kw(0.0, 3), 0.0);
/// ```
pub fn even_share_kw(total_kw: f64, count: u32) -> f64 {
    if count == 0 || total_kw <= 0.0 {
        0.0
    } else {
        total_kw / f64::from(count)
    }
}

/// Returns `true` when the entries sum to `total_kw` within `tolerance_kw`.
pub fn powers_converge(entries: &ConsumerSet, total_kw: f64, tolerance_kw: f64) -> bool {
    (entries.sum_kw() - total_kw).abs() <= tolerance_kw
}

/// Classifies the individual-power subsystem of `line`.
pub fn individual_power_state(line: &LineConfiguration, tolerance_kw: f64) -> IndividualPowerState {
    if !line.show_individual_powers {
        IndividualPowerState::Disabled
    } else if line.individual_powers.is_empty()
        || powers_converge(&line.individual_powers, line.total_power_kw, tolerance_kw)
    {
        IndividualPowerState::EnabledConverged
    } else {
        IndividualPowerState::EnabledDiverged
    }
}

fn check_power(value: f64) -> Result<(), EditError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(EditError::InvalidPower { value })
    }
}

/// Mutating view over a line's consumer fields.
///
/// Borrowing the configuration for the duration of one edit keeps the
/// configuration itself single-owner.
pub struct ConsumerPowerReconciler<'a> {
    line: &'a mut LineConfiguration,
    consumers: Bounds,
}

impl<'a> ConsumerPowerReconciler<'a> {
    /// Wraps `line`, taking the accepted consumer range from `limits`.
    pub fn new(line: &'a mut LineConfiguration, limits: &LineLimits) -> Self {
        Self {
            line,
            consumers: limits.consumers,
        }
    }

    fn check_count(&self, count: u32) -> Result<(), EditError> {
        if self.consumers.contains(count) {
            Ok(())
        } else {
            Err(EditError::ConsumerCountOutOfRange {
                count,
                min: self.consumers.min,
                max: self.consumers.max,
            })
        }
    }

    fn redistribute(&mut self) {
        let share = even_share_kw(self.line.total_power_kw, self.line.total_consumers);
        self.line.individual_powers.fill(share);
    }

    /// Changes the consumer count, resizing and re-flattening the entries.
    ///
    /// New entries are appended at the even share; surplus entries are
    /// removed from the tail so entry `0` survives. Every remaining entry
    /// is then overwritten with the even share, discarding manual edits.
    ///
    /// # Errors
    ///
    /// [`EditError::ConsumerCountOutOfRange`] if `new_count` is outside the
    /// configured range; nothing changes in that case.
    pub fn set_consumer_count(&mut self, new_count: u32) -> Result<(), EditError> {
        self.check_count(new_count)?;
        self.line.total_consumers = new_count;

        if self.line.show_individual_powers {
            let share = even_share_kw(self.line.total_power_kw, new_count);
            let target = new_count as usize;
            let entries = &mut self.line.individual_powers;
            if target > entries.len() {
                for _ in entries.len()..target {
                    entries.push(share);
                }
            } else {
                entries.truncate_tail(target);
            }
            self.redistribute();
        }

        debug!(
            count = new_count,
            entries = self.line.individual_powers.len(),
            "consumer count changed"
        );
        Ok(())
    }

    /// Changes the total power and, in individual mode, re-flattens every entry.
    ///
    /// # Errors
    ///
    /// [`EditError::InvalidPower`] if `total_kw` is negative or not finite.
    pub fn set_total_power(&mut self, total_kw: f64) -> Result<(), EditError> {
        check_power(total_kw)?;
        self.line.total_power_kw = total_kw;
        if self.line.show_individual_powers {
            self.redistribute();
        }
        debug!(total_kw, "total power changed");
        Ok(())
    }

    /// Switches individual power mode.
    ///
    /// Enabling creates `total_consumers` entries at the even share.
    /// Disabling destroys every entry; re-enabling starts from a fresh even
    /// split. Enabling while already enabled leaves the entries alone.
    ///
    /// # Errors
    ///
    /// [`EditError::ConsumerCountOutOfRange`] when enabling with a consumer
    /// count outside the configured range; the mode stays off and no entry
    /// is created.
    pub fn toggle_individual_mode(&mut self, enabled: bool) -> Result<(), EditError> {
        if enabled == self.line.show_individual_powers {
            return Ok(());
        }
        if enabled {
            self.check_count(self.line.total_consumers)?;
        }
        self.line.show_individual_powers = enabled;
        let entries = &mut self.line.individual_powers;
        entries.clear();
        if enabled {
            let share = even_share_kw(self.line.total_power_kw, self.line.total_consumers);
            for _ in 0..self.line.total_consumers {
                entries.push(share);
            }
        }
        debug!(enabled, entries = entries.len(), "individual power mode toggled");
        Ok(())
    }

    /// Overwrites the power of a single entry. Other entries are untouched.
    ///
    /// # Errors
    ///
    /// [`EditError::InvalidPower`] for a negative or non-finite value,
    /// [`EditError::EntryIndexOutOfRange`] for an unknown index.
    pub fn set_entry_power(&mut self, index: usize, power_kw: f64) -> Result<(), EditError> {
        check_power(power_kw)?;
        let entries = &mut self.line.individual_powers;
        if !entries.set_power(index, power_kw) {
            return Err(EditError::EntryIndexOutOfRange {
                index,
                len: entries.len(),
            });
        }
        debug!(index, power_kw, "entry power set");
        Ok(())
    }

    /// Adds one consumer and re-flattens, matching `set_consumer_count(n + 1)`.
    ///
    /// # Errors
    ///
    /// [`EditError::ConsumerCountOutOfRange`] if the count is already at its maximum.
    pub fn add_consumer(&mut self) -> Result<(), EditError> {
        let new_count = self.line.total_consumers.saturating_add(1);
        self.check_count(new_count)?;
        self.line.total_consumers = new_count;

        if self.line.show_individual_powers {
            let share = even_share_kw(self.line.total_power_kw, new_count);
            let entries = &mut self.line.individual_powers;
            for _ in entries.len()..new_count as usize {
                entries.push(share);
            }
            entries.fill(share);
        }

        debug!(count = new_count, "consumer added");
        Ok(())
    }

    /// Removes the entry at `index` and decrements the consumer count.
    ///
    /// Remaining entries keep their values, so the sum may now diverge from
    /// the total until the next count or total change.
    ///
    /// # Errors
    ///
    /// [`EditError::LastConsumer`] when only one consumer is left,
    /// [`EditError::IndividualModeDisabled`] outside individual mode,
    /// [`EditError::EntryIndexOutOfRange`] for an unknown index.
    pub fn remove_consumer(&mut self, index: usize) -> Result<(), EditError> {
        if self.line.total_consumers <= 1 {
            return Err(EditError::LastConsumer);
        }
        if !self.line.show_individual_powers {
            return Err(EditError::IndividualModeDisabled);
        }
        let entries = &mut self.line.individual_powers;
        let len = entries.len();
        if entries.remove_at(index).is_none() {
            return Err(EditError::EntryIndexOutOfRange { index, len });
        }
        self.line.total_consumers -= 1;
        debug!(
            index,
            count = self.line.total_consumers,
            "consumer removed"
        );
        Ok(())
    }
}

/// Count-change handler for the presentation layer.
///
/// # Errors
///
/// See [`ConsumerPowerReconciler::set_consumer_count`].
pub fn on_count_change(
    line: &mut LineConfiguration,
    new_count: u32,
    limits: &LineLimits,
) -> Result<(), EditError> {
    ConsumerPowerReconciler::new(line, limits).set_consumer_count(new_count)
}

/// Total-power-change handler for the presentation layer.
///
/// # Errors
///
/// See [`ConsumerPowerReconciler::set_total_power`].
pub fn on_total_power_change(
    line: &mut LineConfiguration,
    total_kw: f64,
    limits: &LineLimits,
) -> Result<(), EditError> {
    ConsumerPowerReconciler::new(line, limits).set_total_power(total_kw)
}
