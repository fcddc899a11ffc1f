//! Single-owner wizard session.

use thiserror::Error;
use tracing::{debug, info, warn};

use super::event::{EventOutcome, WizardEvent};
use super::step::Step;
use crate::config::{LineDefaults, LineLimits, WizardConfig};
use crate::io::sink::{SinkError, SubmissionSink};
use crate::line::reconciler::individual_power_state;
use crate::line::{ConsumerPowerReconciler, EditError, IndividualPowerState, LineConfiguration};
use crate::validate::{ErrorSet, validate};

/// Configuration as it stood when a step was completed.
#[derive(Debug, Clone, PartialEq)]
pub struct StepSnapshot {
    /// Completed step.
    pub step: Step,
    /// Configuration handed to the following step.
    pub line: LineConfiguration,
}

/// Failure to submit a session.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// Configuration still has validation errors.
    #[error("configuration has {} validation error(s):\n{0}", .0.len())]
    Invalid(ErrorSet),
    /// The sink could not take the configuration.
    #[error("submission failed: {0}")]
    Sink(#[from] SinkError),
}

/// One user's pass through the wizard.
///
/// Owns the configuration being edited; every edit goes through this type
/// so the reconciler and the length rule always run.
#[derive(Debug, Clone)]
pub struct WizardSession {
    limits: LineLimits,
    defaults: LineDefaults,
    line: LineConfiguration,
    step: Step,
    snapshots: Vec<StepSnapshot>,
}

impl WizardSession {
    /// Starts a session from the configured defaults.
    pub fn new(config: &WizardConfig) -> Self {
        let mut session = Self::with_line(
            config.limits.clone(),
            LineConfiguration::from_defaults(&config.defaults),
        )
        .with_defaults(config.defaults.clone());
        session.load_defaults();
        session
    }

    /// Starts a session from an existing configuration.
    ///
    /// The length rule is applied immediately, so a long line loaded with
    /// end feeding comes back linear. [`WizardSession::reset`] returns to
    /// [`LineDefaults::default`] unless [`WizardSession::with_defaults`]
    /// says otherwise.
    pub fn with_line(limits: LineLimits, mut line: LineConfiguration) -> Self {
        line.normalize(limits.linear_threshold_m);
        Self {
            limits,
            defaults: LineDefaults::default(),
            line,
            step: Step::FIRST,
            snapshots: Vec::new(),
        }
    }

    /// Sets the values [`WizardSession::reset`] goes back to.
    pub fn with_defaults(mut self, defaults: LineDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    fn load_defaults(&mut self) {
        self.line = LineConfiguration::from_defaults(&self.defaults);
        self.line.normalize(self.limits.linear_threshold_m);
        self.step = Step::FIRST;
        self.snapshots.clear();
        if self.defaults.show_individual_powers {
            if let Err(e) = self.toggle_individual_mode(true) {
                warn!(error = %e, "individual mode left off");
            }
        }
    }

    /// Discards every edit and snapshot and reopens the first step with
    /// the defaults. Individual entries are destroyed.
    pub fn reset(&mut self) {
        self.load_defaults();
        info!("session reset to defaults");
    }

    /// Current configuration.
    pub fn line(&self) -> &LineConfiguration {
        &self.line
    }

    /// Field policy in force.
    pub fn limits(&self) -> &LineLimits {
        &self.limits
    }

    /// Step currently shown.
    pub fn step(&self) -> Step {
        self.step
    }

    /// Snapshots of completed steps, oldest first.
    pub fn snapshots(&self) -> &[StepSnapshot] {
        &self.snapshots
    }

    /// Every validation error of the current configuration.
    pub fn errors(&self) -> ErrorSet {
        validate(&self.line, &self.limits)
    }

    /// Validation errors on the fields of the current step.
    pub fn step_errors(&self) -> ErrorSet {
        let step = self.step;
        self.errors().filtered(|f| step.owns(f))
    }

    /// State of the individual-power subsystem.
    pub fn individual_state(&self) -> IndividualPowerState {
        individual_power_state(&self.line, self.limits.convergence_tolerance_kw)
    }

    fn reconciler(&mut self) -> ConsumerPowerReconciler<'_> {
        ConsumerPowerReconciler::new(&mut self.line, &self.limits)
    }

    /// Sets the line length; may force linear feeding.
    pub fn set_length(&mut self, length_m: u32) {
        self.line.set_length(length_m, self.limits.linear_threshold_m);
    }

    /// Sets the conductor count.
    pub fn set_poles(&mut self, poles: u32) {
        self.line.set_poles(poles);
    }

    /// Sets the line voltage.
    pub fn set_voltage(&mut self, voltage_v: u32) {
        self.line.set_voltage(voltage_v);
    }

    /// Sets the power type from its form value.
    ///
    /// # Errors
    ///
    /// See [`LineConfiguration::set_power_type_str`].
    pub fn set_power_type(&mut self, value: &str) -> Result<(), EditError> {
        self.line
            .set_power_type_str(value, self.limits.linear_threshold_m)
    }

    /// See [`ConsumerPowerReconciler::set_consumer_count`].
    ///
    /// # Errors
    ///
    /// Count outside the configured range.
    pub fn set_consumer_count(&mut self, count: u32) -> Result<(), EditError> {
        self.reconciler().set_consumer_count(count)
    }

    /// See [`ConsumerPowerReconciler::set_total_power`].
    ///
    /// # Errors
    ///
    /// Negative or non-finite total.
    pub fn set_total_power(&mut self, total_kw: f64) -> Result<(), EditError> {
        self.reconciler().set_total_power(total_kw)
    }

    /// See [`ConsumerPowerReconciler::toggle_individual_mode`].
    ///
    /// # Errors
    ///
    /// Enabling with a consumer count outside the configured range.
    pub fn toggle_individual_mode(&mut self, enabled: bool) -> Result<(), EditError> {
        self.reconciler().toggle_individual_mode(enabled)
    }

    /// See [`ConsumerPowerReconciler::set_entry_power`].
    ///
    /// # Errors
    ///
    /// Invalid power or unknown index.
    pub fn set_entry_power(&mut self, index: usize, power_kw: f64) -> Result<(), EditError> {
        self.reconciler().set_entry_power(index, power_kw)
    }

    /// See [`ConsumerPowerReconciler::add_consumer`].
    ///
    /// # Errors
    ///
    /// Count already at its maximum.
    pub fn add_consumer(&mut self) -> Result<(), EditError> {
        self.reconciler().add_consumer()
    }

    /// See [`ConsumerPowerReconciler::remove_consumer`].
    ///
    /// # Errors
    ///
    /// Last consumer, individual mode off, or unknown index.
    pub fn remove_consumer(&mut self, index: usize) -> Result<(), EditError> {
        self.reconciler().remove_consumer(index)
    }

    /// Completes the current step if its fields are clean.
    ///
    /// On success the session moves to the next step (the review step stays
    /// put) and the returned snapshot is what that step starts from.
    /// Snapshots of this and later steps from an earlier pass are replaced.
    ///
    /// # Errors
    ///
    /// Returns the current step's errors; the session does not move.
    pub fn advance(&mut self) -> Result<StepSnapshot, ErrorSet> {
        let errors = self.step_errors();
        if !errors.is_empty() {
            info!(step = %self.step, errors = errors.len(), "step blocked");
            return Err(errors);
        }

        let completed = self.step;
        let snapshot = StepSnapshot {
            step: completed,
            line: self.line.clone(),
        };
        self.snapshots.retain(|s| s.step < completed);
        self.snapshots.push(snapshot.clone());

        if let Some(next) = completed.next() {
            self.step = next;
            info!(from = %completed, to = %next, "step completed");
        }
        Ok(snapshot)
    }

    /// Returns to the previous step, keeping all edits.
    ///
    /// Returns the step now shown, or `None` if already on the first step.
    pub fn back(&mut self) -> Option<Step> {
        let prev = self.step.prev()?;
        info!(from = %self.step, to = %prev, "step back");
        self.step = prev;
        Some(prev)
    }

    /// Dispatches one event and reports what happened.
    pub fn apply(&mut self, event: &WizardEvent) -> EventOutcome {
        let result = match event {
            WizardEvent::SetLength { length_m } => {
                self.set_length(*length_m);
                Ok(())
            }
            WizardEvent::SetPoles { poles } => {
                self.set_poles(*poles);
                Ok(())
            }
            WizardEvent::SetVoltage { voltage_v } => {
                self.set_voltage(*voltage_v);
                Ok(())
            }
            WizardEvent::SetPowerType { power_type } => self.set_power_type(power_type),
            WizardEvent::SetConsumerCount { count } => self.set_consumer_count(*count),
            WizardEvent::SetTotalPower { total_kw } => self.set_total_power(*total_kw),
            WizardEvent::ToggleIndividualMode { enabled } => {
                self.toggle_individual_mode(*enabled)
            }
            WizardEvent::SetEntryPower { index, power_kw } => {
                self.set_entry_power(*index, *power_kw)
            }
            WizardEvent::AddConsumer => self.add_consumer(),
            WizardEvent::RemoveConsumer { index } => self.remove_consumer(*index),
            WizardEvent::Reset => {
                self.reset();
                Ok(())
            }
            WizardEvent::Advance => {
                let from = self.step;
                return match self.advance() {
                    Ok(_) if self.step == from => EventOutcome::Stayed(from),
                    Ok(_) => EventOutcome::Moved(self.step),
                    Err(errors) => EventOutcome::Blocked(errors),
                };
            }
            WizardEvent::Back => {
                return match self.back() {
                    Some(step) => EventOutcome::Moved(step),
                    None => EventOutcome::Stayed(self.step),
                };
            }
        };

        match result {
            Ok(()) => {
                debug!(op = event.op(), "event applied");
                EventOutcome::Applied
            }
            Err(e) => {
                warn!(op = event.op(), error = %e, "event rejected");
                EventOutcome::Rejected(e)
            }
        }
    }

    /// Validates the whole configuration and hands it to `sink`.
    ///
    /// # Errors
    ///
    /// [`SubmitError::Invalid`] while any validation error remains (the sink
    /// is not called), [`SubmitError::Sink`] if delivery fails.
    pub fn submit<S: SubmissionSink + ?Sized>(
        &self,
        sink: &mut S,
    ) -> Result<LineConfiguration, SubmitError> {
        let errors = self.errors();
        if !errors.is_empty() {
            warn!(errors = errors.len(), "submission refused");
            return Err(SubmitError::Invalid(errors));
        }
        sink.submit(&self.line)?;
        info!(sink = sink.name(), "submission delivered");
        Ok(self.line.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line::PowerType;
    use crate::validate::Field;

    fn session() -> WizardSession {
        WizardSession::new(&WizardConfig::standard())
    }

    #[test]
    fn new_session_starts_on_first_step_and_is_valid() {
        let s = session();
        assert_eq!(s.step(), Step::Line);
        assert!(s.errors().is_empty(), "defaults should validate: {}", s.errors());
        assert_eq!(s.individual_state(), IndividualPowerState::Disabled);
    }

    #[test]
    fn defaults_can_start_in_individual_mode() {
        let mut cfg = WizardConfig::standard();
        cfg.defaults.total_consumers = 2;
        cfg.defaults.show_individual_powers = true;
        let s = WizardSession::new(&cfg);
        assert_eq!(s.line().individual_powers.len(), 2);
    }

    #[test]
    fn loaded_long_line_is_normalized() {
        let line = LineConfiguration {
            length_m: 300,
            power_type: PowerType::End,
            ..LineConfiguration::default()
        };
        let s = WizardSession::with_line(LineLimits::standard(), line);
        assert_eq!(s.line().power_type, PowerType::Linear);
    }

    #[test]
    fn advance_is_blocked_by_current_step_fields_only() {
        let mut s = session();
        s.set_total_power(0.0).ok();
        assert!(s.advance().is_ok(), "total power belongs to a later step");
        assert_eq!(s.step(), Step::Power);

        s.back();
        s.set_poles(0);
        let blocked = s.advance();
        assert!(matches!(blocked, Err(ref e) if e.contains(Field::Poles)));
        assert_eq!(s.step(), Step::Line);
    }

    #[test]
    fn snapshots_are_replaced_on_second_pass() {
        let mut s = session();
        s.advance().ok();
        s.advance().ok();
        assert_eq!(s.snapshots().len(), 2);

        s.back();
        s.back();
        s.set_voltage(230);
        s.advance().ok();
        assert_eq!(s.snapshots().len(), 1);
        assert_eq!(s.snapshots()[0].line.voltage_v, 230);
    }

    #[test]
    fn review_step_stays_put() {
        let mut s = session();
        for _ in 0..3 {
            assert!(s.advance().is_ok());
        }
        assert_eq!(s.step(), Step::Review);
        assert!(s.advance().is_ok());
        assert_eq!(s.step(), Step::Review);
    }

    #[test]
    fn apply_reports_rejection_without_changing_state() {
        let mut s = session();
        let before = s.line().clone();
        let outcome = s.apply(&WizardEvent::SetConsumerCount { count: 21 });
        assert!(matches!(outcome, EventOutcome::Rejected(_)));
        assert!(!outcome.is_accepted());
        assert_eq!(s.line(), &before);
    }

    #[test]
    fn apply_back_on_first_step_stays() {
        let mut s = session();
        assert_eq!(s.apply(&WizardEvent::Back), EventOutcome::Stayed(Step::Line));
    }

    #[test]
    fn submit_refuses_diverged_powers() {
        let mut s = session();
        s.set_consumer_count(3).ok();
        s.set_total_power(30.0).ok();
        s.toggle_individual_mode(true).ok();
        s.set_entry_power(0, 5.0).ok();

        let mut sink: Vec<LineConfiguration> = Vec::new();
        let result = s.submit(&mut sink);
        assert!(matches!(result, Err(SubmitError::Invalid(ref e)) if e.contains(Field::TotalPower)));
        assert!(sink.is_empty());

        s.set_total_power(30.0).ok();
        assert!(s.submit(&mut sink).is_ok());
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn reset_restores_defaults_and_first_step() {
        let mut s = session();
        s.set_length(220);
        s.set_consumer_count(3).ok();
        s.toggle_individual_mode(true).ok();
        s.set_entry_power(0, 1.0).ok();
        s.advance().ok();
        assert_eq!(s.individual_state(), IndividualPowerState::EnabledDiverged);

        assert_eq!(s.apply(&WizardEvent::Reset), EventOutcome::Applied);
        assert_eq!(s.line(), &LineConfiguration::default());
        assert_eq!(s.step(), Step::Line);
        assert!(s.snapshots().is_empty());
        assert_eq!(s.individual_state(), IndividualPowerState::Disabled);
        assert!(s.errors().is_empty());
    }

    #[test]
    fn reset_uses_configured_defaults() {
        let mut cfg = WizardConfig::extended();
        cfg.defaults.length_m = 600;
        cfg.defaults.power_type = PowerType::Linear;
        let mut s = WizardSession::new(&cfg);
        s.set_length(90);
        s.reset();
        assert_eq!(s.line().length_m, 600);
        assert_eq!(s.line().power_type, PowerType::Linear);
    }
}
