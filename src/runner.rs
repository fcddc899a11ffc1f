//! Replays a session script against a fresh wizard session.

use std::fmt;

use serde::Serialize;
use tracing::{info, warn};

use crate::config::WizardConfig;
use crate::line::{IndividualPowerState, LineConfiguration};
use crate::script::SessionScript;
use crate::validate::ErrorSet;
use crate::wizard::{EventOutcome, Step, WizardSession};

/// How one event ended, in wire form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// Edit applied.
    Applied,
    /// Edit refused.
    Rejected,
    /// Step changed.
    Moved,
    /// Step change refused because of field errors.
    Blocked,
    /// Navigation past either end; no change.
    Stayed,
}

/// Record of one replayed event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutcomeRecord {
    /// Position in the script (0-based).
    pub index: usize,
    /// Event `op` tag.
    pub op: &'static str,
    /// Result class.
    pub status: OutcomeStatus,
    /// Human-readable detail for rejections, blocks and moves.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl OutcomeRecord {
    fn new(index: usize, op: &'static str, outcome: &EventOutcome) -> Self {
        let (status, detail) = match outcome {
            EventOutcome::Applied => (OutcomeStatus::Applied, None),
            EventOutcome::Rejected(e) => (OutcomeStatus::Rejected, Some(e.to_string())),
            EventOutcome::Moved(step) => (OutcomeStatus::Moved, Some(step.to_string())),
            EventOutcome::Blocked(errors) => (OutcomeStatus::Blocked, Some(errors.to_string())),
            EventOutcome::Stayed(step) => (OutcomeStatus::Stayed, Some(step.to_string())),
        };
        Self {
            index,
            op,
            status,
            detail,
        }
    }
}

impl fmt::Display for OutcomeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = match self.status {
            OutcomeStatus::Applied => "applied",
            OutcomeStatus::Rejected => "rejected",
            OutcomeStatus::Moved => "moved",
            OutcomeStatus::Blocked => "blocked",
            OutcomeStatus::Stayed => "stayed",
        };
        write!(f, "#{:<3} {:<24} {status}", self.index, self.op)?;
        if let Some(detail) = &self.detail {
            write!(f, " ({})", detail.replace('\n', "; "))?;
        }
        Ok(())
    }
}

/// A replayed session and what happened to each event.
#[derive(Debug, Clone)]
pub struct Replay {
    /// Session after the last event.
    pub session: WizardSession,
    /// One record per scripted event.
    pub outcomes: Vec<OutcomeRecord>,
}

/// Serializable summary of a replay.
#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    /// Final configuration.
    pub line: LineConfiguration,
    /// Step the session ended on.
    pub step: Step,
    /// Individual-power subsystem state.
    pub individual_state: IndividualPowerState,
    /// Per-event outcomes.
    pub outcomes: Vec<OutcomeRecord>,
    /// Remaining validation errors.
    pub errors: ErrorSet,
    /// `true` when the configuration could be submitted as-is.
    pub submittable: bool,
}

impl Replay {
    /// Builds the serializable summary.
    pub fn report(&self) -> ReplayReport {
        let errors = self.session.errors();
        ReplayReport {
            line: self.session.line().clone(),
            step: self.session.step(),
            individual_state: self.session.individual_state(),
            outcomes: self.outcomes.clone(),
            submittable: errors.is_empty(),
            errors,
        }
    }

    /// Number of events that were refused or blocked.
    pub fn rejected_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, OutcomeStatus::Rejected | OutcomeStatus::Blocked))
            .count()
    }
}

/// Creates the session a script starts from.
///
/// Individual mode is switched on through the reconciler, so an initial
/// consumer count outside the configured range leaves it off and shows up
/// as a validation error instead.
pub fn build_session(script: &SessionScript, config: &WizardConfig) -> WizardSession {
    let (line, individual) = script.line.resolve(config);
    let mut session = WizardSession::with_line(config.limits.clone(), line)
        .with_defaults(config.defaults.clone());
    if individual {
        if let Err(e) = session.toggle_individual_mode(true) {
            warn!(error = %e, "initial individual mode refused");
        }
    }
    session
}

/// Replays every event of `script` in order.
pub fn replay(script: &SessionScript, config: &WizardConfig) -> Replay {
    let mut session = build_session(script, config);
    let mut outcomes = Vec::with_capacity(script.events.len());

    for (index, event) in script.events.iter().enumerate() {
        let outcome = session.apply(event);
        outcomes.push(OutcomeRecord::new(index, event.op(), &outcome));
    }

    let replay = Replay { session, outcomes };
    info!(
        events = replay.outcomes.len(),
        rejected = replay.rejected_count(),
        step = %replay.session.step(),
        "session replayed"
    );
    replay
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wizard::WizardEvent;

    fn script(events: Vec<WizardEvent>) -> SessionScript {
        SessionScript {
            events,
            ..SessionScript::default()
        }
    }

    #[test]
    fn replay_records_every_event() {
        let s = script(vec![
            WizardEvent::SetConsumerCount { count: 3 },
            WizardEvent::SetConsumerCount { count: 0 },
            WizardEvent::Back,
        ]);
        let r = replay(&s, &WizardConfig::standard());
        let statuses: Vec<OutcomeStatus> = r.outcomes.iter().map(|o| o.status).collect();
        assert_eq!(
            statuses,
            vec![
                OutcomeStatus::Applied,
                OutcomeStatus::Rejected,
                OutcomeStatus::Stayed
            ]
        );
        assert_eq!(r.rejected_count(), 1);
        assert_eq!(r.session.line().total_consumers, 3);
    }

    #[test]
    fn initial_individual_mode_goes_through_reconciler() {
        let mut s = script(Vec::new());
        s.line.total_consumers = Some(4);
        s.line.total_power = Some(40.0);
        s.line.show_individual_powers = Some(true);
        let r = replay(&s, &WizardConfig::standard());
        let powers: Vec<f64> = r.session.line().individual_powers.powers_kw().collect();
        assert_eq!(powers, vec![10.0; 4]);
    }

    #[test]
    fn report_flags_unsubmittable_configuration() {
        let s = script(vec![
            WizardEvent::SetConsumerCount { count: 2 },
            WizardEvent::ToggleIndividualMode { enabled: true },
            WizardEvent::SetEntryPower {
                index: 0,
                power_kw: 1.0,
            },
        ]);
        let report = replay(&s, &WizardConfig::standard()).report();
        assert!(!report.submittable);
        assert_eq!(report.individual_state, IndividualPowerState::EnabledDiverged);
        assert!(!report.errors.is_empty());
    }

    #[test]
    fn outcome_display_flattens_detail() {
        let record = OutcomeRecord {
            index: 2,
            op: "advance",
            status: OutcomeStatus::Blocked,
            detail: Some("poles: a\nvoltage: b".to_string()),
        };
        let shown = record.to_string();
        assert!(shown.contains("blocked"));
        assert!(shown.contains("poles: a; voltage: b"));
    }

    #[test]
    fn oversized_initial_count_allocates_no_entries() {
        let s = SessionScript::from_toml_str(
            "[line]\ntotalConsumers = 2000000\ntotalPower = 10.0\nshowIndividualPowers = true\n",
        );
        let s = s.ok().unwrap_or_default();
        let report = replay(&s, &WizardConfig::standard()).report();
        assert!(report.line.individual_powers.is_empty());
        assert_eq!(report.individual_state, IndividualPowerState::Disabled);
        assert!(report.errors.contains(crate::validate::Field::TotalConsumers));
        assert!(!report.submittable);
    }

    #[test]
    fn reset_event_returns_to_config_defaults() {
        let s = script(vec![
            WizardEvent::SetConsumerCount { count: 3 },
            WizardEvent::Advance,
            WizardEvent::Reset,
        ]);
        let mut config = WizardConfig::extended();
        config.defaults.total_consumers = 5;
        let r = replay(&s, &config);
        assert_eq!(r.session.line().total_consumers, 5);
        assert_eq!(r.session.step(), Step::Line);
        assert_eq!(r.outcomes[2].status, OutcomeStatus::Applied);
    }
}
