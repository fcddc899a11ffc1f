//! Schema validation for line configurations.
//!
//! [`validate`] is a pure function over a typed [`LineConfiguration`];
//! [`validate_candidate`] additionally covers raw form input whose numbers
//! may not be whole and whose power type may not be a known variant.
//! Neither ever fails: every problem becomes an entry in the returned
//! [`ErrorSet`], keyed by the field it should be shown next to.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::ser::SerializeSeq;
use serde::{Deserialize, Serialize};
use strum::Display;
use thiserror::Error;

use crate::config::{Bounds, LineLimits};
use crate::line::reconciler::powers_converge;
use crate::line::{ConsumerSet, LineConfiguration, PowerRecord, PowerType};

/// Form field an error is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    /// Line length.
    Length,
    /// Conductor count.
    Poles,
    /// Line voltage.
    Voltage,
    /// Power feed type.
    PowerType,
    /// Consumer count.
    TotalConsumers,
    /// Total power.
    TotalPower,
    /// The per-consumer list as a whole.
    IndividualPowers,
    /// One per-consumer entry.
    IndividualPower(usize),
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Length => f.write_str("length"),
            Self::Poles => f.write_str("poles"),
            Self::Voltage => f.write_str("voltage"),
            Self::PowerType => f.write_str("powerType"),
            Self::TotalConsumers => f.write_str("totalConsumers"),
            Self::TotalPower => f.write_str("totalPower"),
            Self::IndividualPowers => f.write_str("individualPowers"),
            Self::IndividualPower(i) => write!(f, "individualPowers[{i}]"),
        }
    }
}

/// Error taxonomy used for presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// Value outside its bounds or of the wrong shape.
    FieldRange,
    /// Two fields disagree with each other.
    CrossFieldConflict,
    /// Individual powers do not add up to the total.
    PowerSumMismatch,
}

/// One validation problem.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FieldError {
    /// Value is NaN or infinite.
    #[error("must be a finite number")]
    NotFinite,
    /// Integer field received a fractional value.
    #[error("must be a whole number (got {value})")]
    NotInteger {
        /// Rejected value.
        value: f64,
    },
    /// Value is below the inclusive minimum.
    #[error("must be at least {min} (got {value})")]
    BelowMinimum {
        /// Rejected value.
        value: f64,
        /// Smallest accepted value.
        min: f64,
    },
    /// Value is above the inclusive maximum.
    #[error("must be at most {max} (got {value})")]
    AboveMaximum {
        /// Rejected value.
        value: f64,
        /// Largest accepted value.
        max: f64,
    },
    /// Value must be strictly positive.
    #[error("must be greater than 0 (got {value})")]
    NotPositive {
        /// Rejected value.
        value: f64,
    },
    /// String is not one of the enum's variants.
    #[error("must be one of {expected} (got \"{value}\")")]
    UnknownVariant {
        /// Rejected input.
        value: String,
        /// Accepted names.
        expected: &'static str,
    },
    /// Long line not fed linearly.
    #[error("must be linear for lines longer than {threshold_m} m (length is {length_m} m)")]
    LinearRequired {
        /// Line length (m).
        length_m: u32,
        /// Forcing threshold (m).
        threshold_m: u32,
    },
    /// Individual powers do not add up to the total.
    #[error(
        "individual powers sum to {sum_kw:.2} kW but total power is {total_kw:.2} kW (tolerance {tolerance_kw} kW)"
    )]
    PowerSumMismatch {
        /// Sum of the entries (kW).
        sum_kw: f64,
        /// Declared total (kW).
        total_kw: f64,
        /// Allowed gap (kW).
        tolerance_kw: f64,
    },
    /// Entry list length disagrees with the consumer count or the mode flag.
    #[error("expected {expected} entries, found {entries}")]
    EntryCountMismatch {
        /// Entries present.
        entries: usize,
        /// Entries expected.
        expected: usize,
    },
}

impl FieldError {
    /// Taxonomy bucket of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::LinearRequired { .. } | Self::EntryCountMismatch { .. } => {
                ErrorKind::CrossFieldConflict
            }
            Self::PowerSumMismatch { .. } => ErrorKind::PowerSumMismatch,
            _ => ErrorKind::FieldRange,
        }
    }
}

/// Validation result: errors grouped by field, in field order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorSet {
    errors: BTreeMap<Field, Vec<FieldError>>,
}

impl ErrorSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches `error` to `field`.
    pub fn push(&mut self, field: Field, error: FieldError) {
        self.errors.entry(field).or_default().push(error);
    }

    /// Returns `true` when there is nothing to report.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Total number of errors across all fields.
    pub fn len(&self) -> usize {
        self.errors.values().map(Vec::len).sum()
    }

    /// Errors attached to `field`.
    pub fn get(&self, field: Field) -> &[FieldError] {
        self.errors
            .get(&field)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Returns `true` if `field` has at least one error.
    pub fn contains(&self, field: Field) -> bool {
        self.errors.contains_key(&field)
    }

    /// Returns `true` if any error falls into `kind`.
    pub fn has_kind(&self, kind: ErrorKind) -> bool {
        self.iter().any(|(_, e)| e.kind() == kind)
    }

    /// Iterates `(field, error)` pairs in field order.
    pub fn iter(&self) -> impl Iterator<Item = (Field, &FieldError)> {
        self.errors
            .iter()
            .flat_map(|(field, errors)| errors.iter().map(move |e| (*field, e)))
    }

    /// Keeps only the errors whose field satisfies `keep`.
    pub fn filtered(&self, keep: impl Fn(Field) -> bool) -> Self {
        Self {
            errors: self
                .errors
                .iter()
                .filter(|(field, _)| keep(**field))
                .map(|(field, errors)| (*field, errors.clone()))
                .collect(),
        }
    }
}

impl fmt::Display for ErrorSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (field, error)) in self.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{field}: {error}")?;
        }
        Ok(())
    }
}

/// Wire form of one error.
#[derive(Debug, Serialize)]
struct ErrorRecord {
    field: String,
    kind: ErrorKind,
    message: String,
}

impl Serialize for ErrorSet {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for (field, error) in self.iter() {
            seq.serialize_element(&ErrorRecord {
                field: field.to_string(),
                kind: error.kind(),
                message: error.to_string(),
            })?;
        }
        seq.end()
    }
}

fn check_bounds(errors: &mut ErrorSet, field: Field, value: u32, bounds: Bounds) {
    if value < bounds.min {
        errors.push(
            field,
            FieldError::BelowMinimum {
                value: f64::from(value),
                min: f64::from(bounds.min),
            },
        );
    } else if value > bounds.max {
        errors.push(
            field,
            FieldError::AboveMaximum {
                value: f64::from(value),
                max: f64::from(bounds.max),
            },
        );
    }
}

/// Checks a power value against the half-open range `(0, max_kw]`.
fn check_power(errors: &mut ErrorSet, field: Field, value: f64, max_kw: f64) {
    if !value.is_finite() {
        errors.push(field, FieldError::NotFinite);
    } else if value <= 0.0 {
        errors.push(field, FieldError::NotPositive { value });
    } else if value > max_kw {
        errors.push(field, FieldError::AboveMaximum { value, max: max_kw });
    }
}

/// Validates a configuration against `limits`.
///
/// Checks ranges, the length/power-type rule, entry count consistency and
/// power-sum convergence. Never panics and never short-circuits.
pub fn validate(line: &LineConfiguration, limits: &LineLimits) -> ErrorSet {
    let mut errors = ErrorSet::new();

    check_bounds(&mut errors, Field::Length, line.length_m, limits.length_m);
    check_bounds(&mut errors, Field::Poles, line.poles, limits.poles);
    check_bounds(&mut errors, Field::Voltage, line.voltage_v, limits.voltage_v);
    check_bounds(
        &mut errors,
        Field::TotalConsumers,
        line.total_consumers,
        limits.consumers,
    );
    check_power(
        &mut errors,
        Field::TotalPower,
        line.total_power_kw,
        limits.max_total_power_kw,
    );

    if line.requires_linear(limits.linear_threshold_m) && line.power_type != PowerType::Linear {
        errors.push(
            Field::PowerType,
            FieldError::LinearRequired {
                length_m: line.length_m,
                threshold_m: limits.linear_threshold_m,
            },
        );
    }

    let entries = &line.individual_powers;
    if line.show_individual_powers {
        if entries.len() != line.total_consumers as usize {
            errors.push(
                Field::IndividualPowers,
                FieldError::EntryCountMismatch {
                    entries: entries.len(),
                    expected: line.total_consumers as usize,
                },
            );
        }
        for (i, power) in entries.powers_kw().enumerate() {
            check_power(
                &mut errors,
                Field::IndividualPower(i),
                power,
                limits.max_individual_power_kw,
            );
        }
        if !entries.is_empty()
            && !powers_converge(entries, line.total_power_kw, limits.convergence_tolerance_kw)
        {
            errors.push(
                Field::TotalPower,
                FieldError::PowerSumMismatch {
                    sum_kw: entries.sum_kw(),
                    total_kw: line.total_power_kw,
                    tolerance_kw: limits.convergence_tolerance_kw,
                },
            );
        }
    } else if !entries.is_empty() {
        errors.push(
            Field::IndividualPowers,
            FieldError::EntryCountMismatch {
                entries: entries.len(),
                expected: 0,
            },
        );
    }

    errors
}

/// Untyped form input, as a presentation layer would post it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineCandidate {
    /// Line length (m).
    pub length: f64,
    /// Conductor count.
    pub poles: f64,
    /// Line voltage (V).
    pub voltage: f64,
    /// Power feed type name.
    pub power_type: String,
    /// Consumer count.
    pub total_consumers: f64,
    /// Total power (kW).
    pub total_power: f64,
    /// Whether per-consumer powers are specified.
    #[serde(default)]
    pub show_individual_powers: bool,
    /// Per-consumer powers.
    #[serde(default)]
    pub individual_powers: Vec<PowerRecord>,
}

fn whole_number(errors: &mut ErrorSet, field: Field, value: f64) -> Option<u32> {
    if !value.is_finite() {
        errors.push(field, FieldError::NotFinite);
        None
    } else if value.fract() != 0.0 {
        errors.push(field, FieldError::NotInteger { value });
        None
    } else if value < 0.0 {
        errors.push(field, FieldError::NotPositive { value });
        None
    } else if value > f64::from(u32::MAX) {
        errors.push(
            field,
            FieldError::AboveMaximum {
                value,
                max: f64::from(u32::MAX),
            },
        );
        None
    } else {
        Some(value as u32)
    }
}

impl LineCandidate {
    /// Converts to a typed configuration.
    ///
    /// # Errors
    ///
    /// Returns the shape errors (non-integers, negatives, unknown power
    /// type) when any field cannot be represented.
    pub fn to_configuration(&self) -> Result<LineConfiguration, ErrorSet> {
        let mut errors = ErrorSet::new();
        let length_m = whole_number(&mut errors, Field::Length, self.length);
        let poles = whole_number(&mut errors, Field::Poles, self.poles);
        let voltage_v = whole_number(&mut errors, Field::Voltage, self.voltage);
        let total_consumers = whole_number(&mut errors, Field::TotalConsumers, self.total_consumers);
        let power_type = PowerType::from_str(&self.power_type).ok();
        if power_type.is_none() {
            errors.push(
                Field::PowerType,
                FieldError::UnknownVariant {
                    value: self.power_type.clone(),
                    expected: "end, linear",
                },
            );
        }

        match (length_m, poles, voltage_v, total_consumers, power_type) {
            (Some(length_m), Some(poles), Some(voltage_v), Some(total_consumers), Some(power_type))
                if errors.is_empty() =>
            {
                Ok(LineConfiguration {
                    length_m,
                    poles,
                    voltage_v,
                    power_type,
                    total_consumers,
                    total_power_kw: self.total_power,
                    show_individual_powers: self.show_individual_powers,
                    individual_powers: ConsumerSet::from(self.individual_powers.clone()),
                })
            }
            _ => Err(errors),
        }
    }
}

impl From<&LineConfiguration> for LineCandidate {
    fn from(line: &LineConfiguration) -> Self {
        Self {
            length: f64::from(line.length_m),
            poles: f64::from(line.poles),
            voltage: f64::from(line.voltage_v),
            power_type: line.power_type.to_string(),
            total_consumers: f64::from(line.total_consumers),
            total_power: line.total_power_kw,
            show_individual_powers: line.show_individual_powers,
            individual_powers: Vec::from(&line.individual_powers),
        }
    }
}

/// Validates raw form input: shape errors first, then the full rule set.
///
/// When any field has the wrong shape only the shape errors are reported,
/// so the user fixes types before ranges.
pub fn validate_candidate(candidate: &LineCandidate, limits: &LineLimits) -> ErrorSet {
    match candidate.to_configuration() {
        Ok(line) => validate(&line, limits),
        Err(errors) => errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_line() -> LineConfiguration {
        LineConfiguration {
            length_m: 100,
            poles: 4,
            voltage_v: 400,
            power_type: PowerType::End,
            total_consumers: 3,
            total_power_kw: 30.0,
            show_individual_powers: false,
            individual_powers: ConsumerSet::new(),
        }
    }

    fn individual(line: &mut LineConfiguration, powers: &[f64]) {
        line.show_individual_powers = true;
        line.individual_powers = ConsumerSet::new();
        for &p in powers {
            line.individual_powers.push(p);
        }
    }

    #[test]
    fn valid_configuration_has_no_errors() {
        let errors = validate(&valid_line(), &LineLimits::standard());
        assert!(errors.is_empty(), "unexpected errors: {errors}");
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let limits = LineLimits::standard();
        let mut line = valid_line();
        line.poles = 12;
        line.voltage_v = 24;
        line.total_consumers = 20;
        line.total_power_kw = 20_000.0;
        assert!(validate(&line, &limits).is_empty());

        line.poles = 13;
        line.voltage_v = 23;
        line.total_consumers = 0;
        line.total_power_kw = 20_000.5;
        let errors = validate(&line, &limits);
        assert!(matches!(errors.get(Field::Poles), [FieldError::AboveMaximum { .. }]));
        assert!(matches!(errors.get(Field::Voltage), [FieldError::BelowMinimum { .. }]));
        assert!(errors.contains(Field::TotalConsumers));
        assert!(errors.contains(Field::TotalPower));
        assert!(!errors.contains(Field::Length));
    }

    #[test]
    fn length_bounds_follow_policy() {
        let mut line = valid_line();
        line.length_m = 2;
        line.power_type = PowerType::Linear;
        assert!(validate(&line, &LineLimits::standard()).is_empty());
        assert!(validate(&line, &LineLimits::extended()).contains(Field::Length));

        line.length_m = 1000;
        assert!(validate(&line, &LineLimits::standard()).contains(Field::Length));
        assert!(validate(&line, &LineLimits::extended()).is_empty());
    }

    #[test]
    fn zero_total_power_is_not_positive() {
        let mut line = valid_line();
        line.total_power_kw = 0.0;
        let errors = validate(&line, &LineLimits::standard());
        assert!(matches!(errors.get(Field::TotalPower), [FieldError::NotPositive { .. }]));
    }

    #[test]
    fn long_line_fed_from_end_is_a_conflict_on_power_type() {
        let mut line = valid_line();
        line.length_m = 200;
        let errors = validate(&line, &LineLimits::standard());
        assert!(matches!(
            errors.get(Field::PowerType),
            [FieldError::LinearRequired { length_m: 200, threshold_m: 150 }]
        ));
        assert!(errors.has_kind(ErrorKind::CrossFieldConflict));
    }

    #[test]
    fn divergent_powers_are_reported_on_total_power() {
        let mut line = valid_line();
        individual(&mut line, &[5.0, 10.0, 10.0]);
        let errors = validate(&line, &LineLimits::standard());
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            errors.get(Field::TotalPower),
            [FieldError::PowerSumMismatch { .. }]
        ));
        assert!(errors.has_kind(ErrorKind::PowerSumMismatch));
    }

    #[test]
    fn sum_within_tolerance_is_accepted() {
        let mut line = valid_line();
        individual(&mut line, &[10.05, 10.0, 10.0]);
        assert!(validate(&line, &LineLimits::standard()).is_empty());
    }

    #[test]
    fn individual_power_bounds() {
        let mut line = valid_line();
        line.total_power_kw = 1200.0;
        individual(&mut line, &[0.0, 1001.0, 199.0]);
        let errors = validate(&line, &LineLimits::standard());
        assert!(matches!(
            errors.get(Field::IndividualPower(0)),
            [FieldError::NotPositive { .. }]
        ));
        assert!(matches!(
            errors.get(Field::IndividualPower(1)),
            [FieldError::AboveMaximum { .. }]
        ));
        assert!(!errors.contains(Field::IndividualPower(2)));
        assert!(!errors.contains(Field::TotalPower));
    }

    #[test]
    fn entry_count_must_match_consumers() {
        let mut line = valid_line();
        individual(&mut line, &[15.0, 15.0]);
        let errors = validate(&line, &LineLimits::standard());
        assert!(matches!(
            errors.get(Field::IndividualPowers),
            [FieldError::EntryCountMismatch { entries: 2, expected: 3 }]
        ));

        line.show_individual_powers = false;
        let errors = validate(&line, &LineLimits::standard());
        assert!(matches!(
            errors.get(Field::IndividualPowers),
            [FieldError::EntryCountMismatch { entries: 2, expected: 0 }]
        ));
    }

    #[test]
    fn candidate_reports_shape_errors() {
        let mut candidate = LineCandidate::from(&valid_line());
        candidate.length = 12.5;
        candidate.poles = -1.0;
        candidate.power_type = "radial".to_string();
        let errors = validate_candidate(&candidate, &LineLimits::standard());
        assert!(matches!(errors.get(Field::Length), [FieldError::NotInteger { .. }]));
        assert!(matches!(errors.get(Field::Poles), [FieldError::NotPositive { .. }]));
        assert!(matches!(
            errors.get(Field::PowerType),
            [FieldError::UnknownVariant { .. }]
        ));
    }

    #[test]
    fn well_formed_candidate_gets_full_rule_set() {
        let mut candidate = LineCandidate::from(&valid_line());
        candidate.voltage = 5000.0;
        let errors = validate_candidate(&candidate, &LineLimits::standard());
        assert!(matches!(errors.get(Field::Voltage), [FieldError::AboveMaximum { .. }]));
    }

    #[test]
    fn filtered_keeps_selected_fields() {
        let mut line = valid_line();
        line.poles = 0;
        line.total_power_kw = 0.0;
        let errors = validate(&line, &LineLimits::standard());
        let subset = errors.filtered(|f| f == Field::Poles);
        assert_eq!(subset.len(), 1);
        assert!(subset.contains(Field::Poles));
    }

    #[test]
    fn serializes_as_field_kind_message_records() {
        let mut errors = ErrorSet::new();
        errors.push(Field::IndividualPower(2), FieldError::NotPositive { value: 0.0 });
        let json = serde_json::to_value(&errors).ok();
        let first = json.as_ref().and_then(|v| v.get(0));
        assert_eq!(
            first.and_then(|v| v.get("field")).and_then(|v| v.as_str()),
            Some("individualPowers[2]")
        );
        assert_eq!(
            first.and_then(|v| v.get("kind")).and_then(|v| v.as_str()),
            Some("field_range")
        );
    }

    #[test]
    fn display_lists_field_and_message() {
        let mut errors = ErrorSet::new();
        errors.push(Field::Poles, FieldError::AboveMaximum { value: 13.0, max: 12.0 });
        assert_eq!(errors.to_string(), "poles: must be at most 12 (got 13)");
    }
}
