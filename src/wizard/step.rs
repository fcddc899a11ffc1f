use serde::Serialize;
use strum::{Display, EnumIter};

use crate::validate::Field;

/// Wizard page, in presentation order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Display, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Step {
    /// Length, conductor count and voltage.
    Line,
    /// Power feed type.
    Power,
    /// Consumer count, total power and individual powers.
    Consumers,
    /// Read-only summary of everything.
    Review,
}

impl Step {
    /// The step a new session opens on.
    pub const FIRST: Self = Self::Line;

    /// The following step, if any.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Line => Some(Self::Power),
            Self::Power => Some(Self::Consumers),
            Self::Consumers => Some(Self::Review),
            Self::Review => None,
        }
    }

    /// The preceding step, if any.
    pub fn prev(self) -> Option<Self> {
        match self {
            Self::Line => None,
            Self::Power => Some(Self::Line),
            Self::Consumers => Some(Self::Power),
            Self::Review => Some(Self::Consumers),
        }
    }

    /// Returns `true` if errors on `field` block leaving this step.
    pub fn owns(self, field: Field) -> bool {
        match self {
            Self::Line => matches!(field, Field::Length | Field::Poles | Field::Voltage),
            Self::Power => field == Field::PowerType,
            Self::Consumers => matches!(
                field,
                Field::TotalConsumers
                    | Field::TotalPower
                    | Field::IndividualPowers
                    | Field::IndividualPower(_)
            ),
            Self::Review => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn next_and_prev_walk_declaration_order() {
        let steps: Vec<Step> = Step::iter().collect();
        for pair in steps.windows(2) {
            assert_eq!(pair[0].next(), Some(pair[1]));
            assert_eq!(pair[1].prev(), Some(pair[0]));
        }
        assert_eq!(Step::FIRST.prev(), None);
        assert_eq!(Step::Review.next(), None);
    }

    #[test]
    fn every_field_is_owned_by_one_data_step() {
        let fields = [
            Field::Length,
            Field::Poles,
            Field::Voltage,
            Field::PowerType,
            Field::TotalConsumers,
            Field::TotalPower,
            Field::IndividualPowers,
            Field::IndividualPower(7),
        ];
        for field in fields {
            let owners = [Step::Line, Step::Power, Step::Consumers]
                .into_iter()
                .filter(|s| s.owns(field))
                .count();
            assert_eq!(owners, 1, "{field} should belong to exactly one step");
            assert!(Step::Review.owns(field));
        }
    }
}
