//! Composable attribute aggregation.
//!
//! A composable attribute folds an ordered list of contributions into one
//! value:
//!
//! ```text
//! value = (Σ RawAdditive) × (Π Multiplicative, 1 if none) + (Σ FinalAdditive)
//! ```
//!
//! The arena in [`graph`](crate::graph) keeps the element list and calls
//! [`aggregate`] whenever any contribution changes.

use crate::config::MultiplierPolicy;
use crate::element::ContributionKind;

/// One element's current value together with how it participates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Contribution {
    pub kind: ContributionKind,
    pub value: f64,
}

impl Contribution {
    pub const fn new(kind: ContributionKind, value: f64) -> Self {
        Self { kind, value }
    }
}

/// Fold contributions in insertion order.
///
/// # Example
/// ```
/// # use game_attributes::composable::{aggregate, Contribution};
/// # use game_attributes::{ContributionKind, MultiplierPolicy};
/// let elements = [
///     Contribution::new(ContributionKind::RawAdditive, 3000.0),
///     Contribution::new(ContributionKind::Multiplicative, 5.0),
///     Contribution::new(ContributionKind::FinalAdditive, 1000.0),
/// ];
/// assert_eq!(aggregate(&elements, MultiplierPolicy::Product), 16000.0);
/// ```
pub fn aggregate(contributions: &[Contribution], policy: MultiplierPolicy) -> f64 {
    // Step 1: Sum raw-additive contributions
    let raw_sum: f64 = contributions
        .iter()
        .filter(|c| c.kind == ContributionKind::RawAdditive)
        .map(|c| c.value)
        .sum();

    // Step 2: Combine multiplicative contributions
    let mut multipliers = contributions
        .iter()
        .filter(|c| c.kind == ContributionKind::Multiplicative)
        .map(|c| c.value);
    let multiplier = match policy {
        MultiplierPolicy::Product => multipliers.product(),
        MultiplierPolicy::LatestOnly => multipliers.last().unwrap_or(1.0),
    };

    // Step 3: Sum final-additive contributions
    let final_sum: f64 = contributions
        .iter()
        .filter(|c| c.kind == ContributionKind::FinalAdditive)
        .map(|c| c.value)
        .sum();

    raw_sum * multiplier + final_sum
}

#[cfg(test)]
mod tests {
    use super::*;
    use ContributionKind::*;

    fn c(kind: ContributionKind, value: f64) -> Contribution {
        Contribution::new(kind, value)
    }

    #[test]
    fn empty_is_zero() {
        assert_eq!(aggregate(&[], MultiplierPolicy::Product), 0.0);
    }

    #[test]
    fn only_multipliers_scale_nothing() {
        let elements = [c(Multiplicative, 4.0), c(Multiplicative, 2.0)];
        assert_eq!(aggregate(&elements, MultiplierPolicy::Product), 0.0);
    }

    #[test]
    fn full_stack_order() {
        let elements = [
            c(FinalAdditive, 1000.0),
            c(Multiplicative, 5.0),
            c(RawAdditive, 3000.0),
        ];
        assert_eq!(aggregate(&elements, MultiplierPolicy::Product), 16000.0);

        let without_multiplier = [c(FinalAdditive, 1000.0), c(RawAdditive, 3000.0)];
        assert_eq!(
            aggregate(&without_multiplier, MultiplierPolicy::Product),
            4000.0
        );
    }

    #[test]
    fn order_within_kind_does_not_matter() {
        let forward = [
            c(RawAdditive, 10.0),
            c(RawAdditive, 20.0),
            c(Multiplicative, 2.0),
            c(Multiplicative, 3.0),
            c(FinalAdditive, 1.0),
        ];
        let mut reversed = forward;
        reversed.reverse();
        assert_eq!(
            aggregate(&forward, MultiplierPolicy::Product),
            aggregate(&reversed, MultiplierPolicy::Product)
        );
        assert_eq!(aggregate(&forward, MultiplierPolicy::Product), 181.0);
    }

    #[test]
    fn latest_only_uses_last_multiplier() {
        let elements = [
            c(RawAdditive, 10.0),
            c(Multiplicative, 2.0),
            c(Multiplicative, 3.0),
        ];
        assert_eq!(aggregate(&elements, MultiplierPolicy::LatestOnly), 30.0);
        assert_eq!(aggregate(&elements, MultiplierPolicy::Product), 60.0);
    }
}
