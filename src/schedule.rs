//! Annual schedules built from day patterns and prioritized calendar rules.

mod day;
pub mod library;
mod rule;
mod ruleset;
mod type_limit;
mod week;

pub use self::{
    day::{Breakpoint, DayPattern, MINUTES_PER_DAY},
    rule::Rule,
    ruleset::Ruleset,
    type_limit::{NumericType, TypeLimit, UnitType},
    week::{WeekGroup, WeekPeriod, WeeklySchedule, YearSchedule},
};
use crate::prelude::*;

const MAX_IDENTIFIER_LENGTH: usize = 100;

/// Absolute tolerance on the sum of averaging weights.
const WEIGHT_TOLERANCE: f64 = 1e-9;

/// Identifiers end up in the text export, where these characters are separators or comments.
pub(crate) fn validate_identifier(identifier: &str) -> Result {
    let reason = if identifier.trim().is_empty() {
        "must not be empty"
    } else if identifier.chars().count() > MAX_IDENTIFIER_LENGTH {
        "must be at most 100 characters long"
    } else if identifier.chars().any(|c| matches!(c, ',' | ';' | '!') || c.is_control()) {
        "must not contain commas, semicolons, exclamation marks or control characters"
    } else {
        return Ok(());
    };
    Err(ValidationError::Identifier { identifier: identifier.to_owned(), reason }.into())
}

/// Validate averaging weights, or make up equal ones.
pub(crate) fn averaging_weights(weights: Option<&[f64]>, n_items: usize) -> Result<Vec<f64>> {
    if n_items == 0 {
        return Err(ValidationError::NoSchedules.into());
    }
    let Some(weights) = weights else {
        #[expect(clippy::cast_precision_loss)]
        let weight = 1.0 / n_items as f64;
        return Ok(vec![weight; n_items]);
    };
    if weights.len() != n_items {
        return Err(ValidationError::WeightCount { expected: n_items, actual: weights.len() }.into());
    }
    if let Some(weight) = weights.iter().copied().find(|weight| !weight.is_finite()) {
        return Err(ValidationError::NonFinite { value: weight }.into());
    }
    if let Some(weight) = weights.iter().copied().find(|weight| *weight < 0.0) {
        return Err(ValidationError::NegativeWeight(weight).into());
    }
    let sum: f64 = weights.iter().sum();
    if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
        return Err(ValidationError::WeightSum(sum).into());
    }
    Ok(weights.to_vec())
}
