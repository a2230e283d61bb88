use chrono::{NaiveTime, TimeDelta, Timelike};
use itertools::Itertools;

use crate::{
    calendar::Timestep,
    prelude::*,
    schedule::{TypeLimit, averaging_weights, validate_identifier},
};

pub const MINUTES_PER_DAY: u32 = 24 * 60;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Breakpoint {
    /// Time of day from which the value applies.
    pub time: NaiveTime,

    pub value: f64,
}

impl Breakpoint {
    pub const fn new(time: NaiveTime, value: f64) -> Self {
        Self { time, value }
    }

    pub fn at(hour: u32, minute: u32, value: f64) -> Result<Self> {
        let time =
            NaiveTime::from_hms_opt(hour, minute, 0).ok_or(ValidationError::Time { hour, minute })?;
        Ok(Self { time, value })
    }

    pub fn minute_of_day(&self) -> u32 {
        self.time.num_seconds_from_midnight() / 60
    }
}

pub(crate) fn time_of_minute(minute: u32) -> NaiveTime {
    NaiveTime::MIN + TimeDelta::minutes(i64::from(minute))
}

/// Shape of a single day: values that hold from their breakpoint until the next one.
///
/// With `interpolate` on, each timestep reads the linear ramp at the end of the step instead:
/// the value of a breakpoint is fully reached at the following breakpoint (or midnight).
#[derive(Clone, Debug)]
#[must_use]
pub struct DayPattern {
    identifier: String,
    display_name: Option<String>,
    breakpoints: Vec<Breakpoint>,
    interpolate: bool,

    /// Identifier of the ruleset this pattern is attached to.
    owner: Option<String>,
}

/// Ownership is bookkeeping, not content.
impl PartialEq for DayPattern {
    fn eq(&self, other: &Self) -> bool {
        self.identifier == other.identifier
            && self.display_name == other.display_name
            && self.interpolate == other.interpolate
            && self.breakpoints == other.breakpoints
    }
}

impl DayPattern {
    pub fn new(
        identifier: impl Into<String>,
        breakpoints: Vec<Breakpoint>,
        interpolate: bool,
    ) -> Result<Self> {
        let identifier = identifier.into();
        validate_identifier(&identifier)?;
        validate_breakpoints(&identifier, &breakpoints)?;
        Ok(Self { identifier, display_name: None, breakpoints, interpolate, owner: None })
    }

    pub fn constant(identifier: impl Into<String>, value: f64) -> Result<Self> {
        Self::new(identifier, vec![Breakpoint::new(NaiveTime::MIN, value)], false)
    }

    /// Build a pattern from evenly spaced values, the inverse of [`DayPattern::values_at_timestep`].
    ///
    /// With `remove_repeated`, a breakpoint is only placed where the value changes.
    #[expect(clippy::float_cmp)]
    pub fn from_values_at_timestep(
        identifier: impl Into<String>,
        values: &[f64],
        timestep: Timestep,
        remove_repeated: bool,
    ) -> Result<Self> {
        if values.len() != timestep.steps_per_day() {
            return Err(ValidationError::ValueCount {
                expected: timestep.steps_per_day(),
                actual: values.len(),
            }
            .into());
        }
        let mut breakpoints: Vec<Breakpoint> = Vec::new();
        let minutes = (0..MINUTES_PER_DAY).step_by(timestep.minutes() as usize);
        for (minute, value) in minutes.zip(values.iter().copied()) {
            if remove_repeated && breakpoints.last().is_some_and(|last| last.value == value) {
                continue;
            }
            breakpoints.push(Breakpoint::new(time_of_minute(minute), value));
        }
        Self::new(identifier, breakpoints, false)
    }

    /// Weighted average of the patterns sampled at the timestep.
    pub fn average(
        identifier: impl Into<String>,
        patterns: &[&Self],
        weights: Option<&[f64]>,
        timestep: Timestep,
    ) -> Result<Self> {
        let weights = averaging_weights(weights, patterns.len())?;
        let values = weighted_values(patterns.iter().copied().zip(weights), timestep);
        Self::from_values_at_timestep(identifier, &values, timestep, true)
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.identifier)
    }

    pub(crate) fn explicit_display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    pub fn set_display_name(&mut self, display_name: Option<String>) {
        self.display_name = display_name;
    }

    pub fn rename(&mut self, identifier: impl Into<String>) -> Result {
        let identifier = identifier.into();
        validate_identifier(&identifier)?;
        self.identifier = identifier;
        Ok(())
    }

    pub fn breakpoints(&self) -> &[Breakpoint] {
        &self.breakpoints
    }

    pub const fn interpolate(&self) -> bool {
        self.interpolate
    }

    pub const fn set_interpolate(&mut self, interpolate: bool) {
        self.interpolate = interpolate;
    }

    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    pub(crate) fn set_owner(&mut self, owner: Option<String>) {
        self.owner = owner;
    }

    /// Detached copy, free to be attached to any ruleset.
    pub fn duplicate(&self) -> Self {
        Self { owner: None, ..self.clone() }
    }

    pub fn is_constant(&self) -> bool {
        self.breakpoints.len() == 1
    }

    /// Same values and read semantics, regardless of naming.
    pub fn has_same_shape(&self, other: &Self) -> bool {
        self.interpolate == other.interpolate && self.breakpoints == other.breakpoints
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.breakpoints.iter().map(|breakpoint| breakpoint.value)
    }

    /// Values of the day, `24 * steps_per_hour` of them.
    pub fn values_at_timestep(&self, timestep: Timestep) -> Vec<f64> {
        let step = timestep.minutes();
        let n_steps = 24 * timestep.steps_per_hour();
        if self.interpolate {
            (1..=n_steps).map(|index| self.ramp_at(index * step)).collect()
        } else {
            let mut breakpoints = self.breakpoints.iter().peekable();
            let mut value = self.breakpoints[0].value;
            (0..n_steps)
                .map(|index| {
                    let minute = index * step;
                    while let Some(breakpoint) =
                        breakpoints.next_if(|breakpoint| breakpoint.minute_of_day() <= minute)
                    {
                        value = breakpoint.value;
                    }
                    value
                })
                .collect()
        }
    }

    /// Interpolated value at the minute of day, `0 < minute <= 1440`.
    fn ramp_at(&self, minute: u32) -> f64 {
        let untils = self
            .breakpoints
            .iter()
            .skip(1)
            .map(Breakpoint::minute_of_day)
            .chain([MINUTES_PER_DAY])
            .collect_vec();
        if minute <= untils[0] {
            return self.breakpoints[0].value;
        }
        let segment = untils.partition_point(|until| *until < minute);
        let (from, to) = (untils[segment - 1], untils[segment]);
        let (start, end) = (self.breakpoints[segment - 1].value, self.breakpoints[segment].value);
        start + (end - start) * f64::from(minute - from) / f64::from(to - from)
    }

    /// Mean of the values sampled at the timestep.
    pub fn mean_at_timestep(&self, timestep: Timestep) -> f64 {
        let values = self.values_at_timestep(timestep);
        #[expect(clippy::cast_precision_loss)]
        let n_values = values.len() as f64;
        values.iter().sum::<f64>() / n_values
    }

    /// Insert a value that takes effect at the given time.
    pub fn add_value(&mut self, time: NaiveTime, value: f64) -> Result {
        validate_breakpoint(&Breakpoint::new(time, value))?;
        match self.breakpoints.binary_search_by_key(&time, |breakpoint| breakpoint.time) {
            Ok(_) => Err(ValidationError::BreakpointOrder {
                identifier: self.identifier.clone(),
                time: time.format("%H:%M").to_string(),
            }
            .into()),
            Err(index) => {
                self.breakpoints.insert(index, Breakpoint::new(time, value));
                Ok(())
            }
        }
    }

    /// Remove a breakpoint, the one at midnight stays.
    pub fn remove_value(&mut self, index: usize) -> Result<Breakpoint> {
        if self.breakpoints.len() == 1 {
            return Err(ValidationError::LastBreakpoint(self.identifier.clone()).into());
        }
        if index == 0 {
            return Err(ValidationError::FirstBreakpoint(self.identifier.clone()).into());
        }
        if index >= self.breakpoints.len() {
            return Err(
                ValidationError::BreakpointIndex { index, len: self.breakpoints.len() }.into()
            );
        }
        Ok(self.breakpoints.remove(index))
    }

    pub fn remove_value_by_time(&mut self, time: NaiveTime) -> Result<Breakpoint> {
        let index = self.index_of(time)?;
        self.remove_value(index)
    }

    pub fn replace_value(&mut self, index: usize, value: f64) -> Result {
        validate_value(value)?;
        let len = self.breakpoints.len();
        let breakpoint =
            self.breakpoints.get_mut(index).ok_or(ValidationError::BreakpointIndex { index, len })?;
        breakpoint.value = value;
        Ok(())
    }

    pub fn replace_value_by_time(&mut self, time: NaiveTime, value: f64) -> Result {
        let index = self.index_of(time)?;
        self.replace_value(index, value)
    }

    /// Merge consecutive breakpoints with equal values.
    ///
    /// Interpolated patterns are left alone since repeated values there shape the ramps.
    #[expect(clippy::float_cmp)]
    pub fn remove_redundant_values(&mut self) {
        if !self.interpolate {
            self.breakpoints.dedup_by(|next, previous| next.value == previous.value);
        }
    }

    /// Copy with the values rotated by whole timesteps, positive counts move them later in the day.
    pub fn shift_by_step(&self, step_count: i32, timestep: Timestep) -> Result<Self> {
        let mut values = self.values_at_timestep(timestep);
        let n_values = i64::try_from(values.len()).unwrap_or(i64::MAX);
        let shift = usize::try_from(i64::from(step_count).rem_euclid(n_values)).unwrap_or_default();
        values.rotate_right(shift);
        let shift_minutes = i64::from(timestep.minutes()) * i64::from(step_count);
        let identifier = format!("{}_Shift_{shift_minutes}mins", self.identifier);
        Self::from_values_at_timestep(identifier, &values, timestep, true)
    }

    /// Check every value against the type limit.
    pub fn validate_values(&self, type_limit: &TypeLimit) -> Result {
        self.values().try_for_each(|value| type_limit.validate(value))
    }

    fn index_of(&self, time: NaiveTime) -> Result<usize> {
        self.breakpoints.binary_search_by_key(&time, |breakpoint| breakpoint.time).map_err(|index| {
            ValidationError::BreakpointIndex { index, len: self.breakpoints.len() }.into()
        })
    }
}

/// Element-wise weighted sum of the patterns sampled at the timestep.
pub(crate) fn weighted_values<'a>(
    weighted_patterns: impl IntoIterator<Item = (&'a DayPattern, f64)>,
    timestep: Timestep,
) -> Vec<f64> {
    let mut sum = vec![0.0; timestep.steps_per_day()];
    for (pattern, weight) in weighted_patterns {
        for (total, value) in sum.iter_mut().zip(pattern.values_at_timestep(timestep)) {
            *total += weight * value;
        }
    }
    sum
}

fn validate_value(value: f64) -> Result {
    if value.is_finite() { Ok(()) } else { Err(ValidationError::NonFinite { value }.into()) }
}

fn validate_breakpoint(breakpoint: &Breakpoint) -> Result {
    if breakpoint.time.second() != 0 || breakpoint.time.nanosecond() != 0 {
        return Err(
            ValidationError::BreakpointPrecision(breakpoint.time.format("%H:%M:%S%.f").to_string())
                .into(),
        );
    }
    validate_value(breakpoint.value)
}

fn validate_breakpoints(identifier: &str, breakpoints: &[Breakpoint]) -> Result {
    let Some(first) = breakpoints.first() else {
        return Err(ValidationError::EmptyDayPattern(identifier.to_owned()).into());
    };
    if first.time != NaiveTime::MIN {
        return Err(ValidationError::FirstBreakpoint(identifier.to_owned()).into());
    }
    breakpoints.iter().try_for_each(validate_breakpoint)?;
    if let Some((_, out_of_order)) =
        breakpoints.iter().tuple_windows().find(|(previous, next)| next.time <= previous.time)
    {
        return Err(ValidationError::BreakpointOrder {
            identifier: identifier.to_owned(),
            time: out_of_order.time.format("%H:%M").to_string(),
        }
        .into());
    }
    Ok(())
}
