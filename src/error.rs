use thiserror::Error;

use crate::calendar::MonthDay;

pub type Result<T = (), E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error, PartialEq)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Conflict(#[from] ConflictError),

    #[error(transparent)]
    Lookup(#[from] LookupError),
}

/// Malformed input rejected at construction or mutation.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("invalid identifier `{identifier}`: {reason}")]
    Identifier { identifier: String, reason: &'static str },

    #[error("{0} steps per hour is not supported, use one of 1, 2, 3, 4, 5, 6, 10, 12, 15, 20, 30, 60")]
    Timestep(u32),

    #[error("day pattern `{0}` has no breakpoints")]
    EmptyDayPattern(String),

    #[error("day pattern `{0}` must start at 00:00")]
    FirstBreakpoint(String),

    #[error("day pattern `{identifier}` has a breakpoint at {time} out of order")]
    BreakpointOrder { identifier: String, time: String },

    #[error("{hour}:{minute:02} is not a valid time of day")]
    Time { hour: u32, minute: u32 },

    #[error("breakpoint {0} is not on a whole minute")]
    BreakpointPrecision(String),

    #[error("breakpoint index {index} is out of bounds for {len} breakpoints")]
    BreakpointIndex { index: usize, len: usize },

    #[error("day pattern `{0}` cannot lose its only breakpoint")]
    LastBreakpoint(String),

    #[error("expected {expected} values, got {actual}")]
    ValueCount { expected: usize, actual: usize },

    #[error("value {value} is not finite")]
    NonFinite { value: f64 },

    #[error("value {value} is outside the limits of `{type_limit}`")]
    OutOfLimits { value: f64, type_limit: String },

    #[error("value {value} is not an integer as required by `{type_limit}`")]
    NotInteger { value: f64, type_limit: String },

    #[error("lower limit {lower} is above upper limit {upper}")]
    LimitOrder { lower: f64, upper: f64 },

    #[error("{month}/{day} is not a valid date")]
    Date { month: u32, day: u32 },

    #[error("day {0} is outside of the year")]
    DayOfYear(u16),

    #[error("rule boundaries are common-year dates, {0} is not one")]
    LeapDayBoundary(MonthDay),

    #[error("{start} comes after {end}")]
    DateOrder { start: MonthDay, end: MonthDay },

    #[error("unknown weekday `{0}`")]
    Weekday(String),

    #[error("rule index {index} is out of bounds for {len} rules")]
    RuleIndex { index: usize, len: usize },

    #[error("at least one schedule is required")]
    NoSchedules,

    #[error("expected {expected} weights, got {actual}")]
    WeightCount { expected: usize, actual: usize },

    #[error("weight {0} is negative")]
    NegativeWeight(f64),

    #[error("weights sum up to {0} instead of 1")]
    WeightSum(f64),

    #[error("malformed `{record}` record: {message}")]
    Syntax { record: String, message: String },
}

/// Ownership or freeze violations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConflictError {
    #[error("day pattern `{pattern}` already belongs to `{owner}` and cannot be attached to `{ruleset}`")]
    AlreadyOwned { pattern: String, owner: String, ruleset: String },

    #[error("`{0}` is locked")]
    Locked(String),

    #[error("`{ruleset}` has different day patterns named `{pattern}`")]
    DuplicateIdentifier { ruleset: String, pattern: String },
}

/// An identifier that is not present in the supplied table.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LookupError {
    #[error("type limit `{0}` is not defined")]
    TypeLimit(String),

    #[error("day pattern `{0}` is not defined")]
    DayPattern(String),

    #[error("week schedule `{0}` is not defined")]
    WeekSchedule(String),

    #[error("schedule `{0}` is not defined")]
    Schedule(String),
}
