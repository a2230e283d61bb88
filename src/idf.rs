//! Weekly text export consumed by building energy simulation engines.
//!
//! A weekly schedule is written as its type limit, one `Schedule:Day:Interval` per day pattern,
//! one `Schedule:Week:Daily` per week group and a `Schedule:Year` tying week groups to date
//! periods. Constant schedules collapse into a single `Schedule:Constant`.

mod read;
mod write;

pub use self::{
    read::{read_rulesets, read_year_schedules},
    write::{write_ruleset, write_year_schedule},
};

/// Object types this module reads or writes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, derive_more::Display)]
enum Kind {
    #[display("ScheduleTypeLimits")]
    TypeLimits,

    #[display("Schedule:Day:Interval")]
    DayInterval,

    #[display("Schedule:Day:Hourly")]
    DayHourly,

    #[display("Schedule:Day:List")]
    DayList,

    #[display("Schedule:Week:Daily")]
    WeekDaily,

    #[display("Schedule:Year")]
    Year,

    #[display("Schedule:Constant")]
    Constant,

    /// Recognised only to be skipped with a warning.
    #[display("Schedule:Compact")]
    Compact,
}

impl Kind {
    const ALL: [Self; 8] = [
        Self::TypeLimits,
        Self::DayInterval,
        Self::DayHourly,
        Self::DayList,
        Self::WeekDaily,
        Self::Year,
        Self::Constant,
        Self::Compact,
    ];

    /// Object types are case-insensitive.
    fn parse(kind: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|known| known.to_string().eq_ignore_ascii_case(kind))
    }
}
