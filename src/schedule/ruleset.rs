mod average;
mod compact;
mod resolve;
mod shape;

use std::{collections::HashMap, iter};

use bon::bon;
use enumset::EnumSet;
use itertools::Itertools;

use crate::{
    calendar::{DAYS_IN_COMMON_YEAR, DayRange, MonthDay, Timestep, Weekday},
    prelude::*,
    schedule::{DayPattern, Rule, TypeLimit, validate_identifier},
};

/// Annual schedule: a default day pattern overridden by prioritized rules.
///
/// Rules are evaluated in order and the first applicable one wins, so narrower exceptions
/// must come before broader rules. Day patterns are identified by their identifiers: two
/// patterns with the same identifier within one ruleset must have the same shape.
#[derive(Clone, Debug, PartialEq)]
#[must_use]
pub struct Ruleset {
    identifier: String,
    display_name: Option<String>,
    default_day_pattern: DayPattern,

    /// Highest priority first.
    rules: Vec<Rule>,

    type_limit: Option<TypeLimit>,
    holiday_pattern: Option<DayPattern>,

    /// Only consulted by the weekly export.
    summer_design_pattern: Option<DayPattern>,

    /// Only consulted by the weekly export.
    winter_design_pattern: Option<DayPattern>,

    is_locked: bool,
}

#[bon]
impl Ruleset {
    #[builder]
    pub fn new(
        #[builder(into)] identifier: String,
        #[builder(into)] display_name: Option<String>,
        default_day_pattern: DayPattern,
        #[builder(default)] rules: Vec<Rule>,
        type_limit: Option<TypeLimit>,
        holiday_pattern: Option<DayPattern>,
        summer_design_pattern: Option<DayPattern>,
        winter_design_pattern: Option<DayPattern>,
    ) -> Result<Self> {
        validate_identifier(&identifier)?;
        let mut ruleset = Self {
            identifier,
            display_name,
            default_day_pattern,
            rules,
            type_limit,
            holiday_pattern,
            summer_design_pattern,
            winter_design_pattern,
            is_locked: false,
        };
        ruleset.validate()?;
        ruleset.claim_day_patterns();
        Ok(ruleset)
    }
}

impl Ruleset {
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.identifier)
    }

    pub(crate) fn explicit_display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    pub const fn default_day_pattern(&self) -> &DayPattern {
        &self.default_day_pattern
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Number of rules.
    pub const fn len(&self) -> usize {
        self.rules.len()
    }

    pub const fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub const fn type_limit(&self) -> Option<&TypeLimit> {
        self.type_limit.as_ref()
    }

    pub const fn holiday_pattern(&self) -> Option<&DayPattern> {
        self.holiday_pattern.as_ref()
    }

    pub const fn summer_design_pattern(&self) -> Option<&DayPattern> {
        self.summer_design_pattern.as_ref()
    }

    pub const fn winter_design_pattern(&self) -> Option<&DayPattern> {
        self.winter_design_pattern.as_ref()
    }

    pub const fn is_locked(&self) -> bool {
        self.is_locked
    }

    /// Make the ruleset read-only, every following mutation fails.
    pub const fn lock(&mut self) {
        self.is_locked = true;
    }

    /// Unlocked copy.
    pub fn duplicate(&self) -> Self {
        Self { is_locked: false, ..self.clone() }
    }

    /// Unique day patterns: default, summer and winter design days, holiday, then the rules.
    pub fn day_patterns(&self) -> Vec<&DayPattern> {
        self.all_day_patterns().unique_by(|pattern| pattern.identifier()).collect()
    }

    pub fn day_pattern(&self, identifier: &str) -> Option<&DayPattern> {
        self.all_day_patterns().find(|pattern| pattern.identifier() == identifier)
    }

    /// Whether the whole year is the same single value.
    #[expect(clippy::float_cmp)]
    pub fn is_constant(&self) -> bool {
        let value = self.default_day_pattern.breakpoints()[0].value;
        self.rules.is_empty()
            && self.all_day_patterns().all(|pattern| {
                pattern.is_constant() && pattern.breakpoints()[0].value == value
            })
    }

    /// Whether every rule spans the whole year, so that a single week describes it.
    pub fn is_single_week(&self) -> bool {
        self.rules.iter().all(|rule| rule.range().is_full_year())
    }

    /// Pattern of every holiday, whatever the rules say.
    pub fn holiday_pattern_or_default(&self) -> &DayPattern {
        self.holiday_pattern.as_ref().unwrap_or(&self.default_day_pattern)
    }

    /// Day pattern in effect on a day.
    pub fn day_pattern_on(
        &self,
        day_of_year: u16,
        weekday: Weekday,
        is_holiday: bool,
        is_leap_year: bool,
    ) -> &DayPattern {
        if is_holiday {
            self.holiday_pattern_or_default()
        } else {
            self.rules
                .iter()
                .find(|rule| rule.applies(day_of_year, weekday, is_leap_year))
                .map_or(&self.default_day_pattern, Rule::day_pattern)
        }
    }

    /// Insert a rule with the highest priority.
    pub fn add_rule(&mut self, rule: Rule) -> Result {
        self.insert_rule(0, rule)
    }

    pub fn insert_rule(&mut self, index: usize, rule: Rule) -> Result {
        self.edit(|ruleset| {
            if index > ruleset.rules.len() {
                return Err(ValidationError::RuleIndex { index, len: ruleset.rules.len() }.into());
            }
            ruleset.rules.insert(index, rule);
            Ok(())
        })
    }

    /// Insert a rule with the highest priority, copying its day pattern
    /// under a derived identifier if it already belongs to another ruleset.
    pub fn adopt_rule(&mut self, mut rule: Rule) -> Result {
        if let Some(owner) = rule.day_pattern().owner()
            && owner != self.identifier
        {
            let mut copy = rule.day_pattern().duplicate();
            copy.rename(format!("{}_{}", copy.identifier(), self.identifier))?;
            debug!(pattern = copy.identifier(), owner, "copying an attached day pattern…");
            *rule.day_pattern_mut() = copy;
        }
        self.add_rule(rule)
    }

    /// Remove a rule and detach its day pattern.
    pub fn remove_rule(&mut self, index: usize) -> Result<Rule> {
        self.ensure_unlocked()?;
        if index >= self.rules.len() {
            return Err(ValidationError::RuleIndex { index, len: self.rules.len() }.into());
        }
        let mut rule = self.rules.remove(index);
        rule.day_pattern_mut().set_owner(None);
        Ok(rule)
    }

    /// Move a rule to another priority.
    pub fn reorder_rule(&mut self, from: usize, to: usize) -> Result {
        self.ensure_unlocked()?;
        let len = self.rules.len();
        for index in [from, to] {
            if index >= len {
                return Err(ValidationError::RuleIndex { index, len }.into());
            }
        }
        let rule = self.rules.remove(from);
        self.rules.insert(to, rule);
        Ok(())
    }

    pub fn set_default_day_pattern(&mut self, day_pattern: DayPattern) -> Result {
        self.edit(|ruleset| {
            ruleset.default_day_pattern = day_pattern;
            Ok(())
        })
    }

    pub fn set_holiday_pattern(&mut self, day_pattern: Option<DayPattern>) -> Result {
        self.edit(|ruleset| {
            ruleset.holiday_pattern = day_pattern;
            Ok(())
        })
    }

    pub fn set_summer_design_pattern(&mut self, day_pattern: Option<DayPattern>) -> Result {
        self.edit(|ruleset| {
            ruleset.summer_design_pattern = day_pattern;
            Ok(())
        })
    }

    pub fn set_winter_design_pattern(&mut self, day_pattern: Option<DayPattern>) -> Result {
        self.edit(|ruleset| {
            ruleset.winter_design_pattern = day_pattern;
            Ok(())
        })
    }

    pub fn set_type_limit(&mut self, type_limit: Option<TypeLimit>) -> Result {
        self.edit(|ruleset| {
            ruleset.type_limit = type_limit;
            Ok(())
        })
    }

    pub fn set_display_name(&mut self, display_name: Option<String>) -> Result {
        self.ensure_unlocked()?;
        self.display_name = display_name;
        Ok(())
    }

    /// Rename the ruleset and re-tag its day patterns.
    pub fn set_identifier(&mut self, identifier: impl Into<String>) -> Result {
        let identifier = identifier.into();
        validate_identifier(&identifier)?;
        self.edit(|ruleset| {
            ruleset.identifier = identifier;
            ruleset.all_day_patterns_mut().for_each(|pattern| pattern.set_owner(None));
            Ok(())
        })
    }

    /// Copy with every day pattern rotated by whole timesteps.
    pub fn shift_by_step(&self, step_count: i32, timestep: Timestep) -> Result<Self> {
        let shift = |pattern: &DayPattern| pattern.shift_by_step(step_count, timestep);
        let rules = self
            .rules
            .iter()
            .map(|rule| {
                let mut shifted = rule.clone();
                *shifted.day_pattern_mut() = shift(rule.day_pattern())?;
                Ok(shifted)
            })
            .collect::<Result<Vec<_>>>()?;
        let shift_minutes = i64::from(timestep.minutes()) * i64::from(step_count);
        Self::builder()
            .identifier(format!("{}_Shift_{shift_minutes}mins", self.identifier))
            .maybe_display_name(self.display_name.clone())
            .default_day_pattern(shift(&self.default_day_pattern)?)
            .rules(rules)
            .maybe_type_limit(self.type_limit.clone())
            .maybe_holiday_pattern(self.holiday_pattern.as_ref().map(shift).transpose()?)
            .maybe_summer_design_pattern(self.summer_design_pattern.as_ref().map(shift).transpose()?)
            .maybe_winter_design_pattern(self.winter_design_pattern.as_ref().map(shift).transpose()?)
            .build()
    }

    /// Rules that reproduce this ruleset between the dates, except for holidays.
    ///
    /// Rules overlapping the period are clipped to it, and a rule of the default day pattern
    /// fills the weekdays that are not already covered over the whole period.
    pub fn to_rules(&self, start_date: MonthDay, end_date: MonthDay) -> Result<Vec<Rule>> {
        Ok(self.rules_within(DayRange::from_dates(start_date, end_date)?))
    }

    pub(crate) fn rules_within(&self, period: DayRange) -> Vec<Rule> {
        let mut covered = EnumSet::empty();
        let mut rules = Vec::new();
        for rule in &self.rules {
            if let Some(range) = rule.range().intersection(period) {
                if range == period {
                    covered |= rule.weekdays();
                }
                let mut rule = rule.duplicate();
                rule.set_range(range);
                rules.push(rule);
            }
        }
        let uncovered = covered.complement();
        if !uncovered.is_empty() {
            rules.push(Rule::with_range(self.default_day_pattern.duplicate(), uncovered, period));
        }
        rules
    }

    /// Indices of the rules whose date range covers the common-year day.
    pub(crate) fn active_rules(&self, day_of_year: u16) -> Vec<usize> {
        self.rules
            .iter()
            .positions(|rule| rule.covers(day_of_year, false))
            .collect()
    }

    /// Active rule sets for every common-year day.
    pub(crate) fn active_rules_by_day(&self) -> Vec<Vec<usize>> {
        (1..=DAYS_IN_COMMON_YEAR).map(|day_of_year| self.active_rules(day_of_year)).collect()
    }

    /// Week resolved from the active rules, listed in priority order.
    pub(crate) fn week(&self, active_rules: &[usize]) -> Week<'_> {
        let rules = active_rules.iter().map(|index| &self.rules[*index]).collect_vec();
        let days = Weekday::ALL.map(|weekday| {
            rules
                .iter()
                .copied()
                .find(|rule| rule.weekdays().contains(weekday))
                .map_or(&self.default_day_pattern, Rule::day_pattern)
        });
        Week {
            days,
            holiday: self.holiday_pattern_or_default(),
            summer_design: self.summer_design_pattern.as_ref().unwrap_or(&self.default_day_pattern),
            winter_design: self.winter_design_pattern.as_ref().unwrap_or(&self.default_day_pattern),
        }
    }

    fn all_day_patterns(&self) -> impl Iterator<Item = &DayPattern> {
        iter::once(&self.default_day_pattern)
            .chain(&self.summer_design_pattern)
            .chain(&self.winter_design_pattern)
            .chain(&self.holiday_pattern)
            .chain(self.rules.iter().map(Rule::day_pattern))
    }

    fn all_day_patterns_mut(&mut self) -> impl Iterator<Item = &mut DayPattern> {
        iter::once(&mut self.default_day_pattern)
            .chain(&mut self.summer_design_pattern)
            .chain(&mut self.winter_design_pattern)
            .chain(&mut self.holiday_pattern)
            .chain(self.rules.iter_mut().map(Rule::day_pattern_mut))
    }

    fn ensure_unlocked(&self) -> Result {
        if self.is_locked {
            return Err(ConflictError::Locked(self.identifier.clone()).into());
        }
        Ok(())
    }

    /// Apply the edit to a copy and keep it only if the result is valid.
    fn edit(&mut self, edit: impl FnOnce(&mut Self) -> Result) -> Result {
        self.ensure_unlocked()?;
        let mut edited = self.clone();
        edit(&mut edited)?;
        edited.validate()?;
        edited.claim_day_patterns();
        *self = edited;
        Ok(())
    }

    fn validate(&self) -> Result {
        let mut by_identifier: HashMap<&str, &DayPattern> = HashMap::new();
        for pattern in self.all_day_patterns() {
            if let Some(owner) = pattern.owner()
                && owner != self.identifier
            {
                return Err(ConflictError::AlreadyOwned {
                    pattern: pattern.identifier().to_owned(),
                    owner: owner.to_owned(),
                    ruleset: self.identifier.clone(),
                }
                .into());
            }
            let known = *by_identifier.entry(pattern.identifier()).or_insert(pattern);
            if !known.has_same_shape(pattern) {
                return Err(ConflictError::DuplicateIdentifier {
                    ruleset: self.identifier.clone(),
                    pattern: pattern.identifier().to_owned(),
                }
                .into());
            }
        }
        if let Some(type_limit) = &self.type_limit {
            by_identifier.values().try_for_each(|pattern| pattern.validate_values(type_limit))?;
        }
        Ok(())
    }

    fn claim_day_patterns(&mut self) {
        let owner = self.identifier.clone();
        self.all_day_patterns_mut().for_each(|pattern| pattern.set_owner(Some(owner.clone())));
    }
}

/// Day patterns of a week, borrowed from a ruleset.
#[derive(Copy, Clone)]
pub(crate) struct Week<'a> {
    /// Sunday first.
    pub days: [&'a DayPattern; 7],

    pub holiday: &'a DayPattern,
    pub summer_design: &'a DayPattern,
    pub winter_design: &'a DayPattern,
}

impl<'a> Week<'a> {
    /// Identity of the week: the identifiers of its slots.
    pub fn key(&self) -> [&'a str; 10] {
        let [sunday, monday, tuesday, wednesday, thursday, friday, saturday] =
            self.days.map(DayPattern::identifier);
        [
            sunday,
            monday,
            tuesday,
            wednesday,
            thursday,
            friday,
            saturday,
            self.holiday.identifier(),
            self.summer_design.identifier(),
            self.winter_design.identifier(),
        ]
    }
}
