use std::{fs, path::Path};

use almanac::{
    calendar::{MonthDay, Timestep, Weekday},
    interchange::TypeLimitRecord,
    schedule::TypeLimit,
};
use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::instrument;

/// Defaults for the command-line options.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub timestep: Option<Timestep>,
    pub start_weekday: Option<Weekday>,
    pub leap_year: bool,

    /// `[month, day]` pairs.
    pub holidays: Vec<MonthDay>,

    /// Type limits referenced by abridged schedules, in addition to the built-in ones.
    pub type_limits: Vec<TypeLimitRecord>,
}

impl Config {
    #[instrument(name = "reading the configuration…")]
    pub fn read_from(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read `{}`", path.display()))?;
        toml::from_str(&text).with_context(|| format!("malformed configuration `{}`", path.display()))
    }

    pub fn type_limits(&self) -> Result<Vec<TypeLimit>> {
        self.type_limits
            .iter()
            .cloned()
            .map(|record| {
                let identifier = record.identifier.clone();
                TypeLimit::try_from(record)
                    .with_context(|| format!("invalid type limit `{identifier}` in the configuration"))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use almanac::interchange::Limit;

    use super::*;

    #[test]
    fn parse_ok() -> Result<()> {
        // language=toml
        let config: Config = toml::from_str(
            r#"
                timestep = 6
                leap_year = true
                holidays = [[1, 1], [12, 25]]

                [[type_limits]]
                type = "ScheduleTypeLimit"
                identifier = "Occupancy"
                lower_limit = 0.0
                upper_limit = 1.0
            "#,
        )?;
        assert_eq!(config.timestep, Some(Timestep::new(6)?));
        assert_eq!(config.start_weekday, None);
        assert!(config.leap_year);
        assert_eq!(config.holidays, [MonthDay::JANUARY_1, MonthDay::new(12, 25)?]);
        assert_eq!(config.type_limits[0].upper_limit, Limit::Value(1.0));

        let type_limits = config.type_limits()?;
        assert_eq!(type_limits[0].identifier(), "Occupancy");
        assert_eq!(type_limits[0].upper_limit(), Some(1.0));
        Ok(())
    }

    #[test]
    fn missing_path_is_default() -> Result<()> {
        let config = Config::read_from(None)?;
        assert!(config.holidays.is_empty());
        assert!(config.type_limits()?.is_empty());
        Ok(())
    }

    #[test]
    fn rejects_unknown_keys() {
        assert!(toml::from_str::<Config>("colour = \"blue\"").is_err());
    }
}
