use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

use bon::bon;
use serde::{Deserialize, Serialize};

use crate::{prelude::*, schedule::validate_identifier};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
pub enum NumericType {
    #[default]
    Continuous,

    /// Only integer values are allowed.
    Discrete,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
pub enum UnitType {
    #[default]
    Dimensionless,
    Temperature,
    DeltaTemperature,
    PrecipitationRate,
    Angle,
    ConvectionCoefficient,
    ActivityLevel,
    Velocity,
    Capacity,
    Power,
    Availability,
    Percent,
    Control,
    Mode,
}

impl FromStr for NumericType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        [Self::Continuous, Self::Discrete]
            .into_iter()
            .find(|numeric_type| numeric_type.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                ValidationError::Syntax { record: "numeric type".into(), message: s.into() }.into()
            })
    }
}

impl UnitType {
    pub const ALL: [Self; 14] = [
        Self::Dimensionless,
        Self::Temperature,
        Self::DeltaTemperature,
        Self::PrecipitationRate,
        Self::Angle,
        Self::ConvectionCoefficient,
        Self::ActivityLevel,
        Self::Velocity,
        Self::Capacity,
        Self::Power,
        Self::Availability,
        Self::Percent,
        Self::Control,
        Self::Mode,
    ];

    pub const fn unit(self) -> &'static str {
        match self {
            Self::Dimensionless | Self::Availability | Self::Control | Self::Mode => "fraction",
            Self::Temperature => "C",
            Self::DeltaTemperature => "dC",
            Self::PrecipitationRate => "m",
            Self::Angle => "degrees",
            Self::ConvectionCoefficient => "W/m2-K",
            Self::ActivityLevel | Self::Capacity | Self::Power => "W",
            Self::Velocity => "m/s",
            Self::Percent => "%",
        }
    }
}

impl FromStr for UnitType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|unit_type| unit_type.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                ValidationError::Syntax { record: "unit type".into(), message: s.into() }.into()
            })
    }
}

/// Legal range, continuity and unit of schedule values.
#[derive(Clone, Debug, PartialEq)]
#[must_use]
pub struct TypeLimit {
    identifier: String,
    display_name: Option<String>,
    lower_limit: Option<f64>,
    upper_limit: Option<f64>,
    numeric_type: NumericType,
    unit_type: UnitType,
}

#[bon]
impl TypeLimit {
    #[builder]
    pub fn new(
        #[builder(into)] identifier: String,
        #[builder(into)] display_name: Option<String>,
        lower_limit: Option<f64>,
        upper_limit: Option<f64>,
        #[builder(default)] numeric_type: NumericType,
        #[builder(default)] unit_type: UnitType,
    ) -> Result<Self> {
        validate_identifier(&identifier)?;
        for limit in lower_limit.into_iter().chain(upper_limit) {
            if !limit.is_finite() {
                return Err(ValidationError::NonFinite { value: limit }.into());
            }
        }
        if let (Some(lower), Some(upper)) = (lower_limit, upper_limit)
            && lower > upper
        {
            return Err(ValidationError::LimitOrder { lower, upper }.into());
        }
        Ok(Self { identifier, display_name, lower_limit, upper_limit, numeric_type, unit_type })
    }
}

impl TypeLimit {
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.identifier)
    }

    pub const fn lower_limit(&self) -> Option<f64> {
        self.lower_limit
    }

    pub const fn upper_limit(&self) -> Option<f64> {
        self.upper_limit
    }

    pub const fn numeric_type(&self) -> NumericType {
        self.numeric_type
    }

    pub const fn unit_type(&self) -> UnitType {
        self.unit_type
    }

    pub const fn unit(&self) -> &'static str {
        self.unit_type.unit()
    }

    /// Same limits without the integer constraint.
    pub fn to_continuous(&self) -> Self {
        Self { numeric_type: NumericType::Continuous, ..self.clone() }
    }

    pub(crate) fn explicit_display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// Check a single schedule value against the limits.
    pub fn validate(&self, value: f64) -> Result {
        if self.lower_limit.is_some_and(|lower| value < lower)
            || self.upper_limit.is_some_and(|upper| value > upper)
        {
            return Err(ValidationError::OutOfLimits {
                value,
                type_limit: self.identifier.clone(),
            }
            .into());
        }
        if self.numeric_type == NumericType::Discrete && value.fract() != 0.0 {
            return Err(ValidationError::NotInteger { value, type_limit: self.identifier.clone() }
                .into());
        }
        Ok(())
    }
}

impl Display for TypeLimit {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let bound = |limit: Option<f64>| limit.map_or_else(|| "…".to_string(), |limit| limit.to_string());
        write!(
            f,
            "{} [{}, {}] {} {}",
            self.display_name(),
            bound(self.lower_limit),
            bound(self.upper_limit),
            self.numeric_type,
            self.unit(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_continuous_ok() -> Result {
        let type_limit = TypeLimit::builder()
            .identifier("Fractional")
            .lower_limit(0.0)
            .upper_limit(1.0)
            .build()?;
        type_limit.validate(0.0)?;
        type_limit.validate(0.35)?;
        type_limit.validate(1.0)?;
        assert_eq!(
            type_limit.validate(1.5),
            Err(Error::from(ValidationError::OutOfLimits {
                value: 1.5,
                type_limit: "Fractional".into(),
            })),
        );
        Ok(())
    }

    #[test]
    fn validate_discrete_ok() -> Result {
        let type_limit = TypeLimit::builder()
            .identifier("On-Off")
            .lower_limit(0.0)
            .upper_limit(1.0)
            .numeric_type(NumericType::Discrete)
            .build()?;
        type_limit.validate(1.0)?;
        assert!(type_limit.validate(0.5).is_err());
        Ok(())
    }

    #[test]
    fn validate_unbounded_ok() -> Result {
        let type_limit = TypeLimit::builder()
            .identifier("Temperature")
            .lower_limit(-273.15)
            .unit_type(UnitType::Temperature)
            .build()?;
        type_limit.validate(1e6)?;
        assert!(type_limit.validate(-300.0).is_err());
        assert_eq!(type_limit.unit(), "C");
        Ok(())
    }

    #[test]
    fn parse_types_ok() -> Result {
        assert_eq!("discrete".parse::<NumericType>()?, NumericType::Discrete);
        assert_eq!("DeltaTemperature".parse::<UnitType>()?, UnitType::DeltaTemperature);
        assert_eq!(" percent ".parse::<UnitType>()?, UnitType::Percent);
        assert!("Kelvin".parse::<UnitType>().is_err());
        Ok(())
    }

    #[test]
    fn rejects_inverted_limits() {
        let result = TypeLimit::builder().identifier("Broken").lower_limit(1.0).upper_limit(0.0).build();
        assert_eq!(result, Err(Error::from(ValidationError::LimitOrder { lower: 1.0, upper: 0.0 })));
    }
}
