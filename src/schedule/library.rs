//! Built-in type limits and schedules.

use std::sync::LazyLock;

use crate::{
    prelude::*,
    schedule::{NumericType, Ruleset, TypeLimit, UnitType},
};

pub static TYPE_LIMITS: LazyLock<Vec<TypeLimit>> = LazyLock::new(|| {
    vec![
        built_in("Fractional", Some(0.0), Some(1.0), NumericType::Continuous, UnitType::Dimensionless),
        built_in("On-Off", Some(0.0), Some(1.0), NumericType::Discrete, UnitType::Dimensionless),
        built_in("Temperature", Some(-273.15), None, NumericType::Continuous, UnitType::Temperature),
        built_in("Activity Level", Some(0.0), None, NumericType::Continuous, UnitType::ActivityLevel),
        built_in("Power", None, None, NumericType::Continuous, UnitType::Power),
        built_in("Humidity", Some(0.0), Some(100.0), NumericType::Continuous, UnitType::Percent),
        built_in("Angle", Some(0.0), Some(180.0), NumericType::Continuous, UnitType::Angle),
        built_in("Delta Temperature", None, None, NumericType::Continuous, UnitType::DeltaTemperature),
    ]
});

/// Constant 1.0, fractional and locked.
pub static ALWAYS_ON: LazyLock<Ruleset> = LazyLock::new(|| {
    let mut ruleset = Ruleset::from_constant_value("Always On", 1.0, Some(fractional().clone()))
        .expect("the built-in schedule should be valid");
    ruleset.lock();
    ruleset
});

pub fn type_limit(identifier: &str) -> Result<&'static TypeLimit> {
    TYPE_LIMITS
        .iter()
        .find(|type_limit| type_limit.identifier() == identifier)
        .ok_or_else(|| LookupError::TypeLimit(identifier.to_owned()).into())
}

pub fn fractional() -> &'static TypeLimit {
    &TYPE_LIMITS[0]
}

pub fn on_off() -> &'static TypeLimit {
    &TYPE_LIMITS[1]
}

pub fn temperature() -> &'static TypeLimit {
    &TYPE_LIMITS[2]
}

fn built_in(
    identifier: &str,
    lower_limit: Option<f64>,
    upper_limit: Option<f64>,
    numeric_type: NumericType,
    unit_type: UnitType,
) -> TypeLimit {
    TypeLimit::builder()
        .identifier(identifier)
        .maybe_lower_limit(lower_limit)
        .maybe_upper_limit(upper_limit)
        .numeric_type(numeric_type)
        .unit_type(unit_type)
        .build()
        .expect("the built-in type limit should be valid")
}
