//! Unit declarations for tag supplied link attributes

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::Error;

/// Numeric link attribute resolved from tags or defaults
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AttributeField {
    MaxSpeed,
    Capacity,
    Lanes,
    LaneWidth,
    Length,
}

impl AttributeField {
    pub const ALL: [AttributeField; 5] = [
        AttributeField::MaxSpeed,
        AttributeField::Capacity,
        AttributeField::Lanes,
        AttributeField::LaneWidth,
        AttributeField::Length,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AttributeField::MaxSpeed => "MAX_SPEED_FIELD",
            AttributeField::Capacity => "CAPACITY_FIELD",
            AttributeField::Lanes => "LANES_FIELD",
            AttributeField::LaneWidth => "LANE_WIDTH_FIELD",
            AttributeField::Length => "LENGTH_FIELD",
        }
    }
}

impl fmt::Display for AttributeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttributeField {
    type Err = Error;

    /// Case-insensitive, the `_FIELD` suffix is optional
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        let name = upper.strip_suffix("_FIELD").unwrap_or(&upper);
        match name {
            "MAX_SPEED" | "SPEED" => Ok(AttributeField::MaxSpeed),
            "CAPACITY" => Ok(AttributeField::Capacity),
            "LANES" => Ok(AttributeField::Lanes),
            "LANE_WIDTH" | "WIDTH" => Ok(AttributeField::LaneWidth),
            "LENGTH" => Ok(AttributeField::Length),
            _ => Err(Error::InvalidConfig(format!(
                "Unknown link attribute field '{}'",
                s.trim()
            ))),
        }
    }
}

/// Supported input units, converted to meters and meters per second
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Meter,
    Kilometer,
    MeterPerSecond,
    KilometerPerHour,
}

impl Unit {
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedUnit`] for anything but `m`, `km`, `m/s`
    /// and `km/h`
    pub fn parse(field: &str, unit: &str) -> Result<Self, Error> {
        match unit.trim() {
            "m" => Ok(Unit::Meter),
            "km" => Ok(Unit::Kilometer),
            "m/s" => Ok(Unit::MeterPerSecond),
            "km/h" => Ok(Unit::KilometerPerHour),
            other => Err(Error::UnsupportedUnit {
                field: field.trim().to_string(),
                unit: other.to_string(),
            }),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Unit::Meter => "m",
            Unit::Kilometer => "km",
            Unit::MeterPerSecond => "m/s",
            Unit::KilometerPerHour => "km/h",
        }
    }

    pub fn convert(self, value: f64) -> f64 {
        match self {
            Unit::Meter | Unit::MeterPerSecond => value,
            Unit::Kilometer => value * 1000.0,
            Unit::KilometerPerHour => value / 3.6,
        }
    }
}

/// Per-field unit declarations, written as `FIELD:unit,FIELD:unit`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UnitMap {
    units: BTreeMap<AttributeField, Unit>,
}

impl UnitMap {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, field: AttributeField, unit: Unit) -> Self {
        self.units.insert(field, unit);
        self
    }

    pub fn get(&self, field: AttributeField) -> Option<Unit> {
        self.units.get(&field).copied()
    }

    /// Converts a raw tag value, fields without a declared unit pass through
    pub fn convert(&self, field: AttributeField, value: f64) -> f64 {
        self.get(field).map_or(value, |unit| unit.convert(value))
    }
}

impl FromStr for UnitMap {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut map = UnitMap::new();
        for entry in s.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let Some((field, unit)) = entry.split_once(':') else {
                return Err(Error::InvalidConfig(format!(
                    "Unit entry '{entry}' must look like FIELD:unit"
                )));
            };
            let parsed_field = field.parse::<AttributeField>()?;
            map.units.insert(parsed_field, Unit::parse(field, unit)?);
        }
        Ok(map)
    }
}

impl TryFrom<String> for UnitMap {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<UnitMap> for String {
    fn from(map: UnitMap) -> Self {
        map.to_string()
    }
}

impl fmt::Display for UnitMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self
            .units
            .iter()
            .map(|(field, unit)| format!("{field}:{}", unit.as_str()))
            .join(",");
        f.write_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_aliases() {
        assert_eq!(
            "MAX_SPEED_FIELD".parse::<AttributeField>().unwrap(),
            AttributeField::MaxSpeed
        );
        assert_eq!(
            "width".parse::<AttributeField>().unwrap(),
            AttributeField::LaneWidth
        );
        assert_eq!(
            "Lane_Width_Field".parse::<AttributeField>().unwrap(),
            AttributeField::LaneWidth
        );
        assert!("height".parse::<AttributeField>().is_err());
    }

    #[test]
    fn test_conversions() {
        let units: UnitMap = "MAX_SPEED_FIELD:km/h, LENGTH_FIELD:km".parse().unwrap();
        assert!((units.convert(AttributeField::MaxSpeed, 36.0) - 10.0).abs() < 1e-12);
        assert_eq!(units.convert(AttributeField::Length, 1.5), 1500.0);
        assert_eq!(units.convert(AttributeField::Lanes, 2.0), 2.0);
    }

    #[test]
    fn test_unsupported_unit() {
        let result = "MAX_SPEED_FIELD:mph".parse::<UnitMap>();
        assert!(matches!(
            result,
            Err(Error::UnsupportedUnit { ref unit, .. }) if unit == "mph"
        ));
        assert!("MAX_SPEED_FIELD".parse::<UnitMap>().is_err());
    }

    #[test]
    fn test_display() {
        let units = UnitMap::new()
            .with(AttributeField::LaneWidth, Unit::Meter)
            .with(AttributeField::MaxSpeed, Unit::MeterPerSecond);
        assert_eq!(units.to_string(), "MAX_SPEED_FIELD:m/s,LANE_WIDTH_FIELD:m");
    }
}
