//! Length units for caller-facing values

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Unit of the lengths callers pass in and receive back
///
/// Sketch geometry travels in meters; parameter expressions carry the unit
/// explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthUnit {
    #[default]
    Inch,
    Millimeter,
    Meter,
}

impl LengthUnit {
    /// Meters per unit
    pub fn meters_per_unit(&self) -> f64 {
        match self {
            LengthUnit::Inch => 0.0254,
            LengthUnit::Millimeter => 0.001,
            LengthUnit::Meter => 1.0,
        }
    }

    pub fn to_meters(&self, value: f64) -> f64 {
        value * self.meters_per_unit()
    }

    pub fn from_meters(&self, meters: f64) -> f64 {
        meters / self.meters_per_unit()
    }

    /// Expression suffix understood by the service
    pub fn suffix(&self) -> &'static str {
        match self {
            LengthUnit::Inch => "in",
            LengthUnit::Millimeter => "mm",
            LengthUnit::Meter => "m",
        }
    }

    /// Parameter expression, e.g. `"0.5 in"`
    pub fn expression(&self, value: f64) -> String {
        format!("{} {}", value, self.suffix())
    }
}

impl fmt::Display for LengthUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

impl FromStr for LengthUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "in" | "inch" | "inches" => Ok(LengthUnit::Inch),
            "mm" | "millimeter" | "millimeters" => Ok(LengthUnit::Millimeter),
            "m" | "meter" | "meters" => Ok(LengthUnit::Meter),
            other => Err(format!("unknown length unit '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_conversions() {
        assert_relative_eq!(LengthUnit::Inch.to_meters(1.0), 0.0254);
        assert_relative_eq!(LengthUnit::Millimeter.from_meters(0.0254), 25.4, epsilon = 1e-9);
        assert_relative_eq!(LengthUnit::Inch.from_meters(0.003175), 0.125, epsilon = 1e-12);
    }

    #[test]
    fn test_expression_and_parse() {
        assert_eq!(LengthUnit::Inch.expression(0.5), "0.5 in");
        assert_eq!(LengthUnit::Millimeter.expression(12.0), "12 mm");
        assert_eq!("Inches".parse::<LengthUnit>(), Ok(LengthUnit::Inch));
        assert!("furlong".parse::<LengthUnit>().is_err());
    }
}
