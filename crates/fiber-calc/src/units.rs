//! Length unit normalization
//!
//! Every length entering a calculator is brought to millimeters first.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Length units offered by the calculator forms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LengthUnit {
    #[serde(rename = "mm")]
    Millimeter,
    #[serde(rename = "cm")]
    Centimeter,
    #[serde(rename = "m")]
    Meter,
    #[serde(rename = "in")]
    Inch,
}

impl LengthUnit {
    pub const ALL: [LengthUnit; 4] = [
        LengthUnit::Millimeter,
        LengthUnit::Centimeter,
        LengthUnit::Meter,
        LengthUnit::Inch,
    ];

    /// Millimeters per one of this unit
    pub fn millimeters(&self) -> f64 {
        match self {
            Self::Millimeter => 1.0,
            Self::Centimeter => 10.0,
            Self::Meter => 1000.0,
            Self::Inch => 25.4,
        }
    }

    /// Form code (`mm`, `cm`, `m`, `in`)
    pub fn code(&self) -> &'static str {
        match self {
            Self::Millimeter => "mm",
            Self::Centimeter => "cm",
            Self::Meter => "m",
            Self::Inch => "in",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|u| u.code() == code)
    }

    /// Like [`from_code`](Self::from_code), but unrecognized codes map to
    /// millimeters so the value passes through unscaled.
    pub fn from_code_lenient(code: &str) -> Self {
        Self::from_code(code).unwrap_or_else(|| {
            debug!("Unknown length unit {:?}, treating value as mm", code);
            Self::Millimeter
        })
    }
}

impl fmt::Display for LengthUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A length as entered: magnitude plus unit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LengthQuantity {
    pub value: f64,
    pub unit: LengthUnit,
}

impl LengthQuantity {
    pub fn new(value: f64, unit: LengthUnit) -> Self {
        Self { value, unit }
    }

    pub fn mm(value: f64) -> Self {
        Self::new(value, LengthUnit::Millimeter)
    }

    pub fn to_millimeters(&self) -> f64 {
        self.value * self.unit.millimeters()
    }
}

/// Convert a value tagged with a form unit code to millimeters.
///
/// Unrecognized codes leave the value unchanged.
pub fn to_millimeters(value: f64, unit_code: &str) -> f64 {
    value * LengthUnit::from_code_lenient(unit_code).millimeters()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_factors() {
        assert_eq!(to_millimeters(2.0, "mm"), 2.0);
        assert_eq!(to_millimeters(2.0, "cm"), 20.0);
        assert_eq!(to_millimeters(2.0, "m"), 2000.0);
        assert_eq!(to_millimeters(1.0, "in"), 25.4);
    }

    #[test]
    fn test_unknown_unit_passes_through() {
        assert_eq!(to_millimeters(7.5, "ft"), 7.5);
        assert_eq!(to_millimeters(7.5, ""), 7.5);
        assert_eq!(to_millimeters(7.5, "MM"), 7.5);
    }

    #[test]
    fn test_code_round_trip() {
        for unit in LengthUnit::ALL {
            assert_eq!(LengthUnit::from_code(unit.code()), Some(unit));
            assert_eq!(unit.to_string(), unit.code());
        }
    }

    #[test]
    fn test_quantity() {
        assert_eq!(LengthQuantity::new(3.0, LengthUnit::Centimeter).to_millimeters(), 30.0);
        assert_eq!(LengthQuantity::mm(25.4).to_millimeters(), 25.4);
    }

    #[test]
    fn test_unit_serde_codes() {
        let json = serde_json::to_string(&LengthUnit::Inch).unwrap();
        assert_eq!(json, "\"in\"");
        let unit: LengthUnit = serde_json::from_str("\"cm\"").unwrap();
        assert_eq!(unit, LengthUnit::Centimeter);
    }
}
