use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ProcessingError;
use crate::utils::constants::MAX_DAYS_IN_MONTH;

/// Measured variable carried by one observation line.
///
/// Closed set; anything else on the wire is a parse-time error rather than
/// a silently ignored record kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Element {
    MaxTemperature,
    MinTemperature,
    Snowfall,
    Precipitation,
}

impl Element {
    pub fn code(&self) -> &'static str {
        match self {
            Element::MaxTemperature => "TMAX",
            Element::MinTemperature => "TMIN",
            Element::Snowfall => "SNOW",
            Element::Precipitation => "PRCP",
        }
    }

    pub fn is_temperature(&self) -> bool {
        matches!(self, Element::MaxTemperature | Element::MinTemperature)
    }
}

impl FromStr for Element {
    type Err = ProcessingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TMAX" => Ok(Element::MaxTemperature),
            "TMIN" => Ok(Element::MinTemperature),
            "SNOW" => Ok(Element::Snowfall),
            "PRCP" => Ok(Element::Precipitation),
            other => Err(ProcessingError::UnknownElement(other.to_string())),
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// One decoded observation line: a station-month of daily values for a
/// single element, already scaled to physical units.
///
/// The value array always spans the 31-slot month layout; slots for days
/// the month does not have are `None` and never read downstream.
#[derive(Debug, Clone)]
pub struct Observation {
    pub station_id: String,
    pub country_code: String,
    pub year: u16,
    /// Calendar month, 1-12
    pub month: u8,
    pub element: Element,
    pub values: [Option<f32>; MAX_DAYS_IN_MONTH],
}

impl Observation {
    /// Value for a 0-based day-of-month index
    pub fn value(&self, day_index: usize) -> Option<f32> {
        self.values[day_index]
    }

    pub fn has_any_value(&self) -> bool {
        self.values.iter().any(Option::is_some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_codes_round_trip() {
        for element in [
            Element::MaxTemperature,
            Element::MinTemperature,
            Element::Snowfall,
            Element::Precipitation,
        ] {
            assert_eq!(element.code().parse::<Element>().unwrap(), element);
        }
    }

    #[test]
    fn test_unknown_element_is_an_error() {
        assert!(matches!(
            "SNWD".parse::<Element>(),
            Err(ProcessingError::UnknownElement(_))
        ));
        assert!("tmax".parse::<Element>().is_err());
    }

    #[test]
    fn test_temperature_classification() {
        assert!(Element::MaxTemperature.is_temperature());
        assert!(Element::MinTemperature.is_temperature());
        assert!(!Element::Snowfall.is_temperature());
        assert!(!Element::Precipitation.is_temperature());
    }

    #[test]
    fn test_empty_observation() {
        let obs = Observation {
            station_id: "USC00011111".to_string(),
            country_code: "US".to_string(),
            year: 1950,
            month: 7,
            element: Element::MaxTemperature,
            values: [None; MAX_DAYS_IN_MONTH],
        };
        assert!(!obs.has_any_value());
        assert_eq!(obs.value(0), None);
    }
}
