use serde::{Deserialize, Serialize};
use validator::Validate;

/// Identity and location of a station, from the station directory.
///
/// Absent directory entries resolve to defaults so ingestion never fails
/// on an unknown station.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct StationInfo {
    pub id: String,

    pub name: String,

    /// Two-letter state/territory code, empty when the network has none
    pub state: String,

    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,

    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
}

impl StationInfo {
    pub fn new(id: String, name: String, state: String, latitude: f64, longitude: f64) -> Self {
        Self {
            id,
            name,
            state,
            latitude,
            longitude,
        }
    }

    /// Placeholder identity for stations missing from the directory
    pub fn unknown(id: &str) -> Self {
        Self {
            id: id.to_string(),
            name: String::new(),
            state: String::new(),
            latitude: 0.0,
            longitude: 0.0,
        }
    }

    pub fn country_code(&self) -> &str {
        &self.id[..self.id.len().min(2)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_station_validation() {
        let station = StationInfo::new(
            "USC00342912".to_string(),
            "EVA".to_string(),
            "OK".to_string(),
            36.8064,
            -101.9064,
        );

        assert!(station.validate().is_ok());
        assert_eq!(station.country_code(), "US");
    }

    #[test]
    fn test_invalid_coordinates() {
        let station = StationInfo::new(
            "USC00342912".to_string(),
            "EVA".to_string(),
            "OK".to_string(),
            91.0,
            -101.9064,
        );

        assert!(station.validate().is_err());
    }

    #[test]
    fn test_unknown_station_defaults() {
        let station = StationInfo::unknown("ASN00001019");
        assert_eq!(station.id, "ASN00001019");
        assert!(station.name.is_empty());
        assert!(station.state.is_empty());
        assert_eq!(station.country_code(), "AS");
    }
}
