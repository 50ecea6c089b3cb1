use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::debug;

use crate::error::{ProcessingError, Result};
use crate::models::StationInfo;
use crate::utils::constants::{
    STATIONS_LAT_END, STATIONS_LAT_START, STATIONS_LINE_MIN_WIDTH, STATIONS_LON_END,
    STATIONS_LON_START, STATIONS_NAME_END, STATIONS_NAME_START, STATIONS_STATE_END,
    STATIONS_STATE_START, STATION_ID_END, STATION_ID_START,
};

/// Reads the fixed-width station directory (`ghcnd-stations.txt`).
///
/// The directory is advisory: malformed lines are skipped and stations
/// missing from it later resolve to default identities, so ingestion
/// never fails over metadata.
pub struct StationReader;

impl StationReader {
    pub fn new() -> Self {
        Self
    }

    /// Read all station entries from the directory file
    pub fn read_stations(&self, path: &Path) -> Result<Vec<StationInfo>> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let mut stations = Vec::new();
        let mut skipped = 0usize;

        for line_result in reader.lines() {
            let line = line_result?;

            if line.len() < STATIONS_LINE_MIN_WIDTH {
                if !line.trim().is_empty() {
                    skipped += 1;
                }
                continue;
            }

            match self.parse_station_line(&line) {
                Ok(station) => stations.push(station),
                Err(_) => skipped += 1,
            }
        }

        if skipped > 0 {
            debug!(skipped, "skipped malformed station directory lines");
        }

        Ok(stations)
    }

    /// Read the directory keyed by station id
    pub fn read_stations_map(&self, path: &Path) -> Result<HashMap<String, StationInfo>> {
        let stations = self.read_stations(path)?;
        let mut map = HashMap::with_capacity(stations.len());

        for station in stations {
            map.insert(station.id.clone(), station);
        }

        Ok(map)
    }

    fn parse_station_line(&self, line: &str) -> Result<StationInfo> {
        let id = field(line, STATION_ID_START, STATION_ID_END)?.to_string();

        let latitude = field(line, STATIONS_LAT_START, STATIONS_LAT_END)?
            .trim()
            .parse::<f64>()
            .map_err(|_| {
                ProcessingError::InvalidCoordinate(format!("latitude for station {}", id))
            })?;
        let longitude = field(line, STATIONS_LON_START, STATIONS_LON_END)?
            .trim()
            .parse::<f64>()
            .map_err(|_| {
                ProcessingError::InvalidCoordinate(format!("longitude for station {}", id))
            })?;

        let state = field(line, STATIONS_STATE_START, STATIONS_STATE_END)?
            .trim()
            .to_string();
        let name = field(line, STATIONS_NAME_START, STATIONS_NAME_END)?
            .trim()
            .replace('&', " ");

        Ok(StationInfo::new(id, name, state, latitude, longitude))
    }
}

impl Default for StationReader {
    fn default() -> Self {
        Self::new()
    }
}

fn field(line: &str, start: usize, end: usize) -> Result<&str> {
    line.get(start..end).ok_or_else(|| {
        ProcessingError::InvalidFormat(format!("station field at {}..{}", start, end))
    })
}
