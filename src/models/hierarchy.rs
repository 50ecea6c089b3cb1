use std::collections::{BTreeSet, HashMap};

use serde::Serialize;

use crate::analyzers::baseline::BaselineAccumulator;
use crate::models::station::StationInfo;
use crate::processors::extremes::ExtremeTracker;
use crate::utils::constants::{MAX_DAYS_IN_MONTH, MONTHS_PER_YEAR};

/// One calendar day of a station-month. Slots exist for all 31 positions;
/// repeated ingestion of the same day/element overwrites (last write
/// wins).
#[derive(Debug, Clone, Default)]
pub struct Day {
    pub max_temp: Option<f32>,
    pub min_temp: Option<f32>,
    pub snowfall: Option<f32>,
    pub precipitation: Option<f32>,
    /// 1-based ordinal within the year, 0 until the day is first touched
    pub day_of_year: u16,
}

#[derive(Debug)]
pub struct Month {
    /// Calendar month, 1-12
    pub number: u8,
    pub days: Vec<Day>,
    /// Record temperatures within this station-month, with the 1-based
    /// day-of-month achieving each
    pub record_max: ExtremeTracker<u8>,
    pub record_min: ExtremeTracker<u8>,
}

impl Month {
    pub fn new(number: u8) -> Self {
        Self {
            number,
            days: vec![Day::default(); MAX_DAYS_IN_MONTH],
            record_max: ExtremeTracker::highest(),
            record_min: ExtremeTracker::lowest(),
        }
    }
}

/// Per-year tallies of days landing on each side of the thresholds
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ThresholdCounts {
    pub days_above_high: u32,
    pub days_below_high: u32,
    pub nights_below_low: u32,
    pub nights_above_low: u32,
}

/// Longest consecutive-day runs seen so far within one station-year
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct LongestRuns {
    pub above_high: u32,
    pub below_high: u32,
    pub below_low: u32,
    pub above_low: u32,
}

#[derive(Debug)]
pub struct Year {
    pub number: u16,
    pub months: Vec<Month>,
    /// Record temperatures within this station-year, with the 1-based
    /// month achieving each
    pub record_max: ExtremeTracker<u8>,
    pub record_min: ExtremeTracker<u8>,
    pub threshold_counts: ThresholdCounts,
    pub longest_runs: LongestRuns,
    pub days_with_snow: u32,
    pub days_without_snow: u32,
}

impl Year {
    pub fn new(number: u16) -> Self {
        Self {
            number,
            months: (1..=MONTHS_PER_YEAR as u8).map(Month::new).collect(),
            record_max: ExtremeTracker::highest(),
            record_min: ExtremeTracker::lowest(),
            threshold_counts: ThresholdCounts::default(),
            longest_runs: LongestRuns::default(),
            days_with_snow: 0,
            days_without_snow: 0,
        }
    }
}

/// Calendar position of a station-level record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ObservationDate {
    pub year: u16,
    pub month: u8,
    pub day_of_month: u8,
    pub day_of_year: u16,
}

#[derive(Debug)]
pub struct Station {
    pub info: StationInfo,
    /// Years in ingestion order; the engine only ever appends
    pub years: Vec<Year>,
    /// Years holding at least one plausible TMAX or TMIN reading
    pub years_with_temperature: BTreeSet<u16>,
    pub record_max: ExtremeTracker<ObservationDate>,
    pub record_min: ExtremeTracker<ObservationDate>,
    pub record_precipitation: ExtremeTracker<ObservationDate>,
    pub record_snowfall: ExtremeTracker<ObservationDate>,
    pub baseline: BaselineAccumulator,
}

impl Station {
    pub fn new(info: StationInfo) -> Self {
        Self {
            info,
            years: Vec::new(),
            years_with_temperature: BTreeSet::new(),
            record_max: ExtremeTracker::highest(),
            record_min: ExtremeTracker::lowest(),
            record_precipitation: ExtremeTracker::highest(),
            record_snowfall: ExtremeTracker::highest(),
            baseline: BaselineAccumulator::new(),
        }
    }

    /// The year currently being written to (most recently appended)
    pub fn current_year_mut(&mut self) -> Option<&mut Year> {
        self.years.last_mut()
    }

    pub fn first_year_with_temperature(&self) -> Option<u16> {
        self.years_with_temperature.iter().next().copied()
    }

    pub fn last_year_with_temperature(&self) -> Option<u16> {
        self.years_with_temperature.iter().next_back().copied()
    }
}

/// Arena index of a station within its country
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct StationId(pub usize);

#[derive(Debug)]
pub struct State {
    pub code: String,
    pub stations: Vec<StationId>,
    /// All-time records across the state's stations, with owning year
    pub record_max: ExtremeTracker<u16>,
    pub record_min: ExtremeTracker<u16>,
}

impl State {
    fn new(code: String) -> Self {
        Self {
            code,
            stations: Vec::new(),
            record_max: ExtremeTracker::highest(),
            record_min: ExtremeTracker::lowest(),
        }
    }
}

/// Root of the aggregation hierarchy. Stations live in a flat arena in
/// ingestion order; states reference them by index so record-holder maps
/// never hold pointers into the hierarchy.
#[derive(Debug)]
pub struct Country {
    pub states: Vec<State>,
    stations: Vec<Station>,
    state_index: HashMap<String, usize>,
    /// Country-wide all-time records, with owning year
    pub record_max: ExtremeTracker<u16>,
    pub record_min: ExtremeTracker<u16>,
}

impl Default for Country {
    fn default() -> Self {
        Self::new()
    }
}

impl Country {
    pub fn new() -> Self {
        Self {
            states: Vec::new(),
            stations: Vec::new(),
            state_index: HashMap::new(),
            record_max: ExtremeTracker::highest(),
            record_min: ExtremeTracker::lowest(),
        }
    }

    /// Index of the state with this code, creating it on first sight
    pub fn intern_state(&mut self, code: &str) -> usize {
        if let Some(&index) = self.state_index.get(code) {
            return index;
        }

        let index = self.states.len();
        self.states.push(State::new(code.to_string()));
        self.state_index.insert(code.to_string(), index);
        index
    }

    /// Append a fresh station to the arena and its state's roster
    pub fn add_station(&mut self, info: StationInfo) -> (StationId, usize) {
        let state_index = self.intern_state(&info.state);
        let id = StationId(self.stations.len());
        self.stations.push(Station::new(info));
        self.states[state_index].stations.push(id);
        (id, state_index)
    }

    pub fn station(&self, id: StationId) -> &Station {
        &self.stations[id.0]
    }

    pub fn station_mut(&mut self, id: StationId) -> &mut Station {
        &mut self.stations[id.0]
    }

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    pub fn station_count(&self) -> usize {
        self.stations.len()
    }

    /// (state index, station id, station) in state-then-roster order
    pub fn iter_stations(&self) -> impl Iterator<Item = (usize, StationId, &Station)> {
        self.states.iter().enumerate().flat_map(move |(si, state)| {
            state
                .stations
                .iter()
                .map(move |&id| (si, id, self.station(id)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_year_layout() {
        let year = Year::new(1936);
        assert_eq!(year.months.len(), 12);
        assert_eq!(year.months[0].number, 1);
        assert_eq!(year.months[11].number, 12);
        assert_eq!(year.months[6].days.len(), 31);
    }

    #[test]
    fn test_state_interning() {
        let mut country = Country::new();
        let ok = country.intern_state("OK");
        let tx = country.intern_state("TX");
        assert_ne!(ok, tx);
        assert_eq!(country.intern_state("OK"), ok);
        assert_eq!(country.states.len(), 2);
    }

    #[test]
    fn test_station_arena() {
        let mut country = Country::new();
        let (a, state_a) = country.add_station(StationInfo::new(
            "USC00342912".into(),
            "EVA".into(),
            "OK".into(),
            36.8,
            -101.9,
        ));
        let (b, state_b) = country.add_station(StationInfo::new(
            "USC00344573".into(),
            "KENTON".into(),
            "OK".into(),
            36.9,
            -102.9,
        ));

        assert_eq!(state_a, state_b);
        assert_eq!(country.states[state_a].stations, vec![a, b]);
        assert_eq!(country.station(a).info.name, "EVA");
        assert_eq!(country.station_count(), 2);
    }

    #[test]
    fn test_first_and_last_temperature_years() {
        let mut station = Station::new(StationInfo::unknown("USC00342912"));
        assert_eq!(station.first_year_with_temperature(), None);

        station.years_with_temperature.insert(1934);
        station.years_with_temperature.insert(1902);
        station.years_with_temperature.insert(1960);

        assert_eq!(station.first_year_with_temperature(), Some(1902));
        assert_eq!(station.last_year_with_temperature(), Some(1960));
    }

    #[test]
    fn test_iter_stations_order() {
        let mut country = Country::new();
        country.add_station(StationInfo::new(
            "USC00000001".into(),
            "A".into(),
            "OK".into(),
            0.0,
            0.0,
        ));
        country.add_station(StationInfo::new(
            "USC00000002".into(),
            "B".into(),
            "TX".into(),
            0.0,
            0.0,
        ));
        country.add_station(StationInfo::new(
            "USC00000003".into(),
            "C".into(),
            "OK".into(),
            0.0,
            0.0,
        ));

        let names: Vec<&str> = country
            .iter_stations()
            .map(|(_, _, s)| s.info.name.as_str())
            .collect();
        assert_eq!(names, vec!["A", "C", "B"]);
    }
}
