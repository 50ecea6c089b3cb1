use std::collections::HashMap;
use std::io::BufRead;

use serde::Serialize;
use tracing::{debug, info};

use crate::config::AnalysisConfig;
use crate::error::{ProcessingError, Result};
use crate::models::hierarchy::{Country, ObservationDate, StationId};
use crate::models::observation::{Element, Observation};
use crate::models::station::StationInfo;
use crate::processors::record_parser::RecordParser;
use crate::processors::streaks::StreakTracker;
use crate::utils::calendar;
use crate::utils::constants::{MAX_PLAUSIBLE_TEMP, MIN_PLAUSIBLE_TEMP, MIN_RECORD_WIDTH};
use crate::utils::progress::ProgressReporter;

/// Tallies of what the ingestion pass accepted and dropped
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct IngestStats {
    pub lines_read: u64,
    pub observations_folded: u64,
    pub short_lines: u64,
    pub malformed_lines: u64,
    pub unknown_elements: u64,
    pub out_of_scope_years: u64,
    pub implausible_readings: u64,
    pub most_recent_year: Option<u16>,
}

/// The station-year currently being written to. The engine never searches
/// back through history; every record targets the most-recently-appended
/// entities.
struct CurrentTarget {
    station_key: String,
    station: StationId,
    state: usize,
    year: Option<u16>,
}

/// Single-pass aggregation engine: folds each observation line into the
/// entity hierarchy, the record trackers and the streak counters.
pub struct IngestEngine {
    config: AnalysisConfig,
    parser: RecordParser,
    directory: HashMap<String, StationInfo>,
    country: Country,
    current: Option<CurrentTarget>,
    streaks: StreakTracker,
    stats: IngestStats,
}

impl IngestEngine {
    pub fn new(config: AnalysisConfig, directory: HashMap<String, StationInfo>) -> Self {
        let parser = RecordParser::new(&config);
        Self {
            config,
            parser,
            directory,
            country: Country::new(),
            current: None,
            streaks: StreakTracker::new(),
            stats: IngestStats::default(),
        }
    }

    pub fn stats(&self) -> &IngestStats {
        &self.stats
    }

    pub fn country(&self) -> &Country {
        &self.country
    }

    /// Consume the whole observation source. Only an unreadable source is
    /// fatal; individual bad lines are counted and dropped.
    pub fn ingest<R: BufRead>(
        &mut self,
        reader: R,
        progress: Option<&ProgressReporter>,
    ) -> Result<()> {
        for line_result in reader.lines() {
            let line = line_result?;
            self.ingest_line(&line);

            if let Some(p) = progress {
                if self.stats.lines_read % 10_000 == 0 {
                    p.set_message(&format!(
                        "{} lines, {} stations",
                        self.stats.lines_read,
                        self.country.station_count()
                    ));
                }
            }
        }

        info!(
            lines = self.stats.lines_read,
            stations = self.country.station_count(),
            "ingestion complete"
        );
        Ok(())
    }

    /// Fold one observation line; malformed input never fails the run
    pub fn ingest_line(&mut self, line: &str) {
        self.stats.lines_read += 1;

        if line.len() < MIN_RECORD_WIDTH {
            if !line.trim().is_empty() {
                self.stats.short_lines += 1;
            }
            return;
        }

        let station_key = match RecordParser::peek_station_id(line) {
            Some(key) => key,
            None => {
                self.stats.malformed_lines += 1;
                return;
            }
        };

        // Station transition: materialize a fresh station and zero the
        // live streak counters before any of this line's values land
        let needs_transition = self
            .current
            .as_ref()
            .map_or(true, |c| c.station_key != station_key);
        if needs_transition {
            self.begin_station(station_key);
        }

        let (station_id, state_index) = {
            let current = self.current.as_ref().expect("station resolved above");
            (current.station, current.state)
        };

        let parser = self.parser.clone();
        let observation = {
            let baseline = &mut self.country.station_mut(station_id).baseline;
            match parser.parse(line, baseline) {
                Ok(observation) => observation,
                Err(ProcessingError::RecordTooShort { .. }) => {
                    self.stats.short_lines += 1;
                    return;
                }
                Err(ProcessingError::UnknownElement(code)) => {
                    debug!(%code, "dropping unrecognized element");
                    self.stats.unknown_elements += 1;
                    return;
                }
                Err(error) => {
                    debug!(%error, "dropping malformed line");
                    self.stats.malformed_lines += 1;
                    return;
                }
            }
        };

        if self
            .stats
            .most_recent_year
            .map_or(true, |y| observation.year > y)
        {
            self.stats.most_recent_year = Some(observation.year);
        }

        // Baseline sums above intentionally include out-of-scope years;
        // the year window limits statistics, not the reference period
        if !self.config.year_in_scope(observation.year) {
            self.stats.out_of_scope_years += 1;
            return;
        }

        let current = self.current.as_mut().expect("station resolved above");
        if current.year != Some(observation.year) {
            current.year = Some(observation.year);
            self.country
                .station_mut(station_id)
                .years
                .push(crate::models::hierarchy::Year::new(observation.year));
            self.streaks.reset();
        }

        self.fold(station_id, state_index, &observation);
        self.stats.observations_folded += 1;
    }

    /// Release the finished hierarchy for the second pass
    pub fn finish(self) -> (Country, IngestStats) {
        (self.country, self.stats)
    }

    fn begin_station(&mut self, station_key: &str) {
        let info = self
            .directory
            .get(station_key)
            .cloned()
            .unwrap_or_else(|| StationInfo::unknown(station_key));

        debug!(station = station_key, name = %info.name, "new station");

        let (station, state) = self.country.add_station(info);
        self.current = Some(CurrentTarget {
            station_key: station_key.to_string(),
            station,
            state,
            year: None,
        });
        self.streaks.reset();
    }

    /// Apply every daily value of one observation to the hierarchy. Scope
    /// updates run in a fixed order (country, state, station, year,
    /// month), each independent of the others.
    fn fold(&mut self, station_id: StationId, state_index: usize, observation: &Observation) {
        let month_index = (observation.month as usize) - 1;
        let threshold_high = self.config.threshold_high;
        let threshold_low = self.config.threshold_low;

        for day_index in 0..observation.values.len() {
            let value = match observation.value(day_index) {
                Some(value) => value,
                None => continue,
            };

            let day_of_month = (day_index + 1) as u8;
            let day_of_year =
                calendar::day_of_year(observation.year, observation.month, day_of_month);
            let date = ObservationDate {
                year: observation.year,
                month: observation.month,
                day_of_month,
                day_of_year,
            };

            match observation.element {
                Element::MaxTemperature => {
                    if value >= MAX_PLAUSIBLE_TEMP {
                        self.stats.implausible_readings += 1;
                        continue;
                    }

                    self.country.record_max.observe(value, observation.year);
                    self.country.states[state_index]
                        .record_max
                        .observe(value, observation.year);

                    let station = self.country.station_mut(station_id);
                    station.years_with_temperature.insert(observation.year);
                    station.record_max.observe(value, date);

                    let year = station.current_year_mut().expect("year appended");
                    year.record_max.observe(value, observation.month);
                    self.streaks.observe_max(value, threshold_high, year);

                    let month = &mut year.months[month_index];
                    month.record_max.observe(value, day_of_month);
                    let day = &mut month.days[day_index];
                    day.max_temp = Some(value);
                    day.day_of_year = day_of_year;
                }
                Element::MinTemperature => {
                    if value <= MIN_PLAUSIBLE_TEMP {
                        self.stats.implausible_readings += 1;
                        continue;
                    }

                    self.country.record_min.observe(value, observation.year);
                    self.country.states[state_index]
                        .record_min
                        .observe(value, observation.year);

                    let station = self.country.station_mut(station_id);
                    station.years_with_temperature.insert(observation.year);
                    station.record_min.observe(value, date);

                    let year = station.current_year_mut().expect("year appended");
                    year.record_min.observe(value, observation.month);
                    self.streaks.observe_min(value, threshold_low, year);

                    let month = &mut year.months[month_index];
                    month.record_min.observe(value, day_of_month);
                    let day = &mut month.days[day_index];
                    day.min_temp = Some(value);
                    day.day_of_year = day_of_year;
                }
                Element::Snowfall => {
                    let station = self.country.station_mut(station_id);
                    if value > 0.0 {
                        station.record_snowfall.observe(value, date);
                    }

                    let year = station.current_year_mut().expect("year appended");
                    if value > 0.0 {
                        year.days_with_snow += 1;
                    } else {
                        year.days_without_snow += 1;
                    }

                    let day = &mut year.months[month_index].days[day_index];
                    day.snowfall = Some(value);
                    day.day_of_year = day_of_year;
                }
                Element::Precipitation => {
                    let station = self.country.station_mut(station_id);
                    if value > 0.0 {
                        station.record_precipitation.observe(value, date);
                    }

                    let year = station.current_year_mut().expect("year appended");
                    let day = &mut year.months[month_index].days[day_index];
                    day.precipitation = Some(value);
                    day.day_of_year = day_of_year;
                }
            }
        }
    }
}
