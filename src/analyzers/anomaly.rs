use std::collections::BTreeMap;

use tracing::info;

use crate::analyzers::regression::linear_regression;
use crate::analyzers::report::{
    AnomalyPoint, ClimateReport, RecordCounts, ScopeRecord, SeasonalMeans, StateSummary,
    StateYearExtremes, StationRecord, StationSummary, StreakMaxima, StreakMaximum, WindowEntry,
    WindowRankings, YearSummary,
};
use crate::config::AnalysisConfig;
use crate::models::hierarchy::{Country, Station, StationId};
use crate::processors::engine::IngestStats;
use crate::processors::extremes::{DailySlotRecords, Direction, ExtremeTracker, MonthlySlotRecords};
use crate::utils::constants::MONTHS_PER_YEAR;

/// How many windows each ranking keeps
const WINDOW_RANKING_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, Default)]
struct VariableSums {
    total: f64,
    count: u32,
}

impl VariableSums {
    fn add(&mut self, value: f64) {
        self.total += value;
        self.count += 1;
    }

    fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.total / self.count as f64)
    }
}

#[derive(Debug, Default)]
struct YearAccumulator {
    max_readings: VariableSums,
    min_readings: VariableSums,
    max_deviation_total: f64,
    min_deviation_total: f64,
    total_precipitation: f64,
    total_snowfall: f64,
    days_at_precipitation_target: u32,
    days_at_snow_target: u32,
    days_with_snow: u32,
    days_without_snow: u32,
    active_stations: u32,
}

#[derive(Debug, Default)]
struct MonthAccumulator {
    /// The "mean" variable: every plausible max and min reading combined
    all: VariableSums,
    max: VariableSums,
    min: VariableSums,
}

#[derive(Debug, Default)]
struct StateYearAccumulator {
    max_deviation: VariableSums,
    min_deviation: VariableSums,
    hottest_max: Option<f32>,
    coldest_min: Option<f32>,
}

#[derive(Debug, Default)]
struct StreakLeader {
    length: u32,
    station: Option<StationId>,
}

impl StreakLeader {
    /// Strictly longer takes the lead; the first station to reach a
    /// length keeps it against later ties
    fn challenge(&mut self, length: u32, station: StationId) {
        if length > self.length {
            self.length = length;
            self.station = Some(station);
        }
    }
}

#[derive(Debug, Default)]
struct StreakLeaders {
    above_high: StreakLeader,
    below_high: StreakLeader,
    below_low: StreakLeader,
    above_low: StreakLeader,
}

/// Second-pass aggregation context. Owns every accumulator map the
/// derivation needs, scoped to one analysis run.
#[derive(Debug, Default)]
struct Accumulators {
    years: BTreeMap<u16, YearAccumulator>,
    months: BTreeMap<(u16, u8), MonthAccumulator>,
    state_years: Vec<BTreeMap<u16, StateYearAccumulator>>,
    record_counts: BTreeMap<u16, RecordCounts>,
    streaks: BTreeMap<u16, StreakLeaders>,
}

/// Derives anomalies, record counts, streak leaders, seasonal means and
/// trend lines from the completed hierarchy. Runs only after the full
/// observation stream has been consumed; baselines and all-time records
/// are not final before that.
pub struct ClimateAnalyzer {
    config: AnalysisConfig,
}

impl ClimateAnalyzer {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn analyze(&self, country: &Country, stats: IngestStats) -> ClimateReport {
        let mut acc = Accumulators {
            state_years: (0..country.states.len()).map(|_| BTreeMap::new()).collect(),
            ..Default::default()
        };
        let mut stations = Vec::with_capacity(country.station_count());

        for (state_index, station_id, station) in country.iter_stations() {
            self.scan_station(&mut acc, state_index, station_id, station);
            stations.push(summarize_station(station));
        }

        info!(
            years = acc.years.len(),
            states = country.states.len(),
            "second pass complete"
        );

        self.build_report(country, stats, acc, stations)
    }

    /// Fold one station's completed hierarchy into the accumulators
    fn scan_station(
        &self,
        acc: &mut Accumulators,
        state_index: usize,
        station_id: StationId,
        station: &Station,
    ) {
        let baseline = station.baseline.finalize();
        let mut daily_max = DailySlotRecords::new(Direction::Highest);
        let mut daily_min = DailySlotRecords::new(Direction::Lowest);
        let mut monthly_max = MonthlySlotRecords::new(Direction::Highest);
        let mut monthly_min = MonthlySlotRecords::new(Direction::Lowest);

        for year in &station.years {
            let number = year.number;

            if station.years_with_temperature.contains(&number) {
                acc.years.entry(number).or_default().active_stations += 1;
            }

            if year.days_with_snow > 0 || year.days_without_snow > 0 {
                let year_acc = acc.years.entry(number).or_default();
                year_acc.days_with_snow += year.days_with_snow;
                year_acc.days_without_snow += year.days_without_snow;
            }

            let leaders = acc.streaks.entry(number).or_default();
            leaders
                .above_high
                .challenge(year.longest_runs.above_high, station_id);
            leaders
                .below_high
                .challenge(year.longest_runs.below_high, station_id);
            leaders
                .below_low
                .challenge(year.longest_runs.below_low, station_id);
            leaders
                .above_low
                .challenge(year.longest_runs.above_low, station_id);

            for (month_index, month) in year.months.iter().enumerate() {
                for (day_index, day) in month.days.iter().enumerate() {
                    if let Some(reading) = day.max_temp {
                        let deviation = baseline.max_deviation(month_index, reading) as f64;

                        let year_acc = acc.years.entry(number).or_default();
                        year_acc.max_readings.add(reading as f64);
                        year_acc.max_deviation_total += deviation;

                        let month_acc =
                            acc.months.entry((number, month_index as u8)).or_default();
                        month_acc.all.add(reading as f64);
                        month_acc.max.add(reading as f64);

                        let state_acc =
                            acc.state_years[state_index].entry(number).or_default();
                        state_acc.max_deviation.add(deviation);
                        state_acc.hottest_max =
                            Some(state_acc.hottest_max.map_or(reading, |h| h.max(reading)));

                        daily_max.observe(month_index, day_index, reading, number);
                        monthly_max.observe(month_index, reading, number);
                    }

                    if let Some(reading) = day.min_temp {
                        let deviation = baseline.min_deviation(month_index, reading) as f64;

                        let year_acc = acc.years.entry(number).or_default();
                        year_acc.min_readings.add(reading as f64);
                        year_acc.min_deviation_total += deviation;

                        let month_acc =
                            acc.months.entry((number, month_index as u8)).or_default();
                        month_acc.all.add(reading as f64);
                        month_acc.min.add(reading as f64);

                        let state_acc =
                            acc.state_years[state_index].entry(number).or_default();
                        state_acc.min_deviation.add(deviation);
                        state_acc.coldest_min =
                            Some(state_acc.coldest_min.map_or(reading, |c| c.min(reading)));

                        daily_min.observe(month_index, day_index, reading, number);
                        monthly_min.observe(month_index, reading, number);
                    }

                    if let Some(snow) = day.snowfall {
                        let year_acc = acc.years.entry(number).or_default();
                        year_acc.total_snowfall += snow as f64;
                        if snow >= self.config.snow_target {
                            year_acc.days_at_snow_target += 1;
                        }
                    }

                    if let Some(precipitation) = day.precipitation {
                        let year_acc = acc.years.entry(number).or_default();
                        year_acc.total_precipitation += precipitation as f64;
                        if precipitation >= self.config.precipitation_target {
                            year_acc.days_at_precipitation_target += 1;
                        }
                    }
                }
            }
        }

        fold_slot_counts(acc, &daily_max, &daily_min, &monthly_max, &monthly_min);

        if let Some(record) = station.record_max.best() {
            acc.record_counts.entry(record.at.year).or_default().station_max += 1;
        }
        if let Some(record) = station.record_min.best() {
            acc.record_counts.entry(record.at.year).or_default().station_min += 1;
        }
        if let Some(record) = station.record_precipitation.best() {
            acc.record_counts
                .entry(record.at.year)
                .or_default()
                .station_precipitation += 1;
        }
        if let Some(record) = station.record_snowfall.best() {
            acc.record_counts
                .entry(record.at.year)
                .or_default()
                .station_snowfall += 1;
        }
    }

    fn build_report(
        &self,
        country: &Country,
        stats: IngestStats,
        acc: Accumulators,
        stations: Vec<StationSummary>,
    ) -> ClimateReport {
        let years: Vec<YearSummary> = acc
            .years
            .iter()
            .map(|(&number, year_acc)| {
                self.summarize_year(country, &acc, number, year_acc)
            })
            .collect();

        let mean_points: Vec<(f64, f64)> = years
            .iter()
            .filter_map(|y| y.mean_anomaly.map(|a| (y.year as f64, a)))
            .collect();
        let mean_anomaly_trend = linear_regression(&mean_points);

        let mut monthly_mean_trends = [None; MONTHS_PER_YEAR];
        for (month_index, trend) in monthly_mean_trends.iter_mut().enumerate() {
            let points: Vec<(f64, f64)> = acc
                .months
                .iter()
                .filter(|((_, mi), _)| *mi as usize == month_index)
                .filter_map(|((year, _), m)| m.all.mean().map(|v| (*year as f64, v)))
                .collect();
            *trend = linear_regression(&points);
        }

        let states = country
            .states
            .iter()
            .enumerate()
            .map(|(index, state)| {
                self.summarize_state(state, &acc.state_years[index])
            })
            .collect();

        ClimateReport {
            config: self.config.clone(),
            stats,
            country_record_max: scope_record(&country.record_max),
            country_record_min: scope_record(&country.record_min),
            stations,
            states,
            years,
            mean_anomaly_trend,
            monthly_mean_trends,
            mean_windows: rank_windows(&acc.months, |m| m.all.mean(), self.config.months_window),
            max_windows: rank_windows(&acc.months, |m| m.max.mean(), self.config.months_window),
            min_windows: rank_windows(&acc.months, |m| m.min.mean(), self.config.months_window),
        }
    }

    fn summarize_year(
        &self,
        country: &Country,
        acc: &Accumulators,
        number: u16,
        year_acc: &YearAccumulator,
    ) -> YearSummary {
        let max_anomaly = (year_acc.max_readings.count > 0)
            .then(|| year_acc.max_deviation_total / year_acc.max_readings.count as f64);
        let min_anomaly = (year_acc.min_readings.count > 0)
            .then(|| year_acc.min_deviation_total / year_acc.min_readings.count as f64);
        let mean_anomaly = match (max_anomaly, min_anomaly) {
            (Some(max), Some(min)) => Some((max + min) / 2.0),
            _ => None,
        };

        let mut monthly_means = [None; MONTHS_PER_YEAR];
        for (month_index, mean) in monthly_means.iter_mut().enumerate() {
            *mean = acc
                .months
                .get(&(number, month_index as u8))
                .and_then(|m| m.all.mean());
        }

        let valid_months: Vec<f64> = monthly_means.iter().flatten().copied().collect();
        let annual_mean = (!valid_months.is_empty())
            .then(|| valid_months.iter().sum::<f64>() / valid_months.len() as f64);

        let streaks = acc
            .streaks
            .get(&number)
            .map(|leaders| StreakMaxima {
                above_high: streak_maximum(country, &leaders.above_high),
                below_high: streak_maximum(country, &leaders.below_high),
                below_low: streak_maximum(country, &leaders.below_low),
                above_low: streak_maximum(country, &leaders.above_low),
            })
            .unwrap_or_default();

        YearSummary {
            year: number,
            active_stations: year_acc.active_stations,
            mean_anomaly,
            max_anomaly,
            min_anomaly,
            annual_mean,
            monthly_means,
            seasonal: seasonal_means(&acc.months, number),
            records: acc.record_counts.get(&number).copied().unwrap_or_default(),
            streaks,
            total_precipitation: year_acc.total_precipitation,
            total_snowfall: year_acc.total_snowfall,
            days_at_precipitation_target: year_acc.days_at_precipitation_target,
            days_at_snow_target: year_acc.days_at_snow_target,
            days_with_snow: year_acc.days_with_snow,
            days_without_snow: year_acc.days_without_snow,
        }
    }

    fn summarize_state(
        &self,
        state: &crate::models::hierarchy::State,
        years: &BTreeMap<u16, StateYearAccumulator>,
    ) -> StateSummary {
        let anomalies: Vec<AnomalyPoint> = years
            .iter()
            .filter(|(&year, _)| year >= self.config.modern_start_year)
            .filter_map(|(&year, state_acc)| {
                match (
                    state_acc.max_deviation.mean(),
                    state_acc.min_deviation.mean(),
                ) {
                    (Some(max), Some(min)) => Some(AnomalyPoint {
                        year,
                        anomaly: (max + min) / 2.0,
                    }),
                    _ => None,
                }
            })
            .collect();

        let points: Vec<(f64, f64)> = anomalies
            .iter()
            .map(|p| (p.year as f64, p.anomaly))
            .collect();

        let extremes_by_year = years
            .iter()
            .map(|(&year, state_acc)| StateYearExtremes {
                year,
                hottest_max: state_acc.hottest_max,
                coldest_min: state_acc.coldest_min,
            })
            .collect();

        StateSummary {
            code: state.code.clone(),
            stations: state.stations.len() as u32,
            record_max: scope_record(&state.record_max),
            record_min: scope_record(&state.record_min),
            anomalies,
            anomaly_trend: linear_regression(&points),
            extremes_by_year,
        }
    }
}

fn scope_record(tracker: &ExtremeTracker<u16>) -> Option<ScopeRecord> {
    tracker.best().map(|record| ScopeRecord {
        value: record.value,
        year: record.at,
    })
}

fn summarize_station(station: &Station) -> StationSummary {
    let record = |tracker: &ExtremeTracker<crate::models::hierarchy::ObservationDate>| {
        tracker
            .best()
            .map(|record| StationRecord::new(record.value, record.at))
    };

    StationSummary {
        id: station.info.id.clone(),
        name: station.info.name.clone(),
        state: station.info.state.clone(),
        first_year: station.first_year_with_temperature(),
        last_year: station.last_year_with_temperature(),
        record_max: record(&station.record_max),
        record_min: record(&station.record_min),
        record_precipitation: record(&station.record_precipitation),
        record_snowfall: record(&station.record_snowfall),
    }
}

fn streak_maximum(country: &Country, leader: &StreakLeader) -> StreakMaximum {
    StreakMaximum {
        length: leader.length,
        station: leader.station.map(|id| {
            let info = &country.station(id).info;
            if info.name.is_empty() {
                info.id.clone()
            } else {
                info.name.clone()
            }
        }),
    }
}

fn fold_slot_counts(
    acc: &mut Accumulators,
    daily_max: &DailySlotRecords,
    daily_min: &DailySlotRecords,
    monthly_max: &MonthlySlotRecords,
    monthly_min: &MonthlySlotRecords,
) {
    let mut counts = BTreeMap::new();
    daily_max.fold_counts_into(&mut counts);
    for (year, count) in counts {
        acc.record_counts.entry(year).or_default().daily_max += count;
    }

    let mut counts = BTreeMap::new();
    daily_min.fold_counts_into(&mut counts);
    for (year, count) in counts {
        acc.record_counts.entry(year).or_default().daily_min += count;
    }

    let mut counts = BTreeMap::new();
    monthly_max.fold_counts_into(&mut counts);
    for (year, count) in counts {
        acc.record_counts.entry(year).or_default().monthly_max += count;
    }

    let mut counts = BTreeMap::new();
    monthly_min.fold_counts_into(&mut counts);
    for (year, count) in counts {
        acc.record_counts.entry(year).or_default().monthly_min += count;
    }
}

/// Seasonal mean = pooled mean of the three months' readings; any month
/// without a reading makes the whole season undefined
fn seasonal_means(months: &BTreeMap<(u16, u8), MonthAccumulator>, year: u16) -> SeasonalMeans {
    let season = |parts: [(u16, u8); 3]| -> Option<f64> {
        let mut total = 0.0;
        let mut count = 0u32;
        for (y, month_index) in parts {
            let month = months.get(&(y, month_index))?;
            if month.all.count == 0 {
                return None;
            }
            total += month.all.total;
            count += month.all.count;
        }
        Some(total / count as f64)
    };

    SeasonalMeans {
        winter: (year > 0)
            .then(|| season([(year - 1, 11), (year, 0), (year, 1)]))
            .flatten(),
        spring: season([(year, 2), (year, 3), (year, 4)]),
        summer: season([(year, 5), (year, 6), (year, 7)]),
        fall: season([(year, 8), (year, 9), (year, 10)]),
    }
}

/// Rank every rolling window of `window` consecutive months with data.
/// A month missing the variable breaks the run.
fn rank_windows(
    months: &BTreeMap<(u16, u8), MonthAccumulator>,
    pick: impl Fn(&MonthAccumulator) -> Option<f64>,
    window: usize,
) -> WindowRankings {
    let mut run: Vec<(u32, f64)> = Vec::new();
    let mut entries: Vec<WindowEntry> = Vec::new();

    for ((year, month_index), month) in months {
        let mean = match pick(month) {
            Some(mean) => mean,
            None => {
                run.clear();
                continue;
            }
        };

        let absolute = *year as u32 * MONTHS_PER_YEAR as u32 + *month_index as u32;
        if let Some(&(previous, _)) = run.last() {
            if absolute != previous + 1 {
                run.clear();
            }
        }
        run.push((absolute, mean));

        if run.len() >= window {
            let tail = &run[run.len() - window..];
            let mean = tail.iter().map(|(_, m)| m).sum::<f64>() / window as f64;
            entries.push(WindowEntry {
                end_year: *year,
                end_month: month_index + 1,
                mean,
            });
        }
    }

    let mut hottest = entries.clone();
    hottest.sort_by(|a, b| b.mean.total_cmp(&a.mean));
    hottest.truncate(WINDOW_RANKING_LIMIT);

    let mut coldest = entries;
    coldest.sort_by(|a, b| a.mean.total_cmp(&b.mean));
    coldest.truncate(WINDOW_RANKING_LIMIT);

    WindowRankings { hottest, coldest }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn month_with(mean_readings: &[f64]) -> MonthAccumulator {
        let mut acc = MonthAccumulator::default();
        for &reading in mean_readings {
            acc.all.add(reading);
        }
        acc
    }

    #[test]
    fn test_seasonal_mean_requires_all_three_months() {
        let mut months = BTreeMap::new();
        months.insert((1936, 5), month_with(&[30.0, 32.0]));
        // July missing entirely
        months.insert((1936, 7), month_with(&[31.0]));

        let seasons = seasonal_means(&months, 1936);
        assert_eq!(seasons.summer, None);

        months.insert((1936, 6), month_with(&[35.0]));
        let seasons = seasonal_means(&months, 1936);
        assert_eq!(seasons.summer, Some((30.0 + 32.0 + 35.0 + 31.0) / 4.0));
    }

    #[test]
    fn test_winter_spans_previous_december() {
        let mut months = BTreeMap::new();
        months.insert((1936, 0), month_with(&[0.0]));
        months.insert((1936, 1), month_with(&[2.0]));

        // Without the previous December the season is undefined
        assert_eq!(seasonal_means(&months, 1936).winter, None);

        months.insert((1935, 11), month_with(&[-2.0]));
        assert_eq!(seasonal_means(&months, 1936).winter, Some(0.0));
    }

    #[test]
    fn test_streak_leader_first_wins() {
        let mut leader = StreakLeader::default();
        leader.challenge(5, StationId(0));
        leader.challenge(5, StationId(1));
        assert_eq!(leader.station, Some(StationId(0)));

        leader.challenge(7, StationId(2));
        assert_eq!(leader.station, Some(StationId(2)));
        assert_eq!(leader.length, 7);
    }

    #[test]
    fn test_zero_length_streak_names_no_station() {
        let mut leader = StreakLeader::default();
        leader.challenge(0, StationId(3));
        assert_eq!(leader.station, None);
    }

    #[test]
    fn test_rank_windows_over_consecutive_months() {
        let mut months = BTreeMap::new();
        for month_index in 0u8..12 {
            months.insert((1936, month_index), month_with(&[month_index as f64]));
        }
        for month_index in 0u8..12 {
            months.insert((1937, month_index), month_with(&[month_index as f64 + 5.0]));
        }

        let rankings = rank_windows(&months, |m| m.all.mean(), 12);
        // 13 possible 12-month windows across the two years
        assert_eq!(rankings.hottest.len(), 10);
        let top = rankings.hottest[0];
        assert_eq!(top.end_year, 1937);
        assert_eq!(top.end_month, 12);
        let bottom = rankings.coldest[0];
        assert_eq!(bottom.end_year, 1936);
        assert_eq!(bottom.end_month, 12);
    }

    #[test]
    fn test_rank_windows_gap_breaks_run() {
        let mut months = BTreeMap::new();
        for month_index in [0u8, 1, 3, 4, 5] {
            months.insert((1936, month_index), month_with(&[10.0]));
        }

        // No three consecutive months spanning the February gap
        let rankings = rank_windows(&months, |m| m.all.mean(), 3);
        assert_eq!(rankings.hottest.len(), 1);
        assert_eq!(rankings.hottest[0].end_month, 6);
    }
}
