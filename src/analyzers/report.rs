use serde::Serialize;

use crate::analyzers::regression::TrendLine;
use crate::config::AnalysisConfig;
use crate::models::hierarchy::ObservationDate;
use crate::processors::engine::IngestStats;
use crate::utils::calendar;
use crate::utils::constants::MONTHS_PER_YEAR;

/// A record value at country or state scope, with its owning year
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScopeRecord {
    pub value: f32,
    pub year: u16,
}

/// A station-scope record with its full calendar position
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationRecord {
    pub value: f32,
    pub year: u16,
    pub month: u8,
    pub day_of_month: u8,
    pub date: String,
}

impl StationRecord {
    pub fn new(value: f32, at: ObservationDate) -> Self {
        Self {
            value,
            year: at.year,
            month: at.month,
            day_of_month: at.day_of_month,
            date: calendar::date_label(at.year, at.day_of_year),
        }
    }
}

/// Identity plus all-time records for one station
#[derive(Debug, Clone, Serialize)]
pub struct StationSummary {
    pub id: String,
    pub name: String,
    pub state: String,
    pub first_year: Option<u16>,
    pub last_year: Option<u16>,
    pub record_max: Option<StationRecord>,
    pub record_min: Option<StationRecord>,
    pub record_precipitation: Option<StationRecord>,
    pub record_snowfall: Option<StationRecord>,
}

/// Seasonal mean temperatures for one year; a season with any of its
/// three months unobserved is `None`, never a partial average
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SeasonalMeans {
    pub winter: Option<f64>,
    pub spring: Option<f64>,
    pub summer: Option<f64>,
    pub fall: Option<f64>,
}

/// How many records, at each scope, belong to one year
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RecordCounts {
    /// Day-of-year slot records (tie-list membership)
    pub daily_max: u32,
    pub daily_min: u32,
    /// Calendar-month slot records
    pub monthly_max: u32,
    pub monthly_min: u32,
    /// Stations whose all-time record falls in this year
    pub station_max: u32,
    pub station_min: u32,
    pub station_precipitation: u32,
    pub station_snowfall: u32,
}

/// Longest streak of one kind across all stations in a year, and the
/// first station to have reached it
#[derive(Debug, Clone, Default, Serialize)]
pub struct StreakMaximum {
    pub length: u32,
    pub station: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct StreakMaxima {
    pub above_high: StreakMaximum,
    pub below_high: StreakMaximum,
    pub below_low: StreakMaximum,
    pub above_low: StreakMaximum,
}

#[derive(Debug, Clone, Serialize)]
pub struct YearSummary {
    pub year: u16,
    pub active_stations: u32,
    /// Combined anomaly: mean of the max- and min-variable anomalies
    pub mean_anomaly: Option<f64>,
    pub max_anomaly: Option<f64>,
    pub min_anomaly: Option<f64>,
    /// Mean of the valid monthly means
    pub annual_mean: Option<f64>,
    pub monthly_means: [Option<f64>; MONTHS_PER_YEAR],
    pub seasonal: SeasonalMeans,
    pub records: RecordCounts,
    pub streaks: StreakMaxima,
    pub total_precipitation: f64,
    pub total_snowfall: f64,
    pub days_at_precipitation_target: u32,
    pub days_at_snow_target: u32,
    pub days_with_snow: u32,
    pub days_without_snow: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AnomalyPoint {
    pub year: u16,
    pub anomaly: f64,
}

/// Hottest and coldest single readings within one state-year
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StateYearExtremes {
    pub year: u16,
    pub hottest_max: Option<f32>,
    pub coldest_min: Option<f32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StateSummary {
    pub code: String,
    pub stations: u32,
    pub record_max: Option<ScopeRecord>,
    pub record_min: Option<ScopeRecord>,
    /// Yearly combined anomalies from the modern record start onward
    pub anomalies: Vec<AnomalyPoint>,
    pub anomaly_trend: Option<TrendLine>,
    pub extremes_by_year: Vec<StateYearExtremes>,
}

/// One rolling window of consecutive months, identified by its last month
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WindowEntry {
    pub end_year: u16,
    pub end_month: u8,
    pub mean: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct WindowRankings {
    pub hottest: Vec<WindowEntry>,
    pub coldest: Vec<WindowEntry>,
}

/// Everything the second pass derives, as plain structured values; report
/// formatting lives entirely with the writers
#[derive(Debug, Clone, Serialize)]
pub struct ClimateReport {
    pub config: AnalysisConfig,
    pub stats: IngestStats,
    pub country_record_max: Option<ScopeRecord>,
    pub country_record_min: Option<ScopeRecord>,
    pub stations: Vec<StationSummary>,
    pub states: Vec<StateSummary>,
    pub years: Vec<YearSummary>,
    pub mean_anomaly_trend: Option<TrendLine>,
    pub monthly_mean_trends: [Option<TrendLine>; MONTHS_PER_YEAR],
    /// Rolling-window rankings over the mean, max and min monthly series
    pub mean_windows: WindowRankings,
    pub max_windows: WindowRankings,
    pub min_windows: WindowRankings,
}

impl ClimateReport {
    pub fn year(&self, number: u16) -> Option<&YearSummary> {
        self.years.iter().find(|y| y.year == number)
    }

    pub fn state(&self, code: &str) -> Option<&StateSummary> {
        self.states.iter().find(|s| s.code == code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_station_record_date_label() {
        let record = StationRecord::new(
            48.9,
            ObservationDate {
                year: 1936,
                month: 7,
                day_of_month: 18,
                day_of_year: 200,
            },
        );
        assert_eq!(record.date, "Jul 18");
        assert_eq!(record.year, 1936);
    }
}
