use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::analyzers::report::{ClimateReport, StationRecord, WindowRankings};
use crate::error::Result;
use crate::utils::constants::MONTH_NAMES;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Csv,
    Json,
}

/// Serializes a finished report. The analyzer hands over plain structured
/// values; every formatting decision lives here.
pub struct ReportWriter {
    format: ReportFormat,
}

impl ReportWriter {
    pub fn new(format: ReportFormat) -> Self {
        Self { format }
    }

    pub fn write_to_path(&self, report: &ClimateReport, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = File::create(path)?;
        self.write(report, file)
    }

    pub fn write_to_stdout(&self, report: &ClimateReport) -> Result<()> {
        self.write(report, io::stdout().lock())
    }

    pub fn write<W: Write>(&self, report: &ClimateReport, out: W) -> Result<()> {
        match self.format {
            ReportFormat::Json => {
                serde_json::to_writer_pretty(out, report)?;
                Ok(())
            }
            ReportFormat::Csv => self.write_csv(report, out),
        }
    }

    fn write_csv<W: Write>(&self, report: &ClimateReport, out: W) -> Result<()> {
        let mut writer = csv::WriterBuilder::new().flexible(true).from_writer(out);

        self.write_station_section(report, &mut writer)?;
        self.write_year_section(report, &mut writer)?;
        self.write_state_section(report, &mut writer)?;
        self.write_trend_section(report, &mut writer)?;
        self.write_window_section("mean", &report.mean_windows, &mut writer)?;
        self.write_window_section("max", &report.max_windows, &mut writer)?;
        self.write_window_section("min", &report.min_windows, &mut writer)?;

        writer.flush()?;
        Ok(())
    }

    fn write_station_section<W: Write>(
        &self,
        report: &ClimateReport,
        writer: &mut csv::Writer<W>,
    ) -> Result<()> {
        writer.write_record([
            "station_id",
            "name",
            "state",
            "first_year",
            "last_year",
            "record_max_c",
            "record_max_date",
            "record_min_c",
            "record_min_date",
            "record_precip_cm",
            "record_precip_date",
            "record_snow_cm",
            "record_snow_date",
        ])?;

        for station in &report.stations {
            writer.write_record([
                station.id.clone(),
                station.name.clone(),
                station.state.clone(),
                opt_int(station.first_year),
                opt_int(station.last_year),
                record_value(&station.record_max),
                record_date(&station.record_max),
                record_value(&station.record_min),
                record_date(&station.record_min),
                record_value(&station.record_precipitation),
                record_date(&station.record_precipitation),
                record_value(&station.record_snowfall),
                record_date(&station.record_snowfall),
            ])?;
        }

        Ok(())
    }

    fn write_year_section<W: Write>(
        &self,
        report: &ClimateReport,
        writer: &mut csv::Writer<W>,
    ) -> Result<()> {
        let mut header: Vec<String> = [
            "year",
            "active_stations",
            "mean_anomaly_c",
            "max_anomaly_c",
            "min_anomaly_c",
            "annual_mean_c",
            "winter_c",
            "spring_c",
            "summer_c",
            "fall_c",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        header.extend(MONTH_NAMES.iter().map(|m| m.to_lowercase()));
        header.extend(
            [
                "daily_max_records",
                "daily_min_records",
                "monthly_max_records",
                "monthly_min_records",
                "station_max_records",
                "station_min_records",
                "precip_records",
                "snow_records",
                "longest_above_high",
                "longest_above_high_station",
                "longest_below_high",
                "longest_below_high_station",
                "longest_below_low",
                "longest_below_low_station",
                "longest_above_low",
                "longest_above_low_station",
                "total_precip_cm",
                "total_snow_cm",
                "precip_target_days",
                "snow_target_days",
                "snow_days",
                "snow_free_days",
            ]
            .iter()
            .map(|s| s.to_string()),
        );
        writer.write_record(&header)?;

        for year in &report.years {
            let mut row = vec![
                year.year.to_string(),
                year.active_stations.to_string(),
                opt_f64(year.mean_anomaly),
                opt_f64(year.max_anomaly),
                opt_f64(year.min_anomaly),
                opt_f64(year.annual_mean),
                opt_f64(year.seasonal.winter),
                opt_f64(year.seasonal.spring),
                opt_f64(year.seasonal.summer),
                opt_f64(year.seasonal.fall),
            ];
            row.extend(year.monthly_means.iter().map(|m| opt_f64(*m)));
            row.extend([
                year.records.daily_max.to_string(),
                year.records.daily_min.to_string(),
                year.records.monthly_max.to_string(),
                year.records.monthly_min.to_string(),
                year.records.station_max.to_string(),
                year.records.station_min.to_string(),
                year.records.station_precipitation.to_string(),
                year.records.station_snowfall.to_string(),
                year.streaks.above_high.length.to_string(),
                year.streaks.above_high.station.clone().unwrap_or_default(),
                year.streaks.below_high.length.to_string(),
                year.streaks.below_high.station.clone().unwrap_or_default(),
                year.streaks.below_low.length.to_string(),
                year.streaks.below_low.station.clone().unwrap_or_default(),
                year.streaks.above_low.length.to_string(),
                year.streaks.above_low.station.clone().unwrap_or_default(),
                format!("{:.2}", year.total_precipitation),
                format!("{:.2}", year.total_snowfall),
                year.days_at_precipitation_target.to_string(),
                year.days_at_snow_target.to_string(),
                year.days_with_snow.to_string(),
                year.days_without_snow.to_string(),
            ]);
            writer.write_record(&row)?;
        }

        Ok(())
    }

    fn write_state_section<W: Write>(
        &self,
        report: &ClimateReport,
        writer: &mut csv::Writer<W>,
    ) -> Result<()> {
        writer.write_record([
            "state",
            "stations",
            "record_max_c",
            "record_max_year",
            "record_min_c",
            "record_min_year",
            "anomaly_trend_c_per_century",
            "anomaly_trend_points",
        ])?;

        for state in &report.states {
            writer.write_record([
                state.code.clone(),
                state.stations.to_string(),
                state
                    .record_max
                    .map(|r| format!("{:.1}", r.value))
                    .unwrap_or_default(),
                state.record_max.map(|r| r.year.to_string()).unwrap_or_default(),
                state
                    .record_min
                    .map(|r| format!("{:.1}", r.value))
                    .unwrap_or_default(),
                state.record_min.map(|r| r.year.to_string()).unwrap_or_default(),
                state
                    .anomaly_trend
                    .map(|t| format!("{:.3}", t.slope * 100.0))
                    .unwrap_or_default(),
                state
                    .anomaly_trend
                    .map(|t| t.points.to_string())
                    .unwrap_or_default(),
            ])?;
        }

        Ok(())
    }

    fn write_trend_section<W: Write>(
        &self,
        report: &ClimateReport,
        writer: &mut csv::Writer<W>,
    ) -> Result<()> {
        let mut header = vec!["mean_anomaly_trend_c_per_century".to_string()];
        header.extend(
            MONTH_NAMES
                .iter()
                .map(|m| format!("{}_trend_c_per_century", m.to_lowercase())),
        );
        writer.write_record(&header)?;

        let mut row = vec![report
            .mean_anomaly_trend
            .map(|t| format!("{:.3}", t.slope * 100.0))
            .unwrap_or_default()];
        row.extend(
            report
                .monthly_mean_trends
                .iter()
                .map(|t| t.map(|t| format!("{:.3}", t.slope * 100.0)).unwrap_or_default()),
        );
        writer.write_record(&row)?;

        Ok(())
    }

    fn write_window_section<W: Write>(
        &self,
        variable: &str,
        windows: &WindowRankings,
        writer: &mut csv::Writer<W>,
    ) -> Result<()> {
        writer.write_record(["variable", "ranking", "rank", "end_year", "end_month", "mean_c"])?;

        for (rank, entry) in windows.hottest.iter().enumerate() {
            writer.write_record([
                variable.to_string(),
                "hottest".to_string(),
                (rank + 1).to_string(),
                entry.end_year.to_string(),
                entry.end_month.to_string(),
                format!("{:.3}", entry.mean),
            ])?;
        }

        for (rank, entry) in windows.coldest.iter().enumerate() {
            writer.write_record([
                variable.to_string(),
                "coldest".to_string(),
                (rank + 1).to_string(),
                entry.end_year.to_string(),
                entry.end_month.to_string(),
                format!("{:.3}", entry.mean),
            ])?;
        }

        Ok(())
    }
}

fn opt_int(value: Option<u16>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn opt_f64(value: Option<f64>) -> String {
    value.map(|v| format!("{:.3}", v)).unwrap_or_default()
}

fn record_value(record: &Option<StationRecord>) -> String {
    record
        .as_ref()
        .map(|r| format!("{:.1}", r.value))
        .unwrap_or_default()
}

fn record_date(record: &Option<StationRecord>) -> String {
    record
        .as_ref()
        .map(|r| format!("{} {}", r.date, r.year))
        .unwrap_or_default()
}
