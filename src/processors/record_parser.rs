use crate::analyzers::baseline::BaselineAccumulator;
use crate::config::AnalysisConfig;
use crate::error::{ProcessingError, Result};
use crate::models::observation::{Element, Observation};
use crate::utils::constants::{
    COUNTRY_CODE_END, DAY_FIELD_WIDTH, ELEMENT_END, ELEMENT_START, FIRST_VALUE_START,
    MAX_DAYS_IN_MONTH, MAX_PLAUSIBLE_TEMP, MIN_PLAUSIBLE_TEMP, MIN_RECORD_WIDTH, MISSING_VALUE,
    MONTH_END, MONTH_START, PRECIPITATION_SCALE, SNOWFALL_SCALE, STATION_ID_END, STATION_ID_START,
    TEMPERATURE_SCALE, VALUE_WIDTH, YEAR_END, YEAR_START,
};

/// Decodes one fixed-width GHCN-Daily line into a typed observation.
///
/// While scanning TMIN/TMAX values it also accumulates raw tenths into the
/// owning station's baseline sums when the observation year falls inside
/// the baseline window; both operations walk the same fixed-width fields,
/// so the coupling saves a second scan.
#[derive(Debug, Clone)]
pub struct RecordParser {
    baseline_start_year: u16,
    baseline_end_year: u16,
}

impl RecordParser {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            baseline_start_year: config.baseline_start_year,
            baseline_end_year: config.baseline_end_year,
        }
    }

    /// Station id prefix of a line, available before full decoding so the
    /// engine can resolve the owning station first
    pub fn peek_station_id(line: &str) -> Option<&str> {
        line.get(STATION_ID_START..STATION_ID_END)
    }

    pub fn parse(&self, line: &str, baseline: &mut BaselineAccumulator) -> Result<Observation> {
        if line.len() < MIN_RECORD_WIDTH {
            return Err(ProcessingError::RecordTooShort { length: line.len() });
        }

        let station_id = slice(line, STATION_ID_START, STATION_ID_END)?;
        let country_code = slice(line, STATION_ID_START, COUNTRY_CODE_END)?;

        let year = slice(line, YEAR_START, YEAR_END)?
            .trim()
            .parse::<u16>()
            .map_err(|_| invalid("year", line, YEAR_START, YEAR_END))?;

        let month = slice(line, MONTH_START, MONTH_END)?
            .trim()
            .parse::<u8>()
            .map_err(|_| invalid("month", line, MONTH_START, MONTH_END))?;
        if !(1..=12).contains(&month) {
            return Err(ProcessingError::InvalidFormat(format!(
                "month {} out of range",
                month
            )));
        }

        let element: Element = slice(line, ELEMENT_START, ELEMENT_END)?.trim().parse()?;

        let mut values = [None; MAX_DAYS_IN_MONTH];
        let in_baseline_window =
            year >= self.baseline_start_year && year <= self.baseline_end_year;
        let month_index = (month as usize) - 1;

        for (day_index, value) in values.iter_mut().enumerate() {
            let start = FIRST_VALUE_START + day_index * DAY_FIELD_WIDTH;
            let raw = match slice(line, start, start + VALUE_WIDTH)?.trim().parse::<i32>() {
                Ok(raw) => raw,
                // A single garbled day value is dropped; the rest of the
                // observation stands
                Err(_) => continue,
            };

            if raw == MISSING_VALUE {
                continue;
            }

            *value = Some(match element {
                Element::MaxTemperature => {
                    let temperature = raw as f32 / TEMPERATURE_SCALE;
                    if in_baseline_window && temperature < MAX_PLAUSIBLE_TEMP {
                        baseline.add_max(month_index, raw);
                    }
                    temperature
                }
                Element::MinTemperature => {
                    let temperature = raw as f32 / TEMPERATURE_SCALE;
                    if in_baseline_window && temperature > MIN_PLAUSIBLE_TEMP {
                        baseline.add_min(month_index, raw);
                    }
                    temperature
                }
                Element::Snowfall => raw as f32 / SNOWFALL_SCALE,
                Element::Precipitation => raw as f32 / PRECIPITATION_SCALE,
            });
        }

        Ok(Observation {
            station_id: station_id.to_string(),
            country_code: country_code.to_string(),
            year,
            month,
            element,
            values,
        })
    }
}

fn slice(line: &str, start: usize, end: usize) -> Result<&str> {
    line.get(start..end).ok_or_else(|| {
        ProcessingError::InvalidFormat(format!("field at {}..{} is not valid UTF-8", start, end))
    })
}

fn invalid(field: &str, line: &str, start: usize, end: usize) -> ProcessingError {
    ProcessingError::InvalidFormat(format!(
        "unparseable {}: '{}'",
        field,
        &line[start..end.min(line.len())]
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a observation line from raw day values, padding with the
    /// missing sentinel out to the fixed width
    fn make_line(station: &str, year: u16, month: u8, element: &str, raws: &[i32]) -> String {
        let mut line = format!("{:<11}{:04}{:02}{}", station, year, month, element);
        for day in 0..MAX_DAYS_IN_MONTH {
            let raw = raws.get(day).copied().unwrap_or(MISSING_VALUE);
            line.push_str(&format!("{:5}   ", raw));
        }
        line
    }

    fn test_config() -> AnalysisConfig {
        AnalysisConfig {
            baseline_start_year: 1981,
            baseline_end_year: 2000,
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_scales_temperatures() {
        let parser = RecordParser::new(&test_config());
        let mut baseline = BaselineAccumulator::new();

        let line = make_line("USC00342912", 1936, 7, "TMAX", &[350, 412, MISSING_VALUE, -55]);
        let obs = parser.parse(&line, &mut baseline).unwrap();

        assert_eq!(obs.station_id, "USC00342912");
        assert_eq!(obs.country_code, "US");
        assert_eq!(obs.year, 1936);
        assert_eq!(obs.month, 7);
        assert_eq!(obs.element, Element::MaxTemperature);
        assert_eq!(obs.value(0), Some(35.0));
        assert_eq!(obs.value(1), Some(41.2));
        assert_eq!(obs.value(2), None);
        assert_eq!(obs.value(3), Some(-5.5));
        assert_eq!(obs.value(4), None);
    }

    #[test]
    fn test_parse_scales_precipitation_and_snow() {
        let parser = RecordParser::new(&test_config());
        let mut baseline = BaselineAccumulator::new();

        let prcp = make_line("USC00342912", 1936, 7, "PRCP", &[254]);
        let obs = parser.parse(&prcp, &mut baseline).unwrap();
        assert_eq!(obs.value(0), Some(2.54));

        let snow = make_line("USC00342912", 1936, 1, "SNOW", &[120]);
        let obs = parser.parse(&snow, &mut baseline).unwrap();
        assert_eq!(obs.value(0), Some(12.0));
    }

    #[test]
    fn test_short_line_rejected() {
        let parser = RecordParser::new(&test_config());
        let mut baseline = BaselineAccumulator::new();

        let result = parser.parse("USC00342912193607TMAX  350", &mut baseline);
        assert!(matches!(
            result,
            Err(ProcessingError::RecordTooShort { .. })
        ));
    }

    #[test]
    fn test_unknown_element_rejected() {
        let parser = RecordParser::new(&test_config());
        let mut baseline = BaselineAccumulator::new();

        let line = make_line("USC00342912", 1936, 7, "SNWD", &[100]);
        assert!(matches!(
            parser.parse(&line, &mut baseline),
            Err(ProcessingError::UnknownElement(_))
        ));
    }

    #[test]
    fn test_garbled_day_value_dropped_silently() {
        let parser = RecordParser::new(&test_config());
        let mut baseline = BaselineAccumulator::new();

        let mut line = make_line("USC00342912", 1936, 7, "TMAX", &[350, 360]);
        // Corrupt the second day's value field
        let start = FIRST_VALUE_START + DAY_FIELD_WIDTH;
        line.replace_range(start..start + VALUE_WIDTH, "x#@!?");

        let obs = parser.parse(&line, &mut baseline).unwrap();
        assert_eq!(obs.value(0), Some(35.0));
        assert_eq!(obs.value(1), None);
    }

    #[test]
    fn test_baseline_accumulates_only_inside_window() {
        let parser = RecordParser::new(&test_config());
        let mut baseline = BaselineAccumulator::new();

        let inside = make_line("USC00342912", 1990, 1, "TMIN", &[-50, -70]);
        parser.parse(&inside, &mut baseline).unwrap();
        assert_eq!(baseline.min_count(0), 2);

        let outside = make_line("USC00342912", 1950, 1, "TMIN", &[-50]);
        parser.parse(&outside, &mut baseline).unwrap();
        assert_eq!(baseline.min_count(0), 2);
    }

    #[test]
    fn test_baseline_excludes_implausible_readings() {
        let parser = RecordParser::new(&test_config());
        let mut baseline = BaselineAccumulator::new();

        // 61.0 C is beyond the plausible maximum; -61.0 beyond the minimum
        let hot = make_line("USC00342912", 1990, 7, "TMAX", &[610, 350]);
        parser.parse(&hot, &mut baseline).unwrap();
        assert_eq!(baseline.max_count(6), 1);

        let cold = make_line("USC00342912", 1990, 1, "TMIN", &[-610, -150]);
        parser.parse(&cold, &mut baseline).unwrap();
        assert_eq!(baseline.min_count(0), 1);
    }

    #[test]
    fn test_month_out_of_range_rejected() {
        let parser = RecordParser::new(&test_config());
        let mut baseline = BaselineAccumulator::new();

        let line = make_line("USC00342912", 1936, 13, "TMAX", &[350]);
        assert!(parser.parse(&line, &mut baseline).is_err());
    }

    #[test]
    fn test_peek_station_id() {
        let line = make_line("USC00342912", 1936, 7, "TMAX", &[]);
        assert_eq!(RecordParser::peek_station_id(&line), Some("USC00342912"));
        assert_eq!(RecordParser::peek_station_id("short"), None);
    }
}
