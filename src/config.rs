use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{ProcessingError, Result};

/// Knobs consumed by the aggregation engine and the second-pass analyzer.
///
/// Fixed-width field offsets are architecture constants in
/// `utils::constants`, not configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AnalysisConfig {
    /// First year of the climatological reference window (inclusive)
    #[validate(range(min = 1700, max = 2200))]
    pub baseline_start_year: u16,

    /// Last year of the climatological reference window (inclusive)
    #[validate(range(min = 1700, max = 2200))]
    pub baseline_end_year: u16,

    /// High threshold tested against daily maximum temperatures (deg C)
    #[validate(range(min = -60.0, max = 60.0))]
    pub threshold_high: f32,

    /// Low threshold tested against daily minimum temperatures (deg C)
    #[validate(range(min = -60.0, max = 60.0))]
    pub threshold_low: f32,

    /// Observations before this year are not folded into statistics
    #[validate(range(min = 1700, max = 2200))]
    pub first_year: u16,

    /// Observations after this year are not folded (open-ended when unset)
    pub last_year: Option<u16>,

    /// Daily precipitation at or above this counts as a target day (cm)
    #[validate(range(min = 0.0))]
    pub precipitation_target: f32,

    /// Daily snowfall at or above this counts as a target day (cm)
    #[validate(range(min = 0.0))]
    pub snow_target: f32,

    /// Rolling window length for hottest/coldest period rankings
    #[validate(range(min = 1, max = 120))]
    pub months_window: usize,

    /// State anomaly series start here, aligning networks whose earliest
    /// instrumented year differs
    #[validate(range(min = 1700, max = 2200))]
    pub modern_start_year: u16,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            baseline_start_year: 1840,
            baseline_end_year: 2100,
            threshold_high: 37.8,
            threshold_low: -18.0,
            first_year: 1850,
            last_year: None,
            precipitation_target: 1.0,
            snow_target: 1.0,
            months_window: 12,
            modern_start_year: 1895,
        }
    }
}

impl AnalysisConfig {
    pub fn validated(self) -> Result<Self> {
        self.validate()?;

        if self.baseline_start_year > self.baseline_end_year {
            return Err(ProcessingError::Config(format!(
                "baseline window {}-{} is inverted",
                self.baseline_start_year, self.baseline_end_year
            )));
        }

        if let Some(last) = self.last_year {
            if self.first_year > last {
                return Err(ProcessingError::Config(format!(
                    "year range {}-{} is inverted",
                    self.first_year, last
                )));
            }
        }

        Ok(self)
    }

    pub fn baseline_contains(&self, year: u16) -> bool {
        year >= self.baseline_start_year && year <= self.baseline_end_year
    }

    pub fn year_in_scope(&self, year: u16) -> bool {
        year >= self.first_year && self.last_year.map_or(true, |last| year <= last)
    }
}
