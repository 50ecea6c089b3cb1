use serde::Serialize;

use crate::utils::constants::{MONTHS_PER_YEAR, TEMPERATURE_SCALE};

/// Running per-month sums of raw tenths-of-degree readings inside the
/// baseline window, kept separately for the min and max variables.
///
/// Raw integer tenths accumulate exactly; division happens once at
/// finalization.
#[derive(Debug, Clone, Default)]
pub struct BaselineAccumulator {
    max_totals: [i64; MONTHS_PER_YEAR],
    max_counts: [u32; MONTHS_PER_YEAR],
    min_totals: [i64; MONTHS_PER_YEAR],
    min_counts: [u32; MONTHS_PER_YEAR],
}

impl BaselineAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_max(&mut self, month_index: usize, raw_tenths: i32) {
        self.max_totals[month_index] += raw_tenths as i64;
        self.max_counts[month_index] += 1;
    }

    pub fn add_min(&mut self, month_index: usize, raw_tenths: i32) {
        self.min_totals[month_index] += raw_tenths as i64;
        self.min_counts[month_index] += 1;
    }

    pub fn max_count(&self, month_index: usize) -> u32 {
        self.max_counts[month_index]
    }

    pub fn min_count(&self, month_index: usize) -> u32 {
        self.min_counts[month_index]
    }

    /// Per-month climatological averages in deg C; `None` where the
    /// window held no readings
    pub fn finalize(&self) -> BaselineAverages {
        let mut averages = BaselineAverages::default();

        for month in 0..MONTHS_PER_YEAR {
            if self.max_counts[month] > 0 {
                averages.max[month] = Some(
                    self.max_totals[month] as f32 / self.max_counts[month] as f32
                        / TEMPERATURE_SCALE,
                );
            }
            if self.min_counts[month] > 0 {
                averages.min[month] = Some(
                    self.min_totals[month] as f32 / self.min_counts[month] as f32
                        / TEMPERATURE_SCALE,
                );
            }
        }

        averages
    }
}

/// Finalized climatological reference for one station
#[derive(Debug, Clone, Default, Serialize)]
pub struct BaselineAverages {
    pub max: [Option<f32>; MONTHS_PER_YEAR],
    pub min: [Option<f32>; MONTHS_PER_YEAR],
}

impl BaselineAverages {
    /// Deviation of a max-temperature reading from its month's baseline;
    /// a station with no baseline for the month contributes zero
    /// deviation, not an excluded sample
    pub fn max_deviation(&self, month_index: usize, reading: f32) -> f32 {
        match self.max[month_index] {
            Some(average) => reading - average,
            None => 0.0,
        }
    }

    pub fn min_deviation(&self, month_index: usize, reading: f32) -> f32 {
        match self.min[month_index] {
            Some(average) => reading - average,
            None => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average_is_exact() {
        // 20 January readings of 100, 102, ... 138 tenths sum to 2380,
        // so the average is (2380 / 20) / 10 = 11.9 C
        let mut acc = BaselineAccumulator::new();
        for i in 0..20 {
            acc.add_max(0, 100 + i * 2);
        }

        let averages = acc.finalize();
        assert_eq!(averages.max[0], Some(11.9));
        assert_eq!(averages.max[1], None);
    }

    #[test]
    fn test_zero_count_month_is_unknown() {
        let acc = BaselineAccumulator::new();
        let averages = acc.finalize();
        assert!(averages.max.iter().all(Option::is_none));
        assert!(averages.min.iter().all(Option::is_none));
    }

    #[test]
    fn test_unknown_baseline_contributes_zero_deviation() {
        let averages = BaselineAverages::default();
        assert_eq!(averages.max_deviation(5, 31.0), 0.0);
        assert_eq!(averages.min_deviation(5, -4.0), 0.0);
    }

    #[test]
    fn test_deviation_against_known_baseline() {
        let mut acc = BaselineAccumulator::new();
        acc.add_min(3, 50);
        acc.add_min(3, 70); // average 6.0 C

        let averages = acc.finalize();
        assert_eq!(averages.min[3], Some(6.0));
        assert_eq!(averages.min_deviation(3, 8.5), 2.5);
    }

    #[test]
    fn test_negative_totals_accumulate() {
        let mut acc = BaselineAccumulator::new();
        acc.add_min(0, -215);
        acc.add_min(0, -185);

        let averages = acc.finalize();
        assert_eq!(averages.min[0], Some(-20.0));
    }
}
