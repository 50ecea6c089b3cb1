/// Calendar dimensions
pub const MAX_DAYS_IN_MONTH: usize = 31;
pub const MONTHS_PER_YEAR: usize = 12;
pub const DAYS_PER_YEAR: u32 = 366;

/// Slot lengths per month; February carries its leap-year maximum
pub const DAYS_PER_MONTH: [u32; MONTHS_PER_YEAR] = [31, 29, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

pub const MONTH_NAMES: [&str; MONTHS_PER_YEAR] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Plausibility bounds for daily temperatures (deg C); readings outside
/// these are instrument glitches and contribute to no statistic
pub const MAX_PLAUSIBLE_TEMP: f32 = 55.0;
pub const MIN_PLAUSIBLE_TEMP: f32 = -60.0;

/// Raw field value marking a missing measurement
pub const MISSING_VALUE: i32 = -9999;

/// GHCN-Daily observation line layout (byte offsets)
pub const STATION_ID_START: usize = 0;
pub const STATION_ID_END: usize = 11;
pub const COUNTRY_CODE_END: usize = 2;
pub const YEAR_START: usize = 11;
pub const YEAR_END: usize = 15;
pub const MONTH_START: usize = 15;
pub const MONTH_END: usize = 17;
pub const ELEMENT_START: usize = 17;
pub const ELEMENT_END: usize = 21;
pub const FIRST_VALUE_START: usize = 21;
pub const VALUE_WIDTH: usize = 5;
pub const DAY_FIELD_WIDTH: usize = 8;
pub const MIN_RECORD_WIDTH: usize = 269;

/// ghcnd-stations.txt directory line layout (byte offsets)
pub const STATIONS_LINE_MIN_WIDTH: usize = 85;
pub const STATIONS_LAT_START: usize = 12;
pub const STATIONS_LAT_END: usize = 20;
pub const STATIONS_LON_START: usize = 21;
pub const STATIONS_LON_END: usize = 30;
pub const STATIONS_STATE_START: usize = 38;
pub const STATIONS_STATE_END: usize = 40;
pub const STATIONS_NAME_START: usize = 41;
pub const STATIONS_NAME_END: usize = 76;

/// Unit scale divisors for raw integer fields
pub const TEMPERATURE_SCALE: f32 = 10.0;
pub const PRECIPITATION_SCALE: f32 = 100.0;
pub const SNOWFALL_SCALE: f32 = 10.0;

/// I/O defaults
pub const DEFAULT_BUFFER_SIZE: usize = 8192 * 16; // 128KB
