pub mod observation_reader;
pub mod station_reader;

pub use observation_reader::ObservationReader;
pub use station_reader::StationReader;
