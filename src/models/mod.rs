pub mod hierarchy;
pub mod observation;
pub mod station;

pub use hierarchy::{Country, Day, Month, Station, StationId, State, Year};
pub use observation::{Element, Observation};
pub use station::StationInfo;
