pub mod engine;
pub mod extremes;
pub mod record_parser;
pub mod streaks;

pub use engine::{IngestEngine, IngestStats};
pub use record_parser::RecordParser;
