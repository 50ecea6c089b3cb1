pub mod anomaly;
pub mod baseline;
pub mod regression;
pub mod report;

pub use anomaly::ClimateAnalyzer;
pub use report::ClimateReport;
