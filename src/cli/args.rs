use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ghcnd-analyzer")]
#[command(about = "Streaming climate statistics over GHCN-Daily archives")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Ingest an observation file and emit the derived statistics report
    Analyze {
        #[arg(short, long, help = "GHCN-Daily observation file (.dly)")]
        input: PathBuf,

        #[arg(
            short,
            long,
            help = "Station directory file (ghcnd-stations.txt); stations missing from it get default identities"
        )]
        stations: Option<PathBuf>,

        #[arg(short, long, help = "Report output path [default: stdout]")]
        output: Option<PathBuf>,

        #[arg(long, default_value = "csv", help = "Report format: csv or json")]
        format: String,

        #[arg(long, default_value = "1840", help = "Baseline window start year")]
        baseline_start: u16,

        #[arg(long, default_value = "2100", help = "Baseline window end year")]
        baseline_end: u16,

        #[arg(
            long,
            default_value = "37.8",
            allow_hyphen_values = true,
            help = "High threshold against daily maxima (deg C)"
        )]
        threshold_high: f32,

        #[arg(
            long,
            default_value = "-18.0",
            allow_hyphen_values = true,
            help = "Low threshold against daily minima (deg C)"
        )]
        threshold_low: f32,

        #[arg(long, default_value = "1850", help = "First year folded into statistics")]
        first_year: u16,

        #[arg(long, help = "Last year folded into statistics [default: open-ended]")]
        last_year: Option<u16>,

        #[arg(long, default_value = "1.0", help = "Precipitation target (cm/day)")]
        precip_target: f32,

        #[arg(long, default_value = "1.0", help = "Snowfall target (cm/day)")]
        snow_target: f32,

        #[arg(long, default_value = "12", help = "Rolling window length in months")]
        months_window: usize,

        #[arg(
            long,
            default_value = "1895",
            help = "First year of the modern record for state anomaly series"
        )]
        modern_start: u16,

        #[arg(long, default_value = "false", help = "Memory-map the observation file")]
        mmap: bool,
    },

    /// Parse the observation file without analysis and report what would
    /// be accepted or dropped
    Validate {
        #[arg(short, long, help = "GHCN-Daily observation file (.dly)")]
        input: PathBuf,

        #[arg(long, default_value = "false", help = "Memory-map the observation file")]
        mmap: bool,
    },
}
