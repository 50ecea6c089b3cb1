use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use memmap2::Mmap;

use crate::error::{ProcessingError, Result};
use crate::processors::IngestEngine;
use crate::utils::constants::DEFAULT_BUFFER_SIZE;
use crate::utils::progress::ProgressReporter;

/// Feeds raw observation lines into the ingestion engine, via buffered
/// I/O or a memory map for large archives.
pub struct ObservationReader {
    use_mmap: bool,
}

impl ObservationReader {
    pub fn new() -> Self {
        Self { use_mmap: false }
    }

    pub fn with_mmap(use_mmap: bool) -> Self {
        Self { use_mmap }
    }

    /// Stream the whole file into the engine. An unreadable file is the
    /// one fatal error of the run.
    pub fn ingest_file(
        &self,
        path: &Path,
        engine: &mut IngestEngine,
        progress: Option<&ProgressReporter>,
    ) -> Result<()> {
        if self.use_mmap {
            self.ingest_mmap(path, engine, progress)
        } else {
            self.ingest_buffered(path, engine, progress)
        }
    }

    fn ingest_buffered(
        &self,
        path: &Path,
        engine: &mut IngestEngine,
        progress: Option<&ProgressReporter>,
    ) -> Result<()> {
        let file = File::open(path)?;
        let reader = BufReader::with_capacity(DEFAULT_BUFFER_SIZE, file);
        engine.ingest(reader, progress)
    }

    fn ingest_mmap(
        &self,
        path: &Path,
        engine: &mut IngestEngine,
        progress: Option<&ProgressReporter>,
    ) -> Result<()> {
        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };
        let content = std::str::from_utf8(&mmap)
            .map_err(|e| ProcessingError::InvalidFormat(format!("invalid UTF-8: {}", e)))?;

        for line in content.lines() {
            engine.ingest_line(line);

            if let Some(p) = progress {
                let lines = engine.stats().lines_read;
                if lines % 10_000 == 0 {
                    p.set_message(&format!("{} lines", lines));
                }
            }
        }

        Ok(())
    }
}

impl Default for ObservationReader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;
    use crate::utils::constants::{MAX_DAYS_IN_MONTH, MISSING_VALUE};
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn make_line(station: &str, year: u16, month: u8, element: &str, raws: &[i32]) -> String {
        let mut line = format!("{:<11}{:04}{:02}{}", station, year, month, element);
        for day in 0..MAX_DAYS_IN_MONTH {
            let raw = raws.get(day).copied().unwrap_or(MISSING_VALUE);
            line.push_str(&format!("{:5}   ", raw));
        }
        line
    }

    fn write_fixture() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", make_line("USC00342912", 1936, 7, "TMAX", &[350, 400])).unwrap();
        writeln!(file, "{}", make_line("USC00342912", 1936, 7, "TMIN", &[150, 180])).unwrap();
        writeln!(file, "not an observation line").unwrap();
        file
    }

    #[test]
    fn test_buffered_ingest() {
        let file = write_fixture();
        let mut engine = IngestEngine::new(AnalysisConfig::default(), HashMap::new());

        let reader = ObservationReader::new();
        reader.ingest_file(file.path(), &mut engine, None).unwrap();

        let stats = *engine.stats();
        assert_eq!(stats.lines_read, 3);
        assert_eq!(stats.observations_folded, 2);
        assert_eq!(stats.short_lines, 1);
    }

    #[test]
    fn test_mmap_ingest_matches_buffered() {
        let file = write_fixture();

        let mut buffered_engine = IngestEngine::new(AnalysisConfig::default(), HashMap::new());
        ObservationReader::new()
            .ingest_file(file.path(), &mut buffered_engine, None)
            .unwrap();

        let mut mmap_engine = IngestEngine::new(AnalysisConfig::default(), HashMap::new());
        ObservationReader::with_mmap(true)
            .ingest_file(file.path(), &mut mmap_engine, None)
            .unwrap();

        assert_eq!(
            buffered_engine.stats().observations_folded,
            mmap_engine.stats().observations_folded
        );
        assert_eq!(
            buffered_engine.country().record_max.best().map(|r| r.value),
            mmap_engine.country().record_max.best().map(|r| r.value)
        );
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let mut engine = IngestEngine::new(AnalysisConfig::default(), HashMap::new());
        let reader = ObservationReader::new();
        let result = reader.ingest_file(Path::new("/nonexistent/ghcnd.dly"), &mut engine, None);
        assert!(matches!(result, Err(ProcessingError::Io(_))));
    }
}
