//! Destinations for a finalized line configuration.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use super::export::export_csv;
use crate::line::LineConfiguration;

/// Failure while delivering a configuration.
#[derive(Debug, Error)]
pub enum SinkError {
    /// File could not be created or written.
    #[error("write failed: {0}")]
    Io(#[from] io::Error),
    /// Configuration could not be encoded as JSON.
    #[error("json encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Receives a configuration once it has passed validation.
pub trait SubmissionSink {
    /// Delivers `line`.
    ///
    /// # Errors
    ///
    /// Returns a `SinkError` if delivery fails.
    fn submit(&mut self, line: &LineConfiguration) -> Result<(), SinkError>;

    /// Short name used in log output.
    fn name(&self) -> &'static str;
}

/// Logs the configuration as a JSON-encoded field.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl SubmissionSink for LogSink {
    fn submit(&mut self, line: &LineConfiguration) -> Result<(), SinkError> {
        let payload = serde_json::to_string(line)?;
        info!(%payload, "line configuration submitted");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}

/// Writes the configuration as pretty-printed JSON.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    /// Creates a sink writing to `path`.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl SubmissionSink for JsonFileSink {
    fn submit(&mut self, line: &LineConfiguration) -> Result<(), SinkError> {
        let mut writer = BufWriter::new(File::create(&self.path)?);
        serde_json::to_writer_pretty(&mut writer, line)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        info!(path = %self.path.display(), "configuration written");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "json"
    }
}

/// Writes the consumer table as CSV.
#[derive(Debug, Clone)]
pub struct CsvFileSink {
    path: PathBuf,
}

impl CsvFileSink {
    /// Creates a sink writing to `path`.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl SubmissionSink for CsvFileSink {
    fn submit(&mut self, line: &LineConfiguration) -> Result<(), SinkError> {
        export_csv(line, &self.path)?;
        info!(path = %self.path.display(), "consumer table written");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "csv"
    }
}

/// Collects submissions in memory.
impl SubmissionSink for Vec<LineConfiguration> {
    fn submit(&mut self, line: &LineConfiguration) -> Result<(), SinkError> {
        self.push(line.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_sink_keeps_each_submission() {
        let mut sink: Vec<LineConfiguration> = Vec::new();
        let line = LineConfiguration::default();
        assert!(sink.submit(&line).is_ok());
        assert!(sink.submit(&line).is_ok());
        assert_eq!(sink.len(), 2);
    }

    #[test]
    fn log_sink_accepts_any_configuration() {
        let mut sink = LogSink;
        assert!(sink.submit(&LineConfiguration::default()).is_ok());
        assert_eq!(sink.name(), "log");
    }

    #[test]
    fn json_sink_reports_unwritable_path() {
        let mut sink = JsonFileSink::new("/nonexistent-dir/line.json");
        let result = sink.submit(&LineConfiguration::default());
        assert!(matches!(result, Err(SinkError::Io(_))));
    }

    #[test]
    fn json_sink_round_trips_through_file() {
        let path = std::env::temp_dir().join(format!("line-wizard-{}.json", std::process::id()));
        let line = LineConfiguration::default();
        let mut sink = JsonFileSink::new(&path);
        assert!(sink.submit(&line).is_ok());
        let read: Option<LineConfiguration> = std::fs::read_to_string(&path)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok());
        std::fs::remove_file(&path).ok();
        assert_eq!(read, Some(line));
    }

    #[test]
    fn csv_sink_writes_consumer_table() {
        let path = std::env::temp_dir().join(format!("line-wizard-{}.csv", std::process::id()));
        let mut sink = CsvFileSink::new(&path);
        assert!(sink.submit(&LineConfiguration::default()).is_ok());
        let content = std::fs::read_to_string(&path).unwrap_or_default();
        std::fs::remove_file(&path).ok();
        assert!(content.starts_with("consumer,power_kw,share_pct"));
        assert_eq!(content.lines().count(), 2);
    }
}
