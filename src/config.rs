//! Configuration for a write benchmark run.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Result};

/// Default bytes per write call.
pub const DEFAULT_CHUNK_SIZE: usize = 65536;
/// Default sampling interval in milliseconds.
pub const DEFAULT_INTERVAL_MS: u64 = 250;

/// Configuration for a write benchmark run.
///
/// Built once at startup and never mutated after the run begins.
#[derive(Debug, Clone)]
pub struct WriteBenchConfig {
    /// Bytes per write operation.
    pub chunk_size: usize,
    /// Delay between two sampling steps.
    pub sample_interval: Duration,
    /// Force a durability flush after every write.
    pub sync_after_write: bool,
    /// File or device the chunks are written to.
    pub output_path: PathBuf,
    /// Directory the CSV log is created in.
    pub log_dir: PathBuf,
    /// Directory for the JSON run summary, if any.
    pub summary_dir: Option<PathBuf>,
}

impl Default for WriteBenchConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            sample_interval: Duration::from_millis(DEFAULT_INTERVAL_MS),
            sync_after_write: true,
            output_path: PathBuf::new(),
            log_dir: PathBuf::from("."),
            summary_dir: None,
        }
    }
}

impl WriteBenchConfig {
    /// Create a config targeting `output_path` with default settings.
    pub fn new(output_path: impl Into<PathBuf>) -> Self {
        Self {
            output_path: output_path.into(),
            ..Self::default()
        }
    }

    /// Set the number of bytes per write.
    pub fn chunk_size(mut self, bytes: usize) -> Self {
        self.chunk_size = bytes;
        self
    }

    /// Set the sampling interval.
    pub fn sample_interval(mut self, interval: Duration) -> Self {
        self.sample_interval = interval;
        self
    }

    /// Enable or disable the flush after each write.
    pub fn sync_after_write(mut self, sync: bool) -> Self {
        self.sync_after_write = sync;
        self
    }

    /// Set the directory the CSV log goes to.
    pub fn log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = dir.into();
        self
    }

    /// Write a JSON summary into `dir` at the end of the run.
    pub fn summary_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.summary_dir = Some(dir.into());
        self
    }

    /// Reject configurations the run loops cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            bail!("chunk size must be at least one byte");
        }
        if self.sample_interval.is_zero() {
            bail!("sampling interval must be positive");
        }
        if self.output_path.as_os_str().is_empty() {
            bail!("no output path given");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_use_defaults_when_only_path_given() {
        let cfg = WriteBenchConfig::new("/tmp/out");
        assert_eq!(cfg.chunk_size, 65536);
        assert_eq!(cfg.sample_interval, Duration::from_millis(250));
        assert!(cfg.sync_after_write);
        assert_eq!(cfg.log_dir, PathBuf::from("."));
        assert!(cfg.summary_dir.is_none());
    }

    #[test]
    fn should_build_config_with_builder() {
        let cfg = WriteBenchConfig::new("/dev/null")
            .chunk_size(1024)
            .sample_interval(Duration::from_millis(100))
            .sync_after_write(false)
            .summary_dir("results");

        assert_eq!(cfg.chunk_size, 1024);
        assert_eq!(cfg.sample_interval, Duration::from_millis(100));
        assert!(!cfg.sync_after_write);
        assert_eq!(cfg.summary_dir, Some(PathBuf::from("results")));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn should_reject_zero_chunk_size() {
        let cfg = WriteBenchConfig::new("out").chunk_size(0);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn should_reject_zero_interval() {
        let cfg = WriteBenchConfig::new("out").sample_interval(Duration::ZERO);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn should_reject_missing_output_path() {
        assert!(WriteBenchConfig::default().validate().is_err());
    }
}
