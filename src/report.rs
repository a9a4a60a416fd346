//! Pluggable reporters for samples and the final summary.
//!
//! Reporters never fail the run: I/O problems are logged as warnings and the
//! benchmark keeps going.

use crate::config::WriteBenchConfig;
use crate::record::{RunSummary, SampleRecord};
use crate::stats::{throughput_over, RunningTotals};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Instant;

/// Trait for sample and summary sinks.
pub trait Reporter: Send + Sync {
    /// Called once before the write loop starts.
    fn run_start(&self, _config: &WriteBenchConfig) {}

    /// Called for every periodic sample.
    fn sample(&self, _record: &SampleRecord) {}

    /// Called exactly once with the final row after the loops stopped.
    fn run_end(&self, _record: &SampleRecord, _summary: &RunSummary) {}
}

/// Build the final row from the lifetime counters.
///
/// The average covers the whole run, from the start of the counters up to
/// `now`, not just the last sampling window.
pub fn final_record(totals: &RunningTotals, now: Instant) -> SampleRecord {
    let elapsed = totals.elapsed_at(now);
    SampleRecord::final_row(elapsed, throughput_over(totals.lifetime(), elapsed))
}

/// Console reporter that prints one line per sample to stdout.
pub struct ConsoleReporter {
    output_lock: Mutex<()>,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self {
            output_lock: Mutex::new(()),
        }
    }

    fn format_sample(record: &SampleRecord) -> String {
        format!("{:.6} MByte/s", record.throughput_mibps)
    }

    fn format_total(record: &SampleRecord) -> String {
        format!("Total: {:.6} MByte/s", record.throughput_mibps)
    }

    fn write_stdout(&self, message: &str) {
        let _guard = self.output_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut stdout = io::stdout().lock();
        if let Err(e) = writeln!(stdout, "{}", message).and_then(|_| stdout.flush()) {
            log::warn!("failed to write to stdout: {}", e);
        }
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Reporter for ConsoleReporter {
    fn run_start(&self, config: &WriteBenchConfig) {
        log::info!(
            "writing {} byte chunks to {} (sync: {}), sampling every {} ms",
            config.chunk_size,
            config.output_path.display(),
            config.sync_after_write,
            config.sample_interval.as_millis()
        );
    }

    fn sample(&self, record: &SampleRecord) {
        self.write_stdout(&Self::format_sample(record));
    }

    fn run_end(&self, record: &SampleRecord, summary: &RunSummary) {
        self.write_stdout(&Self::format_total(record));
        log::info!(
            "{} bytes in {:.2}s over {} samples",
            summary.bytes_written,
            summary.elapsed.as_secs_f64(),
            summary.samples
        );
    }
}

/// Appends rows to the CSV log and pushes each one to storage.
pub struct CsvReporter {
    path: PathBuf,
    out: Mutex<BufWriter<File>>,
}

impl CsvReporter {
    /// Create (or truncate) `<dir>/<stem>.csv`.
    pub fn create(dir: &Path, stem: &str) -> io::Result<Self> {
        let path = dir.join(format!("{}.csv", stem));
        let file = File::create(&path)?;
        Ok(Self {
            path,
            out: Mutex::new(BufWriter::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, record: &SampleRecord) -> io::Result<()> {
        let mut out = self.out.lock().unwrap_or_else(|e| e.into_inner());
        writeln!(out, "{}", record.to_row())?;
        out.flush()?;
        out.get_ref().sync_data()
    }

    fn append_or_warn(&self, record: &SampleRecord) {
        if let Err(e) = self.append(record) {
            log::warn!("failed to append to {}: {}", self.path.display(), e);
        }
    }
}

impl Reporter for CsvReporter {
    fn sample(&self, record: &SampleRecord) {
        self.append_or_warn(record);
    }

    fn run_end(&self, record: &SampleRecord, _summary: &RunSummary) {
        self.append_or_warn(record);
    }
}

/// JSON reporter that writes the run summary to a directory.
pub struct JsonReporter {
    output_dir: PathBuf,
}

impl JsonReporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }
}

impl Reporter for JsonReporter {
    fn run_end(&self, _record: &SampleRecord, summary: &RunSummary) {
        match summary.save(&self.output_dir) {
            Ok(path) => log::info!("summary written to {}", path.display()),
            Err(e) => log::warn!("failed to write JSON summary: {}", e),
        }
    }
}

/// Combines multiple reporters.
pub struct MultiReporter {
    reporters: Vec<Box<dyn Reporter>>,
}

impl MultiReporter {
    pub fn new(reporters: Vec<Box<dyn Reporter>>) -> Self {
        Self { reporters }
    }
}

impl Reporter for MultiReporter {
    fn run_start(&self, config: &WriteBenchConfig) {
        for r in &self.reporters {
            r.run_start(config);
        }
    }

    fn sample(&self, record: &SampleRecord) {
        for r in &self.reporters {
            r.sample(record);
        }
    }

    fn run_end(&self, record: &SampleRecord, summary: &RunSummary) {
        for r in &self.reporters {
            r.run_end(record, summary);
        }
    }
}
