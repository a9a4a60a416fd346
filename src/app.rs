//! Wires the writer, sampler and reporters into one run.

use crate::config::WriteBenchConfig;
use crate::record::{timestamp_now, RunSummary};
use crate::report::{final_record, ConsoleReporter, CsvReporter, JsonReporter, MultiReporter, Reporter};
use crate::sampler::Sampler;
use crate::shutdown::StopSignal;
use crate::stats::RunningTotals;
use crate::writer::Writer;
use anyhow::{anyhow, Context, Result};
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

/// A benchmark whose output target and log are open but not yet written to.
pub struct App {
    config: WriteBenchConfig,
    output: File,
    log_path: PathBuf,
    started_at: String,
    reporter: Arc<MultiReporter>,
}

impl App {
    /// Open the output target and create a fresh log file.
    ///
    /// The target is appended to when it already exists and created
    /// otherwise. The log is named after the current local time.
    pub fn new(config: WriteBenchConfig) -> Result<Self> {
        config.validate()?;

        let output = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&config.output_path)
            .with_context(|| format!("Failed to open output {}", config.output_path.display()))?;

        let started_at = timestamp_now();
        let csv = CsvReporter::create(&config.log_dir, &started_at).with_context(|| {
            format!("Failed to create log file in {}", config.log_dir.display())
        })?;
        let log_path = csv.path().to_path_buf();

        let mut reporters: Vec<Box<dyn Reporter>> = vec![Box::new(ConsoleReporter::new()), Box::new(csv)];
        if let Some(dir) = &config.summary_dir {
            reporters.push(Box::new(JsonReporter::new(dir.clone())));
        }

        Ok(Self {
            config,
            output,
            log_path,
            started_at,
            reporter: Arc::new(MultiReporter::new(reporters)),
        })
    }

    /// Path of the CSV log for this run.
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// Start the writer and sampler threads.
    ///
    /// `on_write_failure` runs on the writer thread if the write loop dies,
    /// after the stop signal has been triggered, so a caller blocked
    /// elsewhere can be woken.
    pub fn start<F>(self, on_write_failure: F) -> Result<RunningApp>
    where
        F: FnOnce() + Send + 'static,
    {
        let totals = Arc::new(RunningTotals::new());
        let stop = Arc::new(StopSignal::new());

        self.reporter.run_start(&self.config);

        let mut writer = Writer::new(
            self.output,
            self.config.chunk_size,
            self.config.sync_after_write,
            Arc::clone(&totals),
        );
        let writer_handle = {
            let stop = Arc::clone(&stop);
            thread::Builder::new()
                .name("writer".into())
                .spawn(move || {
                    let result = writer.run(&stop);
                    if result.is_err() {
                        stop.trigger();
                        on_write_failure();
                    }
                    result
                })
                .context("Failed to spawn writer thread")?
        };

        let mut sampler = Sampler::new(
            Arc::clone(&totals),
            self.config.sample_interval,
            self.reporter.clone(),
        );
        let sampler_handle = {
            let stop = Arc::clone(&stop);
            thread::Builder::new()
                .name("sampler".into())
                .spawn(move || sampler.run(&stop))
                .context("Failed to spawn sampler thread")?
        };

        log::debug!("run started, logging to {}", self.log_path.display());

        Ok(RunningApp {
            config: self.config,
            started_at: self.started_at,
            totals,
            stop,
            reporter: self.reporter,
            writer: writer_handle,
            sampler: sampler_handle,
        })
    }
}

/// A benchmark with both loops running.
pub struct RunningApp {
    config: WriteBenchConfig,
    started_at: String,
    totals: Arc<RunningTotals>,
    stop: Arc<StopSignal>,
    reporter: Arc<MultiReporter>,
    writer: JoinHandle<io::Result<u64>>,
    sampler: JoinHandle<u64>,
}

impl RunningApp {
    /// Handle that stops both loops when triggered.
    pub fn stop_signal(&self) -> Arc<StopSignal> {
        Arc::clone(&self.stop)
    }

    /// Bytes written so far.
    pub fn bytes_written(&self) -> u64 {
        self.totals.lifetime()
    }

    /// Stop both loops, wait for them, then report the final row.
    ///
    /// The final row is emitted only after the sampler has exited, so it
    /// always follows every periodic row. A failed write loop is returned as
    /// an error and no final row is written.
    pub fn finish(self) -> Result<RunSummary> {
        self.stop.trigger();

        let writes = self
            .writer
            .join()
            .map_err(|_| anyhow!("writer thread panicked"))?;
        let samples = self
            .sampler
            .join()
            .map_err(|_| anyhow!("sampler thread panicked"))?;
        let writes = writes.with_context(|| {
            format!("Error writing to {}", self.config.output_path.display())
        })?;

        let now = Instant::now();
        let record = final_record(&self.totals, now);
        let summary = RunSummary {
            started_at: self.started_at,
            output_path: self.config.output_path.clone(),
            chunk_size: self.config.chunk_size,
            sample_interval: self.config.sample_interval,
            sync_after_write: self.config.sync_after_write,
            samples,
            bytes_written: self.totals.lifetime(),
            elapsed: self.totals.elapsed_at(now),
            average_mibps: record.throughput_mibps,
        };
        log::debug!("{} writes completed", writes);

        self.reporter.run_end(&record, &summary);
        Ok(summary)
    }
}
