//! # writebench
//!
//! Continuous disk-write throughput benchmark.
//!
//! A writer thread pushes a fixed-size chunk at the target as fast as it is
//! accepted, optionally syncing after every write. A sampler thread turns the
//! bytes written per interval into MiB/s, prints each figure and appends it
//! to a CSV log named after the start time. On shutdown both loops are
//! stopped and joined, then a final row with the lifetime average is added.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use writebench::{App, WriteBenchConfig};
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = WriteBenchConfig::new("/tmp/scratch.bin")
//!     .chunk_size(1 << 20)
//!     .sample_interval(Duration::from_millis(500));
//!
//! let running = App::new(config)?.start(|| {})?;
//! std::thread::sleep(Duration::from_secs(5));
//! let summary = running.finish()?;
//! println!("{} bytes", summary.bytes_written);
//! # Ok(())
//! # }
//! ```
//!
//! ## Log format
//!
//! One row per sample, `timestamp,elapsed_secs,mib_per_sec`, and a final
//! `timestamp,elapsed_secs,mib_per_sec,End` row.

mod app;
mod config;
mod record;
mod report;
mod sampler;
mod shutdown;
mod stats;
mod writer;

pub use app::{App, RunningApp};
pub use config::{WriteBenchConfig, DEFAULT_CHUNK_SIZE, DEFAULT_INTERVAL_MS};
pub use record::{timestamp_now, RunSummary, SampleRecord, END_MARKER, TIMESTAMP_FORMAT};
pub use report::{final_record, ConsoleReporter, CsvReporter, JsonReporter, MultiReporter, Reporter};
pub use sampler::Sampler;
pub use shutdown::StopSignal;
pub use stats::{throughput_mibps, throughput_over, RunningTotals};
pub use writer::{WriteTarget, Writer};
