//! writebench: measure sustained write throughput of a file or device.
//!
//! Writes the same chunk to the target in a tight loop, prints the achieved
//! MiB/s every interval and logs each figure to `<start time>.csv`. Stop with
//! Ctrl-C or SIGTERM to get the lifetime average.

use anyhow::{Context, Result};
use clap::builder::RangedU64ValueParser;
use clap::{ArgAction, Parser};
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;
use std::path::PathBuf;
use std::time::Duration;
use writebench::{App, WriteBenchConfig, DEFAULT_CHUNK_SIZE, DEFAULT_INTERVAL_MS};

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Debug, Parser)]
#[command(
    name = "writebench",
    about = "Continuously write to a file or device and log the achieved throughput",
    long_about = "
writebench writes a fixed-size chunk to OUTFILE as fast as the storage accepts
it and samples the throughput every interval. Each sample is printed and
appended to a CSV log named after the start time. Stop the run with Ctrl-C or
SIGTERM to append the lifetime average as a final row.

Example:
    writebench /mnt/scratch/bench.bin
    writebench --chunksize 1048576 --interval 1000 /dev/sdX
    writebench --sync=false --log-dir results /tmp/bench.bin
"
)]
struct Cli {
    /// File or device to write to (exactly one)
    #[arg(value_name = "OUTFILE")]
    outfiles: Vec<PathBuf>,

    /// Bytes per write
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE, value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
    chunksize: usize,

    /// Sampling interval in milliseconds
    #[arg(long, default_value_t = DEFAULT_INTERVAL_MS, value_parser = clap::value_parser!(u64).range(1..))]
    interval: u64,

    /// Sync to storage after every write (`--sync`, `--sync=true`, `--sync=false`)
    #[arg(
        long,
        default_value_t = true,
        action = ArgAction::Set,
        num_args = 0..=1,
        default_missing_value = "true",
        require_equals = true
    )]
    sync: bool,

    /// Directory the CSV log is created in
    #[arg(long, default_value = ".")]
    log_dir: PathBuf,

    /// Also write a JSON run summary into this directory
    #[arg(long)]
    summary_dir: Option<PathBuf>,
}

impl Cli {
    fn into_config(mut self) -> WriteBenchConfig {
        let output = self.outfiles.remove(0);
        let mut config = WriteBenchConfig::new(output)
            .chunk_size(self.chunksize)
            .sample_interval(Duration::from_millis(self.interval))
            .sync_after_write(self.sync)
            .log_dir(self.log_dir);
        if let Some(dir) = self.summary_dir {
            config = config.summary_dir(dir);
        }
        config
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    if cli.outfiles.len() != 1 {
        eprintln!("Exactly one output file required");
        std::process::exit(1);
    }

    run(cli.into_config())
}

fn run(config: WriteBenchConfig) -> Result<()> {
    let mut signals =
        Signals::new([SIGINT, SIGTERM]).context("Failed to install signal handlers")?;
    let handle = signals.handle();

    let app = App::new(config)?;
    log::info!("logging samples to {}", app.log_path().display());

    // a dying writer closes the iterator so we stop waiting for a signal
    let running = app.start(move || handle.close())?;

    if let Some(signal) = signals.forever().next() {
        log::info!("received signal {}, finishing run", signal);
    }

    running.finish()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("writebench").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn should_sync_by_default() {
        let cli = parse(&["out.bin"]);
        assert!(cli.sync);
        assert_eq!(cli.outfiles, vec![PathBuf::from("out.bin")]);
    }

    #[test]
    fn should_treat_bare_sync_as_true_without_taking_the_output_path() {
        for args in [["--sync", "out.bin"], ["out.bin", "--sync"]] {
            let cli = parse(&args);
            assert!(cli.sync);
            assert_eq!(cli.outfiles, vec![PathBuf::from("out.bin")]);
        }
    }

    #[test]
    fn should_accept_explicit_sync_values() {
        assert!(!parse(&["--sync=false", "out.bin"]).sync);
        assert!(parse(&["--sync=true", "out.bin"]).sync);
    }

    #[test]
    fn should_map_flags_into_config() {
        let config = parse(&["--chunksize", "1024", "--interval", "100", "--sync=false", "out.bin"])
            .into_config();
        assert_eq!(config.chunk_size, 1024);
        assert_eq!(config.sample_interval, Duration::from_millis(100));
        assert!(!config.sync_after_write);
        assert_eq!(config.output_path, PathBuf::from("out.bin"));
    }
}
