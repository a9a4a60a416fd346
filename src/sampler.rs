//! Periodic throughput sampling.

use crate::record::SampleRecord;
use crate::report::Reporter;
use crate::shutdown::StopSignal;
use crate::stats::{throughput_mibps, RunningTotals};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Turns the writer's interval counter into one [`SampleRecord`] per interval.
///
/// Scheduling is fixed-delay: the sampler sleeps a full interval after each
/// step, so the time spent sampling adds to the period.
pub struct Sampler {
    totals: Arc<RunningTotals>,
    interval: Duration,
    reporter: Arc<dyn Reporter>,
    last_sample: Instant,
    samples: u64,
}

impl Sampler {
    pub fn new(totals: Arc<RunningTotals>, interval: Duration, reporter: Arc<dyn Reporter>) -> Self {
        let last_sample = totals.start();
        Self {
            totals,
            interval,
            reporter,
            last_sample,
            samples: 0,
        }
    }

    /// Take one sample as of `now` and hand it to the reporter.
    ///
    /// The interval counter is read and zeroed in a single atomic swap, so
    /// bytes written during the step land in the next window.
    pub fn step_at(&mut self, now: Instant) -> SampleRecord {
        let bytes = self.totals.take_interval();
        let window_ms = now.saturating_duration_since(self.last_sample).as_millis();
        let record = SampleRecord::periodic(self.totals.elapsed_at(now), throughput_mibps(bytes, window_ms));

        self.reporter.sample(&record);

        self.last_sample = now;
        self.samples += 1;
        record
    }

    /// Sample every interval until `stop` fires.
    ///
    /// Returns the number of samples taken.
    pub fn run(&mut self, stop: &StopSignal) -> u64 {
        while !stop.wait_timeout(self.interval) {
            self.step_at(Instant::now());
        }
        log::debug!("sampler stopped after {} samples", self.samples);
        self.samples
    }

    pub fn samples(&self) -> u64 {
        self.samples
    }
}
