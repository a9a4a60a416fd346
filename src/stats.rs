//! Shared byte counters and throughput math.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

const BYTES_PER_MIB: f64 = 1024.0 * 1024.0;

/// Byte counters shared between the writer and the sampler.
///
/// The writer adds to both counters after every write; the sampler swaps the
/// interval counter back to zero on each step. Both sides only touch atomics,
/// so no update is lost and no read observes a torn value.
#[derive(Debug)]
pub struct RunningTotals {
    interval_bytes: AtomicU64,
    lifetime_bytes: AtomicU64,
    start: Instant,
}

impl RunningTotals {
    /// Start a fresh set of counters at the current instant.
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    pub fn starting_at(start: Instant) -> Self {
        Self {
            interval_bytes: AtomicU64::new(0),
            lifetime_bytes: AtomicU64::new(0),
            start,
        }
    }

    /// Account for `bytes` accepted by a single write.
    pub fn record(&self, bytes: u64) {
        self.interval_bytes.fetch_add(bytes, Ordering::Relaxed);
        self.lifetime_bytes.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Read the interval counter and reset it to zero in one step.
    pub fn take_interval(&self) -> u64 {
        self.interval_bytes.swap(0, Ordering::Relaxed)
    }

    /// Bytes written since the last `take_interval`, without resetting.
    pub fn interval(&self) -> u64 {
        self.interval_bytes.load(Ordering::Relaxed)
    }

    /// Bytes written since the counters were created.
    pub fn lifetime(&self) -> u64 {
        self.lifetime_bytes.load(Ordering::Relaxed)
    }

    pub fn start(&self) -> Instant {
        self.start
    }

    /// Time elapsed between the start of the run and `now`.
    pub fn elapsed_at(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.start)
    }
}

impl Default for RunningTotals {
    fn default() -> Self {
        Self::new()
    }
}

/// Throughput in MiB/s for `bytes` written over `elapsed_ms` milliseconds.
///
/// Bytes per second are computed in integer arithmetic first and then scaled
/// to MiB. A zero-length window yields `0.0`.
pub fn throughput_mibps(bytes: u64, elapsed_ms: u128) -> f64 {
    if elapsed_ms == 0 {
        return 0.0;
    }
    let bytes_per_sec = u128::from(bytes) * 1000 / elapsed_ms;
    bytes_per_sec as f64 / BYTES_PER_MIB
}

/// Same as [`throughput_mibps`] for a [`Duration`] window.
pub fn throughput_over(bytes: u64, window: Duration) -> f64 {
    throughput_mibps(bytes, window.as_millis())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn should_report_one_mib_per_sec_for_one_mib_over_one_second() {
        assert_eq!(throughput_mibps(1_048_576, 1000), 1.0);
        // same inputs, same answer
        assert_eq!(throughput_mibps(1_048_576, 1000), 1.0);
    }

    #[test]
    fn should_return_zero_when_window_is_empty() {
        assert_eq!(throughput_mibps(123_456, 0), 0.0);
        assert_eq!(throughput_over(123_456, Duration::from_micros(500)), 0.0);
    }

    #[test]
    fn should_truncate_bytes_per_sec_before_scaling() {
        // 10 bytes over 3 ms -> 3333 B/s after integer division
        assert_eq!(throughput_mibps(10, 3), 3333.0 / BYTES_PER_MIB);
    }

    #[test]
    fn should_increment_both_counters_when_recording() {
        let totals = RunningTotals::new();
        totals.record(512);
        totals.record(100);
        assert_eq!(totals.interval(), 612);
        assert_eq!(totals.lifetime(), 612);
    }

    #[test]
    fn should_reset_interval_but_keep_lifetime() {
        let totals = RunningTotals::new();
        totals.record(4096);
        assert_eq!(totals.take_interval(), 4096);
        assert_eq!(totals.interval(), 0);
        assert_eq!(totals.take_interval(), 0);

        totals.record(10);
        assert_eq!(totals.take_interval(), 10);
        assert_eq!(totals.lifetime(), 4106);
    }

    #[test]
    fn should_not_lose_updates_under_concurrent_writers() {
        let totals = Arc::new(RunningTotals::new());
        let workers: Vec<_> = (0..4)
            .map(|_| {
                let totals = Arc::clone(&totals);
                thread::spawn(move || {
                    for _ in 0..10_000 {
                        totals.record(3);
                    }
                })
            })
            .collect();

        let mut drained = 0;
        for _ in 0..100 {
            drained += totals.take_interval();
        }
        for w in workers {
            w.join().unwrap();
        }
        drained += totals.take_interval();

        assert_eq!(drained, 4 * 10_000 * 3);
        assert_eq!(totals.lifetime(), 4 * 10_000 * 3);
    }

    #[test]
    fn should_measure_elapsed_from_start() {
        let start = Instant::now();
        let totals = RunningTotals::starting_at(start);
        let later = start + Duration::from_millis(1500);
        assert_eq!(totals.elapsed_at(later), Duration::from_millis(1500));
    }
}
