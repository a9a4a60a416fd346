//! Cooperative stop signal shared by the run loops.

use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

/// One-shot stop flag that sleeping loops can wait on.
///
/// The writer polls [`StopSignal::is_triggered`] between writes; the sampler
/// sleeps in [`StopSignal::wait_timeout`], which returns early once the signal
/// fires.
#[derive(Debug, Default)]
pub struct StopSignal {
    stopped: Mutex<bool>,
    cond: Condvar,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask every loop to stop after its current iteration.
    pub fn trigger(&self) {
        let mut stopped = self.stopped.lock().unwrap_or_else(|e| e.into_inner());
        *stopped = true;
        self.cond.notify_all();
    }

    pub fn is_triggered(&self) -> bool {
        *self.stopped.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Sleep for up to `timeout`. Returns `true` if the signal fired.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut stopped = self.stopped.lock().unwrap_or_else(|e| e.into_inner());
        while !*stopped {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            // spurious wakeups re-check the deadline
            stopped = match self.cond.wait_timeout(stopped, deadline - now) {
                Ok((guard, _)) => guard,
                Err(e) => e.into_inner().0,
            };
        }
        true
    }
}
