//! Periodic trigger for intersection scans

use crossbeam_channel::{select, tick, unbounded, Sender};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, trace};

/// Shared flag marking a scan/resolve cycle as in flight
#[derive(Debug, Clone, Default)]
pub struct CycleGuard {
    in_flight: Arc<AtomicBool>,
}

impl CycleGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the next cycle; `false` while the previous one is unfinished
    pub fn try_begin(&self) -> bool {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Mark the current cycle as finished
    pub fn complete(&self) {
        self.in_flight.store(false, Ordering::Release);
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }
}

/// Background timer that emits a message every interval.
///
/// A fire is skipped while the cycle started by the previous message has not
/// been completed through the [`CycleGuard`]. Dropping the timer stops it.
#[derive(Debug)]
pub struct ProbeTimer {
    interval: Duration,
    guard: CycleGuard,
    skipped: Arc<AtomicU64>,
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl ProbeTimer {
    /// Start firing `make_message()` into `sink` every `interval`
    pub fn start<M, F>(interval: Duration, sink: Sender<M>, make_message: F) -> Self
    where
        M: Send + 'static,
        F: Fn() -> M + Send + 'static,
    {
        let guard = CycleGuard::new();
        let skipped = Arc::new(AtomicU64::new(0));
        let (stop_tx, stop_rx) = unbounded::<()>();

        let thread_guard = guard.clone();
        let thread_skipped = Arc::clone(&skipped);
        let handle = thread::spawn(move || {
            let ticker = tick(interval);
            loop {
                select! {
                    recv(ticker) -> _ => {
                        if !thread_guard.try_begin() {
                            thread_skipped.fetch_add(1, Ordering::Relaxed);
                            trace!("Probe cycle still in flight, skipping fire");
                            continue;
                        }
                        if sink.send(make_message()).is_err() {
                            debug!("Probe sink closed, stopping timer");
                            break;
                        }
                    }
                    recv(stop_rx) -> _ => break,
                }
            }
        });

        debug!(interval_ms = interval.as_millis() as u64, "Probe timer started");
        Self {
            interval,
            guard,
            skipped,
            stop: Some(stop_tx),
            handle: Some(handle),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Guard the owner completes after handling each fire
    pub fn cycle_guard(&self) -> CycleGuard {
        self.guard.clone()
    }

    /// Fires dropped because a cycle was still running
    pub fn skipped_fires(&self) -> u64 {
        self.skipped.load(Ordering::Relaxed)
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Stop firing; nodes keep whatever visibility they were last given
    pub fn stop(&mut self) {
        // Disconnecting the stop channel wakes the select
        self.stop.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
            debug!("Probe timer stopped");
        }
    }
}

impl Drop for ProbeTimer {
    fn drop(&mut self) {
        self.stop();
    }
}
