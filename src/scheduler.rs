//! Repeating timer capability.
//!
//! Playback depends only on [`Scheduler`]; the binary uses [`ThreadScheduler`]
//! and tests use [`ManualScheduler`], which fires only when told to.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

/// Callback invoked on every timer fire.
pub type TickFn = Box<dyn FnMut() + Send>;

/// Stops a repeating timer when cancelled or dropped.
pub struct CancelHandle {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl CancelHandle {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn cancel(mut self) {
        self.run();
    }

    fn run(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for CancelHandle {
    fn drop(&mut self) {
        self.run();
    }
}

pub trait Scheduler: Send + Sync {
    /// Call `callback` every `interval` until the returned handle is
    /// cancelled or dropped.
    fn schedule_repeating(&self, interval: Duration, callback: TickFn) -> CancelHandle;
}

/// One background thread per timer.
///
/// Cancellation does not join the thread: a fire may already be waiting on
/// the playback lock held by the canceller. Callers must make such late fires
/// harmless (the controller drops them by generation).
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadScheduler;

impl Scheduler for ThreadScheduler {
    fn schedule_repeating(&self, interval: Duration, mut callback: TickFn) -> CancelHandle {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        let spawned = thread::Builder::new()
            .name("playback-timer".to_string())
            .spawn(move || loop {
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => callback(),
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            });

        match spawned {
            Ok(_) => debug!(interval_ms = interval.as_millis() as u64, "timer started"),
            Err(e) => warn!(error = %e, "failed to spawn timer thread; autoplay disabled"),
        }

        CancelHandle::new(move || {
            let _ = stop_tx.send(());
        })
    }
}

struct ManualTimer {
    interval: Duration,
    elapsed: Duration,
    active: Arc<AtomicBool>,
    callback: Arc<Mutex<TickFn>>,
}

/// Deterministic scheduler driven by [`ManualScheduler::advance`].
#[derive(Clone, Default)]
pub struct ManualScheduler {
    timers: Arc<Mutex<Vec<ManualTimer>>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretend `by` has passed; fire every live timer as many times as its
    /// interval fits into its accumulated time.
    pub fn advance(&self, by: Duration) {
        let due: Vec<(Arc<AtomicBool>, Arc<Mutex<TickFn>>, u32)> = {
            let mut timers = self.timers.lock().unwrap_or_else(PoisonError::into_inner);
            timers.retain(|t| t.active.load(Ordering::SeqCst));
            timers
                .iter_mut()
                .map(|t| {
                    t.elapsed += by;
                    let mut fires = 0;
                    while !t.interval.is_zero() && t.elapsed >= t.interval {
                        t.elapsed -= t.interval;
                        fires += 1;
                    }
                    (t.active.clone(), t.callback.clone(), fires)
                })
                .collect()
        };

        // Callbacks run without the timer list locked so they may reschedule.
        for (active, callback, fires) in due {
            for _ in 0..fires {
                if !active.load(Ordering::SeqCst) {
                    break;
                }
                let mut guard = callback.lock().unwrap_or_else(PoisonError::into_inner);
                let tick = &mut *guard;
                tick();
            }
        }
    }

    /// Number of timers not yet cancelled.
    pub fn active_timers(&self) -> usize {
        self.timers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|t| t.active.load(Ordering::SeqCst))
            .count()
    }

    /// Interval of the newest live timer.
    pub fn current_interval(&self) -> Option<Duration> {
        self.timers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .rev()
            .find(|t| t.active.load(Ordering::SeqCst))
            .map(|t| t.interval)
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_repeating(&self, interval: Duration, callback: TickFn) -> CancelHandle {
        let active = Arc::new(AtomicBool::new(true));
        self.timers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(ManualTimer {
                interval,
                elapsed: Duration::ZERO,
                active: active.clone(),
                callback: Arc::new(Mutex::new(callback)),
            });
        CancelHandle::new(move || active.store(false, Ordering::SeqCst))
    }
}
