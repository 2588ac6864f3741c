//! Playback controller.
//!
//! Wraps [`Playback`] in a mutex so timer ticks and operator commands never
//! interleave, and owns the autoplay timer.
//!
//! Every installed timer carries a generation number. Changing the interval
//! bumps the generation and swaps the timer while the lock is held, so a fire
//! from the previous timer that was already waiting on the lock sees a stale
//! generation and does nothing.
//!
//! Rendering goes through a [`RenderWorker`], so the lock is held for at most
//! the configured render timeout even if the renderer itself blocks.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tracing::info;

use crate::chunk::Chunk;
use crate::config::{parse_interval, SenderConfig};
use crate::error::{Error, PlaybackError};
use crate::playback::{Playback, PlaybackState};
use crate::render::{RenderWorker, SymbolRenderer};
use crate::scheduler::{CancelHandle, Scheduler};

struct Shared {
    playback: Playback<RenderWorker>,
    generation: u64,
    timer: Option<CancelHandle>,
}

/// A running transmit session.
///
/// Dropping the controller (or calling [`PlaybackController::shutdown`])
/// stops the timer and releases the chunk sequence.
pub struct PlaybackController {
    shared: Arc<Mutex<Shared>>,
    chunks: Arc<[Chunk]>,
    scheduler: Arc<dyn Scheduler>,
}

impl PlaybackController {
    /// Start a session: render chunk 0 and begin autoplay at
    /// `config.interval_ms`.
    ///
    /// `renderer` runs on its own thread; each transition waits at most
    /// `config.render_timeout_ms` for it.
    pub fn start<R: SymbolRenderer + 'static>(
        chunks: Vec<Chunk>,
        config: &SenderConfig,
        renderer: R,
        scheduler: Arc<dyn Scheduler>,
    ) -> Result<Self, Error> {
        let render_timeout = Duration::from_millis(config.render_timeout_ms);
        let worker = RenderWorker::spawn(renderer, render_timeout)?;
        let mut playback = Playback::new(chunks, config.interval_ms, worker)?;
        playback.start();

        let controller = Self {
            chunks: Arc::clone(playback.chunks()),
            shared: Arc::new(Mutex::new(Shared {
                playback,
                generation: 0,
                timer: None,
            })),
            scheduler,
        };

        {
            let mut shared = controller.lock();
            controller.install_timer(&mut shared);
        }

        Ok(controller)
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        lock_shared(&self.shared)
    }

    /// Replace the autoplay timer with one at the current interval.
    /// Must be called with the lock held.
    fn install_timer(&self, shared: &mut Shared) {
        shared.generation += 1;
        let generation = shared.generation;
        let interval = Duration::from_millis(shared.playback.state().interval_ms);

        if let Some(old) = shared.timer.take() {
            old.cancel();
        }

        let weak: Weak<Mutex<Shared>> = Arc::downgrade(&self.shared);
        let handle = self.scheduler.schedule_repeating(
            interval,
            Box::new(move || {
                if let Some(shared) = weak.upgrade() {
                    tick_generation(&shared, generation);
                }
            }),
        );
        shared.timer = Some(handle);
    }

    pub fn state(&self) -> PlaybackState {
        self.lock().playback.state()
    }

    /// The chunk sequence. Does not take the playback lock.
    pub fn chunks(&self) -> Arc<[Chunk]> {
        Arc::clone(&self.chunks)
    }

    /// Advance as if the timer fired.
    pub fn tick(&self) -> PlaybackState {
        self.lock().playback.tick()
    }

    pub fn pause_toggle(&self) -> PlaybackState {
        self.lock().playback.pause_toggle()
    }

    pub fn next(&self) -> PlaybackState {
        self.lock().playback.next()
    }

    pub fn previous(&self) -> PlaybackState {
        self.lock().playback.previous()
    }

    /// Select a 0-based chunk index. Out of range is rejected without any
    /// state change.
    pub fn jump_to(&self, index: usize) -> Result<PlaybackState, PlaybackError> {
        self.lock().playback.jump_to(index)
    }

    pub fn reset(&self) -> PlaybackState {
        self.lock().playback.reset()
    }

    /// Change the autoplay cadence and reschedule the timer.
    ///
    /// On error the previous cadence and timer stay in place.
    pub fn set_interval(&self, ms: u64) -> Result<PlaybackState, PlaybackError> {
        let mut shared = self.lock();
        let state = shared.playback.set_interval(ms)?;
        self.install_timer(&mut shared);
        info!(interval_ms = ms, "playback interval changed");
        Ok(state)
    }

    /// Like [`PlaybackController::set_interval`], from operator text.
    pub fn set_interval_text(&self, input: &str) -> Result<PlaybackState, PlaybackError> {
        let ms = parse_interval(input)?;
        self.set_interval(ms)
    }

    /// Stop autoplay. Further ticks from the old timer are ignored.
    pub fn shutdown(self) {
        drop(self);
    }

    #[cfg(test)]
    fn generation(&self) -> u64 {
        self.lock().generation
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        let mut shared = self.lock();
        shared.generation += 1;
        if let Some(timer) = shared.timer.take() {
            timer.cancel();
        }
    }
}

fn lock_shared(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

fn tick_generation(shared: &Mutex<Shared>, generation: u64) {
    let mut shared = lock_shared(shared);
    if shared.generation == generation {
        shared.playback.tick();
    }
}
