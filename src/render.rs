//! Symbol renderer capability.
//!
//! Turning envelope bytes into an optical symbol and putting it on a display
//! is outside this crate. Playback only needs something that accepts the
//! bytes of the currently selected envelope.
//!
//! A session never calls the caller's renderer directly. It goes through a
//! [`RenderWorker`], which runs the renderer on its own thread and bounds how
//! long playback waits for it.

use std::io::Write;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::RenderError;

/// Receives the envelope of the chunk that should be on screen now.
///
/// May block; a session runs it on the [`RenderWorker`] thread.
pub trait SymbolRenderer: Send {
    fn render(&mut self, envelope: &[u8]) -> Result<(), RenderError>;
}

impl<F> SymbolRenderer for F
where
    F: FnMut(&[u8]) -> Result<(), RenderError> + Send,
{
    fn render(&mut self, envelope: &[u8]) -> Result<(), RenderError> {
        self(envelope)
    }
}

/// Writes each envelope as one line, for piping into an external encoder.
pub struct EnvelopePrinter<W: Write + Send> {
    out: W,
}

impl<W: Write + Send> EnvelopePrinter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> SymbolRenderer for EnvelopePrinter<W> {
    fn render(&mut self, envelope: &[u8]) -> Result<(), RenderError> {
        self.out.write_all(envelope)?;
        self.out.write_all(b"\n")?;
        self.out.flush()?;
        Ok(())
    }
}

#[derive(Default)]
struct Slot {
    /// Newest frame not yet picked up, with its sequence number.
    pending: Option<(u64, Vec<u8>)>,
    submitted: u64,
    finished: u64,
    /// Failure of frame `finished`, if it failed.
    failure: Option<RenderError>,
    /// Sequence number a caller is currently waiting on.
    waiting: Option<u64>,
    busy: bool,
    shutdown: bool,
}

type SlotCell = Arc<(Mutex<Slot>, Condvar)>;

fn lock_slot(cell: &(Mutex<Slot>, Condvar)) -> MutexGuard<'_, Slot> {
    cell.0.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Runs a renderer on a dedicated thread.
///
/// [`SymbolRenderer::render`] on the worker hands the frame over and waits at
/// most `timeout` for it to be drawn. While an earlier frame is still being
/// drawn, a new frame replaces whatever is queued and the call returns
/// [`RenderError::Busy`] at once, so only the latest selection is drawn next.
/// A zero timeout never waits.
///
/// Dropping the worker stops its thread after the frame in progress.
pub struct RenderWorker {
    cell: SlotCell,
    timeout: Duration,
}

impl RenderWorker {
    pub fn spawn<R>(renderer: R, timeout: Duration) -> Result<Self, RenderError>
    where
        R: SymbolRenderer + 'static,
    {
        let cell: SlotCell = Arc::new((Mutex::new(Slot::default()), Condvar::new()));
        let worker_cell = Arc::clone(&cell);
        thread::Builder::new()
            .name("symbol-render".into())
            .spawn(move || render_loop(renderer, &worker_cell))?;
        Ok(Self { cell, timeout })
    }
}

fn render_loop<R: SymbolRenderer>(mut renderer: R, cell: &(Mutex<Slot>, Condvar)) {
    let (_, ready) = cell;
    loop {
        let (seq, frame) = {
            let slot = lock_slot(cell);
            let mut slot = ready
                .wait_while(slot, |s| s.pending.is_none() && !s.shutdown)
                .unwrap_or_else(PoisonError::into_inner);
            if slot.shutdown {
                break;
            }
            let Some(next) = slot.pending.take() else {
                continue;
            };
            slot.busy = true;
            next
        };

        let result = renderer.render(&frame);

        let mut slot = lock_slot(cell);
        slot.busy = false;
        slot.finished = seq;
        slot.failure = match result {
            Err(e) if slot.waiting != Some(seq) => {
                warn!(seq, error = %e, "failed to render frame");
                None
            }
            other => other.err(),
        };
        ready.notify_all();
    }
    debug!("render worker stopped");
}

impl SymbolRenderer for RenderWorker {
    fn render(&mut self, envelope: &[u8]) -> Result<(), RenderError> {
        let (_, ready) = &*self.cell;
        let mut slot = lock_slot(&self.cell);
        if slot.shutdown {
            return Err(RenderError::Stopped);
        }

        slot.submitted += 1;
        let seq = slot.submitted;
        slot.pending = Some((seq, envelope.to_vec()));
        ready.notify_all();

        if slot.busy {
            return Err(RenderError::Busy);
        }
        if self.timeout.is_zero() {
            return Ok(());
        }

        slot.waiting = Some(seq);
        let (mut slot, _) = ready
            .wait_timeout_while(slot, self.timeout, |s| s.finished < seq && !s.shutdown)
            .unwrap_or_else(PoisonError::into_inner);
        slot.waiting = None;

        if slot.finished >= seq {
            return match slot.failure.take() {
                Some(e) if slot.finished == seq => Err(e),
                _ => Ok(()),
            };
        }
        if slot.shutdown {
            return Err(RenderError::Stopped);
        }
        Err(RenderError::Timeout(self.timeout))
    }
}

impl Drop for RenderWorker {
    fn drop(&mut self) {
        let (_, ready) = &*self.cell;
        lock_slot(&self.cell).shutdown = true;
        ready.notify_all();
    }
}
