//! Playback state machine.
//!
//! Decides which chunk is on screen. Driven by timer ticks and by operator
//! commands; every transition that moves the selection re-renders it.
//! Nothing here knows about timers or threads; see
//! [`crate::controller::PlaybackController`] for that.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::chunk::Chunk;
use crate::config::check_interval;
use crate::envelope;
use crate::error::{Error, PlaybackError, RenderError, SplitError};
use crate::render::SymbolRenderer;

/// Selection, pause flag and cadence.
///
/// Invariants: `current_index < total chunks`, and `interval_ms` is inside
/// `[MIN_INTERVAL_MS, MAX_INTERVAL_MS]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackState {
    pub current_index: usize,
    pub paused: bool,
    pub interval_ms: u64,
}

/// Owns the chunk sequence, the state and the renderer.
pub struct Playback<R: SymbolRenderer> {
    chunks: Arc<[Chunk]>,
    state: PlaybackState,
    renderer: R,
}

impl<R: SymbolRenderer> Playback<R> {
    /// Create a session positioned at chunk 0, playing.
    ///
    /// Nothing is rendered until [`Playback::start`].
    pub fn new(chunks: Vec<Chunk>, interval_ms: u64, renderer: R) -> Result<Self, Error> {
        if chunks.is_empty() {
            return Err(SplitError::EmptyInput.into());
        }
        let interval_ms = check_interval(interval_ms)?;

        Ok(Self {
            chunks: chunks.into(),
            state: PlaybackState {
                current_index: 0,
                paused: false,
                interval_ms,
            },
            renderer,
        })
    }

    /// Render the current chunk for the first time.
    pub fn start(&mut self) -> PlaybackState {
        self.render_current();
        self.state
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn chunks(&self) -> &Arc<[Chunk]> {
        &self.chunks
    }

    pub fn total(&self) -> usize {
        self.chunks.len()
    }

    pub fn current_chunk(&self) -> &Chunk {
        &self.chunks[self.state.current_index]
    }

    /// Autoplay step. No-op while paused.
    pub fn tick(&mut self) -> PlaybackState {
        if !self.state.paused {
            self.state.current_index = (self.state.current_index + 1) % self.total();
            self.render_current();
        }
        self.state
    }

    /// Flip the pause flag. The selection is untouched.
    pub fn pause_toggle(&mut self) -> PlaybackState {
        self.state.paused = !self.state.paused;
        debug!(paused = self.state.paused, "pause toggled");
        self.state
    }

    /// Step forward, wrapping to 0. Allowed while paused.
    pub fn next(&mut self) -> PlaybackState {
        self.state.current_index = (self.state.current_index + 1) % self.total();
        self.render_current();
        self.state
    }

    /// Step back, wrapping to the last chunk. Allowed while paused.
    pub fn previous(&mut self) -> PlaybackState {
        let total = self.total();
        self.state.current_index = (self.state.current_index + total - 1) % total;
        self.render_current();
        self.state
    }

    /// Select `index`. Out of range leaves the state unchanged.
    pub fn jump_to(&mut self, index: usize) -> Result<PlaybackState, PlaybackError> {
        if index >= self.total() {
            return Err(PlaybackError::IndexOutOfRange {
                index,
                total: self.total(),
            });
        }
        self.state.current_index = index;
        self.render_current();
        Ok(self.state)
    }

    pub fn reset(&mut self) -> PlaybackState {
        self.state.current_index = 0;
        self.render_current();
        self.state
    }

    /// Change the cadence. Rescheduling the timer is the caller's job.
    pub fn set_interval(&mut self, ms: u64) -> Result<PlaybackState, PlaybackError> {
        self.state.interval_ms = check_interval(ms)?;
        Ok(self.state)
    }

    /// Render failures are logged and otherwise ignored; the selection has
    /// already moved and the next transition renders again.
    fn render_current(&mut self) {
        let index = self.state.current_index;
        let bytes = match envelope::serialize(&self.chunks[index]) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(index, error = %e, "failed to encode chunk, skipping render");
                return;
            }
        };
        debug!(
            index,
            total = self.chunks.len(),
            envelope_len = bytes.len(),
            "rendering chunk"
        );
        match self.renderer.render(&bytes) {
            Ok(()) => {}
            Err(RenderError::Busy) => debug!(index, "renderer busy, frame queued"),
            Err(e) => warn!(index, error = %e, "failed to render chunk"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::splitter::split;
    use std::sync::Mutex;

    /// Records the chunk index of every rendered envelope.
    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<u32>>>);

    impl Recorder {
        fn rendered(&self) -> Vec<u32> {
            self.0.lock().unwrap().clone()
        }
    }

    impl SymbolRenderer for Recorder {
        fn render(&mut self, bytes: &[u8]) -> Result<(), RenderError> {
            let chunk = envelope::deserialize(bytes).unwrap();
            self.0.lock().unwrap().push(chunk.chunk_index());
            Ok(())
        }
    }

    fn three_chunks() -> (Playback<Recorder>, Recorder) {
        let recorder = Recorder::default();
        let chunks = split(&[1u8; 2500], "f.bin", 1024).unwrap();
        let playback = Playback::new(chunks, 2000, recorder.clone()).unwrap();
        (playback, recorder)
    }

    #[test]
    fn test_new_rejects_empty_sequence() {
        let result = Playback::new(Vec::new(), 2000, Recorder::default());
        assert!(matches!(result, Err(Error::Split(SplitError::EmptyInput))));
    }

    #[test]
    fn test_new_rejects_bad_interval() {
        let chunks = split(b"x", "x", 1).unwrap();
        let result = Playback::new(chunks, 10, Recorder::default());
        assert!(matches!(result, Err(Error::Playback(_))));
    }

    #[test]
    fn test_start_renders_first_chunk() {
        let (mut playback, recorder) = three_chunks();
        assert!(recorder.rendered().is_empty());
        let state = playback.start();
        assert_eq!(state.current_index, 0);
        assert!(!state.paused);
        assert_eq!(recorder.rendered(), vec![0]);
    }

    #[test]
    fn test_tick_wraps() {
        let (mut playback, recorder) = three_chunks();
        playback.jump_to(2).unwrap();
        assert_eq!(playback.tick().current_index, 0);
        assert_eq!(recorder.rendered(), vec![2, 0]);
    }

    #[test]
    fn test_tick_noop_while_paused() {
        let (mut playback, recorder) = three_chunks();
        assert!(playback.pause_toggle().paused);
        assert_eq!(playback.tick().current_index, 0);
        assert!(recorder.rendered().is_empty());

        assert!(!playback.pause_toggle().paused);
        assert_eq!(playback.tick().current_index, 1);
    }

    #[test]
    fn test_previous_wraps() {
        let (mut playback, _) = three_chunks();
        assert_eq!(playback.previous().current_index, 2);
    }

    #[test]
    fn test_next_wraps_and_works_while_paused() {
        let (mut playback, recorder) = three_chunks();
        playback.pause_toggle();
        playback.next();
        playback.next();
        assert_eq!(playback.next().current_index, 0);
        assert!(playback.state().paused);
        assert_eq!(recorder.rendered(), vec![1, 2, 0]);
    }

    #[test]
    fn test_jump_out_of_range_ignored() {
        let (mut playback, recorder) = three_chunks();
        playback.next();
        let before = playback.state();
        assert_eq!(
            playback.jump_to(3),
            Err(PlaybackError::IndexOutOfRange { index: 3, total: 3 })
        );
        assert_eq!(playback.state(), before);
        assert_eq!(recorder.rendered(), vec![1]);
    }

    #[test]
    fn test_reset() {
        let (mut playback, recorder) = three_chunks();
        playback.jump_to(2).unwrap();
        assert_eq!(playback.reset().current_index, 0);
        assert_eq!(recorder.rendered(), vec![2, 0]);
    }

    #[test]
    fn test_set_interval_bounds() {
        let (mut playback, _) = three_chunks();
        assert!(playback.set_interval(50).is_err());
        assert!(playback.set_interval(30_001).is_err());
        assert_eq!(playback.state().interval_ms, 2000);

        assert_eq!(playback.set_interval(5000).unwrap().interval_ms, 5000);
    }

    #[test]
    fn test_single_chunk_navigation() {
        let chunks = split(b"tiny", "t", 1024).unwrap();
        let mut playback = Playback::new(chunks, 100, Recorder::default()).unwrap();
        assert_eq!(playback.next().current_index, 0);
        assert_eq!(playback.previous().current_index, 0);
        assert_eq!(playback.tick().current_index, 0);
    }

    #[test]
    fn test_render_failure_keeps_state() {
        let chunks = split(&[0u8; 20], "f", 10).unwrap();
        let failing = |_: &[u8]| Err::<(), RenderError>(RenderError::Encode("too large".into()));
        let mut playback = Playback::new(chunks, 1000, failing).unwrap();
        assert_eq!(playback.next().current_index, 1);
        assert_eq!(playback.current_chunk().chunk_index(), 1);
    }
}
