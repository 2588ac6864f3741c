//! Sender configuration.

use crate::error::{Error, PlaybackError, SplitError};

/// Bytes of file content carried by each chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// Initial playback cadence.
pub const DEFAULT_INTERVAL_MS: u64 = 2000;

/// Longest a single render may hold up playback. Zero means never wait.
pub const DEFAULT_RENDER_TIMEOUT_MS: u64 = 500;

pub const MIN_INTERVAL_MS: u64 = 100;
pub const MAX_INTERVAL_MS: u64 = 30_000;

/// Settings for one transmit session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenderConfig {
    pub chunk_size: usize,
    pub interval_ms: u64,
    pub render_timeout_ms: u64,
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            interval_ms: DEFAULT_INTERVAL_MS,
            render_timeout_ms: DEFAULT_RENDER_TIMEOUT_MS,
        }
    }
}

impl SenderConfig {
    pub fn validate(&self) -> Result<(), Error> {
        if self.chunk_size == 0 {
            return Err(SplitError::InvalidChunkSize.into());
        }
        check_interval(self.interval_ms)?;
        Ok(())
    }
}

/// Check a cadence against `[MIN_INTERVAL_MS, MAX_INTERVAL_MS]`.
pub fn check_interval(ms: u64) -> Result<u64, PlaybackError> {
    if !(MIN_INTERVAL_MS..=MAX_INTERVAL_MS).contains(&ms) {
        return Err(PlaybackError::InvalidInterval {
            requested: ms,
            min: MIN_INTERVAL_MS,
            max: MAX_INTERVAL_MS,
        });
    }
    Ok(ms)
}

/// Parse operator text such as `" 5000 "` into a validated cadence.
pub fn parse_interval(input: &str) -> Result<u64, PlaybackError> {
    let trimmed = input.trim();
    let ms: u64 = trimmed
        .parse()
        .map_err(|_| PlaybackError::UnparsableInterval(trimmed.to_string()))?;
    check_interval(ms)
}
