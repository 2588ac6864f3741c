//! Error types for the optical relay.
//!
//! One enum per failure domain, collected into [`Error`] for callers that
//! do not care which stage failed.

use thiserror::Error;

/// Top-level error type.
#[derive(Debug, Error)]
pub enum Error {
    #[error("split error: {0}")]
    Split(#[from] SplitError),

    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("playback error: {0}")]
    Playback(#[from] PlaybackError),

    #[error("render error: {0}")]
    Render(#[from] RenderError),
}

/// Failures while turning file bytes into chunks.
#[derive(Debug, Error)]
pub enum SplitError {
    /// Zero-byte source; zero chunks cannot be played back.
    #[error("input is empty: nothing to split")]
    EmptyInput,

    /// The content digest could not be computed.
    #[error("content digest unavailable: {0}")]
    DigestUnavailable(String),

    #[error("chunk size must be greater than zero")]
    InvalidChunkSize,

    #[error("{0} chunks exceeds the envelope's 32-bit chunk count")]
    TooManyChunks(usize),

    /// Reading the source file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Receiver-side envelope parsing failures.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),
}

/// Rejected playback commands. None of these change playback state.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlaybackError {
    #[error("interval must be between {min} and {max} ms, got {requested}")]
    InvalidInterval { requested: u64, min: u64, max: u64 },

    #[error("interval is not a number: {0:?}")]
    UnparsableInterval(String),

    #[error("chunk index {index} out of range (total {total})")]
    IndexOutOfRange { index: usize, total: usize },
}

/// Symbol renderer failures.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("symbol encoding failed: {0}")]
    Encode(String),

    /// The renderer did not finish the frame in time; it is still pending.
    #[error("render did not finish within {0:?}")]
    Timeout(std::time::Duration),

    /// An earlier frame is still being rendered; this one replaced any
    /// frame already waiting.
    #[error("renderer busy with an earlier frame")]
    Busy,

    #[error("render worker stopped")]
    Stopped,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;
