//! optic-relay: one-way file transfer over an optical channel.
//!
//! The sender splits a file into self-describing chunks and cycles through
//! them on screen as optical symbols; a camera on the other side captures
//! whatever it can. There is no return channel, so every chunk carries the
//! file id, name, count and its own CRC-32.
//!
//! # Modules
//!
//! - `splitter`: file bytes to ordered [`Chunk`]s
//! - `envelope`: JSON wire form of a chunk
//! - `playback`: which chunk is shown, as a pure state machine
//! - `controller`: locking and autoplay timer around `playback`
//! - `scheduler`: repeating timer capability
//! - `render`: symbol renderer capability and its worker thread
//! - `console`: line-based operator commands

pub mod chunk;
pub mod config;
pub mod console;
pub mod controller;
pub mod digest;
pub mod envelope;
pub mod error;
pub mod playback;
pub mod render;
pub mod scheduler;
pub mod splitter;

pub use chunk::{Chunk, FileId};
pub use config::SenderConfig;
pub use controller::PlaybackController;
pub use error::{DecodeError, Error, PlaybackError, RenderError, Result, SplitError};
pub use playback::PlaybackState;
pub use render::{RenderWorker, SymbolRenderer};
pub use scheduler::Scheduler;
pub use splitter::{split, split_file};
