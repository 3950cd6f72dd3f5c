//! # Media Module
//!
//! The decode-backend boundary: the interfaces the engine drives media
//! through, and the threaded decoder implementation behind them.
//!
//! ## Responsibilities
//! - **MediaPlayer**: The handle the synchronizer seeks, plays and pauses.
//! - **MediaBackend**: Opens a [`MediaRef`](crate::scene::MediaRef) into a player.
//! - **AudioHandle**: Playback control for voice/music/effect clips.
//!
//! The engine never touches pixels or samples; the host compositor reads
//! decoded frames off the player, the engine only keeps the player's
//! position consistent with the master clock.

pub mod decoder;

pub use decoder::{DecodeBackend, DecodedPlayer};

use crate::errors::MediaError;
use crate::scene::MediaRef;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::NamedTempFile;

/// Metadata reported by the decode backend once a source's headers are read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MediaMetadata {
    /// Native duration of the source, in seconds.
    pub duration_sec: f64,
    pub width: u32,
    pub height: u32,
}

/// Specifies the data source for a media player.
pub enum MediaSource {
    /// Load from a local file path.
    Path(PathBuf),
    /// Load from raw bytes (in-memory).
    Bytes(Vec<u8>),
}

impl MediaSource {
    /// Resolves the source to a path, spilling bytes to a temp file.
    ///
    /// The returned temp file handle must be kept alive as long as the
    /// player reads from it.
    pub fn into_path(self) -> Result<(PathBuf, Option<Arc<NamedTempFile>>), MediaError> {
        match self {
            MediaSource::Path(p) => Ok((p, None)),
            MediaSource::Bytes(data) => {
                let mut temp = NamedTempFile::new()?;
                temp.write_all(&data)?;
                let path = temp.path().to_owned();
                Ok((path, Some(Arc::new(temp))))
            }
        }
    }
}

/// A seekable media element, the visual proxy's playback handle.
///
/// Implementations are expected to be non-blocking: `pump` drains whatever
/// the backend produced since the last tick, and readiness is observed
/// through `metadata`/`frame_ready` rather than awaited.
pub trait MediaPlayer: Send {
    /// Native metadata, once the backend has read it.
    fn metadata(&self) -> Option<MediaMetadata>;

    /// Moves the play position to `time_sec` in media time.
    fn seek(&mut self, time_sec: f64);

    fn play(&mut self);

    fn pause(&mut self);

    fn is_paused(&self) -> bool;

    /// The player's self-reported position, in media seconds.
    fn position(&self) -> f64;

    /// Drains backend completions (metadata, decoded frames) and requests
    /// the frame for the current position. Called once per tick.
    fn pump(&mut self);

    /// Whether a decoded frame for the current position is paintable.
    ///
    /// Seeking alone does not guarantee this; the lifecycle manager waits
    /// for it before first compositing a visual.
    fn frame_ready(&self) -> bool;
}

/// Opens media references into players.
///
/// The engine takes this as a collaborator so hosts (and tests) can
/// substitute their own decode strategy.
pub trait MediaBackend: Send + Sync {
    fn open(&self, media: &MediaRef) -> Result<Box<dyn MediaPlayer>, MediaError>;
}

/// Playback control for an audio clip (synthesized voice, music, effects).
///
/// Mirrors `MediaPlayer` without the frame machinery: audio elements are
/// either playing from an offset or paused at one.
pub trait AudioHandle: Send {
    /// Starts (or restarts) playback at `offset_sec` into the clip.
    fn play_from(&mut self, offset_sec: f64);

    fn pause(&mut self);

    /// Resumes from the current position.
    fn resume(&mut self);

    /// Stops playback and resets the position to zero.
    fn stop(&mut self);

    fn position(&self) -> f64;

    fn is_paused(&self) -> bool;

    /// Clip duration, when the element knows it.
    fn duration(&self) -> Option<f64>;
}
