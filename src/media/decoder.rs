//! Threaded decoding behind the [`MediaPlayer`] trait.
//!
//! One worker thread per open source: commands in, metadata and decoded
//! frames out over bounded channels. The worker coalesces bursts of frame
//! requests down to the newest one, keeps a small frame cache for
//! back-and-forth scrubbing, and seeks only when the target is outside its
//! forward decode window. The player side is polled from the tick loop and
//! never blocks.

use crate::errors::MediaError;
use crate::media::{MediaBackend, MediaMetadata, MediaPlayer, MediaSource};
use crate::scene::MediaRef;
use crossbeam_channel::{Receiver, Sender};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tempfile::NamedTempFile;
use tracing::{debug, error};

/// A decoded frame is considered paintable for positions within this many
/// seconds of its timestamp.
pub const FRAME_READY_TOLERANCE: f64 = 0.08;

/// Commands sent to the decoder thread.
pub enum DecodeCommand {
    /// Request a frame at the specified timestamp (in seconds).
    GetFrame(f64),
}

/// Responses from the decoder thread.
#[derive(Debug)]
pub enum DecodeEvent {
    /// Source metadata, sent once after the headers are read.
    Metadata(MediaMetadata),
    /// A decoded frame near a requested timestamp.
    Frame(DecodedFrame),
    /// Critical error during decoding.
    Error(String),
}

/// Raw RGBA pixels for one decoded frame.
#[derive(Debug, Clone)]
pub struct DecodedFrame {
    pub time: f64,
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

#[cfg(feature = "video-rs")]
mod worker {
    use super::*;
    use crossbeam_channel::{bounded, unbounded};
    use std::collections::VecDeque;
    use std::thread;

    /// Spawns the decoder thread for `path` and returns its channel ends.
    pub fn spawn(path: PathBuf) -> (Sender<DecodeCommand>, Receiver<DecodeEvent>) {
        let (cmd_tx, cmd_rx) = unbounded();
        let (evt_tx, evt_rx) = bounded(5);

        thread::spawn(move || {
            let mut decoder = match video_rs::Decoder::new(path.clone()) {
                Ok(d) => d,
                Err(e) => {
                    let _ = evt_tx.send(DecodeEvent::Error(e.to_string()));
                    return;
                }
            };

            let (width, height) = decoder.size();
            let duration_sec = decoder
                .duration()
                .map(|d| d.as_secs_f64())
                .unwrap_or(0.0);
            if evt_tx
                .send(DecodeEvent::Metadata(MediaMetadata {
                    duration_sec,
                    width,
                    height,
                }))
                .is_err()
            {
                return;
            }

            let mut cache: VecDeque<DecodedFrame> = VecDeque::with_capacity(15);
            let mut current_decoder_time = 0.0;

            loop {
                // Coalesce bursts: only the newest request matters.
                let target_time = match cmd_rx.recv() {
                    Ok(DecodeCommand::GetFrame(mut t)) => {
                        while let Ok(DecodeCommand::GetFrame(next_t)) = cmd_rx.try_recv() {
                            t = next_t;
                        }
                        t
                    }
                    Err(_) => break,
                };

                // Check cache
                if let Some(idx) = cache
                    .iter()
                    .position(|f| (f.time - target_time).abs() < 0.02)
                {
                    if evt_tx.send(DecodeEvent::Frame(cache[idx].clone())).is_err() {
                        break;
                    }
                    continue;
                }

                // Seek if the target is behind us or far ahead
                let diff = target_time - current_decoder_time;
                if diff < -0.1 || diff > 2.0 {
                    let ms = (target_time * 1000.0) as i64;
                    if decoder.seek(ms).is_err() {
                        continue;
                    }
                    current_decoder_time = target_time;
                }

                let max_decode_steps = 60;
                let mut steps = 0;

                loop {
                    match decoder.decode() {
                        Ok((time, frame)) => {
                            steps += 1;
                            let t = time.as_secs_f64();
                            current_decoder_time = t;

                            let shape = frame.shape();
                            if shape.len() == 3 && shape[2] >= 3 {
                                let h = shape[0] as u32;
                                let w = shape[1] as u32;
                                let channels = shape[2];
                                let (bytes, _) = frame.into_raw_vec_and_offset();

                                let data = if channels == 3 {
                                    let mut rgba = Vec::with_capacity((w * h * 4) as usize);
                                    for chunk in bytes.chunks(3) {
                                        rgba.extend_from_slice(chunk);
                                        rgba.push(255);
                                    }
                                    rgba
                                } else {
                                    bytes
                                };

                                let decoded = DecodedFrame {
                                    time: t,
                                    data,
                                    width: w,
                                    height: h,
                                };
                                if cache.len() >= 15 {
                                    cache.pop_front();
                                }
                                cache.push_back(decoded.clone());

                                if (t - target_time).abs() < 0.04 {
                                    if evt_tx.send(DecodeEvent::Frame(decoded)).is_err() {
                                        return;
                                    }
                                    break;
                                }
                            }

                            if t > target_time + 0.1 {
                                break;
                            }
                            if steps > max_decode_steps {
                                break;
                            }
                        }
                        Err(_) => {
                            // End of stream; keep whatever is cached. The
                            // player holds its last good frame.
                            break;
                        }
                    }
                }
            }
        });

        (cmd_tx, evt_rx)
    }
}

#[cfg(not(feature = "video-rs"))]
mod worker {
    use super::*;
    use crossbeam_channel::{bounded, unbounded};
    use ndarray::Array3;
    use std::thread;

    /// Deterministic mock decoder: fixed metadata, instant opaque frames.
    pub fn spawn(_path: PathBuf) -> (Sender<DecodeCommand>, Receiver<DecodeEvent>) {
        let (cmd_tx, cmd_rx) = unbounded();
        let (evt_tx, evt_rx) = bounded(5);

        thread::spawn(move || {
            let _ = evt_tx.send(DecodeEvent::Metadata(MediaMetadata {
                duration_sec: 10.0,
                width: 640,
                height: 360,
            }));

            loop {
                let t = match cmd_rx.recv() {
                    Ok(DecodeCommand::GetFrame(t)) => t,
                    Err(_) => break,
                };
                let (h, w) = (2usize, 2usize);
                let mut pixels = Array3::<u8>::zeros((h, w, 4));
                pixels.slice_mut(ndarray::s![.., .., 3]).fill(255);
                let (data, _) = pixels.into_raw_vec_and_offset();
                let frame = DecodedFrame {
                    time: t,
                    data,
                    width: w as u32,
                    height: h as u32,
                };
                if evt_tx.send(DecodeEvent::Frame(frame)).is_err() {
                    break;
                }
            }
        });

        (cmd_tx, evt_rx)
    }
}

/// A media player backed by the threaded decoder.
///
/// Playback position is a local clock: it advances with wall time while
/// playing and holds while paused. Each `pump` requests the frame for the
/// current position; the worker answers with the nearest decodable frame,
/// which the host compositor reads via [`DecodedPlayer::latest_frame`].
pub struct DecodedPlayer {
    cmd_tx: Sender<DecodeCommand>,
    evt_rx: Receiver<DecodeEvent>,
    meta: Option<MediaMetadata>,
    latest: Option<DecodedFrame>,
    base_position: f64,
    play_anchor: Option<Instant>,
    last_request: Option<f64>,
    // Keep byte-backed sources alive for the worker
    _temp_file: Option<Arc<NamedTempFile>>,
}

impl DecodedPlayer {
    pub fn open(source: MediaSource) -> Result<Self, MediaError> {
        let (path, temp_file) = source.into_path()?;
        let (cmd_tx, evt_rx) = worker::spawn(path);
        Ok(Self {
            cmd_tx,
            evt_rx,
            meta: None,
            latest: None,
            base_position: 0.0,
            play_anchor: None,
            last_request: None,
            _temp_file: temp_file,
        })
    }

    /// The most recent decoded frame, for the host compositor.
    pub fn latest_frame(&self) -> Option<&DecodedFrame> {
        self.latest.as_ref()
    }
}

impl MediaPlayer for DecodedPlayer {
    fn metadata(&self) -> Option<MediaMetadata> {
        self.meta
    }

    fn seek(&mut self, time_sec: f64) {
        self.base_position = time_sec.max(0.0);
        if self.play_anchor.is_some() {
            self.play_anchor = Some(Instant::now());
        }
        self.last_request = None;
    }

    fn play(&mut self) {
        if self.play_anchor.is_none() {
            self.play_anchor = Some(Instant::now());
        }
    }

    fn pause(&mut self) {
        if let Some(anchor) = self.play_anchor.take() {
            self.base_position += anchor.elapsed().as_secs_f64();
        }
    }

    fn is_paused(&self) -> bool {
        self.play_anchor.is_none()
    }

    fn position(&self) -> f64 {
        let elapsed = self
            .play_anchor
            .map(|a| a.elapsed().as_secs_f64())
            .unwrap_or(0.0);
        self.base_position + elapsed
    }

    fn pump(&mut self) {
        while let Ok(event) = self.evt_rx.try_recv() {
            match event {
                DecodeEvent::Metadata(meta) => {
                    debug!(
                        duration = meta.duration_sec,
                        width = meta.width,
                        height = meta.height,
                        "media metadata loaded"
                    );
                    self.meta = Some(meta);
                }
                DecodeEvent::Frame(frame) => {
                    self.latest = Some(frame);
                }
                DecodeEvent::Error(e) => {
                    error!("decoder error: {}", e);
                }
            }
        }

        let pos = self.position();
        let needs_request = self.last_request.map_or(true, |r| (r - pos).abs() > 0.01);
        if needs_request {
            let _ = self.cmd_tx.send(DecodeCommand::GetFrame(pos));
            self.last_request = Some(pos);
        }
    }

    fn frame_ready(&self) -> bool {
        match &self.latest {
            Some(frame) => (frame.time - self.position()).abs() < FRAME_READY_TOLERANCE,
            None => false,
        }
    }
}

/// The default [`MediaBackend`]: media refs are file paths decoded on worker
/// threads.
pub struct DecodeBackend;

impl MediaBackend for DecodeBackend {
    fn open(&self, media: &MediaRef) -> Result<Box<dyn MediaPlayer>, MediaError> {
        let path = PathBuf::from(media.as_str());
        let player = DecodedPlayer::open(MediaSource::Path(path))?;
        Ok(Box::new(player))
    }
}
