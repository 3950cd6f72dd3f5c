//! Synthesized-clip cache.
//!
//! Stores audio bytes per (voice, text) pair along with the clip duration,
//! probed at insert time. The playback engine consumes only the duration
//! map; hosts hand the bytes to their audio elements.

use crate::{TtsError, TtsResult};
use std::collections::HashMap;
use std::io::Cursor;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Cache key: one spoken part in one voice.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClipKey {
    pub voice: String,
    pub text: String,
}

impl ClipKey {
    pub fn new(voice: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            voice: voice.into(),
            text: text.into(),
        }
    }
}

/// A synthesized clip with its probed duration.
#[derive(Debug, Clone)]
pub struct SynthesizedClip {
    pub audio: Vec<u8>,
    pub duration_sec: f64,
}

/// In-memory synthesis cache.
#[derive(Debug, Default)]
pub struct SynthesisCache {
    clips: HashMap<ClipKey, SynthesizedClip>,
}

impl SynthesisCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores synthesized bytes, probing their duration.
    ///
    /// Returns the probed duration in seconds.
    pub fn insert(
        &mut self,
        voice: impl Into<String>,
        text: impl Into<String>,
        audio: Vec<u8>,
    ) -> TtsResult<f64> {
        let duration_sec = probe_duration(&audio)?;
        self.clips.insert(
            ClipKey::new(voice, text),
            SynthesizedClip {
                audio,
                duration_sec,
            },
        );
        Ok(duration_sec)
    }

    pub fn get(&self, voice: &str, text: &str) -> Option<&SynthesizedClip> {
        self.clips.get(&ClipKey::new(voice, text))
    }

    pub fn contains(&self, voice: &str, text: &str) -> bool {
        self.clips.contains_key(&ClipKey::new(voice, text))
    }

    pub fn duration_sec(&self, voice: &str, text: &str) -> Option<f64> {
        self.get(voice, text).map(|c| c.duration_sec)
    }

    /// Snapshot of every cached duration, keyed the way the playback
    /// engine's duration lookup expects.
    pub fn durations(&self) -> HashMap<(String, String), f64> {
        self.clips
            .iter()
            .map(|(k, clip)| ((k.voice.clone(), k.text.clone()), clip.duration_sec))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }
}

/// Probes the duration of an encoded audio clip.
///
/// Prefers the container's frame count when the header carries one and
/// falls back to decoding the stream and counting frames.
pub fn probe_duration(data: &[u8]) -> TtsResult<f64> {
    let mss = MediaSourceStream::new(Box::new(Cursor::new(data.to_vec())), Default::default());
    let hint = Hint::new();
    let format_opts = FormatOptions::default();
    let metadata_opts = MetadataOptions::default();
    let decoder_opts = DecoderOptions::default();

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &format_opts, &metadata_opts)
        .map_err(|e| TtsError::DecodeError(format!("Unsupported format: {}", e)))?;

    let mut format = probed.format;
    let track = format
        .default_track()
        .ok_or_else(|| TtsError::DecodeError("No track found".to_string()))?;
    let track_id = track.id;
    let sample_rate = track.codec_params.sample_rate.unwrap_or(44100) as f64;

    if let Some(n_frames) = track.codec_params.n_frames {
        return Ok(n_frames as f64 / sample_rate);
    }

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &decoder_opts)
        .map_err(|e| TtsError::DecodeError(format!("Unsupported codec: {}", e)))?;

    let mut frames: u64 = 0;
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(_) => break,
        };
        if packet.track_id() != track_id {
            continue;
        }
        match decoder.decode(&packet) {
            Ok(decoded) => frames += decoded.frames() as u64,
            Err(_) => break,
        }
    }

    Ok(frames as f64 / sample_rate)
}
