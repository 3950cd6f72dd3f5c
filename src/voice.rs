//! # Voice Module
//!
//! Audio-side synchronization: maps the master clock to the synthesized
//! voice clip that should be playing, and keeps voice, background music and
//! sound effects consistent with the transport.
//!
//! ## Responsibilities
//! - **Segments**: Distribute each scene's duration across its spoken parts
//!   and index them for binary search.
//! - **Voice control**: Stop-before-start on segment change, drift-tolerant
//!   offset correction on continuation.
//! - **Music/effects**: Looping background track and per-scene effects,
//!   pausing and resuming with the transport.
//!
//! Segment building never blocks on missing synthesis data: a scene whose
//! part durations are not all cached collapses to a single segment.

use crate::media::AudioHandle;
use crate::scene::Scene;
use crate::segment::{self, DURATION_EPSILON};
use std::collections::HashMap;
use unicode_segmentation::UnicodeSegmentation;

/// Voice/music playback drift beyond this forces an offset correction.
pub const AUDIO_DRIFT_TOLERANCE: f64 = 0.25;

/// Speech-rate fallback for scripts with no synthesized parts yet.
pub const CHARS_PER_SECOND: f64 = 15.0;

/// Band within which the cached-average estimate is considered plausible
/// relative to the character-count estimate.
const ESTIMATE_RATIO_BAND: (f64, f64) = (0.5, 2.0);

/// One spoken sub-phrase positioned on the master timeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioSegment {
    pub scene_index: usize,
    pub part_index: usize,
    /// Start offset on the master timeline, in seconds.
    pub start: f64,
    /// End offset on the master timeline, in seconds.
    pub end: f64,
}

impl AudioSegment {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Read access to cached synthesis durations, keyed by voice and part text.
///
/// The engine never triggers synthesis; the TTS layer fills whatever backs
/// this lookup.
pub trait DurationLookup {
    fn duration_sec(&self, voice: &str, text: &str) -> Option<f64>;
}

impl DurationLookup for HashMap<(String, String), f64> {
    fn duration_sec(&self, voice: &str, text: &str) -> Option<f64> {
        self.get(&(voice.to_string(), text.to_string())).copied()
    }
}

/// Splits a script into the sub-phrases the TTS layer synthesizes.
pub fn split_parts(script: &str) -> Vec<&str> {
    script
        .unicode_sentences()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Builds the ordered audio segment index for a scene list.
///
/// Each playable scene's duration is distributed across its script parts
/// proportionally to their cached synthesized durations. When any part's
/// duration is unknown the whole scene becomes one segment (graceful
/// degradation). The result is sorted by `start` and tiles the master
/// timeline exactly.
pub fn build_segments(scenes: &[Scene], durations: &dyn DurationLookup) -> Vec<AudioSegment> {
    let playable = segment::playable_segments(scenes);
    let mut out = Vec::new();

    for seg in &playable {
        let scene = &scenes[seg.scene_index];
        let parts = split_parts(&scene.script);
        let cached: Option<Vec<f64>> = parts
            .iter()
            .map(|p| durations.duration_sec(&scene.voice, p))
            .collect();

        match cached {
            Some(durs) if durs.len() > 1 && durs.iter().sum::<f64>() > DURATION_EPSILON => {
                let total: f64 = durs.iter().sum();
                let mut offset = seg.start;
                for (part_index, d) in durs.iter().enumerate() {
                    // Last part absorbs rounding so the scene tiles exactly.
                    let end = if part_index == durs.len() - 1 {
                        seg.end()
                    } else {
                        offset + seg.duration * d / total
                    };
                    out.push(AudioSegment {
                        scene_index: seg.scene_index,
                        part_index,
                        start: offset,
                        end,
                    });
                    offset = end;
                }
            }
            _ => out.push(AudioSegment {
                scene_index: seg.scene_index,
                part_index: 0,
                start: seg.start,
                end: seg.end(),
            }),
        }
    }

    out
}

/// Finds the segment active at `master_time` and the offset inside it.
///
/// Out-of-range times clamp to the first or last segment; `None` only when
/// there are no segments at all.
pub fn resolve_active(segments: &[AudioSegment], master_time: f64) -> Option<(usize, f64)> {
    if segments.is_empty() {
        return None;
    }
    let first = &segments[0];
    if master_time < first.start {
        return Some((0, 0.0));
    }
    let last_idx = segments.len() - 1;
    let last = &segments[last_idx];
    if master_time >= last.end {
        return Some((last_idx, last.duration()));
    }
    let idx = segments.partition_point(|s| s.end <= master_time);
    Some((idx, master_time - segments[idx].start))
}

/// Provisional duration for a scene whose synthesis is incomplete.
///
/// When every part is cached this is the authoritative sum. Otherwise two
/// estimates are computed (average of the cached parts extrapolated to the
/// part count, and a characters-per-second heuristic) and the extrapolation
/// is used only when it falls in a plausible band around the character
/// estimate. Callers must treat the result as provisional: it is superseded
/// by the synthesized duration as soon as that arrives.
pub fn estimate_voice_duration(scene: &Scene, durations: &dyn DurationLookup) -> Option<f64> {
    let parts = split_parts(&scene.script);
    if parts.is_empty() {
        return None;
    }

    let cached: Vec<f64> = parts
        .iter()
        .filter_map(|p| durations.duration_sec(&scene.voice, p))
        .collect();
    if cached.len() == parts.len() {
        return Some(cached.iter().sum());
    }

    let chars = scene.script.graphemes(true).filter(|g| !g.trim().is_empty()).count();
    let char_estimate = chars as f64 / CHARS_PER_SECOND;
    if cached.is_empty() {
        return Some(char_estimate);
    }

    let avg = cached.iter().sum::<f64>() / cached.len() as f64;
    let extrapolated = avg * parts.len() as f64;
    if char_estimate > DURATION_EPSILON {
        let ratio = extrapolated / char_estimate;
        if ratio >= ESTIMATE_RATIO_BAND.0 && ratio <= ESTIMATE_RATIO_BAND.1 {
            return Some(extrapolated);
        }
    }
    Some(char_estimate)
}

/// Supplies playback handles for synthesized clips and music.
///
/// Returning `None` means the clip is not available yet; the controllers
/// stay silent and retry on a later tick.
pub trait AudioLibrary: Send {
    fn voice(&mut self, scene_index: usize, part_index: usize) -> Option<Box<dyn AudioHandle>>;

    fn music(&mut self) -> Option<Box<dyn AudioHandle>>;

    fn effect(&mut self, scene_index: usize) -> Option<Box<dyn AudioHandle>>;
}

/// Drives voice playback from the audio segment index.
#[derive(Default)]
pub struct VoiceController {
    current: Option<(usize, usize)>,
    handle: Option<Box<dyn AudioHandle>>,
}

impl VoiceController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconciles voice playback with the clock.
    ///
    /// On segment change the previous clip is stopped before the next one
    /// starts (no overlap). On continuation only the offset is corrected,
    /// and only past the drift tolerance; a clip paused by the transport is
    /// resumed.
    pub fn sync(
        &mut self,
        library: &mut dyn AudioLibrary,
        segments: &[AudioSegment],
        master_time: f64,
        playing: bool,
    ) {
        let Some((idx, offset)) = resolve_active(segments, master_time) else {
            self.stop();
            return;
        };
        let seg = &segments[idx];
        let key = (seg.scene_index, seg.part_index);

        if self.current != Some(key) {
            if let Some(handle) = self.handle.as_mut() {
                handle.stop();
            }
            self.handle = library.voice(key.0, key.1);
            // An unavailable clip stays un-keyed so a later tick retries.
            self.current = self.handle.is_some().then_some(key);
            if let Some(handle) = self.handle.as_mut() {
                if playing {
                    handle.play_from(offset);
                } else {
                    handle.pause();
                }
            }
            return;
        }

        if let Some(handle) = self.handle.as_mut() {
            if !playing {
                if !handle.is_paused() {
                    handle.pause();
                }
                return;
            }
            if (handle.position() - offset).abs() > AUDIO_DRIFT_TOLERANCE {
                handle.play_from(offset);
            } else if handle.is_paused() {
                handle.resume();
            }
        }
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.as_mut() {
            handle.stop();
        }
        self.handle = None;
        self.current = None;
    }
}

/// Loops a background-music track over the master timeline.
#[derive(Default)]
pub struct MusicController {
    handle: Option<Box<dyn AudioHandle>>,
}

impl MusicController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sync(&mut self, library: &mut dyn AudioLibrary, master_time: f64, playing: bool) {
        if self.handle.is_none() {
            self.handle = library.music();
        }
        let Some(handle) = self.handle.as_mut() else {
            return;
        };

        let offset = match handle.duration() {
            Some(d) if d > DURATION_EPSILON => master_time % d,
            _ => master_time,
        };

        if !playing {
            if !handle.is_paused() {
                handle.pause();
            }
            return;
        }
        if (handle.position() - offset).abs() > AUDIO_DRIFT_TOLERANCE {
            handle.play_from(offset);
        } else if handle.is_paused() {
            handle.resume();
        }
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.as_mut() {
            handle.stop();
        }
        self.handle = None;
    }
}

/// Fires per-scene sound effects at scene entry.
#[derive(Default)]
pub struct EffectController {
    current_scene: Option<usize>,
    handle: Option<Box<dyn AudioHandle>>,
}

impl EffectController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sync(
        &mut self,
        library: &mut dyn AudioLibrary,
        scenes: &[Scene],
        scene_index: Option<usize>,
        scene_time: f64,
        playing: bool,
    ) {
        let Some(idx) = scene_index else {
            self.stop();
            return;
        };

        if self.current_scene != Some(idx) {
            if let Some(handle) = self.handle.as_mut() {
                handle.stop();
            }
            self.handle = match scenes.get(idx).and_then(|s| s.effect.as_ref()) {
                Some(_) => library.effect(idx),
                None => None,
            };
            self.current_scene = Some(idx);
            if playing {
                if let Some(handle) = self.handle.as_mut() {
                    handle.play_from(scene_time.max(0.0));
                }
            }
            return;
        }

        if let Some(handle) = self.handle.as_mut() {
            if playing {
                if handle.is_paused() {
                    handle.resume();
                }
            } else if !handle.is_paused() {
                handle.pause();
            }
        }
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.as_mut() {
            handle.stop();
        }
        self.handle = None;
        self.current_scene = None;
    }
}
