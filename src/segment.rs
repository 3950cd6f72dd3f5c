//! # Segment Module
//!
//! Pure functions deriving the master timeline from an ordered scene list.
//!
//! ## Responsibilities
//! - **Playability**: Which scenes contribute time to the master timeline.
//! - **Segments**: Cumulative offsets and durations of the playable scenes.
//!
//! Non-playable scenes (no media, or a duration that rounds to zero) are
//! invisible to the clock: they contribute no time and are never targets of
//! time resolution. Everything here is recomputed on timeline mutation; no
//! state is kept.

use crate::scene::Scene;

/// Durations below this are treated as zero to absorb floating-point noise.
///
/// A sub-epsilon scene is non-playable, never a zero-length segment, so the
/// resolver can never divide by or loop over a zero duration.
pub const DURATION_EPSILON: f64 = 1e-6;

/// A time-positioned interval on the master timeline for one playable scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayableSegment {
    /// Index of the scene in the authored scene list.
    pub scene_index: usize,
    /// Offset of the segment start on the master timeline, in seconds.
    pub start: f64,
    /// Segment duration in seconds. Always `> DURATION_EPSILON`.
    pub duration: f64,
}

impl PlayableSegment {
    /// Exclusive end of the segment's window on the master timeline.
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

/// A scene is playable iff it has a media reference and a positive effective
/// duration.
pub fn is_playable(scene: &Scene) -> bool {
    scene.media.is_some() && scene.effective_duration() > DURATION_EPSILON
}

/// Derives the ordered playable segments for a scene list.
///
/// Consecutive segments tile `[0, master_duration)` exactly: each segment
/// starts where the previous one ends.
pub fn playable_segments(scenes: &[Scene]) -> Vec<PlayableSegment> {
    let mut segments = Vec::new();
    let mut offset = 0.0;
    for (scene_index, scene) in scenes.iter().enumerate() {
        if !is_playable(scene) {
            continue;
        }
        let duration = scene.effective_duration();
        segments.push(PlayableSegment {
            scene_index,
            start: offset,
            duration,
        });
        offset += duration;
    }
    segments
}

/// Total length of the master timeline.
pub fn master_duration(segments: &[PlayableSegment]) -> f64 {
    segments.last().map(|s| s.end()).unwrap_or(0.0)
}

/// Sum of segment durations strictly before the given scene index.
///
/// This is the master-timeline offset a scene would start at, whether or not
/// the index itself is playable.
pub fn cumulative_duration_before(segments: &[PlayableSegment], scene_index: usize) -> f64 {
    segments
        .iter()
        .take_while(|s| s.scene_index < scene_index)
        .map(|s| s.duration)
        .sum()
}

/// Finds the segment for a given scene index, if that scene is playable.
pub fn segment_for_scene(
    segments: &[PlayableSegment],
    scene_index: usize,
) -> Option<&PlayableSegment> {
    segments.iter().find(|s| s.scene_index == scene_index)
}
