//! # Resolve Module
//!
//! Maps a master-clock time to a position inside the active scene and inside
//! that scene's source media.
//!
//! The resolver reconciles the three timelines the engine juggles: the
//! authored scene timeline (variable, asynchronously-derived durations), the
//! source media timeline (a selected sub-window that may be shorter than the
//! authored duration and loops to fill it), and the transport's wall-clock
//! time. It is pure: clamping at both ends makes out-of-range inputs
//! unrepresentable downstream instead of asserting on them.

use crate::scene::Scene;
use crate::segment::{self, PlayableSegment, DURATION_EPSILON};

/// The position resolved for one clock sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedPosition {
    /// Index of the active scene in the authored list.
    pub scene_index: usize,
    /// Offset within the scene, in `[0, duration]`.
    pub scene_time: f64,
    /// Offset within the scene's source media, selection window applied.
    pub media_time: f64,
    /// The master time the resolution was computed for, after clamping.
    pub master_time: f64,
}

/// Resolves `master_time` against the playable segments.
///
/// With `force_scene_index` set (explicit scene selection in the UI),
/// resolution short-circuits to that scene with local time clamped to
/// `[0, duration)`, bypassing the time search. Forcing a non-playable scene
/// resolves to `None`.
///
/// Otherwise the segment containing `master_time` is found by binary search;
/// exact boundaries resolve toward the later segment. Times beyond the last
/// segment clamp to its final local time (a terminal state, not an error).
///
/// Returns `None` only when there are no playable segments.
pub fn resolve(
    scenes: &[Scene],
    segments: &[PlayableSegment],
    master_time: f64,
    force_scene_index: Option<usize>,
) -> Option<ResolvedPosition> {
    if segments.is_empty() {
        return None;
    }

    if let Some(scene_index) = force_scene_index {
        let seg = segment::segment_for_scene(segments, scene_index)?;
        let local = (master_time - seg.start).clamp(0.0, seg.duration - DURATION_EPSILON);
        return Some(position(scenes, seg, local));
    }

    let t = master_time.max(0.0);
    let last = segments.last().expect("non-empty segments");
    if t >= last.end() {
        return Some(position(scenes, last, last.duration));
    }

    // First segment whose window end lies past t; its window contains t.
    let idx = segments.partition_point(|s| s.end() <= t);
    let seg = &segments[idx];
    Some(position(scenes, seg, t - seg.start))
}

fn position(scenes: &[Scene], seg: &PlayableSegment, scene_time: f64) -> ResolvedPosition {
    let scene = &scenes[seg.scene_index];
    ResolvedPosition {
        scene_index: seg.scene_index,
        scene_time,
        media_time: media_time_for(scene, scene_time),
        master_time: seg.start + scene_time,
    }
}

/// Computes the source-media offset for a scene-local time.
///
/// The selection window's start shifts the local time into media
/// coordinates. When the window's span exceeds the media's native duration,
/// the clip loops: the local time wraps modulo the native duration. If the
/// native duration is not yet known (metadata still loading) the offset is
/// used unmodified; a later tick re-resolves once metadata arrives.
pub fn media_time_for(scene: &Scene, scene_time: f64) -> f64 {
    let base = scene.selection.start_sec;
    match scene.native_duration_sec {
        Some(native)
            if native > DURATION_EPSILON && scene.selection.span() > native + DURATION_EPSILON =>
        {
            base + (scene_time % native)
        }
        _ => base + scene_time,
    }
}
