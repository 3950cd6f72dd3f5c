mod common;

use common::media_scene;
use narrator_engine::resolve::{media_time_for, resolve};
use narrator_engine::segment::{master_duration, playable_segments};

#[test]
fn test_resolution_is_total_over_the_master_timeline() {
    let scenes = vec![
        media_scene("a.mp4", 0.5, 2.5),
        media_scene("b.mp4", 0.0, 0.75),
        media_scene("c.mp4", 1.0, 4.25),
    ];
    let segments = playable_segments(&scenes);
    let total = master_duration(&segments);

    let mut t = 0.0;
    while t < total {
        let resolved = resolve(&scenes, &segments, t, None)
            .unwrap_or_else(|| panic!("no resolution at {}", t));
        let seg = segments
            .iter()
            .find(|s| s.scene_index == resolved.scene_index)
            .unwrap();
        assert!(
            t >= seg.start - 1e-9 && t < seg.end() + 1e-9,
            "t={} resolved outside its segment window",
            t
        );
        assert!(resolved.scene_time >= 0.0 && resolved.scene_time <= seg.duration + 1e-9);
        t += 0.05;
    }
}

#[test]
fn test_out_of_range_times_clamp() {
    let scenes = vec![
        media_scene("a.mp4", 0.0, 2.0),
        media_scene("b.mp4", 0.0, 3.0),
    ];
    let segments = playable_segments(&scenes);

    let negative = resolve(&scenes, &segments, -1.0, None).unwrap();
    let zero = resolve(&scenes, &segments, 0.0, None).unwrap();
    assert_eq!(negative, zero);

    // Past the end: terminal state on the last segment.
    let past = resolve(&scenes, &segments, 100.0, None).unwrap();
    assert_eq!(past.scene_index, 1);
    assert!((past.scene_time - 3.0).abs() < 1e-9);
    assert!((past.master_time - 5.0).abs() < 1e-9);
}

#[test]
fn test_short_clip_loops_to_fill_its_window() {
    // Selection window [0, 5) over a 2-second clip.
    let mut scene = media_scene("a.mp4", 0.0, 5.0);
    scene.native_duration_sec = Some(2.0);

    assert!((media_time_for(&scene, 4.3) - 0.3).abs() < 1e-9);

    let mut s = 0.0;
    while s < 5.0 {
        let expected = 0.0 + (s % 2.0);
        assert!(
            (media_time_for(&scene, s) - expected).abs() < 1e-9,
            "looping mismatch at local time {}",
            s
        );
        s += 0.1;
    }
}

#[test]
fn test_looping_respects_selection_start() {
    let mut scene = media_scene("a.mp4", 1.5, 6.5);
    scene.native_duration_sec = Some(2.0);
    assert!((media_time_for(&scene, 3.0) - (1.5 + 1.0)).abs() < 1e-9);
}

#[test]
fn test_unknown_native_duration_skips_looping() {
    // Metadata not loaded yet: no modulo, corrected on a later tick.
    let scene = media_scene("a.mp4", 1.0, 6.0);
    assert!((media_time_for(&scene, 4.5) - 5.5).abs() < 1e-9);
}

#[test]
fn test_window_longer_than_clip_without_looping_signal() {
    // Native duration exceeds the window span: plain offset, no wrap.
    let mut scene = media_scene("a.mp4", 1.0, 3.0);
    scene.native_duration_sec = Some(10.0);
    assert!((media_time_for(&scene, 1.5) - 2.5).abs() < 1e-9);
}

#[test]
fn test_forced_scene_short_circuits() {
    let scenes = vec![
        media_scene("a.mp4", 0.0, 2.0),
        media_scene("b.mp4", 0.0, 3.0),
    ];
    let segments = playable_segments(&scenes);

    // Master time points into scene 0; forcing scene 1 wins.
    let forced = resolve(&scenes, &segments, 0.5, Some(1)).unwrap();
    assert_eq!(forced.scene_index, 1);
    assert!(forced.scene_time.abs() < 1e-9);

    // Local time clamps to [0, duration).
    let clamped = resolve(&scenes, &segments, 100.0, Some(1)).unwrap();
    assert_eq!(clamped.scene_index, 1);
    assert!(clamped.scene_time < 3.0);
}

#[test]
fn test_forced_non_playable_scene_resolves_to_none() {
    let scenes = vec![media_scene("a.mp4", 0.0, 2.0), common::blank_scene()];
    let segments = playable_segments(&scenes);
    assert!(resolve(&scenes, &segments, 0.0, Some(1)).is_none());
}

#[test]
fn test_no_playable_segments_resolves_to_none() {
    let scenes = vec![common::blank_scene()];
    let segments = playable_segments(&scenes);
    assert!(resolve(&scenes, &segments, 0.0, None).is_none());
    assert!(resolve(&[], &[], 0.0, None).is_none());
}

#[test]
fn test_voice_duration_extends_scene_past_its_window() {
    // Narration runs 6s over a 2s window of a 4s clip: local times past the
    // window still resolve (the synchronizer freezes the frame there), and
    // the window span (2.0) does not exceed the native duration so there is
    // no looping.
    let mut scene = media_scene("a.mp4", 1.0, 3.0);
    scene.voice_duration_sec = Some(6.0);
    scene.native_duration_sec = Some(4.0);
    let scenes = vec![scene];
    let segments = playable_segments(&scenes);
    assert!((master_duration(&segments) - 6.0).abs() < 1e-9);

    let resolved = resolve(&scenes, &segments, 4.5, None).unwrap();
    assert_eq!(resolved.scene_index, 0);
    assert!((resolved.scene_time - 4.5).abs() < 1e-9);
    assert!((resolved.media_time - 5.5).abs() < 1e-9);
}
