mod common;

use common::{media_scene, FakeBackend};
use narrator_engine::loader::{LoadOutcome, VisualLoader, FRAME_TIMEOUT, METADATA_TIMEOUT};
use narrator_engine::media::{MediaBackend, MediaMetadata, MediaPlayer};
use narrator_engine::types::StageSize;
use std::sync::Arc;
use std::time::{Duration, Instant};

fn loader(backend: &Arc<FakeBackend>) -> VisualLoader {
    VisualLoader::new(
        Arc::clone(backend) as Arc<dyn MediaBackend>,
        StageSize::new(1280.0, 720.0),
    )
}

#[test]
fn test_load_completes_and_installs_hidden_visual() {
    let backend = FakeBackend::new();
    let mut loader = loader(&backend);
    let scene = media_scene("a.mp4", 1.0, 3.0);
    let now = Instant::now();

    loader.ensure_loaded(0, &scene, 1.5, 7, now);
    assert!(loader.poll(now).is_empty(), "metadata stage first");

    let events = loader.poll(now);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].scene_index, 0);
    assert_eq!(events[0].generation, 7);
    assert_eq!(events[0].outcome, LoadOutcome::Loaded);

    let visual = loader.visual(0).expect("visual installed");
    assert!(!visual.visible, "fresh visuals start hidden");
    assert!((visual.player.position() - 1.5).abs() < 1e-9);
    assert!(backend.state("a.mp4").lock().unwrap().paused);
}

#[test]
fn test_concurrent_loads_deduplicate() {
    let backend = FakeBackend::new();
    let mut loader = loader(&backend);
    let scene = media_scene("a.mp4", 0.0, 3.0);
    let now = Instant::now();

    loader.ensure_loaded(0, &scene, 0.5, 1, now);
    loader.ensure_loaded(0, &scene, 0.5, 2, now);
    assert_eq!(backend.opened("a.mp4"), 1, "one in-flight load per index");

    loader.poll(now);
    let events = loader.poll(now);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].generation, 2, "completion reports the newest request");
}

#[test]
fn test_metadata_timeout_leaves_scene_absent() {
    let backend = FakeBackend::new();
    backend.set_meta_delay("a.mp4", 10_000);
    let mut loader = loader(&backend);
    let scene = media_scene("a.mp4", 0.0, 3.0);
    let now = Instant::now();

    loader.ensure_loaded(0, &scene, 0.0, 1, now);
    assert!(loader.poll(now).is_empty());

    let late = now + METADATA_TIMEOUT + Duration::from_millis(10);
    let events = loader.poll(late);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].outcome, LoadOutcome::TimedOut);
    assert!(loader.visual(0).is_none(), "partial state released");
}

#[test]
fn test_frame_timeout_finishes_best_effort() {
    let backend = FakeBackend::new();
    backend.set_frame_delay("a.mp4", 10_000);
    let mut loader = loader(&backend);
    let scene = media_scene("a.mp4", 0.0, 3.0);
    let now = Instant::now();

    loader.ensure_loaded(0, &scene, 0.5, 1, now);
    assert!(loader.poll(now).is_empty());

    let late = now + FRAME_TIMEOUT + Duration::from_millis(10);
    let events = loader.poll(late);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].outcome, LoadOutcome::TimedOut);
    // Metadata and seek landed, only the frame sync expired: composite
    // best effort rather than flashing nothing forever.
    assert!(loader.visual(0).is_some());
}

#[test]
fn test_open_failure_is_reported_and_backed_off() {
    let backend = FakeBackend::new();
    backend.set_fail("broken.mp4");
    let mut loader = loader(&backend);
    let scene = media_scene("broken.mp4", 0.0, 3.0);
    let now = Instant::now();

    loader.ensure_loaded(0, &scene, 0.0, 1, now);
    let events = loader.poll(now);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].outcome, LoadOutcome::Failed);
    assert!(loader.visual(0).is_none());
    assert_eq!(backend.opened("broken.mp4"), 1);

    // Within the backoff window nothing re-opens.
    loader.ensure_loaded(0, &scene, 0.0, 2, now);
    assert_eq!(backend.opened("broken.mp4"), 1);

    // After the backoff the next attempt goes through.
    let later = now + Duration::from_secs(1);
    loader.ensure_loaded(0, &scene, 0.0, 3, later);
    assert_eq!(backend.opened("broken.mp4"), 2);
}

#[test]
fn test_retries_are_bounded() {
    let backend = FakeBackend::new();
    backend.set_fail("broken.mp4");
    let mut loader = loader(&backend);
    let scene = media_scene("broken.mp4", 0.0, 3.0);

    let mut now = Instant::now();
    for gen in 0..20u64 {
        loader.ensure_loaded(0, &scene, 0.0, gen, now);
        loader.poll(now);
        now += Duration::from_secs(60);
    }
    assert_eq!(
        backend.opened("broken.mp4"),
        5,
        "a persistently broken source settles into absent"
    );
}

#[test]
fn test_zero_dimension_media_is_rejected() {
    let backend = FakeBackend::new();
    backend.set_metadata(
        "flat.mp4",
        MediaMetadata {
            duration_sec: 4.0,
            width: 0,
            height: 0,
        },
    );
    let mut loader = loader(&backend);
    let scene = media_scene("flat.mp4", 0.0, 3.0);
    let now = Instant::now();

    loader.ensure_loaded(0, &scene, 0.0, 1, now);
    let events = loader.poll(now);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].outcome, LoadOutcome::Failed);
    assert!(loader.visual(0).is_none());
}

#[test]
fn test_base_transform_letterboxes_with_contain() {
    let backend = FakeBackend::new();
    backend.set_metadata(
        "tall.mp4",
        MediaMetadata {
            duration_sec: 4.0,
            width: 360,
            height: 720,
        },
    );
    let mut loader = loader(&backend);
    let mut scene = media_scene("tall.mp4", 0.0, 3.0);
    scene.object_fit = narrator_engine::types::ObjectFit::Contain;
    let now = Instant::now();

    loader.ensure_loaded(0, &scene, 0.0, 1, now);
    loader.poll(now);
    loader.poll(now);

    let visual = loader.visual(0).unwrap();
    // 360x720 contained in 1280x720: scaled to 360x720, centered.
    assert!((visual.base_transform.width - 360.0).abs() < 1e-3);
    assert!((visual.base_transform.height - 720.0).abs() < 1e-3);
    assert!((visual.base_transform.x - (1280.0 - 360.0) / 2.0).abs() < 1e-3);
    assert!((visual.base_transform.y - 0.0).abs() < 1e-3);
}

#[test]
fn test_release_is_idempotent() {
    let backend = FakeBackend::new();
    let mut loader = loader(&backend);
    let scene = media_scene("a.mp4", 0.0, 3.0);
    let now = Instant::now();

    // Releasing an index that was never loaded is a no-op.
    loader.release(3);

    loader.ensure_loaded(0, &scene, 0.0, 1, now);
    loader.poll(now);
    loader.poll(now);
    assert!(loader.visual(0).is_some());

    loader.release(0);
    assert!(loader.visual(0).is_none());
    assert!(backend.state("a.mp4").lock().unwrap().paused);
    loader.release(0);
}
