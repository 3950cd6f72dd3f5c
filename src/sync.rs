//! # Sync Module
//!
//! The playback synchronizer: one `render_at` call per clock sample keeps
//! every visual, subtitle and media position consistent with the master
//! time.
//!
//! ## Responsibilities
//! - **Resolution**: Map the clock to the active scene via [`resolve`].
//! - **Transitions**: Apply cached state immediately on scene change, then
//!   reload asynchronously; stale completions are dropped by generation.
//! - **Drift**: Re-seek media only past a tolerance while playing; hold the
//!   exact position while paused; freeze the clip when the authored
//!   duration outruns the selection window.
//! - **Visibility**: After every apply exactly one scene's visual is
//!   visible (or zero when the active scene has no media).
//!
//! All mutable playback state lives in an explicit [`SyncState`]; the scene
//! list is read as an immutable snapshot per call and never mutated here.

use crate::loader::{LoadOutcome, VisualLoader};
use crate::media::{MediaBackend, MediaMetadata};
use crate::resolve::{self, ResolvedPosition};
use crate::scene::Scene;
use crate::segment::{self, DURATION_EPSILON};
use crate::subtitle::{self, SubtitleFrame, SubtitleStyle};
use crate::transport::Transport;
use crate::types::StageSize;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Clock jitter below this does not trigger a re-render.
pub const TIME_EPSILON: f64 = 1e-3;

/// Media position drift beyond this forces a seek while playing.
pub const DRIFT_TOLERANCE: f64 = 0.25;

/// While paused the displayed frame must be exact: any drift beyond this is
/// corrected immediately.
pub const PAUSED_EPSILON: f64 = 1e-3;

/// Per-call options for [`Synchronizer::render_at`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    /// Apply placement without tweening. The core positions visuals
    /// instantaneously either way; hosts that tween transforms read this.
    pub skip_animation: bool,
    /// Resolve to this scene regardless of the clock (scene-card preview).
    pub force_scene_index: Option<usize>,
    /// Bypass the same-time short-circuit and re-apply everything.
    pub force_render: bool,
}

/// The synchronizer's mutable playback state, owned and explicit.
#[derive(Debug, Default)]
struct SyncState {
    last_time: Option<f64>,
    last_scene: Option<usize>,
    last_force: Option<usize>,
    /// Monotonic request counter; completions carrying an older value are
    /// discarded, never applied out of order.
    generation: u64,
    /// Scene index the newest load was issued for.
    load_target: Option<usize>,
}

/// Drives all per-tick visual synchronization for one timeline.
pub struct Synchronizer {
    loader: VisualLoader,
    state: SyncState,
    subtitle_style: SubtitleStyle,
    subtitle: Option<SubtitleFrame>,
    playing: bool,
    /// Scene armed for a specific-scene play request.
    armed_scene: Option<usize>,
}

impl Synchronizer {
    pub fn new(backend: Arc<dyn MediaBackend>, stage: StageSize) -> Self {
        Self {
            loader: VisualLoader::new(backend, stage),
            state: SyncState::default(),
            subtitle_style: SubtitleStyle::default(),
            subtitle: None,
            playing: false,
            armed_scene: None,
        }
    }

    pub fn set_subtitle_style(&mut self, style: SubtitleStyle) {
        self.subtitle_style = style;
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// The subtitle projected by the last apply, for the host's text renderer.
    pub fn subtitle(&self) -> Option<&SubtitleFrame> {
        self.subtitle.as_ref()
    }

    pub fn loader(&self) -> &VisualLoader {
        &self.loader
    }

    pub fn loader_mut(&mut self) -> &mut VisualLoader {
        &mut self.loader
    }

    /// Native metadata of a scene's loaded media, for the editing layer to
    /// copy into [`Scene::native_duration_sec`].
    pub fn media_metadata(&self, scene_index: usize) -> Option<MediaMetadata> {
        self.loader.visual(scene_index)?.player.metadata()
    }

    /// Synchronizes every visual with the master clock.
    ///
    /// Safe to call at any frequency; repeated calls for the same time are
    /// no-ops unless a force flag or an explicit scene is given.
    pub fn render_at(&mut self, scenes: &[Scene], master_time: f64, opts: RenderOptions) {
        let now = Instant::now();
        let stage = self.loader.stage();
        if scenes.is_empty() || stage.width <= 0.0 || stage.height <= 0.0 {
            return;
        }

        if let Some(last) = self.state.last_time {
            if (master_time - last).abs() < TIME_EPSILON
                && !opts.force_render
                && opts.force_scene_index.is_none()
            {
                return;
            }
        }

        let segments = segment::playable_segments(scenes);
        let Some(resolved) =
            resolve::resolve(scenes, &segments, master_time, opts.force_scene_index)
        else {
            self.hide_all();
            self.subtitle = None;
            self.state.last_time = Some(master_time);
            self.state.last_scene = None;
            self.state.last_force = None;
            return;
        };

        let scene = &scenes[resolved.scene_index];
        let scene_changed = self.state.last_scene != Some(resolved.scene_index)
            || opts.force_render
            || opts.force_scene_index.is_some();
        // A missing visual, or one holding a superseded media reference,
        // demotes the steady-state tick to a transition so a fresh load is
        // triggered instead of failing silently.
        let media_matches = match (self.loader.visual(resolved.scene_index), &scene.media) {
            (Some(visual), Some(media)) => visual.media == *media,
            _ => false,
        };

        if scene_changed || !media_matches {
            // Transition: everything already cached is applied immediately
            // (subtitle and a best-effort frame at zero perceived latency),
            // then the media reloads at the resolved position.
            self.state.generation += 1;
            self.state.load_target = Some(resolved.scene_index);
            self.apply_tick(scenes, &resolved);
            if scene.media.is_some() {
                self.loader.ensure_loaded(
                    resolved.scene_index,
                    scene,
                    resolved.media_time,
                    self.state.generation,
                    now,
                );
            } else {
                // Media reference removed: the old visual must not linger.
                self.loader.release(resolved.scene_index);
            }
        } else {
            self.apply_tick(scenes, &resolved);
        }

        self.state.last_time = Some(master_time);
        self.state.last_scene = Some(resolved.scene_index);
        self.state.last_force = opts.force_scene_index;

        self.process_loads(scenes, now);
    }

    /// Drains asynchronous load completions and re-applies visuals for the
    /// current target.
    ///
    /// `render_at` calls this on every tick; hosts should also call it from
    /// their frame loop while the clock is not advancing (paused editing)
    /// so finished loads still appear.
    pub fn pump(&mut self, scenes: &[Scene]) {
        self.process_loads(scenes, Instant::now());
    }

    fn process_loads(&mut self, scenes: &[Scene], now: Instant) {
        let events = self.loader.poll(now);
        for event in events {
            if event.generation != self.state.generation
                || Some(event.scene_index) != self.state.load_target
            {
                debug!(
                    scene_index = event.scene_index,
                    generation = event.generation,
                    "discarding superseded load"
                );
                continue;
            }
            if event.outcome == LoadOutcome::Failed {
                // Remains absent; a later tick re-attempts while the scene
                // is active.
                continue;
            }
            let Some(last_time) = self.state.last_time else {
                continue;
            };
            let segments = segment::playable_segments(scenes);
            if let Some(resolved) =
                resolve::resolve(scenes, &segments, last_time, self.state.last_force)
            {
                if resolved.scene_index == event.scene_index {
                    self.apply_tick(scenes, &resolved);
                }
            }
        }
    }

    /// Applies subtitle, visibility, transform and media position for one
    /// resolved tick. The visibility invariant holds on exit: at most the
    /// target scene's visual is visible, everything else is hidden and
    /// paused in the same pass.
    fn apply_tick(&mut self, scenes: &[Scene], resolved: &ResolvedPosition) {
        let scene = &scenes[resolved.scene_index];
        let playing = self.playing;
        let stage = self.loader.stage();

        // Subtitles refresh every tick; script edits show without waiting
        // on media.
        self.subtitle = subtitle::project(
            resolved.scene_index,
            &scene.script,
            &self.subtitle_style,
            playing,
            stage,
        );

        let span = scene.selection.span();
        let target = resolved.scene_index;
        let has_media = scene.media.is_some();
        let authored_transform = scene.transform;

        for (idx, visual) in self.loader.visuals_mut() {
            if idx != target {
                visual.visible = false;
                if !visual.player.is_paused() {
                    visual.player.pause();
                }
                continue;
            }

            visual.visible = has_media;
            visual.transform = authored_transform.unwrap_or(visual.base_transform);

            let player = visual.player.as_mut();
            player.pump();
            if !playing {
                if !player.is_paused() {
                    player.pause();
                }
                if (player.position() - resolved.media_time).abs() > PAUSED_EPSILON {
                    player.seek(resolved.media_time);
                }
            } else if span > DURATION_EPSILON && resolved.scene_time >= span - DURATION_EPSILON {
                // The narration outlasts the selected clip window: the
                // video holds its last frame while the clock runs on.
                if !player.is_paused() {
                    player.pause();
                }
            } else {
                if player.is_paused() {
                    player.play();
                }
                if (player.position() - resolved.media_time).abs() > DRIFT_TOLERANCE {
                    player.seek(resolved.media_time);
                }
            }
        }
    }

    fn hide_all(&mut self) {
        for (_, visual) in self.loader.visuals_mut() {
            visual.visible = false;
            if !visual.player.is_paused() {
                visual.player.pause();
            }
        }
    }

    /// Toggles transport playback.
    ///
    /// When a specific-scene play was armed via [`Synchronizer::select_scene`],
    /// starting playback first seeks the transport to that scene's start on
    /// the master timeline.
    pub fn handle_play_pause(&mut self, transport: &mut dyn Transport, scenes: &[Scene]) {
        if transport.is_playing() {
            transport.pause();
            self.playing = false;
        } else {
            let segments = segment::playable_segments(scenes);
            transport.set_total_duration(segment::master_duration(&segments));
            if let Some(scene_index) = self.armed_scene.take() {
                transport.seek(segment::cumulative_duration_before(&segments, scene_index));
            }
            transport.play();
            self.playing = true;
        }
        self.render_at(
            scenes,
            transport.current_time(),
            RenderOptions {
                force_render: true,
                ..Default::default()
            },
        );
    }

    /// Scene-card selection: previews the scene and arms it so the next
    /// play starts there.
    pub fn select_scene(&mut self, scenes: &[Scene], scene_index: usize) {
        self.armed_scene = Some(scene_index);
        let segments = segment::playable_segments(scenes);
        let start = segment::cumulative_duration_before(&segments, scene_index);
        self.render_at(
            scenes,
            start,
            RenderOptions {
                force_scene_index: Some(scene_index),
                ..Default::default()
            },
        );
    }

    /// Releases every visual and handle. Called on component teardown;
    /// also runs on drop.
    pub fn shutdown(&mut self) {
        self.hide_all();
        self.loader.release_all();
        self.subtitle = None;
        self.state = SyncState::default();
    }
}

impl Drop for Synchronizer {
    fn drop(&mut self) {
        self.loader.release_all();
    }
}
