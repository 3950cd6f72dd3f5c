//! # Loader Module
//!
//! The resource lifecycle manager: turns a scene's media reference into a
//! composited-ready [`SceneVisual`], asynchronously and without ever
//! surfacing a failure to the caller.
//!
//! ## Responsibilities
//! - **Loading**: Open, seek, and frame-sync a scene's media off the tick loop.
//! - **De-duplication**: At most one in-flight load per scene index.
//! - **Cleanup**: Failures release all partially-created state; `release` is
//!   always safe.
//! - **Placement**: Base object-fit transform when no authored transform exists.
//!
//! Loads are polled, not awaited: `ensure_loaded` registers the request and
//! `poll` advances every pending load through
//! `AwaitingMetadata -> AwaitingFrame -> Ready`, yielding typed outcomes
//! tagged with the request generation so the synchronizer can drop stale
//! completions.

use crate::media::{MediaBackend, MediaPlayer};
use crate::retry::Retry;
use crate::scene::{MediaRef, Scene};
use crate::types::{object_fit_rect, ObjectFit, StageSize, Transform};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// How long to wait for source metadata before giving up on a load.
pub const METADATA_TIMEOUT: Duration = Duration::from_secs(5);

/// How long to wait for a paintable frame after the initial seek.
pub const FRAME_TIMEOUT: Duration = Duration::from_millis(1200);

/// Bound on re-open attempts for a failing source.
pub const MAX_LOAD_ATTEMPTS: u32 = 5;

/// Base backoff between re-open attempts; grows linearly per attempt.
pub const RETRY_BACKOFF: Duration = Duration::from_millis(500);

/// The on-stage visual proxy for one scene's media.
///
/// Exclusively owned by the [`VisualLoader`]; the synchronizer only borrows
/// it while rendering a tick, and the host compositor reads visibility,
/// transform and the player's current frame from it.
pub struct SceneVisual {
    pub visible: bool,
    /// Placement applied this tick (authored transform or the base fit).
    pub transform: Transform,
    /// The object-fit placement computed from native media dimensions.
    pub base_transform: Transform,
    pub media: MediaRef,
    pub player: Box<dyn MediaPlayer>,
}

/// Terminal state of one load request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoadOutcome {
    /// Metadata read, seek done, frame paintable.
    Loaded,
    /// A stage timed out. The visual may exist in best-effort state
    /// (frame wait expired) or remain absent (metadata never arrived).
    TimedOut,
    /// The source could not be opened or reported unusable metadata.
    Failed,
}

/// A completed load, reported from [`VisualLoader::poll`].
#[derive(Debug, Clone, Copy)]
pub struct LoadEvent {
    pub scene_index: usize,
    pub generation: u64,
    pub outcome: LoadOutcome,
}

#[derive(Clone, Copy)]
enum LoadPhase {
    AwaitingMetadata { since: Instant },
    AwaitingFrame { since: Instant },
}

struct PendingLoad {
    media: MediaRef,
    target_time: f64,
    generation: u64,
    phase: LoadPhase,
    fit: ObjectFit,
    authored_transform: Option<Transform>,
    /// `Some` while opening a fresh player; `None` when re-seeking the
    /// player already held by the scene's visual.
    player: Option<Box<dyn MediaPlayer>>,
    fit_transform: Option<Transform>,
}

/// Owns every [`SceneVisual`] and all in-flight loads.
pub struct VisualLoader {
    backend: Arc<dyn MediaBackend>,
    stage: StageSize,
    visuals: HashMap<usize, SceneVisual>,
    pending: HashMap<usize, PendingLoad>,
    retries: HashMap<usize, (MediaRef, Retry)>,
    events: Vec<LoadEvent>,
}

impl VisualLoader {
    pub fn new(backend: Arc<dyn MediaBackend>, stage: StageSize) -> Self {
        Self {
            backend,
            stage,
            visuals: HashMap::new(),
            pending: HashMap::new(),
            retries: HashMap::new(),
            events: Vec::new(),
        }
    }

    pub fn stage(&self) -> StageSize {
        self.stage
    }

    pub fn visual(&self, scene_index: usize) -> Option<&SceneVisual> {
        self.visuals.get(&scene_index)
    }

    pub fn visual_mut(&mut self, scene_index: usize) -> Option<&mut SceneVisual> {
        self.visuals.get_mut(&scene_index)
    }

    pub fn visuals_mut(&mut self) -> impl Iterator<Item = (usize, &mut SceneVisual)> + '_ {
        self.visuals.iter_mut().map(|(k, v)| (*k, v))
    }

    /// Registers a load for `scene_index`, de-duplicated against any load
    /// already in flight for that index.
    ///
    /// A concurrent call while a load is pending attaches to the
    /// outstanding operation (adopting the newer generation and target)
    /// rather than starting a second one. A visual that already holds the
    /// right media is only re-sought; a visual holding different media is
    /// released first.
    pub fn ensure_loaded(
        &mut self,
        scene_index: usize,
        scene: &Scene,
        target_time: f64,
        generation: u64,
        now: Instant,
    ) {
        let Some(media) = scene.media.clone() else {
            return;
        };

        if let Some(pending) = self.pending.get_mut(&scene_index) {
            if pending.media == media {
                pending.generation = generation;
                if (pending.target_time - target_time).abs() > 0.05 {
                    pending.target_time = target_time;
                    if let LoadPhase::AwaitingFrame { .. } = pending.phase {
                        let reseek = pending.player.is_none();
                        if let Some(player) = pending.player.as_deref_mut() {
                            player.seek(target_time);
                        } else if reseek {
                            if let Some(visual) = self.visuals.get_mut(&scene_index) {
                                visual.player.seek(target_time);
                            }
                        }
                    }
                }
                return;
            }
            // Media changed under the in-flight load: abandon it.
            self.pending.remove(&scene_index);
        }

        if let Some(visual) = self.visuals.get_mut(&scene_index) {
            if visual.media == media {
                visual.player.seek(target_time);
                self.pending.insert(
                    scene_index,
                    PendingLoad {
                        media,
                        target_time,
                        generation,
                        phase: LoadPhase::AwaitingFrame { since: now },
                        fit: scene.object_fit,
                        authored_transform: scene.transform,
                        player: None,
                        fit_transform: None,
                    },
                );
                return;
            }
            self.release(scene_index);
        }

        if !self.retry_ready(scene_index, &media, now) {
            return;
        }

        match self.backend.open(&media) {
            Ok(player) => {
                self.pending.insert(
                    scene_index,
                    PendingLoad {
                        media,
                        target_time,
                        generation,
                        phase: LoadPhase::AwaitingMetadata { since: now },
                        fit: scene.object_fit,
                        authored_transform: scene.transform,
                        player: Some(player),
                        fit_transform: None,
                    },
                );
            }
            Err(e) => {
                warn!(
                    scene_index,
                    media = media.as_str(),
                    "media open failed: {}",
                    e
                );
                self.record_failure(scene_index, now);
                self.events.push(LoadEvent {
                    scene_index,
                    generation,
                    outcome: LoadOutcome::Failed,
                });
            }
        }
    }

    /// Advances every pending load and returns the completions.
    ///
    /// Call once per tick. Outcomes carry the generation of the newest
    /// `ensure_loaded` call they satisfy; the caller decides staleness.
    pub fn poll(&mut self, now: Instant) -> Vec<LoadEvent> {
        let mut events = std::mem::take(&mut self.events);
        let indices: Vec<usize> = self.pending.keys().copied().collect();

        for scene_index in indices {
            let mut pending = self.pending.remove(&scene_index).expect("pending exists");

            let reseek = pending.player.is_none();
            if reseek && !self.visuals.contains_key(&scene_index) {
                // Visual released while the re-seek was pending.
                continue;
            }

            {
                let player: &mut dyn MediaPlayer = match pending.player.as_deref_mut() {
                    Some(p) => p,
                    None => self
                        .visuals
                        .get_mut(&scene_index)
                        .expect("checked above")
                        .player
                        .as_mut(),
                };
                player.pump();
            }

            match pending.phase {
                LoadPhase::AwaitingMetadata { since } => {
                    let meta = pending
                        .player
                        .as_deref()
                        .and_then(|p| p.metadata());
                    match meta {
                        Some(m) if m.width == 0 || m.height == 0 => {
                            warn!(scene_index, "media has zero dimensions, dropping");
                            self.record_failure(scene_index, now);
                            events.push(LoadEvent {
                                scene_index,
                                generation: pending.generation,
                                outcome: LoadOutcome::Failed,
                            });
                            // pending (and its player) dropped here
                        }
                        Some(m) => {
                            if let Some(player) = pending.player.as_deref_mut() {
                                player.pause();
                                player.seek(pending.target_time);
                            }
                            pending.fit_transform = Some(Transform::from_rect(object_fit_rect(
                                m.width as f32,
                                m.height as f32,
                                self.stage.rect(),
                                pending.fit,
                            )));
                            pending.phase = LoadPhase::AwaitingFrame { since: now };
                            self.pending.insert(scene_index, pending);
                        }
                        None if now.duration_since(since) > METADATA_TIMEOUT => {
                            warn!(scene_index, "metadata timeout, dropping load");
                            self.record_failure(scene_index, now);
                            events.push(LoadEvent {
                                scene_index,
                                generation: pending.generation,
                                outcome: LoadOutcome::TimedOut,
                            });
                        }
                        None => {
                            self.pending.insert(scene_index, pending);
                        }
                    }
                }
                LoadPhase::AwaitingFrame { since } => {
                    let ready = match pending.player.as_deref() {
                        Some(p) => p.frame_ready(),
                        None => self.visuals[&scene_index].player.frame_ready(),
                    };
                    let expired = now.duration_since(since) > FRAME_TIMEOUT;
                    if ready || expired {
                        if expired && !ready {
                            debug!(scene_index, "frame wait expired, compositing best effort");
                        }
                        let generation = pending.generation;
                        self.finalize(scene_index, pending);
                        events.push(LoadEvent {
                            scene_index,
                            generation,
                            outcome: if ready {
                                LoadOutcome::Loaded
                            } else {
                                LoadOutcome::TimedOut
                            },
                        });
                    } else {
                        self.pending.insert(scene_index, pending);
                    }
                }
            }
        }

        events
    }

    fn finalize(&mut self, scene_index: usize, pending: PendingLoad) {
        if let Some((_, retry)) = self.retries.get_mut(&scene_index) {
            retry.reset();
        }
        if let Some(player) = pending.player {
            let base = pending
                .fit_transform
                .unwrap_or_else(|| Transform::from_rect(self.stage.rect()));
            let transform = pending.authored_transform.unwrap_or(base);
            self.visuals.insert(
                scene_index,
                SceneVisual {
                    visible: false,
                    transform,
                    base_transform: base,
                    media: pending.media,
                    player,
                },
            );
        }
        // Re-seek of an existing visual installs nothing.
    }

    /// Destroys the visual and any in-flight load for `scene_index`.
    ///
    /// Playback is stopped before the handle is dropped. Safe to call on an
    /// absent index.
    pub fn release(&mut self, scene_index: usize) {
        self.pending.remove(&scene_index);
        if let Some(mut visual) = self.visuals.remove(&scene_index) {
            visual.player.pause();
        }
    }

    /// Releases every visual and pending load. Used on teardown.
    pub fn release_all(&mut self) {
        let indices: Vec<usize> = self
            .visuals
            .keys()
            .chain(self.pending.keys())
            .copied()
            .collect();
        for idx in indices {
            self.release(idx);
        }
        self.retries.clear();
        self.events.clear();
    }

    fn retry_ready(&mut self, scene_index: usize, media: &MediaRef, now: Instant) -> bool {
        let entry = self
            .retries
            .entry(scene_index)
            .or_insert_with(|| (media.clone(), Retry::new(MAX_LOAD_ATTEMPTS, RETRY_BACKOFF)));
        if entry.0 != *media {
            *entry = (media.clone(), Retry::new(MAX_LOAD_ATTEMPTS, RETRY_BACKOFF));
        }
        entry.1.ready(now)
    }

    fn record_failure(&mut self, scene_index: usize, now: Instant) {
        if let Some((_, retry)) = self.retries.get_mut(&scene_index) {
            retry.record_failure(now);
        }
    }
}
