//! # Narrator Engine
//!
//! `narrator-engine` is the playback core of a scripted-video editor: a
//! transport-driven synchronizer that keeps a multi-track timeline (source
//! video, synthesized narration, subtitles, music, effects) consistent with
//! a single logical clock while it runs, scrubs, or pauses.
//!
//! ## Core Features
//!
//! *   **Timeline Derivation**: Playable segments with cumulative offsets,
//!     recomputed purely from the authored scene list.
//! *   **Time Resolution**: Master time to scene-local and source-media
//!     positions, with modulo looping for clips shorter than their window.
//! *   **Resource Lifecycle**: De-duplicated, generation-checked async media
//!     loading with bounded timeouts and unconditional cleanup.
//! *   **Drift Correction**: Tolerance-gated re-seeking while playing,
//!     exact positions while paused, last-frame holds when narration
//!     outlasts the clip.
//! *   **Audio Segments**: Binary-searchable voice index plus music and
//!     effect control driven by the same clock.
//!
//! ## Usage
//!
//! The core entry point is the [`Synchronizer`], fed from the host's tick
//! loop:
//!
//! ```rust,no_run
//! use narrator_engine::{media::DecodeBackend, StageSize, Synchronizer, RenderOptions};
//! use std::sync::Arc;
//!
//! let mut sync = Synchronizer::new(Arc::new(DecodeBackend), StageSize::new(1920.0, 1080.0));
//! let scenes = Vec::new();
//! sync.render_at(&scenes, 0.0, RenderOptions::default());
//! ```

/// The authored data model (scenes, selection windows, media references).
pub mod scene;

/// Pure derivation of the master timeline from the scene list.
pub mod segment;

/// Master-time to scene/media position resolution.
pub mod resolve;

/// The media decode boundary and its threaded implementation.
pub mod media;

/// Asynchronous visual loading and ownership of scene visuals.
pub mod loader;

/// The per-tick playback synchronizer.
pub mod sync;

/// Voice/music/effect segment resolution and playback control.
pub mod voice;

/// Script-to-stage subtitle projection.
pub mod subtitle;

/// The external clock interface.
pub mod transport;

/// Bounded retry bookkeeping for failing loads.
pub mod retry;

/// Shared geometry, fit and color types.
pub mod types;

pub mod errors;

pub use errors::MediaError;
pub use loader::{LoadOutcome, SceneVisual, VisualLoader};
pub use resolve::ResolvedPosition;
pub use scene::{MediaRef, Scene, SelectionWindow};
pub use segment::PlayableSegment;
pub use subtitle::{SubtitleFrame, SubtitleStyle};
pub use sync::{RenderOptions, Synchronizer};
pub use transport::{TickTransport, Transport};
pub use types::{ObjectFit, StageSize, Transform};
pub use voice::AudioSegment;
