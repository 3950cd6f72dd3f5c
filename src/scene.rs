//! # Scene Module
//!
//! The authored data model: one `Scene` per timeline unit.
//!
//! A scene couples a spoken script with an optional source-media clip and the
//! sub-window of that clip chosen in the editor. Durations are layered: the
//! selection window's span is the fallback, and the synthesized voice
//! duration becomes authoritative once it is known.

use crate::types::{ObjectFit, Transform};
use serde::{Deserialize, Serialize};

/// A handle to a source media asset (path or URL).
///
/// The engine never dereferences this itself; the media backend resolves it
/// to a concrete decodable source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MediaRef(pub String);

impl MediaRef {
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The sub-range of a source clip selected for a scene, in media seconds.
///
/// `end_sec` may exceed the media's native duration; that signals looping
/// extension (the clip repeats to fill the window).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SelectionWindow {
    pub start_sec: f64,
    pub end_sec: f64,
}

impl SelectionWindow {
    pub fn new(start_sec: f64, end_sec: f64) -> Self {
        Self { start_sec, end_sec }
    }

    /// Length of the window. Negative ranges collapse to zero.
    pub fn span(&self) -> f64 {
        (self.end_sec - self.start_sec).max(0.0)
    }
}

/// One authored unit of the timeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scene {
    /// Spoken/subtitle content.
    pub script: String,
    /// TTS voice id used for this scene's narration.
    #[serde(default)]
    pub voice: String,
    /// Reference to the source video/image. Absent scenes render blank.
    pub media: Option<MediaRef>,
    /// Sub-range of the source media to use.
    pub selection: SelectionWindow,
    /// Authoritative scene duration once voice synthesis completes.
    #[serde(default)]
    pub voice_duration_sec: Option<f64>,
    /// Native duration of the source media, populated once metadata loads.
    #[serde(default)]
    pub native_duration_sec: Option<f64>,
    /// How the media is fitted into the stage when no authored transform exists.
    #[serde(default)]
    pub object_fit: ObjectFit,
    /// User-authored placement, overriding the base fit policy.
    #[serde(default)]
    pub transform: Option<Transform>,
    /// Optional sound effect fired at scene entry.
    #[serde(default)]
    pub effect: Option<MediaRef>,
}

impl Scene {
    /// Creates a scene with the given script and selection window and no media.
    pub fn new(script: impl Into<String>, selection: SelectionWindow) -> Self {
        Self {
            script: script.into(),
            voice: String::new(),
            media: None,
            selection,
            voice_duration_sec: None,
            native_duration_sec: None,
            object_fit: ObjectFit::default(),
            transform: None,
            effect: None,
        }
    }

    /// The scene's duration on the master timeline.
    ///
    /// The synthesized voice duration wins once known; until then the
    /// selection window's span stands in for it.
    pub fn effective_duration(&self) -> f64 {
        match self.voice_duration_sec {
            Some(d) if d > 0.0 => d,
            _ => self.selection.span(),
        }
    }
}
