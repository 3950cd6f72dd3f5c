//! # Subtitle Module
//!
//! Stateless projection of a scene's script into a positioned text
//! instruction for the render surface.
//!
//! Projection only happens during playback; while paused the editing layer
//! swaps in its own directly-editable text representation, so `project`
//! returns `None` and the engine draws nothing.

use crate::types::{Color, StageSize};
use serde::{Deserialize, Serialize};

/// Default font size, in stage units.
pub const DEFAULT_FONT_SIZE: f32 = 80.0;

/// Fallback font family.
pub const DEFAULT_FONT_FAMILY: &str = "Sans Serif";

/// Vertical anchor of the subtitle block, as a fraction of stage height.
pub const BOTTOM_ANCHOR_FRACTION: f32 = 0.85;

/// Fraction of the stage width the text may wrap into.
pub const WRAP_FRACTION: f32 = 0.9;

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

impl Default for TextAlign {
    fn default() -> Self {
        Self::Center
    }
}

/// Authored subtitle styling. Every field is optional; absent fields fall
/// back to the documented defaults at projection time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubtitleStyle {
    #[serde(default)]
    pub font_family: Option<String>,
    #[serde(default)]
    pub font_size: Option<f32>,
    #[serde(default)]
    pub color: Option<Color>,
    #[serde(default)]
    pub stroke_color: Option<Color>,
    #[serde(default)]
    pub stroke_width: Option<f32>,
    #[serde(default)]
    pub align: Option<TextAlign>,
    /// Explicit anchor override, in stage coordinates.
    #[serde(default)]
    pub position: Option<(f32, f32)>,
}

/// One positioned subtitle, ready for the host's text renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleFrame {
    pub scene_index: usize,
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub wrap_width: f32,
    pub font_family: String,
    pub font_size: f32,
    pub color: Color,
    pub stroke_color: Option<Color>,
    pub stroke_width: f32,
    pub align: TextAlign,
}

/// Projects a scene's script into a positioned subtitle.
///
/// Returns `None` while not playing, and for scripts that are empty after
/// trimming.
pub fn project(
    scene_index: usize,
    script: &str,
    style: &SubtitleStyle,
    playing: bool,
    stage: StageSize,
) -> Option<SubtitleFrame> {
    if !playing {
        return None;
    }
    let text = script.trim();
    if text.is_empty() {
        return None;
    }

    let (x, y) = style.position.unwrap_or((
        stage.width / 2.0,
        stage.height * BOTTOM_ANCHOR_FRACTION,
    ));

    Some(SubtitleFrame {
        scene_index,
        text: text.to_string(),
        x,
        y,
        wrap_width: stage.width * WRAP_FRACTION,
        font_family: style
            .font_family
            .clone()
            .unwrap_or_else(|| DEFAULT_FONT_FAMILY.to_string()),
        font_size: style.font_size.unwrap_or(DEFAULT_FONT_SIZE),
        color: style.color.unwrap_or(Color::WHITE),
        stroke_color: style.stroke_color,
        stroke_width: style.stroke_width.unwrap_or(0.0),
        align: style.align.unwrap_or_default(),
    })
}
