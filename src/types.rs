//! # Types Module
//!
//! Shared data types used across the engine.
//!
//! ## Responsibilities
//! - **Geometry**: Plain rectangle and stage dimensions (no renderer types leak in here).
//! - **ObjectFit**: Media scaling modes (Cover, Contain, Fill) and the fit computation.
//! - **Transform**: The 2D placement applied to a scene's visual.
//! - **Color**: RGBA color representation for subtitle styling.

use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle in stage coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn from_xywh(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Logical dimensions of the render surface the visuals are composited onto.
///
/// The engine never owns the surface; it only needs its size to compute
/// placement transforms and subtitle anchors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StageSize {
    pub width: f32,
    pub height: f32,
}

impl StageSize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn rect(&self) -> Rect {
        Rect::from_xywh(0.0, 0.0, self.width, self.height)
    }
}

/// The 2D placement of a scene visual on the stage.
///
/// Position and size are in stage coordinates, rotation in degrees around
/// the rect center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub rotation: f32,
}

impl Transform {
    pub fn from_rect(rect: Rect) -> Self {
        Self {
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
            rotation: 0.0,
        }
    }
}

/// Specifies how the content of a replaceable element (image, video) should
/// be resized to fit its container.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectFit {
    /// The content is sized to maintain its aspect ratio while filling the
    /// container. Content that overflows the container is clipped.
    Cover,
    /// The content is scaled to maintain its aspect ratio while fitting
    /// within the container, letterboxed when the ratios differ.
    Contain,
    /// The content is stretched to fill the container exactly.
    Fill,
}

impl Default for ObjectFit {
    fn default() -> Self {
        Self::Cover
    }
}

/// Computes the placement rect for media of `src_w` x `src_h` inside `dst_rect`.
pub fn object_fit_rect(src_w: f32, src_h: f32, dst_rect: Rect, fit: ObjectFit) -> Rect {
    match fit {
        ObjectFit::Fill => dst_rect,
        ObjectFit::Contain | ObjectFit::Cover => {
            let src_ratio = src_w / src_h;
            let dst_ratio = dst_rect.width / dst_rect.height;

            let scale = match fit {
                ObjectFit::Contain => {
                    if src_ratio > dst_ratio {
                        dst_rect.width / src_w
                    } else {
                        dst_rect.height / src_h
                    }
                }
                ObjectFit::Cover => {
                    if src_ratio > dst_ratio {
                        dst_rect.height / src_h
                    } else {
                        dst_rect.width / src_w
                    }
                }
                _ => 1.0,
            };

            let new_w = src_w * scale;
            let new_h = src_h * scale;
            let new_x = dst_rect.x + (dst_rect.width - new_w) / 2.0;
            let new_y = dst_rect.y + (dst_rect.height - new_h) / 2.0;

            Rect::from_xywh(new_x, new_y, new_w, new_h)
        }
    }
}

/// Represents a RGBA color in float format (0.0 - 1.0).
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };
    pub const WHITE: Color = Color {
        r: 1.0,
        g: 1.0,
        b: 1.0,
        a: 1.0,
    };

    pub fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}
