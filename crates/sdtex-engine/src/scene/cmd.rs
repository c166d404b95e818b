use std::path::PathBuf;

use crate::coords::{Rect, Vec2};
use crate::paint::Color;
use crate::text::FontId;

/// Text draw payload.
#[derive(Debug, Clone, PartialEq)]
pub struct TextCmd {
    pub text: String,
    pub font: FontId,
    /// Font size in points.
    pub size: f32,
    pub color: Color,
    /// Top-left of the text block in millimetres.
    pub origin: Vec2,
    /// Wrapping width in millimetres. `None` = no wrapping.
    pub max_width: Option<f32>,
}

/// Raster image stretched into `rect`.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageCmd {
    pub path: PathBuf,
    pub rect: Rect,
}

/// Solid rectangle (code block backgrounds).
#[derive(Debug, Clone, PartialEq)]
pub struct RectCmd {
    pub rect: Rect,
    pub color: Color,
}

/// Renderer-agnostic draw command.
///
/// Adding a variant means adding a match arm to every writer under
/// `render`.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCmd {
    Rect(RectCmd),
    Text(TextCmd),
    Image(ImageCmd),
}
