use std::fmt;
use std::path::Path;

use fontdue::layout::{CoordinateSystem, GlyphPosition, Layout, LayoutSettings, TextStyle};

/// Error returned by [`FontSystem::load_font`] and [`FontSystem::load_font_file`].
#[derive(Debug, Clone)]
pub struct FontLoadError(pub String);

impl fmt::Display for FontLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "font load error: {}", self.0)
    }
}

impl std::error::Error for FontLoadError {}

/// Opaque handle to a font loaded into a [`FontSystem`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct FontId(pub(crate) usize);

impl FontId {
    /// Handle of the `index`-th font loaded into a system.
    #[inline]
    pub const fn from_index(index: usize) -> Self {
        Self(index)
    }
}

/// Result of laying out a text run.
///
/// All values are in the unit of the `size` passed in (points for layout,
/// pixels for the raster writer).
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct TextMetrics {
    pub width: f32,
    pub height: f32,
    /// Wrapped line count, hard breaks included. At least 1.
    pub lines: usize,
    pub line_height: f32,
}

/// Owns a collection of loaded fonts.
///
/// Fonts are immutable after loading. The same system serves layout
/// measurement and page rasterization so both see identical line breaks.
pub struct FontSystem {
    fonts: Vec<fontdue::Font>,
}

impl FontSystem {
    pub fn new() -> Self {
        Self { fonts: Vec::new() }
    }

    /// Parses and stores a TrueType or OpenType font from raw bytes.
    pub fn load_font(&mut self, bytes: &[u8]) -> Result<FontId, FontLoadError> {
        let font = fontdue::Font::from_bytes(bytes, fontdue::FontSettings::default())
            .map_err(|e| FontLoadError(e.to_string()))?;
        let id = FontId(self.fonts.len());
        self.fonts.push(font);
        Ok(id)
    }

    /// Reads and loads a font file.
    pub fn load_font_file(&mut self, path: &Path) -> Result<FontId, FontLoadError> {
        let bytes = std::fs::read(path)
            .map_err(|e| FontLoadError(format!("{}: {e}", path.display())))?;
        let id = self.load_font(&bytes)?;
        log::debug!("loaded font {}", path.display());
        Ok(id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }

    pub(crate) fn get(&self, id: FontId) -> Option<&fontdue::Font> {
        self.fonts.get(id.0)
    }

    /// Distance between consecutive baselines at `size`.
    pub fn line_height(&self, id: FontId, size: f32) -> f32 {
        self.get(id)
            .and_then(|font| font.horizontal_line_metrics(size))
            .map(|m| m.new_line_size)
            .unwrap_or(size * 1.2)
    }

    /// Lays out `text` at `size`, wrapping at `max_width` when given.
    #[must_use]
    pub fn measure_text(&self, text: &str, id: FontId, size: f32, max_width: Option<f32>) -> TextMetrics {
        let line_height = self.line_height(id, size);
        let empty = TextMetrics { width: 0.0, height: line_height, lines: 1, line_height };

        let Some(font) = self.get(id) else {
            return empty;
        };
        if text.is_empty() {
            return empty;
        }

        let layout = layout_text(font, text, size, 0.0, 0.0, max_width);
        let glyphs = layout.glyphs();
        if glyphs.is_empty() {
            return empty;
        }

        // Pen position after each glyph, not the bitmap edge, so the width
        // never undercuts fontdue's own wrap check.
        let width = glyphs
            .iter()
            .map(|g| {
                let m = font.metrics_indexed(g.key.glyph_index, size);
                (g.x - m.xmin as f32 + m.advance_width).max(0.0)
            })
            .fold(0.0f32, f32::max);
        let lines = layout.lines().map_or(1, |lines| lines.len()).max(1);

        TextMetrics { width, height: lines as f32 * line_height, lines, line_height }
    }

    /// Positioned glyphs for `text` with the block's top-left at `(x, y)`.
    pub(crate) fn glyphs(
        &self,
        id: FontId,
        text: &str,
        size: f32,
        x: f32,
        y: f32,
        max_width: Option<f32>,
    ) -> Vec<GlyphPosition<()>> {
        match self.get(id) {
            Some(font) => layout_text(font, text, size, x, y, max_width).glyphs().clone(),
            None => Vec::new(),
        }
    }
}

fn layout_text(
    font: &fontdue::Font,
    text: &str,
    size: f32,
    x: f32,
    y: f32,
    max_width: Option<f32>,
) -> Layout<()> {
    let mut layout: Layout<()> = Layout::new(CoordinateSystem::PositiveYDown);
    layout.reset(&LayoutSettings { x, y, max_width, ..LayoutSettings::default() });
    layout.append(std::slice::from_ref(font), &TextStyle::new(text, size, 0));
    layout
}

impl Default for FontSystem {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_bytes_fail_to_load() {
        let mut fonts = FontSystem::new();
        let err = fonts.load_font(b"not a font").unwrap_err();
        assert!(err.to_string().starts_with("font load error"));
        assert!(fonts.is_empty());
    }

    #[test]
    fn missing_file_names_the_path() {
        let mut fonts = FontSystem::new();
        let err = fonts.load_font_file(Path::new("/nonexistent/font.ttf")).unwrap_err();
        assert!(err.0.contains("/nonexistent/font.ttf"));
    }

    #[test]
    fn unknown_id_measures_one_line() {
        let fonts = FontSystem::new();
        let m = fonts.measure_text("hello", FontId(3), 10.0, None);
        assert_eq!(m.lines, 1);
        assert_eq!(m.width, 0.0);
        assert!((m.height - 12.0).abs() < 1e-4);
    }
}
