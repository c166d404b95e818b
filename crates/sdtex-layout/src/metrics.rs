//! Block measurement.
//!
//! The engine asks a [`MetricsProvider`] how tall a text block is once it is
//! wrapped to a given width. Two providers ship here:
//!
//! - [`FontMetrics`]: real glyph advances from a loaded `fontdue` font, the
//!   same font the raster writer draws with.
//! - [`MonospaceMetrics`]: a fixed advance per character. Deterministic,
//!   needs no font file, used for Markdown-only runs and tests.

use sdtex_engine::coords::MM_PER_PT;
use sdtex_engine::text::{FontId, FontSystem};

use crate::style::ResolvedStyle;

/// Height (millimetres) and wrapped line count of a measured block.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Measure {
    pub height: f32,
    pub lines: usize,
}

pub trait MetricsProvider {
    /// Measures `text` drawn with `style` and wrapped at `width` mm.
    fn measure(&self, text: &str, style: &ResolvedStyle, width: f32) -> Measure;

    /// Height of one empty line in `style`.
    fn line_height(&self, style: &ResolvedStyle) -> f32 {
        self.measure(" ", style, f32::INFINITY).height
    }

    /// Rendered width of a single unwrapped line, used for alignment.
    fn line_width(&self, text: &str, style: &ResolvedStyle) -> f32;
}

// ── FontSet ───────────────────────────────────────────────────────────────

/// Which loaded font draws which style. Missing variants fall back to
/// `regular`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FontSet {
    pub regular: FontId,
    pub bold: Option<FontId>,
    pub italic: Option<FontId>,
    pub mono: Option<FontId>,
}

impl FontSet {
    pub fn single(regular: FontId) -> Self {
        Self { regular, bold: None, italic: None, mono: None }
    }

    pub fn pick(&self, style: &ResolvedStyle) -> FontId {
        let variant = if style.monospace {
            self.mono
        } else if style.bold {
            self.bold
        } else if style.italic {
            self.italic
        } else {
            None
        };
        variant.unwrap_or(self.regular)
    }
}

// ── FontMetrics ───────────────────────────────────────────────────────────

pub struct FontMetrics<'a> {
    fonts: &'a FontSystem,
    set: FontSet,
}

impl<'a> FontMetrics<'a> {
    pub fn new(fonts: &'a FontSystem, set: FontSet) -> Self {
        Self { fonts, set }
    }
}

impl MetricsProvider for FontMetrics<'_> {
    fn measure(&self, text: &str, style: &ResolvedStyle, width: f32) -> Measure {
        let max_width = width.is_finite().then(|| width / MM_PER_PT);
        let m = self.fonts.measure_text(text, self.set.pick(style), style.size, max_width);
        Measure { height: m.height * MM_PER_PT, lines: m.lines }
    }

    fn line_width(&self, text: &str, style: &ResolvedStyle) -> f32 {
        self.fonts.measure_text(text, self.set.pick(style), style.size, None).width * MM_PER_PT
    }
}

// ── MonospaceMetrics ──────────────────────────────────────────────────────

/// Estimates every glyph as `advance × size` wide and every line as
/// `leading × size` tall. Wraps at word boundaries, hard-breaking words that
/// are longer than a line.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MonospaceMetrics {
    pub advance: f32,
    pub leading: f32,
}

impl Default for MonospaceMetrics {
    fn default() -> Self {
        Self { advance: 0.6, leading: 1.2 }
    }
}

impl MonospaceMetrics {
    fn chars_per_line(&self, style: &ResolvedStyle, width: f32) -> usize {
        if !width.is_finite() {
            return usize::MAX;
        }
        let glyph = self.advance * style.size * MM_PER_PT;
        ((width / glyph).floor() as usize).max(1)
    }

    fn wrapped_lines(line: &str, per_line: usize) -> usize {
        let mut lines = 1;
        let mut used = 0usize;
        for word in line.split(' ') {
            let len = word.chars().count();
            let needed = if used == 0 { len } else { used + 1 + len };
            if needed <= per_line {
                used = needed;
            } else if len <= per_line {
                lines += 1;
                used = len;
            } else {
                // Word longer than a line: continue on the current line, then hard-break.
                let start = if used == 0 { 0 } else { used + 1 };
                let total = start + len;
                lines += (total - 1) / per_line;
                used = (total - 1) % per_line + 1;
            }
        }
        lines
    }
}

impl MetricsProvider for MonospaceMetrics {
    fn measure(&self, text: &str, style: &ResolvedStyle, width: f32) -> Measure {
        let per_line = self.chars_per_line(style, width);
        let lines = text.split('\n').map(|line| Self::wrapped_lines(line, per_line)).sum::<usize>().max(1);
        Measure { height: lines as f32 * self.leading * style.size * MM_PER_PT, lines }
    }

    fn line_width(&self, text: &str, style: &ResolvedStyle) -> f32 {
        text.chars().count() as f32 * self.advance * style.size * MM_PER_PT
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdtex_markup::TagKind;

    fn body(size: f32) -> ResolvedStyle {
        ResolvedStyle::defaults(TagKind::Text, size)
    }

    /// Width that holds exactly `chars` glyphs at `size`.
    fn width_for(chars: usize, size: f32) -> f32 {
        chars as f32 * 0.6 * size * MM_PER_PT + 0.01
    }

    #[test]
    fn short_text_is_one_line() {
        let m = MonospaceMetrics::default().measure("hello", &body(10.0), width_for(20, 10.0));
        assert_eq!(m.lines, 1);
        assert!((m.height - 12.0 * MM_PER_PT).abs() < 1e-4);
    }

    #[test]
    fn wraps_at_word_boundaries() {
        let m = MonospaceMetrics::default().measure("aaaa bbbb cccc", &body(10.0), width_for(9, 10.0));
        assert_eq!(m.lines, 2);
    }

    #[test]
    fn long_word_hard_breaks() {
        let m = MonospaceMetrics::default().measure("abcdefghijkl", &body(10.0), width_for(5, 10.0));
        assert_eq!(m.lines, 3);
    }

    #[test]
    fn hard_newlines_count() {
        let m = MonospaceMetrics::default().measure("a\nb\n\nc", &body(10.0), width_for(20, 10.0));
        assert_eq!(m.lines, 4);
    }

    #[test]
    fn bigger_font_is_taller() {
        let mono = MonospaceMetrics::default();
        let small = mono.measure("x", &body(10.0), 100.0).height;
        let big = mono.measure("x", &body(20.0), 100.0).height;
        assert!(big > small);
        assert_eq!(mono.line_height(&body(10.0)), small);
    }

    #[test]
    fn font_set_picks_variants() {
        let set = FontSet { regular: font_id(0), bold: Some(font_id(1)), italic: None, mono: Some(font_id(2)) };
        assert_eq!(set.pick(&ResolvedStyle::defaults(TagKind::Title, 11.0)), font_id(1));
        assert_eq!(set.pick(&ResolvedStyle::defaults(TagKind::Code, 11.0)), font_id(2));
        assert_eq!(set.pick(&ResolvedStyle::defaults(TagKind::Quote, 11.0)), font_id(0));
    }

    fn font_id(n: usize) -> FontId {
        FontId::from_index(n)
    }
}
