//! Typed view of a node's effective style map.
//!
//! | key | values | default |
//! |-----|--------|---------|
//! | `size` | `24dp`, `12pt`, `11` (points) | per kind, scaled from the base size |
//! | `color` | `#rgb`, `#rrggbb`, `#rrggbbaa`, a CSS name | per kind, black |
//! | `background` | as `color` | code blocks only |
//! | `bold`, `italic` | `true` / `false` | per kind |
//! | `font` | `monospace` / `mono`, anything else is proportional | code blocks only |
//! | `align` | `left`, `center`, `right` | per kind |
//! | `indent`, `spacing` | millimetres | per kind |
//! | `width` | `60%` or `0.6` of the content width | images and graphs |
//!
//! Malformed values log a warning and keep the default.

use sdtex_engine::paint::Color;
use sdtex_markup::{StyleMap, TagKind};

// ── Align ─────────────────────────────────────────────────────────────────

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

impl Align {
    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" | "start" => Some(Self::Left),
            "center" | "centre" => Some(Self::Center),
            "right" | "end" => Some(Self::Right),
            _ => None,
        }
    }

    /// Horizontal offset of a run `inner` wide inside a box `outer` wide.
    #[inline]
    pub fn offset(self, outer: f32, inner: f32) -> f32 {
        let free = (outer - inner).max(0.0);
        match self {
            Self::Left => 0.0,
            Self::Center => free / 2.0,
            Self::Right => free,
        }
    }
}

// ── ResolvedStyle ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedStyle {
    /// Font size in points.
    pub size: f32,
    pub color: Color,
    pub background: Option<Color>,
    pub bold: bool,
    pub italic: bool,
    pub monospace: bool,
    pub align: Align,
    /// Left indent in millimetres.
    pub indent: f32,
    /// Extra space below the block in millimetres.
    pub spacing: f32,
    /// Fraction of the content width used by images and graphs.
    pub width: f32,
    /// Text drawn before the block's own text (bullet glyph).
    pub prefix: Option<&'static str>,
}

impl ResolvedStyle {
    /// Built-in defaults for `kind`, sized relative to `base` points.
    pub fn defaults(kind: TagKind, base: f32) -> Self {
        let plain = Self {
            size: base,
            color: Color::BLACK,
            background: None,
            bold: false,
            italic: false,
            monospace: false,
            align: Align::Left,
            indent: 0.0,
            spacing: 3.0,
            width: 1.0,
            prefix: None,
        };
        match kind {
            TagKind::Title => Self { size: base * 2.0, bold: true, spacing: 6.0, ..plain },
            TagKind::Bullet => Self { indent: 6.0, spacing: 1.5, prefix: Some("\u{2022} "), ..plain },
            TagKind::Quote => Self { size: base * 1.1, italic: true, indent: 10.0, ..plain },
            TagKind::Author => Self { size: base * 0.9, italic: true, align: Align::Right, spacing: 4.0, ..plain },
            TagKind::Code => Self {
                size: base * 0.9,
                monospace: true,
                background: Some(Color::rgb(0xf0, 0xf0, 0xf0)),
                indent: 2.0,
                spacing: 4.0,
                ..plain
            },
            TagKind::Link => Self { color: Color::rgb(0x1a, 0x0d, 0xab), ..plain },
            TagKind::Image => Self { width: 0.5, align: Align::Center, spacing: 4.0, ..plain },
            TagKind::Graph => Self { width: 0.8, align: Align::Center, spacing: 4.0, ..plain },
            TagKind::NewLine => Self { spacing: 0.0, ..plain },
            TagKind::Footer => Self {
                size: base * 0.8,
                color: Color::rgb(0x66, 0x66, 0x66),
                align: Align::Center,
                spacing: 0.0,
                ..plain
            },
            TagKind::Attribution => Self {
                size: base * 0.8,
                color: Color::rgb(0x66, 0x66, 0x66),
                italic: true,
                align: Align::Right,
                spacing: 0.0,
                ..plain
            },
            TagKind::Text | TagKind::Unknown => plain,
        }
    }

    /// Defaults for `kind` overridden by whatever `style` sets.
    pub fn resolve(kind: TagKind, style: &StyleMap, base: f32) -> Self {
        let mut out = Self::defaults(kind, base);

        for (key, value) in style.iter() {
            match key {
                "size" => match parse_size(value) {
                    Some(size) => out.size = size,
                    None => log::warn!("invalid size `{value}`; using {}pt", out.size),
                },
                "color" => out.color = parse_color(value, out.color),
                "background" => out.background = Some(parse_color(value, Color::WHITE)),
                "bold" => set_flag(&mut out.bold, key, value),
                "italic" => set_flag(&mut out.italic, key, value),
                "font" => out.monospace = matches!(value.trim(), "monospace" | "mono"),
                "align" => match Align::parse(value) {
                    Some(align) => out.align = align,
                    None => log::warn!("invalid align `{value}`"),
                },
                "indent" => set_length(&mut out.indent, key, value),
                "spacing" => set_length(&mut out.spacing, key, value),
                "width" => match parse_fraction(value) {
                    Some(width) => out.width = width,
                    None => log::warn!("invalid width `{value}`"),
                },
                other => log::debug!("style key `{other}` has no effect"),
            }
        }
        out
    }
}

// ── value parsers ─────────────────────────────────────────────────────────

/// `"24dp"`, `"12pt"` or a bare number, in points. Must be positive.
pub fn parse_size(s: &str) -> Option<f32> {
    let s = s.trim();
    let number = s
        .strip_suffix("dp")
        .or_else(|| s.strip_suffix("pt"))
        .or_else(|| s.strip_suffix("px"))
        .unwrap_or(s)
        .trim();
    number.parse::<f32>().ok().filter(|v| v.is_finite() && *v > 0.0)
}

/// Hex or named color; `fallback` (with a warning) when malformed.
pub fn parse_color(s: &str, fallback: Color) -> Color {
    Color::parse(s).unwrap_or_else(|err| {
        log::warn!("{err}; using {}", fallback.to_hex());
        fallback
    })
}

/// `"60%"` or `"0.6"`, clamped to `(0, 1]`.
pub fn parse_fraction(s: &str) -> Option<f32> {
    let s = s.trim();
    let value = match s.strip_suffix('%') {
        Some(pct) => pct.trim().parse::<f32>().ok()? / 100.0,
        None => s.parse::<f32>().ok()?,
    };
    (value.is_finite() && value > 0.0).then(|| value.min(1.0))
}

fn set_flag(slot: &mut bool, key: &str, value: &str) {
    match value.trim() {
        "true" | "yes" | "1" => *slot = true,
        "false" | "no" | "0" => *slot = false,
        _ => log::warn!("invalid {key} `{value}`"),
    }
}

fn set_length(slot: &mut f32, key: &str, value: &str) {
    let value = value.trim();
    match value.strip_suffix("mm").unwrap_or(value).trim().parse::<f32>() {
        Ok(v) if v.is_finite() && v >= 0.0 => *slot = v,
        _ => log::warn!("invalid {key} `{value}`"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn style(pairs: &[(&str, &str)]) -> StyleMap {
        pairs.iter().copied().collect()
    }

    // ── sizes ─────────────────────────────────────────────────────────────

    #[test]
    fn size_units() {
        assert_eq!(parse_size("24dp"), Some(24.0));
        assert_eq!(parse_size(" 12pt "), Some(12.0));
        assert_eq!(parse_size("9.5"), Some(9.5));
        assert_eq!(parse_size("big"), None);
        assert_eq!(parse_size("-3dp"), None);
    }

    #[test]
    fn malformed_size_keeps_kind_default() {
        let s = ResolvedStyle::resolve(TagKind::Title, &style(&[("size", "huge")]), 10.0);
        assert_eq!(s.size, 20.0);
    }

    // ── colors ────────────────────────────────────────────────────────────

    #[test]
    fn malformed_color_falls_back_to_black() {
        let s = ResolvedStyle::resolve(TagKind::Text, &style(&[("color", "#zzz")]), 11.0);
        assert_eq!(s.color, Color::BLACK);
    }

    #[test]
    fn inline_color_overrides_kind_default() {
        let s = ResolvedStyle::resolve(TagKind::Link, &style(&[("color", "#ff0000")]), 11.0);
        assert_eq!(s.color, Color::rgb(255, 0, 0));
        assert_eq!(ResolvedStyle::defaults(TagKind::Link, 11.0).color, Color::rgb(0x1a, 0x0d, 0xab));
    }

    // ── kinds ─────────────────────────────────────────────────────────────

    #[test]
    fn kind_hints() {
        let title = ResolvedStyle::defaults(TagKind::Title, 11.0);
        assert!(title.bold && title.size > 11.0);
        let quote = ResolvedStyle::defaults(TagKind::Quote, 11.0);
        assert!(quote.italic && quote.indent > 0.0);
        let author = ResolvedStyle::defaults(TagKind::Author, 11.0);
        assert!(author.italic);
        assert_eq!(author.align, Align::Right);
        let code = ResolvedStyle::defaults(TagKind::Code, 11.0);
        assert!(code.monospace && code.background.is_some());
        let bullet = ResolvedStyle::defaults(TagKind::Bullet, 11.0);
        assert!(bullet.indent > 0.0 && bullet.prefix.is_some());
    }

    #[test]
    fn flags_lengths_and_width() {
        let s = ResolvedStyle::resolve(
            TagKind::Image,
            &style(&[("bold", "true"), ("indent", "4mm"), ("spacing", "0"), ("width", "60%"), ("align", "left")]),
            11.0,
        );
        assert!(s.bold);
        assert_eq!(s.indent, 4.0);
        assert_eq!(s.spacing, 0.0);
        assert!((s.width - 0.6).abs() < 1e-6);
        assert_eq!(s.align, Align::Left);
    }

    #[test]
    fn fractions() {
        assert_eq!(parse_fraction("50%"), Some(0.5));
        assert_eq!(parse_fraction("2"), Some(1.0));
        assert_eq!(parse_fraction("0"), None);
        assert_eq!(parse_fraction("wide"), None);
    }

    #[test]
    fn align_offsets() {
        assert_eq!(Align::Left.offset(100.0, 40.0), 0.0);
        assert_eq!(Align::Center.offset(100.0, 40.0), 30.0);
        assert_eq!(Align::Right.offset(100.0, 40.0), 60.0);
        assert_eq!(Align::Right.offset(10.0, 40.0), 0.0);
    }
}
