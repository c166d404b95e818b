//! Geometry types shared by layout and the page writers.
//!
//! Page space:
//! - millimetres
//! - origin top-left of the page
//! - +X right, +Y down
//!
//! Writers convert to device pixels with their own DPI.

mod rect;
mod vec2;

pub use rect::Rect;
pub use vec2::Vec2;

/// Millimetres per typographic point (1/72 inch).
pub const MM_PER_PT: f32 = 25.4 / 72.0;

/// Converts millimetres to device pixels at `dpi`.
#[inline]
pub fn mm_to_px(mm: f32, dpi: f32) -> f32 {
    mm * dpi / 25.4
}

/// Converts points to device pixels at `dpi`.
#[inline]
pub fn pt_to_px(pt: f32, dpi: f32) -> f32 {
    pt * dpi / 72.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_inch() {
        assert!((mm_to_px(25.4, 300.0) - 300.0).abs() < 1e-3);
        assert!((pt_to_px(72.0, 150.0) - 150.0).abs() < 1e-3);
        assert!((72.0 * MM_PER_PT - 25.4).abs() < 1e-4);
    }
}
