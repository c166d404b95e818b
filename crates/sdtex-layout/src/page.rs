//! Page geometry, layout configuration and the pagination cursor.
//!
//! Layout works in millimetres with `y = 0` at the top margin. A page
//! accepts flow content while `y + height <= page_height - margin`, where
//! `page_height` is measured from the top margin down to the paper edge.

// ── PageGeometry ──────────────────────────────────────────────────────────

/// Paper size and uniform margin, in millimetres.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin: f32,
}

impl Default for PageGeometry {
    /// A4 portrait with 15 mm margins.
    fn default() -> Self {
        Self { width: 210.0, height: 297.0, margin: 15.0 }
    }
}

impl PageGeometry {
    pub fn new(width: f32, height: f32, margin: f32) -> Self {
        Self { width, height, margin }
    }

    /// Width available to blocks between the side margins.
    #[inline]
    pub fn content_width(&self) -> f32 {
        (self.width - 2.0 * self.margin).max(0.0)
    }

    /// Distance from the top margin to the paper edge; the `page_height`
    /// the cursor paginates against.
    #[inline]
    pub fn flow_height(&self) -> f32 {
        (self.height - self.margin).max(0.0)
    }
}

// ── LayoutConfig ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutConfig {
    pub geometry: PageGeometry,
    /// Body text size in points; other kinds scale from it.
    pub base_size: f32,
    /// Resolution of raster page output.
    pub dpi: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self { geometry: PageGeometry::default(), base_size: 11.0, dpi: 150.0 }
    }
}

impl LayoutConfig {
    pub fn with_geometry(mut self, geometry: PageGeometry) -> Self {
        self.geometry = geometry;
        self
    }

    pub fn with_base_size(mut self, size: f32) -> Self {
        self.base_size = size;
        self
    }

    pub fn with_dpi(mut self, dpi: f32) -> Self {
        self.dpi = dpi;
        self
    }
}

// ── LayoutCursor ──────────────────────────────────────────────────────────

/// Where the next flow block goes. Local to one layout run.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LayoutCursor {
    pub page: usize,
    pub y: f32,
    pub page_height: f32,
    pub margin: f32,
}

impl LayoutCursor {
    pub fn new(page_height: f32, margin: f32) -> Self {
        Self { page: 0, y: 0.0, page_height, margin }
    }

    /// Lowest y a block may reach on any page.
    #[inline]
    pub fn limit(&self) -> f32 {
        self.page_height - self.margin
    }

    /// Whether a block of `height` fits below the cursor on this page.
    #[inline]
    pub fn fits(&self, height: f32) -> bool {
        self.y + height <= self.limit()
    }

    /// Whether a block of `height` would not fit even on an empty page.
    #[inline]
    pub fn exceeds_page(&self, height: f32) -> bool {
        height > self.limit()
    }

    /// Starts the next page with `y = 0`.
    #[inline]
    pub fn break_page(&mut self) {
        self.page += 1;
        self.y = 0.0;
    }

    #[inline]
    pub fn advance(&mut self, height: f32) {
        self.y += height;
    }

    /// Top of a block of `height` anchored to the bottom margin.
    #[inline]
    pub fn bottom_anchor(&self, height: f32) -> f32 {
        (self.limit() - height).max(0.0)
    }
}
