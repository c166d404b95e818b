use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use fontdue::layout::GlyphRasterConfig;
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

use crate::coords::{mm_to_px, pt_to_px, Rect};
use crate::paint::Color;
use crate::scene::{DrawCmd, DrawList, ImageCmd, RecordedPages, RectCmd, TextCmd};
use crate::text::FontSystem;

// ── error ─────────────────────────────────────────────────────────────────

/// Error returned by [`RasterPageWriter::write_pages`].
#[derive(Debug)]
pub enum RasterError {
    CreateDir { path: PathBuf, source: std::io::Error },
    Encode { path: PathBuf, source: image::ImageError },
}

impl fmt::Display for RasterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RasterError::CreateDir { path, source } => {
                write!(f, "cannot create output directory {}: {source}", path.display())
            }
            RasterError::Encode { path, source } => {
                write!(f, "cannot write page {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for RasterError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RasterError::CreateDir { source, .. } => Some(source),
            RasterError::Encode { source, .. } => Some(source),
        }
    }
}

// ── config ────────────────────────────────────────────────────────────────

/// Output resolution and paper of the raster writer.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterConfig {
    pub dpi: f32,
    pub page_width: f32,
    pub page_height: f32,
    pub background: Color,
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self { dpi: 150.0, page_width: 210.0, page_height: 297.0, background: Color::WHITE }
    }
}

impl RasterConfig {
    pub fn with_dpi(mut self, dpi: f32) -> Self {
        self.dpi = dpi.max(1.0);
        self
    }

    pub fn with_page_size(mut self, width: f32, height: f32) -> Self {
        self.page_width = width;
        self.page_height = height;
        self
    }

    /// Page size in whole device pixels, never zero.
    pub fn pixel_size(&self) -> (u32, u32) {
        let w = mm_to_px(self.page_width, self.dpi).round().max(1.0) as u32;
        let h = mm_to_px(self.page_height, self.dpi).round().max(1.0) as u32;
        (w, h)
    }
}

// ── writer ────────────────────────────────────────────────────────────────

/// Rasterizes recorded pages on the CPU and saves them as PNG files.
///
/// Glyph bitmaps are cached per `(font, glyph, pixel size)` for the writer's
/// lifetime, so repeated text across pages is rasterized once.
pub struct RasterPageWriter<'a> {
    fonts: &'a FontSystem,
    config: RasterConfig,
    glyph_cache: HashMap<GlyphRasterConfig, (fontdue::Metrics, Vec<u8>)>,
}

impl<'a> RasterPageWriter<'a> {
    pub fn new(fonts: &'a FontSystem, config: RasterConfig) -> Self {
        Self { fonts, config, glyph_cache: HashMap::new() }
    }

    /// Writes every page to `dir/page-NNN.png` (1-based) and returns the paths.
    pub fn write_pages(&mut self, pages: &RecordedPages, dir: &Path) -> Result<Vec<PathBuf>, RasterError> {
        std::fs::create_dir_all(dir)
            .map_err(|source| RasterError::CreateDir { path: dir.to_path_buf(), source })?;

        let mut written = Vec::with_capacity(pages.len());
        for (index, page) in pages.pages().iter().enumerate() {
            let path = dir.join(format!("page-{:03}.png", index + 1));
            let image = self.render_page(page);
            image
                .save(&path)
                .map_err(|source| RasterError::Encode { path: path.clone(), source })?;
            log::debug!("wrote {}", path.display());
            written.push(path);
        }
        Ok(written)
    }

    /// Paints one page into a fresh image.
    pub fn render_page(&mut self, page: &DrawList) -> RgbaImage {
        let (w, h) = self.config.pixel_size();
        let mut canvas = RgbaImage::from_pixel(w, h, Rgba(self.config.background.to_rgba()));

        for cmd in page.items() {
            match cmd {
                DrawCmd::Rect(rect) => self.paint_rect(&mut canvas, rect),
                DrawCmd::Text(text) => self.paint_text(&mut canvas, text),
                DrawCmd::Image(img) => self.paint_image(&mut canvas, img),
            }
        }
        canvas
    }

    // ── commands ──────────────────────────────────────────────────────────

    fn px_rect(&self, rect: Rect) -> Rect {
        rect.scaled(mm_to_px(1.0, self.config.dpi))
    }

    fn paint_rect(&self, canvas: &mut RgbaImage, cmd: &RectCmd) {
        let bounds = Rect::new(0.0, 0.0, canvas.width() as f32, canvas.height() as f32);
        let Some(r) = self.px_rect(cmd.rect).intersect(bounds) else {
            return;
        };
        let (x0, y0) = (r.origin.x.round() as u32, r.origin.y.round() as u32);
        let (x1, y1) = (r.max().x.round() as u32, r.max().y.round() as u32);
        for y in y0..y1.min(canvas.height()) {
            for x in x0..x1.min(canvas.width()) {
                let dst = canvas.get_pixel(x, y).0;
                canvas.put_pixel(x, y, Rgba(cmd.color.blend_over(dst, 1.0)));
            }
        }
    }

    fn paint_text(&mut self, canvas: &mut RgbaImage, cmd: &TextCmd) {
        let dpi = self.config.dpi;
        let fonts = self.fonts;
        let Some(font) = fonts.get(cmd.font) else {
            log::warn!("text command references an unloaded font; skipped");
            return;
        };

        let glyphs = fonts.glyphs(
            cmd.font,
            &cmd.text,
            pt_to_px(cmd.size, dpi),
            mm_to_px(cmd.origin.x, dpi),
            mm_to_px(cmd.origin.y, dpi),
            cmd.max_width.map(|w| mm_to_px(w, dpi)),
        );

        for glyph in glyphs {
            if !glyph.char_data.rasterize() || glyph.width == 0 || glyph.height == 0 {
                continue;
            }
            let (metrics, bitmap) = self
                .glyph_cache
                .entry(glyph.key)
                .or_insert_with(|| font.rasterize_config(glyph.key));

            let gx = glyph.x.round() as i64;
            let gy = glyph.y.round() as i64;
            for row in 0..metrics.height {
                for col in 0..metrics.width {
                    let coverage = bitmap[row * metrics.width + col];
                    if coverage == 0 {
                        continue;
                    }
                    let (px, py) = (gx + col as i64, gy + row as i64);
                    if px < 0 || py < 0 || px >= canvas.width() as i64 || py >= canvas.height() as i64 {
                        continue;
                    }
                    let (px, py) = (px as u32, py as u32);
                    let dst = canvas.get_pixel(px, py).0;
                    canvas.put_pixel(px, py, Rgba(cmd.color.blend_over(dst, coverage as f32 / 255.0)));
                }
            }
        }
    }

    fn paint_image(&self, canvas: &mut RgbaImage, cmd: &ImageCmd) {
        let source = match image::open(&cmd.path) {
            Ok(img) => img.to_rgba8(),
            Err(err) => {
                log::warn!("cannot draw image {}: {err}", cmd.path.display());
                return;
            }
        };
        let r = self.px_rect(cmd.rect);
        let (w, h) = (r.size.x.round().max(1.0) as u32, r.size.y.round().max(1.0) as u32);
        let scaled = imageops::resize(&source, w, h, FilterType::Triangle);
        imageops::overlay(canvas, &scaled, r.origin.x.round() as i64, r.origin.y.round() as i64);
    }
}
