//! Function plots for `sdgraph` blocks.
//!
//! ```sdtex
//! (sdgraph attributes={function: "sin(x)", first_point: 0, last_point: 6.28, quality: 300, graph_color: #0000ff})(!sdgraph)
//! ```
//!
//! | attribute | default |
//! |-----------|---------|
//! | `function` | required |
//! | `first_point` | `0` |
//! | `last_point` | `10` |
//! | `quality` | `200` samples, clamped to `2..=10000` |
//! | `graph_color` | black |

pub mod expr;

use std::cell::Cell;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use image::{ImageFormat, Rgba, RgbaImage};
use sdtex_engine::paint::Color;
use sdtex_markup::AttributeMap;

use crate::error::CollaboratorError;
use crate::fetch::ImageAsset;

pub use expr::{Expr, ExprError};

const DEFAULT_FIRST: &str = "0";
const DEFAULT_LAST: &str = "10";
const DEFAULT_QUALITY: usize = 200;
const QUALITY_RANGE: std::ops::RangeInclusive<usize> = 2..=10_000;

// ── GraphSpec ─────────────────────────────────────────────────────────────

/// Graph attributes exactly as written in the document.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphSpec {
    pub function: String,
    pub first_point: String,
    pub last_point: String,
    pub quality: Option<String>,
    pub graph_color: Option<String>,
}

impl GraphSpec {
    pub fn from_attributes(attrs: &AttributeMap) -> Result<Self, CollaboratorError> {
        let function = attrs
            .get("function")
            .filter(|f| !f.trim().is_empty())
            .ok_or(CollaboratorError::MissingAttribute { name: "function" })?;
        Ok(Self {
            function: function.to_string(),
            first_point: attrs.get("first_point").unwrap_or(DEFAULT_FIRST).to_string(),
            last_point: attrs.get("last_point").unwrap_or(DEFAULT_LAST).to_string(),
            quality: attrs.get("quality").map(str::to_string),
            graph_color: attrs.get("graph_color").map(str::to_string),
        })
    }
}

/// Validated, typed form of a [`GraphSpec`].
#[derive(Debug, Clone, PartialEq)]
pub struct Plot {
    pub expr: Expr,
    pub first: f64,
    pub last: f64,
    pub samples: usize,
    pub color: Color,
}

impl Plot {
    pub fn from_spec(spec: &GraphSpec) -> Result<Self, CollaboratorError> {
        let expr = Expr::parse(&spec.function).map_err(|e| CollaboratorError::Expression {
            expr: spec.function.clone(),
            message: e.to_string(),
        })?;
        let first = parse_bound("first_point", &spec.first_point)?;
        let last = parse_bound("last_point", &spec.last_point)?;
        if last <= first {
            return Err(CollaboratorError::InvalidAttribute {
                name: "last_point",
                value: spec.last_point.clone(),
                message: format!("must be greater than first_point ({first})"),
            });
        }

        let samples = match &spec.quality {
            None => DEFAULT_QUALITY,
            Some(q) => {
                let n = q.trim().parse::<f64>().map_err(|_| CollaboratorError::InvalidAttribute {
                    name: "quality",
                    value: q.clone(),
                    message: "expected a sample count".into(),
                })?;
                if !n.is_finite() {
                    return Err(CollaboratorError::InvalidAttribute {
                        name: "quality",
                        value: q.clone(),
                        message: "expected a sample count".into(),
                    });
                }
                (n.max(0.0) as usize).clamp(*QUALITY_RANGE.start(), *QUALITY_RANGE.end())
            }
        };

        let color = spec
            .graph_color
            .as_deref()
            .map(|c| crate::style::parse_color(c, Color::BLACK))
            .unwrap_or(Color::BLACK);

        Ok(Self { expr, first, last, samples, color })
    }

    /// `(x, f(x))` at evenly spaced points, ends included.
    pub fn sample(&self) -> Vec<(f64, f64)> {
        let step = (self.last - self.first) / (self.samples - 1) as f64;
        (0..self.samples)
            .map(|i| {
                let x = if i + 1 == self.samples { self.last } else { self.first + step * i as f64 };
                (x, self.expr.eval(x))
            })
            .collect()
    }
}

fn parse_bound(name: &'static str, value: &str) -> Result<f64, CollaboratorError> {
    let invalid = |message: &str| CollaboratorError::InvalidAttribute {
        name,
        value: value.to_string(),
        message: message.to_string(),
    };
    // Bounds may be written as expressions such as `2*pi`.
    let expr = Expr::parse(value).map_err(|e| invalid(&e.to_string()))?;
    let v = expr.eval(0.0);
    if expr_uses_x(&expr) || !v.is_finite() {
        return Err(invalid("expected a finite constant"));
    }
    Ok(v)
}

fn expr_uses_x(expr: &Expr) -> bool {
    match expr {
        Expr::X => true,
        Expr::Num(_) => false,
        Expr::Neg(e) | Expr::Call(_, e) => expr_uses_x(e),
        Expr::Bin(_, a, b) => expr_uses_x(a) || expr_uses_x(b),
    }
}

// ── GraphRenderer ─────────────────────────────────────────────────────────

pub trait GraphRenderer {
    /// Produces an image of the plot described by `spec`.
    fn render(&self, spec: &GraphSpec) -> Result<ImageAsset, CollaboratorError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlotConfig {
    pub width: u32,
    pub height: u32,
    /// Blank border around the plot area, in pixels.
    pub padding: u32,
    pub out_dir: PathBuf,
    pub background: Color,
    pub axis_color: Color,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 500,
            padding: 16,
            out_dir: std::env::temp_dir().join("sdtex-graphs"),
            background: Color::WHITE,
            axis_color: Color::rgb(0xbb, 0xbb, 0xbb),
        }
    }
}

impl PlotConfig {
    pub fn with_out_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.out_dir = dir.into();
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width.max(1);
        self.height = height.max(1);
        self
    }
}

/// Rasterizes plots to `out_dir/graph-NNN-XXXXXX.png`.
///
/// `NNN` counts per renderer; the random suffix comes from exclusive file
/// creation, so renderers sharing `out_dir` never overwrite each other.
#[derive(Debug)]
pub struct PlotRenderer {
    config: PlotConfig,
    rendered: Cell<usize>,
}

impl PlotRenderer {
    pub fn new(config: PlotConfig) -> Self {
        Self { config, rendered: Cell::new(0) }
    }

    pub fn config(&self) -> &PlotConfig {
        &self.config
    }

    /// Draws `plot` into an image without touching the filesystem.
    pub fn draw(&self, plot: &Plot) -> Result<RgbaImage, CollaboratorError> {
        let points = plot.sample();
        let finite = || points.iter().filter(|(_, y)| y.is_finite());
        let (mut y_min, mut y_max) = finite().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), (_, y)| {
            (lo.min(*y), hi.max(*y))
        });
        if !y_min.is_finite() {
            return Err(CollaboratorError::Expression {
                expr: plot.expr.to_string(),
                message: format!("no finite value on [{}, {}]", plot.first, plot.last),
            });
        }
        if y_max - y_min < 1e-12 {
            y_min -= 1.0;
            y_max += 1.0;
        }

        let PlotConfig { width, height, padding, .. } = self.config;
        let mut canvas = RgbaImage::from_pixel(width, height, Rgba(self.config.background.to_rgba()));
        let pad = padding.min(width / 4).min(height / 4) as f64;
        let (w, h) = (width as f64 - 2.0 * pad, height as f64 - 2.0 * pad);
        let to_px = |x: f64, y: f64| {
            (
                pad + (x - plot.first) / (plot.last - plot.first) * w,
                pad + (y_max - y) / (y_max - y_min) * h,
            )
        };

        // Axes through the origin when it is in view.
        if (y_min..=y_max).contains(&0.0) {
            let (x0, y0) = to_px(plot.first, 0.0);
            let (x1, _) = to_px(plot.last, 0.0);
            draw_line(&mut canvas, (x0, y0), (x1, y0), self.config.axis_color);
        }
        if (plot.first..=plot.last).contains(&0.0) {
            let (x0, y0) = to_px(0.0, y_max);
            let (_, y1) = to_px(0.0, y_min);
            draw_line(&mut canvas, (x0, y0), (x0, y1), self.config.axis_color);
        }

        // Non-finite samples split the curve.
        for pair in points.windows(2) {
            let [(xa, ya), (xb, yb)] = [pair[0], pair[1]];
            if ya.is_finite() && yb.is_finite() {
                draw_thick_line(&mut canvas, to_px(xa, ya), to_px(xb, yb), plot.color);
            }
        }
        let lone: Vec<_> = finite().collect();
        if let &[&(x, y)] = lone.as_slice() {
            draw_thick_line(&mut canvas, to_px(x, y), to_px(x, y), plot.color);
        }
        Ok(canvas)
    }
}

impl GraphRenderer for PlotRenderer {
    fn render(&self, spec: &GraphSpec) -> Result<ImageAsset, CollaboratorError> {
        let plot = Plot::from_spec(spec)?;
        let canvas = self.draw(&plot)?;

        let dir = &self.config.out_dir;
        std::fs::create_dir_all(dir).map_err(|source| CollaboratorError::Io { path: dir.clone(), source })?;

        let index = self.rendered.get() + 1;
        self.rendered.set(index);
        let (file, path) = create_unique(dir, index)
            .map_err(|source| CollaboratorError::Io { path: dir.clone(), source })?;

        let mut out = BufWriter::new(file);
        canvas
            .write_to(&mut out, ImageFormat::Png)
            .map_err(|e| CollaboratorError::Encode { path: path.clone(), message: e.to_string() })?;
        out.flush().map_err(|source| CollaboratorError::Io { path: path.clone(), source })?;

        log::debug!("plotted `{}` with {} samples to {}", plot.expr, plot.samples, path.display());
        Ok(ImageAsset { path, aspect_ratio: self.config.width as f32 / self.config.height as f32 })
    }
}

fn create_unique(dir: &std::path::Path, index: usize) -> std::io::Result<(File, PathBuf)> {
    tempfile::Builder::new()
        .prefix(&format!("graph-{index:03}-"))
        .suffix(".png")
        .tempfile_in(dir)?
        .keep()
        .map_err(|e| e.error)
}

// ── drawing ───────────────────────────────────────────────────────────────

fn put(canvas: &mut RgbaImage, x: i64, y: i64, color: Color) {
    if x < 0 || y < 0 || x >= canvas.width() as i64 || y >= canvas.height() as i64 {
        return;
    }
    let (x, y) = (x as u32, y as u32);
    let dst = canvas.get_pixel(x, y).0;
    canvas.put_pixel(x, y, Rgba(color.blend_over(dst, 1.0)));
}

/// One-pixel DDA line.
fn draw_line(canvas: &mut RgbaImage, from: (f64, f64), to: (f64, f64), color: Color) {
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    let steps = dx.abs().max(dy.abs()).ceil().max(1.0) as usize;
    for i in 0..=steps {
        let t = i as f64 / steps as f64;
        put(canvas, (from.0 + dx * t).round() as i64, (from.1 + dy * t).round() as i64, color);
    }
}

/// Two-pixel-wide line for the curve itself.
fn draw_thick_line(canvas: &mut RgbaImage, from: (f64, f64), to: (f64, f64), color: Color) {
    for (ox, oy) in [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (1.0, 1.0)] {
        draw_line(canvas, (from.0 + ox, from.1 + oy), (to.0 + ox, to.1 + oy), color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> AttributeMap {
        pairs.iter().copied().collect()
    }

    fn spec(pairs: &[(&str, &str)]) -> GraphSpec {
        GraphSpec::from_attributes(&attrs(pairs)).unwrap()
    }

    // ── attributes ────────────────────────────────────────────────────────

    #[test]
    fn defaults_fill_missing_attributes() {
        let plot = Plot::from_spec(&spec(&[("function", "x")])).unwrap();
        assert_eq!((plot.first, plot.last), (0.0, 10.0));
        assert_eq!(plot.samples, 200);
        assert_eq!(plot.color, Color::BLACK);
    }

    #[test]
    fn function_is_required() {
        let err = GraphSpec::from_attributes(&attrs(&[("first_point", "0")])).unwrap_err();
        assert!(matches!(err, CollaboratorError::MissingAttribute { name: "function" }));
    }

    #[test]
    fn quality_is_clamped() {
        assert_eq!(Plot::from_spec(&spec(&[("function", "x"), ("quality", "1")])).unwrap().samples, 2);
        assert_eq!(Plot::from_spec(&spec(&[("function", "x"), ("quality", "1e9")])).unwrap().samples, 10_000);
        assert!(Plot::from_spec(&spec(&[("function", "x"), ("quality", "lots")])).is_err());
    }

    #[test]
    fn bounds_accept_constant_expressions() {
        let plot = Plot::from_spec(&spec(&[("function", "sin(x)"), ("last_point", "2*pi")])).unwrap();
        assert!((plot.last - std::f64::consts::TAU).abs() < 1e-12);
        assert!(Plot::from_spec(&spec(&[("function", "x"), ("last_point", "x")])).is_err());
    }

    #[test]
    fn reversed_bounds_are_rejected() {
        let err = Plot::from_spec(&spec(&[("function", "x"), ("first_point", "5"), ("last_point", "1")])).unwrap_err();
        assert!(matches!(err, CollaboratorError::InvalidAttribute { name: "last_point", .. }));
    }

    #[test]
    fn bad_function_is_an_expression_error() {
        let err = Plot::from_spec(&spec(&[("function", "open(x)")])).unwrap_err();
        assert!(matches!(err, CollaboratorError::Expression { .. }));
    }

    #[test]
    fn samples_include_both_ends() {
        let plot = Plot::from_spec(&spec(&[("function", "2*x"), ("first_point", "1"), ("last_point", "3"), ("quality", "5")])).unwrap();
        let pts = plot.sample();
        assert_eq!(pts.len(), 5);
        assert_eq!(pts[0], (1.0, 2.0));
        assert_eq!(pts[4], (3.0, 6.0));
    }

    // ── rendering ─────────────────────────────────────────────────────────

    #[test]
    fn curve_pixels_use_graph_color() {
        let renderer = PlotRenderer::new(PlotConfig::default().with_size(100, 60));
        let plot = Plot::from_spec(&spec(&[("function", "1"), ("graph_color", "#ff0000")])).unwrap();
        let img = renderer.draw(&plot).unwrap();
        assert!(img.pixels().any(|p| p.0 == [255, 0, 0, 255]));
    }

    #[test]
    fn nowhere_finite_function_fails() {
        let renderer = PlotRenderer::new(PlotConfig::default().with_size(50, 50));
        let plot = Plot::from_spec(&spec(&[("function", "sqrt(-1 - x^2)")])).unwrap();
        assert!(renderer.draw(&plot).is_err());
    }

    #[test]
    fn render_writes_numbered_png() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = PlotRenderer::new(PlotConfig::default().with_size(80, 40).with_out_dir(dir.path()));
        let first = renderer.render(&spec(&[("function", "x^2"), ("first_point", "-2"), ("last_point", "2")])).unwrap();
        let second = renderer.render(&spec(&[("function", "1/x"), ("first_point", "-1"), ("last_point", "1")])).unwrap();

        let name = |asset: &ImageAsset| asset.path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name(&first).starts_with("graph-001-") && name(&first).ends_with(".png"));
        assert!(name(&second).starts_with("graph-002-"));
        assert_eq!(first.path.parent(), Some(dir.path()));
        assert_eq!(first.aspect_ratio, 2.0);
        assert_eq!(image::image_dimensions(&first.path).unwrap(), (80, 40));
    }

    #[test]
    fn renderers_sharing_a_directory_do_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let config = PlotConfig::default().with_size(40, 40).with_out_dir(dir.path());
        let a = PlotRenderer::new(config.clone()).render(&spec(&[("function", "x")])).unwrap();
        let b = PlotRenderer::new(config).render(&spec(&[("function", "-x")])).unwrap();

        assert_ne!(a.path, b.path);
        assert!(a.path.exists() && b.path.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[test]
    fn runaway_nesting_is_an_expression_error() {
        let deep = format!("{}x{}", "(".repeat(2 * expr::MAX_DEPTH), ")".repeat(2 * expr::MAX_DEPTH));
        let err = Plot::from_spec(&spec(&[("function", deep.as_str())])).unwrap_err();
        assert!(matches!(err, CollaboratorError::Expression { .. }));
    }
}
