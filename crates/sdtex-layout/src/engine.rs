//! Flow layout and pagination.
//!
//! Nodes are visited depth-first in document order. Each leaf (and each
//! container with text of its own) becomes one block:
//!
//! 1. resolve the typed style and measure the block,
//! 2. break to a fresh page when `y + height` passes `page_height - margin`,
//! 3. place it and advance the cursor.
//!
//! Blocks are never split and layout never backtracks. Footer and
//! attribution blocks are anchored to the bottom margin of the current page
//! without moving the cursor.

use sdtex_engine::coords::Rect;
use sdtex_markup::{Content, Document, Node, TagKind};

use crate::block::{BlockPayload, Placement, PositionedBlock};
use crate::error::{CollaboratorError, LayoutError};
use crate::fetch::{ImageAsset, ImageFetcher, LocalImageFetcher};
use crate::graph::{GraphRenderer, GraphSpec, PlotConfig, PlotRenderer};
use crate::metrics::MetricsProvider;
use crate::page::{LayoutConfig, LayoutCursor};
use crate::sink::PageSink;
use crate::style::ResolvedStyle;

/// Counts reported after a render.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LayoutSummary {
    pub blocks: usize,
    pub pages: usize,
}

// ── LayoutEngine ──────────────────────────────────────────────────────────

pub struct LayoutEngine<'a> {
    metrics: &'a dyn MetricsProvider,
    images: &'a dyn ImageFetcher,
    graphs: &'a dyn GraphRenderer,
    config: LayoutConfig,
}

impl<'a> LayoutEngine<'a> {
    pub fn new(
        metrics: &'a dyn MetricsProvider,
        images: &'a dyn ImageFetcher,
        graphs: &'a dyn GraphRenderer,
    ) -> Self {
        Self { metrics, images, graphs, config: LayoutConfig::default() }
    }

    pub fn with_config(mut self, config: LayoutConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Lays out `document` on the configured page geometry.
    pub fn layout<'d>(&self, document: &'d Document) -> Vec<PositionedBlock<'d>> {
        let geometry = self.config.geometry;
        self.layout_within(document, geometry.flow_height(), geometry.margin)
    }

    /// Lays out `document` against an explicit page height and bottom margin.
    pub fn layout_within<'d>(&self, document: &'d Document, page_height: f32, margin: f32) -> Vec<PositionedBlock<'d>> {
        let mut pass = Pass {
            engine: self,
            cursor: LayoutCursor::new(page_height, margin),
            width: self.config.geometry.content_width(),
            blocks: Vec::new(),
        };
        for node in &document.nodes {
            pass.visit(node);
        }
        log::info!("laid out {} blocks on {} pages", pass.blocks.len(), pass.cursor.page + 1);
        pass.blocks
    }

    /// Lays out `document` and replays it into `sink`.
    pub fn render(&self, document: &Document, sink: &mut dyn PageSink) -> Result<LayoutSummary, LayoutError> {
        let blocks = self.layout(document);
        let margin = self.config.geometry.margin;

        sink.new_page()?;
        let mut page = 0;
        for block in &blocks {
            while page < block.page {
                sink.new_page()?;
                page += 1;
            }
            let rect = Rect::new(margin + block.x, margin + block.y, block.width, block.content_height());
            match &block.payload {
                BlockPayload::Text(text) => sink.place_text(text, block.page, rect, &block.style)?,
                BlockPayload::Image(asset) => sink.place_image(&asset.path, block.page, rect)?,
                BlockPayload::Spacer => {}
            }
        }
        Ok(LayoutSummary { blocks: blocks.len(), pages: page + 1 })
    }
}

/// Lays out `document` with the default image fetcher (current directory)
/// and graph renderer (temporary directory).
pub fn layout<'d>(
    document: &'d Document,
    metrics: &dyn MetricsProvider,
    page_height: f32,
    margin: f32,
) -> Vec<PositionedBlock<'d>> {
    let images = LocalImageFetcher::new(".");
    let graphs = PlotRenderer::new(PlotConfig::default());
    LayoutEngine::new(metrics, &images, &graphs).layout_within(document, page_height, margin)
}

// ── Pass ──────────────────────────────────────────────────────────────────

/// State of one layout run.
struct Pass<'e, 'a, 'd> {
    engine: &'e LayoutEngine<'a>,
    cursor: LayoutCursor,
    width: f32,
    blocks: Vec<PositionedBlock<'d>>,
}

impl<'d> Pass<'_, '_, 'd> {
    fn visit(&mut self, node: &'d Node) {
        let kind = node.kind();
        if kind == TagKind::Unknown {
            log::warn!("skipping unknown tag `{}` at {}", node.tag, node.origin);
        } else if node.is_leaf() || has_own_content(node) {
            self.place_own(node, kind);
        }
        for child in &node.children {
            self.visit(child);
        }
    }

    fn place_own(&mut self, node: &'d Node, kind: TagKind) {
        let style = ResolvedStyle::resolve(kind, &node.style, self.engine.config.base_size);
        let inner = (self.width - style.indent).max(1.0);

        let (payload, x, width, height) = match kind {
            TagKind::Image | TagKind::Graph => {
                let asset = match self.fetch_asset(node, kind) {
                    Ok(asset) => asset,
                    Err(source) => {
                        let err = LayoutError::Collaborator { tag: node.tag.clone(), origin: node.origin, source };
                        log::warn!("{err}; block skipped");
                        return;
                    }
                };
                let width = inner * style.width;
                let height = width / asset.aspect_ratio;
                let x = style.indent + style.align.offset(inner, width);
                (BlockPayload::Image(asset), x, width, height)
            }
            TagKind::NewLine => (BlockPayload::Spacer, style.indent, inner, self.engine.metrics.line_height(&style)),
            _ => {
                let text = match style.prefix {
                    Some(prefix) => format!("{prefix}{}", node.text()),
                    None => node.text().to_string(),
                };
                let height = self.engine.metrics.measure(&text, &style, inner).height;
                (BlockPayload::Text(text), style.indent, inner, height)
            }
        };

        let placement = if kind.is_fixed_bottom() { Placement::FixedBottom } else { Placement::Flow };
        let height = height + style.spacing;
        let (page, y) = self.position(node, placement, height);

        self.blocks.push(PositionedBlock { node, page, x, y, width, height, placement, style, payload });
    }

    fn fetch_asset(&self, node: &Node, kind: TagKind) -> Result<ImageAsset, CollaboratorError> {
        if kind == TagKind::Graph {
            let spec = GraphSpec::from_attributes(&node.attributes)?;
            return self.engine.graphs.render(&spec);
        }
        match &node.content {
            Content::Source(src) => self.engine.images.fetch(src),
            _ => Err(CollaboratorError::MissingAttribute { name: "src" }),
        }
    }

    /// Chooses `(page, y)` for a block and moves the cursor for flow blocks.
    fn position(&mut self, node: &Node, placement: Placement, height: f32) -> (usize, f32) {
        let cursor = &mut self.cursor;
        if placement == Placement::FixedBottom {
            return (cursor.page, cursor.bottom_anchor(height));
        }

        if !cursor.fits(height) {
            if cursor.y > 0.0 {
                log::debug!("page break before `{}` at {}", node.tag, node.origin);
                cursor.break_page();
            }
            if cursor.exceeds_page(height) {
                log::warn!(
                    "`{}` at {} is {height:.1}mm tall, more than a page ({:.1}mm); it will overflow",
                    node.tag,
                    node.origin,
                    cursor.limit()
                );
            }
        }
        let at = (cursor.page, cursor.y);
        cursor.advance(height);
        at
    }
}

/// Containers place their own text only when there is some.
fn has_own_content(node: &Node) -> bool {
    match &node.content {
        Content::Text(text) => !text.is_empty(),
        Content::Source(_) | Content::Attributes => true,
    }
}
