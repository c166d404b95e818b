use sdtex_markup::Node;

use crate::fetch::ImageAsset;
use crate::style::ResolvedStyle;

/// How a block's vertical position was chosen.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Placement {
    /// Placed at the flow cursor, which then advances past it.
    Flow,
    /// Anchored to the bottom margin of the current page; the cursor stays put.
    FixedBottom,
}

/// What gets drawn for a block.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockPayload {
    /// Text ready to draw, bullet prefix included.
    Text(String),
    Image(ImageAsset),
    /// Vertical space only (`sdnline`).
    Spacer,
}

/// One leaf node (or a container's own text) with its page position.
///
/// `x` and `y` are relative to the top-left margin corner; `height`
/// includes the style's trailing spacing.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedBlock<'d> {
    pub node: &'d Node,
    pub page: usize,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub placement: Placement,
    pub style: ResolvedStyle,
    pub payload: BlockPayload,
}

impl PositionedBlock<'_> {
    /// Height of the drawn content, trailing spacing excluded.
    #[inline]
    pub fn content_height(&self) -> f32 {
        (self.height - self.style.spacing).max(0.0)
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}
