use std::path::PathBuf;

use crate::coords::{Rect, Vec2};
use crate::paint::Color;
use crate::text::FontId;

use super::{DrawCmd, ImageCmd, RectCmd, TextCmd};

/// Recorded draw stream for one page, in paint order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawList {
    items: Vec<DrawCmd>,
}

impl DrawList {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn push(&mut self, cmd: DrawCmd) {
        self.items.push(cmd);
    }

    #[inline]
    pub fn items(&self) -> &[DrawCmd] {
        &self.items
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn push_text(
        &mut self,
        text: impl Into<String>,
        font: FontId,
        size: f32,
        color: Color,
        origin: Vec2,
        max_width: Option<f32>,
    ) {
        self.push(DrawCmd::Text(TextCmd { text: text.into(), font, size, color, origin, max_width }));
    }

    pub fn push_image(&mut self, path: impl Into<PathBuf>, rect: Rect) {
        self.push(DrawCmd::Image(ImageCmd { path: path.into(), rect }));
    }

    pub fn push_rect(&mut self, rect: Rect, color: Color) {
        self.push(DrawCmd::Rect(RectCmd { rect, color }));
    }

    /// Concatenated text of every text command, for assertions and summaries.
    pub fn text_content(&self) -> Vec<&str> {
        self.items
            .iter()
            .filter_map(|cmd| match cmd {
                DrawCmd::Text(t) => Some(t.text.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// Ordered pages of recorded draw lists.
#[derive(Debug, Clone, Default)]
pub struct RecordedPages {
    pages: Vec<DrawList>,
}

impl RecordedPages {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a fresh page and returns its index.
    pub fn new_page(&mut self) -> usize {
        self.pages.push(DrawList::new());
        self.pages.len() - 1
    }

    /// Draw list of page `index`, if that page has been started.
    pub fn page_mut(&mut self, index: usize) -> Option<&mut DrawList> {
        self.pages.get_mut(index)
    }

    pub fn pages(&self) -> &[DrawList] {
        &self.pages
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}
