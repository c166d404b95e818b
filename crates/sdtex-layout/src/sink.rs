//! Page sinks: where positioned blocks end up.
//!
//! Coordinates passed to a sink are absolute page millimetres (margins
//! already applied).

use std::path::Path;

use sdtex_engine::coords::{Rect, Vec2};
use sdtex_engine::scene::RecordedPages;

use crate::error::LayoutError;
use crate::metrics::{FontSet, MetricsProvider};
use crate::style::ResolvedStyle;

pub trait PageSink {
    /// Starts the next page. Called once before the first block.
    fn new_page(&mut self) -> Result<(), LayoutError>;

    /// Draws `text` wrapped to `rect.size.x`, top-left at `rect.origin`.
    fn place_text(&mut self, text: &str, page: usize, rect: Rect, style: &ResolvedStyle) -> Result<(), LayoutError>;

    /// Draws the image at `path` stretched into `rect`.
    fn place_image(&mut self, path: &Path, page: usize, rect: Rect) -> Result<(), LayoutError>;
}

// ── PageRecorder ──────────────────────────────────────────────────────────

/// Records draw commands per page for a writer to replay later.
///
/// Alignment offsets come from the same [`MetricsProvider`] that measured
/// the blocks.
pub struct PageRecorder<'a> {
    metrics: &'a dyn MetricsProvider,
    set: FontSet,
    pages: RecordedPages,
}

impl<'a> PageRecorder<'a> {
    pub fn new(metrics: &'a dyn MetricsProvider, set: FontSet) -> Self {
        Self { metrics, set, pages: RecordedPages::new() }
    }

    pub fn pages(&self) -> &RecordedPages {
        &self.pages
    }

    pub fn into_pages(self) -> RecordedPages {
        self.pages
    }
}

impl PageSink for PageRecorder<'_> {
    fn new_page(&mut self) -> Result<(), LayoutError> {
        let index = self.pages.new_page();
        log::trace!("recording page {}", index + 1);
        Ok(())
    }

    fn place_text(&mut self, text: &str, page: usize, rect: Rect, style: &ResolvedStyle) -> Result<(), LayoutError> {
        let list = self.pages.page_mut(page).ok_or(LayoutError::PageNotStarted { page })?;
        let font = self.set.pick(style);

        if let Some(background) = style.background {
            list.push_rect(rect, background);
        }

        let line_width = self.metrics.line_width(text, style);
        let x = rect.origin.x + style.align.offset(rect.size.x, line_width);
        list.push_text(text, font, style.size, style.color, Vec2::new(x, rect.origin.y), Some(rect.size.x));
        Ok(())
    }

    fn place_image(&mut self, path: &Path, page: usize, rect: Rect) -> Result<(), LayoutError> {
        let list = self.pages.page_mut(page).ok_or(LayoutError::PageNotStarted { page })?;
        list.push_image(path, rect);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdtex_engine::scene::DrawCmd;
    use sdtex_engine::text::FontId;
    use sdtex_markup::TagKind;

    use crate::metrics::MonospaceMetrics;

    fn recorder(metrics: &MonospaceMetrics) -> PageRecorder<'_> {
        PageRecorder::new(metrics, FontSet::single(FontId::from_index(0)))
    }

    fn text_origin(rec: &PageRecorder<'_>, page: usize, item: usize) -> Vec2 {
        match &rec.pages().pages()[page].items()[item] {
            DrawCmd::Text(t) => t.origin,
            other => panic!("expected text, got {other:?}"),
        }
    }

    #[test]
    fn drawing_before_new_page_is_an_error() {
        let metrics = MonospaceMetrics::default();
        let mut rec = recorder(&metrics);
        let style = ResolvedStyle::defaults(TagKind::Text, 11.0);
        let err = rec.place_text("x", 0, Rect::new(15.0, 15.0, 180.0, 5.0), &style).unwrap_err();
        assert!(matches!(err, LayoutError::PageNotStarted { page: 0 }));
    }

    #[test]
    fn code_background_is_drawn_under_text() {
        let metrics = MonospaceMetrics::default();
        let mut rec = recorder(&metrics);
        rec.new_page().unwrap();
        let style = ResolvedStyle::defaults(TagKind::Code, 11.0);
        rec.place_text("let x = 1;", 0, Rect::new(17.0, 15.0, 178.0, 5.0), &style).unwrap();

        let items = rec.pages().pages()[0].items();
        assert!(matches!(items[0], DrawCmd::Rect(_)));
        match &items[1] {
            DrawCmd::Text(t) => {
                assert_eq!(t.text, "let x = 1;");
                assert_eq!(t.origin, Vec2::new(17.0, 15.0));
                assert_eq!(t.max_width, Some(178.0));
            }
            other => panic!("expected text, got {other:?}"),
        }
    }

    #[test]
    fn alignment_uses_measured_line_width() {
        let metrics = MonospaceMetrics::default();
        let mut rec = recorder(&metrics);
        rec.new_page().unwrap();

        let author = ResolvedStyle::defaults(TagKind::Author, 11.0);
        let width = metrics.line_width("Jobs", &author);
        rec.place_text("Jobs", 0, Rect::new(15.0, 40.0, 180.0, 5.0), &author).unwrap();
        let right = text_origin(&rec, 0, 0);
        assert!((right.x - (15.0 + 180.0 - width)).abs() < 1e-4);
        assert_eq!(right.y, 40.0);

        let body = ResolvedStyle::defaults(TagKind::Text, 11.0);
        rec.place_text("Jobs", 0, Rect::new(15.0, 50.0, 180.0, 5.0), &body).unwrap();
        assert_eq!(text_origin(&rec, 0, 1).x, 15.0);
    }

    #[test]
    fn images_go_to_their_page() {
        let metrics = MonospaceMetrics::default();
        let mut rec = recorder(&metrics);
        rec.new_page().unwrap();
        rec.new_page().unwrap();
        rec.place_image(Path::new("a.png"), 1, Rect::new(15.0, 15.0, 90.0, 45.0)).unwrap();

        let pages = rec.into_pages();
        assert!(pages.pages()[0].is_empty());
        assert_eq!(pages.pages()[1].len(), 1);
    }
}
