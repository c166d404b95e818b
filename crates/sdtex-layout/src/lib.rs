//! Layout and pagination for SdTeX documents.
//!
//! Takes the tree built by `sdtex-markup`, measures every block, assigns it
//! a page and a vertical offset, and hands the result to a [`PageSink`].
//!
//! # Structure
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`style`] | `ResolvedStyle`, per-kind defaults, size and color parsing |
//! | [`page`] | `PageGeometry`, `LayoutConfig`, `LayoutCursor` |
//! | [`metrics`] | `MetricsProvider`, `FontMetrics`, `MonospaceMetrics` |
//! | [`fetch`] | `ImageFetcher`, `LocalImageFetcher`, `ImageAsset` |
//! | [`graph`] | `GraphRenderer`, `PlotRenderer`, the `x` expression language |
//! | [`engine`] | `LayoutEngine`, `layout`, `render` |
//! | [`sink`] | `PageSink`, `PageRecorder` |
//! | [`markdown`] | `to_markdown` |
//!
//! # Example
//!
//! ```rust
//! use sdtex_layout::{layout, MonospaceMetrics};
//!
//! let doc = sdtex_markup::parse("(sdtitle)Report(!sdtitle)(sdtext)Body text.(!sdtext)").unwrap();
//! let blocks = layout(&doc, &MonospaceMetrics::default(), 282.0, 15.0);
//! assert_eq!(blocks.len(), 2);
//! assert!(blocks[1].y > blocks[0].y);
//! ```

pub mod block;
pub mod engine;
pub mod error;
pub mod fetch;
pub mod graph;
pub mod markdown;
pub mod metrics;
pub mod page;
pub mod sink;
pub mod style;

pub use block::{BlockPayload, Placement, PositionedBlock};
pub use engine::{layout, LayoutEngine, LayoutSummary};
pub use error::{CollaboratorError, LayoutError};
pub use fetch::{ImageAsset, ImageFetcher, LocalImageFetcher};
pub use graph::{GraphRenderer, GraphSpec, PlotConfig, PlotRenderer};
pub use markdown::to_markdown;
pub use metrics::{FontMetrics, FontSet, Measure, MetricsProvider, MonospaceMetrics};
pub use page::{LayoutConfig, LayoutCursor, PageGeometry};
pub use sink::{PageRecorder, PageSink};
pub use style::{Align, ResolvedStyle};
