//! Page writers.
//!
//! Writers consume [`RecordedPages`](crate::scene::RecordedPages) and produce
//! files. Page space (millimetres) is converted to device pixels here and
//! nowhere else.

mod raster;

pub use raster::{RasterConfig, RasterError, RasterPageWriter};
