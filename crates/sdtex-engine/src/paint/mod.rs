//! Paint model shared between layout and the page writers.
//!
//! Pages are opaque, so colors are straight sRGB bytes without
//! premultiplication.

pub mod color;

pub use color::{Color, ColorParseError};
