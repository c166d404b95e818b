//! SdTeX engine crate.
//!
//! Owns the pieces below layout: logger setup, page geometry primitives,
//! colors, font loading and measurement, recorded per-page draw lists and the
//! raster page writer that turns them into image files.
//!
//! Page space is in millimetres with a top-left origin (+X right, +Y down).
//! Font sizes are in points.

pub mod coords;
pub mod logging;
pub mod paint;
pub mod render;
pub mod scene;
pub mod text;
