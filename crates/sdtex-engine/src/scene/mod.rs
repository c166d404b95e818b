//! Recorded page content.
//!
//! Layout never draws directly. It records renderer-agnostic commands into a
//! [`DrawList`] per page; writers replay them in insertion order.

mod cmd;
mod list;

pub use cmd::{DrawCmd, ImageCmd, RectCmd, TextCmd};
pub use list::{DrawList, RecordedPages};
