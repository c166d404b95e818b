//! Variable table, stylesheet, tag parser and document model for **SdTeX**
//! (`.sdtex`) markup.
//!
//! This crate knows nothing about fonts, pages or pixels so it can be used by
//! tooling that only needs the tree.
//!
//! # Structure
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`variables`] | `VariableTable`, `$name` substitution |
//! | [`props`] | `PropMap` (`StyleMap` / `AttributeMap`), `key: value` pair blocks |
//! | [`stylesheet`] | `Stylesheet`, per-tag default styles |
//! | [`lexer`] | `Lexer`, `Token` |
//! | [`parser`] | stack-based tree builder, `parse` entry point |
//! | [`ast`] | `Document`, `Node`, `Content`, `TagKind` |
//! | [`error`] | `MarkupError`, `Origin` |
//!
//! # Quick start
//!
//! ```rust
//! use sdtex_markup::parse;
//!
//! let src = r#"
//! who: "World"
//! (sdtitle style={size: 24dp})
//! (sdtitle)Hello $who(!sdtitle)
//! (sdbullet)one(!sdbullet)
//! (sdbullet)two(!sdbullet)
//! "#;
//!
//! let doc = parse(src).unwrap();
//! assert_eq!(doc.nodes.len(), 3);
//! assert_eq!(doc.nodes[0].text(), "Hello World");
//! assert_eq!(doc.nodes[0].style.get("size"), Some("24dp"));
//! ```

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod props;
pub mod stylesheet;
pub mod variables;
mod writer;

pub use ast::{Content, Document, Node, TagKind};
pub use error::{MarkupError, Origin};
pub use parser::{parse, parse_source, Parsed};
pub use props::{AttributeMap, PropMap, StyleMap};
pub use stylesheet::{parse_stylesheet, Stylesheet};
pub use variables::VariableTable;
