//! Flattens a [`Document`] back into `.sdtex` tag form.
//!
//! Styles are written inline (they are already effective styles), so the
//! output needs no stylesheet and parses back to the same tree.

use std::fmt::Write as _;

use crate::ast::{Content, Document, Node};
use crate::props::{quote, PropMap};

impl Document {
    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            write_node(&mut out, node, 0);
            out.push('\n');
        }
        out
    }
}

impl Node {
    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        write_node(&mut out, self, 0);
        out
    }
}

fn write_node(out: &mut String, node: &Node, depth: usize) {
    let indent = "    ".repeat(depth);
    let _ = write!(out, "{indent}({}", node.tag);
    if !node.style.is_empty() {
        let _ = write!(out, " style={{{}}}", pairs(&node.style));
    }
    if !node.attributes.is_empty() {
        let _ = write!(out, " attributes={{{}}}", pairs(&node.attributes));
    }
    if let Content::Source(src) = &node.content {
        let _ = write!(out, " src=\"{src}\"");
    }
    out.push(')');

    if let Content::Text(text) = &node.content {
        out.push_str(text);
    }
    if !node.children.is_empty() {
        out.push('\n');
        for child in &node.children {
            write_node(out, child, depth + 1);
            out.push('\n');
        }
        out.push_str(&indent);
    }
    let _ = write!(out, "(!{})", node.tag);
}

fn pairs(map: &PropMap) -> String {
    map.iter().map(|(k, v)| format!("{k}: {}", quote(v))).collect::<Vec<_>>().join(", ")
}
