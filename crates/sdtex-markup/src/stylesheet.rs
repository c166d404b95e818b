//! Per-tag-type default styles.
//!
//! ```sdtex
//! (sdtitle style={size: 24dp, color: #202040})
//! (sdbullet style={color: #444444})
//! ```
//!
//! A top-level `(type style={...})` is a stylesheet entry when no matching
//! `(!type)` follows it. With a matching close it is an ordinary styled tag.

use std::collections::BTreeMap;

use crate::error::MarkupError;
use crate::lexer::{Lexer, Token, TokenWithPos};
use crate::props::StyleMap;
use crate::variables::{strip_declarations, VariableTable};

// ── Stylesheet ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Stylesheet {
    defaults: BTreeMap<String, StyleMap>,
}

impl Stylesheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a declaration. Repeated declarations merge; later keys win.
    pub fn declare(&mut self, tag: impl Into<String>, style: &StyleMap) {
        self.defaults.entry(tag.into()).or_default().extend_from(style);
    }

    /// The default style declared for `tag`.
    pub fn lookup(&self, tag: &str) -> Result<&StyleMap, MarkupError> {
        self.defaults.get(tag).ok_or_else(|| MarkupError::TagNotFound { tag: tag.to_string() })
    }

    /// Effective style for a node: inline keys win, declared defaults fill the
    /// gaps. Keys neither defines are left for the renderer's own defaults.
    pub fn resolve(&self, tag: &str, inline: Option<&StyleMap>) -> StyleMap {
        let mut style = inline.cloned().unwrap_or_default();
        match self.lookup(tag) {
            Ok(default) => style.fill_from(default),
            Err(err) => log::trace!("{err}; using renderer defaults"),
        }
        style
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.defaults.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.defaults.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &StyleMap)> {
        self.defaults.iter().map(|(k, v)| (k.as_str(), v))
    }
}

// ── extraction ────────────────────────────────────────────────────────────

/// Pulls stylesheet declarations out of a token stream.
///
/// Returns the stylesheet and the remaining tokens for the tag parser.
pub fn split_declarations(tokens: Vec<TokenWithPos>) -> (Stylesheet, Vec<TokenWithPos>) {
    let mut sheet = Stylesheet::new();
    let mut keep = Vec::with_capacity(tokens.len());
    let mut depth = 0usize;

    for (i, tok) in tokens.iter().enumerate() {
        match &tok.token {
            Token::Open(open) if depth == 0 && open.is_style_only() && !has_matching_close(&tokens[i + 1..], &open.name) => {
                if let Some(style) = &open.style {
                    log::debug!("stylesheet entry for `{}` at line {}", open.name, tok.line);
                    sheet.declare(open.name.clone(), style);
                }
                continue;
            }
            Token::Open(_) => depth += 1,
            Token::Close(_) => depth = depth.saturating_sub(1),
            Token::Text(_) => {}
        }
        keep.push(tok.clone());
    }
    (sheet, keep)
}

/// Same-type depth counting from just after an opening tag.
fn has_matching_close(rest: &[TokenWithPos], name: &str) -> bool {
    let mut depth = 1usize;
    for tok in rest {
        match &tok.token {
            Token::Open(open) if open.name == name => depth += 1,
            Token::Close(closed) if closed == name => {
                depth -= 1;
                if depth == 0 {
                    return true;
                }
            }
            _ => {}
        }
    }
    false
}

/// Collects the stylesheet of a whole `.sdtex` source.
pub fn parse_stylesheet(src: &str) -> Result<Stylesheet, MarkupError> {
    let variables = VariableTable::parse(src)?;
    let body = variables.substitute(&strip_declarations(src));
    let tokens = Lexer::new(&body).tokenize()?;
    Ok(split_declarations(tokens).0)
}
