use std::collections::HashMap;

use crate::ast::{Content, Document, Node, TagKind};
use crate::error::{MarkupError, Origin};
use crate::lexer::{Lexer, OpenTag, Token, TokenWithPos};
use crate::stylesheet::{split_declarations, Stylesheet};
use crate::variables::{strip_declarations, VariableTable};

// ── Frame ─────────────────────────────────────────────────────────────────

/// A tag that has been opened but not yet closed.
struct Frame {
    open: OpenTag,
    origin: Origin,
    text: Vec<String>,
    children: Vec<Node>,
}

// ── Parser ────────────────────────────────────────────────────────────────

/// Builds the node tree from a token stream with an explicit stack of open
/// tags: push on `(name)`, pop on the matching `(!name)`.
pub struct Parser<'a> {
    stylesheet: &'a Stylesheet,
    stack: Vec<Frame>,
    occurrences: HashMap<String, usize>,
    roots: Vec<Node>,
}

impl<'a> Parser<'a> {
    pub fn new(stylesheet: &'a Stylesheet) -> Self {
        Self { stylesheet, stack: Vec::new(), occurrences: HashMap::new(), roots: Vec::new() }
    }

    pub fn build(mut self, tokens: Vec<TokenWithPos>) -> Result<Document, MarkupError> {
        for TokenWithPos { token, line } in tokens {
            match token {
                Token::Open(open) => self.open(open, line),
                Token::Close(name) => self.close(name, line)?,
                Token::Text(text) => self.text(text, line),
            }
        }

        if let Some(frame) = self.stack.pop() {
            return Err(MarkupError::UnclosedTag { tag: frame.open.name, origin: frame.origin });
        }
        Ok(Document::new(self.roots))
    }

    // ── token handlers ────────────────────────────────────────────────────

    fn open(&mut self, open: OpenTag, line: usize) {
        let count = self.occurrences.entry(open.name.clone()).or_insert(0);
        *count += 1;
        let origin = Origin::new(line, *count);
        self.stack.push(Frame { open, origin, text: Vec::new(), children: Vec::new() });
    }

    fn close(&mut self, name: String, line: usize) -> Result<(), MarkupError> {
        let frame = match self.stack.pop() {
            None => return Err(MarkupError::MismatchedClose { found: name, line, expected: None }),
            Some(top) if top.open.name != name => {
                return Err(MarkupError::MismatchedClose {
                    found: name,
                    line,
                    expected: Some((top.open.name, top.origin)),
                });
            }
            Some(top) => top,
        };
        let node = self.finish(frame);
        match self.stack.last_mut() {
            Some(parent) => parent.children.push(node),
            None => self.roots.push(node),
        }
        Ok(())
    }

    fn text(&mut self, text: String, line: usize) {
        match self.stack.last_mut() {
            Some(frame) => frame.text.push(text),
            None => {
                if !text.trim().is_empty() {
                    log::debug!("ignoring text outside any tag at line {line}");
                }
            }
        }
    }

    // ── node construction ─────────────────────────────────────────────────

    fn finish(&self, frame: Frame) -> Node {
        let Frame { open, origin, text, children } = frame;
        let OpenTag { name, style, attributes, src } = open;
        let kind = TagKind::from_name(&name);

        let body = text
            .iter()
            .map(|segment| segment.trim())
            .filter(|segment| !segment.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        let content = if let Some(src) = src {
            if !body.is_empty() {
                log::debug!("`{name}` at {origin}: body replaced by src, kept only as alt text");
            }
            Content::Source(src)
        } else if kind.is_attribute_driven() {
            Content::Attributes
        } else {
            Content::Text(body)
        };

        let style = self.stylesheet.resolve(&name, style.as_ref());
        Node {
            tag: name,
            content,
            style,
            attributes: attributes.unwrap_or_default(),
            children,
            origin,
        }
    }
}

// ── Public parse entry points ─────────────────────────────────────────────

/// Every intermediate stage of a parse, for callers that want more than the
/// tree.
#[derive(Debug, Clone)]
pub struct Parsed {
    pub variables: VariableTable,
    pub stylesheet: Stylesheet,
    pub document: Document,
}

/// Runs the whole pipeline: variables → stylesheet → tag tree.
pub fn parse_source(src: &str) -> Result<Parsed, MarkupError> {
    let variables = VariableTable::parse(src)?;
    let body = variables.substitute(&strip_declarations(src));
    let tokens = Lexer::new(&body).tokenize()?;
    let (stylesheet, tokens) = split_declarations(tokens);
    let document = Parser::new(&stylesheet).build(tokens)?;
    Ok(Parsed { variables, stylesheet, document })
}

/// Parses a `.sdtex` source string into a [`Document`].
pub fn parse(src: &str) -> Result<Document, MarkupError> {
    parse_source(src).map(|parsed| parsed.document)
}
