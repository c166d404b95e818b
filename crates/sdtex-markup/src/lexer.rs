use crate::error::MarkupError;
use crate::props::{is_comment_line, is_escape, parse_pairs, AttributeMap, StyleMap};

// ── Token ─────────────────────────────────────────────────────────────────

/// The clauses of an opening tag, in their fixed order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OpenTag {
    pub name: String,
    pub style: Option<StyleMap>,
    pub attributes: Option<AttributeMap>,
    pub src: Option<String>,
}

impl OpenTag {
    /// `(type style={...})` with nothing else: the shape of a stylesheet entry.
    pub fn is_style_only(&self) -> bool {
        self.style.is_some() && self.attributes.is_none() && self.src.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// `(name [style={..}] [attributes={..}] [src=".."])`
    Open(OpenTag),
    /// `(!name)`
    Close(String),
    /// Everything between tags, verbatim.
    Text(String),
}

/// A token plus the 1-based line it starts on.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenWithPos {
    pub token: Token,
    pub line: usize,
}

// ── Lexer ─────────────────────────────────────────────────────────────────

/// Splits `.sdtex` source into tags and text.
///
/// A `(` only starts a tag when it reads as one: `(name)`, `(!name)`, or
/// `(name` followed by whitespace and a `style=` / `attributes=` / `src=`
/// clause. Any other parenthesis is ordinary text.
pub struct Lexer<'s> {
    src: &'s str,
    pos: usize,
    line: usize,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Clause {
    Style = 1,
    Attributes = 2,
    Src = 3,
}

impl Clause {
    fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "style"      => Some(Self::Style),
            "attributes" => Some(Self::Attributes),
            "src"        => Some(Self::Src),
            _            => None,
        }
    }

    fn keyword(self) -> &'static str {
        match self {
            Self::Style      => "style",
            Self::Attributes => "attributes",
            Self::Src        => "src",
        }
    }
}

impl<'s> Lexer<'s> {
    pub fn new(src: &'s str) -> Self {
        Self { src, pos: 0, line: 1 }
    }

    pub fn tokenize(mut self) -> Result<Vec<TokenWithPos>, MarkupError> {
        let mut tokens = Vec::new();
        let mut text = String::new();
        let mut text_line = self.line;

        while let Some(ch) = self.peek() {
            if ch == '(' {
                let line = self.line;
                if let Some(token) = self.try_tag()? {
                    if !text.is_empty() {
                        tokens.push(TokenWithPos { token: Token::Text(std::mem::take(&mut text)), line: text_line });
                    }
                    tokens.push(TokenWithPos { token, line });
                    text_line = self.line;
                    continue;
                }
            }
            if text.is_empty() {
                text_line = self.line;
            }
            text.push(ch);
            self.advance();
        }
        if !text.is_empty() {
            tokens.push(TokenWithPos { token: Token::Text(text), line: text_line });
        }
        Ok(tokens)
    }

    // ── cursor ────────────────────────────────────────────────────────────

    fn rest(&self) -> &'s str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
        }
        Some(ch)
    }

    fn advance_by(&mut self, bytes: usize) {
        let end = self.pos + bytes;
        while self.pos < end && self.advance().is_some() {}
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.advance();
        }
    }

    fn take_name(&mut self) -> &'s str {
        let rest = self.rest();
        let len = name_len(rest);
        self.advance_by(len);
        &rest[..len]
    }

    // ── tags ──────────────────────────────────────────────────────────────

    /// Called with the cursor on `(`. Returns `None` (cursor untouched) when
    /// the parenthesis is plain text.
    fn try_tag(&mut self) -> Result<Option<Token>, MarkupError> {
        let after = &self.rest()[1..];

        if let Some(closing) = after.strip_prefix('!') {
            let len = name_len(closing);
            if len == 0 || !closing[len..].starts_with(')') {
                return Ok(None);
            }
            let name = closing[..len].to_string();
            self.advance_by(len + 3);
            return Ok(Some(Token::Close(name)));
        }

        let len = name_len(after);
        if len == 0 {
            return Ok(None);
        }
        let tail = &after[len..];
        if tail.starts_with(')') {
            let name = after[..len].to_string();
            self.advance_by(len + 2);
            return Ok(Some(Token::Open(OpenTag { name, ..OpenTag::default() })));
        }
        if !starts_with_clause(tail) {
            return Ok(None);
        }

        self.advance(); // `(`
        let name = self.take_name().to_string();
        self.lex_clauses(name).map(|open| Some(Token::Open(open)))
    }

    /// Reads `style=`, `attributes=` and `src=` clauses up to the closing `)`.
    fn lex_clauses(&mut self, name: String) -> Result<OpenTag, MarkupError> {
        let mut open = OpenTag { name, ..OpenTag::default() };
        let mut last: Option<Clause> = None;

        loop {
            self.skip_whitespace();
            match self.peek() {
                None => {
                    return Err(MarkupError::syntax(
                        self.line,
                        format!("opening tag `({}` is never closed with ')'", open.name),
                    ));
                }
                Some(')') => {
                    self.advance();
                    return Ok(open);
                }
                Some(_) => {}
            }

            let line = self.line;
            let word = self.take_name();
            let Some(clause) = Clause::from_keyword(word) else {
                let shown = if word.is_empty() { self.peek().map(String::from).unwrap_or_default() } else { word.to_string() };
                return Err(MarkupError::syntax(
                    line,
                    format!("unexpected `{shown}` in opening tag `({}`", open.name),
                ));
            };
            if last.is_some_and(|prev| clause <= prev) {
                return Err(MarkupError::syntax(
                    line,
                    format!(
                        "`{}` clause out of order in `({}`; clauses go style, attributes, src",
                        clause.keyword(),
                        open.name
                    ),
                ));
            }
            last = Some(clause);

            self.skip_whitespace();
            if self.peek() != Some('=') {
                return Err(MarkupError::syntax(line, format!("expected '=' after `{}`", clause.keyword())));
            }
            self.advance();
            self.skip_whitespace();

            match clause {
                Clause::Style => {
                    let block = self.lex_block(&open.name, clause)?;
                    open.style = Some(parse_pairs(block, &format!("style of `{}`", open.name)));
                }
                Clause::Attributes => {
                    let block = self.lex_block(&open.name, clause)?;
                    open.attributes = Some(parse_pairs(block, &format!("attributes of `{}`", open.name)));
                }
                Clause::Src => open.src = Some(self.lex_src(&open.name)?),
            }
        }
    }

    /// Reads `{ ... }` and returns the inside. Braces inside quotes or `//`
    /// comment lines do not count.
    fn lex_block(&mut self, tag: &str, clause: Clause) -> Result<&'s str, MarkupError> {
        let line = self.line;
        let fail = |message: &str| {
            let (tag, message) = (tag.to_string(), message.to_string());
            match clause {
                Clause::Attributes => MarkupError::Attribute { tag, line, message },
                _ => MarkupError::Style { tag, line, message },
            }
        };

        if self.peek() != Some('{') {
            return Err(MarkupError::syntax(line, format!("expected '{{' after `{}=`", clause.keyword())));
        }
        self.advance();
        let src = self.src;
        let start = self.pos;
        let mut in_quotes = false;
        let mut line_start = start;

        loop {
            let Some(ch) = self.peek() else {
                let message = if in_quotes { "unterminated quoted value" } else { "missing closing '}'" };
                return Err(fail(message));
            };
            if !in_quotes && is_comment_line(&src[line_start..]) && src[line_start..self.pos].trim().is_empty() {
                while !matches!(self.peek(), None | Some('\n')) {
                    self.advance();
                }
                continue;
            }
            match ch {
                '\\' if in_quotes && is_escape(self.rest()) => {
                    self.advance();
                }
                '"' => in_quotes = !in_quotes,
                '\n' if in_quotes => return Err(fail("unterminated quoted value")),
                '}' if !in_quotes => {
                    let inner = &src[start..self.pos];
                    self.advance();
                    return Ok(inner);
                }
                _ => {}
            }
            self.advance();
            if ch == '\n' {
                line_start = self.pos;
            }
        }
    }

    fn lex_src(&mut self, tag: &str) -> Result<String, MarkupError> {
        let line = self.line;
        if self.peek() != Some('"') {
            return Err(MarkupError::syntax(line, "expected '\"' after `src=`"));
        }
        self.advance();
        let rest = self.rest();
        let Some(end) = rest.find(|c: char| c == '"' || c == '\n') else {
            return Err(MarkupError::SourceReference {
                tag: tag.to_string(),
                line,
                message: "unterminated src value".to_string(),
            });
        };
        if !rest[end..].starts_with('"') {
            return Err(MarkupError::SourceReference {
                tag: tag.to_string(),
                line,
                message: "unterminated src value".to_string(),
            });
        }
        let value = rest[..end].trim().to_string();
        self.advance_by(end + 1);
        if value.is_empty() {
            return Err(MarkupError::SourceReference {
                tag: tag.to_string(),
                line,
                message: "src is empty".to_string(),
            });
        }
        Ok(value)
    }
}

/// Length of the tag name or keyword at the start of `s`; names start with
/// a letter.
fn name_len(s: &str) -> usize {
    if !s.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return 0;
    }
    s.find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '-')).unwrap_or(s.len())
}

/// Does `tail` (text right after a tag name) open a clause?
fn starts_with_clause(tail: &str) -> bool {
    if !tail.starts_with(char::is_whitespace) {
        return false;
    }
    let tail = tail.trim_start();
    let len = name_len(tail);
    Clause::from_keyword(&tail[..len]).is_some() && tail[len..].trim_start().starts_with('=')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(src: &str) -> Vec<Token> {
        Lexer::new(src).tokenize().unwrap().into_iter().map(|t| t.token).collect()
    }

    fn open(name: &str) -> Token {
        Token::Open(OpenTag { name: name.into(), ..OpenTag::default() })
    }

    // ── plain tags ────────────────────────────────────────────────────────

    #[test]
    fn open_text_close() {
        assert_eq!(
            lex("(sdtitle)Hello(!sdtitle)"),
            vec![open("sdtitle"), Token::Text("Hello".into()), Token::Close("sdtitle".into())]
        );
    }

    #[test]
    fn prose_parentheses_are_text() {
        assert_eq!(lex("see (the notes above) here"), vec![Token::Text("see (the notes above) here".into())]);
        assert_eq!(lex("( spaced)"), vec![Token::Text("( spaced)".into())]);
        assert_eq!(lex("(!not closed"), vec![Token::Text("(!not closed".into())]);
    }

    #[test]
    fn numbered_parentheses_are_text() {
        assert_eq!(lex("step (2) of (10)"), vec![Token::Text("step (2) of (10)".into())]);
        assert_eq!(lex("(!3)"), vec![Token::Text("(!3)".into())]);
        assert_eq!(lex("(_x)"), vec![Token::Text("(_x)".into())]);
    }

    #[test]
    fn lines_are_tracked() {
        let toks = Lexer::new("\n\n(sdtext)\nx\n(!sdtext)").tokenize().unwrap();
        let lines: Vec<usize> = toks.iter().map(|t| t.line).collect();
        assert_eq!(lines, vec![1, 3, 3, 5]);
    }

    // ── clauses ───────────────────────────────────────────────────────────

    #[test]
    fn all_clauses_in_order() {
        let toks = lex(r#"(sdimage style={width: 50%} attributes={alt: cat} src="https://e.x/cat.png")(!sdimage)"#);
        let Token::Open(tag) = &toks[0] else { panic!("expected open tag") };
        assert_eq!(tag.style.as_ref().and_then(|s| s.get("width")), Some("50%"));
        assert_eq!(tag.attributes.as_ref().and_then(|a| a.get("alt")), Some("cat"));
        assert_eq!(tag.src.as_deref(), Some("https://e.x/cat.png"));
    }

    #[test]
    fn clause_block_may_span_lines_with_comments() {
        let src = "(sdgraph attributes={\n  // plotted curve }\n  function: \"x^2\",\n  quality: 50\n})(!sdgraph)";
        let toks = lex(src);
        let Token::Open(tag) = &toks[0] else { panic!("expected open tag") };
        let attrs = tag.attributes.as_ref().unwrap();
        assert_eq!(attrs.get("function"), Some("x^2"));
        assert_eq!(attrs.get("quality"), Some("50"));
        assert_eq!(toks[1], Token::Close("sdgraph".into()));
    }

    #[test]
    fn escaped_quote_does_not_end_block_value() {
        let toks = lex(r#"(sdtext attributes={note: "a \"}\" b"})x(!sdtext)"#);
        let Token::Open(tag) = &toks[0] else { panic!("expected open tag") };
        assert_eq!(tag.attributes.as_ref().and_then(|a| a.get("note")), Some(r#"a "}" b"#));
        assert_eq!(toks[1], Token::Text("x".into()));
    }

    #[test]
    fn out_of_order_clause_is_syntax_error() {
        let err = Lexer::new(r#"(sdimage src="a.png" style={})"#).tokenize().unwrap_err();
        assert!(matches!(err, MarkupError::Syntax { .. }));
    }

    #[test]
    fn repeated_clause_is_syntax_error() {
        let err = Lexer::new("(sdtext style={} style={})").tokenize().unwrap_err();
        assert!(matches!(err, MarkupError::Syntax { .. }));
    }

    #[test]
    fn unknown_clause_after_valid_one_is_syntax_error() {
        let err = Lexer::new("(sdtext style={} colour={})").tokenize().unwrap_err();
        assert!(matches!(err, MarkupError::Syntax { .. }));
    }

    #[test]
    fn unterminated_style_block() {
        let err = Lexer::new("(sdtext style={color: red").tokenize().unwrap_err();
        assert!(matches!(err, MarkupError::Style { ref tag, .. } if tag == "sdtext"));
    }

    #[test]
    fn unterminated_quote_in_attributes() {
        let err = Lexer::new("(sdgraph attributes={function: \"sin(x)})\n(!sdgraph)").tokenize().unwrap_err();
        assert!(matches!(err, MarkupError::Attribute { ref tag, .. } if tag == "sdgraph"));
    }

    #[test]
    fn empty_src_is_source_reference_error() {
        let err = Lexer::new(r#"(sdimage src="")(!sdimage)"#).tokenize().unwrap_err();
        assert!(matches!(err, MarkupError::SourceReference { .. }));
    }
}
