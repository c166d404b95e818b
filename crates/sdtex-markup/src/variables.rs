//! `name: "value"` declarations and `$name` substitution.
//!
//! Declarations are collected over the whole source before any substitution
//! happens, so a reference may appear textually before its declaration.

use std::collections::HashMap;

use crate::error::MarkupError;
use crate::props::{is_comment_line, is_escape};

// ── VariableTable ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableTable {
    values: HashMap<String, String>,
}

impl VariableTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collects every declaration in `src`.
    ///
    /// Redefinition overwrites silently. A line that opens a declaration but
    /// never closes its quote is an error.
    pub fn parse(src: &str) -> Result<Self, MarkupError> {
        let mut table = Self::new();
        for line in scan(src) {
            if let Some(decl) = line.declaration {
                let (name, value) = decl?;
                if let Some(previous) = table.insert(name, value) {
                    log::debug!("variable `{name}` redefined at line {} (was {previous:?})", line.number);
                }
            }
        }
        Ok(table)
    }

    /// Inserts or overwrites, returning the previous value.
    pub fn insert(&mut self, name: &str, value: &str) -> Option<String> {
        self.values.insert(name.to_string(), value.to_string())
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Replaces every `$identifier` with its value.
    ///
    /// Unknown references are left exactly as written.
    pub fn substitute(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(at) = rest.find('$') {
            out.push_str(&rest[..at]);
            let after = &rest[at + 1..];
            let len = after.find(|c: char| !is_ident_char(c)).unwrap_or(after.len());
            let name = &after[..len];
            match self.get(name) {
                Some(value) if !name.is_empty() => out.push_str(value),
                _ => {
                    if !name.is_empty() {
                        log::debug!("unresolved reference `${name}` left as-is");
                    }
                    out.push('$');
                    out.push_str(name);
                }
            }
            rest = &after[len..];
        }
        out.push_str(rest);
        out
    }
}

/// Free-function form of [`VariableTable::substitute`].
pub fn substitute(text: &str, table: &VariableTable) -> String {
    table.substitute(text)
}

/// Blanks out declaration lines, keeping line numbering intact.
///
/// Lines that look like a broken declaration are left alone; call
/// [`VariableTable::parse`] first to surface those.
pub fn strip_declarations(src: &str) -> String {
    scan(src)
        .map(|line| if matches!(line.declaration, Some(Ok(_))) { "" } else { line.text })
        .collect::<Vec<_>>()
        .join("\n")
}

// ── line scanner ──────────────────────────────────────────────────────────

type Declaration<'s> = Result<(&'s str, &'s str), MarkupError>;

struct Line<'s> {
    number: usize,
    text: &'s str,
    declaration: Option<Declaration<'s>>,
}

/// Walks `src` line by line, tracking whether a `style=` / `attributes=`
/// block is open so pairs written one per line are never read as
/// declarations. Braces in tag bodies (code samples, prose) do not count.
fn scan(src: &str) -> impl Iterator<Item = Line<'_>> {
    let mut in_block = false;
    src.split('\n').enumerate().map(move |(i, text)| {
        let number = i + 1;
        let declaration = if in_block { None } else { declaration(text, number) };
        in_block = block_open_after(text, in_block);
        Line { number, text, declaration }
    })
}

fn declaration(line: &str, number: usize) -> Option<Declaration<'_>> {
    let trimmed = line.trim();
    let name_len = trimmed.find(|c: char| !is_ident_char(c)).unwrap_or(trimmed.len());
    if name_len == 0 {
        return None;
    }
    let name = &trimmed[..name_len];
    let rest = trimmed[name_len..].strip_prefix(':')?.trim_start();
    let quoted = rest.strip_prefix('"')?;
    let Some(end) = quoted.find('"') else {
        return Some(Err(MarkupError::Variable {
            name: name.to_string(),
            line: number,
            message: "missing closing quote".to_string(),
        }));
    };
    // Anything after the closing quote means this is prose, not a declaration.
    if !quoted[end + 1..].trim().is_empty() {
        return None;
    }
    Some(Ok((name, &quoted[..end])))
}

/// Mirrors the lexer: a clause block ends at the first unquoted `}`, and
/// `//` comment lines inside it are skipped whole.
fn block_open_after(line: &str, mut in_block: bool) -> bool {
    if in_block && is_comment_line(line) {
        return true;
    }
    let mut in_quotes = false;
    let mut escaped = false;
    for (at, ch) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_block && in_quotes && is_escape(&line[at..]) => escaped = true,
            '"' if in_block => in_quotes = !in_quotes,
            '{' if !in_block && opens_clause(&line[..at]) => {
                in_block = true;
                in_quotes = false;
            }
            '}' if in_block && !in_quotes => in_block = false,
            _ => {}
        }
    }
    in_block
}

/// Does `before` end with `style =` or `attributes =`?
fn opens_clause(before: &str) -> bool {
    let Some(head) = before.trim_end().strip_suffix('=') else {
        return false;
    };
    let head = head.trim_end();
    ["style", "attributes"]
        .iter()
        .any(|keyword| head.strip_suffix(*keyword).is_some_and(|lead| !lead.ends_with(is_ident_char)))
}

#[inline]
fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_declared_variable() {
        let table = VariableTable::parse("name: \"World\"\n(sdtext)Hello $name(!sdtext)").unwrap();
        assert_eq!(table.substitute("Hello $name"), "Hello World");
    }

    #[test]
    fn unresolved_reference_is_left_verbatim() {
        let table = VariableTable::parse("name: \"World\"").unwrap();
        assert_eq!(table.substitute("Hi $missing and $name"), "Hi $missing and World");
    }

    #[test]
    fn use_before_declaration() {
        let src = "(sdtext)$greeting(!sdtext)\ngreeting: \"hey\"";
        let table = VariableTable::parse(src).unwrap();
        assert_eq!(table.substitute(src), "(sdtext)hey(!sdtext)\ngreeting: \"hey\"");
    }

    #[test]
    fn redefinition_overwrites() {
        let table = VariableTable::parse("a: \"1\"\na: \"2\"").unwrap();
        assert_eq!(table.get("a"), Some("2"));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn lone_dollar_is_literal() {
        let table = VariableTable::new();
        assert_eq!(table.substitute("costs $ 5 or $"), "costs $ 5 or $");
    }

    #[test]
    fn longest_identifier_wins() {
        let mut table = VariableTable::new();
        table.insert("a", "short");
        table.insert("ab", "long");
        assert_eq!(table.substitute("$ab $a!"), "long short!");
    }

    #[test]
    fn unterminated_declaration_is_reported() {
        let err = VariableTable::parse("ok: \"fine\"\nbroken: \"oops").unwrap_err();
        assert!(matches!(err, MarkupError::Variable { ref name, line: 2, .. } if name == "broken"));
    }

    #[test]
    fn prose_with_quotes_is_not_a_declaration() {
        let table = VariableTable::parse("Note: \"this\" is prose").unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn pairs_inside_braces_are_not_declarations() {
        let src = "(sdlink style={\n  href: \"https://x.y\"\n})go(!sdlink)";
        let table = VariableTable::parse(src).unwrap();
        assert!(table.is_empty());
        assert_eq!(strip_declarations(src), src);
    }

    #[test]
    fn unbalanced_brace_in_body_does_not_hide_declarations() {
        let src = "(sdcode)int main() {(!sdcode)\nname: \"World\"\n(sdtext)Hello $name(!sdtext)";
        let table = VariableTable::parse(src).unwrap();
        assert_eq!(table.get("name"), Some("World"));
        assert_eq!(strip_declarations(src).split('\n').nth(1), Some(""));
    }

    #[test]
    fn comment_line_brace_does_not_close_block() {
        let src = "(sdgraph attributes={\n  // } not the end\n  function: \"x\"\n})(!sdgraph)\nv: \"1\"";
        let table = VariableTable::parse(src).unwrap();
        assert_eq!(table.get("function"), None);
        assert_eq!(table.get("v"), Some("1"));
    }

    #[test]
    fn strip_keeps_line_count() {
        let src = "a: \"1\"\n(sdtext)x(!sdtext)\nb: \"2\"";
        let stripped = strip_declarations(src);
        assert_eq!(stripped, "\n(sdtext)x(!sdtext)\n");
        assert_eq!(stripped.split('\n').count(), 3);
    }
}
