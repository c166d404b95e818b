//! `key: value` pair blocks shared by `style={...}` and `attributes={...}`.
//!
//! Values stay raw strings here. Numeric and color interpretation happens in
//! the layout crate, which knows what each key means.

use std::borrow::Cow;
use std::collections::BTreeMap;

// ── PropMap ───────────────────────────────────────────────────────────────

/// Ordered `key → raw value` map.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PropMap(BTreeMap<String, String>);

/// Presentation keys (`color`, `size`, ...).
pub type StyleMap = PropMap;

/// Content parameters (`function`, `first_point`, ...).
pub type AttributeMap = PropMap;

impl PropMap {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    #[inline]
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Inserts or overwrites a key, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Copies every key of `fallback` that `self` does not define yet.
    pub fn fill_from(&mut self, fallback: &PropMap) {
        for (k, v) in &fallback.0 {
            self.0.entry(k.clone()).or_insert_with(|| v.clone());
        }
    }

    /// Overwrites `self` with every key of `other`.
    pub fn extend_from(&mut self, other: &PropMap) {
        for (k, v) in &other.0 {
            self.0.insert(k.clone(), v.clone());
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PropMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

// ── parse_pairs ───────────────────────────────────────────────────────────

/// Parses the inside of a `{...}` block.
///
/// Rules:
/// - lines whose first non-blank characters are `//` are dropped
/// - pairs are separated by `,` or newlines outside double quotes
/// - each pair splits on its first `:`; `"quoted"` values lose their quotes
/// - inside quotes, `\"` and `\\` stand for `"` and `\`
/// - a pair with no colon or an empty key is skipped with a warning
///
/// `owner` only feeds the warning text (e.g. `"style of sdtitle"`).
pub fn parse_pairs(block: &str, owner: &str) -> PropMap {
    let mut map = PropMap::new();
    for item in split_items(&strip_comment_lines(block)) {
        let item = item.trim();
        if item.is_empty() {
            continue;
        }
        let Some((key, value)) = item.split_once(':') else {
            log::warn!("{owner}: skipping `{item}` (missing ':')");
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            log::warn!("{owner}: skipping `{item}` (empty key)");
            continue;
        }
        map.insert(key, unquote(value.trim()));
    }
    map
}

/// Returns `true` for a line that is a `//` comment inside a pair block.
pub(crate) fn is_comment_line(line: &str) -> bool {
    line.trim_start().starts_with("//")
}

fn strip_comment_lines(block: &str) -> String {
    block
        .split('\n')
        .filter(|line| !is_comment_line(line))
        .collect::<Vec<_>>()
        .join("\n")
}

fn split_items(block: &str) -> Vec<&str> {
    let mut items = Vec::new();
    let mut in_quotes = false;
    let mut escaped = false;
    let mut start = 0;
    for (i, ch) in block.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_quotes && is_escape(&block[i..]) => escaped = true,
            '"' => in_quotes = !in_quotes,
            ',' | '\n' if !in_quotes => {
                items.push(&block[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    items.push(&block[start..]);
    items
}

/// `rest` starts with a backslash that escapes a quote or another backslash.
pub(crate) fn is_escape(rest: &str) -> bool {
    rest.starts_with("\\\"") || rest.starts_with("\\\\")
}

/// Writes `value` as a quoted pair value that [`parse_pairs`] reads back
/// unchanged.
pub(crate) fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

fn unquote(value: &str) -> Cow<'_, str> {
    let Some(inner) = value.strip_prefix('"').and_then(|v| v.strip_suffix('"')) else {
        return Cow::Borrowed(value);
    };
    if !inner.contains('\\') {
        return Cow::Borrowed(inner);
    }
    let mut out = String::with_capacity(inner.len());
    let mut rest = inner;
    while let Some(ch) = rest.chars().next() {
        if is_escape(rest) {
            out.push_str(&rest[1..2]);
            rest = &rest[2..];
        } else {
            out.push(ch);
            rest = &rest[ch.len_utf8()..];
        }
    }
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(src: &str) -> Vec<(String, String)> {
        parse_pairs(src, "test").iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn simple_pairs() {
        let map = parse_pairs("color: #ff0000, size: 12dp", "test");
        assert_eq!(map.get("color"), Some("#ff0000"));
        assert_eq!(map.get("size"), Some("12dp"));
    }

    #[test]
    fn quoted_value_keeps_colons_and_commas() {
        let map = parse_pairs(r#"url: "https://example.com/a,b", alt: plain"#, "test");
        assert_eq!(map.get("url"), Some("https://example.com/a,b"));
        assert_eq!(map.get("alt"), Some("plain"));
    }

    #[test]
    fn escaped_quotes_stay_inside_the_value() {
        let map = parse_pairs(r#"note: "say \"hi\", then go", path: "C:\\tmp\x", n: 1"#, "test");
        assert_eq!(map.get("note"), Some(r#"say "hi", then go"#));
        assert_eq!(map.get("path"), Some(r"C:\tmp\x"));
        assert_eq!(map.get("n"), Some("1"));
    }

    #[test]
    fn quote_is_read_back_unchanged() {
        let value = r#"a "b" \ c\"#;
        let map = parse_pairs(&format!("k: {}", quote(value)), "test");
        assert_eq!(map.get("k"), Some(value));
    }

    #[test]
    fn unquoted_value_splits_on_first_colon_only() {
        let map = parse_pairs("time: 12:30", "test");
        assert_eq!(map.get("time"), Some("12:30"));
    }

    #[test]
    fn comment_lines_are_ignored() {
        let src = "\n  // the graph to draw\n  function: \"sin(x)\",\n  // first_point: 3\n  last_point: 6\n";
        assert_eq!(
            pairs(src),
            vec![("function".into(), "sin(x)".into()), ("last_point".into(), "6".into())]
        );
    }

    #[test]
    fn malformed_pairs_are_skipped() {
        let map = parse_pairs("bold, : 3, color: red", "test");
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("color"), Some("red"));
    }

    #[test]
    fn newlines_separate_pairs() {
        let map = parse_pairs("a: 1\nb: 2", "test");
        assert_eq!(map.get("a"), Some("1"));
        assert_eq!(map.get("b"), Some("2"));
    }

    #[test]
    fn fill_from_keeps_existing_keys() {
        let mut inline: PropMap = [("color", "#111111")].into_iter().collect();
        let default: PropMap = [("color", "#000000"), ("size", "14dp")].into_iter().collect();
        inline.fill_from(&default);
        assert_eq!(inline.get("color"), Some("#111111"));
        assert_eq!(inline.get("size"), Some("14dp"));
    }
}
