use std::fmt;

use thiserror::Error;

// ── Origin ────────────────────────────────────────────────────────────────

/// Where a tag was opened: 1-based source line plus the 1-based occurrence
/// index among all tags of the same type.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct Origin {
    pub line: usize,
    pub occurrence: usize,
}

impl Origin {
    pub fn new(line: usize, occurrence: usize) -> Self {
        Self { line, occurrence }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {} (occurrence #{})", self.line, self.occurrence)
    }
}

// ── MarkupError ───────────────────────────────────────────────────────────

/// Everything that can go wrong while turning `.sdtex` text into a
/// [`Document`](crate::Document).
///
/// Parsing fails closed: any of these aborts document construction.
#[derive(Debug, Error)]
pub enum MarkupError {
    /// The tag grammar could not be matched.
    #[error("syntax error at line {line}: {message}")]
    Syntax { line: usize, message: String },

    /// End of input reached with a tag still open.
    #[error("unclosed tag `{tag}` opened at {origin}")]
    UnclosedTag { tag: String, origin: Origin },

    /// A closing tag that does not match the innermost open tag.
    #[error("closing tag `(!{found})` at line {line} does not match {}", describe_open(.expected))]
    MismatchedClose {
        found: String,
        line: usize,
        expected: Option<(String, Origin)>,
    },

    /// A tag type required by a lookup is absent.
    #[error("no entry for tag `{tag}`")]
    TagNotFound { tag: String },

    /// A variable declaration that starts but cannot be read.
    #[error("variable `{name}` at line {line}: {message}")]
    Variable { name: String, line: usize, message: String },

    /// A `style={...}` clause that cannot be skipped safely.
    #[error("style clause of `{tag}` at line {line}: {message}")]
    Style { tag: String, line: usize, message: String },

    /// An `attributes={...}` clause that cannot be skipped safely.
    #[error("attributes clause of `{tag}` at line {line}: {message}")]
    Attribute { tag: String, line: usize, message: String },

    /// A `src="..."` clause that is present but unusable.
    #[error("src clause of `{tag}` at line {line}: {message}")]
    SourceReference { tag: String, line: usize, message: String },

    /// Unexpected failure inside the pipeline; keeps the original cause.
    #[error("{context}")]
    Processing {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

fn describe_open(expected: &Option<(String, Origin)>) -> String {
    match expected {
        Some((tag, origin)) => format!("open tag `{tag}` from {origin}"),
        None => "any open tag".to_string(),
    }
}

impl MarkupError {
    pub(crate) fn syntax(line: usize, message: impl Into<String>) -> Self {
        Self::Syntax { line, message: message.into() }
    }

    /// Wrap an unexpected failure, keeping it as the error source.
    pub fn processing(
        context: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Processing { context: context.into(), source: source.into() }
    }

    /// The tag type this error is about, when there is one.
    pub fn tag(&self) -> Option<&str> {
        match self {
            Self::UnclosedTag { tag, .. }
            | Self::TagNotFound { tag }
            | Self::Style { tag, .. }
            | Self::Attribute { tag, .. }
            | Self::SourceReference { tag, .. } => Some(tag),
            Self::MismatchedClose { found, .. } => Some(found),
            Self::Syntax { .. } | Self::Variable { .. } | Self::Processing { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unclosed_message_names_tag_and_origin() {
        let err = MarkupError::UnclosedTag { tag: "sdtitle".into(), origin: Origin::new(3, 1) };
        assert_eq!(err.to_string(), "unclosed tag `sdtitle` opened at line 3 (occurrence #1)");
        assert_eq!(err.tag(), Some("sdtitle"));
    }

    #[test]
    fn mismatched_message_without_open_tag() {
        let err = MarkupError::MismatchedClose { found: "a".into(), line: 2, expected: None };
        assert_eq!(err.to_string(), "closing tag `(!a)` at line 2 does not match any open tag");
    }

    #[test]
    fn processing_keeps_source() {
        let io = std::io::Error::other("disk gone");
        let err = MarkupError::processing("reading input", io);
        let source = std::error::Error::source(&err).map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("disk gone"));
    }
}
