use std::path::PathBuf;

use sdtex_markup::{MarkupError, Origin};
use thiserror::Error;

/// Why a collaborator (image fetcher, graph renderer) could not produce an
/// asset. Layout logs these and skips the block.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("unsupported source `{url}`: only local files can be fetched")]
    UnsupportedScheme { url: String },

    #[error("image not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("cannot decode image {}: {message}", path.display())]
    Decode { path: PathBuf, message: String },

    #[error("cannot write image {}: {message}", path.display())]
    Encode { path: PathBuf, message: String },

    #[error("missing attribute `{name}`")]
    MissingAttribute { name: &'static str },

    #[error("invalid value `{value}` for attribute `{name}`: {message}")]
    InvalidAttribute { name: &'static str, value: String, message: String },

    #[error("cannot evaluate `{expr}`: {message}")]
    Expression { expr: String, message: String },

    #[error("i/o error on {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors surfaced by layout and rendering.
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error(transparent)]
    Markup(#[from] MarkupError),

    #[error("`{tag}` at {origin}: {source}")]
    Collaborator {
        tag: String,
        origin: Origin,
        #[source]
        source: CollaboratorError,
    },

    #[error("page {page} was drawn to before it was started")]
    PageNotStarted { page: usize },

    #[error("{stage} failed")]
    Processing {
        stage: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl LayoutError {
    pub fn processing(
        stage: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Processing { stage: stage.into(), source: source.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn collaborator_message_names_tag_and_origin() {
        let err = LayoutError::Collaborator {
            tag: "sdimage".into(),
            origin: Origin::new(4, 2),
            source: CollaboratorError::NotFound { path: "cat.png".into() },
        };
        let msg = err.to_string();
        assert!(msg.contains("sdimage"), "{msg}");
        assert!(msg.contains("line 4"), "{msg}");
        assert!(err.source().is_some());
    }

    #[test]
    fn markup_errors_pass_through() {
        let markup = sdtex_markup::parse("(sdtitle)Hello").unwrap_err();
        let text = markup.to_string();
        let err: LayoutError = markup.into();
        assert_eq!(err.to_string(), text);
    }

    #[test]
    fn processing_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        let err = LayoutError::processing("page export", io);
        assert_eq!(err.to_string(), "page export failed");
        assert_eq!(err.source().unwrap().to_string(), "disk full");
    }
}
