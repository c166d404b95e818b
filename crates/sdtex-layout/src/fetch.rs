//! Image sources for `sdimage` blocks.

use std::path::{Path, PathBuf};

use crate::error::CollaboratorError;

/// A drawable image on local disk.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageAsset {
    pub path: PathBuf,
    /// Width divided by height; always positive.
    pub aspect_ratio: f32,
}

impl ImageAsset {
    /// Reads the pixel size of the file at `path`.
    pub fn probe(path: impl Into<PathBuf>) -> Result<Self, CollaboratorError> {
        let path = path.into();
        let (w, h) = image::image_dimensions(&path)
            .map_err(|e| CollaboratorError::Decode { path: path.clone(), message: e.to_string() })?;
        if w == 0 || h == 0 {
            return Err(CollaboratorError::Decode { path, message: "image has no pixels".into() });
        }
        Ok(Self { path, aspect_ratio: w as f32 / h as f32 })
    }
}

/// Resolves the `src` of an image tag to a local, decodable file.
pub trait ImageFetcher {
    fn fetch(&self, src: &str) -> Result<ImageAsset, CollaboratorError>;
}

// ── LocalImageFetcher ─────────────────────────────────────────────────────

/// Resolves relative paths against the document's directory. `file://`
/// URLs are accepted; network schemes are refused.
#[derive(Debug, Clone, Default)]
pub struct LocalImageFetcher {
    base_dir: PathBuf,
}

impl LocalImageFetcher {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self { base_dir: base_dir.into() }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn resolve(&self, src: &str) -> Result<PathBuf, CollaboratorError> {
        let src = src.trim();
        if let Some((scheme, _)) = src.split_once("://") {
            if scheme != "file" {
                return Err(CollaboratorError::UnsupportedScheme { url: src.to_string() });
            }
        }
        let path = Path::new(src.strip_prefix("file://").unwrap_or(src));
        Ok(if path.is_absolute() { path.to_path_buf() } else { self.base_dir.join(path) })
    }
}

impl ImageFetcher for LocalImageFetcher {
    fn fetch(&self, src: &str) -> Result<ImageAsset, CollaboratorError> {
        let path = self.resolve(src)?;
        if !path.is_file() {
            return Err(CollaboratorError::NotFound { path });
        }
        let asset = ImageAsset::probe(path)?;
        log::debug!("image {} ({:.3}:1)", asset.path.display(), asset.aspect_ratio);
        Ok(asset)
    }
}
