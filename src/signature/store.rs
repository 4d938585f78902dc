//! Saved-signature directory handling.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use super::SignatureCanvas;

pub const SIGNATURES_DIR: &str = "signatures";
pub const SIGNATURE_FILE_PREFIX: &str = "signature_";
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("signature directory error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode signature image: {0}")]
    Image(#[from] image::ImageError),
}

/// Signature directory, created on first save.
#[derive(Debug, Clone)]
pub struct SignatureStore {
    root: PathBuf,
    dir: PathBuf,
}

impl SignatureStore {
    /// Store rooted at a base dir; signatures land in `<root>/signatures`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let dir = root.join(SIGNATURES_DIR);
        Self { root, dir }
    }

    /// Store whose signatures directory is exactly `dir`.
    pub fn at_dir(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let root = dir
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| dir.clone());
        Self { root, dir }
    }

    pub fn signatures_dir(&self) -> PathBuf {
        self.dir.clone()
    }

    /// Where a file chooser should start: the signatures directory, or the
    /// base dir before anything has been saved.
    pub fn browse_dir(&self) -> PathBuf {
        if self.dir.is_dir() {
            self.dir.clone()
        } else {
            self.root.clone()
        }
    }

    /// Persists the canvas as `signature_<timestamp>.png` and returns the
    /// path. Second-resolution timestamps; a same-second save overwrites.
    pub fn save_canvas(&self, canvas: &SignatureCanvas) -> StoreResult<PathBuf> {
        let dir = self.signatures_dir();
        fs::create_dir_all(&dir)?;

        let stamp = chrono::Local::now().format(TIMESTAMP_FORMAT);
        let path = dir.join(format!("{SIGNATURE_FILE_PREFIX}{stamp}.png"));
        canvas.image().save(&path)?;
        info!(path = %path.display(), "signature saved");
        Ok(path)
    }
}

/// Accepts the image formats the stamping path can decode.
pub fn is_supported_image(path: &Path) -> bool {
    path.extension().is_some_and(|ext| {
        ext.eq_ignore_ascii_case("png")
            || ext.eq_ignore_ascii_case("jpg")
            || ext.eq_ignore_ascii_case("jpeg")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::PixelPoint;

    #[test]
    fn save_creates_the_directory_and_a_png() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = SignatureStore::new(dir.path());

        let mut canvas = SignatureCanvas::new(100, 40);
        canvas.begin_stroke(PixelPoint::new(10, 20));
        canvas.extend_stroke(PixelPoint::new(80, 20));
        canvas.end_stroke();

        let path = store.save_canvas(&canvas).expect("save succeeds");
        assert!(path.exists());
        assert!(path.starts_with(store.signatures_dir()));
        let name = path.file_name().expect("file name").to_string_lossy();
        assert!(name.starts_with(SIGNATURE_FILE_PREFIX));
        assert!(name.ends_with(".png"));

        let reloaded = image::open(&path).expect("saved png decodes");
        assert_eq!(reloaded.to_luma8().dimensions(), (100, 40));
    }

    #[test]
    fn at_dir_uses_the_directory_verbatim() {
        let dir = tempfile::tempdir().expect("tempdir");
        let sig_dir = dir.path().join("my-sigs");
        let store = SignatureStore::at_dir(&sig_dir);
        assert_eq!(store.signatures_dir(), sig_dir);
        assert_eq!(store.browse_dir(), dir.path());

        let path = store
            .save_canvas(&SignatureCanvas::new(10, 10))
            .expect("save succeeds");
        assert!(path.starts_with(&sig_dir));
        assert_eq!(store.browse_dir(), sig_dir);
    }

    #[test]
    fn browse_dir_falls_back_to_the_base_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = SignatureStore::new(dir.path());
        assert_eq!(store.browse_dir(), dir.path());

        store
            .save_canvas(&SignatureCanvas::new(10, 10))
            .expect("save succeeds");
        assert_eq!(store.browse_dir(), store.signatures_dir());
    }

    #[test]
    fn supported_images_are_png_and_jpeg_only() {
        assert!(is_supported_image(Path::new("sig.png")));
        assert!(is_supported_image(Path::new("sig.PNG")));
        assert!(is_supported_image(Path::new("sig.jpg")));
        assert!(is_supported_image(Path::new("sig.JPEG")));
        assert!(!is_supported_image(Path::new("sig.gif")));
        assert!(!is_supported_image(Path::new("sig")));
    }
}
