//! Document backend: opening PDFs, reading page geometry, and stamping the
//! signature image into a page.
//!
//! The [`DocumentBackend`] trait is the seam between the session controller
//! and lopdf, so the controller can be exercised with a mock.

mod stamp;

use std::path::Path;

use lopdf::{Document, Object};
use thiserror::Error;
use tracing::warn;

use crate::field::SignatureField;

pub type PdfResult<T> = Result<T, PdfError>;

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: lopdf::Error,
    },

    #[error("page {page_index} not found")]
    PageNotFound { page_index: usize },

    #[error("failed to read signature image {path}: {source}")]
    Image {
        path: String,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: lopdf::Error,
    },

    #[error("malformed document structure: {0}")]
    Malformed(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Page dimensions in document points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

/// Full MediaBox of a page: lower-left origin plus extent, in points.
/// The origin is not always 0,0; stamping must translate by it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct PageBox {
    pub(crate) origin_x: f64,
    pub(crate) origin_y: f64,
    pub(crate) width: f64,
    pub(crate) height: f64,
}

/// Seam between the session and the PDF library.
///
/// `close` makes handle release explicit: the session must release the
/// outgoing document before a replacement is opened.
pub trait DocumentBackend {
    type Document;

    fn open(&self, path: &Path) -> PdfResult<Self::Document>;

    fn close(&self, document: Self::Document);

    fn page_count(&self, document: &Self::Document) -> usize;

    fn page_size(&self, document: &Self::Document, page_index: usize) -> PdfResult<PageSize>;

    /// Stamps `image_path` into `field` of `original` and serializes the
    /// result to `output`. Always re-reads both files fresh from disk.
    fn stamp_to_file(
        &self,
        original: &Path,
        field: &SignatureField,
        image_path: &Path,
        output: &Path,
    ) -> PdfResult<()>;
}

#[derive(Debug, Default)]
pub struct LopdfBackend;

impl LopdfBackend {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentBackend for LopdfBackend {
    type Document = Document;

    fn open(&self, path: &Path) -> PdfResult<Document> {
        Document::load(path).map_err(|source| PdfError::Open {
            path: path.display().to_string(),
            source,
        })
    }

    fn close(&self, document: Document) {
        drop(document);
    }

    fn page_count(&self, document: &Document) -> usize {
        document.get_pages().len()
    }

    fn page_size(&self, document: &Document, page_index: usize) -> PdfResult<PageSize> {
        let page_id = page_object_id(document, page_index)?;
        let media_box = page_dimensions(document, page_id)?;
        Ok(PageSize {
            width: media_box.width,
            height: media_box.height,
        })
    }

    fn stamp_to_file(
        &self,
        original: &Path,
        field: &SignatureField,
        image_path: &Path,
        output: &Path,
    ) -> PdfResult<()> {
        let mut document = self.open(original)?;
        stamp::stamp_signature(&mut document, field, image_path)?;
        document.save(output).map_err(|source| PdfError::Write {
            path: output.display().to_string(),
            source: lopdf::Error::IO(source),
        })?;
        Ok(())
    }
}

/// Resolves the object id of a zero-based page index.
fn page_object_id(document: &Document, page_index: usize) -> PdfResult<lopdf::ObjectId> {
    let page_number = u32::try_from(page_index + 1)
        .map_err(|_| PdfError::PageNotFound { page_index })?;
    document
        .get_pages()
        .get(&page_number)
        .copied()
        .ok_or(PdfError::PageNotFound { page_index })
}

/// Walks the page's `Parent` chain looking for a `MediaBox`. Falls back to
/// US Letter when no ancestor carries one.
fn page_dimensions(document: &Document, page_id: lopdf::ObjectId) -> PdfResult<PageBox> {
    let mut current = Some(page_id);
    while let Some(id) = current {
        let dict = document
            .get_object(id)
            .and_then(Object::as_dict)
            .map_err(|_| PdfError::Malformed("page node is not a dictionary".into()))?;
        if let Some(media_box) = extract_media_box(document, dict) {
            return Ok(media_box);
        }
        current = dict.get(b"Parent").and_then(Object::as_reference).ok();
    }
    warn!("no MediaBox on page or ancestors, assuming US Letter");
    Ok(PageBox {
        origin_x: 0.0,
        origin_y: 0.0,
        width: 612.0,
        height: 792.0,
    })
}

fn extract_media_box(document: &Document, dict: &lopdf::Dictionary) -> Option<PageBox> {
    let raw = dict.get(b"MediaBox").ok()?;
    let resolved = match raw {
        Object::Reference(id) => document.get_object(*id).ok()?,
        other => other,
    };
    let arr = resolved.as_array().ok()?;
    if arr.len() != 4 {
        return None;
    }
    let llx = obj_to_f64(&arr[0])?;
    let lly = obj_to_f64(&arr[1])?;
    let urx = obj_to_f64(&arr[2])?;
    let ury = obj_to_f64(&arr[3])?;
    Some(PageBox {
        origin_x: llx,
        origin_y: lly,
        width: urx - llx,
        height: ury - lly,
    })
}

fn obj_to_f64(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(f) => Some((*f).into()),
        _ => None,
    }
}
