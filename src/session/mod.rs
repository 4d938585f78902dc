//! The signing session: owns the queue, the open document, the authoritative
//! field, the chosen signature image, the zoom factor, and the placement
//! state. Every user-facing operation goes through here.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use crate::field::SignatureField;
use crate::geometry::{PixelBounds, PixelPoint, PixelRect};
use crate::pdf::{DocumentBackend, PageSize, PdfError};
use crate::placement::PagePlacement;
use crate::queue::DocumentQueue;
use crate::signature::store::is_supported_image;

pub const DEFAULT_ZOOM: f64 = 1.5;
pub const MIN_ZOOM: f64 = 0.5;
pub const MAX_ZOOM: f64 = 4.0;

pub type SessionResult<T> = Result<T, SessionError>;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no document is loaded")]
    NoDocument,

    #[error("place a signature box first")]
    NoField,

    #[error("choose a signature image first")]
    NoSignature,

    #[error("unsupported signature image: {}", .0.display())]
    UnsupportedImage(PathBuf),

    #[error(transparent)]
    Pdf(#[from] PdfError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Empty,
    Loaded,
}

/// Seam for the "output already exists, overwrite?" dialog.
pub trait OverwritePrompt {
    fn confirm_overwrite(&self, path: &Path) -> bool;
}

/// A queued document that could not be opened and was dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedDocument {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug)]
pub enum AcceptOutcome {
    Signed {
        output: PathBuf,
        skipped: Vec<SkippedDocument>,
    },
    OverwriteDeclined {
        output: PathBuf,
    },
}

#[derive(Debug)]
struct CurrentDocument<D> {
    path: PathBuf,
    document: D,
    page_size: PageSize,
}

#[derive(Debug)]
pub struct Session<B: DocumentBackend> {
    backend: B,
    queue: DocumentQueue,
    current: Option<CurrentDocument<B::Document>>,
    field: Option<SignatureField>,
    signature_image: Option<PathBuf>,
    zoom: f64,
    placement: PagePlacement,
    status: String,
}

impl<B: DocumentBackend> Session<B> {
    pub fn new(backend: B) -> Self {
        Self::with_zoom(backend, DEFAULT_ZOOM)
    }

    pub fn with_zoom(backend: B, zoom: f64) -> Self {
        Self {
            backend,
            queue: DocumentQueue::new(),
            current: None,
            field: None,
            signature_image: None,
            zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM),
            placement: PagePlacement::new(),
            status: String::from("Drop PDFs to start"),
        }
    }

    pub fn phase(&self) -> SessionPhase {
        if self.current.is_some() {
            SessionPhase::Loaded
        } else {
            SessionPhase::Empty
        }
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn field(&self) -> Option<&SignatureField> {
        self.field.as_ref()
    }

    pub fn signature_image(&self) -> Option<&Path> {
        self.signature_image.as_deref()
    }

    pub fn current_path(&self) -> Option<&Path> {
        self.current.as_ref().map(|current| current.path.as_path())
    }

    /// The rectangle the page view should paint, if any.
    pub fn rect(&self) -> Option<PixelRect> {
        self.placement.rect()
    }

    pub fn signature_mode(&self) -> bool {
        self.placement.signature_mode()
    }

    pub fn title(&self) -> String {
        match self.current_path() {
            Some(path) => {
                let name = path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                format!("{name} - top of {} in stack", self.queue.len())
            }
            None => String::from("sigstack"),
        }
    }

    /// Appends documents to the stack (last path lands on top). When nothing
    /// is loaded yet, loads the new top immediately.
    pub fn push_paths(&mut self, paths: Vec<PathBuf>) -> Vec<SkippedDocument> {
        let count = paths.len();
        self.queue.push_all(paths);
        info!(added = count, total = self.queue.len(), "documents queued");
        if self.current.is_none() {
            self.load_top()
        } else {
            self.status = format!("{} in stack", self.queue.len());
            Vec::new()
        }
    }

    /// Handles a drag-and-drop of arbitrary paths. Returns `None` when the
    /// drop carried no PDF, in which case nothing changes.
    pub fn push_dropped(&mut self, paths: &[PathBuf]) -> Option<Vec<SkippedDocument>> {
        let pdfs = crate::queue::pdf_paths_from_drop(paths);
        if pdfs.is_empty() {
            self.status = String::from("No PDFs in drop");
            return None;
        }
        Some(self.push_paths(pdfs))
    }

    /// Opens the top of the stack, dropping entries that fail to open until
    /// one succeeds or the stack is exhausted. The outgoing handle is always
    /// released first.
    pub fn load_top(&mut self) -> Vec<SkippedDocument> {
        self.release_current();
        self.field = None;
        self.placement.clear();

        let mut skipped = Vec::new();
        loop {
            let Some(path) = self.queue.top().map(Path::to_path_buf) else {
                self.placement.clear_page();
                self.status = String::from("Queue empty");
                info!("queue exhausted");
                return skipped;
            };

            let document = match self.backend.open(&path) {
                Ok(document) => document,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "skipping unopenable document");
                    skipped.push(SkippedDocument {
                        path: path.clone(),
                        reason: err.to_string(),
                    });
                    self.queue.pop();
                    continue;
                }
            };

            let page_size = match self.backend.page_size(&document, 0) {
                Ok(size) => size,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "skipping unreadable document");
                    skipped.push(SkippedDocument {
                        path: path.clone(),
                        reason: err.to_string(),
                    });
                    self.backend.close(document);
                    self.queue.pop();
                    continue;
                }
            };

            self.project_page(page_size);
            info!(path = %path.display(), remaining = self.queue.len(), "document loaded");
            self.status = format!("Loaded {}", path.display());
            self.current = Some(CurrentDocument {
                path,
                document,
                page_size,
            });
            return skipped;
        }
    }

    pub fn set_signature_mode(&mut self, enabled: bool) -> SessionResult<()> {
        if self.current.is_none() {
            return Err(SessionError::NoDocument);
        }
        self.placement.set_signature_mode(enabled);
        self.status = if enabled {
            String::from("Click the page to place the signature box")
        } else {
            String::from("Signature mode off")
        };
        Ok(())
    }

    pub fn pointer_down(&mut self, pos: PixelPoint) {
        if let Some(field) = self.placement.pointer_down(pos) {
            self.set_field(field);
        }
    }

    pub fn pointer_move(&mut self, pos: PixelPoint) -> bool {
        self.placement.pointer_move(pos)
    }

    pub fn pointer_up(&mut self) {
        if let Some(field) = self.placement.pointer_up() {
            self.set_field(field);
        }
    }

    pub fn resize_field(&mut self, factor: f64) {
        if let Some(field) = self.placement.resize(factor) {
            self.set_field(field);
        }
    }

    /// Removes the signature box without touching the queue.
    pub fn clear_field(&mut self) {
        self.field = None;
        self.placement.clear();
        self.status = String::from("Signature box removed");
    }

    pub fn select_signature_image(&mut self, path: PathBuf) -> SessionResult<()> {
        if !is_supported_image(&path) {
            return Err(SessionError::UnsupportedImage(path));
        }
        info!(path = %path.display(), "signature image selected");
        self.status = format!("Signature: {}", path.display());
        self.signature_image = Some(path);
        Ok(())
    }

    /// Multiplies the zoom factor, clamped to [0.5, 4.0], and reprojects the
    /// page and the stored field at the new scale. Without a document the
    /// factor is left untouched.
    pub fn change_zoom(&mut self, factor: f64) -> f64 {
        let Some(current) = &self.current else {
            return self.zoom;
        };
        let page_size = current.page_size;
        self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        self.project_page(page_size);
        self.placement.show_field(self.field.as_ref());
        self.zoom
    }

    /// Skips the current document: field and rectangle are cleared, the
    /// queue is untouched.
    pub fn decline_current(&mut self) -> SessionResult<()> {
        let current = self.current.as_ref().ok_or(SessionError::NoDocument)?;
        info!(path = %current.path.display(), "document declined");
        self.status = format!("Declined {}", current.path.display());
        self.field = None;
        self.placement.clear();
        Ok(())
    }

    /// Stamps the signature into the current document, writes
    /// `<stem>-Signed.<ext>` beside the original, pops the entry, and loads
    /// the next document. Precondition failures mutate nothing.
    pub fn accept_current(&mut self, prompt: &dyn OverwritePrompt) -> SessionResult<AcceptOutcome> {
        let current = self.current.as_ref().ok_or(SessionError::NoDocument)?;
        let field = self.field.ok_or(SessionError::NoField)?;
        let signature = self
            .signature_image
            .clone()
            .ok_or(SessionError::NoSignature)?;

        let original = current.path.clone();
        let output = signed_output_path(&original);
        if output.exists() && !prompt.confirm_overwrite(&output) {
            info!(output = %output.display(), "overwrite declined");
            self.status = format!("Kept existing {}", output.display());
            return Ok(AcceptOutcome::OverwriteDeclined { output });
        }

        self.backend
            .stamp_to_file(&original, &field, &signature, &output)?;
        info!(
            original = %original.display(),
            output = %output.display(),
            "document signed"
        );

        self.queue.remove(&original);
        let skipped = self.load_top();
        self.status = format!("Signed {}", output.display());
        Ok(AcceptOutcome::Signed { output, skipped })
    }

    /// Manual Save As: stamps to a caller-chosen path without advancing the
    /// queue. The chooser already confirmed any overwrite.
    pub fn save_current_as(&mut self, output: &Path) -> SessionResult<()> {
        let current = self.current.as_ref().ok_or(SessionError::NoDocument)?;
        let field = self.field.ok_or(SessionError::NoField)?;
        let signature = self
            .signature_image
            .as_deref()
            .ok_or(SessionError::NoSignature)?;

        self.backend
            .stamp_to_file(&current.path, &field, signature, output)?;
        info!(output = %output.display(), "document saved as");
        self.status = format!("Saved {}", output.display());
        Ok(())
    }

    fn set_field(&mut self, field: SignatureField) {
        self.status = format!(
            "Signature box at ({:.0}, {:.0}) pt",
            field.x, field.y
        );
        self.field = Some(field);
    }

    fn project_page(&mut self, page_size: PageSize) {
        let bounds = PixelBounds::new(
            scaled_extent(page_size.width, self.zoom),
            scaled_extent(page_size.height, self.zoom),
        );
        self.placement.set_page(0, bounds, self.zoom);
    }

    fn release_current(&mut self) {
        if let Some(current) = self.current.take() {
            self.backend.close(current.document);
        }
    }
}

/// `<stem>-Signed.<ext>` beside the original, extension preserved verbatim.
/// A file without an extension becomes `<name>-Signed`.
pub fn signed_output_path(original: &Path) -> PathBuf {
    let mut name = original
        .file_stem()
        .map(|stem| stem.to_os_string())
        .unwrap_or_default();
    name.push("-Signed");
    if let Some(ext) = original.extension() {
        name.push(".");
        name.push(ext);
    }
    original.with_file_name(name)
}

fn scaled_extent(points: f64, zoom: f64) -> u32 {
    let pixels = (points * zoom).round();
    if pixels >= f64::from(u32::MAX) {
        u32::MAX
    } else if pixels <= 0.0 {
        0
    } else {
        pixels as u32
    }
}
