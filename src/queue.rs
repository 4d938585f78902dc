//! LIFO stack of documents waiting for a signature.

use std::path::{Path, PathBuf};

/// Ordered stack of PDF paths. The end of the vector is the top: the last
/// document pushed is the first one presented for signing. Duplicates are
/// kept as-is.
#[derive(Debug, Default)]
pub struct DocumentQueue {
    entries: Vec<PathBuf>,
}

impl DocumentQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, path: PathBuf) {
        self.entries.push(path);
    }

    /// Appends in argument order, so the last path given ends up on top.
    pub fn push_all(&mut self, paths: impl IntoIterator<Item = PathBuf>) {
        self.entries.extend(paths);
    }

    pub fn top(&self) -> Option<&Path> {
        self.entries.last().map(PathBuf::as_path)
    }

    pub fn pop(&mut self) -> Option<PathBuf> {
        self.entries.pop()
    }

    /// Removes one entry equal to `path`: the top when it matches, otherwise
    /// the first equal entry from the bottom. Returns whether one was found.
    pub fn remove(&mut self, path: &Path) -> bool {
        if self.top() == Some(path) {
            self.entries.pop();
            return true;
        }
        if let Some(index) = self.entries.iter().position(|entry| entry == path) {
            self.entries.remove(index);
            return true;
        }
        false
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Drag-and-drop filter: keeps only paths with a `.pdf` extension,
/// case-insensitively. A drop is accepted iff the result is non-empty.
pub fn pdf_paths_from_drop(paths: &[PathBuf]) -> Vec<PathBuf> {
    paths
        .iter()
        .filter(|path| {
            path.extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
        })
        .cloned()
        .collect()
}
