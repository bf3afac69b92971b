//! Input resolution: validate the user-supplied path and decide where the
//! pipeline starts.
//!
//! Word-processor documents enter at the document stage. A PDF is already
//! what that stage would produce, so it enters at the render stage and is
//! checked for the `%PDF` magic bytes up front; a pdfium error on a file
//! that was never a PDF is far less helpful.

use crate::error::RescanError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Extensions LibreOffice Writer can open and export to PDF.
pub const DOCUMENT_EXTENSIONS: &[&str] = &["docx", "doc", "odt", "rtf", "txt", "wpd", "pages"];

/// How the source enters the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Needs the document → PDF stage.
    Document,
    /// Already a PDF; the document stage is skipped.
    Pdf,
}

/// A validated source document.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub path: PathBuf,
    pub kind: SourceKind,
}

/// Classify a path by its extension (case-insensitive).
pub fn classify(path: &Path) -> Option<SourceKind> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    if ext == "pdf" {
        Some(SourceKind::Pdf)
    } else if DOCUMENT_EXTENSIONS.contains(&ext.as_str()) {
        Some(SourceKind::Document)
    } else {
        None
    }
}

/// Resolve a local path, validating existence, readability and type.
///
/// Nothing is written to disk here, so a rejected input leaves the
/// filesystem untouched.
pub fn resolve_input(path: impl AsRef<Path>) -> Result<SourceDocument, RescanError> {
    let path = path.as_ref().to_path_buf();

    if !path.is_file() {
        return Err(RescanError::FileNotFound { path });
    }

    let kind = classify(&path).ok_or_else(|| RescanError::UnsupportedInput { path: path.clone() })?;

    // Check read permission by attempting to open
    match std::fs::File::open(&path) {
        Ok(mut f) => {
            if kind == SourceKind::Pdf {
                let mut head = Vec::with_capacity(4);
                let _ = (&mut f).take(4).read_to_end(&mut head);
                if head != b"%PDF" {
                    let mut magic = [0u8; 4];
                    magic[..head.len()].copy_from_slice(&head);
                    return Err(RescanError::NotAPdf { path, magic });
                }
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(RescanError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(RescanError::FileNotFound { path });
        }
    }

    debug!("Resolved {:?} input: {}", kind, path.display());
    Ok(SourceDocument { path, kind })
}
