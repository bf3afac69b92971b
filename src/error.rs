//! Error type for the rescan library.
//!
//! Every stage returns `Result<_, RescanError>`. A failure anywhere is
//! terminal for the run: the orchestrator in [`crate::convert`] logs it and
//! skips the remaining stages. The variants are grouped by the stage that
//! raises them so the CLI can print a message that points at the cause
//! (a missing `soffice`, a missing pdfium library, a bad input file).

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the rescan library.
#[derive(Debug, Error)]
pub enum RescanError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Input file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input has an extension no stage knows how to handle.
    #[error("Unsupported input '{path}': expected a word-processor document (.docx, .doc, .odt, .rtf) or a .pdf")]
    UnsupportedInput { path: PathBuf },

    /// The file claims to be a PDF but does not start with `%PDF`.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// An output already exists and the overwrite policy forbids replacing it.
    #[error("Refusing to overwrite existing output '{path}'\nRemove it or drop --no-clobber.")]
    OutputExists { path: PathBuf },

    // ── Document → PDF errors ─────────────────────────────────────────────
    /// The external converter binary could not be started.
    #[error(
        "Document converter '{program}' could not be started: {reason}\n\n\
LibreOffice is required to convert word-processor documents:\n\
  • Debian/Ubuntu:  apt install libreoffice-writer\n\
  • macOS:          brew install --cask libreoffice\n\
  • Windows:        https://www.libreoffice.org/download/\n\
Or point --soffice / RESCAN_SOFFICE at an existing soffice binary.\n"
    )]
    ConverterNotFound { program: String, reason: String },

    /// The external converter ran but exited unsuccessfully.
    #[error("Document converter '{program}' failed ({status}): {stderr}")]
    ConverterFailed {
        program: String,
        status: String,
        stderr: String,
    },

    /// The external converter did not finish in time and was killed.
    #[error("Document converter '{program}' timed out after {secs}s\nIncrease --timeout.")]
    ConverterTimeout { program: String, secs: u64 },

    /// The converter exited cleanly but the expected PDF is missing.
    #[error("Document converter reported success but '{expected}' was not produced")]
    ConverterNoOutput { expected: PathBuf },

    // ── PDF → images errors ───────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
PDF rasterisation needs the pdfium shared library on this host:\n\
  • Download a build from https://github.com/bblanchon/pdfium-binaries\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium (file or directory), or\n\
  • Install it where the system loader finds it (e.g. /usr/local/lib).\n"
    )]
    PdfiumBindingFailed(String),

    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// pdfium-render returned an error for a specific page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    /// Could not create or clean the image directory.
    #[error("Failed to prepare image directory '{path}': {source}")]
    ImageDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not encode or write a page image.
    #[error("Failed to write page image '{path}': {detail}")]
    ImageWriteFailed { path: PathBuf, detail: String },

    // ── Images → PDF errors ───────────────────────────────────────────────
    /// An image file name is not a page number.
    #[error("Image '{path}' is not named by page number (expected e.g. '3.jpg')")]
    InvalidImageName { path: PathBuf },

    /// A page image could not be read back.
    #[error("Failed to read page image '{path}': {detail}")]
    ImageReadFailed { path: PathBuf, detail: String },

    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RescanError {
    /// True when the failure is caused by a missing host dependency
    /// (LibreOffice or pdfium) rather than by the input document.
    pub fn is_missing_dependency(&self) -> bool {
        matches!(
            self,
            RescanError::ConverterNotFound { .. } | RescanError::PdfiumBindingFailed(_)
        )
    }
}
