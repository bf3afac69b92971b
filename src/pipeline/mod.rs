//! Pipeline stages for producing a re-scanned PDF.
//!
//! Each submodule implements exactly one transformation step, and each
//! step's output path is a pure function of its input path (see
//! [`crate::paths`]).
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ document ──▶ render ──▶ assemble
//! (check)   (soffice)    (pdfium)   (printpdf)
//! ```
//!
//! 1. [`input`]    — validate the source and decide whether stage 1 runs
//! 2. [`document`] — `report.docx` → `report.pdf`
//! 3. [`render`]   — `report.pdf` → `report_images/1.jpg … N.jpg`
//! 4. [`assemble`] — page images → `scan_report.pdf`

pub mod assemble;
pub mod document;
pub mod input;
pub mod render;
