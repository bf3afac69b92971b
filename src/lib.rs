//! # rescan
//!
//! Produce a "re-scanned" copy of a document: the text layer is gone and
//! every page is a picture, as if the document had been printed and run
//! through a flatbed scanner.
//!
//! ## Pipeline Overview
//!
//! ```text
//! report.docx
//!  │
//!  ├─ 1. Document  soffice --headless --convert-to pdf   → report.pdf
//!  ├─ 2. Render    pdfium, one JPEG per page (spawn_blocking)
//!  │                                                     → report_images/1.jpg … N.jpg
//!  └─ 3. Assemble  printpdf, one full-bleed page per image
//!                                                        → scan_report.pdf
//! ```
//!
//! Every output path is derived from the input path (see [`paths`]), and
//! stage 1 is skipped when the input is already a PDF.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rescan::{rescan, RescanConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RescanConfig::builder().dpi(300).build()?;
//!     let output = rescan("report.docx", &config).await?;
//!     println!("{:?}", output.scan_pdf_path);
//!     Ok(())
//! }
//! ```
//!
//! ## Host requirements
//!
//! | Stage | Needs |
//! |-------|-------|
//! | Document | LibreOffice (`soffice`) |
//! | Render | pdfium shared library (`PDFIUM_LIB_PATH` or system path) |
//! | Assemble | nothing |
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `rescan` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod paths;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{OverwritePolicy, RescanConfig, RescanConfigBuilder};
pub use convert::{rescan, rescan_sync};
pub use error::RescanError;
pub use output::{RescanOutput, RescanStats, Stage};
pub use pipeline::assemble::create_pdf_from_images;
pub use pipeline::document::convert_docx_to_pdf;
pub use pipeline::render::convert_pdf_to_images;
pub use progress::{NoopProgressCallback, ProgressCallback, RescanProgressCallback};
