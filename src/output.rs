//! Result types of a rescan run.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// One step of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    /// Word-processor document → PDF.
    Document,
    /// PDF → numbered page JPEGs.
    Render,
    /// Page JPEGs → `scan_<stem>.pdf`.
    Assemble,
}

impl Stage {
    /// Short human label used in logs and the CLI.
    pub fn label(self) -> &'static str {
        match self {
            Stage::Document => "DOCX → PDF",
            Stage::Render => "PDF → JPG",
            Stage::Assemble => "JPG → PDF",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Everything a completed run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RescanOutput {
    /// The document the run started from.
    pub source: PathBuf,
    /// PDF rendered from; equals `source` when the input already was a PDF.
    pub pdf_path: PathBuf,
    /// `<stem>_images` directory. May no longer exist when
    /// `keep_images` was false.
    pub image_dir: PathBuf,
    /// Page images in page order.
    pub image_paths: Vec<PathBuf>,
    /// The re-scanned PDF, or None when the PDF had no pages.
    pub scan_pdf_path: Option<PathBuf>,
    pub stats: RescanStats,
}

/// Timing and size figures for one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RescanStats {
    pub page_count: usize,
    /// Zero when the document stage was skipped.
    pub document_duration_ms: u64,
    pub render_duration_ms: u64,
    pub assemble_duration_ms: u64,
    pub total_duration_ms: u64,
    /// Size of the scan PDF in bytes (0 when none was written).
    pub scan_pdf_bytes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_labels() {
        assert_eq!(Stage::Document.to_string(), "DOCX → PDF");
        assert_eq!(Stage::Render.label(), "PDF → JPG");
        assert_eq!(Stage::Assemble.label(), "JPG → PDF");
    }

    #[test]
    fn output_serialises_absent_scan_as_null() {
        let out = RescanOutput {
            source: PathBuf::from("a.docx"),
            pdf_path: PathBuf::from("a.pdf"),
            image_dir: PathBuf::from("a_images"),
            image_paths: Vec::new(),
            scan_pdf_path: None,
            stats: RescanStats::default(),
        };
        let json = serde_json::to_value(&out).unwrap();
        assert!(json["scan_pdf_path"].is_null());
        assert_eq!(json["stats"]["page_count"], 0);
    }
}
